//! Container-level metadata exposed to the host's library scanner.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which tag groups the host wants filled in.
    ///
    /// Library scans frequently only need the duration; skipping the comment
    /// group keeps the probe cheap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TagSelection: u8 {
        /// Textual comments: track number, title, artist, album.
        const COMMENTS = 0b01;
        /// Stream duration.
        const TIME = 0b10;
    }
}

/// Metadata read from a container, independent of any decode session.
///
/// Every field is optional: a field the container does not carry stays
/// `None`, it is never defaulted to an empty string that a library view
/// could mistake for real data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTags {
    /// Track number within the album.
    pub track: Option<u32>,
    /// Track title.
    pub title: Option<String>,
    /// Performing artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Total stream duration in whole seconds.
    pub duration_secs: Option<u64>,
}

impl FileTags {
    /// Returns `true` when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.track.is_none()
            && self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.duration_secs.is_none()
    }
}
