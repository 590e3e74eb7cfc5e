//! Format identification and classification queries.
//!
//! Identification is two-tier: a static extension table answers the common
//! case for free; everything else opens the container purely to read its
//! format name and releases it again. Neither path ever raises an error -
//! a library scan must not abort because one file would not identify.

use crate::backend::{MediaBackend, StreamKind};
use std::path::Path;
use tracing::debug;

/// Label reported when a file cannot be identified.
pub const UNKNOWN_LABEL: &str = "UNK";

/// Extension to three-letter display label.
const FORMATS: &[(&str, &str)] = &[
    ("mp3", "MP3"),
    ("ogg", "OGG"),
    ("aac", "AAC"),
    ("ac3", "AC3"),
    ("m4a", "M4A"),
    ("wav", "WAV"),
    ("wv", "WV"),
    ("ape", "APE"),
    ("flac", "FLA"),
];

/// Table lookup, exact and case-insensitive.
pub fn short_name_for_extension(ext: &str) -> Option<&'static str> {
    FORMATS
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, name)| *name)
}

/// Whether the extension alone marks the file as handled.
pub fn supports_extension(ext: &str) -> bool {
    short_name_for_extension(ext).is_some()
}

/// Probe `path` and accept it only as pure audio.
///
/// A file carrying any video stream is rejected outright, even when it also
/// carries audio. Probe failures classify as unsupported, never as errors.
pub fn supports_file(backend: &dyn MediaBackend, path: &Path) -> bool {
    let container = match backend.open(path) {
        Ok(container) => container,
        Err(err) => {
            debug!(error = %err, path = %path.display(), "probe failed");
            return false;
        }
    };

    let mut audio = false;
    for stream in container.streams() {
        match stream.kind {
            StreamKind::Video => return false,
            StreamKind::Audio => audio = true,
            StreamKind::Other => {}
        }
    }
    audio
}

/// Three-character display label for the file's format.
///
/// Extension table first; on a miss the container is opened just long enough
/// to read its format name (first three letters, uppercased) and released on
/// every branch. `"UNK"` when nothing identifies the file.
pub fn identify(backend: &dyn MediaBackend, path: &Path) -> String {
    if let Some(name) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(short_name_for_extension)
    {
        return name.to_string();
    }

    match backend.open(path) {
        Ok(container) => match container.properties().format_name {
            Some(name) if !name.is_empty() => {
                name.chars().take(3).collect::<String>().to_uppercase()
            }
            _ => UNKNOWN_LABEL.to_string(),
        },
        Err(err) => {
            debug!(error = %err, path = %path.display(), "identification probe failed");
            UNKNOWN_LABEL.to_string()
        }
    }
}
