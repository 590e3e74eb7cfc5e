//! The versioned decoder entry points a host player drives.

use crate::error::DecoderError;
use crate::params::DecodeProgress;
use crate::tags::{FileTags, TagSelection};
use std::path::Path;
use thiserror::Error;

/// Version of this contract. A host refuses plugins built against another
/// major revision of the entry-point set.
pub const PLUGIN_API_VERSION: u32 = 2;

/// A seek that the decoder could not satisfy.
///
/// The session is left untouched: the next decode call continues from the
/// pre-seek position, so the host may simply keep playing.
#[derive(Debug, Clone, Error)]
#[error("seek to {requested}s failed: {reason}")]
pub struct SeekError {
    /// The offset the host asked for, in seconds.
    pub requested: u64,
    /// Backend description of the failure.
    pub reason: String,
}

/// One opened stream.
///
/// Obtained from [`DecoderPlugin::open`], which always returns a handle -
/// even when opening failed - so the host can query the error before
/// discarding it. Drive it from a single logical caller in strict sequence;
/// decode and seek must never overlap on the same handle.
pub trait Decoder: Send {
    /// Pull up to `out.len()` decoded bytes into `out`.
    ///
    /// Returns the output parameters (always valid) and the byte count
    /// actually written. A written count of 0 with no fatal error recorded
    /// means genuine end of stream. An empty `out` is allowed: the decoder
    /// still makes progress internally and delivers the audio on the next
    /// non-empty call.
    fn decode(&mut self, out: &mut [u8]) -> DecodeProgress;

    /// Seek to an absolute offset in seconds.
    ///
    /// On success the requested offset is echoed back and any carried-over
    /// decoded audio from before the seek is discarded. On failure nothing
    /// changes and the handle stays usable.
    fn seek(&mut self, seconds: u64) -> Result<u64, SeekError>;

    /// Instantaneous bitrate estimate in kbps, updated per decode call.
    fn bitrate_kbps(&self) -> u32;

    /// Whole-stream average bitrate in kbps, fixed at open. 0 when the
    /// container reported no usable duration.
    fn avg_bitrate_kbps(&self) -> u32;

    /// Total stream duration in whole seconds, when the container knows it.
    fn duration_secs(&self) -> Option<u64>;

    /// Snapshot of the most recent error, if any. Reading does not clear it.
    fn last_error(&self) -> Option<DecoderError>;

    /// Release codec and container resources. After this, the handle must
    /// not be decoded from or seeked again.
    fn close(&mut self);
}

/// File-level entry points of one decoder plugin.
///
/// One instance serves the whole process; the classification queries are
/// pure and open nothing that they do not also release.
pub trait DecoderPlugin: Send + Sync {
    /// Contract revision this plugin was built against.
    fn api_version(&self) -> u32 {
        PLUGIN_API_VERSION
    }

    /// Process-wide one-time setup. Called once by the host before the first
    /// `open`; never torn down per-session.
    fn init(&self);

    /// Open `path` for decoding. Never returns absence: on failure the
    /// handle is in a failed state with a fatal error set, so the host can
    /// still ask what went wrong.
    fn open(&self, path: &Path) -> Box<dyn Decoder>;

    /// Read container-level metadata without starting a decode session.
    /// Failures degrade to empty tags, never to an error.
    fn tags(&self, path: &Path, selection: TagSelection) -> FileTags;

    /// Cheap classification by file extension alone.
    fn supports_extension(&self, ext: &str) -> bool;

    /// Classification by probing the container. True only for files with at
    /// least one audio stream and no video stream.
    fn supports_file(&self, path: &Path) -> bool;

    /// Three-character display label for the file's format, e.g. `"MP3"`.
    /// `"UNK"` when identification fails; identification never errors.
    fn identify(&self, path: &Path) -> String;
}
