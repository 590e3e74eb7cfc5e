//! Decoded output description reported alongside every decode call.

use serde::{Deserialize, Serialize};

/// Sample format of the decoded output.
///
/// The adapter does not transcode: output is always interleaved signed 16-bit
/// PCM in native byte order, at the source's own rate and channel count.
/// Callers needing another format resample/convert on their side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Interleaved signed 16-bit, native endianness.
    S16,
}

/// Stream parameters of the decoded output.
///
/// Captured from the codec context when the stream is opened and re-reported
/// (not recomputed) on every decode call, so the host always knows how to
/// interpret the bytes it just received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundParams {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in hertz.
    pub rate: u32,
    /// Sample format tag; fixed to [`SampleFormat::S16`].
    pub format: SampleFormat,
}

impl SoundParams {
    /// Create a new parameter set with the fixed output format.
    pub fn new(channels: u16, rate: u32) -> Self {
        Self {
            channels,
            rate,
            format: SampleFormat::S16,
        }
    }

    /// Bytes occupied by one frame (one sample per channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * 2
    }
}

/// Outcome of a single decode call.
#[derive(Debug, Clone, Copy)]
pub struct DecodeProgress {
    /// Output description, valid even when `written` is 0.
    pub params: SoundParams,
    /// Bytes copied into the caller's buffer by this call. 0 only at genuine
    /// end of stream or when the caller passed an empty buffer.
    pub written: usize,
}
