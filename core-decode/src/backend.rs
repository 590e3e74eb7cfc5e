//! # Container/Codec Capability Traits
//!
//! The underlying media library is modeled as an opaque set of capabilities -
//! open, probe, read packets, decode frames, seek - rather than a concrete
//! dependency. Any native or pure-Rust codec backend can sit behind these
//! traits; the adapter in [`crate::session`] only ever talks to them.
//!
//! The decode primitive is deliberately cursor-shaped: one compressed packet
//! may hold several frames, so `decode` reports both the PCM it produced and
//! how many input bytes it consumed, and the caller advances through the
//! packet until it is exhausted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Codec identifiers the adapter cares about.
///
/// Intentionally extensible; use [`CodecId::Other`] for codecs not mapped to
/// a dedicated variant. Only [`CodecId::Flac`] changes adapter behavior (its
/// container timestamps are unreliable, so seeks go through a byte-position
/// estimate).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    /// Codec is unknown or not yet mapped to a dedicated variant.
    Unknown,
    /// Backend-specific codec.
    Other(String),
}

/// Broad stream classification, used for stream selection and for rejecting
/// files that carry video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Video,
    Other,
}

/// The stream's native timestamp unit, as a rational number of seconds per
/// tick (`num / den`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

/// Per-stream description reported by a probed container.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Position of the stream within the container.
    pub index: usize,
    pub kind: StreamKind,
    pub codec: CodecId,
    /// Sample rate in hertz; 0 when the container does not say.
    pub sample_rate: u32,
    /// Channel count; 0 when the container does not say.
    pub channels: u16,
    pub time_base: TimeBase,
    /// Stream duration in `time_base` ticks, when known.
    pub duration_ts: Option<u64>,
}

/// One unit of compressed data as delivered by the container layer.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Index of the stream this packet belongs to.
    pub stream: usize,
    /// Presentation timestamp in the stream's time base.
    pub ts: u64,
    /// Packet duration in the stream's time base.
    pub dur: u64,
    pub data: Bytes,
}

/// What one decode step produced.
#[derive(Debug, Clone)]
pub struct DecodeStep {
    /// Input bytes the codec consumed from the front of the slice it was
    /// given. May be less than the slice length when the packet holds more
    /// frames.
    pub consumed: usize,
    /// Decoded audio, interleaved native-endian signed 16-bit. May be empty
    /// while the codec is priming.
    pub pcm: Vec<u8>,
}

/// A translated seek request, already in the backend's native domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekRequest {
    /// Target timestamp in the selected stream's time base.
    Timestamp(u64),
    /// Approximate byte offset into the container, for streams whose
    /// timestamps cannot be trusted.
    BytePosition(u64),
}

/// Container-level facts used for bitrate math and format identification.
#[derive(Debug, Clone, Default)]
pub struct ContainerProps {
    /// Total container size in bytes, when the source has a known length.
    pub byte_len: Option<u64>,
    /// Total duration, when the container reports one.
    pub duration: Option<Duration>,
    /// Container-reported bitrate in bits per second, when available.
    pub bit_rate: Option<u32>,
    /// Short container format name (e.g. "mp3", "ogg"), when available.
    pub format_name: Option<String>,
}

/// Textual metadata carried at container level.
#[derive(Debug, Clone, Default)]
pub struct ContainerMetadata {
    pub track: Option<u32>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Failures reported by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The container could not be opened or probed.
    #[error("failed to open container: {0}")]
    Open(String),
    /// No codec could be selected or initialized for a stream.
    #[error("no usable codec: {0}")]
    Codec(String),
    /// A compressed frame could not be decoded.
    #[error("corrupt frame: {0}")]
    Decode(String),
    /// A seek request could not be satisfied.
    #[error("seek failed: {0}")]
    Seek(String),
    /// I/O error from the underlying source.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A codec instance bound to one stream.
#[cfg_attr(test, mockall::automock)]
pub trait PacketDecoder: Send {
    /// Decode the next frame out of `input`, reporting consumed input bytes
    /// and the PCM produced. Errors mean the frame at the cursor is
    /// undecodable; the caller decides how much of the packet to abandon.
    fn decode(&mut self, input: &[u8]) -> BackendResult<DecodeStep>;

    /// Drop any internal codec state after a seek, so stale history cannot
    /// bleed into post-seek output.
    fn reset(&mut self) {}
}

/// An opened, probed container.
#[cfg_attr(test, mockall::automock)]
pub trait MediaContainer: Send {
    /// All streams the probe found, in container order.
    fn streams(&self) -> Vec<StreamInfo>;

    /// Create a decoder for the stream at `stream_index`.
    fn new_decoder(&mut self, stream_index: usize) -> BackendResult<Box<dyn PacketDecoder>>;

    /// Pull the next compressed packet. `Ok(None)` is genuine end of stream;
    /// `Err` is an I/O failure.
    fn read_packet(&mut self) -> BackendResult<Option<Packet>>;

    /// Reposition the demuxer. On success the next packet read starts at or
    /// before the requested target.
    fn seek(&mut self, stream_index: usize, request: SeekRequest) -> BackendResult<()>;

    fn properties(&self) -> ContainerProps;

    /// Container-level textual metadata. `&mut` because some backends read
    /// metadata lazily from the source.
    fn metadata(&mut self) -> ContainerMetadata;
}

/// Entry point of one concrete media library.
#[cfg_attr(test, mockall::automock)]
pub trait MediaBackend: Send + Sync {
    /// Process-wide one-time initialization. Called once before the first
    /// open; never torn down per-session.
    fn init(&self) {}

    /// Open and probe `path`. Partial resources acquired along the way are
    /// released before the error returns.
    fn open(&self, path: &Path) -> BackendResult<Box<dyn MediaContainer>>;
}
