//! # Streaming Decode Adapter
//!
//! Turns a container/codec library that emits variable-length compressed
//! packets and variable-length decoded frames into a decoder a playback
//! engine can pull fixed-size byte buffers from, one call at a time.
//!
//! ## Overview
//!
//! - [`backend`] - the opaque capability traits a concrete media library
//!   implements (open/probe, packet reads, frame decodes, seeks)
//! - [`session`] - the decode session: lifecycle, the packet-to-frame loop,
//!   carry-over buffering and seek translation
//! - [`formats`] - extension-table and probe-based format classification
//! - [`plugin`] - the host-facing [`bridge_plugin::DecoderPlugin`] wiring
//!
//! Output is fixed interleaved native-endian S16 at the source's own rate
//! and channel count; resampling is the caller's concern.

pub mod backend;
pub mod bitrate;
pub mod error;
pub mod formats;
pub mod plugin;
pub mod remainder;
pub mod session;

pub use plugin::BackendDecoderPlugin;
pub use session::DecodeSession;

// The contract types hosts see, re-exported for convenience.
pub use bridge_plugin::{
    DecodeProgress, Decoder, DecoderError, DecoderPlugin, ErrorKind, FileTags, SampleFormat,
    SeekError, SoundParams, TagSelection, PLUGIN_API_VERSION,
};
