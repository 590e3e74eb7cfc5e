//! # Host Plugin Contract
//!
//! The contract between a host player and a streaming decoder plugin.
//!
//! ## Overview
//!
//! This crate defines the fixed, versioned surface a host player calls to
//! drive a decoder: open a file, pull fixed-size PCM buffers from it, seek,
//! and query bitrate, duration, tags and errors. Concrete decoders (e.g. the
//! adapter in `core-decode`) implement these traits; the host discovers them
//! through whatever registration mechanism it uses and never needs to know
//! which container/codec library sits underneath.
//!
//! ## Traits
//!
//! - [`DecoderPlugin`](decoder::DecoderPlugin) - file-level entry points
//!   (open, tag reading, format classification)
//! - [`Decoder`](decoder::Decoder) - one opened stream (decode, seek,
//!   bitrate, error queries)
//!
//! ## Calling convention
//!
//! One `Decoder` is driven by one logical caller in strict sequence: open,
//! decode*/seek*, close. There is no internal locking; hosts that want to
//! pre-buffer the next track open a second, fully independent decoder.
//! All calls are synchronous.

pub mod decoder;
pub mod error;
pub mod params;
pub mod tags;

pub use decoder::{Decoder, DecoderPlugin, SeekError, PLUGIN_API_VERSION};
pub use error::{DecoderError, ErrorKind};
pub use params::{DecodeProgress, SampleFormat, SoundParams};
pub use tags::{FileTags, TagSelection};
