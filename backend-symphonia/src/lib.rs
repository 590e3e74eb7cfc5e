//! # Symphonia Media Backend
//!
//! Implements the `core-decode` capability traits over the Symphonia
//! pure-Rust media library: container probing, packet reads, frame decodes
//! and seeks all go through Symphonia's `FormatReader`/`Decoder` pair.
//!
//! Decoded output is converted to the adapter's fixed format - interleaved
//! native-endian signed 16-bit - regardless of what the codec produced.

mod container;
mod converter;
mod decoder;

pub use container::SymphoniaContainer;
pub use converter::SampleConverter;

use bytes::Bytes;
use core_decode::backend::{BackendError, BackendResult, MediaBackend, MediaContainer};
use core_decode::BackendDecoderPlugin;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::probe::Hint;
use tracing::debug;

/// The Symphonia-backed [`MediaBackend`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaBackend;

impl SymphoniaBackend {
    pub fn new() -> Self {
        Self
    }

    /// Open an in-memory source, e.g. a pre-fetched or cached track.
    pub fn open_bytes(
        data: Bytes,
        extension: Option<&str>,
    ) -> BackendResult<Box<dyn MediaContainer>> {
        let byte_len = Some(data.len() as u64);
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }
        let cursor = Cursor::new(data.to_vec());
        let source = Box::new(cursor) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(source, Default::default());
        SymphoniaContainer::open(mss, &hint, byte_len)
    }
}

impl MediaBackend for SymphoniaBackend {
    fn init(&self) {
        // Symphonia's probe and codec registries are static; there is no
        // process-wide state to build.
        debug!("symphonia backend ready");
    }

    fn open(&self, path: &Path) -> BackendResult<Box<dyn MediaContainer>> {
        let file = File::open(path)
            .map_err(|err| BackendError::Open(format!("{}: {err}", path.display())))?;
        let byte_len = file.metadata().ok().map(|m| m.len());

        let source = Box::new(file) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(source, Default::default());
        SymphoniaContainer::open(mss, &hint_for_path(path), byte_len)
    }
}

/// Build a plugin serving the host through this backend.
pub fn decoder_plugin() -> BackendDecoderPlugin {
    BackendDecoderPlugin::new(Arc::new(SymphoniaBackend::new()))
}

/// Guide probing with the file extension when there is one; probing still
/// verifies against actual content.
fn hint_for_path(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }
    hint
}
