//! Host-facing plugin entry points, wired over one media backend.

use crate::backend::MediaBackend;
use crate::formats;
use crate::session::DecodeSession;
use bridge_plugin::{Decoder, DecoderPlugin, FileTags, TagSelection};
use parking_lot::Once;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A [`DecoderPlugin`] over any [`MediaBackend`].
///
/// One instance serves the whole process. The backend's process-wide
/// initialization runs exactly once no matter how often the host calls
/// `init`.
pub struct BackendDecoderPlugin {
    backend: Arc<dyn MediaBackend>,
    init_once: Once,
}

impl BackendDecoderPlugin {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            init_once: Once::new(),
        }
    }
}

impl DecoderPlugin for BackendDecoderPlugin {
    fn init(&self) {
        self.init_once.call_once(|| self.backend.init());
    }

    fn open(&self, path: &Path) -> Box<dyn Decoder> {
        Box::new(DecodeSession::open(self.backend.as_ref(), path))
    }

    fn tags(&self, path: &Path, selection: TagSelection) -> FileTags {
        let mut tags = FileTags::default();
        let mut container = match self.backend.open(path) {
            Ok(container) => container,
            Err(err) => {
                debug!(error = %err, path = %path.display(), "tag probe failed");
                return tags;
            }
        };

        if selection.contains(TagSelection::COMMENTS) {
            let meta = container.metadata();
            tags.track = meta.track;
            tags.title = meta.title;
            tags.artist = meta.artist;
            tags.album = meta.album;
        }
        if selection.contains(TagSelection::TIME) {
            tags.duration_secs = container.properties().duration.map(|d| d.as_secs());
        }
        tags
    }

    fn supports_extension(&self, ext: &str) -> bool {
        formats::supports_extension(ext)
    }

    fn supports_file(&self, path: &Path) -> bool {
        formats::supports_file(self.backend.as_ref(), path)
    }

    fn identify(&self, path: &Path) -> String {
        formats::identify(self.backend.as_ref(), path)
    }
}
