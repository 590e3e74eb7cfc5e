//! Single-slot error channel owned by each decode session.

use bridge_plugin::DecoderError;

/// Holds at most one pending error per session.
///
/// `set` always overwrites - the channel never accumulates. The slot is
/// cleared at the top of every decode call and at session teardown, so a
/// query between calls reflects only the most recent call's outcome.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    slot: Option<DecoderError>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing whatever was there.
    pub fn set(&mut self, error: DecoderError) {
        self.slot = Some(error);
    }

    /// Reset to "no error".
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Snapshot copy of the pending error. Reading never clears the slot.
    pub fn get(&self) -> Option<DecoderError> {
        self.slot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_plugin::ErrorKind;

    #[test]
    fn set_overwrites_instead_of_accumulating() {
        let mut channel = ErrorChannel::new();
        channel.set(DecoderError::stream(0, "first"));
        channel.set(DecoderError::fatal(0, "second"));

        let pending = channel.get().unwrap();
        assert_eq!(pending.kind, ErrorKind::Fatal);
        assert_eq!(pending.message, "second");
    }

    #[test]
    fn get_is_a_snapshot_not_a_take() {
        let mut channel = ErrorChannel::new();
        channel.set(DecoderError::stream(0, "bad frame"));

        assert!(channel.get().is_some());
        assert!(channel.get().is_some());
    }

    #[test]
    fn clear_resets_to_no_error() {
        let mut channel = ErrorChannel::new();
        channel.set(DecoderError::stream(0, "bad frame"));
        channel.clear();
        assert!(channel.get().is_none());
    }
}
