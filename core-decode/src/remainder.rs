//! Carry-over buffer for decoded-but-undelivered audio bytes.

/// Holds decoded audio that did not fit into the caller's buffer.
///
/// The single invariant: it carries exactly the undelivered decoded bytes,
/// in order. Two write modes serve that invariant - `replace` stores the
/// overflow tail of a frame that partially fit, `append` accumulates whole
/// frames produced while the caller's buffer was already saturated. Draining
/// always happens from the front; a full drain releases the allocation.
#[derive(Debug, Default)]
pub struct RemainderBuffer {
    bytes: Vec<u8>,
}

impl RemainderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Overwrite the buffer with the undelivered tail of a frame.
    pub fn replace(&mut self, tail: &[u8]) {
        tracing::trace!(bytes = tail.len(), "carrying frame tail");
        self.bytes.clear();
        self.bytes.extend_from_slice(tail);
    }

    /// Add a whole frame behind whatever is already pending.
    pub fn append(&mut self, frame: &[u8]) {
        tracing::trace!(bytes = frame.len(), pending = self.bytes.len(), "appending to carry-over");
        self.bytes.extend_from_slice(frame);
    }

    /// Copy up to `out.len()` pending bytes into `out`, compacting what is
    /// left. Returns the number of bytes copied.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.bytes.len());
        if n == 0 {
            return 0;
        }
        out[..n].copy_from_slice(&self.bytes[..n]);
        if n == self.bytes.len() {
            self.clear();
        } else {
            self.bytes.drain(..n);
        }
        n
    }

    /// Empty the buffer and release its allocation.
    pub fn clear(&mut self) {
        self.bytes = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_discards_prior_content() {
        let mut buf = RemainderBuffer::new();
        buf.replace(&[1, 2, 3]);
        buf.replace(&[9, 8]);

        let mut out = [0u8; 8];
        assert_eq!(buf.drain_into(&mut out), 2);
        assert_eq!(&out[..2], &[9, 8]);
    }

    #[test]
    fn append_accumulates_behind_pending_bytes() {
        let mut buf = RemainderBuffer::new();
        buf.replace(&[1, 2]);
        buf.append(&[3, 4, 5]);

        let mut out = [0u8; 8];
        assert_eq!(buf.drain_into(&mut out), 5);
        assert_eq!(&out[..5], &[1, 2, 3, 4, 5]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_drain_compacts_from_the_front() {
        let mut buf = RemainderBuffer::new();
        buf.replace(&[10, 20, 30, 40]);

        let mut out = [0u8; 3];
        assert_eq!(buf.drain_into(&mut out), 3);
        assert_eq!(out, [10, 20, 30]);
        assert_eq!(buf.len(), 1);

        let mut rest = [0u8; 3];
        assert_eq!(buf.drain_into(&mut rest), 1);
        assert_eq!(rest[0], 40);
        assert!(buf.is_empty());
    }

    #[test]
    fn full_drain_leaves_buffer_empty() {
        let mut buf = RemainderBuffer::new();
        buf.replace(&[1, 2, 3]);

        let mut out = [0u8; 3];
        assert_eq!(buf.drain_into(&mut out), 3);
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn drain_into_empty_slice_is_a_no_op() {
        let mut buf = RemainderBuffer::new();
        buf.replace(&[1, 2, 3]);

        let mut out = [0u8; 0];
        assert_eq!(buf.drain_into(&mut out), 0);
        assert_eq!(buf.len(), 3);
    }
}
