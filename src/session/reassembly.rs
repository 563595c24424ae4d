//! Reassembly of multi-part server messages.

use bytes::{BufMut, BytesMut};

#[derive(Debug)]
struct Accumulation {
    message_id: u8,
    remaining: u8,
    buffer: BytesMut,
}

/// Per-session scratch state for one in-flight multi-part message.
///
/// The remote never interleaves two multi-part messages, so at most one
/// accumulation exists; a new fragment 0 discards any unfinished one.
/// Fragments are assumed to arrive in order; an out-of-order fragment is
/// dropped, not reordered.
#[derive(Debug, Default)]
pub struct Reassembler {
    current: Option<Accumulation>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment; returns the full payload once all parts arrived.
    pub fn on_fragment(
        &mut self,
        message_id: u8,
        index: u8,
        total: u8,
        bytes: &[u8],
    ) -> Option<Vec<u8>> {
        if index == 0 {
            if let Some(dropped) = self.current.take() {
                tracing::debug!(
                    message_id = dropped.message_id,
                    remaining = dropped.remaining,
                    "discarding unfinished multi-part accumulation"
                );
            }
            if total == 0 {
                return None;
            }
            self.current = Some(Accumulation {
                message_id,
                remaining: total,
                buffer: BytesMut::new(),
            });
        }

        let acc = match &mut self.current {
            Some(acc) if acc.message_id == message_id => acc,
            _ => return None,
        };

        acc.buffer.put_slice(bytes);
        acc.remaining -= 1;

        if acc.remaining == 0 {
            let done = self.current.take()?;
            Some(done.buffer.to_vec())
        } else {
            None
        }
    }

    /// Drop any unfinished accumulation; a non-fragmented message arrived.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_fragments_concatenate() {
        let mut r = Reassembler::new();
        assert!(r.on_fragment(7, 0, 3, b"Hel").is_none());
        assert!(r.on_fragment(7, 1, 3, b"lo ").is_none());
        assert_eq!(r.on_fragment(7, 2, 3, b"world"), Some(b"Hello world".to_vec()));
    }

    #[test]
    fn single_fragment_completes_immediately() {
        let mut r = Reassembler::new();
        assert_eq!(r.on_fragment(1, 0, 1, b"ping"), Some(b"ping".to_vec()));
    }

    #[test]
    fn new_fragment_zero_discards_unfinished_message() {
        let mut r = Reassembler::new();
        assert!(r.on_fragment(4, 0, 2, b"old").is_none());
        assert!(r.on_fragment(5, 0, 2, b"ne").is_none());
        assert_eq!(r.on_fragment(5, 1, 2, b"w"), Some(b"new".to_vec()));
    }

    #[test]
    fn reset_discards_unfinished_message() {
        let mut r = Reassembler::new();
        assert!(r.on_fragment(2, 0, 2, b"half").is_none());
        r.reset();
        // A late continuation of the discarded message is dropped.
        assert!(r.on_fragment(2, 1, 2, b"done").is_none());
    }

    #[test]
    fn continuation_without_a_start_is_dropped() {
        let mut r = Reassembler::new();
        assert!(r.on_fragment(9, 1, 2, b"tail").is_none());
    }
}
