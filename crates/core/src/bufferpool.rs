//! Buffer-pool consumer contract between an [`RtpSession`](crate::delivery::RtpSession)
//! and the producer side (demuxer/encoder) feeding it encoded frames.
//!
//! The producer side — the actual ring buffer, its slot allocation
//! policy, and whatever demuxer fills it — is out of scope: it is the
//! other half of a system this crate only delivers for. [`BufferConsumer`]
//! is the seam a real producer plugs into; [`ChannelConsumer`] is a
//! minimal reference implementation used by tests.

use std::sync::mpsc;

/// A single ready-to-send unit handed from the producer to the RTP
/// session.
#[derive(Debug, Clone)]
pub struct BufferPoolSlot {
    /// Already-framed, MTU-sized payload bytes (no RTP header).
    pub data: Vec<u8>,
    /// Set on the last slot of an access unit (RFC 3550 §5.1 marker bit).
    pub marker: bool,
    /// Monotonic counter assigned by the producer; wraps at 2^16.
    pub slot_seq: u16,
    /// Wall-clock capture time, seconds.
    pub timestamp: f64,
    /// Explicit RTP clock ticks for this slot; `0` means "derive from
    /// `timestamp * clock_rate`".
    pub rtp_time: u32,
}

impl BufferPoolSlot {
    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}

/// Consumer side of the buffer-pool contract, owned by an `RtpSession`.
pub trait BufferConsumer: Send {
    /// Take the next ready slot, if any, without blocking.
    fn get_reader(&mut self) -> Option<BufferPoolSlot>;

    /// Acknowledge that the slot returned by the last [`get_reader`](Self::get_reader)
    /// has been consumed and may be reused by the producer.
    fn got_reader(&mut self);

    /// Drop this consumer's reference to the pool. Called once, from
    /// [`RtpSession::destroy`](crate::delivery::RtpSession::destroy).
    fn unref(self: Box<Self>);
}

/// Minimal `std::sync::mpsc`-backed [`BufferConsumer`], used as a test
/// fixture. Since a channel receive already transfers ownership of the
/// slot, `got_reader` here is a no-op — there is nothing left to
/// reclaim.
pub struct ChannelConsumer {
    rx: mpsc::Receiver<BufferPoolSlot>,
}

impl ChannelConsumer {
    pub fn new(rx: mpsc::Receiver<BufferPoolSlot>) -> Self {
        Self { rx }
    }

    /// Convenience constructor pairing a sender with the consumer.
    pub fn channel() -> (mpsc::Sender<BufferPoolSlot>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl BufferConsumer for ChannelConsumer {
    fn get_reader(&mut self) -> Option<BufferPoolSlot> {
        self.rx.try_recv().ok()
    }

    fn got_reader(&mut self) {}

    fn unref(self: Box<Self>) {
        tracing::debug!("buffer consumer released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_consumer_returns_sent_slots_in_order() {
        let (tx, mut consumer) = ChannelConsumer::channel();
        tx.send(BufferPoolSlot {
            data: vec![1, 2, 3],
            marker: false,
            slot_seq: 1,
            timestamp: 0.0,
            rtp_time: 0,
        })
        .unwrap();

        let slot = consumer.get_reader().expect("slot available");
        assert_eq!(slot.data_size(), 3);
        consumer.got_reader();
        assert!(consumer.get_reader().is_none());
    }

    #[test]
    fn channel_consumer_empty_returns_none() {
        let (_tx, mut consumer) = ChannelConsumer::channel();
        assert!(consumer.get_reader().is_none());
    }
}
