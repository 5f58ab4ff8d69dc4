//! RTP session delivery loop (RFC 3550 §5, §6).
//!
//! An [`RtpSession`] is the hot runtime object behind one client's RTP
//! stream: it owns the negotiated [`Transport`](transport::Transport),
//! pulls ready slots from a [`BufferConsumer`], turns each into an RTP
//! packet, and sends it. It is distinct from the RTSP-layer
//! [`Session`](crate::session::Session), which only tracks request/response
//! state machine bookkeeping (Ready/Playing/Paused, negotiated ports).

pub mod sessions;
pub mod transport;

use rand::Rng;

use crate::bufferpool::BufferConsumer;
use crate::media::rtp::{self, RtpHeaderInputs};
use crate::track::{Track, TrackSelector};
pub use sessions::DeliverySessions;
pub use transport::{SockType, Transport};

/// Errors from the delivery-loop operations (`drain`, `recv_rtcp`).
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Packet buffer allocation failed; the drain loop stopped early.
    #[error("rtp packet allocation failed")]
    AllocError,

    /// The buffer-low hook returned an unexpected status.
    #[error("buffer-low hook reported a fatal condition")]
    Fatal,

    /// `recv_rtcp` was called for a protocol other than RTCP.
    #[error("recv_rtcp called with a non-RTCP protocol")]
    InvalidProto,

    /// Underlying socket I/O error.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a successful [`RtpSession::drain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The buffer-low hook reports more data is expected.
    Continue,
    /// The buffer-low hook reports end of stream.
    EndOfStream,
}

/// Status returned by the external buffer-low event hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    Ok,
    Eof,
    Other,
}

/// External "buffer running low" notification, invoked once per
/// [`drain`](RtpSession::drain) call after the send loop empties.
pub trait BufferLowHook: Send {
    fn event_buffer_low(&mut self, track: &Track) -> HookStatus;
}

/// A hook that always reports more data is coming; useful for tests and
/// for deployments that manage end-of-stream some other way.
pub struct NeverEndingHook;

impl BufferLowHook for NeverEndingHook {
    fn event_buffer_low(&mut self, _track: &Track) -> HookStatus {
        HookStatus::Ok
    }
}

/// A pair of server-allocated UDP ports, released as a unit.
#[derive(Debug, Clone, Copy)]
pub struct PortPair {
    pub rtp: u16,
    pub rtcp: u16,
}

/// Releases a server port pair back to the allocator it came from.
pub trait PortAllocator: Send + Sync {
    fn release_port_pair(&self, pair: PortPair);
}

/// RTCP protocol selector for [`RtpSession::recv_rtcp`]. Only `Rtcp` is
/// currently handled; `Rtp` exists so the type mirrors the protocol
/// space a caller might accidentally pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proto {
    Rtcp,
    Rtp,
}

/// Sent/received packet and octet counters, kept separately for traffic
/// the server originates (`server`) versus RTCP reports received from
/// the client (`client`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    pub packets: u64,
    pub octets: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RtcpStats {
    pub server: Counters,
    pub client: Counters,
}

/// Per-client RTP delivery state (RFC 3550 §5, §6).
pub struct RtpSession {
    pub ssrc: u32,
    pub start_seq: u16,
    pub start_rtptime: u32,
    track_selector: Box<dyn TrackSelector>,
    consumer: Box<dyn BufferConsumer>,
    transport: Transport,
    rtcp_stats: RtcpStats,
    rtcp_in_buffer: Vec<u8>,
    buffer_low_hook: Box<dyn BufferLowHook>,
    port_allocator: Option<std::sync::Arc<dyn PortAllocator>>,
}

const RTCP_READ_BUF_SIZE: usize = 1500;

impl RtpSession {
    pub fn new(
        track_selector: Box<dyn TrackSelector>,
        consumer: Box<dyn BufferConsumer>,
        transport: Transport,
        buffer_low_hook: Box<dyn BufferLowHook>,
        port_allocator: Option<std::sync::Arc<dyn PortAllocator>>,
    ) -> Self {
        let mut rng = rand::rng();
        let session = Self {
            ssrc: rng.random::<u32>(),
            start_seq: rng.random::<u16>(),
            start_rtptime: rng.random::<u32>(),
            track_selector,
            consumer,
            transport,
            rtcp_stats: RtcpStats::default(),
            rtcp_in_buffer: Vec::new(),
            buffer_low_hook,
            port_allocator,
        };
        tracing::debug!(
            ssrc = format_args!("{:#010X}", session.ssrc),
            start_seq = session.start_seq,
            start_rtptime = session.start_rtptime,
            "rtp session created"
        );
        session
    }

    pub fn rtcp_stats(&self) -> RtcpStats {
        self.rtcp_stats
    }

    fn header_inputs(&self) -> RtpHeaderInputs {
        RtpHeaderInputs {
            ssrc: self.ssrc,
            start_seq: self.start_seq,
            start_rtptime: self.start_rtptime,
        }
    }

    /// Drain all slots currently ready in the buffer pool, packetizing
    /// and sending each over RTP, then invoke the buffer-low hook.
    ///
    /// A send that would block is treated as packet loss (logged at
    /// DEBUG) rather than retried or surfaced — the session keeps
    /// draining. An allocation failure aborts the loop immediately and
    /// returns [`DeliveryError::AllocError`]; slots already sent are not
    /// rolled back.
    pub fn drain(&mut self) -> Result<DrainOutcome, DeliveryError> {
        let inputs = self.header_inputs();

        while let Some(slot) = self.consumer.get_reader() {
            let track = self.track_selector.selected_track();

            let mut probe = Vec::new();
            if probe.try_reserve_exact(12 + slot.data.len()).is_err() {
                tracing::error!("rtp packet allocation failed, aborting drain");
                return Err(DeliveryError::AllocError);
            }
            drop(probe);

            let payload_len = slot.data.len() as u64;
            let packet = rtp::build_packet(&slot, &inputs, &track);

            match self.transport.send_rtp(&packet) {
                Ok(_) => {
                    self.rtcp_stats.server.packets += 1;
                    self.rtcp_stats.server.octets += payload_len;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    tracing::debug!("rtp packet lost: send would block");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "rtp packet lost");
                }
            }

            self.consumer.got_reader();
        }

        let track = self.track_selector.selected_track();
        match self.buffer_low_hook.event_buffer_low(&track) {
            HookStatus::Ok => Ok(DrainOutcome::Continue),
            HookStatus::Eof => {
                tracing::info!("end of stream reached");
                Ok(DrainOutcome::EndOfStream)
            }
            HookStatus::Other => {
                tracing::error!("buffer-low hook reported a fatal condition");
                Err(DeliveryError::Fatal)
            }
        }
    }

    /// Read one RTCP packet from the client, for `proto == Proto::Rtcp`.
    /// Any other protocol returns [`DeliveryError::InvalidProto`]
    /// immediately.
    pub fn recv_rtcp(&mut self, proto: Proto) -> Result<usize, DeliveryError> {
        if proto != Proto::Rtcp {
            return Err(DeliveryError::InvalidProto);
        }

        let mut buf = vec![0u8; RTCP_READ_BUF_SIZE];
        let (n, _peer) = self.transport.recv_rtcp(&mut buf)?;
        buf.truncate(n);
        self.rtcp_in_buffer = buf;
        self.rtcp_stats.client.packets += 1;
        self.rtcp_stats.client.octets += n as u64;
        Ok(n)
    }

    pub fn rtcp_in_buffer(&self) -> &[u8] {
        &self.rtcp_in_buffer
    }

    /// Tear down the session: release the server port pair (UDP only),
    /// close both transport sockets, release the track selection, and
    /// drop the buffer-pool reference. Every step runs regardless of
    /// whether an earlier one had anything to do; consuming `self`
    /// means there is no "next session" pointer to return — the caller
    /// (typically a session map) simply removes its own entry.
    pub fn destroy(self) {
        let RtpSession {
            ssrc,
            mut transport,
            mut track_selector,
            consumer,
            port_allocator,
            ..
        } = self;

        let (rtp_port, rtcp_port) = transport.local_ports();
        if transport.rtp_sock_type() == Some(SockType::Udp) {
            if let (Some(allocator), Some(rtp), Some(rtcp)) = (port_allocator, rtp_port, rtcp_port)
            {
                allocator.release_port_pair(PortPair { rtp, rtcp });
            }
        }

        transport.close();
        track_selector.close_tracks();
        consumer.unref();

        tracing::debug!(ssrc = format_args!("{:#010X}", ssrc), "rtp session destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bufferpool::{BufferPoolSlot, ChannelConsumer};
    use crate::delivery::transport::test_support::loopback_transport;
    use crate::track::StaticTrackSelector;

    fn track() -> Track {
        Track {
            payload_type: 96,
            clock_rate: 90000,
        }
    }

    fn make_session() -> (std::sync::mpsc::Sender<BufferPoolSlot>, RtpSession) {
        let (tx, consumer) = ChannelConsumer::channel();
        let transport = loopback_transport();
        let session = RtpSession::new(
            Box::new(StaticTrackSelector::new(track())),
            Box::new(consumer),
            transport,
            Box::new(NeverEndingHook),
            None,
        );
        (tx, session)
    }

    #[test]
    fn drain_sends_all_ready_slots_and_updates_stats() {
        let (tx, mut session) = make_session();
        tx.send(BufferPoolSlot {
            data: vec![1, 2, 3],
            marker: true,
            slot_seq: 1,
            timestamp: 0.0,
            rtp_time: 0,
        })
        .unwrap();

        let outcome = session.drain().unwrap();
        assert_eq!(outcome, DrainOutcome::Continue);
        assert_eq!(session.rtcp_stats().server.packets, 1);
        assert_eq!(session.rtcp_stats().server.octets, 3);
    }

    #[test]
    fn drain_with_no_slots_still_calls_hook() {
        let (_tx, mut session) = make_session();
        assert_eq!(session.drain().unwrap(), DrainOutcome::Continue);
    }

    #[test]
    fn recv_rtcp_rejects_non_rtcp_proto() {
        let (_tx, mut session) = make_session();
        assert!(matches!(
            session.recv_rtcp(Proto::Rtp),
            Err(DeliveryError::InvalidProto)
        ));
    }

    #[test]
    fn destroy_consumes_session_without_panicking() {
        let (_tx, session) = make_session();
        session.destroy();
    }

    /// A [`BufferConsumer`] double that yields a fixed list of slots and
    /// records how many times `got_reader` was called.
    struct RecordingConsumer {
        slots: std::collections::VecDeque<BufferPoolSlot>,
        got_reader_calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl BufferConsumer for RecordingConsumer {
        fn get_reader(&mut self) -> Option<BufferPoolSlot> {
            self.slots.pop_front()
        }

        fn got_reader(&mut self) {
            self.got_reader_calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }

        fn unref(self: Box<Self>) {}
    }

    /// An [`transport::RtpSocket`] double whose `write` succeeds a fixed
    /// number of times, then errors on every call after.
    struct FailAfterWrites {
        oks_remaining: std::cell::Cell<u32>,
    }

    impl transport::RtpSocket for FailAfterWrites {
        fn write(
            &self,
            buf: &[u8],
            _peer: Option<std::net::SocketAddr>,
        ) -> std::io::Result<usize> {
            let remaining = self.oks_remaining.get();
            if remaining == 0 {
                return Err(std::io::Error::other("send failed"));
            }
            self.oks_remaining.set(remaining - 1);
            Ok(buf.len())
        }

        fn read(&self, _buf: &mut [u8]) -> std::io::Result<(usize, Option<std::net::SocketAddr>)> {
            Ok((0, None))
        }

        fn local_port(&self) -> u16 {
            0
        }

        fn sock_type(&self) -> SockType {
            SockType::Local
        }
    }

    /// spec scenario 6: two slots, the second write fails. Expect one
    /// successful send, octets counted for the sent slot only, both
    /// slots acknowledged via `got_reader`, the loop exits normally, and
    /// the buffer-low hook runs exactly once.
    #[test]
    fn drain_with_one_write_failure() {
        let slot_a = BufferPoolSlot {
            data: vec![1, 2, 3],
            marker: false,
            slot_seq: 1,
            timestamp: 0.0,
            rtp_time: 0,
        };
        let slot_b = BufferPoolSlot {
            data: vec![9, 9],
            marker: false,
            slot_seq: 2,
            timestamp: 0.0,
            rtp_time: 0,
        };

        let got_reader_calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let consumer = RecordingConsumer {
            slots: std::collections::VecDeque::from(vec![slot_a.clone(), slot_b]),
            got_reader_calls: got_reader_calls.clone(),
        };

        let rtp_socket = FailAfterWrites {
            oks_remaining: std::cell::Cell::new(1),
        };
        let rtcp_socket = FailAfterWrites {
            oks_remaining: std::cell::Cell::new(0),
        };
        let peer = "127.0.0.1:9".parse().unwrap();
        let transport = Transport::new(Box::new(rtp_socket), Box::new(rtcp_socket), peer);

        let mut session = RtpSession::new(
            Box::new(StaticTrackSelector::new(track())),
            Box::new(consumer),
            transport,
            Box::new(NeverEndingHook),
            None,
        );

        let outcome = session.drain().unwrap();
        assert_eq!(outcome, DrainOutcome::Continue);
        assert_eq!(session.rtcp_stats().server.packets, 1);
        assert_eq!(session.rtcp_stats().server.octets, slot_a.data.len() as u64);
        assert_eq!(got_reader_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
