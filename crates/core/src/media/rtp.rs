//! RTP fixed header construction (RFC 3550 §5.1).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Version is always 2. Padding, extension, and CSRC count are always 0.
//! Unlike a per-codec packetizer holding a running sequence/timestamp
//! counter, this header is derived per-packet from the owning session's
//! starting sequence/timestamp/SSRC and the slot being sent — the
//! session, not the header, is the stateful object.

use crate::bufferpool::BufferPoolSlot;
use crate::track::Track;

/// Per-session inputs needed to derive a packet's sequence number,
/// timestamp, and SSRC. Kept separate from `RtpSession` itself so this
/// module has no dependency on the delivery layer.
#[derive(Debug, Clone, Copy)]
pub struct RtpHeaderInputs {
    pub ssrc: u32,
    pub start_seq: u16,
    pub start_rtptime: u32,
}

/// Build the 12-byte RTP fixed header for `slot`.
///
/// `sequence = start_seq + slot_seq - 1` (mod 2^16): slot sequence
/// numbers start at 1, so the first slot maps to `start_seq` itself.
///
/// `timestamp = start_rtptime + rtp_delta`, where `rtp_delta` is
/// `slot.rtp_time` if nonzero, else `round(slot.timestamp * track.clock_rate)`.
pub fn header_bytes(slot: &BufferPoolSlot, session: &RtpHeaderInputs, track: &Track) -> [u8; 12] {
    let rtp_delta = if slot.rtp_time != 0 {
        slot.rtp_time
    } else {
        (slot.timestamp * track.clock_rate as f64).round() as u32
    };

    let sequence = session
        .start_seq
        .wrapping_add(slot.slot_seq)
        .wrapping_sub(1);
    let timestamp = session.start_rtptime.wrapping_add(rtp_delta);

    let mut header = [0u8; 12];
    header[0] = 2 << 6;
    header[1] = ((slot.marker as u8) << 7) | (track.payload_type & 0x7f);
    header[2..4].copy_from_slice(&sequence.to_be_bytes());
    header[4..8].copy_from_slice(&timestamp.to_be_bytes());
    header[8..12].copy_from_slice(&session.ssrc.to_be_bytes());
    header
}

/// Build one full RTP packet for `slot`: the 12-byte fixed header
/// followed by `slot.data` verbatim.
pub fn build_packet(slot: &BufferPoolSlot, session: &RtpHeaderInputs, track: &Track) -> Vec<u8> {
    let mut packet = Vec::with_capacity(12 + slot.data.len());
    packet.extend_from_slice(&header_bytes(slot, session, track));
    packet.extend_from_slice(&slot.data);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(slot_seq: u16, timestamp: f64, rtp_time: u32, marker: bool) -> BufferPoolSlot {
        BufferPoolSlot {
            data: Vec::new(),
            marker,
            slot_seq,
            timestamp,
            rtp_time,
        }
    }

    fn track() -> Track {
        Track {
            payload_type: 96,
            clock_rate: 90000,
        }
    }

    #[test]
    fn version_is_2() {
        let inputs = RtpHeaderInputs {
            ssrc: 0xAABBCCDD,
            start_seq: 1000,
            start_rtptime: 500000,
        };
        let buf = header_bytes(&slot(1, 0.04, 0, false), &inputs, &track());
        assert_eq!(buf[0] >> 6, 2);
    }

    #[test]
    fn marker_and_payload_type() {
        let inputs = RtpHeaderInputs {
            ssrc: 0,
            start_seq: 0,
            start_rtptime: 0,
        };
        let buf = header_bytes(&slot(1, 0.0, 0, true), &inputs, &track());
        assert_eq!(buf[1] & 0x80, 0x80);
        assert_eq!(buf[1] & 0x7f, 96);
    }

    #[test]
    fn sequence_and_timestamp_from_clock_rate() {
        let inputs = RtpHeaderInputs {
            ssrc: 0,
            start_seq: 1000,
            start_rtptime: 500000,
        };
        let buf = header_bytes(&slot(1, 0.04, 0, false), &inputs, &track());
        let seq = u16::from_be_bytes([buf[2], buf[3]]);
        let ts = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        assert_eq!(seq, 1000);
        assert_eq!(ts, 503600);
    }

    #[test]
    fn explicit_rtp_time_overrides_clock_rate_derivation() {
        let inputs = RtpHeaderInputs {
            ssrc: 0,
            start_seq: 1000,
            start_rtptime: 500000,
        };
        let buf = header_bytes(&slot(1, 0.04, 1234, false), &inputs, &track());
        let ts = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        assert_eq!(ts, 501234);
    }

    #[test]
    fn sequence_wraps() {
        let inputs = RtpHeaderInputs {
            ssrc: 0,
            start_seq: 0xFFFF,
            start_rtptime: 0,
        };
        let buf = header_bytes(&slot(2, 0.0, 0, false), &inputs, &track());
        let seq = u16::from_be_bytes([buf[2], buf[3]]);
        assert_eq!(seq, 0);
    }

    #[test]
    fn ssrc_written() {
        let inputs = RtpHeaderInputs {
            ssrc: 0xAABBCCDD,
            start_seq: 0,
            start_rtptime: 0,
        };
        let buf = header_bytes(&slot(1, 0.0, 0, false), &inputs, &track());
        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        assert_eq!(ssrc, 0xAABBCCDD);
    }

    /// Worked example: session.start_seq=1000, start_rtptime=500000,
    /// ssrc=0xDEADBEEF; slot.slot_seq=1, marker=true, timestamp=0.04,
    /// rtp_time=0; track pt=96, clock_rate=90000. Expects the literal
    /// 12-byte header `80 E0 03 E8 00 07 A1 30 DE AD BE EF`.
    #[test]
    fn header_matches_worked_example() {
        let inputs = RtpHeaderInputs {
            ssrc: 0xDEADBEEF,
            start_seq: 1000,
            start_rtptime: 500000,
        };
        let buf = header_bytes(&slot(1, 0.04, 0, true), &inputs, &track());
        assert_eq!(
            buf,
            [0x80, 0xE0, 0x03, 0xE8, 0x00, 0x07, 0xA1, 0x30, 0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn build_packet_concatenates_header_and_payload() {
        let inputs = RtpHeaderInputs {
            ssrc: 0xDEADBEEF,
            start_seq: 1000,
            start_rtptime: 500000,
        };
        let mut s = slot(1, 0.04, 0, true);
        s.data = vec![0xAA, 0xBB, 0xCC];
        let packet = build_packet(&s, &inputs, &track());
        assert_eq!(packet.len(), 15);
        assert_eq!(
            &packet[..12],
            &[0x80, 0xE0, 0x03, 0xE8, 0x00, 0x07, 0xA1, 0x30, 0xDE, 0xAD, 0xBE, 0xEF]
        );
        assert_eq!(&packet[12..], &[0xAA, 0xBB, 0xCC]);
    }
}
