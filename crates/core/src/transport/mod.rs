//! Network transport layer for RTSP signaling.
//!
//! RTSP uses a split transport model: TCP carries the request/response
//! signaling handled here by [`tcp`]; RTP/RTCP media delivery runs over
//! per-session UDP sockets owned by [`crate::delivery::transport::Transport`],
//! bound during SETUP rather than shared across the server.
//!
//! Future: interleaved TCP transport (RFC 2326 §10.12) will multiplex
//! RTP data onto the RTSP TCP connection using `$` framing.

pub mod tcp;
