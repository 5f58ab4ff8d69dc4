//! RTP packet construction.
//!
//! ## RTP overview (RFC 3550)
//!
//! Every RTP packet carries a 12-byte fixed header ([`rtp`]) containing:
//!
//! - **Sequence number** (16-bit, wrapping) — for reordering and loss detection.
//! - **Timestamp** (32-bit) — media clock, typically 90 kHz for video.
//! - **SSRC** (32-bit) — randomly chosen to identify the sender.
//! - **Marker bit** — set on the last packet of an access unit (frame).
//!
//! Framing encoded data into MTU-sized payloads (H.264 NAL splitting and
//! FU-A fragmentation, H.265, MJPEG, etc.) is producer-side work and out
//! of scope here: this module only builds the header around an
//! already-framed [`BufferPoolSlot`](crate::bufferpool::BufferPoolSlot).

pub mod rtp;
