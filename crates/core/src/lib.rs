//! # rtsp-media-core — RTP/RTSP media-delivery core
//!
//! A Rust library for publishing live media streams over the Real-Time
//! Streaming Protocol (RTSP), built around an RTP delivery pipeline that
//! is agnostic to the producer (demuxer/encoder) feeding it.
//!
//! ## Protocol references
//!
//! | RFC | Topic | How this crate uses it |
//! |-----|-------|----------------------|
//! | [RFC 2326](https://tools.ietf.org/html/rfc2326) | RTSP 1.0 | Request/response parsing, session lifecycle, transport negotiation |
//! | [RFC 3550](https://tools.ietf.org/html/rfc3550) | RTP/RTCP | Packet header format, SSRC/sequence/timestamp semantics, session delivery loop |
//! | [RFC 4566](https://tools.ietf.org/html/rfc4566) / [RFC 8866](https://tools.ietf.org/html/rfc8866) | SDP | Session description generation for DESCRIBE responses |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Server           — public API, orchestrator │
//! │  ResourceRegistry — named stream endpoints    │
//! ├──────────────────────────────────────────┤
//! │  Protocol  — RTSP parsing, SDP, method handling│
//! │  Session   — RFC 2326 state machine, transport│
//! ├──────────────────────────────────────────┤
//! │  Delivery  — RtpSession, Transport, drain loop│
//! │  Resource  — resource/media description model│
//! │  Track / BufferPool — producer-facing seams   │
//! ├──────────────────────────────────────────┤
//! │  Transport — TCP signaling listener           │
//! │  Media     — RTP header builder               │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use rtsp_core::Server;
//!
//! let mut server = Server::new("0.0.0.0:8554");
//! server.start().unwrap();
//! ```
//!
//! ## Crate layout
//!
//! - [`server`] — High-level [`Server`] orchestrator and [`ServerConfig`].
//! - [`resource`] — [`resource::ResourceDescription`] and [`resource::registry::ResourceRegistry`].
//! - [`protocol`] — RTSP request/response parsing, method handling, SDP generation.
//! - [`session`] — RTSP session state machine and transport negotiation.
//! - [`delivery`] — [`delivery::RtpSession`], its transport, and the live-session registry.
//! - [`track`] / [`bufferpool`] — seams the delivery pipeline plugs into on the producer side.
//! - [`transport`] — TCP listener for RTSP signaling.
//! - [`media`] — RTP header builder.
//! - [`error`] — [`RtspError`] enum and [`Result`] alias.

pub mod bufferpool;
pub mod delivery;
pub mod error;
pub mod media;
pub mod protocol;
pub mod resource;
pub mod server;
pub mod session;
pub mod track;
pub mod transport;

pub use error::{Result, RtspError};
pub use resource::registry::{DEFAULT_RESOURCE_PATH, ResourceRegistry};
pub use server::{Server, ServerConfig, Viewer};
