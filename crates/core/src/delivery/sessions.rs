//! Registry of live [`RtpSession`]s, keyed by the RTSP session ID that
//! owns each one.
//!
//! Kept separate from [`crate::session::SessionManager`] (which tracks
//! RFC 2326 request/response state machine bookkeeping) since the two
//! have different lifetimes in principle — a real deployment might
//! keep RTSP sessions around briefly after delivery stops, or vice
//! versa during a renegotiation. Here they are created and destroyed
//! together by the handler.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{PortAllocator, RtpSession};

#[derive(Clone)]
pub struct DeliverySessions {
    sessions: Arc<RwLock<HashMap<String, Mutex<RtpSession>>>>,
}

impl DeliverySessions {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn insert(&self, id: String, session: RtpSession) {
        self.sessions.write().insert(id, Mutex::new(session));
    }

    /// Remove the session and run its teardown sequence. Returns
    /// whether a session was found.
    pub fn remove_and_destroy(&self, id: &str) -> bool {
        match self.sessions.write().remove(id) {
            Some(mutex) => {
                mutex.into_inner().destroy();
                true
            }
            None => false,
        }
    }

    /// Drain all ready slots on a session's delivery loop.
    pub fn drain(&self, id: &str) -> Option<Result<super::DrainOutcome, super::DeliveryError>> {
        let sessions = self.sessions.read();
        sessions.get(id).map(|mutex| mutex.lock().drain())
    }
}

impl Default for DeliverySessions {
    fn default() -> Self {
        Self::new()
    }
}

/// The ambient session-port allocator doesn't reclaim ports (it only
/// ever advances a monotonic counter, wrapping at the top of the
/// range) — releasing a pair is therefore a no-op here, logged so the
/// call site is still visible.
impl PortAllocator for crate::session::SessionManager {
    fn release_port_pair(&self, pair: super::PortPair) {
        tracing::debug!(
            rtp = pair.rtp,
            rtcp = pair.rtcp,
            "port pair released (monotonic allocator does not reclaim)"
        );
    }
}
