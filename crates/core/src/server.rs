use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::delivery::DeliverySessions;
use crate::error::{Result, RtspError};
use crate::resource::registry::ResourceRegistry;
use crate::session::SessionManager;
use crate::transport::tcp;

/// Server-level configuration used by protocol handlers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Public host advertised in SDP `o=` and `c=` lines.
    /// When `None`, host is inferred from request URI/client address.
    pub public_host: Option<String>,
    /// Public RTSP port for future URL-based headers (e.g. RTP-Info).
    pub public_port: Option<u16>,
    /// Server package name used in the SDP `a=tool:` line.
    pub sdp_package: String,
    /// Server version used in the SDP `a=tool:` line.
    pub sdp_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_host: None,
            public_port: None,
            sdp_package: "rtsp-media-core".to_string(),
            sdp_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// High-level RTSP server orchestrator.
///
/// Owns the session manager, the resource registry, and the live RTP
/// delivery sessions. Delegates TCP connection handling to
/// [`transport::tcp`]; RTP delivery itself happens on a per-session
/// [`delivery::Transport`](crate::delivery::Transport) socket pair
/// bound during SETUP, not through a server-wide broadcast socket.
pub struct Server {
    session_manager: SessionManager,
    resources: ResourceRegistry,
    delivery_sessions: DeliverySessions,
    running: Arc<AtomicBool>,
    bind_addr: String,
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(bind_addr: &str) -> Self {
        Self::with_config(bind_addr, ServerConfig::default())
    }

    /// Create a server with custom protocol/SDP configuration.
    pub fn with_config(bind_addr: &str, config: ServerConfig) -> Self {
        Self {
            session_manager: SessionManager::new(),
            resources: ResourceRegistry::new(),
            delivery_sessions: DeliverySessions::new(),
            running: Arc::new(AtomicBool::new(false)),
            bind_addr: bind_addr.to_string(),
            config: Arc::new(config),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RtspError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;

        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let session_manager = self.session_manager.clone();
        let resources = self.resources.clone();
        let delivery_sessions = self.delivery_sessions.clone();
        let config = self.config.clone();

        tracing::info!(addr = %self.bind_addr, "RTSP server listening");

        thread::spawn(move || {
            tcp::accept_loop(
                listener,
                session_manager,
                resources,
                delivery_sessions,
                config,
                running,
            );
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn get_viewers(&self) -> Vec<Viewer> {
        self.session_manager
            .get_playing_sessions()
            .iter()
            .filter_map(|session| {
                session.get_transport().map(|transport| Viewer {
                    session_id: session.id.clone(),
                    uri: session.uri.clone(),
                    client_addr: transport.client_addr.to_string(),
                    client_rtp_port: transport.client_rtp_port,
                })
            })
            .collect()
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Registry of streamable resources served over DESCRIBE/SETUP.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Live per-client RTP delivery sessions.
    pub fn delivery_sessions(&self) -> &DeliverySessions {
        &self.delivery_sessions
    }

    /// Returns the server's protocol configuration.
    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }
}

/// Information about a connected viewer (client in PLAY state).
#[derive(Debug, Clone)]
pub struct Viewer {
    pub session_id: String,
    pub uri: String,
    pub client_addr: String,
    pub client_rtp_port: u16,
}
