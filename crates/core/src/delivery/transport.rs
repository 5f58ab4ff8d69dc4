//! Transport facade: the dual RTP/RTCP socket pair behind an
//! [`RtpSession`](super::RtpSession).
//!
//! RTP packets only ever need to be *sent*; RTCP packets only ever need
//! to be *received* (sender reports are a Non-goal — see the crate
//! root docs). [`Transport`] keeps one socket for each direction so
//! that distinction is visible in the type, not just convention.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::os::unix::net::UnixDatagram;

use parking_lot::RwLock;

/// Which kind of socket backs one side of a [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockType {
    Udp,
    /// Local IPC socket — no peer address, reads never populate one.
    Local,
    /// Interleaved RTSP/TCP transport (RFC 2326 §10.12). Structurally
    /// supported so the socket abstraction covers the full space named
    /// in the protocol; the RTSP signalling layer in this crate does
    /// not currently negotiate it.
    Tcp,
}

/// A socket that can back one side (RTP-send or RTCP-receive) of a
/// [`Transport`]. Implemented for the standard library socket types;
/// a real deployment may substitute its own (e.g. a socket shared with
/// a larger I/O reactor).
pub trait RtpSocket: Send {
    fn write(&self, buf: &[u8], peer: Option<SocketAddr>) -> io::Result<usize>;
    fn read(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)>;
    fn local_port(&self) -> u16;
    fn sock_type(&self) -> SockType;
}

impl RtpSocket for UdpSocket {
    fn write(&self, buf: &[u8], peer: Option<SocketAddr>) -> io::Result<usize> {
        match peer {
            Some(addr) => self.send_to(buf, addr),
            None => self.send(buf),
        }
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)> {
        let (n, addr) = self.recv_from(buf)?;
        Ok((n, Some(addr)))
    }

    fn local_port(&self) -> u16 {
        self.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    fn sock_type(&self) -> SockType {
        SockType::Udp
    }
}

impl RtpSocket for UnixDatagram {
    fn write(&self, buf: &[u8], _peer: Option<SocketAddr>) -> io::Result<usize> {
        self.send(buf)
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)> {
        let n = self.recv(buf)?;
        Ok((n, None))
    }

    fn local_port(&self) -> u16 {
        0
    }

    fn sock_type(&self) -> SockType {
        SockType::Local
    }
}

/// Owns the RTP send socket and RTCP receive socket for one client.
///
/// `close` is idempotent: both sockets are `Option`s taken on first
/// close, so a repeated call (or a call after construction never set
/// one up) is a no-op rather than a double-close error.
pub struct Transport {
    rtp_socket: Option<Box<dyn RtpSocket>>,
    rtcp_socket: Option<Box<dyn RtpSocket>>,
    rtp_peer: SocketAddr,
    last_peer: RwLock<Option<SocketAddr>>,
}

impl Transport {
    pub fn new(
        rtp_socket: Box<dyn RtpSocket>,
        rtcp_socket: Box<dyn RtpSocket>,
        rtp_peer: SocketAddr,
    ) -> Self {
        Self {
            rtp_socket: Some(rtp_socket),
            rtcp_socket: Some(rtcp_socket),
            rtp_peer,
            last_peer: RwLock::new(None),
        }
    }

    /// Send one RTP packet to the negotiated client address.
    pub fn send_rtp(&self, buf: &[u8]) -> io::Result<usize> {
        let sock = self
            .rtp_socket
            .as_deref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))?;
        sock.write(buf, Some(self.rtp_peer))
    }

    /// Read one RTCP packet, caching the sender address (when the
    /// socket type provides one) into [`last_peer`](Self::last_peer).
    pub fn recv_rtcp(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)> {
        let sock = self
            .rtcp_socket
            .as_deref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))?;
        let (n, peer) = sock.read(buf)?;
        if let Some(addr) = peer {
            *self.last_peer.write() = Some(addr);
        }
        Ok((n, peer))
    }

    /// Address most recently observed on an RTCP read (UDP only).
    pub fn last_peer(&self) -> Option<SocketAddr> {
        *self.last_peer.read()
    }

    pub fn local_ports(&self) -> (Option<u16>, Option<u16>) {
        (
            self.rtp_socket.as_deref().map(RtpSocket::local_port),
            self.rtcp_socket.as_deref().map(RtpSocket::local_port),
        )
    }

    pub fn rtp_sock_type(&self) -> Option<SockType> {
        self.rtp_socket.as_deref().map(RtpSocket::sock_type)
    }

    /// Drop both sockets. Safe to call more than once.
    pub fn close(&mut self) {
        self.rtp_socket = None;
        self.rtcp_socket = None;
    }
}

/// Fixtures for tests within this crate that need a working `Transport`
/// without a real client.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn loopback_transport() -> Transport {
        let rtp = UdpSocket::bind("127.0.0.1:0").expect("bind rtp socket");
        let rtcp = UdpSocket::bind("127.0.0.1:0").expect("bind rtcp socket");
        rtp.set_nonblocking(true).unwrap();
        rtcp.set_nonblocking(true).unwrap();
        let peer = rtp.local_addr().unwrap();
        Transport::new(Box::new(rtp), Box::new(rtcp), peer)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::loopback_transport;
    use super::*;

    #[test]
    fn send_rtp_succeeds_on_loopback() {
        let transport = loopback_transport();
        transport.send_rtp(&[1, 2, 3]).unwrap();
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = loopback_transport();
        transport.close();
        transport.close();
        assert!(transport.send_rtp(&[1]).is_err());
    }

    #[test]
    fn local_ports_reports_udp_sock_type() {
        let transport = loopback_transport();
        assert_eq!(transport.rtp_sock_type(), Some(SockType::Udp));
        let (rtp_port, rtcp_port) = transport.local_ports();
        assert!(rtp_port.unwrap() > 0);
        assert!(rtcp_port.unwrap() > 0);
    }
}
