use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Datagram;

const DRAIN_BUFFER_SIZE: usize = 2048;

/// A bound UDP socket, optionally connected to one emulator endpoint.
///
/// The bridge side uses [`DatagramChannel::connect`]: the socket binds an
/// ephemeral local port and only exchanges datagrams with the configured
/// remote address. [`DatagramChannel::bind`] exists for the emulator side of
/// loopback fixtures.
#[derive(Debug)]
pub struct DatagramChannel {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl DatagramChannel {
    /// Bind an ephemeral local port and connect it to `remote` (blocking mode).
    pub fn connect(remote: SocketAddr) -> Result<Self> {
        let local = match remote {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).map_err(|e| TransportError::Bind {
            addr: local,
            source: e,
        })?;
        socket.connect(remote).map_err(|e| TransportError::Connect {
            addr: remote,
            source: e,
        })?;

        info!(%remote, local = ?socket.local_addr().ok(), "datagram channel connected");

        Ok(Self {
            socket,
            peer: Some(remote),
        })
    }

    /// Bind a local address without connecting.
    ///
    /// Such a channel can only receive until [`DatagramChannel::connect_to`]
    /// fixes a peer.
    pub fn bind(local: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local).map_err(|e| TransportError::Bind {
            addr: local,
            source: e,
        })?;
        debug!(local = ?socket.local_addr().ok(), "datagram channel bound");
        Ok(Self { socket, peer: None })
    }

    /// Connect an already bound channel to `remote`.
    pub fn connect_to(&mut self, remote: SocketAddr) -> Result<()> {
        self.socket
            .connect(remote)
            .map_err(|e| TransportError::Connect {
                addr: remote,
                source: e,
            })?;
        self.peer = Some(remote);
        Ok(())
    }

    /// Send one datagram to the connected peer.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        Ok(self.socket.send(buf)?)
    }

    /// Receive one datagram from the connected peer.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.socket.recv(buf)?)
    }

    /// Receive one datagram and report its sender (unconnected channels).
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf)?)
    }

    /// Set the read timeout on the underlying socket.
    ///
    /// `Some(Duration::ZERO)` is rejected by the OS, so it is treated as a
    /// one-millisecond timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set the write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Current read timeout.
    pub fn read_timeout(&self) -> Result<Option<Duration>> {
        self.socket.read_timeout().map_err(Into::into)
    }

    /// Try to clone this channel (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            socket: self.socket.try_clone()?,
            peer: self.peer,
        })
    }

    /// The local address this channel is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }

    /// The remote endpoint, if connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Discard every datagram currently queued on the socket.
    pub fn discard_pending(&self) -> Result<usize> {
        self.socket.set_nonblocking(true)?;
        let drained = self.drain_nonblocking();
        self.socket.set_nonblocking(false)?;
        let count = drained?;
        if count > 0 {
            debug!(count, peer = ?self.peer, "discarded stale datagrams");
        }
        Ok(count)
    }

    fn drain_nonblocking(&self) -> Result<usize> {
        let mut scratch = [0u8; DRAIN_BUFFER_SIZE];
        let mut count = 0usize;
        loop {
            match self.socket.recv(&mut scratch) {
                Ok(_) => count += 1,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(count),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // A queued ICMP port-unreachable from an earlier send.
                Err(err) if err.kind() == ErrorKind::ConnectionRefused => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp"
    }
}

impl Datagram for DatagramChannel {
    fn send_datagram(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.socket.set_read_timeout(timeout)
    }

    fn discard_pending(&mut self) -> io::Result<usize> {
        DatagramChannel::discard_pending(self).map_err(|err| match err {
            TransportError::Io(io) => io,
            other => io::Error::other(other.to_string()),
        })
    }
}
