use std::io;
use std::time::Duration;

/// A message-oriented, connected endpoint.
///
/// Every call moves exactly one datagram: no partial sends, no stream
/// semantics. The framing layer is generic over this trait so it can be
/// driven by a real [`DatagramChannel`](crate::DatagramChannel) or by an
/// in-memory double in tests.
pub trait Datagram {
    /// Send one datagram. Returns the number of bytes handed to the socket.
    fn send_datagram(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf` (blocking, subject to the read timeout).
    ///
    /// A datagram larger than `buf` is truncated.
    fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Set the timeout applied to each subsequent `recv_datagram` call.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Drop any datagrams already queued for reading without blocking.
    ///
    /// Returns the number of datagrams discarded.
    fn discard_pending(&mut self) -> io::Result<usize>;
}

impl<T: Datagram + ?Sized> Datagram for &mut T {
    fn send_datagram(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send_datagram(buf)
    }

    fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv_datagram(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn discard_pending(&mut self) -> io::Result<usize> {
        (**self).discard_pending()
    }
}
