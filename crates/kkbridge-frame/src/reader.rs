use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use kkbridge_transport::Datagram;
use tracing::{debug, trace};

use crate::codec::{FrameConfig, MessageHeader, FRAME_SIZE, REPORT_ID};
use crate::error::{FrameError, Result};

// Larger than a report so an oversized datagram shows up as a length
// mismatch instead of being cut down to FRAME_SIZE.
const RECV_BUFFER_SIZE: usize = 4 * FRAME_SIZE;

/// Reassembles logical messages from reports received on a [`Datagram`].
pub struct FrameReader<T> {
    inner: T,
    buf: [u8; RECV_BUFFER_SIZE],
    config: FrameConfig,
}

impl<T: Datagram> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    ///
    /// The read timeout is applied to the endpoint on every read.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: [0u8; RECV_BUFFER_SIZE],
            config,
        }
    }

    /// Receive reports until one complete message is assembled (blocking).
    ///
    /// Every report must be exactly [`FRAME_SIZE`] bytes and start with the
    /// report id. The first one also carries the `##` preamble and a header
    /// declaring how many payload bytes follow. Padding past the declared
    /// length is dropped.
    pub fn read_message(&mut self) -> Result<Bytes> {
        self.inner.set_read_timeout(self.config.read_timeout)?;

        let n = self.recv()?;
        if n != FRAME_SIZE {
            return Err(FrameError::violation(format!(
                "first frame is {n} bytes (expected {FRAME_SIZE})"
            )));
        }
        if self.buf[0] != REPORT_ID {
            return Err(FrameError::violation(format!(
                "first frame report id {:#04x} (expected {REPORT_ID:#04x})",
                self.buf[0]
            )));
        }
        let header = MessageHeader::decode(&self.buf[1..n])
            .map_err(|fault| FrameError::violation(fault.to_string()))?;

        let payload_len = header.payload_len as usize;
        if payload_len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: self.config.max_payload_size,
            });
        }

        let total = header.message_len();
        let mut acc = BytesMut::with_capacity(total + FRAME_SIZE);
        acc.extend_from_slice(&self.buf[1..n]);

        let mut frames = 1usize;
        while acc.len() < total {
            let n = self.recv()?;
            if n == 0 {
                return Err(FrameError::violation(format!(
                    "empty datagram after {frames} frame(s)"
                )));
            }
            if n != FRAME_SIZE {
                return Err(FrameError::violation(format!(
                    "frame {} is {n} bytes (expected {FRAME_SIZE})",
                    frames + 1
                )));
            }
            if self.buf[0] != REPORT_ID {
                return Err(FrameError::violation(format!(
                    "frame {} report id {:#04x} (expected {REPORT_ID:#04x})",
                    frames + 1,
                    self.buf[0]
                )));
            }
            acc.extend_from_slice(&self.buf[1..n]);
            frames += 1;
            trace!(frames, received = acc.len(), total, "continuation frame");
        }

        acc.truncate(total);
        debug!(
            msg_type = header.msg_type,
            payload_len = header.payload_len,
            frames,
            "message reassembled"
        );
        Ok(acc.freeze())
    }

    /// Receive one datagram verbatim, up to `max_len` bytes.
    pub fn read_raw(&mut self, max_len: usize) -> Result<Bytes> {
        self.inner.set_read_timeout(self.config.read_timeout)?;
        let n = self.recv()?;
        Ok(Bytes::copy_from_slice(&self.buf[..n.min(max_len)]))
    }

    fn recv(&mut self) -> Result<usize> {
        loop {
            match self.inner.recv_datagram(&mut self.buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(FrameError::Timeout(
                        self.config.read_timeout.unwrap_or(Duration::ZERO),
                    ))
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying datagram endpoint.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying datagram endpoint.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner endpoint.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum declared payload size for subsequent reads.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Update the per-report read timeout for subsequent reads.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.config.read_timeout = timeout;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
