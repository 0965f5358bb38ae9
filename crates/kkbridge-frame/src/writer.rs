use std::io::ErrorKind;

use bytes::BytesMut;
use kkbridge_transport::Datagram;
use tracing::trace;

use crate::codec::{
    encode_frame, validate_message, FrameConfig, MessageHeader, FRAME_SIZE, SEGMENT_SIZE,
};
use crate::error::{FrameError, Result};

/// Segments logical messages into reports and sends them on a [`Datagram`].
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Datagram> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FRAME_SIZE),
            config,
        }
    }

    /// Validate `message`, then send it as a sequence of reports (blocking).
    ///
    /// Each report is built and sent before the next one is encoded. Nothing
    /// is sent if validation fails or the payload exceeds
    /// `max_payload_size`. Returns the header and the number of reports sent.
    pub fn write_message(&mut self, message: &[u8]) -> Result<(MessageHeader, usize)> {
        let header = validate_message(message)?;
        let payload_len = header.payload_len as usize;
        if payload_len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: self.config.max_payload_size,
            });
        }

        let mut sent = 0usize;
        for chunk in message.chunks(SEGMENT_SIZE) {
            self.buf.clear();
            encode_frame(chunk, &mut self.buf)?;
            self.send_frame()?;
            sent += 1;
        }

        trace!(
            msg_type = header.msg_type,
            payload_len = header.payload_len,
            frames = sent,
            "message sent"
        );
        Ok((header, sent))
    }

    /// Send one datagram verbatim, without framing.
    pub fn write_raw(&mut self, datagram: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(datagram);
        self.send_frame()
    }

    fn send_frame(&mut self) -> Result<()> {
        loop {
            match self.inner.send_datagram(&self.buf) {
                Ok(n) if n == self.buf.len() => return Ok(()),
                Ok(n) => {
                    return Err(FrameError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        format!("short datagram send ({n} of {} bytes)", self.buf.len()),
                    )))
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
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

    /// Consume the writer and return the inner endpoint.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
