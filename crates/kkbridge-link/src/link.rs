use std::fmt;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use kkbridge_frame::{
    message_type_name, validate_message, FrameConfig, FrameReader, FrameWriter, MessagePolicy,
    FRAME_SIZE,
};
use kkbridge_transport::{Datagram, DatagramChannel};
use tracing::{debug, trace, warn};

use crate::channel::ChannelKind;
use crate::error::Result;

/// Result of a successful framed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The message type gets no response; nothing was read.
    Acknowledged,
    /// The reassembled response message.
    Response(Bytes),
}

/// Lifecycle of one framed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing done yet.
    Idle,
    /// Checking the outbound header.
    Validating,
    /// Sending request reports.
    Transmitting,
    /// Reassembling the response.
    AwaitingResponse,
    /// Finished successfully.
    Completed,
    /// Stopped on a validation, protocol or I/O error.
    Failed,
}

impl ExchangeState {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Validating => "validating",
            ExchangeState::Transmitting => "transmitting",
            ExchangeState::AwaitingResponse => "awaiting_response",
            ExchangeState::Completed => "completed",
            ExchangeState::Failed => "failed",
        }
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Completed | ExchangeState::Failed)
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StateTrace {
    channel: ChannelKind,
    state: ExchangeState,
}

impl StateTrace {
    fn new(channel: ChannelKind) -> Self {
        Self {
            channel,
            state: ExchangeState::Idle,
        }
    }

    fn advance(&mut self, next: ExchangeState) {
        trace!(channel = %self.channel, from = %self.state, to = %next, "exchange state");
        self.state = next;
    }
}

/// One emulator interface: a datagram endpoint behind an exchange lock.
///
/// The lock is held from the first transmitted frame to the last received
/// one, so exchanges on the same channel are strictly serialized.
pub struct ChannelLink<T = DatagramChannel> {
    kind: ChannelKind,
    endpoint: Mutex<T>,
    peer: Option<SocketAddr>,
    max_payload_size: usize,
}

impl ChannelLink<DatagramChannel> {
    /// Connect a UDP channel to the emulator interface at `addr`.
    pub fn connect(kind: ChannelKind, addr: SocketAddr, max_payload_size: usize) -> Result<Self> {
        let channel = DatagramChannel::connect(addr)?;
        let mut link = Self::from_parts(kind, channel, max_payload_size);
        link.peer = Some(addr);
        Ok(link)
    }
}

impl<T: Datagram> ChannelLink<T> {
    /// Wrap an already connected endpoint.
    pub fn from_parts(kind: ChannelKind, endpoint: T, max_payload_size: usize) -> Self {
        Self {
            kind,
            endpoint: Mutex::new(endpoint),
            peer: None,
            max_payload_size,
        }
    }

    /// Which interface this link talks to.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Emulator address, when connected over UDP.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Send one logical message and, unless `policy` says the type has no
    /// response, wait for the reassembled reply (blocking).
    ///
    /// `timeout` bounds the wait for each response frame. Datagrams left
    /// queued by an earlier failed exchange are discarded before sending.
    pub fn exchange(
        &self,
        message: &[u8],
        policy: &MessagePolicy,
        timeout: Duration,
    ) -> Result<ExchangeOutcome> {
        let mut states = StateTrace::new(self.kind);
        let result = self.run_exchange(message, policy, timeout, &mut states);
        match &result {
            Ok(_) => states.advance(ExchangeState::Completed),
            Err(err) => {
                states.advance(ExchangeState::Failed);
                warn!(channel = %self.kind, error = %err, "exchange failed");
            }
        }
        result
    }

    fn run_exchange(
        &self,
        message: &[u8],
        policy: &MessagePolicy,
        timeout: Duration,
        states: &mut StateTrace,
    ) -> Result<ExchangeOutcome> {
        states.advance(ExchangeState::Validating);
        let header = validate_message(message)?;
        let config = FrameConfig {
            max_payload_size: self.max_payload_size,
            read_timeout: Some(timeout),
        };

        let mut endpoint = self.lock();
        let stale = endpoint.discard_pending().map_err(kkbridge_frame::FrameError::Io)?;
        if stale > 0 {
            warn!(channel = %self.kind, stale, "dropped datagrams left from a previous exchange");
        }

        states.advance(ExchangeState::Transmitting);
        let (_, frames) =
            FrameWriter::with_config(&mut *endpoint, config.clone()).write_message(message)?;
        debug!(
            channel = %self.kind,
            msg_type = header.msg_type,
            msg_name = message_type_name(header.msg_type),
            payload_len = header.payload_len,
            frames,
            "request sent"
        );

        if !policy.expects_response(header.msg_type) {
            return Ok(ExchangeOutcome::Acknowledged);
        }

        states.advance(ExchangeState::AwaitingResponse);
        let response = FrameReader::with_config(&mut *endpoint, config).read_message()?;
        Ok(ExchangeOutcome::Response(response))
    }

    /// Send one unframed datagram.
    pub fn send_raw(&self, datagram: &[u8]) -> Result<()> {
        let mut endpoint = self.lock();
        FrameWriter::new(&mut *endpoint).write_raw(datagram)?;
        trace!(channel = %self.kind, len = datagram.len(), "raw datagram sent");
        Ok(())
    }

    /// Receive the next datagram verbatim (at most one report's worth).
    pub fn recv_raw(&self, timeout: Duration) -> Result<Bytes> {
        let mut endpoint = self.lock();
        let config = FrameConfig {
            max_payload_size: self.max_payload_size,
            read_timeout: Some(timeout),
        };
        let data = FrameReader::with_config(&mut *endpoint, config).read_raw(FRAME_SIZE)?;
        trace!(channel = %self.kind, len = data.len(), "raw datagram received");
        Ok(data)
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.endpoint.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!(channel = %self.kind, "exchange lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

impl<T> fmt::Debug for ChannelLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLink")
            .field("kind", &self.kind)
            .field("peer", &self.peer)
            .field("max_payload_size", &self.max_payload_size)
            .finish()
    }
}
