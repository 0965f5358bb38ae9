use std::time::Duration;

use bytes::Bytes;
use kkbridge_frame::MessagePolicy;
use kkbridge_transport::{Datagram, DatagramChannel};
use tracing::info;

use crate::channel::ChannelKind;
use crate::config::LinkConfig;
use crate::error::Result;
use crate::link::{ChannelLink, ExchangeOutcome};

/// Both emulator interfaces plus the exchange policy.
///
/// Constructed once at startup and shared by reference; each channel's
/// lock lives in its own [`ChannelLink`], so `device` and `debug`
/// exchanges run independently.
#[derive(Debug)]
pub struct Bridge<T = DatagramChannel> {
    device: ChannelLink<T>,
    debug: ChannelLink<T>,
    policy: MessagePolicy,
    read_timeout: Duration,
}

impl Bridge<DatagramChannel> {
    /// Connect both channels to the emulator.
    pub fn connect(config: &LinkConfig) -> Result<Self> {
        let device = ChannelLink::connect(
            ChannelKind::Device,
            config.device_addr,
            config.max_payload_size,
        )?;
        let debug = ChannelLink::connect(
            ChannelKind::Debug,
            config.debug_addr,
            config.max_payload_size,
        )?;

        info!(
            device = %config.device_addr,
            debug = %config.debug_addr,
            read_timeout = ?config.read_timeout,
            "bridge connected"
        );

        Ok(Self::from_links(device, debug, config.policy(), config.read_timeout))
    }
}

impl<T: Datagram> Bridge<T> {
    /// Assemble a bridge from already constructed links.
    pub fn from_links(
        device: ChannelLink<T>,
        debug: ChannelLink<T>,
        policy: MessagePolicy,
        read_timeout: Duration,
    ) -> Self {
        Self {
            device,
            debug,
            policy,
            read_timeout,
        }
    }

    /// The link for a channel.
    pub fn link(&self, kind: ChannelKind) -> &ChannelLink<T> {
        match kind {
            ChannelKind::Device => &self.device,
            ChannelKind::Debug => &self.debug,
        }
    }

    /// Both links, device first.
    pub fn links(&self) -> impl Iterator<Item = &ChannelLink<T>> {
        ChannelKind::ALL.into_iter().map(|kind| self.link(kind))
    }

    /// Framed exchange on the channel named `channel`.
    ///
    /// Unknown names fail with [`LinkError::UnknownChannel`](crate::LinkError)
    /// before any I/O.
    pub fn exchange(&self, channel: &str, message: &[u8]) -> Result<ExchangeOutcome> {
        let kind: ChannelKind = channel.parse()?;
        self.exchange_on(kind, message)
    }

    /// Framed exchange on a known channel.
    pub fn exchange_on(&self, kind: ChannelKind, message: &[u8]) -> Result<ExchangeOutcome> {
        self.link(kind)
            .exchange(message, &self.policy, self.read_timeout)
    }

    /// Send one unframed datagram (legacy routing).
    pub fn send_raw(&self, channel: &str, datagram: &[u8]) -> Result<()> {
        self.link(ChannelKind::from_legacy(channel))
            .send_raw(datagram)
    }

    /// Receive one unframed datagram (legacy routing).
    pub fn recv_raw(&self, channel: &str) -> Result<Bytes> {
        self.link(ChannelKind::from_legacy(channel))
            .recv_raw(self.read_timeout)
    }

    /// The no-response policy in effect.
    pub fn policy(&self) -> &MessagePolicy {
        &self.policy
    }

    /// Per-frame receive timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}
