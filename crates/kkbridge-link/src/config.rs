use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use kkbridge_frame::{MessagePolicy, DEFAULT_MAX_PAYLOAD};

use crate::channel::ChannelKind;

/// Well-known emulator address of the device interface.
pub const DEFAULT_DEVICE_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 21324);

/// Well-known emulator address of the debug-link interface.
pub const DEFAULT_DEBUG_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 21325);

/// Default per-frame receive timeout.
///
/// Generous because the emulator may be waiting on a (simulated) button
/// press before it answers.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Emulator address of the device interface.
    pub device_addr: SocketAddr,
    /// Emulator address of the debug-link interface.
    pub debug_addr: SocketAddr,
    /// Timeout for each received frame.
    pub read_timeout: Duration,
    /// Maximum payload length accepted in a response header.
    pub max_payload_size: usize,
    /// Message types without a response, in addition to the defaults.
    pub no_response_types: Vec<u16>,
}

impl LinkConfig {
    /// Emulator address for a channel.
    pub fn addr_for(&self, kind: ChannelKind) -> SocketAddr {
        match kind {
            ChannelKind::Device => self.device_addr,
            ChannelKind::Debug => self.debug_addr,
        }
    }

    /// The effective no-response policy.
    pub fn policy(&self) -> MessagePolicy {
        MessagePolicy::default().with_no_response(self.no_response_types.iter().copied())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_addr: DEFAULT_DEVICE_ADDR,
            debug_addr: DEFAULT_DEBUG_ADDR,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            no_response_types: Vec::new(),
        }
    }
}
