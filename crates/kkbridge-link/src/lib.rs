//! Serialized request/response exchanges with the KeepKey emulator.
//!
//! This is the "just works" layer. Each emulator interface (`device`,
//! `debug`) is one [`ChannelLink`]: a connected datagram channel guarded by
//! a lock that is held for a whole exchange, so frames of concurrent
//! requests never interleave on the wire. The [`Bridge`] owns both links
//! and routes requests to them by name.

pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod link;

pub use bridge::Bridge;
pub use channel::ChannelKind;
pub use config::{LinkConfig, DEFAULT_DEBUG_ADDR, DEFAULT_DEVICE_ADDR, DEFAULT_READ_TIMEOUT};
pub use error::{LinkError, Result};
pub use link::{ChannelLink, ExchangeOutcome, ExchangeState};
