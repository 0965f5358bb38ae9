//! HTTP bridge to the KeepKey emulator.
//!
//! The emulator speaks the device's framed wire protocol over two loopback
//! UDP endpoints, one per interface. kkbridge segments outbound messages
//! into 64-byte reports, reassembles the responses, and exposes both
//! interfaces over HTTP.
//!
//! # Crate Structure
//!
//! - [`transport`]: connected UDP datagram channels
//! - [`frame`]: message header, segmentation and reassembly
//! - [`link`]: per-channel serialized exchanges and the [`link::Bridge`]
//! - [`server`]: axum HTTP surface (behind the `server` feature)

/// Re-export transport types.
pub mod transport {
    pub use kkbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kkbridge_frame::*;
}

/// Re-export link types.
pub mod link {
    pub use kkbridge_link::*;
}

#[cfg(feature = "server")]
pub mod server;
