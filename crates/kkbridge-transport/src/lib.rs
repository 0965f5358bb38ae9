//! Datagram transport for the emulator bridge.
//!
//! The emulated device exposes each of its interfaces (`device`, `debug`)
//! as a UDP endpoint on loopback. This crate provides the connected socket
//! wrapper for one such endpoint and the [`Datagram`] trait the framing
//! layer is written against.
//!
//! This is the lowest layer of kkbridge. Everything else builds on top of
//! the [`DatagramChannel`] type provided here.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::Datagram;
pub use udp::DatagramChannel;
