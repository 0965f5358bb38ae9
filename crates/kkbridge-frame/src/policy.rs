//! Message types and the no-response policy.
//!
//! Most requests are answered by exactly one message from the device.
//! A few debug-link messages are fire-and-forget: the device consumes them
//! and never replies, so waiting for a response would only run into the
//! read timeout.

use std::collections::BTreeSet;

/// `Initialize`.
pub const INITIALIZE: u16 = 0;

/// `Ping`.
pub const PING: u16 = 1;

/// `Success`.
pub const SUCCESS: u16 = 2;

/// `Failure`.
pub const FAILURE: u16 = 3;

/// `Features`.
pub const FEATURES: u16 = 17;

/// `ButtonRequest`.
pub const BUTTON_REQUEST: u16 = 26;

/// `ButtonAck`.
pub const BUTTON_ACK: u16 = 27;

/// `DebugLinkDecision`: simulated button press. No response.
pub const DEBUG_LINK_DECISION: u16 = 100;

/// `DebugLinkGetState`.
pub const DEBUG_LINK_GET_STATE: u16 = 101;

/// `DebugLinkState`.
pub const DEBUG_LINK_STATE: u16 = 102;

/// `DebugLinkStop`: halts the emulator. No response.
pub const DEBUG_LINK_STOP: u16 = 103;

/// `DebugLinkLog`.
pub const DEBUG_LINK_LOG: u16 = 104;

/// Returns a human-readable name for a message type id.
pub fn message_type_name(id: u16) -> &'static str {
    match id {
        INITIALIZE => "Initialize",
        PING => "Ping",
        SUCCESS => "Success",
        FAILURE => "Failure",
        FEATURES => "Features",
        BUTTON_REQUEST => "ButtonRequest",
        BUTTON_ACK => "ButtonAck",
        DEBUG_LINK_DECISION => "DebugLinkDecision",
        DEBUG_LINK_GET_STATE => "DebugLinkGetState",
        DEBUG_LINK_STATE => "DebugLinkState",
        DEBUG_LINK_STOP => "DebugLinkStop",
        DEBUG_LINK_LOG => "DebugLinkLog",
        _ => "Unknown",
    }
}

/// The set of message types that never get a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePolicy {
    no_response: BTreeSet<u16>,
}

impl MessagePolicy {
    /// A policy where every message type expects a response.
    pub fn empty() -> Self {
        Self {
            no_response: BTreeSet::new(),
        }
    }

    /// Add message types that get no response.
    pub fn with_no_response(mut self, types: impl IntoIterator<Item = u16>) -> Self {
        self.no_response.extend(types);
        self
    }

    /// Returns true if the device answers messages of this type.
    pub fn expects_response(&self, msg_type: u16) -> bool {
        !self.no_response.contains(&msg_type)
    }

    /// The configured no-response types, ascending.
    pub fn no_response_types(&self) -> impl Iterator<Item = u16> + '_ {
        self.no_response.iter().copied()
    }
}

impl Default for MessagePolicy {
    fn default() -> Self {
        Self::empty().with_no_response([DEBUG_LINK_DECISION, DEBUG_LINK_STOP])
    }
}
