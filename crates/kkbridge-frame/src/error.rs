use std::time::Duration;

/// Errors that can occur while segmenting or reassembling messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The outbound message header is invalid. Nothing was sent.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// A received report failed report-id or preamble validation.
    #[error("protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    /// The declared payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// No report arrived within the read timeout.
    #[error("no frame received within {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred while sending or receiving reports.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            reason: reason.into(),
        }
    }
}

/// Reasons a byte slice does not start with a valid message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderFault {
    /// Fewer than 8 bytes available.
    #[error("header needs 8 bytes, got {0}")]
    TooShort(usize),

    /// The first two bytes are not the `##` sentinel.
    #[error("bad magic {:#04x} {:#04x} (expected 0x23 0x23)", .0[0], .0[1])]
    BadMagic([u8; 2]),
}

pub type Result<T> = std::result::Result<T, FrameError>;
