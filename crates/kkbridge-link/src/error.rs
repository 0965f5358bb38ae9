/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The routing key does not name a channel.
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] kkbridge_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] kkbridge_frame::FrameError),
}

impl LinkError {
    /// Returns true if the device did not answer within the read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Frame(kkbridge_frame::FrameError::Timeout(_)))
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
