//! Fixed-size report framing for KeepKey wire messages.
//!
//! A logical message is an 8-byte header followed by its payload:
//! - 2 magic bytes (`##`)
//! - a 2-byte big-endian message type
//! - a 4-byte big-endian payload length
//!
//! On the wire the message is cut into 63-byte segments, each carried in a
//! 64-byte report that starts with the `?` report id and is zero-padded.
//! The writer segments outbound messages; the reader reassembles inbound
//! ones using the length declared in the first report.

pub mod codec;
pub mod error;
pub mod policy;
pub mod reader;
pub mod writer;

pub use codec::{
    build_message, encode_frame, segment, validate_message, FrameConfig, MessageHeader,
    DEFAULT_MAX_PAYLOAD, FRAME_SIZE, HEADER_SIZE, MAGIC, REPORT_ID, SEGMENT_SIZE,
};
pub use error::{FrameError, HeaderFault, Result};
pub use policy::{
    message_type_name, MessagePolicy, BUTTON_ACK, BUTTON_REQUEST, DEBUG_LINK_DECISION,
    DEBUG_LINK_GET_STATE, DEBUG_LINK_LOG, DEBUG_LINK_STATE, DEBUG_LINK_STOP, FAILURE, FEATURES,
    INITIALIZE, PING, SUCCESS,
};
pub use reader::FrameReader;
pub use writer::FrameWriter;
