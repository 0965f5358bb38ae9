use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;

/// One of the emulator's two independent interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// The main wallet interface.
    Device,
    /// The debug link used to drive the emulator in tests.
    Debug,
}

impl ChannelKind {
    /// Both channels, device first.
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Device, ChannelKind::Debug];

    /// Routing name of the channel.
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Device => "device",
            ChannelKind::Debug => "debug",
        }
    }

    /// Lenient routing used by the legacy hex surface: anything that is not
    /// `debug` goes to the device channel.
    pub fn from_legacy(name: &str) -> Self {
        if name == ChannelKind::Debug.as_str() {
            ChannelKind::Debug
        } else {
            ChannelKind::Device
        }
    }
}

impl FromStr for ChannelKind {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device" => Ok(ChannelKind::Device),
            "debug" => Ok(ChannelKind::Debug),
            other => Err(LinkError::UnknownChannel(other.to_string())),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("device".parse::<ChannelKind>().unwrap(), ChannelKind::Device);
        assert_eq!("debug".parse::<ChannelKind>().unwrap(), ChannelKind::Debug);
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "other".parse::<ChannelKind>().unwrap_err();
        assert!(matches!(err, LinkError::UnknownChannel(name) if name == "other"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Device".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn legacy_routing_defaults_to_device() {
        assert_eq!(ChannelKind::from_legacy("debug"), ChannelKind::Debug);
        assert_eq!(ChannelKind::from_legacy("device"), ChannelKind::Device);
        assert_eq!(ChannelKind::from_legacy("anything"), ChannelKind::Device);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelKind::Debug).unwrap(),
            "\"debug\""
        );
        let kind: ChannelKind = serde_json::from_str("\"device\"").unwrap();
        assert_eq!(kind, ChannelKind::Device);
        assert_eq!(ChannelKind::Debug.to_string(), "debug");
    }
}
