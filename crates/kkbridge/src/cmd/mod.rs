use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use kkbridge_frame::DEFAULT_MAX_PAYLOAD;
use kkbridge_link::LinkConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP bridge.
    Serve(ServeArgs),
    /// Run one framed exchange against the emulator and print the response.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the emulator listens and how exchanges with it are bounded.
#[derive(Args, Debug)]
pub struct EmulatorArgs {
    /// Emulator device interface.
    #[arg(long, env = "KK_DEVICE_ADDR", default_value = "127.0.0.1:21324")]
    pub device_addr: SocketAddr,
    /// Emulator debug-link interface.
    #[arg(long, env = "KK_DEBUG_ADDR", default_value = "127.0.0.1:21325")]
    pub debug_addr: SocketAddr,
    /// Per-frame receive timeout (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s")]
    pub read_timeout: String,
    /// Largest payload accepted in either direction, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
    /// Extra message type that gets no response (repeatable).
    #[arg(long = "no-response-type", value_name = "TYPE")]
    pub no_response_types: Vec<u16>,
}

impl EmulatorArgs {
    pub fn link_config(&self) -> CliResult<LinkConfig> {
        if self.max_payload == 0 {
            return Err(CliError::new(USAGE, "--max-payload must be greater than zero"));
        }
        Ok(LinkConfig {
            device_addr: self.device_addr,
            debug_addr: self.debug_addr,
            read_timeout: parse_duration(&self.read_timeout)?,
            max_payload_size: self.max_payload,
            no_response_types: self.no_response_types.clone(),
        })
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// HTTP listen address.
    #[arg(long, env = "KK_BRIDGE", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,
    #[command(flatten)]
    pub emulator: EmulatorArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Channel to send on (device or debug).
    #[arg(long, short = 'c', default_value = "device")]
    pub channel: String,
    /// Message type id.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub msg_type: u16,
    /// Hex-encoded payload.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read the payload from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub emulator: EmulatorArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn emulator_args_build_link_config() {
        let args = EmulatorArgs {
            device_addr: "127.0.0.1:1".parse().unwrap(),
            debug_addr: "127.0.0.1:2".parse().unwrap(),
            read_timeout: "250ms".to_string(),
            max_payload: 4096,
            no_response_types: vec![900],
        };
        let config = args.link_config().unwrap();

        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.max_payload_size, 4096);
        assert!(!config.policy().expects_response(900));
    }
}
