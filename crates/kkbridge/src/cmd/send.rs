use std::fs;

use kkbridge_frame::build_message;
use kkbridge_link::{Bridge, ChannelKind, ExchangeOutcome, LinkError};
use kkbridge_transport::Datagram;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, io_error, link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let kind: ChannelKind = args
        .channel
        .parse()
        .map_err(|err| link_error("invalid --channel", err))?;
    let payload = resolve_payload(&args)?;
    let config = args.emulator.link_config()?;

    let bridge = Bridge::connect(&config).map_err(|err| link_error("connect failed", err))?;
    let outcome = send_message(&bridge, kind, args.msg_type, &payload)?;
    print_response(kind, &outcome, format);

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.hex {
        return hex::decode(text.trim())
            .map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

trait Exchanger {
    fn exchange_on(&self, kind: ChannelKind, message: &[u8]) -> Result<ExchangeOutcome, LinkError>;
}

impl<T: Datagram> Exchanger for Bridge<T> {
    fn exchange_on(&self, kind: ChannelKind, message: &[u8]) -> Result<ExchangeOutcome, LinkError> {
        Bridge::exchange_on(self, kind, message)
    }
}

fn send_message<E: Exchanger>(
    exchanger: &E,
    kind: ChannelKind,
    msg_type: u16,
    payload: &[u8],
) -> CliResult<ExchangeOutcome> {
    let message =
        build_message(msg_type, payload).map_err(|err| frame_error("invalid message", err))?;
    debug!(channel = %kind, msg_type, len = message.len(), "sending message");

    exchanger
        .exchange_on(kind, &message)
        .map_err(|err| link_error("exchange failed", err))
}
