use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kkbridge_frame::{message_type_name, MessageHeader, HEADER_SIZE};
use kkbridge_link::{ChannelKind, ExchangeOutcome};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ResponseOutput {
    pub channel: ChannelKind,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<&'static str>,
    pub payload_size: usize,
    pub payload: String,
}

impl ResponseOutput {
    pub fn new(channel: ChannelKind, outcome: &ExchangeOutcome) -> Self {
        let message = match outcome {
            ExchangeOutcome::Acknowledged => {
                return Self {
                    channel,
                    acknowledged: true,
                    msg_type: None,
                    type_name: None,
                    payload_size: 0,
                    payload: String::new(),
                }
            }
            ExchangeOutcome::Response(message) => message,
        };

        let header = MessageHeader::decode(message).ok();
        let payload = message.get(HEADER_SIZE..).unwrap_or_default();
        Self {
            channel,
            acknowledged: false,
            msg_type: header.map(|h| h.msg_type),
            type_name: header.map(|h| message_type_name(h.msg_type)),
            payload_size: payload.len(),
            payload: hex::encode(payload),
        }
    }
}

pub fn print_response(channel: ChannelKind, outcome: &ExchangeOutcome, format: OutputFormat) {
    let out = ResponseOutput::new(channel, outcome);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "TYPE", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    out.channel.to_string(),
                    out.msg_type.map(|t| t.to_string()).unwrap_or_default(),
                    out.type_name.unwrap_or("(no response)").to_string(),
                    out.payload_size.to_string(),
                    out.payload.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if out.acknowledged {
                println!("channel={} acknowledged (no response)", out.channel);
            } else {
                println!(
                    "channel={} type={} ({}) size={} payload={}",
                    out.channel,
                    out.msg_type.unwrap_or_default(),
                    out.type_name.unwrap_or("unknown"),
                    out.payload_size,
                    out.payload
                );
            }
        }
        OutputFormat::Raw => {
            if let ExchangeOutcome::Response(message) = outcome {
                print_raw(message);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
