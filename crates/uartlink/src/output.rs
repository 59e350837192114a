use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::json;
use uartlink_frame::Message;

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
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = json!({
                "type": message.message_type().name(),
                "fields": fields(message),
                "rendered": message.to_string(),
            });
            println!("{out}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "PAYLOAD"])
                .add_row(vec![
                    message.message_type().name().to_string(),
                    payload_column(message),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{message}");
        }
        OutputFormat::Raw => match message.text() {
            Some(line) => println!("{line}"),
            None => println!("{message}"),
        },
    }
}

fn fields(message: &Message) -> serde_json::Value {
    match message {
        Message::Rpm { rpm } => json!({ "rpm": rpm }),
        Message::Uss { side, distance } => json!({ "side": side, "distance": distance }),
        Message::Imu {
            yaw,
            pitch,
            roll,
            ax,
            ay,
            az,
        } => json!({ "yaw": yaw, "pitch": pitch, "roll": roll, "ax": ax, "ay": ay, "az": az }),
        Message::Res { code } => json!({ "code": code }),
        Message::Err(line) | Message::Log(line) | Message::Dbg(line) => json!({ "line": line }),
    }
}

fn payload_column(message: &Message) -> String {
    match message.text() {
        Some(line) => line.to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_cover_every_variant() {
        let samples = [
            Message::Rpm { rpm: 1.0 },
            Message::Uss {
                side: 1,
                distance: 2.0,
            },
            Message::Imu {
                yaw: 0.0,
                pitch: 0.0,
                roll: 0.0,
                ax: 0.0,
                ay: 0.0,
                az: 0.0,
            },
            Message::Res { code: 7 },
            Message::Err("e".to_string()),
            Message::Log("l".to_string()),
            Message::Dbg("d".to_string()),
        ];

        for message in samples {
            assert!(fields(&message).is_object());
        }
    }
}
