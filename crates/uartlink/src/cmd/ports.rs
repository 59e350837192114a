use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serialport::SerialPortType;

use crate::cmd::PortsArgs;
use crate::exit::{CliError, CliResult, DEVICE_ERROR, SUCCESS};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
struct PortEntry {
    name: String,
    kind: &'static str,
    detail: String,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = serialport::available_ports()
        .map_err(|err| CliError::new(DEVICE_ERROR, format!("port enumeration failed: {err}")))?;
    let entries: Vec<PortEntry> = ports.into_iter().map(describe).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "KIND", "DETAIL"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.name.clone(),
                    entry.kind.to_string(),
                    entry.detail.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for entry in &entries {
                println!("{} ({}) {}", entry.name, entry.kind, entry.detail);
            }
        }
    }

    Ok(SUCCESS)
}

fn describe(info: serialport::SerialPortInfo) -> PortEntry {
    match info.port_type {
        SerialPortType::UsbPort(usb) => {
            let detail = format!(
                "{} {}",
                usb.manufacturer.unwrap_or_default(),
                usb.product.unwrap_or_default()
            );
            PortEntry {
                name: info.port_name,
                kind: "usb",
                detail: detail.trim().to_string(),
            }
        }
        SerialPortType::BluetoothPort => PortEntry {
            name: info.port_name,
            kind: "bluetooth",
            detail: String::new(),
        },
        SerialPortType::PciPort => PortEntry {
            name: info.port_name,
            kind: "pci",
            detail: String::new(),
        },
        SerialPortType::Unknown => PortEntry {
            name: info.port_name,
            kind: "unknown",
            detail: String::new(),
        },
    }
}
