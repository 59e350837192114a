use tracing::debug;
use uartlink_port::ResetLine;

use crate::cmd::{open_messenger, parse_duration, ConnectArgs};
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ConnectArgs, _format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut messenger = open_messenger(&args.port, args.baud)?;

    if let Some(pin) = args.reset_pin {
        messenger.set_reset_line(reset_line_for(pin)?);
    }

    if args.skip_reset {
        debug!("reset pulse skipped");
    } else if args.reset_pin.is_none() {
        debug!("no reset pin configured, skipping pulse");
    } else if !messenger.send_reset() {
        return Err(CliError::new(FAILURE, "reset pulse failed"));
    }

    let connected = messenger
        .wait_for_connection(timeout)
        .map_err(|err| session_error("handshake failed", err))?;

    if connected {
        println!("connected");
        Ok(SUCCESS)
    } else {
        Err(CliError::new(
            FAILURE,
            format!("no ready announcement within {}", args.timeout),
        ))
    }
}

#[cfg(feature = "rpi")]
fn reset_line_for(pin: u8) -> CliResult<Box<dyn ResetLine>> {
    use crate::exit::port_error;

    uartlink_port::GpioResetLine::open(pin)
        .map(|line| Box::new(line) as Box<dyn ResetLine>)
        .map_err(|err| port_error("reset line open failed", err))
}

#[cfg(not(feature = "rpi"))]
fn reset_line_for(_pin: u8) -> CliResult<Box<dyn ResetLine>> {
    Err(CliError::new(
        crate::exit::USAGE,
        "--reset-pin requires a build with the `rpi` feature",
    ))
}
