use std::io::ErrorKind;
use std::time::Instant;

use uartlink_frame::FrameError;
use uartlink_session::SessionError;

use crate::cmd::{open_messenger, parse_duration, FetchArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_message, OutputFormat};

pub fn run(args: FetchArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut messenger = open_messenger(&args.port, args.baud)?;

    let deadline = Instant::now() + timeout;
    loop {
        match messenger.fetch_msg() {
            Ok(message) => {
                print_message(&message, format);
                return Ok(SUCCESS);
            }
            Err(SessionError::Frame(err)) if err.is_recoverable() => {
                tracing::warn!(%err, "skipping malformed frame");
            }
            Err(SessionError::Frame(FrameError::Io(source)))
                if matches!(source.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
            Err(err) => return Err(session_error("fetch failed", err)),
        }

        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("no complete message within {}", args.timeout),
            ));
        }
    }
}
