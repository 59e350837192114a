use std::fmt;
use std::io;

use uartlink_frame::FrameError;
use uartlink_port::PortError;
use uartlink_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DEVICE_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn port_error(context: &str, err: PortError) -> CliError {
    match err {
        PortError::Io(source) => io_error(context, source),
        PortError::Open { .. } | PortError::Device(_) => {
            CliError::new(DEVICE_ERROR, format!("{context}: {err}"))
        }
        PortError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::EmptyCommand => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        err if err.is_recoverable() => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Port(err) => port_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::ReceiverActive => CliError::new(USAGE, format!("{context}: {err}")),
    }
}
