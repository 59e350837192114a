/// Errors that can occur at the serial link layer.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// The serial device rejected a control operation.
    #[error("serial device error: {0}")]
    Device(#[from] serialport::Error),

    /// An I/O error occurred on the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reset control line could not be driven.
    #[error("reset line error: {0}")]
    Gpio(String),

    /// The link was closed by the counterpart.
    #[error("link closed")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, PortError>;
