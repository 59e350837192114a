/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Link-level error.
    #[error("port error: {0}")]
    Port(#[from] uartlink_port::PortError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] uartlink_frame::FrameError),

    /// The receiver worker owns the read half; direct reads are
    /// unavailable until it is stopped.
    #[error("receiver worker owns the read half")]
    ReceiverActive,
}

pub type Result<T> = std::result::Result<T, SessionError>;
