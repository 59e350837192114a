/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes were supplied than a complete header requires.
    #[error("truncated header ({got} bytes, need {needed})")]
    Truncated { needed: usize, got: usize },

    /// The header carries a type tag outside the known set.
    #[error("unknown message type tag 0x{0:02x}")]
    UnknownType(u8),

    /// The header length disagrees with the type's fixed payload size.
    #[error("{kind} payload length {got} (expected {expected})")]
    LengthMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// The link yielded fewer payload bytes than required within the read
    /// window.
    #[error("short payload read ({got} of {wanted} bytes)")]
    ShortRead { wanted: usize, got: usize },

    /// Refused to encode an empty command.
    #[error("empty command")]
    EmptyCommand,

    /// A text payload is not valid UTF-8.
    #[error("text payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A text payload ran past the line limit with no terminator.
    #[error("text line exceeds {limit} bytes without terminator")]
    LineTooLong { limit: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed before a complete frame was received.
    #[error("link closed (incomplete frame)")]
    Disconnected,
}

impl FrameError {
    /// Whether the error is contained to a single frame.
    ///
    /// After a recoverable error the reader has already realigned to the
    /// next frame boundary; callers log and carry on. Everything else means
    /// the byte stream itself is gone.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::UnknownType(_)
                | FrameError::LengthMismatch { .. }
                | FrameError::InvalidUtf8(_)
                | FrameError::LineTooLong { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
