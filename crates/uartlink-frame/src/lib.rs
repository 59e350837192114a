//! Typed message framing for the uartlink wire protocol.
//!
//! Every inbound frame carries a 3-byte header:
//! - A 1-byte message type tag
//! - A 2-byte little-endian payload length
//!
//! followed by either a fixed-layout binary payload (telemetry, command
//! responses) or a newline-terminated UTF-8 line (error/log/debug text).
//! Outbound traffic is simpler: ASCII command strings, one per line.
//!
//! No partial reads, no buffer management in user code — [`FrameReader`]
//! yields whole [`Message`]s and resynchronizes itself after a bad frame.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{decode_header, decode_payload, encode_command, HEADER_SIZE, MAX_TEXT_LINE};
pub use error::{FrameError, Result};
pub use message::{Message, MessageType};
pub use reader::FrameReader;
pub use writer::CommandWriter;
