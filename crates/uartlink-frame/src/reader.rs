use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::codec::{decode_header, decode_text, unpack_fixed, HEADER_SIZE, MAX_TEXT_LINE};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Bytes still owed to a frame that failed to decode.
///
/// The reader discards them before attempting the next frame, so one bad
/// frame never shifts the interpretation of the ones behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipState {
    None,
    /// Discard this many payload bytes (the length the bad header claimed).
    Bytes(usize),
    /// Discard through the next newline (unterminated/oversized text frame).
    ToNewline,
}

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally — callers always get whole messages.
/// With fewer than [`HEADER_SIZE`] bytes buffered, nothing is consumed; a
/// later call picks up where the stream left off. After a recoverable
/// decode failure the reader realigns itself to the next frame boundary
/// before returning the error.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    skip: SkipState,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            skip: SkipState::None,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::Disconnected)` at EOF. I/O timeouts
    /// propagate as `FrameError::Io` with `ErrorKind::TimedOut`; buffered
    /// bytes survive them, so retrying continues the same frame.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            self.apply_skip();
            if self.skip == SkipState::None {
                if let Some(message) = self.try_decode()? {
                    return Ok(message);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::Disconnected);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of bytes currently buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Remove and return any buffered, not-yet-decoded bytes.
    ///
    /// The line-oriented handshake path shares the stream with framed
    /// traffic; it drains this buffer before reading the link directly.
    pub fn take_buffered(&mut self) -> Vec<u8> {
        self.skip = SkipState::None;
        self.buf.split().to_vec()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn apply_skip(&mut self) {
        match self.skip {
            SkipState::None => {}
            SkipState::Bytes(owed) => {
                let take = owed.min(self.buf.len());
                self.buf.advance(take);
                self.skip = if take == owed {
                    SkipState::None
                } else {
                    SkipState::Bytes(owed - take)
                };
            }
            SkipState::ToNewline => match self.buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.buf.advance(pos + 1);
                    self.skip = SkipState::None;
                }
                None => {
                    let len = self.buf.len();
                    self.buf.advance(len);
                }
            },
        }
    }

    /// Decode one message from the buffer, or report that more bytes are
    /// needed (`Ok(None)`). On a recoverable error the buffer/skip state is
    /// left at the next frame boundary.
    fn try_decode(&mut self) -> Result<Option<Message>> {
        if self.buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let claimed = usize::from(u16::from_le_bytes([self.buf[1], self.buf[2]]));
        let msg_type = match decode_header(&self.buf[..HEADER_SIZE]) {
            Ok((msg_type, _)) => msg_type,
            Err(err) => {
                // Unknown tag: the claimed length is the only forward
                // pointer available, trust it for realignment.
                self.buf.advance(HEADER_SIZE);
                self.skip = SkipState::Bytes(claimed);
                tracing::debug!(skip = claimed, "realigning after unknown frame tag");
                return Err(err);
            }
        };

        if let Some(expected) = msg_type.fixed_payload_len() {
            if claimed != expected {
                self.buf.advance(HEADER_SIZE);
                self.skip = SkipState::Bytes(claimed);
                tracing::debug!(skip = claimed, "realigning after length mismatch");
                return Err(FrameError::LengthMismatch {
                    kind: msg_type.name(),
                    expected,
                    got: claimed,
                });
            }
            if self.buf.len() < HEADER_SIZE + expected {
                return Ok(None);
            }
            self.buf.advance(HEADER_SIZE);
            let payload = self.buf.split_to(expected);
            return Ok(Some(unpack_fixed(msg_type, &payload)));
        }

        // Text frame: newline-terminated, header length vestigial.
        match self.buf[HEADER_SIZE..].iter().position(|&b| b == b'\n') {
            Some(pos) => {
                self.buf.advance(HEADER_SIZE);
                let line = self.buf.split_to(pos);
                self.buf.advance(1);
                decode_text(msg_type, &line).map(Some)
            }
            None => {
                if self.buf.len() - HEADER_SIZE > MAX_TEXT_LINE {
                    self.buf.advance(HEADER_SIZE);
                    self.skip = SkipState::ToNewline;
                    return Err(FrameError::LineTooLong {
                        limit: MAX_TEXT_LINE,
                    });
                }
                Ok(None)
            }
        }
    }
}
