use std::io::{ErrorKind, Write};

use crate::codec::encode_command;
use crate::error::{FrameError, Result};

/// Writes encoded commands to any `Write` stream.
///
/// One call transmits one whole command: encode, write to completion,
/// flush. Callers serialize access (the sender worker holds this behind a
/// lock), so commands are never interleaved mid-write.
pub struct CommandWriter<T> {
    inner: T,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Encode and transmit one command (blocking).
    ///
    /// Fails with [`FrameError::EmptyCommand`] before touching the stream.
    pub fn send(&mut self, command: &str) -> Result<()> {
        let encoded = encode_command(command)?;

        let mut offset = 0usize;
        while offset < encoded.len() {
            match self.inner.write(&encoded[offset..]) {
                Ok(0) => return Err(FrameError::Disconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn encoded_bytes_reach_the_stream() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send("SS512").unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"SS512\n");
    }

    #[test]
    fn empty_command_writes_nothing() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            writer.send("").unwrap_err(),
            FrameError::EmptyCommand
        ));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn successive_commands_stay_in_order() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send("IO").unwrap();
        writer.send("PC").unwrap();
        writer.send("DP25").unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"IO\nPC\nDP25\n");
    }

    #[test]
    fn interrupted_write_retries() {
        let sink = InterruptedThenOk {
            interrupted: false,
            data: Vec::new(),
        };
        let mut writer = CommandWriter::new(sink);
        writer.send("FO").unwrap();
        assert_eq!(writer.into_inner().data, b"FO\n");
    }

    #[test]
    fn zero_write_reports_disconnect() {
        let mut writer = CommandWriter::new(ZeroWriter);
        assert!(matches!(
            writer.send("IO").unwrap_err(),
            FrameError::Disconnected
        ));
    }

    struct InterruptedThenOk {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedThenOk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
