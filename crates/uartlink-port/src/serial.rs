use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::{PortError, Result};
use crate::loopback::{self, LoopbackLink};

/// A full-duplex byte-stream link to the microcontroller counterpart.
///
/// Wraps either a real serial device or one end of an in-memory loopback
/// pair behind the same surface: blocking reads under a timeout, writes,
/// pending-byte counts, and independent handles via [`SerialLink::try_clone`]
/// for splitting the read and write directions across workers.
pub struct SerialLink {
    inner: LinkInner,
}

enum LinkInner {
    Serial(Box<dyn SerialPort>),
    Loopback(LoopbackLink),
}

impl SerialLink {
    /// Open a serial device at 8N1 with the given read timeout.
    ///
    /// The timeout bounds every blocking read; workers rely on it to check
    /// their shutdown signal, so it must be finite.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .open()
            .map_err(|source| PortError::Open {
                path: path.to_string(),
                source,
            })?;
        tracing::debug!(path, baud_rate, "serial link opened");
        Ok(Self {
            inner: LinkInner::Serial(port),
        })
    }

    /// Create two connected in-memory ends with the serial surface.
    ///
    /// Bytes written to one end become readable on the other. Used by tests
    /// and bench tooling in place of a physical device.
    pub fn loopback_pair() -> (Self, Self) {
        let (left, right) = loopback::pair();
        (
            Self {
                inner: LinkInner::Loopback(left),
            },
            Self {
                inner: LinkInner::Loopback(right),
            },
        )
    }

    /// Number of received bytes waiting to be read.
    pub fn pending_read(&self) -> Result<usize> {
        match &self.inner {
            LinkInner::Serial(port) => Ok(port.bytes_to_read()? as usize),
            LinkInner::Loopback(link) => Ok(link.pending_read()),
        }
    }

    /// Number of written bytes still queued for transmission.
    pub fn pending_write(&self) -> Result<usize> {
        match &self.inner {
            LinkInner::Serial(port) => Ok(port.bytes_to_write()? as usize),
            // Loopback writes land in the peer's receive buffer immediately.
            LinkInner::Loopback(_) => Ok(0),
        }
    }

    /// Discard any bytes already received but not yet read.
    pub fn clear_input(&self) -> Result<()> {
        match &self.inner {
            LinkInner::Serial(port) => {
                port.clear(ClearBuffer::Input)?;
                Ok(())
            }
            LinkInner::Loopback(link) => {
                link.clear_input();
                Ok(())
            }
        }
    }

    /// Change the read timeout for subsequent blocking reads.
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            LinkInner::Serial(port) => {
                port.set_timeout(timeout)?;
                Ok(())
            }
            LinkInner::Loopback(link) => {
                link.set_read_timeout(timeout);
                Ok(())
            }
        }
    }

    /// Current read timeout.
    pub fn read_timeout(&self) -> Duration {
        match &self.inner {
            LinkInner::Serial(port) => port.timeout(),
            LinkInner::Loopback(link) => link.read_timeout(),
        }
    }

    /// Create an independent handle to the same underlying channel.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            LinkInner::Serial(port) => {
                let cloned = port.try_clone()?;
                Ok(Self {
                    inner: LinkInner::Serial(cloned),
                })
            }
            LinkInner::Loopback(link) => Ok(Self {
                inner: LinkInner::Loopback(link.try_clone()),
            }),
        }
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.read(buf),
            LinkInner::Loopback(link) => link.read(buf),
        }
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.write(buf),
            LinkInner::Loopback(link) => link.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.flush(),
            LinkInner::Loopback(link) => link.flush(),
        }
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            LinkInner::Serial(port) => f
                .debug_struct("SerialLink")
                .field("type", &"serial")
                .field("name", &port.name())
                .finish(),
            LinkInner::Loopback(_) => f
                .debug_struct("SerialLink")
                .field("type", &"loopback")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};
    use std::time::Duration;

    use super::*;

    #[test]
    fn loopback_pair_roundtrip() {
        let (mut left, mut right) = SerialLink::loopback_pair();

        left.write_all(b"hello").unwrap();
        left.flush().unwrap();

        let mut buf = [0u8; 5];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn pending_read_counts_buffered_bytes() {
        let (mut left, right) = SerialLink::loopback_pair();
        assert_eq!(right.pending_read().unwrap(), 0);

        left.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(right.pending_read().unwrap(), 3);
        assert_eq!(left.pending_write().unwrap(), 0);
    }

    #[test]
    fn clear_input_discards_stale_bytes() {
        let (mut left, mut right) = SerialLink::loopback_pair();
        left.write_all(b"stale").unwrap();

        right.clear_input().unwrap();
        assert_eq!(right.pending_read().unwrap(), 0);

        left.write_all(b"fresh").unwrap();
        let mut buf = [0u8; 5];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"fresh");
    }

    #[test]
    fn split_halves_share_the_channel() {
        let (left, mut right) = SerialLink::loopback_pair();
        let mut write_half = left.try_clone().unwrap();
        let mut read_half = left;

        right.write_all(b"in").unwrap();
        write_half.write_all(b"out").unwrap();

        let mut buf = [0u8; 2];
        read_half.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"in");

        let mut buf = [0u8; 3];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"out");
    }

    #[test]
    fn read_timeout_is_adjustable() {
        let (mut left, _right) = SerialLink::loopback_pair();
        left.set_read_timeout(Duration::from_millis(5)).unwrap();
        assert_eq!(left.read_timeout(), Duration::from_millis(5));

        let mut buf = [0u8; 1];
        let err = left.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }
}
