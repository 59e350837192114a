//! In-memory link pair with the serial surface.
//!
//! Used by tests and bench tooling so every layer above the port can be
//! exercised without a device on the other end of a cable.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(20);

#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
}

#[derive(Default)]
struct PipeState {
    data: VecDeque<u8>,
    closed: bool,
}

impl Pipe {
    fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.closed = true;
        self.readable.notify_all();
    }

    fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.data.len()
    }

    fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.data.clear();
    }
}

/// Closes both directions once the last handle of an end is dropped, so the
/// peer's blocked reads wake with EOF instead of hanging.
struct EndGuard {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
}

impl Drop for EndGuard {
    fn drop(&mut self) {
        self.rx.close();
        self.tx.close();
    }
}

/// One end of an in-memory link pair.
///
/// Reads block until data arrives, the peer end closes, or the configured
/// read timeout elapses (`ErrorKind::TimedOut`, matching a serial device).
pub struct LoopbackLink {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    read_timeout: Duration,
    _guard: Arc<EndGuard>,
}

pub(crate) fn pair() -> (LoopbackLink, LoopbackLink) {
    let a = Arc::new(Pipe::default());
    let b = Arc::new(Pipe::default());

    let left = LoopbackLink {
        rx: Arc::clone(&a),
        tx: Arc::clone(&b),
        read_timeout: DEFAULT_READ_TIMEOUT,
        _guard: Arc::new(EndGuard {
            rx: Arc::clone(&a),
            tx: Arc::clone(&b),
        }),
    };
    let right = LoopbackLink {
        rx: Arc::clone(&b),
        tx: Arc::clone(&a),
        read_timeout: DEFAULT_READ_TIMEOUT,
        _guard: Arc::new(EndGuard { rx: b, tx: a }),
    };

    (left, right)
}

impl LoopbackLink {
    pub(crate) fn pending_read(&self) -> usize {
        self.rx.len()
    }

    pub(crate) fn clear_input(&self) {
        self.rx.clear();
    }

    pub(crate) fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) fn try_clone(&self) -> LoopbackLink {
        LoopbackLink {
            rx: Arc::clone(&self.rx),
            tx: Arc::clone(&self.tx),
            read_timeout: self.read_timeout,
            _guard: Arc::clone(&self._guard),
        }
    }
}

impl Read for LoopbackLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut state = self.rx.state.lock().unwrap_or_else(|p| p.into_inner());
        loop {
            if !state.data.is_empty() {
                let mut n = 0;
                while n < buf.len() {
                    match state.data.pop_front() {
                        Some(byte) => {
                            buf[n] = byte;
                            n += 1;
                        }
                        None => break,
                    }
                }
                return Ok(n);
            }
            if state.closed {
                return Ok(0);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::from(io::ErrorKind::TimedOut));
            }
            let (next, _timed_out) = self
                .rx
                .readable
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            state = next;
        }
    }
}

impl Write for LoopbackLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.tx.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        state.data.extend(buf.iter().copied());
        self.tx.readable.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
