//! Reset pulse and startup synchronization.
//!
//! After a reset the counterpart boots and announces readiness with a bare
//! text line; we acknowledge with a command. Both sides then switch to
//! framed traffic. The line reads here share the stream with the frame
//! reader, so any bytes it had buffered are drained first.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uartlink_frame::FrameReader;
use uartlink_port::{ResetLine, SerialLink};

use crate::sender::{lock_writer, SharedWriter};

/// Line announced by the counterpart once its firmware is ready.
pub const READY_TOKEN: &str = "available";

/// Command acknowledging the ready announcement.
pub const READY_REPLY: &str = "OK";

/// How long the reset line is held high.
pub const RESET_PULSE: Duration = Duration::from_millis(100);

/// Pulse the reset line: high, hold, low.
///
/// Returns false (with the cause logged) if either edge fails; the caller
/// decides whether to retry.
pub(crate) fn send_reset(line: &mut dyn ResetLine) -> bool {
    if let Err(err) = line.set_high() {
        warn!(%err, "could not drive reset line high");
        return false;
    }
    std::thread::sleep(RESET_PULSE);
    if let Err(err) = line.set_low() {
        warn!(%err, "could not release reset line");
        return false;
    }
    true
}

/// Read lines off the link until one equals `token` exactly or the
/// wall-clock deadline passes.
///
/// Undecodable lines are logged and skipped, never fatal. Returns false on
/// timeout or a dead link.
pub(crate) fn wait_for_message(
    reader: &mut FrameReader<SerialLink>,
    token: &str,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    let mut pending: VecDeque<u8> = reader.take_buffered().into();
    let link = reader.get_mut();
    let mut line: Vec<u8> = Vec::new();

    loop {
        if Instant::now() >= deadline {
            return false;
        }

        let byte = match pending.pop_front() {
            Some(byte) => byte,
            None => {
                let mut buf = [0u8; 1];
                match link.read(&mut buf) {
                    Ok(0) => {
                        warn!(token, "link closed while waiting");
                        return false;
                    }
                    Ok(_) => buf[0],
                    Err(err)
                        if err.kind() == ErrorKind::TimedOut
                            || err.kind() == ErrorKind::WouldBlock
                            || err.kind() == ErrorKind::Interrupted =>
                    {
                        continue;
                    }
                    Err(err) => {
                        warn!(%err, token, "read failed while waiting");
                        return false;
                    }
                }
            }
        };

        if byte != b'\n' {
            line.push(byte);
            continue;
        }

        let complete = std::mem::take(&mut line);
        let complete = match complete.last() {
            Some(b'\r') => &complete[..complete.len() - 1],
            _ => &complete[..],
        };
        match std::str::from_utf8(complete) {
            Ok(text) => {
                debug!(line = text, "handshake line");
                if text == token {
                    return true;
                }
            }
            Err(err) => {
                warn!(%err, "skipping undecodable line");
            }
        }
    }
}

/// Wait for the counterpart's ready announcement and acknowledge it.
///
/// On a match, writes the [`READY_REPLY`] command through the shared
/// writer and returns true only if that write succeeded. On timeout,
/// returns false and writes nothing.
pub(crate) fn wait_for_connection(
    reader: &mut FrameReader<SerialLink>,
    writer: &SharedWriter,
    timeout: Duration,
) -> bool {
    if !wait_for_message(reader, READY_TOKEN, timeout) {
        return false;
    }
    let mut writer = lock_writer(writer);
    match writer.send(READY_REPLY) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "could not acknowledge ready announcement");
            false
        }
    }
}
