use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use tracing::{debug, warn};
use uartlink_frame::{CommandWriter, FrameError};
use uartlink_port::SerialLink;

use crate::queue::Fifo;

/// Write half of the link, shared between the sender worker and the
/// handshake reply path.
pub(crate) type SharedWriter = Arc<Mutex<CommandWriter<SerialLink>>>;

pub(crate) fn lock_writer(writer: &SharedWriter) -> MutexGuard<'_, CommandWriter<SerialLink>> {
    writer.lock().unwrap_or_else(|p| p.into_inner())
}

/// Spawn the sender worker.
///
/// Blocks on the command queue (no polling), pops exactly one command at a
/// time, and transmits it whole under the writer lock before looking at
/// the queue again — so commands leave in FIFO order and are never
/// interleaved. Send failures are logged and the command dropped, never
/// retried. Exits once the queue is closed and drained.
pub(crate) fn spawn(queue: Arc<Fifo<String>>, writer: SharedWriter) -> JoinHandle<()> {
    std::thread::spawn(move || {
        debug!("sender worker started");
        while let Some(command) = queue.pop_wait() {
            let mut writer = lock_writer(&writer);
            match writer.send(&command) {
                Ok(()) => {}
                Err(FrameError::EmptyCommand) => {
                    warn!("empty command, not sending");
                }
                Err(err) => {
                    warn!(%err, command = command.as_str(), "could not send command");
                }
            }
        }
        debug!("sender worker stopped");
    })
}
