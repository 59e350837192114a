use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};
use uartlink_frame::{FrameError, FrameReader, Message, MessageType};
use uartlink_port::SerialLink;

use crate::queue::Fifo;

/// Per-type inbound message queues.
///
/// Single producer (the receiver worker), any number of consumers.
/// Each queue preserves link-arrival order; overflow displaces the oldest
/// message of that type and is counted.
pub struct MessageQueues {
    queues: [Fifo<Message>; MessageType::COUNT],
}

impl MessageQueues {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: std::array::from_fn(|_| Fifo::with_capacity(capacity)),
        }
    }

    fn queue(&self, msg_type: MessageType) -> &Fifo<Message> {
        &self.queues[msg_type.index()]
    }

    /// Remove the oldest message of the given type, if any.
    pub fn fetch(&self, msg_type: MessageType) -> Option<Message> {
        self.queue(msg_type).pop()
    }

    /// Remove the oldest message of the given type, waiting up to
    /// `timeout` for one to arrive.
    pub fn wait(&self, msg_type: MessageType, timeout: Duration) -> Option<Message> {
        self.queue(msg_type).pop_timeout(timeout)
    }

    /// Number of messages currently queued for the given type.
    pub fn len(&self, msg_type: MessageType) -> usize {
        self.queue(msg_type).len()
    }

    /// Whether the queue for the given type is empty.
    pub fn is_empty(&self, msg_type: MessageType) -> bool {
        self.len(msg_type) == 0
    }

    /// Messages of the given type displaced by overflow so far.
    pub fn dropped(&self, msg_type: MessageType) -> u64 {
        self.queue(msg_type).dropped()
    }

    pub(crate) fn push(&self, message: Message) {
        let msg_type = message.message_type();
        if self.queue(msg_type).push_drop_oldest(message) {
            warn!(%msg_type, "queue full, dropped oldest message");
        }
    }

    pub(crate) fn close(&self) {
        for queue in &self.queues {
            queue.close();
        }
    }
}

/// Spawn the receiver worker.
///
/// Owns the read half for its lifetime and hands it back on join, so the
/// single-active-reader invariant is enforced by ownership rather than
/// convention. Read timeouts are idle iterations (the stop flag is checked
/// each pass); recoverable decode failures are logged and contained to the
/// frame that caused them.
pub(crate) fn spawn(
    mut reader: FrameReader<SerialLink>,
    queues: Arc<MessageQueues>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<FrameReader<SerialLink>> {
    std::thread::spawn(move || {
        debug!("receiver worker started");
        while !stop.load(Ordering::Acquire) {
            match reader.read_message() {
                Ok(message) => queues.push(message),
                Err(FrameError::Io(err)) if is_idle(&err) => continue,
                Err(err) if err.is_recoverable() => {
                    warn!(%err, "discarding malformed frame");
                }
                Err(FrameError::Disconnected) => {
                    debug!("link closed, receiver exiting");
                    break;
                }
                Err(err) => {
                    warn!(%err, "receiver I/O failure, exiting");
                    break;
                }
            }
        }
        debug!("receiver worker stopped");
        reader
    })
}

fn is_idle(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
