use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::warn;
use uartlink_frame::{CommandWriter, FrameReader, Message, MessageType};
use uartlink_port::{NoResetLine, ResetLine, SerialLink};

use crate::error::{Result, SessionError};
use crate::handshake;
use crate::queue::Fifo;
use crate::receiver::{self, MessageQueues};
use crate::sender::{self, SharedWriter};

/// Tuning for a messenger session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the outbound command queue. Producers block while it is
    /// full.
    pub command_capacity: usize,
    /// Capacity of each per-type inbound queue. Overflow displaces the
    /// oldest message of that type.
    pub message_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_capacity: 256,
            message_capacity: 1024,
        }
    }
}

/// One transport session over one serial link.
///
/// Owns the command queue, the per-type message queues, and both worker
/// threads. The sender worker runs from construction; the receiver worker
/// is started explicitly (usually after the connection handshake), because
/// it takes over the read half — while it runs, [`Messenger::fetch_msg`]
/// and the handshake operations report [`SessionError::ReceiverActive`].
pub struct Messenger {
    commands: Arc<Fifo<String>>,
    writer: SharedWriter,
    queues: Arc<MessageQueues>,
    reader: Option<FrameReader<SerialLink>>,
    receiver: Option<ReceiverHandle>,
    sender: Option<JoinHandle<()>>,
    reset: Box<dyn ResetLine>,
}

struct ReceiverHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<FrameReader<SerialLink>>,
}

impl Messenger {
    /// Open a serial device and start a session with default tuning and no
    /// reset wiring.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let link = SerialLink::open(path, baud_rate, read_timeout)?;
        Self::over(link, Box::new(NoResetLine), SessionConfig::default())
    }

    /// Start a session over an existing link.
    ///
    /// Discards any stale bytes in the device input buffer, splits the
    /// link into read and write halves, and starts the sender worker.
    pub fn over(
        link: SerialLink,
        reset: Box<dyn ResetLine>,
        config: SessionConfig,
    ) -> Result<Self> {
        link.clear_input()?;
        let write_half = link.try_clone()?;

        let commands = Arc::new(Fifo::with_capacity(config.command_capacity));
        let writer: SharedWriter = Arc::new(Mutex::new(CommandWriter::new(write_half)));
        let queues = Arc::new(MessageQueues::with_capacity(config.message_capacity));
        let sender = sender::spawn(Arc::clone(&commands), Arc::clone(&writer));

        Ok(Self {
            commands,
            writer,
            queues,
            reader: Some(FrameReader::new(link)),
            receiver: None,
            sender: Some(sender),
            reset,
        })
    }

    /// Replace the reset line capability.
    pub fn set_reset_line(&mut self, reset: Box<dyn ResetLine>) {
        self.reset = reset;
    }

    /// Queue a command for transmission (fire-and-forget).
    ///
    /// Returns immediately unless the queue is at capacity, in which case
    /// the caller blocks until the sender drains it. No delivery
    /// confirmation is tracked.
    pub fn send_command(&self, command: impl Into<String>) {
        if !self.commands.push_wait(command.into()) {
            warn!("command queue closed, dropping command");
        }
    }

    /// Remove the oldest queued message of the given type, if any.
    pub fn fetch(&self, msg_type: MessageType) -> Option<Message> {
        self.queues.fetch(msg_type)
    }

    /// Remove the oldest queued message of the given type, waiting up to
    /// `timeout` for one to arrive.
    pub fn wait(&self, msg_type: MessageType, timeout: Duration) -> Option<Message> {
        self.queues.wait(msg_type, timeout)
    }

    /// Shared handle to the per-type message queues, for consumer threads.
    pub fn queues(&self) -> Arc<MessageQueues> {
        Arc::clone(&self.queues)
    }

    /// One synchronous header+payload read directly off the link,
    /// bypassing the queues.
    ///
    /// Diagnostic path; unavailable while the receiver worker runs.
    pub fn fetch_msg(&mut self) -> Result<Message> {
        let reader = self.reader.as_mut().ok_or(SessionError::ReceiverActive)?;
        Ok(reader.read_message()?)
    }

    /// Pulse the counterpart's reset line (high, 100 ms, low).
    pub fn send_reset(&mut self) -> bool {
        handshake::send_reset(self.reset.as_mut())
    }

    /// Read lines off the link until one equals `token` or `timeout`
    /// elapses. Unavailable while the receiver worker runs.
    pub fn wait_for_message(&mut self, token: &str, timeout: Duration) -> Result<bool> {
        let reader = self.reader.as_mut().ok_or(SessionError::ReceiverActive)?;
        Ok(handshake::wait_for_message(reader, token, timeout))
    }

    /// Wait for the counterpart's ready announcement and acknowledge it.
    ///
    /// True when the announcement arrived in time and the acknowledgment
    /// was written; false otherwise (nothing written on timeout).
    pub fn wait_for_connection(&mut self, timeout: Duration) -> Result<bool> {
        let reader = self.reader.as_mut().ok_or(SessionError::ReceiverActive)?;
        Ok(handshake::wait_for_connection(reader, &self.writer, timeout))
    }

    /// Hand the read half to the receiver worker and start demultiplexing.
    pub fn start_receiver(&mut self) -> Result<()> {
        let reader = self.reader.take().ok_or(SessionError::ReceiverActive)?;
        let stop = Arc::new(AtomicBool::new(false));
        let handle = receiver::spawn(reader, Arc::clone(&self.queues), Arc::clone(&stop));
        self.receiver = Some(ReceiverHandle { stop, handle });
        Ok(())
    }

    /// Stop the receiver worker and reclaim the read half.
    pub fn stop_receiver(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.stop.store(true, Ordering::Release);
            match receiver.handle.join() {
                Ok(reader) => self.reader = Some(reader),
                Err(_) => warn!("receiver worker panicked"),
            }
        }
    }

    /// Whether the receiver worker currently owns the read half.
    pub fn receiver_running(&self) -> bool {
        self.receiver.is_some()
    }

    /// Signal both workers and join them.
    ///
    /// The sender drains commands already queued before exiting; the
    /// receiver stops at its next idle check. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.commands.close();
        if let Some(sender) = self.sender.take() {
            if sender.join().is_err() {
                warn!("sender worker panicked");
            }
        }
        self.stop_receiver();
        self.queues.close();
    }
}

impl Drop for Messenger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
