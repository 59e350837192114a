//! Worker orchestration for the uartlink transport.
//!
//! One [`Messenger`] owns one serial link and runs up to two workers
//! against it:
//! - the **sender** drains a bounded FIFO of command strings onto the
//!   write half, one whole command at a time
//! - the **receiver** pulls typed frames off the read half and fans them
//!   into per-type queues for consumers to [`Messenger::fetch`] or
//!   [`Messenger::wait`] on
//!
//! The read direction has exactly one active consumer at any time: either
//! the receiver worker, or the caller via [`Messenger::fetch_msg`] and the
//! handshake operations. Both workers honor a shutdown signal and join
//! deterministically.

pub mod error;
pub mod handshake;
pub mod messenger;
mod queue;
pub mod receiver;
mod sender;

pub use error::{Result, SessionError};
pub use handshake::{READY_REPLY, READY_TOKEN, RESET_PULSE};
pub use messenger::{Messenger, SessionConfig};
pub use receiver::MessageQueues;
