//! Serial link layer for uartlink.
//!
//! Provides the full-duplex byte-stream channel everything else builds on:
//! - [`SerialLink`] — a serial device (or an in-memory loopback end) with
//!   blocking reads under a timeout, pending-byte counts, and independent
//!   read/write handles via `try_clone`
//! - [`ResetLine`] — the narrow capability the session layer pulses to
//!   reboot the microcontroller counterpart
//!
//! This is the lowest layer of uartlink.

pub mod error;
mod loopback;
pub mod reset;
pub mod serial;

pub use error::{PortError, Result};
#[cfg(feature = "rpi")]
pub use reset::GpioResetLine;
pub use reset::{NoResetLine, ResetLine};
pub use serial::SerialLink;
