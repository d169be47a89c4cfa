//! # Printer Transport Layer
//!
//! This module provides the raw duplex byte channel to the printer.
//!
//! ## Available Links
//!
//! - [`serial`]: USB/UART serial device (Linux TTY in raw mode)
//! - [`mock`]: In-memory link for tests (captures sent bytes, scripts replies)
//!
//! ## The `ByteLink` Trait
//!
//! Everything above this layer talks to a [`ByteLink`]: one byte out, one
//! byte in, a readability probe, and the configured baud rate (which the
//! flow controller needs to derive per-byte transmission time). Pacing is
//! *not* the link's job — the [`crate::flow::FlowController`] decides when
//! `send` may be called.

pub mod mock;
pub mod serial;

pub use mock::MockLink;
pub use serial::SerialLink;

use crate::error::BrasaError;

/// Raw duplex byte channel to the printer.
///
/// Implementations must not buffer or pace writes; flow control lives in
/// [`crate::flow::FlowController`].
pub trait ByteLink {
    /// Write one byte to the device.
    fn send(&mut self, byte: u8) -> Result<(), BrasaError>;

    /// True if at least one byte is ready to be read.
    fn available(&mut self) -> bool;

    /// Read one byte if available.
    fn recv(&mut self) -> Option<u8>;

    /// Configured line speed in bits per second.
    fn baud_rate(&self) -> u32;
}
