//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for the ESC/POS command subset spoken by
//! CSN-A2 / Adafruit-style mini thermal printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Control and formatting commands (wake, reset, heat, text
//!   styles, alignment, feed, rotation, paper status)
//! - [`barcode`]: 1-D barcodes and the four-frame QR code sequence
//!
//! ## Usage Example
//!
//! ```
//! use brasa::protocol::{barcode, commands};
//! use brasa::protocol::commands::{Align, TextSize};
//!
//! // Build a simple print sequence
//! let mut data = Vec::new();
//! data.extend(commands::reset());
//! data.extend(commands::justify(Align::Center));
//! data.extend(commands::bold(true));
//! data.extend(b"RECEIPT\n");
//! data.extend(commands::bold(false));
//! data.extend(commands::justify(Align::Left));
//! data.extend(barcode::encode(barcode::Symbology::Code39, b"A123"));
//! data.extend(commands::feed(2));
//! let _ = TextSize::Small;
//!
//! // Send `data` byte-by-byte through the flow controller...
//! ```
//!
//! Builders are pure: they return byte vectors and never touch the link.
//! The stateful driver in [`crate::printer`] routes every byte through the
//! flow controller and keeps the usage counters honest.

pub mod barcode;
pub mod commands;
