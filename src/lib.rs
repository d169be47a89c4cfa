//! # Brasa - Thermal Receipt Printer Driver
//!
//! Brasa drives CSN-A2-class serial thermal receipt printers. It provides:
//!
//! - **Protocol implementation**: ESC/POS command builders
//! - **Flow control**: hardware ready-line or software timing model, so the
//!   printer's internal buffer is never overrun
//! - **Job queue**: bounded FIFO with drop-oldest overflow and duty-cycle
//!   gating
//! - **Paper tracking**: consumable counters persisted across reboots
//!
//! ## Quick Start
//!
//! ```
//! use brasa::clock::FakeClock;
//! use brasa::flow::FlowMode;
//! use brasa::printer::{Printer, PrinterConfig};
//! use brasa::protocol::commands::{Align, TextSize};
//! use brasa::spool::Spooler;
//! use brasa::transport::MockLink;
//! use brasa::usage::MemoryStore;
//!
//! // On real hardware: SerialLink::open("/dev/ttyUSB0", 19200)?,
//! // SystemClock::new(), and a FileStore for the counters.
//! let clock = FakeClock::new();
//! let printer = Printer::new(
//!     MockLink::new(19200),
//!     clock.clone(),
//!     FlowMode::Software,
//!     Box::new(MemoryStore::new()),
//!     PrinterConfig::CSN_A2,
//! );
//! let mut spooler = Spooler::new(printer);
//!
//! // Admit jobs; the host tick drains them one at a time, with a 2-second
//! // cool-down between jobs.
//! spooler.queue_text("Hello!", TextSize::Medium, Align::Center, true, 0);
//! spooler.queue_two_column("TOTAL:", "$12.00", true, TextSize::Small, 0);
//! clock.advance_millis(2500);
//! spooler.tick();
//! assert_eq!(spooler.jobs_processed(), 1);
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command builders |
//! | [`flow`] | Per-byte flow control (hardware/software) |
//! | [`printer`] | Stateful driver and configuration |
//! | [`spool`] | Print-job queue and scheduler |
//! | [`usage`] | Paper usage tracking and persistence |
//! | [`transport`] | Byte links (serial, mock) |
//! | [`clock`] | Time source abstraction |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Tested against the CSN-A2 (58mm, TTL serial, 19200 baud). Other ESC/POS
//! mini thermal printers using the same command subset should work with
//! adjusted configuration.

pub mod clock;
pub mod error;
pub mod flow;
pub mod printer;
pub mod protocol;
pub mod spool;
pub mod transport;
pub mod usage;

// Re-exports for convenience
pub use error::BrasaError;
pub use printer::{Printer, PrinterConfig};
pub use spool::{JobKind, PrintJob, Spooler};
pub use transport::SerialLink;
