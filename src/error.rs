//! # Error Types
//!
//! This module defines error types used throughout the brasa library.
//!
//! ## Error Philosophy
//!
//! Flow-control timeouts are deliberately *not* errors: a wedged ready line
//! increments an observability counter and the byte is still written, so a
//! stuck printer can never hang the host. Queue overflow is also not an
//! error: the oldest job is evicted and the new one admitted.

use thiserror::Error;

/// Main error type for brasa operations
#[derive(Debug, Error)]
pub enum BrasaError {
    /// Printer reports no paper loaded
    #[error("Paper out")]
    PaperOut,

    /// Estimated job length exceeds the remaining roll
    #[error("Insufficient paper: need {needed_mm:.1}mm, {remaining_mm:.1}mm remaining")]
    InsufficientPaper {
        /// Paper the job is estimated to consume
        needed_mm: f32,
        /// Paper left on the roll per the usage tracker
        remaining_mm: f32,
    },

    /// Immediate-print precondition failed: a queued job is mid-execution
    #[error("Printer busy")]
    PrinterBusy,

    /// No response to a status query within its wait window
    #[error("Communication error: {0}")]
    Communication(String),

    /// Transport-level errors (device open, termios, write)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Usage counter persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
