//! # Paper Usage Tracking
//!
//! Thermal rolls are a consumable and the printer has no gauge, so usage is
//! reconstructed from what we print: every emission path in the driver
//! reports the characters, lines, and feeds it *actually issued* (truncated
//! operations report the truncated amounts). From line and feed counts plus
//! a per-line calibration constant, the tracker estimates consumed length
//! and the remaining roll.
//!
//! ## Persistence
//!
//! Counters survive reboots through a [`UsageStore`] — an opaque
//! `save(bytes)`/`load()` pair (file, flash, whatever the host provides).
//! Checkpoints happen automatically each time the character counter crosses
//! a multiple of 100, and on explicit reset. A missing prior record is not
//! an error; counters simply start at zero.
//!
//! ## Estimation Model
//!
//! ```text
//! usage_mm      = (lines_printed + feeds_executed) * line_height_mm
//! usage_percent = usage_mm / paper_roll_length_mm * 100
//! ```
//!
//! Defaults: 30 m roll, 4.0 mm per line.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BrasaError;
use crate::protocol::commands::TextSize;

/// Soft-wrap width used by line estimation (small text columns).
pub const WRAP_WIDTH: usize = 32;

/// Checkpoint whenever the character counter crosses a multiple of this.
const CHECKPOINT_EVERY_CHARS: u32 = 100;

/// Default roll length: 30 meters.
pub const DEFAULT_ROLL_LENGTH_MM: f32 = 30_000.0;

/// Default paper advanced per text line.
pub const DEFAULT_LINE_HEIGHT_MM: f32 = 4.0;

/// Persisted consumable counters. Monotonically increasing; reset only by
/// explicit user action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub lines_printed: u32,
    pub characters_printed: u32,
    pub feeds_executed: u32,
}

/// Opaque persistent storage for the usage counters, keyed by a fixed
/// identifier chosen by the implementation.
pub trait UsageStore {
    fn save(&mut self, data: &[u8]) -> Result<(), BrasaError>;
    fn load(&mut self) -> Result<Option<Vec<u8>>, BrasaError>;
}

/// File-backed store for hosts with a filesystem.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageStore for FileStore {
    fn save(&mut self, data: &[u8]) -> Result<(), BrasaError> {
        fs::write(&self.path, data)
            .map_err(|e| BrasaError::Storage(format!("write {}: {}", self.path.display(), e)))
    }

    fn load(&mut self) -> Result<Option<Vec<u8>>, BrasaError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BrasaError::Storage(format!(
                "read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-memory store; clones share the same slot so tests can simulate a
/// reboot by building a fresh tracker over the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryStore {
    fn save(&mut self, data: &[u8]) -> Result<(), BrasaError> {
        *self.slot.borrow_mut() = Some(data.to_vec());
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Vec<u8>>, BrasaError> {
        Ok(self.slot.borrow().clone())
    }
}

/// # Usage Tracker
///
/// Accumulates consumable counters, estimates paper usage, and checkpoints
/// to a [`UsageStore`].
pub struct UsageTracker {
    counters: UsageCounters,
    paper_roll_length_mm: f32,
    line_height_mm: f32,
    store: Box<dyn UsageStore>,
}

impl UsageTracker {
    pub fn new(store: Box<dyn UsageStore>) -> Self {
        Self {
            counters: UsageCounters::default(),
            paper_roll_length_mm: DEFAULT_ROLL_LENGTH_MM,
            line_height_mm: DEFAULT_LINE_HEIGHT_MM,
            store,
        }
    }

    /// Record an emission: `chars` characters, `lines` line advances,
    /// `feeds` fed lines. Checkpoints automatically when the character
    /// counter crosses a multiple of 100; a failing store is logged, never
    /// propagated — losing a checkpoint must not fail a print.
    pub fn track(&mut self, chars: u32, lines: u32, feeds: u32) {
        let before = self.counters.characters_printed;
        self.counters.characters_printed += chars;
        self.counters.lines_printed += lines;
        self.counters.feeds_executed += feeds;

        if before / CHECKPOINT_EVERY_CHARS
            != self.counters.characters_printed / CHECKPOINT_EVERY_CHARS
        {
            if let Err(e) = self.checkpoint() {
                warn!(error = %e, "usage checkpoint failed");
            }
        }
    }

    /// Serialize the counters to the store.
    pub fn checkpoint(&mut self) -> Result<(), BrasaError> {
        let bytes = serde_json::to_vec(&self.counters)
            .map_err(|e| BrasaError::Storage(format!("serialize counters: {}", e)))?;
        self.store.save(&bytes)
    }

    /// Load counters persisted by a previous run. No prior record leaves
    /// the counters at zero.
    pub fn restore(&mut self) -> Result<(), BrasaError> {
        if let Some(bytes) = self.store.load()? {
            self.counters = serde_json::from_slice(&bytes)
                .map_err(|e| BrasaError::Storage(format!("parse counters: {}", e)))?;
            debug!(
                lines = self.counters.lines_printed,
                chars = self.counters.characters_printed,
                feeds = self.counters.feeds_executed,
                "usage counters restored"
            );
        }
        Ok(())
    }

    /// Zero all counters and checkpoint immediately.
    pub fn reset(&mut self) -> Result<(), BrasaError> {
        self.counters = UsageCounters::default();
        self.checkpoint()
    }

    pub fn counters(&self) -> UsageCounters {
        self.counters
    }

    pub fn lines_printed(&self) -> u32 {
        self.counters.lines_printed
    }

    pub fn characters_printed(&self) -> u32 {
        self.counters.characters_printed
    }

    pub fn feeds_executed(&self) -> u32 {
        self.counters.feeds_executed
    }

    /// Estimated paper consumed so far.
    pub fn usage_mm(&self) -> f32 {
        (self.counters.lines_printed + self.counters.feeds_executed) as f32 * self.line_height_mm
    }

    /// Consumed fraction of the configured roll, in percent.
    pub fn usage_percent(&self) -> f32 {
        self.usage_mm() / self.paper_roll_length_mm * 100.0
    }

    /// Estimated paper left on the roll.
    pub fn remaining_mm(&self) -> f32 {
        self.paper_roll_length_mm - self.usage_mm()
    }

    /// Would `estimated_lines` more lines fit on the remaining roll?
    pub fn can_fit(&self, estimated_lines: u32) -> bool {
        let required_mm = estimated_lines as f32 * self.line_height_mm;
        let ok = required_mm <= self.remaining_mm();
        debug!(
            required_mm,
            remaining_mm = self.remaining_mm(),
            "paper sufficiency check"
        );
        ok
    }

    /// Count the lines `text` will occupy: explicit newlines plus soft-wrap
    /// boundaries at the 32-character line width. Used by admission-time
    /// checks, not by the encoder.
    pub fn estimate_lines(text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let mut lines = 1 + text.bytes().filter(|&b| b == b'\n').count() as u32;

        let mut column = 0usize;
        for b in text.bytes() {
            if b == b'\n' {
                column = 0;
            } else {
                column += 1;
                if column >= WRAP_WIDTH {
                    lines += 1;
                    column = 0;
                }
            }
        }
        lines
    }

    /// Paper a text job would consume, scaled by the size class
    /// (large lines are taller).
    pub fn predict_usage_mm(&self, text: &str, size: TextSize) -> f32 {
        let multiplier = match size {
            TextSize::Small => 1.0,
            TextSize::Medium => 1.5,
            TextSize::Large => 2.0,
        };
        Self::estimate_lines(text) as f32 * self.line_height_mm * multiplier
    }

    /// Calibration: full roll length in millimeters.
    pub fn set_paper_roll_length(&mut self, length_mm: f32) {
        self.paper_roll_length_mm = length_mm;
    }

    /// Calibration: paper advanced per line.
    pub fn set_line_height_calibration(&mut self, mm_per_line: f32) {
        self.line_height_mm = mm_per_line;
    }

    pub fn line_height_mm(&self) -> f32 {
        self.line_height_mm
    }

    /// Clamp out-of-range calibration back to defaults. Returns true if
    /// nothing had to be fixed.
    pub fn validate_calibration(&mut self) -> bool {
        let mut valid = true;
        if self.paper_roll_length_mm <= 0.0 {
            warn!(
                roll_mm = self.paper_roll_length_mm,
                "invalid roll length, restoring default"
            );
            self.paper_roll_length_mm = DEFAULT_ROLL_LENGTH_MM;
            valid = false;
        }
        if self.line_height_mm <= 0.0 || self.line_height_mm > 10.0 {
            warn!(
                line_mm = self.line_height_mm,
                "invalid line height, restoring default"
            );
            self.line_height_mm = DEFAULT_LINE_HEIGHT_MM;
            valid = false;
        }
        valid
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> UsageTracker {
        UsageTracker::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_track_accumulates() {
        let mut t = tracker();
        t.track(10, 2, 1);
        t.track(5, 0, 0);
        assert_eq!(t.characters_printed(), 15);
        assert_eq!(t.lines_printed(), 2);
        assert_eq!(t.feeds_executed(), 1);
    }

    #[test]
    fn test_usage_mm_and_percent() {
        let mut t = tracker();
        t.track(0, 3, 2); // 5 line-heights = 20mm
        assert!((t.usage_mm() - 20.0).abs() < f32::EPSILON);
        assert!((t.usage_percent() - 20.0 / 30_000.0 * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_checkpoint_restore_round_trip() {
        let store = MemoryStore::new();
        let mut t = UsageTracker::new(Box::new(store.clone()));
        t.track(42, 7, 3);
        t.checkpoint().unwrap();

        // Simulate reboot: fresh tracker over the same store.
        let mut t2 = UsageTracker::new(Box::new(store));
        t2.restore().unwrap();
        assert_eq!(t2.counters(), t.counters());
    }

    #[test]
    fn test_restore_without_prior_data() {
        let mut t = tracker();
        t.restore().unwrap();
        assert_eq!(t.counters(), UsageCounters::default());
    }

    #[test]
    fn test_auto_checkpoint_on_100_char_boundary() {
        let store = MemoryStore::new();
        let mut t = UsageTracker::new(Box::new(store.clone()));
        t.track(99, 0, 0);
        // Not yet crossed.
        let mut probe = UsageTracker::new(Box::new(store.clone()));
        probe.restore().unwrap();
        assert_eq!(probe.characters_printed(), 0);

        t.track(1, 0, 0); // crosses 100
        let mut probe = UsageTracker::new(Box::new(store));
        probe.restore().unwrap();
        assert_eq!(probe.characters_printed(), 100);
    }

    #[test]
    fn test_reset_zeroes_and_persists() {
        let store = MemoryStore::new();
        let mut t = UsageTracker::new(Box::new(store.clone()));
        t.track(250, 10, 4);
        t.reset().unwrap();
        assert_eq!(t.counters(), UsageCounters::default());

        let mut probe = UsageTracker::new(Box::new(store));
        probe.restore().unwrap();
        assert_eq!(probe.counters(), UsageCounters::default());
    }

    #[test]
    fn test_estimate_lines_newlines_only() {
        assert_eq!(UsageTracker::estimate_lines("abc\ndef"), 2);
        assert_eq!(UsageTracker::estimate_lines("one line"), 1);
        assert_eq!(UsageTracker::estimate_lines(""), 0);
    }

    #[test]
    fn test_estimate_lines_soft_wrap() {
        // 40 chars: wraps once at 32
        let text = "x".repeat(40);
        assert_eq!(UsageTracker::estimate_lines(&text), 2);
        // Exactly 32 chars triggers a wrap boundary
        let text = "x".repeat(32);
        assert_eq!(UsageTracker::estimate_lines(&text), 2);
    }

    #[test]
    fn test_can_fit() {
        let mut t = tracker();
        t.set_paper_roll_length(100.0); // 25 lines at 4mm
        assert!(t.can_fit(25));
        assert!(!t.can_fit(26));
        t.track(0, 10, 0); // 40mm used
        assert!(t.can_fit(15));
        assert!(!t.can_fit(16));
    }

    #[test]
    fn test_predict_usage_size_multiplier() {
        let t = tracker();
        let small = t.predict_usage_mm("hello", TextSize::Small);
        let medium = t.predict_usage_mm("hello", TextSize::Medium);
        let large = t.predict_usage_mm("hello", TextSize::Large);
        assert!((small - 4.0).abs() < f32::EPSILON);
        assert!((medium - 6.0).abs() < f32::EPSILON);
        assert!((large - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_calibration_clamps() {
        let mut t = tracker();
        t.set_paper_roll_length(-5.0);
        t.set_line_height_calibration(99.0);
        assert!(!t.validate_calibration());
        assert!((t.remaining_mm() - DEFAULT_ROLL_LENGTH_MM).abs() < f32::EPSILON);
        assert!((t.line_height_mm() - DEFAULT_LINE_HEIGHT_MM).abs() < f32::EPSILON);
        assert!(t.validate_calibration());
    }
}
