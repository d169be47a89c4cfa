//! # Printer Driver
//!
//! The stateful command encoder: turns printer operations (text, barcodes,
//! QR codes, column layouts, feeds) into deterministic control-byte
//! sequences, routed byte-by-byte through the flow controller, with every
//! emission reported to the usage tracker.
//!
//! ## Layering
//!
//! - [`crate::protocol`] builds the bytes (pure)
//! - [`Printer`] sends them, inserts mechanical settle waits, and counts
//!   what was *actually* issued (a truncated QR or rotated-text operation
//!   counts its truncated amounts)
//! - [`crate::spool`] decides *when* a job runs
//!
//! ## Settle Waits
//!
//! Operations with mechanical latency are followed by
//! [`crate::flow::FlowController::wait_for_operation`] using per-operation
//! expected times (wake 3 s, reset 5 s, barcode 5 s, QR print up to 10 s,
//! each rotated glyph 2 s). All waits are bounded.

pub mod config;

pub use config::PrinterConfig;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::BrasaError;
use crate::flow::{FlowController, FlowMode};
use crate::protocol::barcode::{self, Symbology, qr};
use crate::protocol::commands::{self, Align, TextSize};
use crate::transport::ByteLink;
use crate::usage::{UsageStore, UsageTracker};

// Mechanical settle times (milliseconds).
const WAKE_SETTLE_MS: u64 = 3000;
const RESET_SETTLE_MS: u64 = 5000;
const ROTATION_SETTLE_MS: u64 = 500;
const BARCODE_SETTLE_MS: u64 = 5000;
const QR_CONFIG_SETTLE_MS: u64 = 1000;
const QR_STORE_SETTLE_MS: u64 = 3000;
const QR_PRINT_SETTLE_MS: u64 = 10_000;
const ROTATED_CHAR_SETTLE_MS: u64 = 2000;
const PAPER_QUERY_SETTLE_MS: u64 = 1000;

/// Rotated printing is serialized glyph-by-glyph; more than this reliably
/// overruns the mechanism.
pub const MAX_ROTATED_CHARS: usize = 20;

/// Glyph printed in place of a space in rotated mode (a bare space feeds
/// nothing and the column collapses).
const ROTATED_SPACE_GLYPH: &str = "\u{00B7}";

/// Snapshot returned by [`Printer::detailed_status`].
#[derive(Debug, Clone, Copy)]
pub struct PrinterStatus {
    pub paper_present: bool,
    /// Cumulative flow-control ready-wait timeouts.
    pub flow_timeouts: u32,
    pub bytes_sent: u64,
}

/// # Printer
///
/// Owns the flow controller (and through it the byte link) plus the usage
/// tracker. All emission paths go through [`FlowController::send_byte`], so
/// the no-overrun contract holds regardless of operation.
pub struct Printer<L: ByteLink, C: Clock> {
    flow: FlowController<L, C>,
    usage: UsageTracker,
    config: PrinterConfig,
}

impl<L: ByteLink, C: Clock> Printer<L, C> {
    pub fn new(
        link: L,
        clock: C,
        mode: FlowMode,
        store: Box<dyn UsageStore>,
        config: PrinterConfig,
    ) -> Self {
        Self {
            flow: FlowController::new(link, clock, mode),
            usage: UsageTracker::new(store),
            config,
        }
    }

    /// Startup sequence: drain stale RX bytes, wake the mechanism, apply
    /// heat configuration and defaults, restore persisted usage counters.
    pub fn init(&mut self) -> Result<(), BrasaError> {
        self.drain_rx();
        self.wake()?;
        self.set_default()?;
        self.usage.restore()?;
        self.usage.validate_calibration();
        info!(
            printer = self.config.name,
            hardware_flow = self.flow.is_hardware(),
            "printer initialized"
        );
        Ok(())
    }

    /// Discard any unread bytes from the link.
    pub fn drain_rx(&mut self) {
        let link = self.flow.link_mut();
        while link.available() {
            link.recv();
        }
    }

    // ========================================================================
    // POWER AND DEFAULTS
    // ========================================================================

    /// Wake from sleep; the head needs up to 3 s and loses its heat
    /// configuration, so it is re-sent.
    pub fn wake(&mut self) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::wake())?;
        self.flow.wait_for_operation(WAKE_SETTLE_MS);
        self.set_heat_config(
            self.config.heat_dots,
            self.config.heat_time,
            self.config.heat_interval,
        )
    }

    pub fn sleep(&mut self) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::sleep())
    }

    /// Full reset (`ESC @`), allowing up to 5 s to settle.
    pub fn reset(&mut self) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::reset())?;
        self.flow.wait_for_operation(RESET_SETTLE_MS);
        Ok(())
    }

    /// Restore the documented defaults: online, left-aligned, styles off,
    /// small size, configured line height.
    pub fn set_default(&mut self) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::set_online(true))?;
        self.flow.send_all(&commands::justify(Align::Left))?;
        self.flow.send_all(&commands::inverse(false))?;
        self.flow.send_all(&commands::bold(false))?;
        self.flow.send_all(&commands::underline(false))?;
        self.flow.send_all(&commands::size(TextSize::Small))?;
        self.flow
            .send_all(&commands::line_height(self.config.line_height_dots))
    }

    pub fn set_heat_config(&mut self, dots: u8, time: u8, interval: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::heat_config(dots, time, interval))
    }

    /// Heat configuration plus print density (`DC2 #`).
    pub fn set_heat_config_advanced(
        &mut self,
        dots: u8,
        time: u8,
        interval: u8,
        density: u8,
    ) -> Result<(), BrasaError> {
        self.flow
            .send_all(&commands::heat_config(dots & 0x0F, time, interval))?;
        self.flow.send_all(&commands::heat_density(density))
    }

    /// Drain buffers, reset, wake, reapply heat and defaults.
    pub fn recover_from_error(&mut self) -> Result<(), BrasaError> {
        info!("attempting printer recovery");
        self.drain_rx();
        self.reset()?;
        self.wake()?;
        self.set_default()?;
        info!("printer recovery completed");
        Ok(())
    }

    // ========================================================================
    // STYLE
    // ========================================================================

    pub fn bold(&mut self, on: bool) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::bold(on))
    }

    pub fn underline(&mut self, on: bool) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::underline(on))
    }

    pub fn inverse(&mut self, on: bool) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::inverse(on))
    }

    pub fn set_size(&mut self, size: TextSize) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::size(size))
    }

    pub fn set_double_height(&mut self, on: bool) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::double_height(on))
    }

    pub fn set_double_width(&mut self, on: bool) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::double_width(on))
    }

    pub fn justify(&mut self, align: Align) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::justify(align))
    }

    pub fn set_line_height(&mut self, height: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::line_height(height))
    }

    pub fn set_barcode_height(&mut self, height: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::barcode_height(height))
    }

    pub fn set_charset(&mut self, n: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::charset(n))
    }

    pub fn set_code_page(&mut self, n: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::code_page(n))
    }

    /// Set glyph rotation (90-degree steps) and let the mode change settle.
    pub fn set_rotation(&mut self, steps: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::rotation(steps))?;
        self.flow.wait_for_operation(ROTATION_SETTLE_MS);
        Ok(())
    }

    // ========================================================================
    // PAPER MOVEMENT
    // ========================================================================

    /// Feed `lines` full lines and wait out the mechanism
    /// (`lines * 100 + 1000` ms expected).
    pub fn feed(&mut self, lines: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::feed(lines))?;
        self.flow
            .wait_for_operation(u64::from(lines) * 100 + 1000);
        self.usage.track(0, 0, u32::from(lines));
        Ok(())
    }

    /// Micro-feed `rows` dot rows.
    pub fn feed_rows(&mut self, rows: u8) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::feed_rows(rows))?;
        self.usage.track(0, 0, u32::from(rows));
        Ok(())
    }

    // ========================================================================
    // TEXT
    // ========================================================================

    /// Emit raw text. Counts the bytes issued and any embedded newlines.
    pub fn print_text(&mut self, text: &str) -> Result<(), BrasaError> {
        if text.is_empty() {
            return Ok(());
        }
        self.flow.send_all(text.as_bytes())?;
        let newlines = text.bytes().filter(|&b| b == b'\n').count() as u32;
        self.usage.track(text.len() as u32, newlines, 0);
        Ok(())
    }

    /// Emit text followed by a line feed.
    pub fn print_line(&mut self, text: &str) -> Result<(), BrasaError> {
        self.print_text(text)?;
        self.flow.send_byte(commands::LF)?;
        self.usage.track(1, 1, 0);
        Ok(())
    }

    /// Styled text: size, alignment, bold applied, then defaults restored
    /// (left align, small size).
    pub fn print_styled(
        &mut self,
        text: &str,
        size: TextSize,
        align: Align,
        bold: bool,
    ) -> Result<(), BrasaError> {
        self.set_size(size)?;
        self.justify(align)?;
        self.bold(bold)?;
        self.print_text(text)?;
        self.bold(false)?;
        self.justify(Align::Left)?;
        self.set_size(TextSize::Small)?;
        Ok(())
    }

    /// Centered divider line followed by one feed.
    pub fn print_separator(&mut self) -> Result<(), BrasaError> {
        let line = "=".repeat(self.config.columns as usize);
        self.justify(Align::Center)?;
        self.print_line(&line)?;
        self.justify(Align::Left)?;
        self.feed(1)
    }

    /// Two-column line(s): left text, filler, right text, summing to the
    /// size's line width. Long or multi-line inputs are split into
    /// width-bounded, newline-respecting chunks and emitted pairwise.
    pub fn print_two_column(
        &mut self,
        left: &str,
        right: &str,
        dotted: bool,
        size: TextSize,
    ) -> Result<(), BrasaError> {
        let width = size.columns();
        let fill = if dotted { '.' } else { ' ' };
        self.set_size(size)?;

        let left_chunks = chunk_text(left, width - 1);
        let right_chunks = chunk_text(right, width - 1);
        let rows = left_chunks.len().max(right_chunks.len()).max(1);
        for i in 0..rows {
            let l = left_chunks.get(i).map(String::as_str).unwrap_or("");
            let r = right_chunks.get(i).map(String::as_str).unwrap_or("");
            self.print_padded_line(l, r, width, fill)?;
        }

        self.set_size(TextSize::Small)
    }

    /// One padded line: left text, at least one filler character, right
    /// text, newline.
    fn print_padded_line(
        &mut self,
        left: &str,
        right: &str,
        width: usize,
        fill: char,
    ) -> Result<(), BrasaError> {
        let line = pad_line(left, right, width, fill);
        self.print_line(&line)
    }

    /// Table row. Two columns use the padded-line path (space filler at the
    /// full 32-column width); three columns are fixed 10-character fields
    /// separated by single spaces.
    pub fn print_table_row(
        &mut self,
        col1: &str,
        col2: &str,
        col3: Option<&str>,
    ) -> Result<(), BrasaError> {
        match col3 {
            None => self.print_padded_line(col1, col2, self.config.columns as usize, ' '),
            Some(col3) => {
                let line = format!("{:<10.10} {:<10.10} {:<10.10}", col1, col2, col3);
                self.print_line(&line)
            }
        }
    }

    // ========================================================================
    // BARCODES
    // ========================================================================

    /// 1-D barcode: prologue, payload, NUL terminator, then a settle wait.
    /// Tracks the payload length and the ~3 lines of paper a barcode uses.
    pub fn print_barcode(&mut self, symbology: Symbology, data: &str) -> Result<(), BrasaError> {
        self.flow.send_all(&barcode::encode(symbology, data.as_bytes()))?;
        self.flow.wait_for_operation(BARCODE_SETTLE_MS);
        self.usage.track(data.len() as u32, 3, 0);
        Ok(())
    }

    /// QR code: the four-stage `GS ( k` dialogue with per-stage settle
    /// waits, then two feed lines.
    ///
    /// Payloads over 2048 bytes are rejected before any byte is sent and
    /// leave the usage counters untouched. Empty payloads are a no-op.
    pub fn print_qr_code(
        &mut self,
        data: &str,
        module_size: u8,
        error_correction: u8,
    ) -> Result<(), BrasaError> {
        if data.is_empty() {
            warn!("empty QR payload, nothing to print");
            return Ok(());
        }
        if data.len() > qr::MAX_DATA_LEN {
            warn!(len = data.len(), max = qr::MAX_DATA_LEN, "QR payload too long");
            return Ok(());
        }

        self.flow.send_all(&qr::set_module_size(module_size))?;
        self.flow.wait_for_operation(QR_CONFIG_SETTLE_MS);

        self.flow.send_all(&qr::set_error_correction(error_correction))?;
        self.flow.wait_for_operation(QR_CONFIG_SETTLE_MS);

        self.flow.send_all(&qr::store_data(data.as_bytes()))?;
        self.flow.wait_for_operation(QR_STORE_SETTLE_MS);

        self.flow.send_all(&qr::print())?;
        self.flow.wait_for_operation(QR_PRINT_SETTLE_MS);

        // A printed QR occupies roughly 8 text lines of paper.
        self.usage.track(data.len() as u32, 8, 0);
        self.feed(2)
    }

    // ========================================================================
    // ROTATED TEXT
    // ========================================================================

    /// 90-degree rotated text, emitted one glyph at a time.
    ///
    /// Buffering multiple rotated glyphs reliably overruns the mechanism,
    /// so this path is uniquely serialized: each glyph is followed by a
    /// feed and a settle wait. Forces small size and centered alignment;
    /// caps at [`MAX_ROTATED_CHARS`] characters. Spaces render as a middle
    /// dot placeholder; a newline forces an extra feed.
    pub fn print_rotated_text(&mut self, text: &str, rotation: u8) -> Result<(), BrasaError> {
        if text.is_empty() {
            return Ok(());
        }

        self.set_size(TextSize::Small)?;
        self.justify(Align::Center)?;
        self.set_rotation(rotation)?;

        for ch in text.chars().take(MAX_ROTATED_CHARS) {
            match ch {
                ' ' => {
                    self.print_text(ROTATED_SPACE_GLYPH)?;
                    self.feed(1)?;
                }
                '\n' => {
                    self.feed(1)?;
                }
                _ => {
                    let mut buf = [0u8; 4];
                    self.print_text(ch.encode_utf8(&mut buf))?;
                    self.feed(2)?;
                    self.flow.wait_for_operation(ROTATED_CHAR_SETTLE_MS);
                }
            }
        }

        self.set_rotation(0)?;
        self.justify(Align::Left)?;
        self.set_size(TextSize::Small)?;
        self.feed(3)
    }

    // ========================================================================
    // STATUS AND ADMISSION CHECKS
    // ========================================================================

    /// Query paper presence. A printer that does not answer within the wait
    /// window is assumed to have paper (many clones lack the sensor) so the
    /// queue stays live; use [`Self::paper_status`] to surface silence as an
    /// error instead.
    pub fn has_paper(&mut self) -> bool {
        match self.paper_status() {
            Ok(present) => present,
            Err(_) => true,
        }
    }

    /// Query paper presence, treating a missing response as
    /// [`BrasaError::Communication`].
    pub fn paper_status(&mut self) -> Result<bool, BrasaError> {
        self.flow.send_all(&commands::paper_status_query())?;
        self.flow.wait_for_operation(PAPER_QUERY_SETTLE_MS);

        let link = self.flow.link_mut();
        if link.available() {
            let status = link.recv().unwrap_or(0);
            Ok(commands::paper_present(status))
        } else {
            Err(BrasaError::Communication(
                "no response to paper status query".to_string(),
            ))
        }
    }

    /// Point-in-time status snapshot.
    pub fn detailed_status(&mut self) -> PrinterStatus {
        PrinterStatus {
            paper_present: self.has_paper(),
            flow_timeouts: self.flow.timeout_count(),
            bytes_sent: self.flow.bytes_sent(),
        }
    }

    /// Print with admission checks: paper present and enough roll left for
    /// the estimated line count.
    pub fn safe_print_text(&mut self, text: &str) -> Result<(), BrasaError> {
        if text.is_empty() {
            return Ok(());
        }
        if !self.has_paper() {
            return Err(BrasaError::PaperOut);
        }

        let estimated = UsageTracker::estimate_lines(text);
        if !self.usage.can_fit(estimated) {
            return Err(BrasaError::InsufficientPaper {
                needed_mm: estimated as f32 * self.usage.line_height_mm(),
                remaining_mm: self.usage.remaining_mm(),
            });
        }

        self.print_text(text)?;
        debug!(lines = estimated, "safe print completed");
        Ok(())
    }

    /// Firmware self-test page (~10 lines of paper).
    pub fn test_page(&mut self) -> Result<(), BrasaError> {
        self.flow.send_all(&commands::test_page())?;
        self.usage.track(0, 10, 0);
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn usage_mut(&mut self) -> &mut UsageTracker {
        &mut self.usage
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn flow_timeouts(&self) -> u32 {
        self.flow.timeout_count()
    }

    /// Current time from the driver's clock, for scheduler gates.
    pub fn now_millis(&self) -> u64 {
        self.flow.clock().now_millis()
    }

    /// Pause on the driver's clock (bounded waits only).
    pub fn pause_millis(&self, ms: u64) {
        self.flow.clock().sleep_millis(ms);
    }

    /// Direct link access, for tests and status plumbing.
    pub fn link_mut(&mut self) -> &mut L {
        self.flow.link_mut()
    }
}

/// Build one padded line: `left`, at least one `fill` character, `right`,
/// summing to `width` characters when the texts fit.
///
/// ```
/// use brasa::printer::pad_line;
///
/// let line = pad_line("TOTAL:", "$12.00", 32, '.');
/// assert_eq!(line.len(), 32);
/// assert!(line.starts_with("TOTAL:"));
/// assert!(line.ends_with("$12.00"));
/// ```
pub fn pad_line(left: &str, right: &str, width: usize, fill: char) -> String {
    let used = left.chars().count() + right.chars().count();
    let padding = width.saturating_sub(used).max(1);
    let mut line = String::with_capacity(width.max(used + 1));
    line.push_str(left);
    for _ in 0..padding {
        line.push(fill);
    }
    line.push_str(right);
    line
}

/// Split `text` into chunks of at most `max` characters, respecting
/// embedded newlines. Empty input yields one empty chunk.
fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut out = Vec::new();
    for segment in text.split('\n') {
        if segment.is_empty() {
            out.push(String::new());
            continue;
        }
        let chars: Vec<char> = segment.chars().collect();
        for piece in chars.chunks(max) {
            out.push(piece.iter().collect());
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
