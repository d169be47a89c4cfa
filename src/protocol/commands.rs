//! # ESC/POS Control Commands
//!
//! Command builders for CSN-A2-class thermal printers. These printers speak
//! an ESC/POS dialect where commands are short escape sequences; all byte
//! values here are reproduced bit-exactly from the vendor's command set and
//! must not be "cleaned up" — hardware compatibility depends on them.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `WAKE` (0xFF)
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC 7 n1 n2 n3`, `ESC d n`
//!
//! ## Timing
//!
//! Several commands (feed, reset, wake) have mechanical latency far beyond
//! their transmission time. The builders only produce bytes; the settle
//! waits live in [`crate::printer`] which calls
//! [`crate::flow::FlowController::wait_for_operation`] after sending.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
pub const GS: u8 = 0x1D;

/// DC2 (Device Control 2) - Printer test/density prefix
pub const DC2: u8 = 0x12;

/// LF (Line Feed) - Print line buffer and feed one line
pub const LF: u8 = 0x0A;

// ============================================================================
// PARAMETER ENUMS
// ============================================================================

/// Character size class (`ESC !` parameter).
///
/// The size also fixes how many characters fit on one 58mm line, which the
/// two-column layout depends on:
///
/// | Size | `ESC !` byte | Columns |
/// |------|--------------|---------|
/// | Small | 0x00 | 32 |
/// | Medium | 0x10 | 24 |
/// | Large | 0x30 | 16 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl TextSize {
    /// The `ESC !` mode byte for this size.
    #[inline]
    pub const fn mode_byte(self) -> u8 {
        match self {
            TextSize::Small => 0x00,
            TextSize::Medium => 0x10,
            TextSize::Large => 0x30,
        }
    }

    /// Printable characters per line at this size.
    #[inline]
    pub const fn columns(self) -> usize {
        match self {
            TextSize::Small => 32,
            TextSize::Medium => 24,
            TextSize::Large => 16,
        }
    }

    /// Map a small-integer size code (1/2/3+) to a size class.
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 | 1 => TextSize::Small,
            2 => TextSize::Medium,
            _ => TextSize::Large,
        }
    }
}

/// Horizontal alignment (`ESC a` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Align::Left => 0,
            Align::Center => 1,
            Align::Right => 2,
        }
    }

    /// Map a small-integer alignment code (0/1/2) to a variant.
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Align::Left,
            1 => Align::Center,
            _ => Align::Right,
        }
    }
}

// ============================================================================
// POWER AND INITIALIZATION
// ============================================================================

/// # Wake (0xFF)
///
/// Brings the printer out of low-power sleep. Must be followed by a settle
/// wait (~3000 ms on the ready line) and a fresh heat configuration before
/// printing.
///
/// | Format | Bytes |
/// |--------|-------|
/// | Hex    | FF    |
#[inline]
pub fn wake() -> Vec<u8> {
    vec![0xFF]
}

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state: clears the line
/// buffer, disables styles, restores size and alignment. Mechanically slow —
/// allow up to 5000 ms to settle.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC @ |
/// | Hex    | 1B 40 |
#[inline]
pub fn reset() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Sleep (ESC 8 0 0)
///
/// Puts the printer into low-power sleep immediately. Wake with
/// [`wake`] before printing again.
///
/// | Format | Bytes       |
/// |--------|-------------|
/// | Hex    | 1B 38 00 00 |
#[inline]
pub fn sleep() -> Vec<u8> {
    vec![ESC, b'8', 0, 0]
}

/// # Heat Configuration (ESC 7 dots time interval)
///
/// Tunes the thermal head's duty cycle. More heating dots means faster
/// printing but higher peak current; longer heat time means darker print
/// but slower lines.
///
/// | Format | Bytes                        |
/// |--------|------------------------------|
/// | Hex    | 1B 37 \<dots> \<time> \<interval> |
///
/// ## Parameters
///
/// - `dots`: concurrently heated dot groups (units of 8 dots)
/// - `time`: heating time (units of 10 us)
/// - `interval`: heat interval (units of 10 us)
#[inline]
pub fn heat_config(dots: u8, time: u8, interval: u8) -> Vec<u8> {
    vec![ESC, b'7', dots, time, interval]
}

/// # Print Density (DC2 #)
///
/// Companion to [`heat_config`]: packs the density nibble into both halves
/// of the parameter byte.
#[inline]
pub fn heat_density(density: u8) -> Vec<u8> {
    vec![DC2, b'#', (density << 4) | density]
}

/// # Online / Offline (ESC = n)
///
/// While offline the printer ignores everything except the online command.
#[inline]
pub fn set_online(online: bool) -> Vec<u8> {
    vec![ESC, b'=', online as u8]
}

/// # Self-Test Page (DC2 T)
///
/// Prints the firmware's built-in test page (~10 lines of paper).
#[inline]
pub fn test_page() -> Vec<u8> {
    vec![DC2, b'T']
}

// ============================================================================
// TEXT STYLE
// ============================================================================

/// Bold on/off (ESC E n) — hex `1B 45 <1/0>`
#[inline]
pub fn bold(on: bool) -> Vec<u8> {
    vec![ESC, b'E', on as u8]
}

/// Underline on/off (ESC - n) — hex `1B 2D <1/0>`
#[inline]
pub fn underline(on: bool) -> Vec<u8> {
    vec![ESC, b'-', on as u8]
}

/// White-on-black inverse on/off (GS B n) — hex `1D 42 <1/0>`
#[inline]
pub fn inverse(on: bool) -> Vec<u8> {
    vec![GS, b'B', on as u8]
}

/// # Character Size (ESC ! mode)
///
/// | Size | Bytes |
/// |------|-------|
/// | Small  | 1B 21 00 |
/// | Medium | 1B 21 10 |
/// | Large  | 1B 21 30 |
#[inline]
pub fn size(size: TextSize) -> Vec<u8> {
    vec![ESC, b'!', size.mode_byte()]
}

/// Double height only (ESC ! 0x10 / 0x00)
#[inline]
pub fn double_height(on: bool) -> Vec<u8> {
    vec![ESC, b'!', if on { 0x10 } else { 0x00 }]
}

/// Double width only (ESC ! 0x20 / 0x00)
#[inline]
pub fn double_width(on: bool) -> Vec<u8> {
    vec![ESC, b'!', if on { 0x20 } else { 0x00 }]
}

/// # Line Height (ESC 3 n)
///
/// Sets row spacing in dot rows. The head needs at least 24 rows per line;
/// smaller values are clamped.
#[inline]
pub fn line_height(height: u8) -> Vec<u8> {
    vec![ESC, b'3', height.max(24)]
}

/// # Justify (ESC a n)
///
/// | Alignment | Bytes |
/// |-----------|-------|
/// | Left   | 1B 61 00 |
/// | Center | 1B 61 01 |
/// | Right  | 1B 61 02 |
#[inline]
pub fn justify(align: Align) -> Vec<u8> {
    vec![ESC, b'a', align.code()]
}

/// International character set (ESC R n)
#[inline]
pub fn charset(n: u8) -> Vec<u8> {
    vec![ESC, b'R', n]
}

/// Character code page (ESC t n)
#[inline]
pub fn code_page(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

/// # Barcode Height (GS h n)
///
/// Height of subsequent 1-D barcodes in dot rows (minimum 1).
#[inline]
pub fn barcode_height(height: u8) -> Vec<u8> {
    vec![GS, b'h', height.max(1)]
}

/// # Rotation (ESC V n)
///
/// Selects 90-degree rotation steps (0-3); the parameter is masked to two
/// bits. Rotated glyphs print reliably only one at a time — see the driver's
/// rotated-text path.
#[inline]
pub fn rotation(steps: u8) -> Vec<u8> {
    vec![ESC, b'V', steps & 0x03]
}

// ============================================================================
// PAPER MOVEMENT
// ============================================================================

/// # Feed Lines (ESC d n)
///
/// Feeds `n` full text lines. Mechanically slow: allow `n * 100 + 1000` ms.
///
/// | Format | Bytes    |
/// |--------|----------|
/// | Hex    | 1B 64 n  |
#[inline]
pub fn feed(lines: u8) -> Vec<u8> {
    vec![ESC, b'd', lines]
}

/// # Micro Feed (ESC J n)
///
/// Feeds `n` dot rows — finer positioning than [`feed`].
#[inline]
pub fn feed_rows(rows: u8) -> Vec<u8> {
    vec![ESC, b'J', rows]
}

// ============================================================================
// STATUS
// ============================================================================

/// # Paper Status Query (ESC v 0)
///
/// The printer answers with one status byte. Bits 2-3 clear means paper is
/// present; either bit set means out of paper.
///
/// | Format | Bytes    |
/// |--------|----------|
/// | Hex    | 1B 76 00 |
#[inline]
pub fn paper_status_query() -> Vec<u8> {
    vec![ESC, b'v', 0]
}

/// Interpret a paper status response byte: bits 2-3 clear ⇒ paper present.
#[inline]
pub const fn paper_present(status: u8) -> bool {
    status & 0x0C == 0
}

// ============================================================================
// TESTS
// ============================================================================
