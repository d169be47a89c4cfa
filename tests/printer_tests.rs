//! # Driver Emission Tests
//!
//! Byte-exact checks of every emission path, captured through `MockLink`
//! with virtual time. Expected sequences are built from the same protocol
//! builders the driver uses, so a command-byte change fails loudly in one
//! place.

use pretty_assertions::assert_eq;

use brasa::clock::FakeClock;
use brasa::flow::FlowMode;
use brasa::printer::{MAX_ROTATED_CHARS, Printer, PrinterConfig, pad_line};
use brasa::protocol::barcode::{self, Symbology, qr};
use brasa::protocol::commands::{self, Align, TextSize};
use brasa::transport::MockLink;
use brasa::usage::MemoryStore;

fn printer() -> Printer<MockLink, FakeClock> {
    Printer::new(
        MockLink::new(19200),
        FakeClock::new(),
        FlowMode::Software,
        Box::new(MemoryStore::new()),
        PrinterConfig::CSN_A2,
    )
}

// ============================================================================
// TEXT
// ============================================================================

#[test]
fn styled_text_applies_and_restores_formatting() {
    let mut p = printer();
    p.print_styled("Hi", TextSize::Medium, Align::Center, true)
        .unwrap();

    let mut expected = Vec::new();
    expected.extend(commands::size(TextSize::Medium));
    expected.extend(commands::justify(Align::Center));
    expected.extend(commands::bold(true));
    expected.extend(b"Hi");
    expected.extend(commands::bold(false));
    expected.extend(commands::justify(Align::Left));
    expected.extend(commands::size(TextSize::Small));

    assert_eq!(p.link_mut().sent(), &expected[..]);
}

#[test]
fn print_text_counts_chars_and_newlines() {
    let mut p = printer();
    p.print_text("abc\ndef\n").unwrap();
    assert_eq!(p.usage().characters_printed(), 8);
    assert_eq!(p.usage().lines_printed(), 2);
    assert_eq!(p.usage().feeds_executed(), 0);
}

#[test]
fn empty_text_emits_nothing() {
    let mut p = printer();
    p.print_text("").unwrap();
    assert!(p.link_mut().sent().is_empty());
    assert_eq!(p.usage().characters_printed(), 0);
}

#[test]
fn separator_is_centered_divider_plus_feed() {
    let mut p = printer();
    p.print_separator().unwrap();

    let mut expected = Vec::new();
    expected.extend(commands::justify(Align::Center));
    expected.extend("=".repeat(32).as_bytes());
    expected.push(b'\n');
    expected.extend(commands::justify(Align::Left));
    expected.extend(commands::feed(1));

    assert_eq!(p.link_mut().sent(), &expected[..]);
    assert_eq!(p.usage().feeds_executed(), 1);
}

// ============================================================================
// TWO-COLUMN AND TABLE LAYOUT
// ============================================================================

#[test]
fn two_column_dotted_line_is_exact() {
    let mut p = printer();
    p.print_two_column("TOTAL:", "$12.00", true, TextSize::Small)
        .unwrap();

    let mut expected = Vec::new();
    expected.extend(commands::size(TextSize::Small));
    expected.extend(b"TOTAL:");
    expected.extend(".".repeat(20).as_bytes()); // 32 - 6 - 6
    expected.extend(b"$12.00");
    expected.push(b'\n');
    expected.extend(commands::size(TextSize::Small));

    assert_eq!(p.link_mut().sent(), &expected[..]);
    // 32 printable chars + newline, one line
    assert_eq!(p.usage().characters_printed(), 33);
    assert_eq!(p.usage().lines_printed(), 1);
}

#[test]
fn two_column_large_size_uses_sixteen_columns() {
    let mut p = printer();
    p.print_two_column("AB", "CD", false, TextSize::Large).unwrap();

    let sent = p.link_mut().sent().to_vec();
    let line_start = commands::size(TextSize::Large).len();
    let line: &[u8] = &sent[line_start..line_start + 17];
    assert_eq!(line, b"AB            CD\n");
}

#[test]
fn two_column_splits_multiline_input() {
    let mut p = printer();
    p.print_two_column("a\nb", "1", false, TextSize::Small).unwrap();

    let sent = String::from_utf8_lossy(p.link_mut().sent().to_vec().as_slice()).to_string();
    // Two padded rows: first pairs "a"/"1", second pairs "b"/"".
    assert!(sent.contains(&format!("{}\n", pad_line("a", "1", 32, ' '))));
    assert!(sent.contains(&format!("{}\n", pad_line("b", "", 32, ' '))));
}

#[test]
fn table_row_three_columns_fixed_width() {
    let mut p = printer();
    p.print_table_row("Item", "QtyIsVeryLongIndeed", Some("Price"))
        .unwrap();

    let sent = p.link_mut().sent();
    assert_eq!(sent, b"Item       QtyIsVeryL Price     \n");
    assert_eq!(p.usage().characters_printed(), 33);
}

#[test]
fn table_row_two_columns_uses_space_padding() {
    let mut p = printer();
    p.print_table_row("Item", "Price", None).unwrap();

    let expected = format!("{}\n", pad_line("Item", "Price", 32, ' '));
    assert_eq!(p.link_mut().sent(), expected.as_bytes());
}

// ============================================================================
// BARCODES
// ============================================================================

#[test]
fn barcode_prologue_payload_terminator() {
    let mut p = printer();
    p.print_barcode(Symbology::Code39, "A123").unwrap();

    let expected = barcode::encode(Symbology::Code39, b"A123");
    assert_eq!(p.link_mut().sent(), &expected[..]);
    assert_eq!(p.usage().characters_printed(), 4);
    assert_eq!(p.usage().lines_printed(), 3);
}

#[test]
fn qr_code_emits_four_stages_then_feed() {
    let mut p = printer();
    p.print_qr_code("HELLO", 3, 1).unwrap();

    let mut expected = Vec::new();
    expected.extend(qr::set_module_size(3));
    expected.extend(qr::set_error_correction(1));
    expected.extend(qr::store_data(b"HELLO"));
    expected.extend(qr::print());
    expected.extend(commands::feed(2));

    assert_eq!(p.link_mut().sent(), &expected[..]);
    assert_eq!(p.usage().characters_printed(), 5);
    assert_eq!(p.usage().lines_printed(), 8);
    assert_eq!(p.usage().feeds_executed(), 2);
}

#[test]
fn oversized_qr_payload_sends_nothing() {
    let mut p = printer();
    let data = "x".repeat(qr::MAX_DATA_LEN + 1);
    p.print_qr_code(&data, 3, 1).unwrap();

    assert!(p.link_mut().sent().is_empty());
    assert_eq!(p.usage().characters_printed(), 0);
    assert_eq!(p.usage().lines_printed(), 0);
    assert_eq!(p.usage().feeds_executed(), 0);
}

#[test]
fn qr_payload_at_cap_is_accepted() {
    let mut p = printer();
    let data = "x".repeat(qr::MAX_DATA_LEN);
    p.print_qr_code(&data, 3, 1).unwrap();
    assert!(!p.link_mut().sent().is_empty());
}

// ============================================================================
// ROTATED TEXT
// ============================================================================

#[test]
fn rotated_text_enables_and_disables_rotation() {
    let mut p = printer();
    p.print_rotated_text("AB", 1).unwrap();

    let sent = p.link_mut().sent().to_vec();
    let on = commands::rotation(1);
    let off = commands::rotation(0);
    let on_pos = sent
        .windows(on.len())
        .position(|w| w == &on[..])
        .expect("rotation on");
    let off_pos = sent
        .windows(off.len())
        .rposition(|w| w == &off[..])
        .expect("rotation off");
    assert!(on_pos < off_pos);
}

#[test]
fn rotated_text_caps_at_twenty_chars() {
    let mut p = printer();
    p.print_rotated_text(&"x".repeat(25), 1).unwrap();

    let printed = p.link_mut().sent().iter().filter(|&&b| b == b'x').count();
    assert_eq!(printed, MAX_ROTATED_CHARS);
    // Counters reflect what was issued, not what was requested.
    assert_eq!(p.usage().characters_printed(), MAX_ROTATED_CHARS as u32);
}

#[test]
fn rotated_space_renders_placeholder_glyph() {
    let mut p = printer();
    p.print_rotated_text("a b", 1).unwrap();

    let sent = p.link_mut().sent().to_vec();
    let glyph = "\u{00B7}".as_bytes();
    assert!(sent.windows(glyph.len()).any(|w| w == glyph));
    assert!(!sent.contains(&b' '));
}

#[test]
fn rotated_text_feeds_per_glyph() {
    let mut p = printer();
    // Two glyphs: feed(2) each, plus trailing feed(3).
    p.print_rotated_text("ab", 1).unwrap();
    assert_eq!(p.usage().feeds_executed(), 2 + 2 + 3);
}

// ============================================================================
// PAPER STATUS
// ============================================================================

#[test]
fn paper_status_parses_response_bits() {
    let mut p = printer();
    p.link_mut().push_response(0x00);
    assert!(p.has_paper());

    p.link_mut().push_response(0x04);
    assert!(!p.has_paper());

    p.link_mut().push_response(0x0C);
    assert!(!p.has_paper());
}

#[test]
fn silent_printer_assumed_to_have_paper() {
    let mut p = printer();
    assert!(p.has_paper());
    // The strict variant surfaces the silence instead.
    assert!(matches!(
        p.paper_status(),
        Err(brasa::BrasaError::Communication(_))
    ));
}

#[test]
fn status_query_bytes() {
    let mut p = printer();
    p.link_mut().push_response(0x00);
    p.has_paper();
    assert_eq!(p.link_mut().sent(), &[0x1B, 0x76, 0x00]);
}

// ============================================================================
// ADMISSION CHECKS
// ============================================================================

#[test]
fn safe_print_rejects_when_roll_exhausted() {
    let mut p = printer();
    p.usage_mut().set_paper_roll_length(8.0); // two lines at 4mm
    p.link_mut().push_response(0x00);

    let err = p.safe_print_text("a\nb\nc\nd").unwrap_err();
    assert!(matches!(err, brasa::BrasaError::InsufficientPaper { .. }));
    // Nothing printed beyond the status query.
    assert_eq!(p.link_mut().sent_len(), 3);
}

#[test]
fn safe_print_rejects_on_paper_out() {
    let mut p = printer();
    p.link_mut().push_response(0x04);
    let err = p.safe_print_text("hello").unwrap_err();
    assert!(matches!(err, brasa::BrasaError::PaperOut));
}

#[test]
fn safe_print_succeeds_with_paper() {
    let mut p = printer();
    p.link_mut().push_response(0x00);
    p.safe_print_text("hello").unwrap();
    assert_eq!(p.usage().characters_printed(), 5);
}

// ============================================================================
// FEEDS AND DEFAULTS
// ============================================================================

#[test]
fn feed_tracks_lines_fed() {
    let mut p = printer();
    p.feed(3).unwrap();
    assert_eq!(p.link_mut().sent(), &commands::feed(3)[..]);
    assert_eq!(p.usage().feeds_executed(), 3);
}

#[test]
fn set_default_restores_documented_state() {
    let mut p = printer();
    p.set_default().unwrap();

    let mut expected = Vec::new();
    expected.extend(commands::set_online(true));
    expected.extend(commands::justify(Align::Left));
    expected.extend(commands::inverse(false));
    expected.extend(commands::bold(false));
    expected.extend(commands::underline(false));
    expected.extend(commands::size(TextSize::Small));
    expected.extend(commands::line_height(32));

    assert_eq!(p.link_mut().sent(), &expected[..]);
}

#[test]
fn double_height_and_width_emit_mode_bytes() {
    let mut p = printer();
    p.set_double_height(true).unwrap();
    p.set_double_width(true).unwrap();
    p.set_double_height(false).unwrap();

    assert_eq!(
        p.link_mut().sent(),
        &[0x1B, 0x21, 0x10, 0x1B, 0x21, 0x20, 0x1B, 0x21, 0x00]
    );
}

#[test]
fn print_line_terminates_with_line_feed() {
    let mut p = printer();
    p.print_line("hi").unwrap();
    assert_eq!(p.link_mut().sent(), b"hi\n");
    assert_eq!(p.usage().characters_printed(), 3);
    assert_eq!(p.usage().lines_printed(), 1);
}

#[test]
fn wake_reapplies_heat_config() {
    let mut p = printer();
    p.wake().unwrap();

    let mut expected = Vec::new();
    expected.extend(commands::wake());
    expected.extend(commands::heat_config(7, 80, 2));
    assert_eq!(p.link_mut().sent(), &expected[..]);
}
