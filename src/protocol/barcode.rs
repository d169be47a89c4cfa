//! # ESC/POS Barcode Commands
//!
//! 1-D barcode sequences and the four-frame QR code dialogue.
//!
//! ## 1-D Barcodes
//!
//! One fixed prologue (label below, module width 3) followed by the
//! symbology selector, the payload, and a NUL terminator:
//!
//! ```text
//! 1D 48 02   GS H 2   label position: below
//! 1D 77 03   GS w 3   module width
//! 1D 6B ty   GS k     symbology
//! <payload> 00
//! ```
//!
//! ## QR Codes (Model 2)
//!
//! QR printing is a four-stage `GS ( k` dialogue; each stage needs its own
//! mechanical settle wait (handled by the driver, not here):
//!
//! 1. [`qr::set_module_size`] — dot size per module
//! 2. [`qr::set_error_correction`] — EC level
//! 3. [`qr::store_data`] — length-prefixed payload into symbol storage
//! 4. [`qr::print`] — render the stored symbol
//!
//! Payloads above [`qr::MAX_DATA_LEN`] bytes must be rejected before any
//! frame is sent; the driver enforces that cap.

use super::commands::GS;

/// 1-D barcode symbologies (`GS k` selector values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code39,
    Itf,
    Codabar,
    Code93,
    Code128,
}

impl Symbology {
    /// The `GS k` type byte.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Symbology::UpcA => 0,
            Symbology::UpcE => 1,
            Symbology::Ean13 => 2,
            Symbology::Ean8 => 3,
            Symbology::Code39 => 4,
            Symbology::Itf => 5,
            Symbology::Codabar => 6,
            Symbology::Code93 => 7,
            Symbology::Code128 => 8,
        }
    }

    /// Map a small-integer symbology code back to a variant.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Symbology::UpcA,
            1 => Symbology::UpcE,
            2 => Symbology::Ean13,
            3 => Symbology::Ean8,
            4 => Symbology::Code39,
            5 => Symbology::Itf,
            6 => Symbology::Codabar,
            7 => Symbology::Code93,
            8 => Symbology::Code128,
            _ => return None,
        })
    }
}

/// # 1-D Barcode Sequence
///
/// Prologue (label position 2, width 3), symbology selector, payload,
/// NUL terminator.
///
/// ```
/// use brasa::protocol::barcode::{encode, Symbology};
///
/// let bytes = encode(Symbology::Code39, b"AB");
/// assert_eq!(
///     bytes,
///     vec![0x1D, 0x48, 0x02, 0x1D, 0x77, 0x03, 0x1D, 0x6B, 4, b'A', b'B', 0x00]
/// );
/// ```
pub fn encode(symbology: Symbology, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + data.len() + 1);
    out.extend([GS, b'H', 2]);
    out.extend([GS, b'w', 3]);
    out.extend([GS, b'k', symbology.code()]);
    out.extend_from_slice(data);
    out.push(0x00);
    out
}

pub mod qr {
    //! QR Model 2 `GS ( k` frames.

    use super::GS;

    /// Maximum payload accepted by the symbol storage area.
    pub const MAX_DATA_LEN: usize = 2048;

    /// # Stage 1: Module Size (GS ( k 4 0 49 65 n 0)
    ///
    /// Dot width of one QR module (typical 3-8).
    #[inline]
    pub fn set_module_size(size: u8) -> Vec<u8> {
        vec![GS, b'(', b'k', 4, 0, 49, 65, size, 0]
    }

    /// # Stage 2: Error Correction (GS ( k 3 0 49 67 n)
    ///
    /// | Level | n | Recovery |
    /// |-------|---|----------|
    /// | L | 0 | 7%  |
    /// | M | 1 | 15% |
    /// | Q | 2 | 25% |
    /// | H | 3 | 30% |
    #[inline]
    pub fn set_error_correction(level: u8) -> Vec<u8> {
        vec![GS, b'(', b'k', 3, 0, 49, 67, level]
    }

    /// # Stage 3: Store Data (GS ( k pL pH 49 80 48 data...)
    ///
    /// Length prefix is `data.len() + 3` little-endian, covering the three
    /// function bytes plus the payload. Callers must enforce
    /// [`MAX_DATA_LEN`] *before* sending any stage.
    pub fn store_data(data: &[u8]) -> Vec<u8> {
        let total_len = (data.len() + 3) as u16;
        let mut out = Vec::with_capacity(8 + data.len());
        out.extend([
            GS,
            b'(',
            b'k',
            (total_len & 0xFF) as u8,
            (total_len >> 8) as u8,
            49,
            80,
            48,
        ]);
        out.extend_from_slice(data);
        out
    }

    /// # Stage 4: Print (GS ( k 3 0 49 81 48)
    ///
    /// Renders the stored symbol. The mechanism may need up to 10 s for a
    /// large, dense code.
    #[inline]
    pub fn print() -> Vec<u8> {
        vec![GS, b'(', b'k', 3, 0, 49, 81, 48]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_codes() {
        assert_eq!(Symbology::UpcA.code(), 0);
        assert_eq!(Symbology::Code39.code(), 4);
        assert_eq!(Symbology::Code128.code(), 8);
    }

    #[test]
    fn test_symbology_round_trip() {
        for code in 0..=8 {
            let sym = Symbology::from_code(code).unwrap();
            assert_eq!(sym.code(), code);
        }
        assert_eq!(Symbology::from_code(9), None);
    }

    #[test]
    fn test_encode_prologue_and_terminator() {
        let bytes = encode(Symbology::Ean13, b"4006381333931");
        // Prologue: GS H 2, GS w 3, GS k type
        assert_eq!(&bytes[..9], &[0x1D, 0x48, 2, 0x1D, 0x77, 3, 0x1D, 0x6B, 2]);
        // Payload then NUL
        assert_eq!(&bytes[9..22], b"4006381333931");
        assert_eq!(*bytes.last().unwrap(), 0x00);
    }

    #[test]
    fn test_qr_module_size_frame() {
        assert_eq!(
            qr::set_module_size(3),
            vec![0x1D, 0x28, 0x6B, 4, 0, 49, 65, 3, 0]
        );
    }

    #[test]
    fn test_qr_error_correction_frame() {
        assert_eq!(
            qr::set_error_correction(1),
            vec![0x1D, 0x28, 0x6B, 3, 0, 49, 67, 1]
        );
    }

    #[test]
    fn test_qr_store_data_length_prefix() {
        let frame = qr::store_data(b"HELLO");
        // 5 bytes + 3 = 8 -> pL=8, pH=0
        assert_eq!(&frame[..8], &[0x1D, 0x28, 0x6B, 8, 0, 49, 80, 48]);
        assert_eq!(&frame[8..], b"HELLO");
    }

    #[test]
    fn test_qr_store_data_length_prefix_two_bytes() {
        let data = vec![b'x'; 300];
        let frame = qr::store_data(&data);
        // 300 + 3 = 303 = 0x012F -> pL=0x2F, pH=0x01
        assert_eq!(frame[3], 0x2F);
        assert_eq!(frame[4], 0x01);
    }

    #[test]
    fn test_qr_print_frame() {
        assert_eq!(qr::print(), vec![0x1D, 0x28, 0x6B, 3, 0, 49, 81, 48]);
    }
}
