//! # Flow Control
//!
//! Gates every outgoing byte so the printer's small internal buffer is never
//! overrun. Two strategies share one interface, selected at construction:
//!
//! - **Hardware**: the printer's ready line (DTR-style, active low) is
//!   authoritative. Before each byte we poll it at 1 ms intervals, bounded at
//!   5 seconds. A timeout is counted and logged but never fatal — the byte is
//!   still written, accepting possible loss on a wedged printer rather than
//!   hanging the host.
//! - **Software**: a best-effort timing model computed from the link's baud
//!   rate and the vendor's published mechanical constants. After each byte a
//!   `resume_at` deadline is armed; the next byte waits for it.
//!
//! ## Timing Model
//!
//! ```text
//! byte_time_us     = 10 * 1_000_000 / baud   (8N1: 10 bit times per byte)
//! dot_print_time   = 33 us                   (one heated dot row)
//! dot_feed_time    = 333 us                  (one blank dot row)
//! ```
//!
//! After a byte: arm `byte_time / 4` (hardware, safety margin) or
//! `byte_time * 2` (software, conservative). A newline byte triggers a
//! physical line feed, so it arms a feed-sized window instead:
//! `dot_feed_time * 8` (hardware) or `* 16` (software).
//!
//! Operations with known mechanical latency (feed, barcode, QR, reset) call
//! [`FlowController::wait_for_operation`] — hardware mode waits on the ready
//! line up to the expected time; software mode sleeps a tenth of it as a
//! cheaper approximation.
//!
//! All pauses are bounded polls routed through [`crate::clock::Clock`].

use tracing::warn;

use crate::clock::Clock;
use crate::error::BrasaError;
use crate::transport::ByteLink;

/// Time to clock one dot row of heated dots (vendor constant, microseconds)
pub const DOT_PRINT_TIME_US: u64 = 33;

/// Time to feed one blank dot row (vendor constant, microseconds)
pub const DOT_FEED_TIME_US: u64 = 333;

/// Ready-line poll interval (hardware mode)
const READY_POLL_MS: u64 = 1;

/// Upper bound on any single ready-line wait (hardware mode)
const READY_TIMEOUT_MS: u64 = 5000;

/// Software-mode busy-wait poll interval
const RESUME_POLL_US: u64 = 10;

/// Printer ready-line input (hardware flow control).
///
/// Active-low convention: `read()` returns **true while the printer is NOT
/// ready** (line high), matching the raw electrical level.
pub trait ReadySignal {
    fn read(&self) -> bool;
}

/// Flow-control strategy, fixed at construction.
pub enum FlowMode {
    /// Poll a wired ready line before each byte.
    Hardware(Box<dyn ReadySignal>),
    /// Compute resume deadlines from the timing model.
    Software,
}

/// # Flow Controller
///
/// Owns the byte link and decides when the next byte may be sent. Callers
/// are oblivious to the mode: both variants honor the same contract (no
/// buffer overrun, bounded waits).
pub struct FlowController<L: ByteLink, C: Clock> {
    link: L,
    clock: C,
    mode: FlowMode,
    byte_time_us: u64,
    /// Earliest timestamp the next byte may be sent (software mode).
    resume_at_us: u64,
    /// Cumulative ready-wait timeouts. Observability only, never fatal.
    timeout_count: u32,
    bytes_sent: u64,
}

impl<L: ByteLink, C: Clock> FlowController<L, C> {
    /// Create a controller; per-byte time is derived from the link's baud
    /// rate (10 bit times per byte at 8N1).
    pub fn new(link: L, clock: C, mode: FlowMode) -> Self {
        let byte_time_us = 10 * 1_000_000 / u64::from(link.baud_rate());
        Self {
            link,
            clock,
            mode,
            byte_time_us,
            resume_at_us: 0,
            timeout_count: 0,
            bytes_sent: 0,
        }
    }

    /// True if a hardware ready line is wired.
    pub fn is_hardware(&self) -> bool {
        matches!(self.mode, FlowMode::Hardware(_))
    }

    /// Microseconds to transmit one byte at the configured baud rate.
    pub fn byte_time_us(&self) -> u64 {
        self.byte_time_us
    }

    /// Cumulative ready-wait timeouts (hardware mode).
    pub fn timeout_count(&self) -> u32 {
        self.timeout_count
    }

    /// Total bytes written through this controller.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Next allowed send timestamp in microseconds (software mode).
    pub fn resume_at_us(&self) -> u64 {
        self.resume_at_us
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Direct link access, used for status-query responses.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Block (bounded) until the next byte may be sent.
    ///
    /// Hardware mode: poll the ready line every 1 ms, up to 5000 ms; on
    /// expiry increment `timeout_count` and return anyway. Software mode:
    /// sleep until `resume_at` has passed.
    pub fn wait_until_ready(&mut self) {
        match &self.mode {
            FlowMode::Hardware(signal) => {
                let start = self.clock.now_millis();
                while signal.read() {
                    if self.clock.now_millis() - start > READY_TIMEOUT_MS {
                        self.timeout_count += 1;
                        warn!(timeout_ms = READY_TIMEOUT_MS, "ready-line timeout");
                        break;
                    }
                    self.clock.sleep_millis(READY_POLL_MS);
                }
            }
            FlowMode::Software => {
                while self.clock.now_micros() < self.resume_at_us {
                    self.clock.sleep_micros(RESUME_POLL_US);
                }
            }
        }
    }

    /// Arm the next resume deadline `delay_us` from now.
    fn arm(&mut self, delay_us: u64) {
        self.resume_at_us = self.clock.now_micros() + delay_us;
    }

    /// Send one byte, gated by flow control, then arm the next window.
    ///
    /// A newline arms a feed-sized window instead of a byte-sized one: the
    /// mechanism performs a physical line feed on `\n`.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), BrasaError> {
        self.wait_until_ready();
        self.link.send(byte)?;
        self.bytes_sent += 1;

        if self.is_hardware() {
            self.arm(self.byte_time_us / 4);
        } else {
            self.arm(self.byte_time_us * 2);
        }

        if byte == b'\n' {
            if self.is_hardware() {
                self.arm(DOT_FEED_TIME_US * 8);
            } else {
                self.arm(DOT_FEED_TIME_US * 16);
            }
        }

        Ok(())
    }

    /// Send a run of bytes through [`Self::send_byte`].
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), BrasaError> {
        for &b in bytes {
            self.send_byte(b)?;
        }
        Ok(())
    }

    /// Wait out an operation with known mechanical latency.
    ///
    /// Hardware mode waits on the ready line up to `expected_ms` (counting a
    /// timeout on expiry). Software mode sleeps `expected_ms / 10` as a
    /// cheaper approximation — the timing model has already paced the
    /// command bytes themselves.
    pub fn wait_for_operation(&mut self, expected_ms: u64) {
        match &self.mode {
            FlowMode::Hardware(signal) => {
                let start = self.clock.now_millis();
                while signal.read() {
                    if self.clock.now_millis() - start > expected_ms {
                        self.timeout_count += 1;
                        break;
                    }
                    self.clock.sleep_millis(READY_POLL_MS);
                }
            }
            FlowMode::Software => {
                self.clock.sleep_millis(expected_ms / 10);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::transport::MockLink;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Test double for the ready line; `true` = busy (active-low raw level).
    struct FakeSignal(Rc<Cell<bool>>);

    impl ReadySignal for FakeSignal {
        fn read(&self) -> bool {
            self.0.get()
        }
    }

    fn software_controller() -> FlowController<MockLink, FakeClock> {
        FlowController::new(MockLink::new(19200), FakeClock::new(), FlowMode::Software)
    }

    #[test]
    fn test_byte_time_at_19200() {
        let flow = software_controller();
        assert_eq!(flow.byte_time_us(), 520);
    }

    #[test]
    fn test_byte_time_at_9600() {
        let flow =
            FlowController::new(MockLink::new(9600), FakeClock::new(), FlowMode::Software);
        assert_eq!(flow.byte_time_us(), 1041);
    }

    #[test]
    fn test_software_send_arms_double_byte_time() {
        let mut flow = software_controller();
        flow.send_byte(b'A').unwrap();
        // resume_at = now + byte_time * 2 = 0 + 1040
        assert_eq!(flow.resume_at_us(), 1040);
        assert_eq!(flow.bytes_sent(), 1);
    }

    #[test]
    fn test_software_newline_arms_feed_window() {
        let mut flow = software_controller();
        flow.send_byte(b'\n').unwrap();
        // dot_feed * 16 = 5328, armed after the byte window
        assert_eq!(flow.resume_at_us(), DOT_FEED_TIME_US * 16);
    }

    #[test]
    fn test_software_second_byte_waits_for_resume() {
        let mut flow = software_controller();
        flow.send_byte(b'A').unwrap();
        flow.send_byte(b'B').unwrap();
        // The second send slept until resume (1040), then armed 1040 more.
        assert!(flow.clock().now_micros() >= 1040);
        assert_eq!(flow.resume_at_us(), flow.clock().now_micros() + 1040);
    }

    #[test]
    fn test_hardware_send_arms_quarter_byte_time() {
        let busy = Rc::new(Cell::new(false));
        let mode = FlowMode::Hardware(Box::new(FakeSignal(busy)));
        let mut flow = FlowController::new(MockLink::new(19200), FakeClock::new(), mode);
        flow.send_byte(b'A').unwrap();
        assert_eq!(flow.resume_at_us(), 520 / 4);
    }

    #[test]
    fn test_hardware_timeout_counts_and_proceeds() {
        let busy = Rc::new(Cell::new(true)); // wedged printer, never ready
        let mode = FlowMode::Hardware(Box::new(FakeSignal(busy)));
        let mut flow = FlowController::new(MockLink::new(19200), FakeClock::new(), mode);

        flow.send_byte(b'A').unwrap();

        // Byte was still written (best effort), timeout recorded.
        assert_eq!(flow.timeout_count(), 1);
        assert_eq!(flow.link_mut().sent(), &[b'A']);
        assert!(flow.clock().now_millis() > 5000);
    }

    #[test]
    fn test_hardware_ready_line_released() {
        let busy = Rc::new(Cell::new(false));
        let mode = FlowMode::Hardware(Box::new(FakeSignal(Rc::clone(&busy))));
        let mut flow = FlowController::new(MockLink::new(19200), FakeClock::new(), mode);

        flow.send_byte(b'A').unwrap();
        assert_eq!(flow.timeout_count(), 0);
    }

    #[test]
    fn test_wait_for_operation_software_sleeps_tenth() {
        let mut flow = software_controller();
        flow.wait_for_operation(5000);
        assert_eq!(flow.clock().now_millis(), 500);
    }

    #[test]
    fn test_send_all() {
        let mut flow = software_controller();
        flow.send_all(&[0x1B, 0x40]).unwrap();
        assert_eq!(flow.link_mut().sent(), &[0x1B, 0x40]);
        assert_eq!(flow.bytes_sent(), 2);
    }
}
