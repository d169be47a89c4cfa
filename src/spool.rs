//! # Print Job Queue and Scheduler
//!
//! Decouples job admission from the printer's duty cycle. Callers enqueue
//! high-level [`PrintJob`]s; the host's periodic tick (or an explicit flush)
//! drains them one at a time through the driver.
//!
//! ## Admission
//!
//! The queue is bounded (default 10). Admission never fails: a full queue
//! evicts its *oldest* entry (counted in `jobs_dropped`) before admitting
//! the new one. Order is strict FIFO; the `priority` field is advisory
//! only, reserved for future preemption, and does not reorder the queue.
//!
//! ## Gating
//!
//! A scheduling opportunity executes the head job only when all of these
//! hold:
//!
//! 1. no job is currently executing,
//! 2. the queue is non-empty,
//! 3. at least `print_delay_ms` (default 2000) elapsed since the last job,
//! 4. the printer has paper.
//!
//! When paper is out the head job *stays at the head* — it retries on a
//! later opportunity once paper returns. A warning is emitted at most once
//! per 30 seconds.
//!
//! ## Job Lifecycle
//!
//! `Queued → Executing → Done`, terminal. A dispatch that fails mid-flight
//! is not requeued; the loss is visible only through logs and counters.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::BrasaError;
use crate::printer::Printer;
use crate::protocol::barcode::Symbology;
use crate::protocol::commands::{Align, TextSize};
use crate::transport::ByteLink;

/// Default queue capacity.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10;

/// Default inter-job cool-down.
pub const DEFAULT_PRINT_DELAY_MS: u64 = 2000;

/// Paper-out warnings are throttled to one per this interval.
const PAPER_WARNING_THROTTLE_MS: u64 = 30_000;

/// Paper presence poll interval in `tick()`.
const PAPER_POLL_MS: u64 = 10_000;

/// Default `flush_and_wait` timeout.
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 30_000;

/// Pause between flush iterations.
const FLUSH_PAUSE_MS: u64 = 50;

/// What a job prints. One variant per encoder routine; the scheduler
/// dispatches on the variant in a single match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Body text with size, alignment, and bold applied around it.
    Text {
        content: String,
        size: TextSize,
        align: Align,
        bold: bool,
    },
    /// Left/right columns padded to the size's line width.
    TwoColumn {
        left: String,
        right: String,
        size: TextSize,
        /// Dot filler instead of spaces (receipt "TOTAL....$12" style).
        dotted: bool,
    },
    Barcode {
        data: String,
        symbology: Symbology,
    },
    QrCode {
        data: String,
        module_size: u8,
        error_correction: u8,
    },
    Feed {
        lines: u8,
    },
    Separator,
    /// Two or three columns; header rows print bold.
    TableRow {
        col1: String,
        col2: String,
        col3: Option<String>,
        header: bool,
    },
    RotatedText {
        content: String,
        rotation: u8,
    },
}

/// One logical print request. Immutable once admitted; consumed exactly
/// once by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub kind: JobKind,
    /// Advisory only: FIFO order is never violated (documented
    /// simplification; reserved for future preemption).
    pub priority: u8,
    /// Set at admission, from the scheduler's clock (milliseconds).
    pub enqueued_at: u64,
}

/// Queue statistics for operational visibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueStats {
    pub queued: usize,
    pub processed: u32,
    pub dropped: u32,
    pub average_job_time_ms: f32,
}

/// # Spooler
///
/// Owns the driver and the pending-job queue; enforces one-job-at-a-time
/// serialized execution with duty-cycle gating. Single-threaded cooperative:
/// the host's tick loop and any immediate-print calls share one thread of
/// control, and nothing else may mutate the queue, the busy flag, or the
/// usage counters.
pub struct Spooler<L: ByteLink, C: Clock> {
    printer: Printer<L, C>,
    queue: VecDeque<PrintJob>,
    max_queue_size: usize,
    print_delay_ms: u64,
    auto_process: bool,

    busy: bool,
    last_job_time_ms: u64,
    total_jobs_processed: u32,
    jobs_dropped: u32,
    total_processing_time_ms: u64,

    last_paper_warning_ms: Option<u64>,
    last_paper_check_ms: u64,
    paper_status: bool,
    paper_callback: Option<Box<dyn FnMut(bool)>>,
}

impl<L: ByteLink, C: Clock> Spooler<L, C> {
    pub fn new(printer: Printer<L, C>) -> Self {
        Self {
            printer,
            queue: VecDeque::new(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            print_delay_ms: DEFAULT_PRINT_DELAY_MS,
            auto_process: true,
            busy: false,
            last_job_time_ms: 0,
            total_jobs_processed: 0,
            jobs_dropped: 0,
            total_processing_time_ms: 0,
            last_paper_warning_ms: None,
            last_paper_check_ms: 0,
            paper_status: true,
            paper_callback: None,
        }
    }

    // ========================================================================
    // ADMISSION
    // ========================================================================

    /// Admit a job. Always succeeds: a full queue first evicts its oldest
    /// entry (incrementing the dropped counter), so `len <= max_queue_size`
    /// holds at all times.
    pub fn enqueue(&mut self, kind: JobKind, priority: u8) {
        while self.queue.len() >= self.max_queue_size {
            self.queue.pop_front();
            self.jobs_dropped += 1;
            warn!(
                capacity = self.max_queue_size,
                dropped = self.jobs_dropped,
                "queue full, dropping oldest job"
            );
        }

        let job = PrintJob {
            kind,
            priority,
            enqueued_at: self.printer.now_millis(),
        };
        self.queue.push_back(job);
        info!(queued = self.queue.len(), "print job queued");
    }

    pub fn queue_text(&mut self, text: &str, size: TextSize, align: Align, bold: bool, priority: u8) {
        self.enqueue(
            JobKind::Text {
                content: text.to_string(),
                size,
                align,
                bold,
            },
            priority,
        );
    }

    pub fn queue_two_column(
        &mut self,
        left: &str,
        right: &str,
        dotted: bool,
        size: TextSize,
        priority: u8,
    ) {
        self.enqueue(
            JobKind::TwoColumn {
                left: left.to_string(),
                right: right.to_string(),
                size,
                dotted,
            },
            priority,
        );
    }

    pub fn queue_barcode(&mut self, symbology: Symbology, data: &str, priority: u8) {
        self.enqueue(
            JobKind::Barcode {
                data: data.to_string(),
                symbology,
            },
            priority,
        );
    }

    pub fn queue_qr_code(&mut self, data: &str, module_size: u8, error_correction: u8, priority: u8) {
        self.enqueue(
            JobKind::QrCode {
                data: data.to_string(),
                module_size,
                error_correction,
            },
            priority,
        );
    }

    pub fn queue_separator(&mut self, priority: u8) {
        self.enqueue(JobKind::Separator, priority);
    }

    pub fn queue_feed(&mut self, lines: u8, priority: u8) {
        self.enqueue(JobKind::Feed { lines }, priority);
    }

    pub fn queue_table_row(
        &mut self,
        col1: &str,
        col2: &str,
        col3: Option<&str>,
        header: bool,
        priority: u8,
    ) {
        self.enqueue(
            JobKind::TableRow {
                col1: col1.to_string(),
                col2: col2.to_string(),
                col3: col3.map(str::to_string),
                header,
            },
            priority,
        );
    }

    pub fn queue_rotated_text(&mut self, text: &str, rotation: u8, priority: u8) {
        self.enqueue(
            JobKind::RotatedText {
                content: text.to_string(),
                rotation,
            },
            priority,
        );
    }

    // ========================================================================
    // SCHEDULING
    // ========================================================================

    /// All gating conditions for a scheduling opportunity.
    fn should_process(&mut self) -> bool {
        if self.busy || self.queue.is_empty() {
            return false;
        }

        let now = self.printer.now_millis();
        if now.saturating_sub(self.last_job_time_ms) < self.print_delay_ms {
            return false;
        }

        if !self.printer.has_paper() {
            let throttled = self
                .last_paper_warning_ms
                .is_some_and(|t| self.printer.now_millis() - t < PAPER_WARNING_THROTTLE_MS);
            if !throttled {
                warn!(
                    queued = self.queue.len(),
                    "cannot process print queue: no paper"
                );
                self.last_paper_warning_ms = Some(self.printer.now_millis());
            }
            return false;
        }

        true
    }

    /// One scheduling opportunity: execute the head job if all gates pass.
    /// Returns true if a job was executed.
    pub fn process_queue(&mut self) -> bool {
        if !self.should_process() {
            return false;
        }

        // Gates passed; the head job is committed from here on.
        let job = self.queue.pop_front().expect("gated on non-empty queue");
        self.busy = true;
        let start = self.printer.now_millis();

        if let Err(e) = self.execute(&job) {
            // No retry state: the job is lost, the counters still advance.
            warn!(error = %e, "print job failed");
        }

        let duration = self.printer.now_millis() - start;
        self.total_processing_time_ms += duration;
        self.total_jobs_processed += 1;
        self.last_job_time_ms = self.printer.now_millis();
        self.busy = false;

        info!(
            duration_ms = duration,
            remaining = self.queue.len(),
            "print job processed"
        );
        true
    }

    /// Dispatch one job to the driver.
    fn execute(&mut self, job: &PrintJob) -> Result<(), BrasaError> {
        match &job.kind {
            JobKind::Text {
                content,
                size,
                align,
                bold,
            } => self.printer.print_styled(content, *size, *align, *bold),
            JobKind::TwoColumn {
                left,
                right,
                size,
                dotted,
            } => self.printer.print_two_column(left, right, *dotted, *size),
            JobKind::Barcode { data, symbology } => self.printer.print_barcode(*symbology, data),
            JobKind::QrCode {
                data,
                module_size,
                error_correction,
            } => self
                .printer
                .print_qr_code(data, *module_size, *error_correction),
            JobKind::Feed { lines } => self.printer.feed(*lines),
            JobKind::Separator => self.printer.print_separator(),
            JobKind::TableRow {
                col1,
                col2,
                col3,
                header,
            } => {
                if *header {
                    self.printer.bold(true)?;
                }
                self.printer.print_table_row(col1, col2, col3.as_deref())?;
                if *header {
                    self.printer.bold(false)?;
                }
                Ok(())
            }
            JobKind::RotatedText { content, rotation } => {
                self.printer.print_rotated_text(content, *rotation)
            }
        }
    }

    /// Host tick hook: process the queue (if auto-processing is on) and run
    /// the 10-second paper poll, invoking the observer callback on
    /// presence *changes* only.
    pub fn tick(&mut self) {
        if self.auto_process {
            self.process_queue();
        }

        let now = self.printer.now_millis();
        if now.saturating_sub(self.last_paper_check_ms) > PAPER_POLL_MS {
            self.last_paper_check_ms = now;
            let current = self.printer.has_paper();
            if current != self.paper_status {
                self.paper_status = current;
                info!(paper = current, "paper presence changed");
                if let Some(cb) = self.paper_callback.as_mut() {
                    cb(current);
                }
            }
        }
    }

    /// [`Self::flush_and_wait`] with the default
    /// [`DEFAULT_FLUSH_TIMEOUT_MS`] timeout.
    pub fn flush(&mut self) -> bool {
        self.flush_and_wait(DEFAULT_FLUSH_TIMEOUT_MS)
    }

    /// Trigger scheduling opportunities until the queue drains or
    /// `timeout_ms` elapses. Returns whether the queue drained fully.
    pub fn flush_and_wait(&mut self, timeout_ms: u64) -> bool {
        let start = self.printer.now_millis();
        loop {
            if self.queue.is_empty() {
                return true;
            }
            if self.printer.now_millis().saturating_sub(start) > timeout_ms {
                warn!(remaining = self.queue.len(), "flush timed out");
                return false;
            }
            self.process_queue();
            self.printer.pause_millis(FLUSH_PAUSE_MS);
        }
    }

    /// Discard all pending jobs unconditionally. In-flight work is not
    /// cancelable; this only empties the queue.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        info!("print queue cleared");
    }

    // ========================================================================
    // IMMEDIATE PRINTING
    // ========================================================================

    /// Emergency path: bypass the queue and print synchronously. Fails with
    /// [`BrasaError::PrinterBusy`] if a job is executing, or
    /// [`BrasaError::PaperOut`] with no paper. Does not touch the queue.
    pub fn print_immediate(
        &mut self,
        text: &str,
        size: TextSize,
        align: Align,
        bold: bool,
    ) -> Result<(), BrasaError> {
        if self.busy {
            return Err(BrasaError::PrinterBusy);
        }
        if !self.printer.has_paper() {
            return Err(BrasaError::PaperOut);
        }

        info!("immediate print");
        self.busy = true;
        let result = self.printer.print_styled(text, size, align, bold);
        self.busy = false;
        self.last_job_time_ms = self.printer.now_millis();
        result
    }

    // ========================================================================
    // CONFIGURATION AND STATS
    // ========================================================================

    pub fn set_max_queue_size(&mut self, max: usize) {
        self.max_queue_size = max.max(1);
    }

    pub fn set_print_delay(&mut self, delay_ms: u64) {
        self.print_delay_ms = delay_ms;
    }

    /// Enable or disable queue processing from `tick()`.
    pub fn set_auto_process(&mut self, enable: bool) {
        self.auto_process = enable;
    }

    /// Register the paper-presence observer (edge-triggered from the poll
    /// in `tick()`).
    pub fn set_paper_callback(&mut self, callback: Box<dyn FnMut(bool)>) {
        self.paper_callback = Some(callback);
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn jobs_processed(&self) -> u32 {
        self.total_jobs_processed
    }

    pub fn jobs_dropped(&self) -> u32 {
        self.jobs_dropped
    }

    pub fn last_job_time_ms(&self) -> u64 {
        self.last_job_time_ms
    }

    pub fn average_job_time_ms(&self) -> f32 {
        if self.total_jobs_processed == 0 {
            return 0.0;
        }
        self.total_processing_time_ms as f32 / self.total_jobs_processed as f32
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.queue.len(),
            processed: self.total_jobs_processed,
            dropped: self.jobs_dropped,
            average_job_time_ms: self.average_job_time_ms(),
        }
    }

    /// Peek at the pending jobs in FIFO order (tests, diagnostics).
    pub fn jobs(&self) -> impl Iterator<Item = &PrintJob> {
        self.queue.iter()
    }

    /// Direct driver access for operations outside the queue (status,
    /// calibration, recovery).
    pub fn printer_mut(&mut self) -> &mut Printer<L, C> {
        &mut self.printer
    }

    pub fn printer(&self) -> &Printer<L, C> {
        &self.printer
    }
}
