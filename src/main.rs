//! # Brasa CLI
//!
//! Command-line utility for driving a serial thermal receipt printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print a line of text
//! brasa print "Hello, world!" --center --bold
//!
//! # Print a barcode / QR code
//! brasa barcode --symbology code39 "A12345"
//! brasa qr "https://example.com"
//!
//! # Print the startup banner
//! brasa banner --business "CAFE BRASA"
//!
//! # Print a demo receipt
//! brasa receipt --business "CAFE BRASA" --total '$12.00'
//!
//! # Queue every line of a file and drain the queue
//! brasa batch jobs.txt
//!
//! # Paper status and usage counters
//! brasa status
//!
//! # Reset usage counters (new roll)
//! brasa reset-usage
//! ```
//!
//! The usage counters persist in a JSON file (`--usage-file`) so roll
//! consumption carries across invocations.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use brasa::clock::{Clock, SystemClock};
use brasa::error::BrasaError;
use brasa::flow::FlowMode;
use brasa::printer::{Printer, PrinterConfig};
use brasa::protocol::barcode::Symbology;
use brasa::protocol::commands::{Align, TextSize};
use brasa::spool::Spooler;
use brasa::transport::{ByteLink, SerialLink};
use brasa::usage::FileStore;

/// Brasa - thermal receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "brasa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device path
    #[arg(long, default_value = "/dev/ttyUSB0", global = true)]
    device: String,

    /// Serial baud rate (must match the printer's setting)
    #[arg(long, default_value = "19200", global = true)]
    baud: u32,

    /// Usage counter file
    #[arg(long, default_value = "brasa-usage.json", global = true)]
    usage_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// 1-D symbology names accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SymbologyArg {
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

impl From<SymbologyArg> for Symbology {
    fn from(arg: SymbologyArg) -> Self {
        match arg {
            SymbologyArg::UpcA => Symbology::UpcA,
            SymbologyArg::UpcE => Symbology::UpcE,
            SymbologyArg::Ean13 => Symbology::Ean13,
            SymbologyArg::Ean8 => Symbology::Ean8,
            SymbologyArg::Code39 => Symbology::Code39,
            SymbologyArg::Itf => Symbology::Itf,
            SymbologyArg::Codabar => Symbology::Codabar,
            SymbologyArg::Code93 => Symbology::Code93,
            SymbologyArg::Code128 => Symbology::Code128,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a line of text
    Print {
        text: String,

        /// Text size: 1 = small, 2 = medium, 3 = large
        #[arg(long, default_value = "1")]
        size: u8,

        /// Center the text
        #[arg(long)]
        center: bool,

        /// Bold
        #[arg(long)]
        bold: bool,
    },

    /// Print a left/right two-column line (receipt total style)
    TwoColumn {
        left: String,
        right: String,

        /// Fill with dots instead of spaces
        #[arg(long)]
        dots: bool,
    },

    /// Print a 1-D barcode
    Barcode {
        data: String,

        #[arg(long, value_enum, default_value = "code39")]
        symbology: SymbologyArg,
    },

    /// Print a QR code
    Qr {
        data: String,

        /// Module size in dots
        #[arg(long, default_value = "3")]
        size: u8,

        /// Error correction level (0=L 1=M 2=Q 3=H)
        #[arg(long, default_value = "1")]
        ec: u8,
    },

    /// Print text rotated 90 degrees, one glyph per line
    Rotated { text: String },

    /// Print the startup banner (business name, ready line, date)
    Banner {
        /// Business name for the banner
        #[arg(long, default_value = "BRASA")]
        business: String,
    },

    /// Print a demo receipt
    Receipt {
        /// Business name for the header
        #[arg(long, default_value = "BRASA")]
        business: String,

        /// Total line (printed bold, dot-filled)
        #[arg(long)]
        total: Option<String>,
    },

    /// Queue each non-empty line of a file as a text job, then drain
    /// the queue
    Batch { file: PathBuf },

    /// Print the firmware self-test page
    TestPage,

    /// Show paper status and usage counters
    Status,

    /// Zero the usage counters (new roll loaded)
    ResetUsage,
}

fn open_printer(cli: &Cli) -> Result<Printer<SerialLink, SystemClock>, BrasaError> {
    let link = SerialLink::open(&cli.device, cli.baud)?;
    let store = FileStore::new(&cli.usage_file);
    let mut printer = Printer::new(
        link,
        SystemClock::new(),
        FlowMode::Software,
        Box::new(store),
        PrinterConfig::CSN_A2,
    );
    printer.init()?;
    Ok(printer)
}

/// Startup banner: business name large and bold, ready line, date,
/// separator.
fn print_banner<L: ByteLink, C: Clock>(
    printer: &mut Printer<L, C>,
    business: &str,
) -> Result<(), BrasaError> {
    let date_line = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();

    printer.print_styled(business, TextSize::Large, Align::Center, true)?;
    printer.feed(1)?;
    printer.print_styled("printer ready", TextSize::Small, Align::Center, false)?;
    printer.print_styled(&date_line, TextSize::Small, Align::Center, false)?;
    printer.print_separator()?;
    printer.feed(3)
}

fn print_receipt<L: ByteLink, C: Clock>(
    printer: &mut Printer<L, C>,
    business: &str,
    total: Option<&str>,
) -> Result<(), BrasaError> {
    let date_line = format!("Date: {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));

    printer.print_styled(business, TextSize::Medium, Align::Center, true)?;
    printer.feed(1)?;
    printer.print_line(&date_line)?;
    printer.print_separator()?;

    if let Some(total) = total {
        printer.bold(true)?;
        printer.print_two_column("TOTAL:", total, true, TextSize::Small)?;
        printer.bold(false)?;
    }

    printer.feed(2)?;
    printer.print_styled("Thank you!", TextSize::Small, Align::Center, false)?;
    printer.feed(4)
}

/// Admit one text job per non-empty line. Returns how many were queued.
fn queue_batch<L: ByteLink, C: Clock>(spooler: &mut Spooler<L, C>, text: &str) -> usize {
    let mut queued = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        spooler.queue_text(line, TextSize::Small, Align::Left, false, 0);
        queued += 1;
    }
    queued
}

fn run(cli: &Cli) -> Result<(), BrasaError> {
    let mut printer = open_printer(cli)?;

    match &cli.command {
        Commands::Print {
            text,
            size,
            center,
            bold,
        } => {
            let align = if *center { Align::Center } else { Align::Left };
            printer.print_styled(text, TextSize::from_code(*size), align, *bold)?;
            printer.feed(2)?;
        }

        Commands::TwoColumn { left, right, dots } => {
            printer.print_two_column(left, right, *dots, TextSize::Small)?;
            printer.feed(2)?;
        }

        Commands::Barcode { data, symbology } => {
            printer.print_barcode((*symbology).into(), data)?;
            printer.feed(2)?;
        }

        Commands::Qr { data, size, ec } => {
            printer.print_qr_code(data, *size, *ec)?;
        }

        Commands::Rotated { text } => {
            printer.print_rotated_text(text, 1)?;
        }

        Commands::Banner { business } => {
            print_banner(&mut printer, business)?;
        }

        Commands::Receipt { business, total } => {
            print_receipt(&mut printer, business, total.as_deref())?;
        }

        Commands::Batch { file } => {
            let text = std::fs::read_to_string(file)
                .map_err(|e| BrasaError::Storage(format!("read {}: {}", file.display(), e)))?;

            let mut spooler = Spooler::new(printer);
            let queued = queue_batch(&mut spooler, &text);
            println!("Queued {} jobs", queued);

            let drained = spooler.flush();
            spooler.printer_mut().usage_mut().checkpoint()?;
            return if drained {
                println!("Processed {} jobs.", spooler.jobs_processed());
                Ok(())
            } else {
                Err(BrasaError::Communication(format!(
                    "queue did not drain: {} jobs left",
                    spooler.queue_len()
                )))
            };
        }

        Commands::TestPage => {
            printer.test_page()?;
        }

        Commands::Status => {
            let status = printer.detailed_status();
            println!("Printer:       {}", printer.config().name);
            println!(
                "Paper:         {}",
                if status.paper_present { "present" } else { "OUT" }
            );
            println!("Flow timeouts: {}", status.flow_timeouts);
            println!("Bytes sent:    {}", status.bytes_sent);

            let usage = printer.usage();
            println!("Lines printed: {}", usage.lines_printed());
            println!("Characters:    {}", usage.characters_printed());
            println!("Feeds:         {}", usage.feeds_executed());
            println!(
                "Paper used:    {:.1}mm ({:.2}% of roll)",
                usage.usage_mm(),
                usage.usage_percent()
            );
        }

        Commands::ResetUsage => {
            printer.usage_mut().reset()?;
            println!("Usage counters reset.");
        }
    }

    // Final checkpoint so short invocations don't lose counters.
    printer.usage_mut().checkpoint()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// TESTS
// ============================================================================
