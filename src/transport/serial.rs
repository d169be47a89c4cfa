//! # Serial TTY Link
//!
//! Communication with the printer over a serial device (`/dev/ttyUSB0`,
//! `/dev/ttyAMA0`, or similar).
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary command bytes pass through
//! unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR,
//!   ICRNL disabled
//! - **No software flow control**: IXON, IXOFF, IXANY disabled — 0x11 (XON)
//!   and 0x13 (XOFF) are legitimate command parameter bytes
//! - **No output processing**: OPOST disabled (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **No echo, non-canonical**: ECHO, ECHONL, ICANON, ISIG, IEXTEN disabled
//!
//! The requested baud rate is applied with `cfsetispeed`/`cfsetospeed`.
//! These printers ship at 19200 baud (some at 9600); the flow controller
//! derives its per-byte timing from whatever is configured here, so the two
//! must agree with the printer's DIP/firmware setting.
//!
//! ## Reads
//!
//! The descriptor is switched to non-blocking mode. `available()`/`recv()`
//! pull single bytes opportunistically — the only traffic the printer sends
//! back is the one-byte response to a paper status query.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::error::BrasaError;
use crate::transport::ByteLink;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Default line speed (printer factory setting)
pub const DEFAULT_BAUD: u32 = 19200;

/// # Serial Printer Link
///
/// Owns the opened TTY and its configured baud rate.
///
/// ## Example
///
/// ```no_run
/// use brasa::transport::{ByteLink, SerialLink};
///
/// let mut link = SerialLink::open("/dev/ttyUSB0", 19200)?;
/// link.send(0xFF)?; // wake
/// # Ok::<(), brasa::BrasaError>(())
/// ```
pub struct SerialLink {
    file: File,
    baud: u32,
    /// One byte of pushback so `available()` can probe without losing data.
    pending: Option<u8>,
}

impl SerialLink {
    /// Open a serial connection to the printer.
    ///
    /// ## Parameters
    ///
    /// - `device`: path to the TTY (e.g., "/dev/ttyUSB0")
    /// - `baud`: line speed; must match the printer's configured rate
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the dialout group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P, baud: u32) -> Result<Self, BrasaError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                BrasaError::Transport(format!("Failed to open {}: {}", path.display(), e))
            })?;

        configure_tty_raw(file.as_raw_fd(), baud)?;

        Ok(Self {
            file,
            baud,
            pending: None,
        })
    }

    /// Open with default device path and baud rate.
    pub fn open_default() -> Result<Self, BrasaError> {
        Self::open(DEFAULT_DEVICE, DEFAULT_BAUD)
    }

    /// Try a non-blocking single-byte read from the device.
    fn poll_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.file.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(_) => None,
        }
    }
}

impl ByteLink for SerialLink {
    fn send(&mut self, byte: u8) -> Result<(), BrasaError> {
        self.file
            .write_all(&[byte])
            .map_err(|e| BrasaError::Transport(format!("Write failed: {}", e)))
    }

    fn available(&mut self) -> bool {
        if self.pending.is_none() {
            self.pending = self.poll_byte();
        }
        self.pending.is_some()
    }

    fn recv(&mut self) -> Option<u8> {
        self.pending.take().or_else(|| self.poll_byte())
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }
}

/// Map a numeric baud rate to the termios speed constant.
#[cfg(unix)]
fn baud_constant(baud: u32) -> Result<libc::speed_t, BrasaError> {
    match baud {
        9600 => Ok(libc::B9600),
        19200 => Ok(libc::B19200),
        38400 => Ok(libc::B38400),
        57600 => Ok(libc::B57600),
        115200 => Ok(libc::B115200),
        other => Err(BrasaError::Transport(format!(
            "Unsupported baud rate: {}",
            other
        ))),
    }
}

/// Configure a file descriptor for raw TTY mode at the given baud rate.
///
/// This disables all input/output processing so binary data passes through
/// unmodified, and puts the descriptor in non-blocking mode so status reads
/// never stall the caller.
#[cfg(unix)]
fn configure_tty_raw(fd: i32, baud: u32) -> Result<(), BrasaError> {
    use std::mem::MaybeUninit;

    // Get current terminal attributes
    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(BrasaError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: disable all processing, including XON/XOFF flow control
    // (0x11/0x13 appear as parameter bytes in command sequences)
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    // Output flags: disable post-processing
    termios.c_oflag &= !libc::OPOST;

    // Local flags: disable echo, canonical mode, signals
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // Control flags: 8-bit characters, no parity
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    // Line speed, both directions
    let speed = baud_constant(baud)?;
    unsafe {
        libc::cfsetispeed(&mut termios, speed);
        libc::cfsetospeed(&mut termios, speed);
    }

    // Apply settings immediately
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(BrasaError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    // Non-blocking reads: the paper status poll must never stall the host
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(BrasaError::Transport(format!(
            "fcntl O_NONBLOCK failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32, _baud: u32) -> Result<(), BrasaError> {
    // On non-Unix platforms, skip TTY configuration
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
