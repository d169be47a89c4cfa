//! # Mock Link
//!
//! In-memory [`ByteLink`] for tests: records every byte sent and serves
//! scripted response bytes for status queries.
//!
//! ## Example
//!
//! ```
//! use brasa::transport::{ByteLink, MockLink};
//!
//! let mut link = MockLink::new(19200);
//! link.send(0x1B).unwrap();
//! link.send(0x40).unwrap();
//! assert_eq!(link.sent(), &[0x1B, 0x40]);
//!
//! // Script a paper status response (bits 2-3 clear = paper present)
//! link.push_response(0x00);
//! assert!(link.available());
//! assert_eq!(link.recv(), Some(0x00));
//! ```

use std::collections::VecDeque;

use crate::error::BrasaError;
use crate::transport::ByteLink;

/// Captures outgoing bytes and replays scripted responses.
#[derive(Debug, Default)]
pub struct MockLink {
    baud: u32,
    sent: Vec<u8>,
    responses: VecDeque<u8>,
}

impl MockLink {
    pub fn new(baud: u32) -> Self {
        Self {
            baud,
            sent: Vec::new(),
            responses: VecDeque::new(),
        }
    }

    /// All bytes sent so far, in order.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of bytes sent so far.
    pub fn sent_len(&self) -> usize {
        self.sent.len()
    }

    /// Forget captured bytes (keeps scripted responses).
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Queue a byte the printer "sends back" on the next read.
    pub fn push_response(&mut self, byte: u8) {
        self.responses.push_back(byte);
    }
}

impl ByteLink for MockLink {
    fn send(&mut self, byte: u8) -> Result<(), BrasaError> {
        self.sent.push(byte);
        Ok(())
    }

    fn available(&mut self) -> bool {
        !self.responses.is_empty()
    }

    fn recv(&mut self) -> Option<u8> {
        self.responses.pop_front()
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }
}
