//! Frame encoding and decoding for the Egismos serial protocol.
//!
//! Frame format:
//! - START (1 byte): 0xAA
//! - ADDRESS (1 byte): slave address of the module
//! - COMMAND (1 byte): opcode
//! - DATA (0..N bytes): command dependent, not length-prefixed
//! - CHECKSUM (1 byte): (ADDRESS + COMMAND + sum(DATA)) & 0x7F
//! - END (1 byte): 0xA8

use core::ops::Deref;

use heapless::Vec;

use crate::constants::{
    CHECKSUM_MASK, FRAME_END, FRAME_START, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, MIN_FRAME_LEN,
};
use crate::error::FrameError;

/// Owned data section of a reply.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// A complete frame, markers and checksum included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(Vec<u8, MAX_FRAME_LEN>);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn push_all(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        self.0
            .extend_from_slice(bytes)
            .map_err(|_| FrameError::Overflow)
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// The fields of a frame that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFrame<'a> {
    pub command: u8,
    pub address: u8,
    pub payload: &'a [u8],
}

/// 7-bit additive checksum over the address, command and data bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b)) & CHECKSUM_MASK
}

/// Builds the frame for `command` addressed to `address`.
///
/// No range checking is done on either field; the module ignores frames it
/// does not understand. Fails only if `data` does not fit in a frame.
pub fn build_frame(command: u8, address: u8, data: &[u8]) -> Result<Frame, FrameError> {
    let mut frame = Frame::default();
    frame.push_all(&[FRAME_START, address, command])?;
    frame.push_all(data)?;
    let checksum = checksum(&frame[1..]);
    frame.push_all(&[checksum, FRAME_END])?;
    Ok(frame)
}

/// Validates `bytes` as a frame and splits it into its fields.
///
/// Only syntax is checked here. Whether the reply belongs to the request is
/// decided by the caller.
pub fn parse_frame(bytes: &[u8]) -> Result<ParsedFrame<'_>, FrameError> {
    let (&first, &last) = match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(FrameError::TooShort(0)),
    };
    if first != FRAME_START {
        return Err(FrameError::BadStart(first));
    }
    if last != FRAME_END {
        return Err(FrameError::BadEnd(last));
    }
    let len = bytes.len();
    if len < MIN_FRAME_LEN {
        return Err(FrameError::TooShort(len));
    }

    let expected = checksum(&bytes[1..len - 2]);
    let found = bytes[len - 2];
    if expected != found {
        return Err(FrameError::Checksum { expected, found });
    }

    Ok(ParsedFrame {
        command: bytes[2],
        address: bytes[1],
        payload: &bytes[3..len - 2],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Discarding bytes until a START marker shows up
    Hunting,
    /// Collecting bytes until an END marker shows up
    Collecting,
}

/// Byte-at-a-time frame delimiter.
///
/// Knows nothing about time or I/O; the blocking and async drivers both feed
/// it whatever the port hands them.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    state: ScanState,
    buffer: Vec<u8, MAX_FRAME_LEN>,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Hunting,
            buffer: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ScanState::Hunting;
        self.buffer.clear();
    }

    /// Feed a single byte to the scanner.
    ///
    /// Returns `Ok(Some(frame))` once an END marker closes a frame, `Ok(None)`
    /// when more bytes are needed, or `Err(FrameError::Overflow)` if a frame
    /// outgrows `MAX_FRAME_LEN` (the scanner then starts hunting again).
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ScanState::Hunting => {
                if byte == FRAME_START {
                    self.buffer.clear();
                    // Cannot fail, the buffer was just cleared
                    let _ = self.buffer.push(byte);
                    self.state = ScanState::Collecting;
                }
                Ok(None)
            }
            ScanState::Collecting => {
                if self.buffer.push(byte).is_err() {
                    self.reset();
                    return Err(FrameError::Overflow);
                }
                // Address, command and checksum come before END, so an
                // earlier 0xA8 is one of those fields
                if byte == FRAME_END && self.buffer.len() >= MIN_FRAME_LEN {
                    self.state = ScanState::Hunting;
                    return Ok(Some(Frame(core::mem::take(&mut self.buffer))));
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the scanner.
    ///
    /// Returns the first complete frame found. Bytes after it are dropped,
    /// so the drivers feed one byte at a time to leave queued frames of
    /// continuous mode in the port.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
