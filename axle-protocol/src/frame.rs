//! Frame encoding and decoding for the host link
//!
//! Wire format before stuffing:
//! - MSG_ID (1 byte): message identifier
//! - LENGTH (1 byte): payload length (0-250)
//! - PAYLOAD (0-250 bytes): message-specific data
//! - CRC (2 bytes, little-endian): CRC-16/CCITT over MSG_ID..PAYLOAD
//!
//! The whole sequence is COBS-stuffed and terminated with a single `0x00`
//! delimiter. There is no start byte; receivers resynchronize by scanning
//! to the next delimiter.

use heapless::Vec;

use crate::cobs::{self, CobsError};
use crate::crc16;

/// Frame delimiter byte on the wire
pub const DELIMITER: u8 = 0x00;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Header size: MSG_ID (1) + LENGTH (1)
pub const HEADER_SIZE: usize = 2;

/// CRC trailer size
pub const CRC_SIZE: usize = 2;

/// Maximum raw (unstuffed) frame size
pub const MAX_RAW_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Maximum stuffed frame size on the wire, including the delimiter
pub const MAX_WIRE_SIZE: usize = cobs::max_encoded_len(MAX_RAW_SIZE) + 1;

/// Errors that can occur during frame encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Unstuffing failed or frame structure is inconsistent
    Malformed,
    /// CRC mismatch
    Crc,
    /// Length field exceeds the payload limit
    Oversize,
}

impl From<CobsError> for FrameError {
    fn from(e: CobsError) -> Self {
        match e {
            CobsError::InputTooLarge | CobsError::OutputTooSmall => FrameError::BufferTooSmall,
            CobsError::ZeroCode | CobsError::Truncated => FrameError::Malformed,
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message identifier
    pub id: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message id and payload
    pub fn new(id: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            id,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(id: u8) -> Self {
        Self {
            id,
            payload: Vec::new(),
        }
    }

    /// Check whether this frame carries a response id
    pub fn is_response(&self) -> bool {
        self.id & crate::messages::RESPONSE_BIT != 0
    }

    /// Encode this frame onto the wire: stuffed bytes plus delimiter.
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let mut raw = [0u8; MAX_RAW_SIZE];
        let raw_len = HEADER_SIZE + self.payload.len() + CRC_SIZE;

        raw[0] = self.id;
        raw[1] = self.payload.len() as u8;
        raw[HEADER_SIZE..HEADER_SIZE + self.payload.len()].copy_from_slice(&self.payload);

        let crc = crc16::calculate(&raw[..HEADER_SIZE + self.payload.len()]);
        raw[HEADER_SIZE + self.payload.len()] = (crc & 0xFF) as u8;
        raw[HEADER_SIZE + self.payload.len() + 1] = (crc >> 8) as u8;

        let stuffed_len = cobs::encode(&raw[..raw_len], buffer)?;
        if buffer.len() < stuffed_len + 1 {
            return Err(FrameError::BufferTooSmall);
        }
        buffer[stuffed_len] = DELIMITER;

        Ok(stuffed_len + 1)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_WIRE_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_WIRE_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode a stuffed frame (the bytes between two delimiters).
    pub fn decode(stuffed: &[u8]) -> Result<Self, FrameError> {
        let mut raw = [0u8; MAX_WIRE_SIZE];
        let raw_len = cobs::decode(stuffed, &mut raw).map_err(FrameError::from_decode)?;

        if raw_len < HEADER_SIZE + CRC_SIZE {
            return Err(FrameError::Malformed);
        }

        let length = raw[1] as usize;
        if length > MAX_PAYLOAD_SIZE {
            return Err(FrameError::Oversize);
        }
        if raw_len != HEADER_SIZE + length + CRC_SIZE {
            return Err(FrameError::Malformed);
        }

        let covered = HEADER_SIZE + length;
        let expected = u16::from_le_bytes([raw[covered], raw[covered + 1]]);
        if !crc16::verify(&raw[..covered], expected) {
            return Err(FrameError::Crc);
        }

        Frame::new(raw[0], &raw[HEADER_SIZE..covered])
    }
}

impl FrameError {
    // Decode-side COBS failures are link corruption, not local buffer sizing.
    fn from_decode(e: CobsError) -> Self {
        match e {
            CobsError::InputTooLarge => FrameError::Oversize,
            _ => FrameError::Malformed,
        }
    }
}

/// Streaming decoder for incoming link bytes
///
/// Accumulates bytes until a delimiter is seen, then unstuffs and validates
/// the frame. Garbage between frames is discarded at the next delimiter.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8, MAX_WIRE_SIZE>,
    overflowed: bool,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Reset the decoder state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    /// Feed a single byte from the link
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame has been
    /// received, `Ok(None)` when more bytes are needed, or `Err` when the
    /// bytes up to a delimiter did not form a valid frame.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if byte != DELIMITER {
            if self.buffer.push(byte).is_err() {
                self.overflowed = true;
            }
            return Ok(None);
        }

        // Delimiter: an empty buffer is idle-line noise, not a frame.
        if self.buffer.is_empty() && !self.overflowed {
            return Ok(None);
        }

        let result = if self.overflowed {
            Err(FrameError::Oversize)
        } else {
            Frame::decode(&self.buffer).map(Some)
        };
        self.reset();
        result
    }

    /// Feed multiple bytes from the link
    ///
    /// Returns the first complete frame found, if any. Remaining bytes after
    /// a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
