//! Axle Host Link Protocol
//!
//! This crate defines the UART-based protocol between a host and the Axle
//! stepper controller. The protocol is designed for robustness on a noisy
//! link: every frame is CRC-protected and byte-stuffed so that a single
//! delimiter byte marks frame boundaries.
//!
//! # Protocol Overview
//!
//! A frame is serialized, protected, and stuffed in three layers:
//!
//! ```text
//! ┌────────┬────────┬─────────────┬────────┬────────┐
//! │ MSG_ID │ LENGTH │ PAYLOAD     │ CRC_LO │ CRC_HI │
//! │ 1B     │ 1B     │ 0–250B      │ 1B     │ 1B     │
//! └────────┴────────┴─────────────┴────────┴────────┘
//!          │  CRC-16/CCITT over MSG_ID..PAYLOAD  │
//!          └── COBS byte stuffing ── 0x00 delimiter ──┘
//! ```
//!
//! There is no start-of-frame byte; receivers resynchronize by scanning to
//! the next `0x00` delimiter. Responses echo the request id with the high
//! bit set (`0x80 | request_id`).

#![no_std]
#![deny(unsafe_code)]

pub mod cobs;
pub mod crc16;
pub mod flags;
pub mod frame;
pub mod messages;

pub use flags::ErrorFlags;
pub use frame::{Frame, FrameDecoder, FrameError, DELIMITER, MAX_PAYLOAD_SIZE, MAX_WIRE_SIZE};
pub use messages::{HostCommand, MessageError, ParamId, ParamValue, ResponseStatus, RESPONSE_BIT};
