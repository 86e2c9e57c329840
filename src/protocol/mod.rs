//! Protocol module - wire format and frame integrity.
//!
//! This module implements the binary frame layout for the object channel:
//! - 6-byte header (start marker, object ID, payload length)
//! - CRC-16 trailer covering header and payload

mod crc;
mod wire_format;

pub use crc::{crc16, CRC_INIT};
pub use wire_format::{
    frame_len, FrameHeader, CRC_SIZE, FRAME_OVERHEAD, HEADER_SIZE, ID_OFFSET, LEN_OFFSET,
    PAYLOAD_OFFSET, START_MARKER,
};
