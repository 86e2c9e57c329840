//! Error types for serimux.
//!
//! The engine reports outcomes as values, never panics. Variant `Display`
//! labels are stable: drivers log them and scripts match on them, so the
//! strings are part of the wire-level contract.

use std::fmt;

use thiserror::Error;

/// Outcome of a failed object read.
///
/// `Ok(..)` from [`Link::read_object`](crate::Link::read_object) is the
/// `Success` outcome; everything else is one of these.
///
/// Only `CrcError` and `ObjectSizeMismatch` consume the frame. The other
/// variants leave the buffer untouched so the caller can retry, dispatch on
/// [`object_id`](crate::Link::object_id), or
/// [`skip_object`](crate::Link::skip_object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// No frame head at the buffer's read position.
    #[error("NoObjectAvailable")]
    NoObjectAvailable,

    /// A frame head is present but the frame has not fully arrived.
    /// Advisory, not a failure: ingest more and retry.
    #[error("NotEnoughData")]
    NotEnoughData,

    /// The frame's CRC did not match. The frame has been consumed.
    #[error("CrcError")]
    CrcError,

    /// The frame head carries a different object ID than the requested
    /// type. The frame is retained.
    #[error("ObjectIdMismatch")]
    ObjectIdMismatch,

    /// The payload did not decode to exactly the advertised length.
    /// The frame has been consumed.
    #[error("ObjectSizeMismatch")]
    ObjectSizeMismatch,
}

/// Outcome of a failed object send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The encoded frame would exceed the scratch buffer capacity or the
    /// 16-bit payload length field. Nothing was written to the port.
    #[error("ObjectTooLarge")]
    ObjectTooLarge,

    /// The port rejected the frame write.
    #[error("WriteError")]
    WriteFailed,

    /// The value contains a shape the wire encoding cannot express
    /// (map, data-carrying enum, a single field beyond the `u16` length
    /// limit, ...).
    #[error("Unencodable")]
    Unencodable,
}

/// Errors produced by the schema codec while encoding or decoding a
/// payload.
///
/// On the receive path these never escape directly: [`Link::read_object`]
/// maps any decode failure to [`ReadError::ObjectSizeMismatch`] after the
/// frame is consumed.
///
/// [`Link::read_object`]: crate::Link::read_object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended before the value was fully decoded.
    #[error("unexpected end of payload")]
    UnexpectedEof,

    /// A string or sequence is too long for its 16-bit length field.
    #[error("length {0} exceeds the 16-bit wire limit")]
    LengthOverflow(usize),

    /// The on-wire count of a fixed-length sequence disagrees with the
    /// compile-time length.
    #[error("fixed-length sequence count mismatch: expected {expected}, found {found}")]
    SequenceLengthMismatch {
        /// Compile-time element count of the destination.
        expected: usize,
        /// Count stored on the wire.
        found: usize,
    },

    /// The type uses a serde shape the wire encoding does not define.
    #[error("unsupported wire shape: {0}")]
    Unsupported(&'static str),

    /// String payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// A 4-byte char scalar was not a valid Unicode scalar value.
    #[error("invalid char scalar: {0:#x}")]
    InvalidChar(u32),

    /// Custom message raised by a `Serialize`/`Deserialize` impl.
    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CodecError::Message(msg.to_string())
    }
}

impl serde::de::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CodecError::Message(msg.to_string())
    }
}

/// Result type alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
