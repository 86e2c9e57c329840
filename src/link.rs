//! Link engine - frame scanning, ingestion, and the object read/send paths.
//!
//! A [`Link`] owns one [`SerialPort`] plus two buffers: a circular receive
//! buffer and a scratch buffer for frame assembly and wrap linearization.
//! The receive side separates the byte stream into two channels:
//!
//! - **generic data** — everything before the next object-start marker,
//!   drained with [`read`](Link::read)/[`skip`](Link::skip);
//! - **object frames** — marker-headed, CRC-checked records, drained with
//!   [`read_object`](Link::read_object)/[`skip_object`](Link::skip_object).
//!
//! A typical driver loop:
//!
//! ```text
//! loop {
//!     link.ingest(OverwritePolicy::Overwrite);
//!     while link.has_object() { ... read_object / skip_object ... }
//!     while link.available() > 0 { ... read generic bytes ... }
//! }
//! ```
//!
//! Everything runs to completion on the caller's thread; the engine never
//! blocks waiting for data and never retries a write.

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace, warn};

use crate::buffer::RingBuffer;
use crate::codec;
use crate::error::{ReadError, SendError};
use crate::object::WireObject;
use crate::protocol::{
    crc16, frame_len, FrameHeader, FRAME_OVERHEAD, HEADER_SIZE, ID_OFFSET, LEN_OFFSET,
    PAYLOAD_OFFSET, START_MARKER,
};
use crate::transport::SerialPort;

/// Default receive buffer capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Buffer sizing for a [`Link`].
///
/// Both capacities are fixed at construction and must be at least as large
/// as the biggest frame expected on the link: the receive buffer because a
/// frame is only decoded once it is fully buffered, the scratch buffer
/// because outgoing frames are assembled in it whole.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Circular receive buffer capacity. Default: 512.
    pub buffer_capacity: usize,
    /// Scratch buffer capacity, bounding the largest sendable frame.
    /// Default: half the receive capacity.
    pub scratch_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            scratch_capacity: DEFAULT_BUFFER_CAPACITY / 2,
        }
    }
}

/// What ingestion may do when the receive buffer runs out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Drop the oldest buffered bytes to make room for new ones. One byte
    /// of capacity stays reserved while the buffer is non-empty so a
    /// pending start marker at the tail cannot be clobbered.
    Overwrite,
    /// Never displace buffered bytes; ingest at most the free space.
    Preserve,
}

/// Bidirectional object/byte multiplexer over one serial port.
pub struct Link<P> {
    port: P,
    buffer: RingBuffer,
    scratch: BytesMut,
    scratch_capacity: usize,
}

impl<P: SerialPort> Link<P> {
    /// Create a link with default buffer sizes.
    pub fn new(port: P) -> Self {
        Self::with_config(port, LinkConfig::default())
    }

    /// Create a link with explicit buffer sizes.
    pub fn with_config(port: P, config: LinkConfig) -> Self {
        Self {
            buffer: RingBuffer::new(config.buffer_capacity),
            scratch: BytesMut::with_capacity(config.scratch_capacity),
            scratch_capacity: config.scratch_capacity,
            port,
        }
    }

    /// Borrow the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutably borrow the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the link, returning the port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Receive buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Total bytes currently buffered, generic and frame alike.
    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything buffered, including a partially received frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Pull bytes from the port into the receive buffer.
    ///
    /// Reads only what the port reports available, in contiguous runs,
    /// until the policy's budget is exhausted:
    ///
    /// - [`OverwritePolicy::Overwrite`]: up to the full capacity (minus the
    ///   reserved tail byte while non-empty), displacing the oldest bytes
    ///   on overflow.
    /// - [`OverwritePolicy::Preserve`]: up to the free space only.
    pub fn ingest(&mut self, policy: OverwritePolicy) {
        let budget = match policy {
            OverwritePolicy::Overwrite => {
                if self.buffer.is_empty() {
                    self.buffer.capacity()
                } else {
                    self.buffer.capacity() - 1
                }
            }
            OverwritePolicy::Preserve => self.buffer.free(),
        };
        self.pull_from_port(budget);
    }

    fn pull_from_port(&mut self, mut budget: usize) {
        let mut total = 0;
        while budget > 0 {
            let available = self.port.bytes_available();
            if available == 0 {
                break;
            }
            let chunk = self.buffer.tail_chunk_mut(available.min(budget));
            let count = self.port.read(chunk);
            if count == 0 {
                break;
            }
            self.buffer.commit(count);
            budget -= count;
            total += count;
        }
        if total > 0 {
            trace!(bytes = total, buffered = self.buffer.len(), "ingested");
        }
    }

    // ------------------------------------------------------------------
    // Frame scanner
    // ------------------------------------------------------------------

    /// Logical offset of the next start marker, if one is buffered.
    fn find_marker(&self) -> Option<usize> {
        let len = self.buffer.len();
        for i in 0..len.saturating_sub(1) {
            if self.buffer.byte(i) == START_MARKER[0] && self.buffer.byte(i + 1) == START_MARKER[1]
            {
                return Some(i);
            }
        }
        None
    }

    /// Number of generic bytes readable before the next object frame.
    ///
    /// A lone `0x02` as the final buffered byte is withheld: it may be the
    /// first half of a marker still in flight, so it is neither counted
    /// here nor released by [`read`](Link::read) until the next byte
    /// settles the question.
    pub fn available(&self) -> usize {
        let len = self.buffer.len();
        if len == 0 {
            return 0;
        }
        match self.find_marker() {
            Some(offset) => offset,
            None if self.buffer.byte(len - 1) == START_MARKER[0] => len - 1,
            None => len,
        }
    }

    /// Whether an object frame head sits at the front of the buffer.
    ///
    /// True once the marker and at least the ID field's worth of bytes are
    /// buffered; the frame body may still be arriving.
    pub fn has_object(&self) -> bool {
        self.buffer.len() >= 4
            && self.buffer.byte(0) == START_MARKER[0]
            && self.buffer.byte(1) == START_MARKER[1]
    }

    /// The ID of the object at the head of the buffer, if any.
    ///
    /// Lets a caller dispatch to the right [`read_object`](Link::read_object)
    /// turbofish, or decide to [`skip_object`](Link::skip_object) an ID it
    /// does not know.
    pub fn object_id(&self) -> Option<i16> {
        if self.has_object() {
            Some(self.head_object_id())
        } else {
            None
        }
    }

    fn head_object_id(&self) -> i16 {
        i16::from_le_bytes([self.buffer.byte(ID_OFFSET), self.buffer.byte(ID_OFFSET + 1)])
    }

    /// Payload length field of the head frame. Callers ensure `len >= 6`.
    fn head_payload_len(&self) -> u16 {
        u16::from_le_bytes([self.buffer.byte(LEN_OFFSET), self.buffer.byte(LEN_OFFSET + 1)])
    }

    // ------------------------------------------------------------------
    // Generic-data API
    // ------------------------------------------------------------------

    /// Copy generic bytes into `dst`, consuming them.
    ///
    /// Copies at most [`available`](Link::available) bytes — generic data
    /// never includes any part of a buffered frame. Returns the count
    /// copied.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.available());
        if count == 0 {
            return 0;
        }
        self.buffer.copy_to_slice(&mut dst[..count]);
        self.buffer.mark_read(count)
    }

    /// Discard up to `len` generic bytes, returning the count discarded.
    ///
    /// Refreshes the buffer with one preserve-mode ingestion pass first:
    /// skipping is the recovery path after corruption or an unwanted
    /// frame, and the refresh lets a driver make progress through data
    /// larger than the buffer by skipping in a loop.
    pub fn skip(&mut self, len: usize) -> usize {
        self.ingest(OverwritePolicy::Preserve);
        let count = len.min(self.available());
        self.buffer.mark_read(count)
    }

    /// Discard as many generic bytes as one pass allows.
    pub fn skip_all(&mut self) -> usize {
        self.skip(self.buffer.capacity())
    }

    // ------------------------------------------------------------------
    // Object read path
    // ------------------------------------------------------------------

    /// Confirm a frame head and top the buffer up without displacing it.
    fn ensure_head(&mut self) -> Result<(), ReadError> {
        if !self.has_object() {
            return Err(ReadError::NoObjectAvailable);
        }
        self.ingest(OverwritePolicy::Preserve);
        if self.buffer.len() < HEADER_SIZE {
            return Err(ReadError::NotEnoughData);
        }
        Ok(())
    }

    /// Decode the object at the head of the buffer.
    ///
    /// On `Ok` the frame is consumed and the decoded value returned.
    /// [`ReadError::CrcError`] and [`ReadError::ObjectSizeMismatch`] also
    /// consume the frame — the error is seen exactly once. The remaining
    /// errors leave the frame in place; see [`ReadError`] for the
    /// retention rules.
    pub fn read_object<T: WireObject>(&mut self) -> Result<T, ReadError> {
        self.ensure_head()?;

        let found = self.head_object_id();
        if found != T::OBJECT_ID {
            debug!(
                expected = T::OBJECT_ID,
                found, "object id mismatch, frame retained"
            );
            return Err(ReadError::ObjectIdMismatch);
        }

        let payload_len = self.head_payload_len() as usize;
        let total = FRAME_OVERHEAD + payload_len;
        if total > self.buffer.len() {
            return Err(ReadError::NotEnoughData);
        }

        let outcome = {
            let frame: &[u8] = match self.buffer.contiguous(total) {
                Some(slice) => slice,
                None => {
                    // Frame straddles the wrap: linearize into scratch.
                    self.scratch.clear();
                    let (head, tail) = self.buffer.as_slices();
                    self.scratch.extend_from_slice(head);
                    self.scratch.extend_from_slice(&tail[..total - head.len()]);
                    &self.scratch[..]
                }
            };

            let crc_offset = HEADER_SIZE + payload_len;
            let stored = u16::from_le_bytes([frame[crc_offset], frame[crc_offset + 1]]);
            let computed = crc16(&frame[..crc_offset]);
            if stored != computed {
                warn!(stored, computed, "frame CRC mismatch, frame dropped");
                Err(ReadError::CrcError)
            } else {
                let payload = &frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload_len];
                match codec::decode::<T>(payload) {
                    Ok((value, consumed)) if consumed == payload_len => {
                        trace!(id = T::OBJECT_ID, len = payload_len, "object decoded");
                        Ok(value)
                    }
                    Ok(_) | Err(_) => Err(ReadError::ObjectSizeMismatch),
                }
            }
        };

        // Valid or corrupt, the frame's bytes are spent.
        self.buffer.mark_read(total);
        outcome
    }

    /// Discard the object frame at the head of the buffer.
    ///
    /// No CRC check and no type binding — this is how a receiver moves
    /// past an unknown or unwanted ID. Returns
    /// [`ReadError::NotEnoughData`] and leaves the frame in place if it
    /// has not fully arrived.
    pub fn skip_object(&mut self) -> Result<(), ReadError> {
        self.ensure_head()?;
        let total = frame_len(self.head_payload_len());
        if total > self.buffer.len() {
            return Err(ReadError::NotEnoughData);
        }
        debug!(id = self.head_object_id(), "object frame skipped");
        self.buffer.mark_read(total);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Send path
    // ------------------------------------------------------------------

    /// Encode `value` as a single frame and hand it to the port.
    ///
    /// The frame is assembled whole in the scratch buffer and written in
    /// one port call; nothing reaches the port unless the frame fits the
    /// configured scratch capacity. Best-effort: a lost or damaged frame
    /// shows up on the receiver as `CrcError` or a resync, never here.
    pub fn send_object<T: WireObject>(&mut self, value: &T) -> Result<(), SendError> {
        debug_assert!(T::OBJECT_ID >= 0, "negative object IDs are reserved");

        let payload_len = codec::encoded_size(value).map_err(|err| {
            debug!(id = T::OBJECT_ID, %err, "value not encodable");
            SendError::Unencodable
        })?;
        if payload_len > u16::MAX as usize || FRAME_OVERHEAD + payload_len > self.scratch_capacity
        {
            return Err(SendError::ObjectTooLarge);
        }

        self.scratch.clear();
        FrameHeader::new(T::OBJECT_ID, payload_len as u16).write_to(&mut self.scratch);
        codec::encode(value, &mut self.scratch).map_err(|_| SendError::Unencodable)?;
        debug_assert_eq!(self.scratch.len(), HEADER_SIZE + payload_len);

        let crc = crc16(&self.scratch);
        self.scratch.put_u16_le(crc);

        trace!(id = T::OBJECT_ID, len = payload_len, "object frame sent");
        if self.port.write(&self.scratch) {
            Ok(())
        } else {
            Err(SendError::WriteFailed)
        }
    }
}
