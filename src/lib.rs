//! # serimux
//!
//! Multiplexes two kinds of traffic over a single byte-oriented serial
//! link without a second channel:
//!
//! - **Generic bytes** — free-form data such as human-readable log output.
//! - **Objects** — typed, length- and CRC-framed records of user-defined
//!   data structures.
//!
//! The receiver pulls object frames out of the stream while recovering the
//! interleaved generic bytes, using a fixed-capacity circular buffer fed
//! from an opaque [`SerialPort`]. Everything is synchronous and allocation
//! happens once at construction, so the engine suits embedded targets as
//! well as host-side tooling.
//!
//! ## Wire format
//!
//! ```text
//! ┌────────────┬───────────┬───────────┬───────────┬──────────┐
//! │ Marker     │ Object ID │ Length L  │ Payload   │ CRC-16   │
//! │ 0x02 0x42  │ int16 LE  │ uint16 LE │ L bytes   │ LE       │
//! └────────────┴───────────┴───────────┴───────────┴──────────┘
//! ```
//!
//! Anything between frames is generic data. Payloads are encoded by the
//! schema-driven [`codec`] straight from the type's serde derive.
//!
//! ## Example
//!
//! ```
//! use serde::{Serialize, Deserialize};
//! use serimux::{Link, MemoryPort, OverwritePolicy, WireObject};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Reading {
//!     id: i32,
//!     value: f32,
//! }
//!
//! impl WireObject for Reading {
//!     const OBJECT_ID: i16 = 1;
//! }
//!
//! let (device_port, host_port) = MemoryPort::pair();
//! let mut device = Link::new(device_port);
//! let mut host = Link::new(host_port);
//!
//! device.send_object(&Reading { id: 42, value: 3.14 }).unwrap();
//!
//! host.ingest(OverwritePolicy::Overwrite);
//! assert!(host.has_object());
//! assert_eq!(host.object_id(), Some(1));
//!
//! let reading: Reading = host.read_object().unwrap();
//! assert_eq!(reading, Reading { id: 42, value: 3.14 });
//! ```

pub mod buffer;
pub mod codec;
pub mod error;
pub mod link;
pub mod protocol;
pub mod transport;

mod object;

pub use error::{CodecError, CodecResult, ReadError, SendError};
pub use link::{Link, LinkConfig, OverwritePolicy, DEFAULT_BUFFER_CAPACITY};
pub use object::WireObject;
pub use transport::{ByteQueue, MemoryPort, SerialPort};
