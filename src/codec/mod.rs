//! Codec module - schema-driven payload serialization.
//!
//! Record payloads cross the wire in a compact, non-self-describing
//! encoding driven entirely by the Rust type:
//!
//! - scalars (`bool`, integers up to 64 bits, floats, `char`) as raw
//!   little-endian bytes;
//! - strings and byte blobs as a `u16` length followed by the raw bytes;
//! - `Vec<T>` and other sequences as a `u16` element count followed by the
//!   elements;
//! - `[T; N]`, tuples, and tuple structs as a `u16` count (always `N`,
//!   redundant but checked on decode) followed by the elements;
//! - structs as their fields, in declaration order, concatenated.
//!
//! Maps, data-carrying enums, and `Option` have no wire shape and are
//! rejected with [`CodecError::Unsupported`](crate::CodecError). Fieldless
//! enums ride along as their integer representation via
//! `#[serde(into = "u8", try_from = "u8")]` on the user type.
//!
//! # Example
//!
//! ```
//! use serde::{Serialize, Deserialize};
//! use serimux::codec;
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Telemetry {
//!     seq: u32,
//!     rssi: [f32; 2],
//!     tag: String,
//! }
//!
//! let value = Telemetry { seq: 1, rssi: [-80.0, -71.5], tag: "ok".into() };
//!
//! let bytes = codec::encode_to_vec(&value).unwrap();
//! assert_eq!(bytes.len(), codec::encoded_size(&value).unwrap());
//!
//! let (back, consumed) = codec::decode::<Telemetry>(&bytes).unwrap();
//! assert_eq!(back, value);
//! assert_eq!(consumed, bytes.len());
//! ```

mod de;
mod ser;

pub use de::{decode, Decoder};
pub use ser::{encode, encode_to_vec, encoded_size};
