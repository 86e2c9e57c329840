//! Payload deserializer.
//!
//! Reads the wire encoding back out of a byte slice. The format is not
//! self-describing, so the requested type drives every read; anything the
//! encoder refuses to write, this refuses to read. The decoder tracks how
//! many bytes it consumed so the receive path can verify the payload
//! length field against reality.

use serde::de::{self, DeserializeSeed, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::{CodecError, CodecResult};

/// Deserialize a `T` from the front of `input`.
///
/// Returns the value together with the number of bytes consumed. Trailing
/// bytes are not an error here — the caller owns that policy.
pub fn decode<'de, T>(input: &'de [u8]) -> CodecResult<(T, usize)>
where
    T: Deserialize<'de>,
{
    let mut decoder = Decoder::new(input);
    let value = T::deserialize(&mut decoder)?;
    Ok((value, decoder.consumed()))
}

/// Cursor over an encoded payload.
pub struct Decoder<'de> {
    input: &'de [u8],
    pos: usize,
}

impl<'de> Decoder<'de> {
    /// Create a decoder over `input`.
    pub fn new(input: &'de [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn take(&mut self, count: usize) -> CodecResult<&'de [u8]> {
        if self.input.len() - self.pos < count {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.input[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> CodecResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a `u16` length/count prefix.
    fn read_len(&mut self) -> CodecResult<usize> {
        Ok(self.read_u16()? as usize)
    }
}

/// Sequence access bounded by an element count read from the wire (or, for
/// structs, fixed by the field list).
struct Counted<'a, 'de> {
    de: &'a mut Decoder<'de>,
    remaining: usize,
}

impl<'a, 'de> SeqAccess<'de> for Counted<'a, 'de> {
    type Error = CodecError;

    fn next_element_seed<T>(&mut self, seed: T) -> CodecResult<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'a, 'de> de::Deserializer<'de> for &'a mut Decoder<'de> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> CodecResult<V::Value> {
        Err(CodecError::Unsupported("self-describing value"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_bool(self.read_u8()? != 0)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_i8(self.read_u8()? as i8)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_i16(self.read_u16()? as i16)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_i32(self.read_u32()? as i32)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_i64(self.read_u64()? as i64)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_u8(self.read_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_u16(self.read_u16()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_u32(self.read_u32()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_u64(self.read_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_f32(f32::from_bits(self.read_u32()?))
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_f64(f64::from_bits(self.read_u64()?))
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        let raw = self.read_u32()?;
        let c = char::from_u32(raw).ok_or(CodecError::InvalidChar(raw))?;
        visitor.visit_char(c)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        visitor.visit_borrowed_str(s)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        let len = self.read_len()?;
        visitor.visit_borrowed_bytes(self.take(len)?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, _visitor: V) -> CodecResult<V::Value> {
        Err(CodecError::Unsupported("Option"))
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> CodecResult<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> CodecResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> CodecResult<V::Value> {
        let count = self.read_len()?;
        visitor.visit_seq(Counted {
            de: self,
            remaining: count,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> CodecResult<V::Value> {
        let stored = self.read_len()?;
        if stored != len {
            return Err(CodecError::SequenceLengthMismatch {
                expected: len,
                found: stored,
            });
        }
        visitor.visit_seq(Counted {
            de: self,
            remaining: len,
        })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> CodecResult<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> CodecResult<V::Value> {
        Err(CodecError::Unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> CodecResult<V::Value> {
        visitor.visit_seq(Counted {
            de: self,
            remaining: fields.len(),
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> CodecResult<V::Value> {
        Err(CodecError::Unsupported("enum"))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> CodecResult<V::Value> {
        Err(CodecError::Unsupported("identifier"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> CodecResult<V::Value> {
        // Nothing on the wire says how long a skipped value would be.
        Err(CodecError::Unsupported("ignored value"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}
