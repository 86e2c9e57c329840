//! Payload serializer.
//!
//! Writes the wire encoding of a record into any [`BufMut`]: scalars as raw
//! little-endian bytes, strings and sequences behind a `u16` length/count,
//! struct fields back to back in declaration order. [`SizeEncoder`] walks
//! the same shapes without producing bytes so the frame length can be
//! checked before anything touches the scratch buffer; the two must agree
//! byte for byte.

use bytes::BufMut;
use serde::{ser, Serialize};

use crate::error::{CodecError, CodecResult};

/// Serialize `value` into `out` using the wire encoding.
pub fn encode<T, B>(value: &T, out: &mut B) -> CodecResult<()>
where
    T: Serialize + ?Sized,
    B: BufMut,
{
    value.serialize(&mut Encoder { out })
}

/// Serialize `value` into a fresh `Vec<u8>`.
pub fn encode_to_vec<T>(value: &T) -> CodecResult<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut out = Vec::new();
    encode(value, &mut out)?;
    Ok(out)
}

/// Compute the exact number of bytes [`encode`] would produce.
///
/// Mirrors the encoder shape for shape, including its failure cases: any
/// value this accepts, `encode` accepts, and vice versa.
pub fn encoded_size<T>(value: &T) -> CodecResult<usize>
where
    T: Serialize + ?Sized,
{
    let mut sizer = SizeEncoder { total: 0 };
    value.serialize(&mut sizer)?;
    Ok(sizer.total)
}

/// Convert a host length into the 16-bit wire count.
fn wire_len(len: usize) -> CodecResult<u16> {
    u16::try_from(len).map_err(|_| CodecError::LengthOverflow(len))
}

struct Encoder<'a, B> {
    out: &'a mut B,
}

/// In-progress sequence, tuple, or struct.
struct Compound<'a, 'b, B> {
    enc: &'b mut Encoder<'a, B>,
}

impl<'a, 'b, B: BufMut> ser::Serializer for &'b mut Encoder<'a, B> {
    type Ok = ();
    type Error = CodecError;

    type SerializeSeq = Compound<'a, 'b, B>;
    type SerializeTuple = Compound<'a, 'b, B>;
    type SerializeTupleStruct = Compound<'a, 'b, B>;
    type SerializeTupleVariant = ser::Impossible<(), CodecError>;
    type SerializeMap = ser::Impossible<(), CodecError>;
    type SerializeStruct = Compound<'a, 'b, B>;
    type SerializeStructVariant = ser::Impossible<(), CodecError>;

    fn serialize_bool(self, v: bool) -> CodecResult<()> {
        self.out.put_u8(v as u8);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> CodecResult<()> {
        self.out.put_i8(v);
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> CodecResult<()> {
        self.out.put_i16_le(v);
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> CodecResult<()> {
        self.out.put_i32_le(v);
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> CodecResult<()> {
        self.out.put_i64_le(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> CodecResult<()> {
        self.out.put_u8(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> CodecResult<()> {
        self.out.put_u16_le(v);
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> CodecResult<()> {
        self.out.put_u32_le(v);
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> CodecResult<()> {
        self.out.put_u64_le(v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> CodecResult<()> {
        self.out.put_f32_le(v);
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> CodecResult<()> {
        self.out.put_f64_le(v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> CodecResult<()> {
        self.out.put_u32_le(v as u32);
        Ok(())
    }

    fn serialize_str(self, v: &str) -> CodecResult<()> {
        self.out.put_u16_le(wire_len(v.len())?);
        self.out.put_slice(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> CodecResult<()> {
        self.out.put_u16_le(wire_len(v.len())?);
        self.out.put_slice(v);
        Ok(())
    }

    fn serialize_none(self) -> CodecResult<()> {
        Err(CodecError::Unsupported("Option"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> CodecResult<()> {
        Err(CodecError::Unsupported("Option"))
    }

    fn serialize_unit(self) -> CodecResult<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> CodecResult<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> CodecResult<()> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> CodecResult<()> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> CodecResult<Self::SerializeSeq> {
        let len = len.ok_or(CodecError::Unsupported("sequence of unknown length"))?;
        self.out.put_u16_le(wire_len(len)?);
        Ok(Compound { enc: self })
    }

    fn serialize_tuple(self, len: usize) -> CodecResult<Self::SerializeTuple> {
        // Fixed-length sequences carry their (redundant) count on the wire.
        self.out.put_u16_le(wire_len(len)?);
        Ok(Compound { enc: self })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> CodecResult<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeTupleVariant> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> CodecResult<Self::SerializeMap> {
        Err(CodecError::Unsupported("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStruct> {
        Ok(Compound { enc: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStructVariant> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl<'a, 'b, B: BufMut> ser::SerializeSeq for Compound<'a, 'b, B> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a, 'b, B: BufMut> ser::SerializeTuple for Compound<'a, 'b, B> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a, 'b, B: BufMut> ser::SerializeTupleStruct for Compound<'a, 'b, B> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a, 'b, B: BufMut> ser::SerializeStruct for Compound<'a, 'b, B> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

/// Byte-counting twin of [`Encoder`].
struct SizeEncoder {
    total: usize,
}

/// In-progress compound for the counting pass.
struct SizeCompound<'a> {
    enc: &'a mut SizeEncoder,
}

impl<'a> ser::Serializer for &'a mut SizeEncoder {
    type Ok = ();
    type Error = CodecError;

    type SerializeSeq = SizeCompound<'a>;
    type SerializeTuple = SizeCompound<'a>;
    type SerializeTupleStruct = SizeCompound<'a>;
    type SerializeTupleVariant = ser::Impossible<(), CodecError>;
    type SerializeMap = ser::Impossible<(), CodecError>;
    type SerializeStruct = SizeCompound<'a>;
    type SerializeStructVariant = ser::Impossible<(), CodecError>;

    fn serialize_bool(self, _v: bool) -> CodecResult<()> {
        self.total += 1;
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> CodecResult<()> {
        self.total += 1;
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> CodecResult<()> {
        self.total += 2;
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> CodecResult<()> {
        self.total += 4;
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> CodecResult<()> {
        self.total += 8;
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> CodecResult<()> {
        self.total += 1;
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> CodecResult<()> {
        self.total += 2;
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> CodecResult<()> {
        self.total += 4;
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> CodecResult<()> {
        self.total += 8;
        Ok(())
    }

    fn serialize_f32(self, _v: f32) -> CodecResult<()> {
        self.total += 4;
        Ok(())
    }

    fn serialize_f64(self, _v: f64) -> CodecResult<()> {
        self.total += 8;
        Ok(())
    }

    fn serialize_char(self, _v: char) -> CodecResult<()> {
        self.total += 4;
        Ok(())
    }

    fn serialize_str(self, v: &str) -> CodecResult<()> {
        wire_len(v.len())?;
        self.total += 2 + v.len();
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> CodecResult<()> {
        wire_len(v.len())?;
        self.total += 2 + v.len();
        Ok(())
    }

    fn serialize_none(self) -> CodecResult<()> {
        Err(CodecError::Unsupported("Option"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> CodecResult<()> {
        Err(CodecError::Unsupported("Option"))
    }

    fn serialize_unit(self) -> CodecResult<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> CodecResult<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> CodecResult<()> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> CodecResult<()> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> CodecResult<Self::SerializeSeq> {
        let len = len.ok_or(CodecError::Unsupported("sequence of unknown length"))?;
        wire_len(len)?;
        self.total += 2;
        Ok(SizeCompound { enc: self })
    }

    fn serialize_tuple(self, len: usize) -> CodecResult<Self::SerializeTuple> {
        wire_len(len)?;
        self.total += 2;
        Ok(SizeCompound { enc: self })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> CodecResult<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeTupleVariant> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> CodecResult<Self::SerializeMap> {
        Err(CodecError::Unsupported("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStruct> {
        Ok(SizeCompound { enc: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CodecResult<Self::SerializeStructVariant> {
        Err(CodecError::Unsupported("enum variant"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl<'a> ser::SerializeSeq for SizeCompound<'a> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for SizeCompound<'a> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for SizeCompound<'a> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for SizeCompound<'a> {
    type Ok = ();
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> CodecResult<()> {
        value.serialize(&mut *self.enc)
    }

    fn end(self) -> CodecResult<()> {
        Ok(())
    }
}
