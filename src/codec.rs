//! Encoding and decoding between instances and wire-format byte buffers.

use crate::{
    bits,
    compiled::{CompiledField, ElemTy, FieldTy},
    errors::DecodeError,
    field::{Endian, Scalar},
    instance::{Instance, Repr},
    value::Value,
};

impl Instance {
    /// Encodes the instance into its wire representation: exactly
    /// `layout.size()` bytes, padding zeroed. Never fails; every stored value
    /// was validated on assignment.
    ///
    /// A union encodes as a copy of its backing buffer, reflecting whichever
    /// members were last written.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];
        self.encode_into(&mut buf);
        buf
    }

    pub(crate) fn encode_into(&self, buf: &mut [u8]) {
        match &self.repr {
            Repr::Bytes(bytes) => buf.copy_from_slice(bytes),
            Repr::Fields(slots) => {
                let endian = self.layout.endian();
                for (field, slot) in self.layout.fields.iter().zip(slots) {
                    write_field_at(buf, field, endian, slot);
                }
            }
        }
    }

    /// Decodes `data` into the instance, all-or-nothing: if `data` is shorter
    /// than `layout.size()` the instance is left untouched. Extra bytes are
    /// ignored.
    pub fn decode(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        let needed = self.size();
        if data.len() < needed {
            return Err(DecodeError::InsufficientData {
                needed,
                got: data.len(),
            });
        }
        self.decode_unchecked(&data[..needed]);
        Ok(())
    }

    pub(crate) fn decode_unchecked(&mut self, data: &[u8]) {
        let endian = self.layout.endian();
        match &mut self.repr {
            Repr::Bytes(bytes) => bytes.copy_from_slice(data),
            Repr::Fields(slots) => {
                for (index, field) in self.layout.fields.iter().enumerate() {
                    slots[index] = read_field_at(data, field, endian);
                }
            }
        }
    }
}

/// Reads one field out of `data`, which must span the whole layout the field
/// belongs to.
pub(crate) fn read_field_at(data: &[u8], field: &CompiledField, endian: Endian) -> Value {
    match &field.ty {
        FieldTy::Scalar(scalar) => read_scalar(data, field.offset, *scalar, endian),
        FieldTy::Bitfield {
            base,
            bits,
            bit_offset,
        } => {
            let unit = bits::read_uint(data, field.offset, base.byte_size(), endian);
            let raw = (unit >> bit_offset) & bits::mask(*bits);
            if base.is_signed() {
                Value::I64(bits::sign_extend(raw, *bits))
            } else {
                Value::U64(raw)
            }
        }
        FieldTy::Nested(layout) => {
            let mut nested = Instance::zeroed(layout);
            nested.decode_unchecked(&data[field.offset..field.offset + layout.size()]);
            Value::Nested(nested)
        }
        FieldTy::Array(array) => {
            let stride = array.elem.size();
            let values = (0..array.len)
                .map(|i| read_elem(data, field.offset + i * stride, &array.elem, endian))
                .collect();
            Value::Array(values)
        }
    }
}

/// Writes one normalized field value into `buf`. Bitfield members only touch
/// their own bits of the shared storage unit.
pub(crate) fn write_field_at(buf: &mut [u8], field: &CompiledField, endian: Endian, value: &Value) {
    match &field.ty {
        FieldTy::Scalar(scalar) => write_scalar(buf, field.offset, *scalar, endian, value),
        FieldTy::Bitfield {
            base,
            bits,
            bit_offset,
        } => {
            let size = base.byte_size();
            let unit = bits::read_uint(buf, field.offset, size, endian);
            let raw = int_bits(value) & bits::mask(*bits);
            let cleared = unit & !(bits::mask(*bits) << bit_offset);
            bits::write_uint(buf, field.offset, size, endian, cleared | (raw << bit_offset));
        }
        FieldTy::Nested(layout) => {
            if let Value::Nested(instance) = value {
                instance.encode_into(&mut buf[field.offset..field.offset + layout.size()]);
            }
        }
        FieldTy::Array(array) => {
            if let Value::Array(values) = value {
                let stride = array.elem.size();
                for (i, item) in values.iter().enumerate() {
                    write_elem(buf, field.offset + i * stride, &array.elem, endian, item);
                }
            }
        }
    }
}

fn read_scalar(data: &[u8], offset: usize, scalar: Scalar, endian: Endian) -> Value {
    let raw = bits::read_uint(data, offset, scalar.byte_size(), endian);
    match scalar {
        Scalar::F32 => Value::F32(f32::from_bits(raw as u32)),
        Scalar::F64 => Value::F64(f64::from_bits(raw)),
        s if s.is_signed() => Value::I64(bits::sign_extend(raw, s.bit_size())),
        _ => Value::U64(raw),
    }
}

fn write_scalar(buf: &mut [u8], offset: usize, scalar: Scalar, endian: Endian, value: &Value) {
    let raw = match (scalar, value) {
        (Scalar::F32, Value::F32(x)) => x.to_bits() as u64,
        (Scalar::F64, Value::F64(x)) => x.to_bits(),
        _ => int_bits(value) & bits::mask(scalar.bit_size()),
    };
    bits::write_uint(buf, offset, scalar.byte_size(), endian, raw);
}

fn read_elem(data: &[u8], offset: usize, elem: &ElemTy, endian: Endian) -> Value {
    match elem {
        ElemTy::Scalar(scalar) => read_scalar(data, offset, *scalar, endian),
        ElemTy::Nested(layout) => {
            let mut nested = Instance::zeroed(layout);
            nested.decode_unchecked(&data[offset..offset + layout.size()]);
            Value::Nested(nested)
        }
    }
}

fn write_elem(buf: &mut [u8], offset: usize, elem: &ElemTy, endian: Endian, value: &Value) {
    match elem {
        ElemTy::Scalar(scalar) => write_scalar(buf, offset, *scalar, endian, value),
        ElemTy::Nested(layout) => {
            if let Value::Nested(instance) = value {
                instance.encode_into(&mut buf[offset..offset + layout.size()]);
            }
        }
    }
}

// Slots are normalized on assignment; other variants cannot reach here.
fn int_bits(value: &Value) -> u64 {
    match value {
        Value::U64(v) => *v,
        Value::I64(v) => *v as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::errors::DecodeError;
    use crate::field::DeclTy;
    use crate::layout::{Layout, LayoutBuilder};

    fn sample(endian: Endian) -> Arc<Layout> {
        LayoutBuilder::new_struct("S")
            .endian(endian)
            .scalar("a", Scalar::U16)
            .scalar("b", Scalar::U8)
            .scalar("c", Scalar::U8)
            .compile()
            .unwrap()
    }

    fn sample_instance(layout: &Arc<Layout>) -> Instance {
        Instance::with_named(
            layout,
            vec![
                ("a", Value::U64(0xFFAA)),
                ("b", Value::U64(1)),
                ("c", Value::U64(2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_struct_little_endian() {
        let layout = sample(Endian::Little);
        assert_eq!(
            sample_instance(&layout).encode(),
            vec![0xAA, 0xFF, 0x01, 0x02]
        );
    }

    #[test]
    fn test_encode_struct_big_endian() {
        let layout = sample(Endian::Big);
        assert_eq!(
            sample_instance(&layout).encode(),
            vec![0xFF, 0xAA, 0x01, 0x02]
        );
    }

    #[test]
    fn test_decode_struct_little_endian() {
        let layout = sample(Endian::Little);
        let mut instance = sample_instance(&layout);
        instance.decode(&[0xCC, 0xBB, 0x11, 0x22]).unwrap();
        assert_eq!(instance.get("a").unwrap(), Value::U64(0xBBCC));
        assert_eq!(instance.get("b").unwrap(), Value::U64(0x11));
        assert_eq!(instance.get("c").unwrap(), Value::U64(0x22));
    }

    #[test]
    fn test_decode_struct_big_endian() {
        let layout = sample(Endian::Big);
        let mut instance = sample_instance(&layout);
        instance.decode(&[0xCC, 0xBB, 0x11, 0x22]).unwrap();
        assert_eq!(instance.get("a").unwrap(), Value::U64(0xCCBB));
        assert_eq!(instance.get("b").unwrap(), Value::U64(0x11));
        assert_eq!(instance.get("c").unwrap(), Value::U64(0x22));
    }

    #[test]
    fn test_insufficient_data_leaves_instance_unchanged() {
        let layout = sample(Endian::Little);
        let mut instance = sample_instance(&layout);
        let err = instance.decode(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err, DecodeError::InsufficientData { needed: 4, got: 2 });
        assert_eq!(instance.get("a").unwrap(), Value::U64(0xFFAA));
        assert_eq!(instance.get("b").unwrap(), Value::U64(1));
    }

    fn bitfield_layout() -> Arc<Layout> {
        LayoutBuilder::new_struct("Flags")
            .bitfield("a", Scalar::U8, 2)
            .bitfield("b", Scalar::U8, 6)
            .compile()
            .unwrap()
    }

    #[test]
    fn test_bitfield_encode() {
        let layout = bitfield_layout();
        let instance =
            Instance::with_values(&layout, vec![Value::U64(3), Value::U64(63)]).unwrap();
        assert_eq!(instance.encode(), vec![0xFF]);

        let instance =
            Instance::with_values(&layout, vec![Value::U64(1), Value::U64(4)]).unwrap();
        assert_eq!(instance.encode(), vec![0x11]);
    }

    #[test]
    fn test_bitfield_decode() {
        let layout = bitfield_layout();
        let mut instance = Instance::zeroed(&layout);

        instance.decode(&[0xFF]).unwrap();
        assert_eq!(instance.get("a").unwrap(), Value::U64(3));
        assert_eq!(instance.get("b").unwrap(), Value::U64(63));

        instance.decode(&[0x81]).unwrap();
        assert_eq!(instance.get("a").unwrap(), Value::U64(1));
        assert_eq!(instance.get("b").unwrap(), Value::U64(32));
    }

    #[test]
    fn test_signed_bitfield_roundtrip() {
        let layout = LayoutBuilder::new_struct("S")
            .bitfield("a", Scalar::I8, 4)
            .bitfield("b", Scalar::I8, 4)
            .compile()
            .unwrap();
        let instance =
            Instance::with_values(&layout, vec![Value::I64(-2), Value::I64(3)]).unwrap();
        assert_eq!(instance.encode(), vec![0x3E]);

        let mut decoded = Instance::zeroed(&layout);
        decoded.decode(&[0x3E]).unwrap();
        assert_eq!(decoded.get("a").unwrap(), Value::I64(-2));
        assert_eq!(decoded.get("b").unwrap(), Value::I64(3));
    }

    #[test]
    fn test_union_type_punning() {
        let sl = sample(Endian::Little);
        let union_layout = LayoutBuilder::new_union("U")
            .nested("sl", &sl)
            .scalar("raw", Scalar::U32)
            .compile()
            .unwrap();

        let sl_value = sample_instance(&sl);
        let union_instance =
            Instance::with_named(&union_layout, vec![("sl", Value::Nested(sl_value.clone()))])
                .unwrap();
        assert_eq!(union_instance.get("raw").unwrap(), Value::U64(0x0201FFAA));
        assert_eq!(union_instance.encode(), sl_value.encode());
        assert_eq!(union_instance.size(), 4);
    }

    #[test]
    fn test_union_decode() {
        let sl = sample(Endian::Little);
        let union_layout = LayoutBuilder::new_union("U")
            .nested("sl", &sl)
            .scalar("raw", Scalar::U32)
            .compile()
            .unwrap();

        let mut union_instance = Instance::zeroed(&union_layout);
        union_instance.decode(&[0x87, 0x65, 0x43, 0x21]).unwrap();

        let Value::Nested(view) = union_instance.get("sl").unwrap() else {
            panic!("expected nested view");
        };
        assert_eq!(view.get("a").unwrap(), Value::U64(0x6587));
        assert_eq!(view.get("b").unwrap(), Value::U64(0x43));
        assert_eq!(view.get("c").unwrap(), Value::U64(0x21));
        assert_eq!(union_instance.get("raw").unwrap(), Value::U64(0x21436587));
    }

    #[test]
    fn test_union_member_write_reflects_in_others() {
        let union_layout = LayoutBuilder::new_union("U")
            .scalar("word", Scalar::U32)
            .scalar("byte", Scalar::U8)
            .compile()
            .unwrap();
        let mut instance = Instance::zeroed(&union_layout);
        instance.set("word", Value::U64(0xDEADBEEF)).unwrap();
        assert_eq!(instance.get("byte").unwrap(), Value::U64(0xEF));

        instance.set("byte", Value::U64(0x00)).unwrap();
        assert_eq!(instance.get("word").unwrap(), Value::U64(0xDEADBE00));
    }

    #[test]
    fn test_nested_struct_roundtrip() {
        let inner = LayoutBuilder::new_struct("Inner")
            .scalar("a", Scalar::U8)
            .scalar("b", Scalar::U8)
            .compile()
            .unwrap();
        let outer = LayoutBuilder::new_struct("Outer")
            .nested("first", &inner)
            .scalar("second", Scalar::U8)
            .compile()
            .unwrap();

        let first = Instance::with_values(&inner, vec![Value::U64(1), Value::U64(2)]).unwrap();
        let mut instance = Instance::with_named(
            &outer,
            vec![("first", Value::Nested(first)), ("second", Value::U64(3))],
        )
        .unwrap();
        assert_eq!(instance.encode(), vec![0x01, 0x02, 0x03]);

        instance.decode(&[0x11, 0x22, 0x33]).unwrap();
        let Value::Nested(first) = instance.get("first").unwrap() else {
            panic!("expected nested value");
        };
        assert_eq!(first.get("a").unwrap(), Value::U64(0x11));
        assert_eq!(first.get("b").unwrap(), Value::U64(0x22));
        assert_eq!(instance.get("second").unwrap(), Value::U64(0x33));
    }

    #[test]
    fn test_nested_keeps_own_endianness() {
        let inner = LayoutBuilder::new_struct("Inner")
            .endian(Endian::Big)
            .scalar("v", Scalar::U16)
            .compile()
            .unwrap();
        let outer = LayoutBuilder::new_struct("Outer")
            .endian(Endian::Little)
            .scalar("head", Scalar::U16)
            .nested("inner", &inner)
            .compile()
            .unwrap();

        let mut inner_value = Instance::zeroed(&inner);
        inner_value.set("v", Value::U64(0x1234)).unwrap();
        let mut instance = Instance::zeroed(&outer);
        instance.set("head", Value::U64(0x1234)).unwrap();
        instance.set("inner", Value::Nested(inner_value)).unwrap();

        assert_eq!(instance.encode(), vec![0x34, 0x12, 0x12, 0x34]);
    }

    #[test]
    fn test_float_roundtrip() {
        let layout = LayoutBuilder::new_struct("F")
            .scalar("x", Scalar::F32)
            .scalar("y", Scalar::F64)
            .compile()
            .unwrap();
        let instance =
            Instance::with_values(&layout, vec![Value::F32(1.5), Value::F64(-0.25)]).unwrap();
        let mut decoded = Instance::zeroed(&layout);
        decoded.decode(&instance.encode()).unwrap();
        assert_eq!(decoded.get("x").unwrap(), Value::F32(1.5));
        assert_eq!(decoded.get("y").unwrap(), Value::F64(-0.25));
    }

    #[test]
    fn test_float_encoding_bytes() {
        let layout = LayoutBuilder::new_struct("F")
            .scalar("x", Scalar::F32)
            .compile()
            .unwrap();
        let mut instance = Instance::zeroed(&layout);
        instance.set("x", Value::F32(1.5)).unwrap();
        // 1.5f32 = 0x3FC00000
        assert_eq!(instance.encode(), vec![0x00, 0x00, 0xC0, 0x3F]);
    }

    #[test]
    fn test_array_roundtrip() {
        let layout = LayoutBuilder::new_struct("A")
            .array("data", DeclTy::Scalar(Scalar::U16), 3)
            .compile()
            .unwrap();
        let instance = Instance::with_values(
            &layout,
            vec![Value::Array(vec![
                Value::U64(0x0102),
                Value::U64(0x0304),
                Value::U64(0x0506),
            ])],
        )
        .unwrap();
        assert_eq!(
            instance.encode(),
            vec![0x02, 0x01, 0x04, 0x03, 0x06, 0x05]
        );

        let mut decoded = Instance::zeroed(&layout);
        decoded.decode(&instance.encode()).unwrap();
        assert_eq!(decoded.get("data").unwrap(), instance.get("data").unwrap());
    }

    #[test]
    fn test_padding_bytes_stay_zero() {
        let layout = LayoutBuilder::new_struct("P")
            .pack(4)
            .scalar("a", Scalar::U8)
            .scalar("b", Scalar::U32)
            .compile()
            .unwrap();
        let mut instance = Instance::zeroed(&layout);
        instance.set("a", Value::U64(0xFF)).unwrap();
        instance.set("b", Value::U64(0xAABBCCDD)).unwrap();
        assert_eq!(
            instance.encode(),
            vec![0xFF, 0x00, 0x00, 0x00, 0xDD, 0xCC, 0xBB, 0xAA]
        );
    }

    #[test]
    fn test_roundtrip_all_scalars() {
        for endian in [Endian::Little, Endian::Big] {
            let layout = LayoutBuilder::new_struct("All")
                .endian(endian)
                .scalar("a", Scalar::U8)
                .scalar("b", Scalar::I16)
                .scalar("c", Scalar::U32)
                .scalar("d", Scalar::I64)
                .scalar("e", Scalar::U64)
                .compile()
                .unwrap();
            let original = Instance::with_values(
                &layout,
                vec![
                    Value::U64(0xAB),
                    Value::I64(-12345),
                    Value::U64(0xDEADBEEF),
                    Value::I64(i64::MIN),
                    Value::U64(u64::MAX),
                ],
            )
            .unwrap();
            let mut decoded = Instance::zeroed(&layout);
            decoded.decode(&original.encode()).unwrap();
            assert_eq!(decoded, original);
        }
    }
}
