use std::sync::Arc;

use crate::field::Scalar;
use crate::layout::Layout;

/// A field with resolved storage: its byte offset and resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    pub name: String,
    /// Byte offset of the field's storage unit. Union members are all 0.
    pub offset: usize,
    pub ty: FieldTy,
}

/// A resolved field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTy {
    Scalar(Scalar),
    /// Packed member of a bitfield group. `bit_offset` counts from the low
    /// bit of the base-width storage unit, regardless of byte order:
    /// first-declared members occupy the lowest bits.
    Bitfield {
        base: Scalar,
        bits: u32,
        bit_offset: u32,
    },
    Nested(Arc<Layout>),
    Array(ArrayTy),
}

/// Fixed-size array: `len` elements laid out back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTy {
    pub elem: ElemTy,
    pub len: usize,
}

/// Element type of an array field.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemTy {
    Scalar(Scalar),
    Nested(Arc<Layout>),
}

impl FieldTy {
    /// Byte size of the field's storage; bitfield members report their whole
    /// base-width unit.
    pub fn storage_size(&self) -> usize {
        match self {
            FieldTy::Scalar(scalar) => scalar.byte_size(),
            FieldTy::Bitfield { base, .. } => base.byte_size(),
            FieldTy::Nested(layout) => layout.size(),
            FieldTy::Array(array) => array.elem.size() * array.len,
        }
    }

    pub(crate) fn align(&self) -> usize {
        match self {
            FieldTy::Scalar(scalar) => scalar.byte_size(),
            FieldTy::Bitfield { base, .. } => base.byte_size(),
            FieldTy::Nested(layout) => layout.align(),
            FieldTy::Array(array) => array.elem.align(),
        }
    }
}

impl ElemTy {
    /// Byte size of one element, which is also the array stride.
    pub fn size(&self) -> usize {
        match self {
            ElemTy::Scalar(scalar) => scalar.byte_size(),
            ElemTy::Nested(layout) => layout.size(),
        }
    }

    pub(crate) fn align(&self) -> usize {
        match self {
            ElemTy::Scalar(scalar) => scalar.byte_size(),
            ElemTy::Nested(layout) => layout.align(),
        }
    }
}
