//! Declaration-side types used to build a [crate::layout::Layout].

use std::fmt;
use std::sync::Arc;

use crate::layout::Layout;

/// Primitive scalar kinds: fixed-width integers and IEEE 754 floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Scalar {
    /// Storage size in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Scalar::U8 | Scalar::I8 => 1,
            Scalar::U16 | Scalar::I16 => 2,
            Scalar::U32 | Scalar::I32 | Scalar::F32 => 4,
            Scalar::U64 | Scalar::I64 | Scalar::F64 => 8,
        }
    }

    /// Storage size in bits.
    pub fn bit_size(self) -> u32 {
        self.byte_size() as u32 * 8
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Scalar::I8 | Scalar::I16 | Scalar::I32 | Scalar::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::F32 | Scalar::F64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// Short type tag like `u8`, `s16` or `f32`.
    pub fn short_name(self) -> &'static str {
        match self {
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::I8 => "s8",
            Scalar::I16 => "s16",
            Scalar::I32 => "s32",
            Scalar::I64 => "s64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Byte order used when encoding and decoding multi-byte scalars.
///
/// Always an explicit build-time parameter with a fixed default of
/// [Endian::Little]; it is never derived from the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Whether a layout's fields occupy sequential storage or all alias offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Struct,
    Union,
}

/// A declared, not yet resolved field type.
#[derive(Debug, Clone)]
pub enum DeclTy {
    Scalar(Scalar),
    /// Reference to an already compiled layout.
    Nested(Arc<Layout>),
    /// Fixed-size array of scalars or nested layouts.
    Array { elem: Box<DeclTy>, len: usize },
}

/// A single named field declaration, in the order the layout is built from.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: DeclTy,
    /// Declared bit width; `Some` marks a bitfield over an integer scalar base.
    pub bits: Option<u32>,
}

impl FieldDecl {
    pub fn scalar(name: impl Into<String>, scalar: Scalar) -> Self {
        FieldDecl {
            name: name.into(),
            ty: DeclTy::Scalar(scalar),
            bits: None,
        }
    }

    pub fn bitfield(name: impl Into<String>, base: Scalar, bits: u32) -> Self {
        FieldDecl {
            name: name.into(),
            ty: DeclTy::Scalar(base),
            bits: Some(bits),
        }
    }

    pub fn nested(name: impl Into<String>, layout: &Arc<Layout>) -> Self {
        FieldDecl {
            name: name.into(),
            ty: DeclTy::Nested(Arc::clone(layout)),
            bits: None,
        }
    }

    pub fn array(name: impl Into<String>, elem: DeclTy, len: usize) -> Self {
        FieldDecl {
            name: name.into(),
            ty: DeclTy::Array {
                elem: Box::new(elem),
                len,
            },
            bits: None,
        }
    }
}
