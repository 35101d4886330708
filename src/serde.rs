//! JSON-(de)serializable layout definitions.
//!
//! These types describe the *shape* of a layout. They are intended to be
//! loaded from JSON (for example a schema file shipped with your
//! application) and then compiled into core `abicraft` types with
//! [LayoutDef::compile].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    errors::BuildError,
    field::{DeclTy, Endian, FieldDecl, LayoutKind, Scalar},
    layout::{Layout, LayoutBuilder},
};

/// Top-level layout definition: kind, byte order, pack and ordered fields.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LayoutDef {
    pub name: String,
    #[serde(default)]
    pub kind: KindDef,
    #[serde(default)]
    pub endian: EndianDef,
    #[serde(default = "default_pack")]
    pub pack: usize,
    pub fields: Vec<FieldDef>,
}

fn default_pack() -> usize {
    1
}

/// Struct or union.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub enum KindDef {
    #[default]
    Struct,
    Union,
}

/// Byte order for multi-byte scalars; defaults to little endian.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub enum EndianDef {
    #[default]
    Little,
    Big,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Field name; must be unique within the layout.
    pub name: String,
    pub ty: TyDef,
    /// Optional declared bit width marking a bitfield member.
    #[serde(default)]
    pub bits: Option<u32>,
}

/// Declared field type. Nested definitions are compiled into their own
/// layouts, so two fields using the same inline definition get two distinct
/// layout identities.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum TyDef {
    Scalar { scalar: ScalarDef },
    Nested { layout: LayoutDef },
    Array { elem: Box<TyDef>, len: usize },
}

/// Scalar kind names as they appear in definition files.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub enum ScalarDef {
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

impl From<ScalarDef> for Scalar {
    fn from(value: ScalarDef) -> Self {
        match value {
            ScalarDef::U8 => Scalar::U8,
            ScalarDef::U16 => Scalar::U16,
            ScalarDef::U32 => Scalar::U32,
            ScalarDef::U64 => Scalar::U64,
            ScalarDef::I8 => Scalar::I8,
            ScalarDef::I16 => Scalar::I16,
            ScalarDef::I32 => Scalar::I32,
            ScalarDef::I64 => Scalar::I64,
            ScalarDef::F32 => Scalar::F32,
            ScalarDef::F64 => Scalar::F64,
        }
    }
}

impl From<KindDef> for LayoutKind {
    fn from(value: KindDef) -> Self {
        match value {
            KindDef::Struct => LayoutKind::Struct,
            KindDef::Union => LayoutKind::Union,
        }
    }
}

impl From<EndianDef> for Endian {
    fn from(value: EndianDef) -> Self {
        match value {
            EndianDef::Little => Endian::Little,
            EndianDef::Big => Endian::Big,
        }
    }
}

impl LayoutDef {
    /// Compiles this definition, and every nested definition, into a layout.
    pub fn compile(&self) -> Result<Arc<Layout>, BuildError> {
        let mut builder = LayoutBuilder::new(self.name.clone(), self.kind.into())
            .endian(self.endian.into())
            .pack(self.pack);
        for field in &self.fields {
            builder = builder.field(FieldDecl {
                name: field.name.clone(),
                ty: field.ty.to_decl()?,
                bits: field.bits,
            });
        }
        builder.compile()
    }
}

impl TyDef {
    fn to_decl(&self) -> Result<DeclTy, BuildError> {
        Ok(match self {
            TyDef::Scalar { scalar } => DeclTy::Scalar((*scalar).into()),
            TyDef::Nested { layout } => DeclTy::Nested(layout.compile()?),
            TyDef::Array { elem, len } => DeclTy::Array {
                elem: Box::new(elem.to_decl()?),
                len: *len,
            },
        })
    }
}
