//! Layout compilation: ordered field declarations are resolved into an
//! immutable [Layout] with storage offsets, packed bitfield groups and a
//! total byte size.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    compiled::{ArrayTy, CompiledField, ElemTy, FieldTy},
    errors::BuildError,
    field::{DeclTy, Endian, FieldDecl, LayoutKind, Scalar},
};

/// A compiled layout: ordered fields with resolved storage offsets, total
/// byte size, pack parameter, byte order and struct/union kind.
///
/// Built once by [LayoutBuilder::compile] and never mutated afterwards; all
/// instances of a layout share it behind an [Arc], so unsynchronized
/// concurrent reads are safe.
#[derive(Debug, PartialEq)]
pub struct Layout {
    name: String,
    kind: LayoutKind,
    endian: Endian,
    pack: usize,
    size: usize,
    align: usize,
    /// Compiled fields in declaration order.
    pub fields: Vec<CompiledField>,
}

impl Layout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Byte order for this layout's scalar fields. Nested layouts keep their
    /// own byte order.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn pack(&self) -> usize {
        self.pack
    }

    /// Total byte size of the wire representation.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn align(&self) -> usize {
        self.align
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Collects ordered field declarations plus the build-time parameters
/// (kind, byte order, pack), then compiles them into a [Layout].
///
/// With the default `pack` of 1 a struct is fully packed: offsets are
/// sequential and the size is the sum of the storage sizes. A larger pack
/// caps each field's alignment at `min(natural alignment, pack)` and pads
/// between fields like C's `#pragma pack`.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    name: String,
    kind: LayoutKind,
    endian: Endian,
    pack: usize,
    fields: Vec<FieldDecl>,
}

/// Bitfield group being filled: base type, bits consumed so far, the byte
/// offset of its storage unit and the name of the last member seen.
struct OpenGroup {
    base: Scalar,
    consumed: u32,
    offset: usize,
    last: String,
}

impl LayoutBuilder {
    pub fn new(name: impl Into<String>, kind: LayoutKind) -> Self {
        LayoutBuilder {
            name: name.into(),
            kind,
            endian: Endian::default(),
            pack: 1,
            fields: Vec::new(),
        }
    }

    pub fn new_struct(name: impl Into<String>) -> Self {
        Self::new(name, LayoutKind::Struct)
    }

    pub fn new_union(name: impl Into<String>) -> Self {
        Self::new(name, LayoutKind::Union)
    }

    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn pack(mut self, pack: usize) -> Self {
        self.pack = pack;
        self
    }

    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    pub fn scalar(self, name: impl Into<String>, scalar: Scalar) -> Self {
        self.field(FieldDecl::scalar(name, scalar))
    }

    pub fn bitfield(self, name: impl Into<String>, base: Scalar, bits: u32) -> Self {
        self.field(FieldDecl::bitfield(name, base, bits))
    }

    pub fn nested(self, name: impl Into<String>, layout: &Arc<Layout>) -> Self {
        self.field(FieldDecl::nested(name, layout))
    }

    pub fn array(self, name: impl Into<String>, elem: DeclTy, len: usize) -> Self {
        self.field(FieldDecl::array(name, elem, len))
    }

    /// Compiles the declarations into an immutable layout. Fails without
    /// returning any partial layout if a declaration is invalid.
    pub fn compile(self) -> Result<Arc<Layout>, BuildError> {
        let LayoutBuilder {
            name,
            kind,
            endian,
            pack,
            fields: decls,
        } = self;

        if !pack.is_power_of_two() || pack > 16 {
            return Err(BuildError::InvalidPackValue(pack));
        }

        let mut fields: Vec<CompiledField> = Vec::with_capacity(decls.len());
        let mut names: HashSet<String> = HashSet::with_capacity(decls.len());
        let mut cursor = 0usize;
        let mut max_member = 0usize;
        let mut align = 1usize;
        let mut group: Option<OpenGroup> = None;
        let mut union_endian: Option<Endian> = None;

        for decl in decls {
            if decl.name.is_empty() {
                return Err(BuildError::InvalidFieldName);
            }
            if !names.insert(decl.name.clone()) {
                return Err(BuildError::DuplicateFieldName(decl.name));
            }

            if let Some(bits) = decl.bits {
                let base = match decl.ty {
                    DeclTy::Scalar(scalar) if scalar.is_integer() => scalar,
                    _ => {
                        return Err(BuildError::InvalidFieldType {
                            field: decl.name,
                            reason: "bitfields require an integer scalar base type",
                        });
                    }
                };
                if bits == 0 {
                    return Err(BuildError::InvalidFieldType {
                        field: decl.name,
                        reason: "bitfield width must be at least 1",
                    });
                }

                let mut open = match group.take() {
                    Some(open) if open.base != base => {
                        return Err(BuildError::MixedBitfieldBaseType {
                            field: decl.name,
                            expected: open.base,
                            found: base,
                        });
                    }
                    Some(open) => open,
                    None => {
                        let unit_align = base.byte_size().min(pack);
                        align = align.max(unit_align);
                        let offset = match kind {
                            LayoutKind::Struct => cursor.next_multiple_of(unit_align),
                            LayoutKind::Union => 0,
                        };
                        OpenGroup {
                            base,
                            consumed: 0,
                            offset,
                            last: String::new(),
                        }
                    }
                };

                let bit_offset = open.consumed;
                open.consumed += bits;
                if open.consumed > base.bit_size() {
                    return Err(BuildError::BitfieldOverflow {
                        field: decl.name,
                        base,
                    });
                }
                open.last.clone_from(&decl.name);

                fields.push(CompiledField {
                    name: decl.name,
                    offset: open.offset,
                    ty: FieldTy::Bitfield {
                        base,
                        bits,
                        bit_offset,
                    },
                });

                if open.consumed == base.bit_size() {
                    match kind {
                        LayoutKind::Struct => cursor = open.offset + base.byte_size(),
                        LayoutKind::Union => max_member = max_member.max(base.byte_size()),
                    }
                } else {
                    group = Some(open);
                }
            } else {
                if let Some(open) = &group {
                    return Err(BuildError::IncompleteBitfieldGroup {
                        field: open.last.clone(),
                    });
                }

                let ty = resolve_ty(&decl.name, decl.ty)?;

                if kind == LayoutKind::Union {
                    if let FieldTy::Nested(nested) = &ty {
                        if nested.kind() == LayoutKind::Struct {
                            match union_endian {
                                None => union_endian = Some(nested.endian()),
                                Some(first) if first != nested.endian() => {
                                    return Err(BuildError::EndiannessMismatchInUnion {
                                        field: decl.name,
                                    });
                                }
                                Some(_) => {}
                            }
                        }
                    }
                }

                let field_align = ty.align().min(pack);
                align = align.max(field_align);
                let size = ty.storage_size();
                let offset = match kind {
                    LayoutKind::Struct => {
                        let offset = cursor.next_multiple_of(field_align);
                        cursor = offset + size;
                        offset
                    }
                    LayoutKind::Union => {
                        max_member = max_member.max(size);
                        0
                    }
                };

                fields.push(CompiledField {
                    name: decl.name,
                    offset,
                    ty,
                });
            }
        }

        if let Some(open) = group {
            return Err(BuildError::IncompleteBitfieldGroup { field: open.last });
        }

        let raw_size = match kind {
            LayoutKind::Struct => cursor,
            LayoutKind::Union => max_member,
        };
        let size = raw_size.next_multiple_of(align);

        Ok(Arc::new(Layout {
            name,
            kind,
            endian,
            pack,
            size,
            align,
            fields,
        }))
    }
}

fn resolve_ty(field: &str, ty: DeclTy) -> Result<FieldTy, BuildError> {
    match ty {
        DeclTy::Scalar(scalar) => Ok(FieldTy::Scalar(scalar)),
        DeclTy::Nested(layout) => Ok(FieldTy::Nested(layout)),
        DeclTy::Array { elem, len } => {
            if len == 0 {
                return Err(BuildError::InvalidArrayLength {
                    field: field.to_string(),
                });
            }
            let elem = match *elem {
                DeclTy::Scalar(scalar) => ElemTy::Scalar(scalar),
                DeclTy::Nested(layout) => ElemTy::Nested(layout),
                DeclTy::Array { .. } => {
                    return Err(BuildError::InvalidFieldType {
                        field: field.to_string(),
                        reason: "arrays of arrays are not supported",
                    });
                }
            };
            Ok(FieldTy::Array(ArrayTy { elem, len }))
        }
    }
}
