//! Rendering: human-readable instance display and C type declarations.

use std::collections::HashSet;
use std::fmt;

use crate::{
    bits,
    compiled::{ElemTy, FieldTy},
    field::{LayoutKind, Scalar},
    instance::Instance,
    layout::Layout,
    value::Value,
};

impl fmt::Display for Instance {
    /// Renders as `Name(field:tag=value, ...)`: integers in hex, floats with
    /// six decimals, bitfields with an `@width` suffix, nested instances
    /// recursively. Union members are read through the backing buffer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.layout().name())?;
        for (index, field) in self.layout().fields.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            let value = self.field_value(index);
            write_field(f, &field.name, &field.ty, &value)?;
        }
        write!(f, ")")
    }
}

fn write_field(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    ty: &FieldTy,
    value: &Value,
) -> fmt::Result {
    match (ty, value) {
        (FieldTy::Nested(_), Value::Nested(instance)) => write!(f, "{name}={instance}"),
        (FieldTy::Scalar(scalar), _) => {
            write!(f, "{name}:{}=", scalar.short_name())?;
            write_scalar_value(f, *scalar, None, value)
        }
        (FieldTy::Bitfield { base, bits, .. }, _) => {
            write!(f, "{name}:{}@{bits}=", base.short_name())?;
            write_scalar_value(f, *base, Some(*bits), value)
        }
        (FieldTy::Array(array), Value::Array(items)) => {
            write!(f, "{name}:{}[{}]=[", elem_tag(&array.elem), array.len)?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                match (&array.elem, item) {
                    (ElemTy::Nested(_), Value::Nested(instance)) => write!(f, "{instance}")?,
                    (ElemTy::Scalar(scalar), _) => write_scalar_value(f, *scalar, None, item)?,
                    _ => {}
                }
            }
            write!(f, "]")
        }
        // Slots are normalized on assignment; other pairings cannot occur.
        _ => Ok(()),
    }
}

fn write_scalar_value(
    f: &mut fmt::Formatter<'_>,
    scalar: Scalar,
    bits_width: Option<u32>,
    value: &Value,
) -> fmt::Result {
    match value {
        Value::F32(x) => write!(f, "{x:.6}"),
        Value::F64(x) => write!(f, "{x:.6}"),
        Value::U64(v) => write!(f, "0x{v:X}"),
        // Signed values print the two's-complement bits of their width.
        Value::I64(v) => {
            let width = bits_width.unwrap_or(scalar.bit_size());
            write!(f, "0x{:X}", (*v as u64) & bits::mask(width))
        }
        _ => Ok(()),
    }
}

fn elem_tag(elem: &ElemTy) -> &str {
    match elem {
        ElemTy::Scalar(scalar) => scalar.short_name(),
        ElemTy::Nested(layout) => layout.name(),
    }
}

impl Layout {
    /// Emits an equivalent C type declaration, with the declarations of any
    /// nested layouts first (each emitted once).
    pub fn c_declaration(&self) -> String {
        let mut lines = Vec::new();
        let mut emitted = HashSet::new();
        self.c_lines(&mut lines, &mut emitted);
        lines.join("\n")
    }

    fn c_lines(&self, lines: &mut Vec<String>, emitted: &mut HashSet<String>) {
        if !emitted.insert(self.name().to_string()) {
            return;
        }
        for field in &self.fields {
            match &field.ty {
                FieldTy::Nested(nested) => nested.c_lines(lines, emitted),
                FieldTy::Array(array) => {
                    if let ElemTy::Nested(nested) = &array.elem {
                        nested.c_lines(lines, emitted);
                    }
                }
                _ => {}
            }
        }

        let tag = match self.kind() {
            LayoutKind::Struct => "struct",
            LayoutKind::Union => "union",
        };
        lines.push(format!("typedef {tag} _tag_{} {{", self.name()));
        for field in &self.fields {
            lines.push(match &field.ty {
                FieldTy::Scalar(scalar) => {
                    format!("    {} {};", c_type_name(*scalar), field.name)
                }
                FieldTy::Bitfield { base, bits, .. } => {
                    format!("    {} {} : {};", c_type_name(*base), field.name, bits)
                }
                FieldTy::Nested(nested) => format!("    {} {};", nested.name(), field.name),
                FieldTy::Array(array) => match &array.elem {
                    ElemTy::Scalar(scalar) => {
                        format!("    {} {}[{}];", c_type_name(*scalar), field.name, array.len)
                    }
                    ElemTy::Nested(nested) => {
                        format!("    {} {}[{}];", nested.name(), field.name, array.len)
                    }
                },
            });
        }
        lines.push(format!("}} {};", self.name()));
    }
}

fn c_type_name(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::U8 => "unsigned char",
        Scalar::I8 => "signed char",
        Scalar::U16 => "unsigned short",
        Scalar::I16 => "signed short",
        Scalar::U32 => "unsigned int",
        Scalar::I32 => "signed int",
        Scalar::U64 => "unsigned long",
        Scalar::I64 => "signed long",
        Scalar::F32 => "float",
        Scalar::F64 => "double",
    }
}
