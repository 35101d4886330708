//! Field values and the validation applied when they are assigned.

use std::sync::Arc;

use crate::{
    compiled::{ElemTy, FieldTy},
    errors::AccessError,
    field::Scalar,
    instance::Instance,
    layout::Layout,
};

/// A value held by (or assigned to) a single field.
///
/// Integer fields are stored normalized: unsigned fields as [Value::U64],
/// signed fields as [Value::I64], whichever variant was assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    /// An owned sub-instance for nested fields.
    Nested(Instance),
    Array(Vec<Value>),
}

/// Validates `value` against a field descriptor and returns its normalized
/// form. The caller leaves the field untouched on failure.
pub(crate) fn check_value(field: &str, ty: &FieldTy, value: Value) -> Result<Value, AccessError> {
    match ty {
        FieldTy::Scalar(scalar) if scalar.is_float() => check_float(field, *scalar, value),
        FieldTy::Scalar(scalar) => check_int(field, *scalar, None, value),
        FieldTy::Bitfield { base, bits, .. } => check_int(field, *base, Some(*bits), value),
        FieldTy::Nested(expected) => check_nested(field, expected, value),
        FieldTy::Array(array) => match value {
            Value::Array(items) if items.len() == array.len => {
                let mut checked = Vec::with_capacity(items.len());
                for item in items {
                    checked.push(check_elem(field, &array.elem, item)?);
                }
                Ok(Value::Array(checked))
            }
            _ => Err(AccessError::TypeMismatch {
                field: field.to_string(),
                expected: format!("array of {} elements", array.len),
            }),
        },
    }
}

pub(crate) fn check_elem(field: &str, elem: &ElemTy, value: Value) -> Result<Value, AccessError> {
    match elem {
        ElemTy::Scalar(scalar) if scalar.is_float() => check_float(field, *scalar, value),
        ElemTy::Scalar(scalar) => check_int(field, *scalar, None, value),
        ElemTy::Nested(expected) => check_nested(field, expected, value),
    }
}

/// The zero-initialized value for a field.
pub(crate) fn zero_value(ty: &FieldTy) -> Value {
    match ty {
        FieldTy::Scalar(scalar) | FieldTy::Bitfield { base: scalar, .. } => zero_scalar(*scalar),
        FieldTy::Nested(layout) => Value::Nested(Instance::zeroed(layout)),
        FieldTy::Array(array) => {
            let zero = match &array.elem {
                ElemTy::Scalar(scalar) => zero_scalar(*scalar),
                ElemTy::Nested(layout) => Value::Nested(Instance::zeroed(layout)),
            };
            Value::Array(vec![zero; array.len])
        }
    }
}

fn zero_scalar(scalar: Scalar) -> Value {
    match scalar {
        Scalar::F32 => Value::F32(0.0),
        Scalar::F64 => Value::F64(0.0),
        s if s.is_signed() => Value::I64(0),
        _ => Value::U64(0),
    }
}

fn check_nested(field: &str, expected: &Arc<Layout>, value: Value) -> Result<Value, AccessError> {
    match value {
        Value::Nested(instance) if Arc::ptr_eq(instance.layout(), expected) => {
            Ok(Value::Nested(instance))
        }
        _ => Err(AccessError::TypeMismatch {
            field: field.to_string(),
            expected: format!("instance of `{}`", expected.name()),
        }),
    }
}

fn check_int(
    field: &str,
    base: Scalar,
    bits: Option<u32>,
    value: Value,
) -> Result<Value, AccessError> {
    let raw = match value {
        Value::U64(v) => v as i128,
        Value::I64(v) => v as i128,
        _ => {
            let mut expected = base.short_name().to_string();
            if let Some(bits) = bits {
                expected.push_str(&format!("@{bits}"));
            }
            return Err(AccessError::TypeMismatch {
                field: field.to_string(),
                expected,
            });
        }
    };
    let (min, max) = int_bounds(base, bits);
    if raw < min || raw > max {
        return Err(AccessError::ValueOutOfRange {
            field: field.to_string(),
            value: raw,
            min,
            max,
        });
    }
    Ok(if base.is_signed() {
        Value::I64(raw as i64)
    } else {
        Value::U64(raw as u64)
    })
}

fn check_float(field: &str, scalar: Scalar, value: Value) -> Result<Value, AccessError> {
    match (scalar, value) {
        (Scalar::F32, Value::F32(x)) => Ok(Value::F32(x)),
        (Scalar::F64, Value::F64(x)) => Ok(Value::F64(x)),
        _ => Err(AccessError::TypeMismatch {
            field: field.to_string(),
            expected: scalar.short_name().to_string(),
        }),
    }
}

fn int_bounds(base: Scalar, bits: Option<u32>) -> (i128, i128) {
    let width = bits.unwrap_or(base.bit_size());
    if base.is_signed() {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    } else {
        (0, (1i128 << width) - 1)
    }
}
