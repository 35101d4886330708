//! Instances: mutable, validated value containers bound to one layout.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    errors::{AccessError, ArgumentError},
    field::LayoutKind,
    layout::Layout,
    value::{Value, check_value, zero_value},
};

/// A live value container bound to one [Layout].
///
/// Struct instances keep one validated value slot per field and own their
/// nested sub-instances. Union instances keep a single backing byte buffer
/// that every member aliases: reads decode the member from the current
/// bytes, writes encode through into them, so whichever member was last
/// written is what every other member sees (C type punning).
///
/// An instance is safe to read from multiple threads; writes need external
/// synchronization like any `&mut` access.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) layout: Arc<Layout>,
    pub(crate) repr: Repr,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Repr {
    Fields(Vec<Value>),
    Bytes(Vec<u8>),
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.layout, &other.layout) && self.repr == other.repr
    }
}

impl Instance {
    /// Creates an instance with every field zero-initialized.
    pub fn zeroed(layout: &Arc<Layout>) -> Self {
        let repr = match layout.kind() {
            LayoutKind::Struct => {
                Repr::Fields(layout.fields.iter().map(|f| zero_value(&f.ty)).collect())
            }
            LayoutKind::Union => Repr::Bytes(vec![0; layout.size()]),
        };
        Instance {
            layout: Arc::clone(layout),
            repr,
        }
    }

    /// Positional construction: one value per field, in declaration order.
    ///
    /// Unions follow C initializer semantics: a single value, assigned to the
    /// first member.
    pub fn with_values(layout: &Arc<Layout>, values: Vec<Value>) -> Result<Self, ArgumentError> {
        let mut instance = Self::zeroed(layout);
        match layout.kind() {
            LayoutKind::Struct => {
                if values.len() != layout.fields.len() {
                    return Err(ArgumentError::WrongArity {
                        expected: layout.fields.len(),
                        got: values.len(),
                    });
                }
                for (index, value) in values.into_iter().enumerate() {
                    instance.set_index(index, value)?;
                }
            }
            LayoutKind::Union => {
                if values.is_empty() {
                    return Ok(instance);
                }
                let expected = if layout.fields.is_empty() { 0 } else { 1 };
                if values.len() != expected {
                    return Err(ArgumentError::WrongArity {
                        expected,
                        got: values.len(),
                    });
                }
                for (index, value) in values.into_iter().enumerate() {
                    instance.set_index(index, value)?;
                }
            }
        }
        Ok(instance)
    }

    /// Keyword construction: every field named exactly once. Unions take
    /// exactly one named member instead.
    pub fn with_named(layout: &Arc<Layout>, values: Vec<(&str, Value)>) -> Result<Self, ArgumentError> {
        let mut instance = Self::zeroed(layout);
        match layout.kind() {
            LayoutKind::Struct => {
                let mut given: HashMap<&str, Value> = HashMap::with_capacity(values.len());
                for (name, value) in values {
                    if given.insert(name, value).is_some() {
                        return Err(ArgumentError::DuplicateField(name.to_string()));
                    }
                }
                for &name in given.keys() {
                    if layout.field(name).is_none() {
                        return Err(ArgumentError::UnknownField(name.to_string()));
                    }
                }
                for index in 0..layout.fields.len() {
                    let name = layout.fields[index].name.as_str();
                    let Some(value) = given.remove(name) else {
                        return Err(ArgumentError::MissingField(name.to_string()));
                    };
                    instance.set_index(index, value)?;
                }
            }
            LayoutKind::Union => {
                let expected = if layout.fields.is_empty() { 0 } else { 1 };
                if values.len() != expected {
                    return Err(ArgumentError::WrongArity {
                        expected,
                        got: values.len(),
                    });
                }
                if let Some((name, value)) = values.into_iter().next() {
                    let Some(index) = layout.field_position(name) else {
                        return Err(ArgumentError::UnknownField(name.to_string()));
                    };
                    instance.set_index(index, value)?;
                }
            }
        }
        Ok(instance)
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Byte size of the wire representation (`layout.size()`).
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Returns the current value of a field. Union members are decoded on
    /// demand from the shared backing buffer.
    pub fn get(&self, name: &str) -> Result<Value, AccessError> {
        let Some(index) = self.layout.field_position(name) else {
            return Err(AccessError::NoSuchField(name.to_string()));
        };
        Ok(self.field_value(index))
    }

    /// Assigns a validated value to a field. On failure the field (and, for
    /// unions, the backing buffer) keeps its previous contents.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        let Some(index) = self.layout.field_position(name) else {
            return Err(AccessError::NoSuchField(name.to_string()));
        };
        self.set_index(index, value)
    }

    /// Mutable access to an owned nested sub-instance. Only struct layouts
    /// own their sub-instances; union member views are materialized on read.
    pub fn nested_mut(&mut self, name: &str) -> Result<&mut Instance, AccessError> {
        let Some(index) = self.layout.field_position(name) else {
            return Err(AccessError::NoSuchField(name.to_string()));
        };
        match &mut self.repr {
            Repr::Fields(slots) => match &mut slots[index] {
                Value::Nested(instance) => Ok(instance),
                _ => Err(AccessError::TypeMismatch {
                    field: name.to_string(),
                    expected: "nested layout field".to_string(),
                }),
            },
            Repr::Bytes(_) => Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: "nested field of a struct layout".to_string(),
            }),
        }
    }

    pub(crate) fn set_index(&mut self, index: usize, value: Value) -> Result<(), AccessError> {
        let field = &self.layout.fields[index];
        let checked = check_value(&field.name, &field.ty, value)?;
        let endian = self.layout.endian();
        match &mut self.repr {
            Repr::Fields(slots) => slots[index] = checked,
            Repr::Bytes(buffer) => crate::codec::write_field_at(buffer, field, endian, &checked),
        }
        Ok(())
    }

    pub(crate) fn field_value(&self, index: usize) -> Value {
        let field = &self.layout.fields[index];
        match &self.repr {
            Repr::Fields(slots) => slots[index].clone(),
            Repr::Bytes(buffer) => crate::codec::read_field_at(buffer, field, self.layout.endian()),
        }
    }
}
