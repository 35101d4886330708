//! Error types for layout compilation, field access and decoding.

use thiserror::Error;

use crate::field::Scalar;

/// Errors produced when compiling field declarations into a [crate::layout::Layout].
///
/// All of these are fatal: no layout is returned for a bad declaration list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Declaration combines types in an unsupported way.
    #[error("field `{field}`: {reason}")]
    InvalidFieldType { field: String, reason: &'static str },
    /// Field name is empty.
    #[error("field names must not be empty")]
    InvalidFieldName,
    /// Field name is already taken in this layout.
    #[error("duplicate field name `{0}`")]
    DuplicateFieldName(String),
    /// A bitfield group consumed more bits than its base type holds.
    #[error("bitfield `{field}` overflows its {base} storage unit")]
    BitfieldOverflow { field: String, base: Scalar },
    /// A bitfield group ended before filling its storage unit.
    #[error("bitfield group ending at `{field}` does not fill its storage unit")]
    IncompleteBitfieldGroup { field: String },
    /// Consecutive bitfields disagree on their base type.
    #[error("bitfield `{field}` uses base {found} while the open group uses {expected}")]
    MixedBitfieldBaseType {
        field: String,
        expected: Scalar,
        found: Scalar,
    },
    /// Union members that are nested structs must all share one byte order.
    #[error("union member `{field}` does not match the byte order of the other struct members")]
    EndiannessMismatchInUnion { field: String },
    /// Array field declared with zero elements.
    #[error("array field `{field}` must have at least one element")]
    InvalidArrayLength { field: String },
    /// Pack must be a power of two in `1..=16`.
    #[error("pack value {0} is not a power of two in 1..=16")]
    InvalidPackValue(usize),
}

/// Errors produced by validated field access on an [crate::instance::Instance].
///
/// These are recoverable: the field keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no field named `{0}`")]
    NoSuchField(String),
    /// Assigned value does not fit the field's width and signedness.
    #[error("value {value} does not fit field `{field}` (allowed {min}..={max})")]
    ValueOutOfRange {
        field: String,
        value: i128,
        min: i128,
        max: i128,
    },
    /// Assigned value has the wrong shape for the field.
    #[error("type mismatch for field `{field}`: expected {expected}")]
    TypeMismatch { field: String, expected: String },
}

/// Errors produced when constructing an [crate::instance::Instance] from
/// explicit values. Construction is aborted; no instance is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("expected {expected} constructor values, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` given more than once")]
    DuplicateField(String),
    #[error("field `{0}` not given")]
    MissingField(String),
    #[error(transparent)]
    Value(#[from] AccessError),
}

/// Errors produced when decoding bytes into an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input is shorter than the layout's byte size. The instance is left
    /// unchanged.
    #[error("need {needed} bytes to decode, got {got}")]
    InsufficientData { needed: usize, got: usize },
}
