//! # abicraft
//!
//! Fixed-layout binary records with C struct/union semantics, declared at
//! runtime and compiled into immutable layouts.
//!
//! Declare ordered fields (scalars, nested layouts, fixed arrays, packed
//! bitfields), pick a byte order, then move validated values between typed
//! instances and wire-format byte buffers. Union members alias one backing
//! buffer, matching C type punning.
//!
//! ## Example
//!
//! ```
//! use abicraft::field::Scalar;
//! use abicraft::instance::Instance;
//! use abicraft::layout::LayoutBuilder;
//! use abicraft::value::Value;
//!
//! let header = LayoutBuilder::new_struct("Header")
//!     .scalar("id", Scalar::U16)
//!     .bitfield("version", Scalar::U8, 4)
//!     .bitfield("flags", Scalar::U8, 4)
//!     .scalar("length", Scalar::U8)
//!     .compile()
//!     .unwrap();
//!
//! let mut packet = Instance::zeroed(&header);
//! packet.set("id", Value::U64(0xBEEF)).unwrap();
//! packet.set("version", Value::U64(2)).unwrap();
//! packet.set("flags", Value::U64(0x5)).unwrap();
//! packet.set("length", Value::U64(16)).unwrap();
//!
//! assert_eq!(packet.encode(), vec![0xEF, 0xBE, 0x52, 0x10]);
//!
//! let mut parsed = Instance::zeroed(&header);
//! parsed.decode(&[0xEF, 0xBE, 0x52, 0x10]).unwrap();
//! assert_eq!(parsed.get("flags").unwrap(), Value::U64(0x5));
//! ```

pub mod bits;
mod codec;
pub mod compiled;
pub mod errors;
pub mod field;
pub mod instance;
pub mod layout;
mod render;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;
