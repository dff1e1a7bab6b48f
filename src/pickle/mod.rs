//! Deserializer for the pickle opcode subset PyMOL writes into `.pse`
//! session files.
//!
//! [`decode`] runs the opcode stream against a [`ByteSource`] and returns
//! the root [`Mapping`]. [`encode`] writes the same subset back out and
//! exists for fixtures and round-trip checks.

mod decoder;
mod encoder;
pub mod opcode;
mod source;
mod value;

pub use decoder::{decode, decode_bytes};
pub use encoder::{encode, write_value};
pub use source::{ByteSource, ReadSource, SliceSource};
pub use value::{Mapping, Value};
