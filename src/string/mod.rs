//! The string types of ASN.1.
//!
//! This module provides types that match the various string encodings
//! provided by ASN.1 and BER.
//!
//! The most basic string type is [`OctetString`], which is simply a
//! sequence of octets. [`BitString`] is a sequence of individual bits,
//! and the restricted character string types all share the octet string
//! wire shape with an additional character set layered on top, handled
//! by the [`charset`] module.

//--- Re-exports

pub use self::bit::{BitString, Flags, FlagsRepr};
pub use self::charset::{
    BmpCharSet, CharSet, CharSetError, Ia5CharSet, NumericCharSet,
    PrintableCharSet, UniversalCharSet, Utf8CharSet, VisibleCharSet,
};
pub use self::octet::OctetString;

//--- Public and private modules

pub mod charset;

pub(crate) mod bit;
pub(crate) mod octet;

mod segments;
