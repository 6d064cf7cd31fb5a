//! Reading of data in Basic Encoding Rules.
//!
//! This crate allows reading data encoded in ASN.1’s _Basic Encoding
//! Rules_ as defined in ITU recommendation X.690 as well as their stricter
//! companions _Canonical Encoding Rules_ and _Distinguished Encoding
//! Rules._
//!
//! The central type of the crate is [`Reader`], a cursor over a byte
//! buffer that walks the tag-length-value structure of the encoded data
//! and provides typed access to every universal ASN.1 type: simple values
//! like booleans, integers, and object identifiers, the bit, octet, and
//! character string families in both their primitive and constructed
//! shapes, and the nested SEQUENCE and SET OF constructs, for which it
//! hands out bounded sub-readers.
//!
//! Which encoding freedoms are acceptable is governed by the [`Mode`]
//! the reader is created with. All checks demanded by the stricter rule
//! sets – minimal length encodings, canonical SET OF ordering, CER
//! string segmenting – are enforced while reading, so a value accepted
//! in DER mode is guaranteed to have no alternative encoding.
//!
//! Additionally, the crate provides a number of types that help dealing
//! with the more difficult universal types. The module [`int`] provides
//! variable length integers, the module [`string`] contains types for
//! the various kinds of strings defined in ASN.1, and [`oid`] deals with
//! object identifiers.

//--- Re-exports

pub use self::error::{Error, ErrorKind};
pub use self::int::{Enumerated, Integer, Unsigned};
pub use self::mode::Mode;
pub use self::oid::{ConstOid, Oid};
pub use self::reader::Reader;
pub use self::string::{BitString, Flags, OctetString};
pub use self::tag::{Class, Tag};


//--- Public modules

pub mod int;
pub mod oid;
pub mod string;


//--- Private modules

mod error;
mod length;
mod mode;
mod reader;
mod scratch;
mod tag;
