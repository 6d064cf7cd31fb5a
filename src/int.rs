//! BER encoded integers.
//!
//! An INTEGER is encoded as a primitive value with the content octets
//! providing a variable-length, big-endian, two’s complement representation.
//! Thus, the most-significant bit of the first octet serves as the sign bit,
//! and clause 8.3.2 of X.690 demands that the first nine bits are not all
//! equal, keeping the encoding minimal under every rule set.
//!
//! This module provides the [`Integer`] and [`Unsigned`] types wrapping the
//! raw content octets, the [`Enumerated`] trait for mapping ENUMERATED
//! values onto Rust enums, and the conversion helpers used by the reader’s
//! fixed-width accessors.

use std::{cmp, fmt};
use bytes::Bytes;
use num_bigint::{BigInt, BigUint, Sign};
use crate::error::Error;


//------------ Integer -------------------------------------------------------

/// A BER encoded integer.
///
/// As integers are variable length in BER, this type is just a simple
/// wrapper atop the underlying [`Bytes`] value containing the validated
/// content octets. A value of this type is a signed integer. If a value is
/// defined as an unsigned integer, i.e., as `INTEGER (0..MAX)`, you should
/// use the sibling type [`Unsigned`] instead.
///
/// In addition to these two generic types, the reader also provides
/// methods to parse integers into native integer types such as `i8`. If
/// the range of such a type is obviously large enough, you might want to
/// consider using these methods instead.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Integer(Bytes);

impl Integer {
    /// Creates a value from validated content octets.
    pub(crate) fn from_content(content: Bytes) -> Result<Self, Error> {
        check_head(&content)?;
        Ok(Integer(content))
    }

    /// Returns the content octets of the encoded value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Converts the value into the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns whether the number is zero.
    pub fn is_zero(&self) -> bool {
        self.0.as_ref() == &[0u8][..]
    }

    /// Returns whether the number is negative.
    pub fn is_negative(&self) -> bool {
        // Content is never empty.
        self.0[0] & 0x80 != 0
    }

    /// Returns the value as an arbitrary-precision integer.
    pub fn to_bigint(&self) -> BigInt {
        BigInt::from_signed_bytes_be(self.as_slice())
    }
}


//--- AsRef

impl AsRef<[u8]> for Integer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}


//--- Display

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.to_bigint().fmt(f)
    }
}


//------------ Unsigned ------------------------------------------------------

/// A BER encoded unsigned integer.
///
/// This is the same as [`Integer`] but guarantees that the wrapped value
/// is greater or equal to zero. This equals an integer defined as
/// `INTEGER (0..MAX)` in ASN.1.
///
/// Because the encoding is two’s complement, a positive value whose most
/// significant payload bit is set carries one extra leading zero octet to
/// keep the sign bit clear. The content kept here is the raw content
/// including that octet; [`Unsigned::value_slice`] strips it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Unsigned(Bytes);

impl Unsigned {
    /// Creates a value from validated content octets.
    pub(crate) fn from_content(content: Bytes) -> Result<Self, Error> {
        check_head(&content)?;
        if content[0] & 0x80 != 0 {
            return Err(Error::malformed("negative unsigned integer"))
        }
        Ok(Unsigned(content))
    }

    /// Returns the raw content octets of the encoded value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the content octets without a sign-clearing leading zero.
    pub fn value_slice(&self) -> &[u8] {
        strip_sign_octet(self.0.as_ref())
    }

    /// Converts the value into the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns the value as an arbitrary-precision unsigned integer.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(self.value_slice())
    }
}


//--- AsRef

impl AsRef<[u8]> for Unsigned {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}


//--- PartialEq, Ord

impl PartialEq<Integer> for Unsigned {
    fn eq(&self, other: &Integer) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl PartialOrd for Unsigned {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Unsigned {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // Minimal encoding means a longer value is a bigger value.
        let left = self.value_slice();
        let right = other.value_slice();
        left.len().cmp(&right.len()).then_with(|| left.cmp(right))
    }
}


//--- Display

impl fmt::Display for Unsigned {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.to_biguint().fmt(f)
    }
}


//------------ Enumerated ----------------------------------------------------

/// A Rust enum that mirrors an ASN.1 ENUMERATED type.
///
/// ENUMERATED values share the integer wire shape, so decoding one means
/// parsing an integer of the enum’s declared backing width and mapping it
/// onto a variant. Types whose values are a set of flags are *not*
/// enumerations in the ASN.1 sense – they are named bit lists and belong
/// to the [`Flags`][crate::string::Flags] trait instead. Keeping the two
/// traits disjoint makes mixing them up a compile-time error.
pub trait Enumerated: Sized {
    /// The backing integer type declared for the enumeration.
    type Repr: EnumRepr;

    /// Returns the variant for the given backing value, if any.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// An integer type that can back an [`Enumerated`] implementation.
///
/// The trait is sealed: it is implemented for the built-in integer types
/// with widths from 8 to 64 bits and cannot be implemented elsewhere.
pub trait EnumRepr: Sized + sealed::Sealed {
    /// Parses validated integer content octets into the repr type.
    ///
    /// Returns `None` if the value does not fit the type.
    fn from_content(content: &[u8]) -> Option<Self>;
}

mod sealed {
    pub trait Sealed { }
}

macro_rules! signed_repr {
    ( $type:ident, $bits:expr ) => {
        impl sealed::Sealed for $type { }

        impl EnumRepr for $type {
            fn from_content(content: &[u8]) -> Option<Self> {
                parse_signed(content, $bits).map(|res| res as $type)
            }
        }
    }
}

macro_rules! unsigned_repr {
    ( $type:ident, $bits:expr ) => {
        impl sealed::Sealed for $type { }

        impl EnumRepr for $type {
            fn from_content(content: &[u8]) -> Option<Self> {
                parse_unsigned(content, $bits).map(|res| res as $type)
            }
        }
    }
}

signed_repr!(i8, 8);
signed_repr!(i16, 16);
signed_repr!(i32, 32);
signed_repr!(i64, 64);
unsigned_repr!(u8, 8);
unsigned_repr!(u16, 16);
unsigned_repr!(u32, 32);
unsigned_repr!(u64, 64);


//------------ Content helpers -----------------------------------------------

/// Checks that integer content starts correctly.
///
/// Specifically, checks that there is at least one octet and that the
/// first nine bits of a multi-octet integer are not all the same.
///
/// The latter ensures that an integer is encoded in the smallest possible
/// number of octets. Since we insist on this rule, we can use the content
/// octets as the value for large integers and simply compare slices for
/// comparison.
pub(crate) fn check_head(content: &[u8]) -> Result<(), Error> {
    match (content.first(), content.get(1).map(|x| x & 0x80 != 0)) {
        (None, _) => Err(Error::malformed("empty integer")),
        (Some(0), Some(false)) => {
            Err(Error::malformed("redundant leading integer octet"))
        }
        (Some(0xFF), Some(true)) => {
            Err(Error::malformed("redundant leading integer octet"))
        }
        _ => Ok(())
    }
}

/// Strips the sign-clearing leading zero octet of a non-negative value.
fn strip_sign_octet(content: &[u8]) -> &[u8] {
    match content.split_first() {
        Some((0, tail)) if !tail.is_empty() => tail,
        _ => content
    }
}

/// Converts validated content octets into a signed value of `bits` width.
///
/// Expects that [`check_head`] has passed. Returns `None` if the value
/// needs more than `bits` bits.
pub(crate) fn parse_signed(content: &[u8], bits: u32) -> Option<i128> {
    if content.len() > (bits / 8) as usize {
        return None
    }
    let mut res: i128 = if content.first()? & 0x80 != 0 { -1 } else { 0 };
    for &octet in content {
        res = res << 8 | i128::from(octet);
    }
    Some(res)
}

/// Converts validated content octets into an unsigned value of `bits` width.
///
/// Expects that [`check_head`] has passed. Returns `None` if the value is
/// negative or needs more than `bits` bits.
pub(crate) fn parse_unsigned(content: &[u8], bits: u32) -> Option<u128> {
    let (content, padded) = match content.split_first() {
        Some((0, tail)) if !tail.is_empty() => (tail, true),
        _ => (content, false),
    };
    if !padded && content.first()? & 0x80 != 0 {
        // No leading zero was stripped, so the sign bit is a sign bit.
        return None
    }
    if content.len() > (bits / 8) as usize {
        return None
    }
    let mut res: u128 = 0;
    for &octet in content {
        res = res << 8 | u128::from(octet);
    }
    Some(res)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn head_check() {
        assert!(check_head(b"").is_err());
        assert!(check_head(b"\x00").is_ok());
        assert!(check_head(b"\x7F").is_ok());
        assert!(check_head(b"\x80").is_ok());
        assert!(check_head(b"\xFF").is_ok());
        assert!(check_head(b"\x00\x80").is_ok());
        // The first nine bits must not all be ones: 0xFF80 would fit a
        // single 0x80 octet, while 0xFF7F genuinely needs both.
        assert!(check_head(b"\xFF\x80").is_err());
        assert!(check_head(b"\xFF\x7F").is_ok());
        assert!(check_head(b"\x00\x00").is_err());
        assert!(check_head(b"\x00\x7F").is_err());
    }

    #[test]
    fn signed() {
        assert_eq!(parse_signed(b"\x00", 8), Some(0));
        assert_eq!(parse_signed(b"\x7F", 8), Some(127));
        assert_eq!(parse_signed(b"\x80", 8), Some(-128));
        assert_eq!(parse_signed(b"\xFF", 8), Some(-1));
        assert_eq!(parse_signed(b"\x00\x80", 8), None);
        assert_eq!(parse_signed(b"\x00\x80", 16), Some(128));
        assert_eq!(parse_signed(b"\x80\x00", 16), Some(-32768));
        assert_eq!(parse_signed(b"\xFF\x00", 16), Some(-256));
        assert_eq!(
            parse_signed(b"\x80\x00\x00\x00\x00\x00\x00\x00", 64),
            Some(i64::MIN.into())
        );
        assert_eq!(parse_signed(b"\x01\x00\x00", 16), None);
    }

    #[test]
    fn unsigned() {
        assert_eq!(parse_unsigned(b"\x00", 8), Some(0));
        assert_eq!(parse_unsigned(b"\x7F", 8), Some(127));
        assert_eq!(parse_unsigned(b"\x80", 8), None);
        assert_eq!(parse_unsigned(b"\x00\x80", 8), Some(128));
        assert_eq!(parse_unsigned(b"\x00\xFF", 8), Some(255));
        assert_eq!(parse_unsigned(b"\x01\x00", 8), None);
        assert_eq!(parse_unsigned(b"\x01\x00", 16), Some(256));
        assert_eq!(
            parse_unsigned(b"\x00\xFF\xFF\xFF\xFF", 32),
            Some(u32::MAX.into())
        );
        assert_eq!(parse_unsigned(b"\x01\x00\x00\x00\x00", 32), None);
    }

    #[test]
    fn big_integers() {
        let int = Integer::from_content(
            Bytes::from_static(b"\xFF\x00")
        ).unwrap();
        assert_eq!(int.to_bigint(), BigInt::from(-256));
        assert!(int.is_negative());

        let int = Unsigned::from_content(
            Bytes::from_static(b"\x00\x80")
        ).unwrap();
        assert_eq!(int.to_biguint(), BigUint::from(128u8));
        assert_eq!(int.value_slice(), b"\x80");

        assert!(
            Unsigned::from_content(Bytes::from_static(b"\x80")).is_err()
        );
    }

    #[test]
    fn unsigned_ordering() {
        fn unsigned(slice: &'static [u8]) -> Unsigned {
            Unsigned::from_content(Bytes::from_static(slice)).unwrap()
        }

        assert!(unsigned(b"\x00") < unsigned(b"\x01"));
        assert!(unsigned(b"\x7F") < unsigned(b"\x00\x80"));
        assert!(unsigned(b"\x00\x80") < unsigned(b"\x01\x00"));
        assert_eq!(unsigned(b"\x00\xFF"), unsigned(b"\x00\xFF"));
    }
}
