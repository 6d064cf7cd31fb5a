//! ASN.1 Object Identifiers.
//!
//! This module contains the [`Oid`] type that implements object
//! identifiers, a construct used by ASN.1 to uniquely identify all sorts
//! of things. The type is also re-exported at the top-level.

use std::{fmt, hash};
use bytes::Bytes;
use num_bigint::BigUint;
use crate::error::Error;


//------------ Oid -----------------------------------------------------------

/// An object identifier.
///
/// Object identifiers are globally unique, hierarchical values that are
/// used to identify objects or their type. When written, they are presented
/// as a sequence of integers separated by dots such as ‘1.3.6.1.5.5.7.1’.
///
/// Values of this type keep a single object identifier in its encoded
/// form, i.e., as some form of byte sequence. Because different
/// representations may be useful, the type is generic over something that
/// can become a reference to a byte slice.
///
/// A common use for object identifiers is to compare them to predefined
/// values. For this purpose, you typically define your known object
/// identifiers as constants of `Oid<&'static [u8]>` – or its type alias
/// [`ConstOid`] – holding the encoded sub-identifier octets.
///
/// # Encoding
///
/// The content octets of an encoded object identifier are a sequence of
/// sub-identifiers, each a variable-length base 128 unsigned integer, most
/// significant digit first, with bit 8 of every octet except the last set.
/// The first octet of a sub-identifier must not be 0x80, otherwise the
/// encoding would not be minimal. The first two arcs of the identifier
/// share the first sub-identifier; see [`Component`] for the details.
#[derive(Clone, Debug)]
pub struct Oid<T: AsRef<[u8]> = Bytes>(pub T);

/// A type alias for `Oid<&'static [u8]>`.
///
/// This is useful when defining object identifier constants.
pub type ConstOid = Oid<&'static [u8]>;

impl Oid<Bytes> {
    /// Creates a value from the content octets of an encoded identifier.
    pub(crate) fn from_content(content: Bytes) -> Result<Self, Error> {
        Self::check_content(content.as_ref())?;
        Ok(Oid(content))
    }

    /// Checks that a slice is a well-formed sequence of sub-identifiers.
    fn check_content(slice: &[u8]) -> Result<(), Error> {
        if slice.is_empty() {
            return Err(Error::malformed("empty object identifier"))
        }
        if slice.last().map(|last| last & 0x80 != 0).unwrap_or(false) {
            return Err(Error::malformed("truncated sub-identifier"))
        }
        let mut first = true;
        for &octet in slice {
            if first && octet == 0x80 {
                return Err(Error::malformed("non-minimal sub-identifier"))
            }
            first = octet & 0x80 == 0;
        }
        Ok(())
    }
}

impl<T: AsRef<[u8]>> Oid<T> {
    /// Returns an iterator over the components of the identifier.
    ///
    /// # Panics
    ///
    /// The returned iterator will eventually panic if `self` does not
    /// contain a correctly encoded object identifier. Values produced by
    /// the reader are always correctly encoded.
    pub fn iter(&self) -> Iter {
        Iter::new(self.0.as_ref())
    }
}


//--- AsRef

impl<T: AsRef<[u8]>> AsRef<[u8]> for Oid<T> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- PartialEq and Eq

impl<T: AsRef<[u8]>, U: AsRef<[u8]>> PartialEq<Oid<U>> for Oid<T> {
    fn eq(&self, other: &Oid<U>) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl<T: AsRef<[u8]>> Eq for Oid<T> { }


//--- Hash

impl<T: AsRef<[u8]>> hash::Hash for Oid<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state)
    }
}


//--- Display

impl<T: AsRef<[u8]>> fmt::Display for Oid<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut components = self.iter();
        // There’s at least one component in a valid identifier.
        if let Some(first) = components.next() {
            write!(f, "{}", first)?;
        }
        for component in components {
            write!(f, ".{}", component)?;
        }
        Ok(())
    }
}


//------------ Component -----------------------------------------------------

/// A component of an object identifier.
///
/// Although these components are integers, they are encoded in a slightly
/// inconvenient way. Because of this we don’t eagerly convert them to
/// native integers but rather keep them as references to the underlying
/// octets, providing conversions as needed. Since arc values are not
/// bounded by the specification, [`Component::to_biguint`] is the
/// conversion that always succeeds.
///
/// The first two arcs of an object identifier are packed into the first
/// encoded sub-identifier `v`: for `v` below 40 they are (0, v), for `v`
/// below 80 they are (1, v − 40), and (2, v − 80) otherwise.
#[derive(Clone, Copy, Debug)]
pub struct Component<'a> {
    /// The position of the component in the object identifier.
    position: Position,

    /// The octets of the sub-identifier carrying the component.
    slice: &'a [u8],
}

/// The position of the component in the object identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Position {
    /// The first component, derived from the first sub-identifier.
    First,

    /// The second component, also derived from the first sub-identifier.
    Second,

    /// Any later component, identical to its sub-identifier.
    Other,
}

impl<'a> Component<'a> {
    /// Creates a new component.
    fn new(slice: &'a [u8], position: Position) -> Self {
        Component { slice, position }
    }

    /// Returns the raw value of the underlying sub-identifier if it is
    /// small enough for a `u128`.
    fn raw_u128(self) -> Option<u128> {
        // Each octet contributes seven bits.
        if self.slice.len() > 18 {
            return None
        }
        let mut res: u128 = 0;
        for &octet in self.slice {
            res = res.checked_shl(7)? | u128::from(octet & 0x7F);
        }
        Some(res)
    }

    /// Attempts to convert the component to a `u32`.
    ///
    /// Since the component’s value can be larger than the maximum value
    /// of a `u32`, this may fail, in which case the method returns `None`.
    pub fn to_u32(self) -> Option<u32> {
        u32::try_from(self.to_u128()?).ok()
    }

    /// Attempts to convert the component to a `u128`.
    pub fn to_u128(self) -> Option<u128> {
        let raw = self.raw_u128();
        match self.position {
            Position::First => {
                match raw {
                    Some(value) if value < 40 => Some(0),
                    Some(value) if value < 80 => Some(1),
                    _ => Some(2),
                }
            }
            Position::Second => {
                let raw = raw?;
                if raw < 80 {
                    Some(raw % 40)
                }
                else {
                    raw.checked_sub(80)
                }
            }
            Position::Other => raw,
        }
    }

    /// Converts the component into an arbitrary-precision integer.
    pub fn to_biguint(self) -> BigUint {
        if let Some(value) = self.to_u128() {
            return BigUint::from(value)
        }
        let mut res = BigUint::from(0u8);
        for &octet in self.slice {
            res = res << 7 | BigUint::from(octet & 0x7F);
        }
        match self.position {
            Position::First => BigUint::from(2u8),
            Position::Second => res - 80u8,
            Position::Other => res,
        }
    }
}


//--- PartialEq and Eq

impl<'a> PartialEq for Component<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.slice == other.slice
    }
}

impl<'a> Eq for Component<'a> { }


//--- Display

impl<'a> fmt::Display for Component<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_u128() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "{}", self.to_biguint()),
        }
    }
}


//------------ Iter ----------------------------------------------------------

/// An iterator over the components of an object identifier.
pub struct Iter<'a> {
    /// The remainder of the identifier’s encoded octets.
    slice: &'a [u8],

    /// The position of the next component.
    position: Position,
}

impl<'a> Iter<'a> {
    /// Creates a new iterator.
    fn new(slice: &'a [u8]) -> Self {
        Iter {
            slice,
            position: Position::First
        }
    }

    fn advance_position(&mut self) -> Position {
        let res = self.position;
        self.position = match res {
            Position::First => Position::Second,
            _ => Position::Other
        };
        res
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.slice.is_empty() {
            return None
        }
        for i in 0..self.slice.len() {
            if self.slice[i] & 0x80 == 0 {
                let res = &self.slice[..=i];
                // The first sub-identifier carries two components; it is
                // only split off once the second one has been produced.
                if self.position != Position::First {
                    self.slice = &self.slice[i + 1..];
                }
                return Some(Component::new(res, self.advance_position()));
            }
        }
        panic!("illegal object identifier (last octet has bit 8 set)");
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn oid(content: &'static [u8]) -> Oid {
        Oid::from_content(Bytes::from_static(content)).unwrap()
    }

    #[test]
    fn display() {
        // 1.3.6.1.5.5.7.1
        assert_eq!(
            oid(b"\x2B\x06\x01\x05\x05\x07\x01").to_string(),
            "1.3.6.1.5.5.7.1"
        );
        // Small first sub-identifiers.
        assert_eq!(oid(b"\x00").to_string(), "0.0");
        assert_eq!(oid(b"\x27").to_string(), "0.39");
        assert_eq!(oid(b"\x28").to_string(), "1.0");
        assert_eq!(oid(b"\x4F").to_string(), "1.39");
        assert_eq!(oid(b"\x50").to_string(), "2.0");
        // 2.999.1234567890
        assert_eq!(
            oid(b"\x88\x37\x84\xCC\xD8\x85\x52").to_string(),
            "2.999.1234567890"
        );
    }

    #[test]
    fn large_components() {
        // A second arc beyond 64 bits: the first sub-identifier is
        // 80 + 2^80, i.e., the arcs 2 and 2^80.
        let content: &'static [u8] = b"\x88\x80\x80\x80\x80\x80\x80\x80\
                                       \x80\x80\x80\x50";
        let value = oid(content);
        let mut iter = value.iter();
        assert_eq!(iter.next().unwrap().to_u32(), Some(2));
        let second = iter.next().unwrap();
        assert_eq!(second.to_u32(), None);
        assert_eq!(second.to_biguint(), BigUint::from(2u8).pow(80));
        assert!(iter.next().is_none());
        assert_eq!(value.to_string(), format!("2.{}", BigUint::from(2u8).pow(80)));

        // An arc that only fits an arbitrary-precision integer.
        let content: &'static [u8] = b"\x2A\x83\x80\x80\x80\x80\x80\x80\
                                       \x80\x80\x80\x80\x80\x80\x80\x80\
                                       \x80\x80\x80\x80\x00";
        let value = oid(content);
        let last = value.iter().nth(2).unwrap();
        assert_eq!(last.to_u128(), None);
        assert_eq!(last.to_biguint(), BigUint::from(3u8) << 133);
    }

    #[test]
    fn check_content() {
        // Trailing continuation octet.
        assert!(
            Oid::from_content(Bytes::from_static(b"\x2B\x86")).is_err()
        );
        // Empty content.
        assert!(Oid::from_content(Bytes::from_static(b"")).is_err());
        // Leading 0x80 in a sub-identifier.
        assert!(
            Oid::from_content(Bytes::from_static(b"\x80\x01")).is_err()
        );
        assert!(
            Oid::from_content(Bytes::from_static(b"\x2B\x80\x01")).is_err()
        );
        // A two-octet sub-identifier whose leading octet isn’t 0x80:
        // 0x81 0x47 decodes to 199, i.e., the arcs 2.119.
        assert!(
            Oid::from_content(Bytes::from_static(b"\x81\x47")).is_ok()
        );
        // 0x80 is only forbidden as the leading octet: 0x81 0x80 0x00
        // decodes to 16384, i.e., the arcs 2.16304.
        assert!(
            Oid::from_content(Bytes::from_static(b"\x81\x80\x00")).is_ok()
        );
    }

    #[test]
    fn const_comparison() {
        const SHA256: ConstOid = Oid(
            b"\x60\x86\x48\x01\x65\x03\x04\x02\x01"
        );
        assert_eq!(
            oid(b"\x60\x86\x48\x01\x65\x03\x04\x02\x01"), SHA256
        );
        assert_eq!(SHA256.to_string(), "2.16.840.1.101.3.4.2.1");
    }
}
