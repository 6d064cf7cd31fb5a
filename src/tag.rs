//! The identifier octets of an encoded value.
//!
//! This is a private module. Its public items are re-exported by the crate
//! root.

use std::fmt;
use crate::error::Error;


//------------ Class ---------------------------------------------------------

/// The class of a tag.
///
/// Encoded in bits 8 and 7 of the leading identifier octet.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    /// The universal class, used for the types defined by ASN.1 itself.
    Universal,

    /// The application class.
    Application,

    /// The context specific class.
    Context,

    /// The private class.
    Private,
}

impl Class {
    /// Returns the class encoded in the given identifier octet.
    fn from_ident_octet(octet: u8) -> Self {
        match octet & 0xC0 {
            0x00 => Class::Universal,
            0x40 => Class::Application,
            0x80 => Class::Context,
            _ => Class::Private,
        }
    }
}


//------------ Tag -----------------------------------------------------------

/// The tag of an encoded value.
///
/// In ASN.1, tags are used to identify the type of a value. Tags consist of
/// one of four classes, represented by the [`Class`] enum, and a number
/// within this class. In the encoded form, the tag additionally carries a
/// bit stating whether the value uses the primitive or constructed
/// encoding. Since string types may legally appear in either shape, the
/// flag is part of the tag value here and two tags are only equal if they
/// agree on class, number, and constructed flag.
///
/// # Limitations
///
/// Tag numbers must fit into 31 bits. Larger numbers are rejected as
/// malformed when encountered in encoded data.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    /// The class of the tag.
    class: Class,

    /// Does the value use the constructed encoding?
    constructed: bool,

    /// The tag number.
    number: u32,
}

/// # Constants for universal tags.
///
/// See clause 8.4 of ITU Recommendation X.690. String types that may appear
/// in both the primitive and constructed shape have a constant for either
/// shape.
impl Tag {
    /// The tag marking the end-of-contents in an indefinite length value.
    pub const END_OF_CONTENTS: Self = Self::new(Class::Universal, false, 0);

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Self::universal(1);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Self::universal(2);

    /// The tag for the primitive shape of BIT STRING, UNIVERSAL 3.
    pub const BIT_STRING: Self = Self::universal(3);

    /// The tag for the constructed shape of BIT STRING, UNIVERSAL 3.
    pub const BIT_STRING_CONSTRUCTED: Self = Self::BIT_STRING.as_constructed();

    /// The tag for the primitive shape of OCTET STRING, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Self::universal(4);

    /// The tag for the constructed shape of OCTET STRING, UNIVERSAL 4.
    pub const OCTET_STRING_CONSTRUCTED: Self
        = Self::OCTET_STRING.as_constructed();

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Self::universal(5);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Self::universal(6);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Self::universal(10);

    /// The tag for the UTF8String type, UNIVERSAL 12.
    pub const UTF8_STRING: Self = Self::universal(12);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    ///
    /// These types only exist in the constructed shape.
    pub const SEQUENCE: Self = Self::universal(16).as_constructed();

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    ///
    /// These types only exist in the constructed shape.
    pub const SET: Self = Self::universal(17).as_constructed();

    /// The tag for the NumericString type, UNIVERSAL 18.
    pub const NUMERIC_STRING: Self = Self::universal(18);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Self::universal(19);

    /// The tag for the TeletexString type, UNIVERSAL 20.
    ///
    /// The type is also known under its CCITT name T61String.
    pub const TELETEX_STRING: Self = Self::universal(20);

    /// The tag for the VideotexString type, UNIVERSAL 21.
    pub const VIDEOTEX_STRING: Self = Self::universal(21);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Self::universal(22);

    /// The tag for the GraphicString type, UNIVERSAL 25.
    pub const GRAPHIC_STRING: Self = Self::universal(25);

    /// The tag for the VisibleString type, UNIVERSAL 26.
    ///
    /// The type is also known under its ISO name ISO646String.
    pub const VISIBLE_STRING: Self = Self::universal(26);

    /// The tag for the GeneralString type, UNIVERSAL 27.
    pub const GENERAL_STRING: Self = Self::universal(27);

    /// The tag for the UniversalString type, UNIVERSAL 28.
    pub const UNIVERSAL_STRING: Self = Self::universal(28);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Self::universal(30);
}

impl Tag {
    /// Creates a new tag from its three components.
    pub const fn new(class: Class, constructed: bool, number: u32) -> Self {
        Tag { class, constructed, number }
    }

    /// Creates a new primitive tag in the universal class.
    pub const fn universal(number: u32) -> Self {
        Self::new(Class::Universal, false, number)
    }

    /// Creates a new primitive tag in the application class.
    pub const fn application(number: u32) -> Self {
        Self::new(Class::Application, false, number)
    }

    /// Creates a new primitive tag in the context specific class.
    pub const fn ctx(number: u32) -> Self {
        Self::new(Class::Context, false, number)
    }

    /// Creates a new primitive tag in the private class.
    pub const fn private(number: u32) -> Self {
        Self::new(Class::Private, false, number)
    }

    /// Returns the class of the tag.
    pub const fn class(self) -> Class {
        self.class
    }

    /// Returns whether the tag is of the universal class.
    pub fn is_universal(self) -> bool {
        matches!(self.class, Class::Universal)
    }

    /// Returns whether the tag marks a constructed value.
    pub const fn is_constructed(self) -> bool {
        self.constructed
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Returns the same tag with the constructed flag set.
    pub const fn as_constructed(self) -> Self {
        Self::new(self.class, true, self.number)
    }

    /// Returns the same tag with the constructed flag cleared.
    pub const fn as_primitive(self) -> Self {
        Self::new(self.class, false, self.number)
    }

    /// Returns whether class and number equal those of `other`.
    ///
    /// The constructed flag is ignored. This is the equivalence used when
    /// matching a value against an expected tag, since the string types may
    /// present either shape.
    pub fn eq_ignoring_constructed(self, other: Self) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Parses a tag from the beginning of a byte slice.
    ///
    /// Returns the tag and the number of identifier octets it occupied.
    /// Does not advance anything: the caller decides when to move past the
    /// octets.
    ///
    /// There are two encoded forms. In the low form, a single octet holds
    /// class, constructed flag, and a tag number up to 30. If the five
    /// number bits are all set, the number instead follows in base 128,
    /// most significant digit first, with bit 8 of every octet but the last
    /// set. The first of these octets must carry at least one payload bit,
    /// otherwise the encoding would not be minimal.
    pub(crate) fn parse(slice: &[u8]) -> Result<(Self, usize), Error> {
        let Some(&first) = slice.first() else {
            return Err(Error::malformed("unexpected end of data in tag"))
        };
        let class = Class::from_ident_octet(first);
        let constructed = first & 0x20 != 0;
        if first & 0x1F != 0x1F {
            return Ok((
                Self::new(class, constructed, u32::from(first & 0x1F)), 1
            ))
        }

        // High form. Bit 8 marks continuation, the lower seven bits are
        // payload. The first octet must not have an all-zero payload.
        let mut number = 0u32;
        for (idx, &octet) in slice.iter().enumerate().skip(1) {
            if idx == 1 && octet & 0x7F == 0 {
                return Err(Error::malformed(
                    "non-minimal multi-octet tag number"
                ))
            }
            if number > u32::MAX >> 8 {
                return Err(Error::malformed("tag number too large"))
            }
            number = number << 7 | u32::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                if number > 0x7FFF_FFFF {
                    return Err(Error::malformed("tag number too large"))
                }
                return Ok((Self::new(class, constructed, number), idx + 1))
            }
        }
        Err(Error::malformed("unexpected end of data in tag"))
    }
}


//--- Display

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_universal() {
            match self.number {
                0 => return write!(f, "END-OF-CONTENTS"),
                1 => return write!(f, "BOOLEAN"),
                2 => return write!(f, "INTEGER"),
                3 => return write!(f, "BIT STRING"),
                4 => return write!(f, "OCTET STRING"),
                5 => return write!(f, "NULL"),
                6 => return write!(f, "OBJECT IDENTIFIER"),
                10 => return write!(f, "ENUMERATED"),
                12 => return write!(f, "UTF8String"),
                16 => return write!(f, "SEQUENCE"),
                17 => return write!(f, "SET"),
                18 => return write!(f, "NumericString"),
                19 => return write!(f, "PrintableString"),
                20 => return write!(f, "TeletexString"),
                21 => return write!(f, "VideotexString"),
                22 => return write!(f, "IA5String"),
                25 => return write!(f, "GraphicString"),
                26 => return write!(f, "VisibleString"),
                27 => return write!(f, "GeneralString"),
                28 => return write!(f, "UniversalString"),
                30 => return write!(f, "BMPString"),
                _ => { }
            }
        }
        match self.class {
            Class::Universal => write!(f, "[UNIVERSAL ")?,
            Class::Application => write!(f, "[APPLICATION ")?,
            Class::Context => write!(f, "[")?,
            Class::Private => write!(f, "[PRIVATE ")?,
        }
        write!(f, "{}]", self.number)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn low_form() {
        let (tag, len) = Tag::parse(b"\x02\x01").unwrap();
        assert_eq!(tag, Tag::INTEGER);
        assert_eq!(len, 1);

        let (tag, len) = Tag::parse(b"\x30").unwrap();
        assert_eq!(tag, Tag::SEQUENCE);
        assert!(tag.is_constructed());
        assert_eq!(len, 1);

        let (tag, _) = Tag::parse(b"\xDE").unwrap();
        assert_eq!(tag.class(), Class::Private);
        assert_eq!(tag.number(), 30);
        assert!(!tag.is_constructed());
    }

    #[test]
    fn high_form() {
        // Number 31, the smallest using the high form.
        let (tag, len) = Tag::parse(b"\x1F\x1F").unwrap();
        assert_eq!(tag, Tag::universal(31));
        assert_eq!(len, 2);

        // Two payload octets.
        let (tag, len) = Tag::parse(b"\x9F\x87\x68").unwrap();
        assert_eq!(tag.class(), Class::Context);
        assert_eq!(tag.number(), 1000);
        assert_eq!(len, 3);

        // The largest number we accept.
        let (tag, len) = Tag::parse(b"\x1F\x87\xFF\xFF\xFF\x7F").unwrap();
        assert_eq!(tag.number(), 0x7FFF_FFFF);
        assert_eq!(len, 6);
    }

    #[test]
    fn high_form_errors() {
        // Zero payload in the first octet is not minimal.
        assert!(Tag::parse(b"\x1F\x00").is_err());
        assert!(Tag::parse(b"\x1F\x80\x01").is_err());

        // Number does not fit 31 bits.
        assert!(Tag::parse(b"\x1F\x88\x80\x80\x80\x00").is_err());

        // Missing continuation octets.
        assert!(Tag::parse(b"\x1F").is_err());
        assert!(Tag::parse(b"\x1F\x81").is_err());
        assert!(Tag::parse(b"").is_err());
    }

    #[test]
    fn constructed_is_part_of_equality() {
        assert_ne!(Tag::OCTET_STRING, Tag::OCTET_STRING_CONSTRUCTED);
        assert!(Tag::OCTET_STRING.eq_ignoring_constructed(
            Tag::OCTET_STRING_CONSTRUCTED
        ));
        assert_eq!(
            Tag::OCTET_STRING_CONSTRUCTED.as_primitive(), Tag::OCTET_STRING
        );
    }

    #[test]
    fn display() {
        assert_eq!(Tag::SEQUENCE.to_string(), "SEQUENCE");
        assert_eq!(Tag::ctx(0).to_string(), "[0]");
        assert_eq!(Tag::application(4).to_string(), "[APPLICATION 4]");
        assert_eq!(Tag::universal(14).to_string(), "[UNIVERSAL 14]");
    }
}
