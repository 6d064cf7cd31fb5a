//! Character sets for the restricted character string types.
//!
//! The restricted character string types of ASN.1 all share the octet
//! string wire shape and differ only in which byte sequences are legal
//! and how they map to characters. This module provides the [`CharSet`]
//! trait describing such a mapping, implementations for the types the
//! crate decodes out of the box, and the lookup from a universal tag
//! number to the matching decoder.
//!
//! TeletexString, VideotexString, GraphicString, and GeneralString have
//! assigned tag numbers but reference full ISO 2022 machinery that no
//! sane decoder carries. Asking for them by tag number is an
//! invalid-argument error; callers that know what their data really
//! contains can implement [`CharSet`] themselves and use the reader’s
//! `take_character_string_with` method.

use std::{char, error, fmt, str};
use crate::error::Error;
use crate::tag::Tag;


//------------ CharSet -------------------------------------------------------

/// The character set of a restricted character string type.
///
/// An implementation ties together the natural tag of the string type
/// and the conversion from encoded bytes to characters. Decoding is
/// all-or-nothing: if any part of the input is not legal in the
/// character set, the whole conversion fails.
pub trait CharSet {
    /// The natural tag of the string type using this character set.
    const TAG: Tag;

    /// Decodes a fully reassembled byte sequence.
    fn decode(slice: &[u8]) -> Result<String, CharSetError>;
}


//------------ Utf8CharSet ---------------------------------------------------

/// The character set for the UTF8String ASN.1 type.
///
/// Any valid UTF-8 sequence is allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8CharSet;

impl CharSet for Utf8CharSet {
    const TAG: Tag = Tag::UTF8_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        str::from_utf8(slice)
            .map(String::from)
            .map_err(|_| CharSetError::default())
    }
}


//------------ Ia5CharSet ----------------------------------------------------

/// The character set for the IA5String ASN.1 type.
///
/// This character string allows all ASCII characters, i.e., octets with
/// values `0x00` to `0x7F`, and encodes them with their ASCII value. The
/// name is derived from International Alphabet No. 5, the ITU name for
/// ASCII.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ia5CharSet;

impl CharSet for Ia5CharSet {
    const TAG: Tag = Tag::IA5_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        decode_checked_ascii(slice, |ch| ch.is_ascii())
    }
}


//------------ PrintableCharSet ----------------------------------------------

/// The character set for the PrintableString ASN.1 type.
///
/// This character string allows the following characters from the ASCII
/// character set and encodes them with their ASCII value:
///
/// * the letters `A` to `Z` and `a` to `z`,
/// * the digits `0` to `9`,
/// * the space character ` `,
/// * the symbols `'`, `(`, `)`, `+`, `,`, `-`, `.`, `/`, `:`, `=`,
///   and `?`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintableCharSet;

impl CharSet for PrintableCharSet {
    const TAG: Tag = Tag::PRINTABLE_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        decode_checked_ascii(slice, |x| {
            x.is_ascii_alphanumeric() || // A-Z a-z 0-9
            x == b' ' || x == b'\'' || x == b'(' || x == b')' ||
            x == b'+' || x == b',' || x == b'-' || x == b'.' ||
            x == b'/' || x == b':' || x == b'=' || x == b'?'
        })
    }
}


//------------ NumericCharSet ------------------------------------------------

/// The character set for the NumericString ASN.1 type.
///
/// This character string allows only the decimal digits `0` to `9` and
/// the space character ` `, encoded with their ASCII value.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericCharSet;

impl CharSet for NumericCharSet {
    const TAG: Tag = Tag::NUMERIC_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        decode_checked_ascii(slice, |ch| ch == b' ' || ch.is_ascii_digit())
    }
}


//------------ VisibleCharSet ------------------------------------------------

/// The character set for the VisibleString ASN.1 type.
///
/// This character string allows the printable ASCII characters and the
/// space, i.e., octets with values `0x20` to `0x7E`. The type is also
/// known under its ISO name ISO646String.
#[derive(Clone, Copy, Debug, Default)]
pub struct VisibleCharSet;

impl CharSet for VisibleCharSet {
    const TAG: Tag = Tag::VISIBLE_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        decode_checked_ascii(slice, |ch| (0x20..=0x7E).contains(&ch))
    }
}


//------------ BmpCharSet ----------------------------------------------------

/// The character set for the BMPString ASN.1 type.
///
/// Characters are encoded as big-endian UTF-16.
#[derive(Clone, Copy, Debug, Default)]
pub struct BmpCharSet;

impl CharSet for BmpCharSet {
    const TAG: Tag = Tag::BMP_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        if slice.len() % 2 != 0 {
            return Err(CharSetError::default())
        }
        char::decode_utf16(
            slice.chunks(2).map(|chunk| {
                u16::from_be_bytes([chunk[0], chunk[1]])
            })
        ).collect::<Result<String, _>>().map_err(|_| {
            CharSetError::default()
        })
    }
}


//------------ UniversalCharSet ----------------------------------------------

/// The character set for the UniversalString ASN.1 type.
///
/// Characters are encoded as big-endian UTF-32.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniversalCharSet;

impl CharSet for UniversalCharSet {
    const TAG: Tag = Tag::UNIVERSAL_STRING;

    fn decode(slice: &[u8]) -> Result<String, CharSetError> {
        if slice.len() % 4 != 0 {
            return Err(CharSetError::default())
        }
        slice.chunks(4).map(|chunk| {
            char::from_u32(
                u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
            ).ok_or_else(CharSetError::default)
        }).collect()
    }
}


/// Decodes a byte-per-character ASCII subset.
fn decode_checked_ascii(
    slice: &[u8], check: impl Fn(u8) -> bool,
) -> Result<String, CharSetError> {
    if slice.iter().copied().all(check) {
        // Checked: every octet is ASCII and thus valid UTF-8.
        Ok(unsafe { str::from_utf8_unchecked(slice) }.into())
    }
    else {
        Err(CharSetError::default())
    }
}


//------------ Tag number lookup ---------------------------------------------

/// Returns whether the number is that of a restricted string type.
pub(crate) fn is_string_tag(number: u32) -> bool {
    // UTF8String, the 18..=22 block, and the 25..=28 block plus
    // BMPString. UTCTime and GeneralizedTime at 23 and 24 look similar
    // on the wire but are not character strings.
    matches!(number, 12 | 18..=22 | 25..=28 | 30)
}

/// Decodes string bytes via the charset assigned to a tag number.
pub(crate) fn decode(number: u32, slice: &[u8]) -> Result<String, Error> {
    let res = match number {
        12 => Utf8CharSet::decode(slice),
        18 => NumericCharSet::decode(slice),
        19 => PrintableCharSet::decode(slice),
        22 => Ia5CharSet::decode(slice),
        26 => VisibleCharSet::decode(slice),
        28 => UniversalCharSet::decode(slice),
        30 => BmpCharSet::decode(slice),
        20 | 21 | 25 | 27 => {
            return Err(Error::invalid_arg(
                "character string type without a built-in character set"
            ))
        }
        _ => {
            return Err(Error::invalid_arg(
                "not a character string tag number"
            ))
        }
    };
    res.map_err(|_| Error::malformed("invalid character string content"))
}


//------------ CharSetError --------------------------------------------------

/// A byte sequence didn’t fit its character set.
#[derive(Debug, Default)]
pub struct CharSetError(());

impl fmt::Display for CharSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid characters")
    }
}

impl error::Error for CharSetError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_sets() {
        assert_eq!(
            PrintableCharSet::decode(b"Hello, world?").unwrap(),
            "Hello, world?"
        );
        assert!(PrintableCharSet::decode(b"@home").is_err());
        assert_eq!(NumericCharSet::decode(b"23 42").unwrap(), "23 42");
        assert!(NumericCharSet::decode(b"23.42").is_err());
        assert_eq!(Ia5CharSet::decode(b"a\x07b").unwrap(), "a\x07b");
        assert!(Ia5CharSet::decode(b"caf\xC3\xA9").is_err());
        assert_eq!(VisibleCharSet::decode(b"abc").unwrap(), "abc");
        assert!(VisibleCharSet::decode(b"a\x07b").is_err());
    }

    #[test]
    fn utf8() {
        assert_eq!(
            Utf8CharSet::decode(b"caf\xC3\xA9").unwrap(), "caf\u{e9}"
        );
        assert!(Utf8CharSet::decode(b"\xC3").is_err());
    }

    #[test]
    fn bmp() {
        assert_eq!(
            BmpCharSet::decode(b"\x00h\x00i").unwrap(), "hi"
        );
        assert_eq!(
            BmpCharSet::decode(b"\x30\x42").unwrap(), "\u{3042}"
        );
        // Odd number of octets.
        assert!(BmpCharSet::decode(b"\x00h\x00").is_err());
        // Unpaired surrogate.
        assert!(BmpCharSet::decode(b"\xD8\x00").is_err());
    }

    #[test]
    fn universal() {
        assert_eq!(
            UniversalCharSet::decode(
                b"\x00\x00\x00h\x00\x01\xF6\x00"
            ).unwrap(),
            "h\u{1F600}"
        );
        assert!(UniversalCharSet::decode(b"\x00\x00\x00").is_err());
        // A surrogate code point is not a character.
        assert!(UniversalCharSet::decode(b"\x00\x00\xD8\x00").is_err());
    }

    #[test]
    fn lookup() {
        assert!(decode(22, b"hello").is_ok());
        assert!(!decode(20, b"hello").unwrap_err().is_malformed());
        assert!(!decode(2, b"hello").unwrap_err().is_malformed());
        assert!(decode(18, b"hello").unwrap_err().is_malformed());
        assert!(is_string_tag(12));
        assert!(is_string_tag(20));
        assert!(!is_string_tag(23));
        assert!(!is_string_tag(4));
    }
}
