//! The length octets.
//!
//! This is a private module. The [`Length`] defined herein is not publicly
//! exposed.

use crate::error::Error;
use crate::mode::Mode;


//------------ Length --------------------------------------------------------

/// The length octets of an encoded value.
///
/// A length value can either be definite, meaning it provides the actual
/// number of content octets in the value, or indefinite, in which case the
/// content is delimited by a special end-of-contents marker.
///
/// # Encoding
///
/// The length can be encoded in one of two basic ways. Which one is used is
/// determined by the most significant bit of the first octet. If it is not
/// set, the remaining bits of this first octet provide the definite length.
///
/// If the most significant bit is set, the remaining bits of the first
/// octet specify the number of octets that follow to encode the actual
/// length. If they specify that there are zero more octets, i.e., the
/// value of the first octet is 0x80, the length is indefinite. The value
/// 0xFF is reserved and always rejected. Otherwise, the following octets
/// give the big-endian encoding of the definite length of the content
/// octets.
///
/// Under both CER and DER rules, a definite length must be encoded in the
/// minimum number of octets, and the indefinite form is rejected under DER.
/// Definite lengths are further capped to the signed 32 bit range so that
/// they can never overflow an index computation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Length {
    /// A length known up front.
    Definite(usize),

    /// The content is delimited by an end-of-contents marker.
    Indefinite,
}

impl Length {
    /// The largest definite length we accept.
    const MAX: usize = 0x7FFF_FFFF;

    /// Returns the length if it is definite.
    pub fn definite(self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(len),
            Length::Indefinite => None,
        }
    }

    /// Parses a length from the beginning of a byte slice.
    ///
    /// Returns the length and the number of octets its encoding occupied.
    /// Enforces the minimal-encoding rules of `mode` and rejects the
    /// indefinite form where `mode` does not allow it.
    pub fn parse(slice: &[u8], mode: Mode) -> Result<(Self, usize), Error> {
        let Some(&first) = slice.first() else {
            return Err(Error::malformed("unexpected end of data in length"))
        };
        match first {
            0..=0x7F => Ok((Length::Definite(first as usize), 1)),
            0x80 => {
                if mode.allows_indefinite() {
                    Ok((Length::Indefinite, 1))
                }
                else {
                    Err(Error::malformed("indefinite length in DER mode"))
                }
            }
            0xFF => Err(Error::malformed("reserved length octet")),
            _ => Self::parse_long_form(slice, first, mode),
        }
    }

    /// Parses the long form of a definite length.
    ///
    /// The first octet has already been read; it gives the number of
    /// length octets that follow.
    fn parse_long_form(
        slice: &[u8], first: u8, mode: Mode,
    ) -> Result<(Self, usize), Error> {
        let count = (first & 0x7F) as usize;
        let Some(octets) = slice.get(1..count + 1) else {
            return Err(Error::malformed("unexpected end of data in length"))
        };

        // In CER and DER mode the encoding must be minimal: no leading
        // zero octets, and anything below 0x80 must have used the short
        // form.
        if mode.is_restricted() {
            match octets.first() {
                Some(0) => {
                    return Err(Error::malformed(
                        "non-minimal length in CER/DER mode"
                    ))
                }
                Some(&second) if count == 1 && second < 0x80 => {
                    return Err(Error::malformed(
                        "non-minimal length in CER/DER mode"
                    ))
                }
                _ => { }
            }
        }

        // BER allows leading zeros; skip them before checking the size of
        // the remaining value.
        let mut significant = octets;
        while let Some((0, tail)) = significant.split_first() {
            significant = tail;
        }
        if significant.len() > 4 {
            return Err(Error::malformed("excessive length"))
        }
        let mut res = 0usize;
        for &octet in significant {
            res = res << 8 | octet as usize;
        }
        if res > Self::MAX {
            return Err(Error::malformed("excessive length"))
        }
        Ok((Length::Definite(res), count + 1))
    }
}


//============ Tests =========================================================
