//! BER-encoded octet strings.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use bytes::Bytes;
use crate::error::Error;
use crate::mode::Mode;
use super::segments::Segments;


//------------ OctetString ---------------------------------------------------

/// An octet string value.
///
/// An octet string is a sequence of octets, i.e., a glorified `[u8]`.
/// Basic Encoding Rules, however, allow this sequence to be broken up
/// into chunks that are encoded separately to allow for very large octet
/// strings and cases where one doesn’t yet know the length of the string
/// up front.
///
/// A value of this type contains the logical string of octets. For a
/// primitively encoded value that is a cheap slice of the input buffer;
/// reading a constructed value concatenates the segments into a fresh
/// allocation.
///
/// # BER Encoding
///
/// Octet strings are either encoded as a primitive or a constructed
/// value. In the primitive form, the content octets are the string’s
/// octets. In the constructed form, the content is a sequence of encoded
/// octet strings which in turn may be primitive or constructed. In this
/// case, the string’s octets are the concatenation of all the content
/// octets of the primitive forms in the order as encountered.
///
/// In CER, the string must use the primitive form if it is no more than
/// 1000 octets long and the constructed form otherwise. The constructed
/// form must consist of a flat sequence of primitive values, each exactly
/// 1000 octets of content except for the last one.
///
/// In DER, only the primitive form is allowed.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OctetString(Bytes);

impl OctetString {
    /// Returns the string as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Converts the string into the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns the length of the string.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}


/// # Decoding
impl OctetString {
    /// Creates a value from the content octets of a primitive encoding.
    pub(crate) fn from_primitive(
        content: Bytes, mode: Mode,
    ) -> Result<Self, Error> {
        check_primitive_len(content.len(), mode)?;
        Ok(OctetString(content))
    }

    /// Creates a value by reassembling a constructed encoding.
    ///
    /// The body is the content of the outer constructed value, scoped by
    /// the reader.
    pub(crate) fn from_constructed(
        body: &[u8], mode: Mode,
    ) -> Result<Self, Error> {
        let mut octets = Vec::new();
        reassemble(body, mode, &mut octets)?;
        Ok(OctetString(octets.into()))
    }
}


/// Checks the content length of a primitive encoding.
pub(crate) fn check_primitive_len(len: usize, mode: Mode) -> Result<(), Error> {
    if mode == Mode::Cer && len > 1000 {
        Err(Error::malformed("overlong primitive octet string in CER mode"))
    }
    else {
        Ok(())
    }
}

/// Reassembles the segments of a constructed octet string into `out`.
pub(crate) fn reassemble(
    body: &[u8], mode: Mode, out: &mut Vec<u8>,
) -> Result<(), Error> {
    let mut segments = Segments::new(body, mode, 4);
    let mut prev_len = None;
    let mut aggregate = 0usize;
    while let Some(segment) = segments.next_segment()? {
        if mode == Mode::Cer {
            if segment.len() > 1000 {
                return Err(Error::malformed(
                    "overlong octet string segment in CER mode"
                ))
            }
            if let Some(prev_len) = prev_len {
                if prev_len != 1000 {
                    return Err(Error::malformed(
                        "short intermediary octet string segment \
                         in CER mode"
                    ))
                }
            }
        }
        prev_len = Some(segment.len());
        aggregate += segment.len();
        out.extend_from_slice(segment);
    }
    if mode == Mode::Cer && aggregate <= 1000 {
        return Err(Error::malformed(
            "constructed octet string of 1000 octets or less in CER mode"
        ))
    }
    Ok(())
}


//--- AsRef

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}


//--- PartialEq

impl PartialEq<[u8]> for OctetString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl<'a> PartialEq<&'a [u8]> for OctetString {
    fn eq(&self, other: &&'a [u8]) -> bool {
        self.as_slice() == *other
    }
}

impl PartialEq<OctetString> for [u8] {
    fn eq(&self, other: &OctetString) -> bool {
        self == other.as_slice()
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitive_len() {
        assert!(check_primitive_len(1000, Mode::Cer).is_ok());
        assert!(check_primitive_len(1001, Mode::Cer).is_err());
        assert!(check_primitive_len(1001, Mode::Ber).is_ok());
        assert!(check_primitive_len(1001, Mode::Der).is_ok());
    }

    #[test]
    fn constructed() {
        let os = OctetString::from_constructed(
            b"\x04\x03foo\x04\x03bar", Mode::Ber
        ).unwrap();
        assert_eq!(os, b"foobar".as_ref());

        // Nested constructed segments are a BER privilege.
        let os = OctetString::from_constructed(
            b"\x24\x80\x04\x03foo\x00\x00\x04\x03bar", Mode::Ber
        ).unwrap();
        assert_eq!(os, b"foobar".as_ref());
        assert!(
            OctetString::from_constructed(
                b"\x24\x80\x04\x03foo\x00\x00\x04\x03bar", Mode::Cer
            ).is_err()
        );
    }

    #[test]
    fn cer_segmenting() {
        fn body(first_len: usize, second_len: usize) -> Vec<u8> {
            let mut res = Vec::new();
            res.extend_from_slice(b"\x04\x82");
            res.extend_from_slice(
                &u16::try_from(first_len).unwrap().to_be_bytes()
            );
            res.resize(res.len() + first_len, 0xAA);
            res.extend_from_slice(b"\x04\x82");
            res.extend_from_slice(
                &u16::try_from(second_len).unwrap().to_be_bytes()
            );
            res.resize(res.len() + second_len, 0xAA);
            res
        }

        let os = OctetString::from_constructed(
            &body(1000, 17), Mode::Cer
        ).unwrap();
        assert_eq!(os.len(), 1017);

        assert!(
            OctetString::from_constructed(&body(999, 17), Mode::Cer).is_err()
        );
        assert!(
            OctetString::from_constructed(
                &body(1000, 1001), Mode::Cer
            ).is_err()
        );
        assert!(
            OctetString::from_constructed(&body(400, 400), Mode::Cer).is_err()
        );
        assert!(
            OctetString::from_constructed(&body(400, 400), Mode::Ber).is_ok()
        );
    }
}
