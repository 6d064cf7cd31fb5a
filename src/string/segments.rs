//! Walking the segments of a constructed string.
//!
//! This is a private module used by the bit and octet string
//! implementations and the character string support of the reader.

use smallvec::SmallVec;
use crate::error::Error;
use crate::length::Length;
use crate::mode::Mode;
use crate::tag::{Class, Tag};


//------------ Segments ------------------------------------------------------

/// The primitive segments of a constructed string, in encoding order.
///
/// Under BER, a constructed string contains a sequence of string values
/// that may themselves be primitive or constructed, to arbitrary depth,
/// with definite or indefinite lengths freely mixed. The logical value is
/// the concatenation of the content of all primitive segments in the
/// order encountered.
///
/// This type flattens that tree iteratively. Nesting depth lives in an
/// explicit stack of enclosing value boundaries rather than on the call
/// stack, so attacker-controlled depth translates into heap growth
/// bounded by the input size instead of stack exhaustion.
///
/// The body handed to [`Segments::new`] is the content of the outermost
/// constructed value with its own end-of-contents marker, if any, already
/// removed. The caller keeps pulling [`next_segment`][Self::next_segment]
/// until it returns `Ok(None)`, which also asserts that the body was
/// fully and cleanly consumed.
pub struct Segments<'a> {
    /// The content octets of the outer constructed value.
    body: &'a [u8],

    /// The current read position within `body`.
    offset: usize,

    /// The mode we operate in.
    mode: Mode,

    /// The universal tag number every segment must carry.
    number: u32,

    /// The enclosing constructed values still open.
    stack: SmallVec<[Frame; 4]>,
}

/// An enclosing constructed value on the stack.
struct Frame {
    /// Where the value’s content ends, if it used a definite length.
    ///
    /// An indefinite length value ends at its end-of-contents marker
    /// instead.
    end: Option<usize>,

    /// The upper bound for reads within this value.
    ///
    /// This is `end` for definite length values and the nearest enclosing
    /// bound for indefinite ones.
    limit: usize,
}

impl<'a> Segments<'a> {
    /// Creates a walker over the body of a constructed string value.
    pub fn new(body: &'a [u8], mode: Mode, number: u32) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Frame { end: Some(body.len()), limit: body.len() });
        Segments { body, offset: 0, mode, number, stack }
    }

    /// Returns the content octets of the next primitive segment.
    ///
    /// Returns `Ok(None)` when the body has been cleanly consumed.
    pub fn next_segment(&mut self) -> Result<Option<&'a [u8]>, Error> {
        loop {
            let Some(frame) = self.stack.last() else {
                return Ok(None)
            };
            if frame.end == Some(self.offset) {
                self.stack.pop();
                continue
            }
            let limit = frame.limit;
            let indefinite = frame.end.is_none();

            // A bound violation here can only be the result of a bug in
            // the checks below, but better an error than a panic.
            let rest = self.body.get(self.offset..limit).ok_or_else(|| {
                Error::malformed("nested value too long")
            })?;

            let (tag, tag_len) = Tag::parse(rest)?;
            if tag == Tag::END_OF_CONTENTS {
                if !indefinite {
                    return Err(Error::malformed(
                        "end-of-contents in definite length value"
                    ))
                }
                if rest.get(tag_len) != Some(&0) {
                    return Err(Error::malformed("non-empty end-of-contents"))
                }
                self.offset += 2;
                self.stack.pop();
                continue
            }
            let (length, len_len) = Length::parse(
                &rest[tag_len..], self.mode
            )?;
            let header = tag_len + len_len;
            if tag.class() != Class::Universal
                || tag.number() != self.number
            {
                return Err(Error::malformed(
                    "unexpected tag in constructed string"
                ))
            }

            if !tag.is_constructed() {
                let Some(len) = length.definite() else {
                    return Err(Error::malformed(
                        "indefinite length primitive value"
                    ))
                };
                let end = self.offset.checked_add(header)
                    .and_then(|x| x.checked_add(len))
                    .filter(|&end| end <= limit)
                    .ok_or_else(|| {
                        Error::malformed("nested value too long")
                    })?;
                let segment = &self.body[self.offset + header..end];
                self.offset = end;
                return Ok(Some(segment))
            }

            // A constructed segment opens another level of nesting. DER
            // never gets here since the outermost constructed value is
            // already rejected; CER forbids anything but a flat sequence
            // of primitive segments.
            if self.mode.is_restricted() {
                return Err(Error::malformed(
                    "nested constructed string segment"
                ))
            }
            match length.definite() {
                Some(len) => {
                    let end = self.offset.checked_add(header)
                        .and_then(|x| x.checked_add(len))
                        .filter(|&end| end <= limit)
                        .ok_or_else(|| {
                            Error::malformed("nested value too long")
                        })?;
                    self.stack.push(Frame { end: Some(end), limit: end });
                }
                None => {
                    self.stack.push(Frame { end: None, limit });
                }
            }
            self.offset += header;
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn collect(
        body: &[u8], mode: Mode, number: u32,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let mut segments = Segments::new(body, mode, number);
        let mut res = Vec::new();
        while let Some(segment) = segments.next_segment()? {
            res.push(segment.into());
        }
        Ok(res)
    }

    #[test]
    fn flat() {
        assert_eq!(
            collect(
                b"\x04\x03foo\x04\x03bar", Mode::Ber, 4
            ).unwrap(),
            [b"foo", b"bar"]
        );
        assert_eq!(
            collect(b"", Mode::Ber, 4).unwrap(),
            Vec::<Vec<u8>>::new()
        );
    }

    #[test]
    fn nested() {
        // A definite constructed segment wrapping two primitives.
        assert_eq!(
            collect(
                b"\x24\x0A\x04\x03foo\x04\x03bar\x04\x01!",
                Mode::Ber, 4
            ).unwrap(),
            vec![b"foo".to_vec(), b"bar".to_vec(), b"!".to_vec()]
        );
        // An indefinite constructed segment.
        assert_eq!(
            collect(
                b"\x24\x80\x04\x03foo\x00\x00\x04\x03bar",
                Mode::Ber, 4
            ).unwrap(),
            vec![b"foo".to_vec(), b"bar".to_vec()]
        );
    }

    #[test]
    fn bad_nesting() {
        // Unexpected tag.
        assert!(collect(b"\x05\x00", Mode::Ber, 4).is_err());
        // Boolean hiding inside an octet string body.
        assert!(collect(b"\x01\x01\xFF", Mode::Ber, 4).is_err());
        // Segment running over the end of its enclosing value.
        assert!(collect(b"\x24\x04\x04\x04foo!", Mode::Ber, 4).is_err());
        // Unterminated indefinite segment.
        assert!(collect(b"\x24\x80\x04\x03foo", Mode::Ber, 4).is_err());
        // Constructed end-of-contents.
        assert!(
            collect(b"\x24\x80\x20\x00\x00\x00", Mode::Ber, 4).is_err()
        );
        // Nested constructed segment in CER mode.
        assert!(
            collect(
                b"\x24\x80\x04\x03foo\x00\x00", Mode::Cer, 4
            ).is_err()
        );
    }
}
