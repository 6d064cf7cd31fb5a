//! The reader over encoded data.
//!
//! This is a private module. Its public items are re-exported by the
//! crate root.

use std::cmp;
use bytes::{Buf, Bytes};
use num_bigint::BigInt;
use crate::error::Error;
use crate::int::{self, EnumRepr, Enumerated, Integer, Unsigned};
use crate::length::Length;
use crate::mode::Mode;
use crate::oid::Oid;
use crate::scratch::Scratch;
use crate::string::charset::{self, CharSet};
use crate::string::{bit, octet, BitString, Flags, OctetString};
use crate::tag::Tag;


//------------ Reader --------------------------------------------------------

/// A cursor over a buffer of encoded data.
///
/// A reader is created from a byte buffer and a [`Mode`] and is consumed
/// by successive typed reads. Each read either succeeds, leaving the
/// cursor right after the value it has processed, or fails, leaving the
/// cursor exactly where it was before the call. The buffer itself is
/// never modified.
///
/// Methods come in pairs: the plain version matches the value against
/// its natural universal tag, while the `_if` version takes an explicit
/// expected tag for implicitly tagged values. With an expected tag, class
/// and number must match the encountered tag; the constructed flag is not
/// compared since the string types may present either shape. Passing a
/// universal class expected tag whose number differs from the natural tag
/// of the method is caller misuse and fails with an invalid-argument
/// error.
///
/// The `try_take_` methods return `Ok(None)` instead of an error when the
/// value is well-formed but doesn’t match what was asked for – a value
/// too wide for the requested integer type, or a constructed string when
/// only a primitive one can be borrowed. The cursor stays put in that
/// case, so a different accessor can have another go.
///
/// Readers for the content of SEQUENCE and SET OF values returned by
/// [`take_sequence`][Self::take_sequence] and friends are fully
/// independent from their parent: the parent has already advanced past
/// the whole value and both can be used in any order.
#[derive(Clone, Debug)]
pub struct Reader {
    /// The remaining data.
    data: Bytes,

    /// The mode we are reading in.
    mode: Mode,
}

/// # General Management
impl Reader {
    /// Creates a new reader over a buffer in the given mode.
    pub fn new(data: impl Into<Bytes>, mode: Mode) -> Self {
        Reader { data: data.into(), mode }
    }

    /// Returns the mode of the reader.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the number of remaining octets.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Returns whether all data has been read.
    pub fn is_exhausted(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an error if there is unread data left.
    pub fn check_exhausted(&self) -> Result<(), Error> {
        if self.is_exhausted() {
            Ok(())
        }
        else {
            Err(Error::malformed("trailing data"))
        }
    }

    /// Advances the cursor. Only ever past a fully validated value.
    fn advance(&mut self, len: usize) {
        self.data.advance(len)
    }
}

/// # Access to Raw Values
impl Reader {
    /// Returns the tag of the next value without advancing.
    pub fn peek_tag(&self) -> Result<Tag, Error> {
        Tag::parse(self.data.as_ref()).map(|(tag, _)| tag)
    }

    /// Returns the complete encoding of the next value without advancing.
    ///
    /// The returned bytes cover identifier, length, and content octets,
    /// plus the end-of-contents marker if the value uses the indefinite
    /// length form.
    pub fn peek_encoded_value(&self) -> Result<Bytes, Error> {
        let tlv = self.peek_tlv()?;
        Ok(self.data.slice(..tlv.total()))
    }

    /// Returns the content octets of the next value without advancing.
    ///
    /// For an indefinite length value this is everything between the
    /// header and the matching end-of-contents marker.
    pub fn peek_content_bytes(&self) -> Result<Bytes, Error> {
        let tlv = self.peek_tlv()?;
        Ok(self.data.slice(tlv.content_range()))
    }

    /// Returns the complete encoding of the next value and advances.
    pub fn take_encoded_value(&mut self) -> Result<Bytes, Error> {
        let tlv = self.peek_tlv()?;
        let res = self.data.slice(..tlv.total());
        self.advance(tlv.total());
        Ok(res)
    }

    /// Advances over the next value without looking at its content.
    pub fn skip_value(&mut self) -> Result<(), Error> {
        let tlv = self.peek_tlv()?;
        self.advance(tlv.total());
        Ok(())
    }
}

/// # Reading Simple Values
impl Reader {
    /// Reads a BOOLEAN value.
    pub fn take_bool(&mut self) -> Result<bool, Error> {
        self.bool_impl(None)
    }

    /// Reads a BOOLEAN value with an explicit expected tag.
    pub fn take_bool_if(&mut self, expected: Tag) -> Result<bool, Error> {
        self.bool_impl(Some(expected))
    }

    fn bool_impl(&mut self, expected: Option<Tag>) -> Result<bool, Error> {
        let tlv = self.peek_primitive(expected, Tag::BOOLEAN)?;
        let content = &self.data.as_ref()[tlv.content_range()];
        if content.len() != 1 {
            return Err(Error::malformed("invalid boolean length"))
        }
        let res = match content[0] {
            0x00 => false,
            0xFF => true,
            _ if self.mode.is_restricted() => {
                return Err(Error::malformed(
                    "invalid boolean value in CER/DER mode"
                ))
            }
            _ => true,
        };
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a NULL value.
    pub fn take_null(&mut self) -> Result<(), Error> {
        self.null_impl(None)
    }

    /// Reads a NULL value with an explicit expected tag.
    pub fn take_null_if(&mut self, expected: Tag) -> Result<(), Error> {
        self.null_impl(Some(expected))
    }

    fn null_impl(&mut self, expected: Option<Tag>) -> Result<(), Error> {
        let tlv = self.peek_primitive(expected, Tag::NULL)?;
        if tlv.content != 0 {
            return Err(Error::malformed("invalid NULL value"))
        }
        self.advance(tlv.total());
        Ok(())
    }

    /// Reads an OBJECT IDENTIFIER value.
    pub fn take_oid(&mut self) -> Result<Oid, Error> {
        self.oid_impl(None)
    }

    /// Reads an OBJECT IDENTIFIER value with an explicit expected tag.
    pub fn take_oid_if(&mut self, expected: Tag) -> Result<Oid, Error> {
        self.oid_impl(Some(expected))
    }

    /// Reads an OBJECT IDENTIFIER value into its dotted string form.
    pub fn take_oid_string(&mut self) -> Result<String, Error> {
        self.oid_impl(None).map(|oid| oid.to_string())
    }

    /// Reads an OBJECT IDENTIFIER into its dotted string form with an
    /// explicit expected tag.
    pub fn take_oid_string_if(
        &mut self, expected: Tag,
    ) -> Result<String, Error> {
        self.oid_impl(Some(expected)).map(|oid| oid.to_string())
    }

    fn oid_impl(&mut self, expected: Option<Tag>) -> Result<Oid, Error> {
        let tlv = self.peek_primitive(expected, Tag::OID)?;
        let res = Oid::from_content(self.data.slice(tlv.content_range()))?;
        self.advance(tlv.total());
        Ok(res)
    }
}

/// # Reading Integers
impl Reader {
    /// Reads an INTEGER value into its raw content form.
    pub fn take_integer(&mut self) -> Result<Integer, Error> {
        self.integer_impl(None)
    }

    /// Reads an INTEGER value with an explicit expected tag.
    pub fn take_integer_if(
        &mut self, expected: Tag,
    ) -> Result<Integer, Error> {
        self.integer_impl(Some(expected))
    }

    fn integer_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Integer, Error> {
        let tlv = self.peek_primitive(expected, Tag::INTEGER)?;
        let res = Integer::from_content(
            self.data.slice(tlv.content_range())
        )?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads an `INTEGER (0..MAX)` value into its raw content form.
    pub fn take_unsigned(&mut self) -> Result<Unsigned, Error> {
        self.unsigned_impl(None)
    }

    /// Reads an `INTEGER (0..MAX)` value with an explicit expected tag.
    pub fn take_unsigned_if(
        &mut self, expected: Tag,
    ) -> Result<Unsigned, Error> {
        self.unsigned_impl(Some(expected))
    }

    fn unsigned_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Unsigned, Error> {
        let tlv = self.peek_primitive(expected, Tag::INTEGER)?;
        let res = Unsigned::from_content(
            self.data.slice(tlv.content_range())
        )?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads an INTEGER value into an arbitrary-precision integer.
    pub fn take_big_integer(&mut self) -> Result<BigInt, Error> {
        self.integer_impl(None).map(|int| int.to_bigint())
    }

    /// Reads an INTEGER into an arbitrary-precision integer with an
    /// explicit expected tag.
    pub fn take_big_integer_if(
        &mut self, expected: Tag,
    ) -> Result<BigInt, Error> {
        self.integer_impl(Some(expected)).map(|int| int.to_bigint())
    }

    fn try_signed(
        &mut self, expected: Option<Tag>, bits: u32,
    ) -> Result<Option<i128>, Error> {
        let tlv = self.peek_primitive(expected, Tag::INTEGER)?;
        let content = &self.data.as_ref()[tlv.content_range()];
        int::check_head(content)?;
        let Some(res) = int::parse_signed(content, bits) else {
            return Ok(None)
        };
        self.advance(tlv.total());
        Ok(Some(res))
    }

    fn try_unsigned(
        &mut self, expected: Option<Tag>, bits: u32,
    ) -> Result<Option<u128>, Error> {
        let tlv = self.peek_primitive(expected, Tag::INTEGER)?;
        let content = &self.data.as_ref()[tlv.content_range()];
        int::check_head(content)?;
        let Some(res) = int::parse_unsigned(content, bits) else {
            return Ok(None)
        };
        self.advance(tlv.total());
        Ok(Some(res))
    }
}

macro_rules! try_take_signed {
    ( $( ( $fn_name:ident, $fn_if:ident, $type:ident ), )* ) => {
        /// # Reading Fixed-width Integers
        ///
        /// Each of these methods reads an INTEGER value into a native
        /// integer type. If the well-formed value does not fit the
        /// requested type, `Ok(None)` is returned and the cursor stays
        /// put.
        impl Reader {
            $(
                /// Reads an INTEGER value into the native type.
                pub fn $fn_name(
                    &mut self
                ) -> Result<Option<$type>, Error> {
                    self.try_signed(None, $type::BITS)
                        .map(|res| res.map(|value| value as $type))
                }

                /// Reads an INTEGER value into the native type with an
                /// explicit expected tag.
                pub fn $fn_if(
                    &mut self, expected: Tag,
                ) -> Result<Option<$type>, Error> {
                    self.try_signed(Some(expected), $type::BITS)
                        .map(|res| res.map(|value| value as $type))
                }
            )*
        }
    }
}

macro_rules! try_take_unsigned {
    ( $( ( $fn_name:ident, $fn_if:ident, $type:ident ), )* ) => {
        impl Reader {
            $(
                /// Reads an INTEGER value into the native type.
                pub fn $fn_name(
                    &mut self
                ) -> Result<Option<$type>, Error> {
                    self.try_unsigned(None, $type::BITS)
                        .map(|res| res.map(|value| value as $type))
                }

                /// Reads an INTEGER value into the native type with an
                /// explicit expected tag.
                pub fn $fn_if(
                    &mut self, expected: Tag,
                ) -> Result<Option<$type>, Error> {
                    self.try_unsigned(Some(expected), $type::BITS)
                        .map(|res| res.map(|value| value as $type))
                }
            )*
        }
    }
}

try_take_signed! {
    (try_take_i8, try_take_i8_if, i8),
    (try_take_i16, try_take_i16_if, i16),
    (try_take_i32, try_take_i32_if, i32),
    (try_take_i64, try_take_i64_if, i64),
    (try_take_i128, try_take_i128_if, i128),
}

try_take_unsigned! {
    (try_take_u8, try_take_u8_if, u8),
    (try_take_u16, try_take_u16_if, u16),
    (try_take_u32, try_take_u32_if, u32),
    (try_take_u64, try_take_u64_if, u64),
    (try_take_u128, try_take_u128_if, u128),
}

/// # Reading Enumerated Values
impl Reader {
    /// Reads an ENUMERATED value into its raw content form.
    pub fn take_enumerated(&mut self) -> Result<Integer, Error> {
        self.enumerated_impl(None)
    }

    /// Reads an ENUMERATED value with an explicit expected tag.
    pub fn take_enumerated_if(
        &mut self, expected: Tag,
    ) -> Result<Integer, Error> {
        self.enumerated_impl(Some(expected))
    }

    fn enumerated_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Integer, Error> {
        let tlv = self.peek_primitive(expected, Tag::ENUMERATED)?;
        let res = Integer::from_content(
            self.data.slice(tlv.content_range())
        )?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads an ENUMERATED value into an enum type.
    pub fn take_enumerated_value<T: Enumerated>(
        &mut self
    ) -> Result<T, Error> {
        self.enumerated_value_impl(None)
    }

    /// Reads an ENUMERATED value into an enum type with an explicit
    /// expected tag.
    pub fn take_enumerated_value_if<T: Enumerated>(
        &mut self, expected: Tag,
    ) -> Result<T, Error> {
        self.enumerated_value_impl(Some(expected))
    }

    fn enumerated_value_impl<T: Enumerated>(
        &mut self, expected: Option<Tag>,
    ) -> Result<T, Error> {
        let tlv = self.peek_primitive(expected, Tag::ENUMERATED)?;
        let content = &self.data.as_ref()[tlv.content_range()];
        int::check_head(content)?;
        let repr = T::Repr::from_content(content).ok_or_else(|| {
            Error::malformed("enumerated value out of range")
        })?;
        let res = T::from_repr(repr).ok_or_else(|| {
            Error::malformed("unknown enumerated value")
        })?;
        self.advance(tlv.total());
        Ok(res)
    }
}

/// # Reading Bit Strings
impl Reader {
    /// Reads a BIT STRING value.
    ///
    /// Accepts the primitive shape in any mode and the constructed shape
    /// under BER and CER.
    pub fn take_bit_string(&mut self) -> Result<BitString, Error> {
        self.bit_string_impl(None)
    }

    /// Reads a BIT STRING value with an explicit expected tag.
    pub fn take_bit_string_if(
        &mut self, expected: Tag,
    ) -> Result<BitString, Error> {
        self.bit_string_impl(Some(expected))
    }

    fn bit_string_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<BitString, Error> {
        let tlv = self.peek_any_shape(expected, Tag::BIT_STRING)?;
        let res = if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            BitString::from_constructed(
                &self.data.as_ref()[tlv.content_range()], self.mode
            )?
        }
        else {
            BitString::from_primitive(
                self.data.slice(tlv.content_range()), self.mode
            )?
        };
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a primitively encoded BIT STRING value.
    ///
    /// Returns `Ok(None)` without advancing if the value uses the
    /// constructed shape and the mode allows that shape.
    pub fn try_take_primitive_bit_string(
        &mut self
    ) -> Result<Option<BitString>, Error> {
        self.try_primitive_bit_string_impl(None)
    }

    /// Reads a primitively encoded BIT STRING value with an explicit
    /// expected tag.
    pub fn try_take_primitive_bit_string_if(
        &mut self, expected: Tag,
    ) -> Result<Option<BitString>, Error> {
        self.try_primitive_bit_string_impl(Some(expected))
    }

    fn try_primitive_bit_string_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Option<BitString>, Error> {
        let tlv = self.peek_any_shape(expected, Tag::BIT_STRING)?;
        if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            return Ok(None)
        }
        let res = BitString::from_primitive(
            self.data.slice(tlv.content_range()), self.mode
        )?;
        self.advance(tlv.total());
        Ok(Some(res))
    }

    /// Reads a BIT STRING value into a caller-provided buffer.
    ///
    /// Constructed values are reassembled. On success returns the unused
    /// bit count and the number of octets written. Returns `Ok(None)`
    /// without advancing or touching the buffer if the value does not
    /// fit.
    pub fn try_copy_bit_string(
        &mut self, dest: &mut [u8],
    ) -> Result<Option<(u8, usize)>, Error> {
        self.try_copy_bit_string_impl(None, dest)
    }

    /// Reads a BIT STRING value into a caller-provided buffer with an
    /// explicit expected tag.
    pub fn try_copy_bit_string_if(
        &mut self, expected: Tag, dest: &mut [u8],
    ) -> Result<Option<(u8, usize)>, Error> {
        self.try_copy_bit_string_impl(Some(expected), dest)
    }

    fn try_copy_bit_string_impl(
        &mut self, expected: Option<Tag>, dest: &mut [u8],
    ) -> Result<Option<(u8, usize)>, Error> {
        let tlv = self.peek_any_shape(expected, Tag::BIT_STRING)?;
        if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            let unused = bit::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            let Some(target) = dest.get_mut(..scratch.len()) else {
                return Ok(None)
            };
            target.copy_from_slice(&scratch);
            self.advance(tlv.total());
            Ok(Some((unused, target.len())))
        }
        else {
            let bits = BitString::from_primitive(
                self.data.slice(tlv.content_range()), self.mode
            )?;
            let Some(target) = dest.get_mut(..bits.octet_len()) else {
                return Ok(None)
            };
            target.copy_from_slice(bits.octets());
            self.advance(tlv.total());
            Ok(Some((bits.unused(), bits.octet_len())))
        }
    }

    /// Reads a BIT STRING value as a named bit list into a flags type.
    ///
    /// Named bit 0 lands in bit 0 of the flags value; see [`Flags`] for
    /// the ordering contract.
    pub fn take_named_bit_list<T: Flags>(&mut self) -> Result<T, Error> {
        self.named_bit_list_impl(None)
    }

    /// Reads a named bit list with an explicit expected tag.
    pub fn take_named_bit_list_if<T: Flags>(
        &mut self, expected: Tag,
    ) -> Result<T, Error> {
        self.named_bit_list_impl(Some(expected))
    }

    fn named_bit_list_impl<T: Flags>(
        &mut self, expected: Option<Tag>,
    ) -> Result<T, Error> {
        let tlv = self.peek_any_shape(expected, Tag::BIT_STRING)?;
        let res = if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            let unused = bit::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            bit::interpret_named_bits(unused, &scratch, self.mode)?
        }
        else {
            let bits = BitString::from_primitive(
                self.data.slice(tlv.content_range()), self.mode
            )?;
            bit::interpret_named_bits(
                bits.unused(), bits.octets(), self.mode
            )?
        };
        self.advance(tlv.total());
        Ok(res)
    }
}

/// # Reading Octet Strings
impl Reader {
    /// Reads an OCTET STRING value.
    ///
    /// Accepts the primitive shape in any mode and the constructed shape
    /// under BER and CER.
    pub fn take_octet_string(&mut self) -> Result<OctetString, Error> {
        self.octet_string_impl(None)
    }

    /// Reads an OCTET STRING value with an explicit expected tag.
    pub fn take_octet_string_if(
        &mut self, expected: Tag,
    ) -> Result<OctetString, Error> {
        self.octet_string_impl(Some(expected))
    }

    fn octet_string_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<OctetString, Error> {
        let tlv = self.peek_any_shape(expected, Tag::OCTET_STRING)?;
        let res = if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            OctetString::from_constructed(
                &self.data.as_ref()[tlv.content_range()], self.mode
            )?
        }
        else {
            OctetString::from_primitive(
                self.data.slice(tlv.content_range()), self.mode
            )?
        };
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a primitively encoded OCTET STRING value.
    ///
    /// Returns `Ok(None)` without advancing if the value uses the
    /// constructed shape and the mode allows that shape.
    pub fn try_take_primitive_octet_string(
        &mut self
    ) -> Result<Option<OctetString>, Error> {
        self.try_primitive_octet_string_impl(None)
    }

    /// Reads a primitively encoded OCTET STRING value with an explicit
    /// expected tag.
    pub fn try_take_primitive_octet_string_if(
        &mut self, expected: Tag,
    ) -> Result<Option<OctetString>, Error> {
        self.try_primitive_octet_string_impl(Some(expected))
    }

    fn try_primitive_octet_string_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Option<OctetString>, Error> {
        let tlv = self.peek_any_shape(expected, Tag::OCTET_STRING)?;
        if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            return Ok(None)
        }
        let res = OctetString::from_primitive(
            self.data.slice(tlv.content_range()), self.mode
        )?;
        self.advance(tlv.total());
        Ok(Some(res))
    }

    /// Reads an OCTET STRING value into a caller-provided buffer.
    ///
    /// Constructed values are reassembled. On success returns the number
    /// of octets written. Returns `Ok(None)` without advancing or
    /// touching the buffer if the value does not fit.
    pub fn try_copy_octet_string(
        &mut self, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_octet_string_impl(None, dest)
    }

    /// Reads an OCTET STRING value into a caller-provided buffer with an
    /// explicit expected tag.
    pub fn try_copy_octet_string_if(
        &mut self, expected: Tag, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_octet_string_impl(Some(expected), dest)
    }

    fn try_copy_octet_string_impl(
        &mut self, expected: Option<Tag>, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        let tlv = self.peek_any_shape(expected, Tag::OCTET_STRING)?;
        if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            octet::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            let Some(target) = dest.get_mut(..scratch.len()) else {
                return Ok(None)
            };
            target.copy_from_slice(&scratch);
            self.advance(tlv.total());
            Ok(Some(target.len()))
        }
        else {
            let os = OctetString::from_primitive(
                self.data.slice(tlv.content_range()), self.mode
            )?;
            let Some(target) = dest.get_mut(..os.len()) else {
                return Ok(None)
            };
            target.copy_from_slice(os.as_slice());
            self.advance(tlv.total());
            Ok(Some(os.len()))
        }
    }
}

/// # Reading Character Strings
impl Reader {
    /// Reads a character string value of the type given by tag number.
    ///
    /// The number must be that of one of the restricted character string
    /// types with a built-in character set; see the [`charset`] module
    /// for which those are. Decoding is all-or-nothing: on any failure
    /// the cursor does not advance and nothing is returned.
    ///
    /// [`charset`]: crate::string::charset
    pub fn take_character_string(
        &mut self, number: u32,
    ) -> Result<String, Error> {
        let (tlv, res) = self.decode_character_string(None, number)?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a character string value with an explicit expected tag.
    pub fn take_character_string_if(
        &mut self, number: u32, expected: Tag,
    ) -> Result<String, Error> {
        let (tlv, res) = self.decode_character_string(
            Some(expected), number
        )?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a character string value using a caller-provided charset.
    ///
    /// This is the extension point for string types the crate has no
    /// built-in decoder for.
    pub fn take_character_string_with<C: CharSet>(
        &mut self
    ) -> Result<String, Error> {
        self.character_string_with_impl::<C>(None)
    }

    /// Reads a character string via a caller-provided charset with an
    /// explicit expected tag.
    pub fn take_character_string_with_if<C: CharSet>(
        &mut self, expected: Tag,
    ) -> Result<String, Error> {
        self.character_string_with_impl::<C>(Some(expected))
    }

    fn character_string_with_impl<C: CharSet>(
        &mut self, expected: Option<Tag>,
    ) -> Result<String, Error> {
        let tlv = self.peek_any_shape(expected, C::TAG.as_primitive())?;
        let res = if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            octet::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            C::decode(&scratch)
        }
        else {
            octet::check_primitive_len(tlv.content, self.mode)?;
            C::decode(&self.data.as_ref()[tlv.content_range()])
        }.map_err(|_| {
            Error::malformed("invalid character string content")
        })?;
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a character string into a caller-provided buffer as UTF-8.
    ///
    /// On success returns the number of octets written. Returns
    /// `Ok(None)` without advancing or touching the buffer if the
    /// decoded string does not fit.
    pub fn try_copy_character_string(
        &mut self, number: u32, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_character_string_impl(None, number, dest)
    }

    /// Reads a character string into a caller-provided buffer as UTF-8
    /// with an explicit expected tag.
    pub fn try_copy_character_string_if(
        &mut self, number: u32, expected: Tag, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_character_string_impl(Some(expected), number, dest)
    }

    fn try_copy_character_string_impl(
        &mut self, expected: Option<Tag>, number: u32, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        use zeroize::Zeroize;

        let (tlv, mut decoded) = self.decode_character_string(
            expected, number
        )?;
        let res = match dest.get_mut(..decoded.len()) {
            Some(target) => {
                target.copy_from_slice(decoded.as_bytes());
                self.advance(tlv.total());
                Some(target.len())
            }
            None => None,
        };
        decoded.zeroize();
        Ok(res)
    }

    /// Reads the raw bytes of a character string into a buffer.
    ///
    /// Only the wire shape is validated; the content is not checked
    /// against the character set. On success returns the number of
    /// octets written. Returns `Ok(None)` without advancing or touching
    /// the buffer if the value does not fit.
    pub fn try_copy_character_string_bytes(
        &mut self, number: u32, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_character_string_bytes_impl(None, number, dest)
    }

    /// Reads the raw bytes of a character string into a buffer with an
    /// explicit expected tag.
    pub fn try_copy_character_string_bytes_if(
        &mut self, number: u32, expected: Tag, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        self.try_copy_character_string_bytes_impl(
            Some(expected), number, dest
        )
    }

    fn try_copy_character_string_bytes_impl(
        &mut self, expected: Option<Tag>, number: u32, dest: &mut [u8],
    ) -> Result<Option<usize>, Error> {
        if !charset::is_string_tag(number) {
            return Err(Error::invalid_arg(
                "not a character string tag number"
            ))
        }
        let tlv = self.peek_any_shape(expected, Tag::universal(number))?;
        if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            octet::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            let Some(target) = dest.get_mut(..scratch.len()) else {
                return Ok(None)
            };
            target.copy_from_slice(&scratch);
            self.advance(tlv.total());
            Ok(Some(target.len()))
        }
        else {
            octet::check_primitive_len(tlv.content, self.mode)?;
            let content = &self.data.as_ref()[tlv.content_range()];
            let Some(target) = dest.get_mut(..content.len()) else {
                return Ok(None)
            };
            target.copy_from_slice(content);
            self.advance(tlv.total());
            Ok(Some(target.len()))
        }
    }

    /// Validates and decodes a character string without advancing.
    fn decode_character_string(
        &self, expected: Option<Tag>, number: u32,
    ) -> Result<(Tlv, String), Error> {
        if !charset::is_string_tag(number) {
            return Err(Error::invalid_arg(
                "not a character string tag number"
            ))
        }
        let tlv = self.peek_any_shape(expected, Tag::universal(number))?;
        let res = if tlv.tag.is_constructed() {
            self.check_constructed_string()?;
            let mut scratch = Scratch::rent();
            octet::reassemble(
                &self.data.as_ref()[tlv.content_range()],
                self.mode,
                &mut scratch,
            )?;
            charset::decode(number, &scratch)?
        }
        else {
            octet::check_primitive_len(tlv.content, self.mode)?;
            charset::decode(
                number, &self.data.as_ref()[tlv.content_range()]
            )?
        };
        Ok((tlv, res))
    }
}

/// # Reading Nested Values
impl Reader {
    /// Reads a SEQUENCE value, returning a reader over its content.
    pub fn take_sequence(&mut self) -> Result<Reader, Error> {
        self.sequence_impl(None)
    }

    /// Reads a SEQUENCE value with an explicit expected tag.
    pub fn take_sequence_if(
        &mut self, expected: Tag,
    ) -> Result<Reader, Error> {
        self.sequence_impl(Some(expected))
    }

    fn sequence_impl(
        &mut self, expected: Option<Tag>,
    ) -> Result<Reader, Error> {
        let tlv = self.peek_constructed(expected, Tag::SEQUENCE)?;
        let res = Reader {
            data: self.data.slice(tlv.content_range()),
            mode: self.mode,
        };
        self.advance(tlv.total());
        Ok(res)
    }

    /// Reads a SET OF value, returning a reader over its content.
    ///
    /// Under CER and DER, the elements are checked to be in the
    /// canonical order of X.690 clause 11.6 before the reader is
    /// returned. BER has no ordering requirement.
    pub fn take_set_of(&mut self) -> Result<Reader, Error> {
        self.set_of_impl(None, true)
    }

    /// Reads a SET OF value with an explicit expected tag.
    pub fn take_set_of_if(
        &mut self, expected: Tag,
    ) -> Result<Reader, Error> {
        self.set_of_impl(Some(expected), true)
    }

    /// Reads a SET OF value without validating the element order.
    ///
    /// For data produced by writers that are known not to sort their
    /// sets.
    pub fn take_set_of_unchecked(&mut self) -> Result<Reader, Error> {
        self.set_of_impl(None, false)
    }

    /// Reads a SET OF value without order validation with an explicit
    /// expected tag.
    pub fn take_set_of_unchecked_if(
        &mut self, expected: Tag,
    ) -> Result<Reader, Error> {
        self.set_of_impl(Some(expected), false)
    }

    fn set_of_impl(
        &mut self, expected: Option<Tag>, check_order: bool,
    ) -> Result<Reader, Error> {
        let tlv = self.peek_constructed(expected, Tag::SET)?;
        let res = Reader {
            data: self.data.slice(tlv.content_range()),
            mode: self.mode,
        };
        if check_order && self.mode.is_restricted() {
            res.check_set_order()?;
        }
        self.advance(tlv.total());
        Ok(res)
    }

    /// Checks that the encoded elements are in canonical order.
    fn check_set_order(&self) -> Result<(), Error> {
        let mut reader = self.clone();
        let mut prev: Option<Bytes> = None;
        while !reader.is_exhausted() {
            let current = reader.take_encoded_value()?;
            if let Some(prev) = &prev {
                if canonical_order(prev, &current) == cmp::Ordering::Greater {
                    return Err(Error::malformed(
                        "SET OF elements out of canonical order"
                    ))
                }
            }
            prev = Some(current);
        }
        Ok(())
    }
}

/// # Internal Plumbing
impl Reader {
    /// Parses the header of the next value without advancing.
    ///
    /// Enforces everything about a value that can be decided from tag
    /// and length alone: minimal length encoding per mode, no indefinite
    /// primitives, no definite constructed values in CER mode, and that
    /// the full value is present in the buffer. For indefinite length
    /// values this includes locating the matching end-of-contents
    /// marker.
    fn peek_tlv(&self) -> Result<Tlv, Error> {
        let data = self.data.as_ref();
        let (tag, tag_len) = Tag::parse(data)?;
        if tag.is_universal() && tag.number() == 0 {
            return Err(Error::malformed("unexpected end-of-contents"))
        }
        let (length, len_len) = Length::parse(&data[tag_len..], self.mode)?;
        let header = tag_len + len_len;
        match length {
            Length::Definite(len) => {
                if tag.is_constructed()
                    && !self.mode.allows_definite_constructed()
                {
                    return Err(Error::malformed(
                        "definite length constructed value in CER mode"
                    ))
                }
                if data.len() - header < len {
                    return Err(Error::malformed(
                        "value length exceeds available data"
                    ))
                }
                Ok(Tlv { tag, header, content: len, indefinite: false })
            }
            Length::Indefinite => {
                if !tag.is_constructed() {
                    return Err(Error::malformed(
                        "indefinite length primitive value"
                    ))
                }
                let content = seek_end_of_contents(
                    &data[header..], self.mode
                )?;
                Ok(Tlv { tag, header, content, indefinite: true })
            }
        }
    }

    /// Peeks the next value, which must be primitively encoded.
    fn peek_primitive(
        &self, expected: Option<Tag>, natural: Tag,
    ) -> Result<Tlv, Error> {
        let tlv = self.peek_tlv()?;
        check_expected(tlv.tag, expected, natural)?;
        if tlv.tag.is_constructed() {
            return Err(Error::malformed("expected primitive encoding"))
        }
        Ok(tlv)
    }

    /// Peeks the next value, which must be constructed.
    fn peek_constructed(
        &self, expected: Option<Tag>, natural: Tag,
    ) -> Result<Tlv, Error> {
        let tlv = self.peek_tlv()?;
        check_expected(tlv.tag, expected, natural)?;
        if !tlv.tag.is_constructed() {
            return Err(Error::malformed("expected constructed encoding"))
        }
        Ok(tlv)
    }

    /// Peeks the next value, accepting either shape.
    fn peek_any_shape(
        &self, expected: Option<Tag>, natural: Tag,
    ) -> Result<Tlv, Error> {
        let tlv = self.peek_tlv()?;
        check_expected(tlv.tag, expected, natural)?;
        Ok(tlv)
    }

    /// Rejects constructed strings where the mode forbids them.
    fn check_constructed_string(&self) -> Result<(), Error> {
        if self.mode == Mode::Der {
            Err(Error::malformed("constructed string in DER mode"))
        }
        else {
            Ok(())
        }
    }
}


//------------ Tlv -----------------------------------------------------------

/// The parsed header of an encoded value.
#[derive(Clone, Copy, Debug)]
struct Tlv {
    /// The tag of the value.
    tag: Tag,

    /// The number of identifier and length octets.
    header: usize,

    /// The number of content octets.
    ///
    /// For an indefinite length value, the number of octets up to but
    /// not including the end-of-contents marker.
    content: usize,

    /// Whether the value uses the indefinite length form.
    indefinite: bool,
}

impl Tlv {
    /// The total number of octets the encoded value occupies.
    fn total(&self) -> usize {
        self.header + self.content + if self.indefinite { 2 } else { 0 }
    }

    /// The range of the content octets within the buffer.
    fn content_range(&self) -> std::ops::Range<usize> {
        self.header..self.header + self.content
    }
}


//------------ Helper functions ----------------------------------------------

/// Finds the end-of-contents marker matching an indefinite length value.
///
/// The slice starts right after the header of the value. Returns the
/// number of content octets before the matching marker.
///
/// The walk maintains a depth counter rather than recursing, so deeply
/// nested input costs nothing but time linear in its size.
fn seek_end_of_contents(data: &[u8], mode: Mode) -> Result<usize, Error> {
    let mut depth = 1usize;
    let mut offset = 0usize;
    loop {
        let (tag, tag_len) = Tag::parse(&data[offset..])?;
        if tag == Tag::END_OF_CONTENTS {
            // The marker is exactly two octets: its tag and a single
            // zero length octet.
            if data.get(offset + tag_len) != Some(&0) {
                return Err(Error::malformed("non-empty end-of-contents"))
            }
            depth -= 1;
            if depth == 0 {
                return Ok(offset)
            }
            offset += 2;
            continue
        }
        if tag.is_universal() && tag.number() == 0 {
            return Err(Error::malformed("constructed end-of-contents"))
        }
        let (length, len_len) = Length::parse(
            &data[offset + tag_len..], mode
        )?;
        let header = tag_len + len_len;
        match length {
            Length::Definite(len) => {
                if tag.is_constructed()
                    && !mode.allows_definite_constructed()
                {
                    return Err(Error::malformed(
                        "definite length constructed value in CER mode"
                    ))
                }
                offset = offset.checked_add(header)
                    .and_then(|res| res.checked_add(len))
                    .filter(|&res| res <= data.len())
                    .ok_or_else(|| {
                        Error::malformed("value length exceeds available data")
                    })?;
            }
            Length::Indefinite => {
                if !tag.is_constructed() {
                    return Err(Error::malformed(
                        "indefinite length primitive value"
                    ))
                }
                depth += 1;
                offset += header;
            }
        }
    }
}

/// Checks an encountered tag against the caller’s expectation.
///
/// Without an explicit expected tag, the encountered tag must match the
/// natural tag of the type being read. With one, the expected tag takes
/// over, but a universal class expected tag must agree with the natural
/// tag’s number – anything else is a programming error on the caller’s
/// side. The constructed flag is never compared here.
fn check_expected(
    actual: Tag, expected: Option<Tag>, natural: Tag,
) -> Result<(), Error> {
    let expected = match expected {
        Some(expected) => {
            if expected.is_universal()
                && expected.number() != natural.number()
            {
                return Err(Error::invalid_arg(
                    "universal expected tag with foreign tag number"
                ))
            }
            expected
        }
        None => natural,
    };
    if actual.eq_ignoring_constructed(expected) {
        Ok(())
    }
    else {
        Err(Error::malformed(
            format!("expected {}, found {}", expected, actual)
        ))
    }
}

/// Compares two encoded values in the order of X.690 clause 11.6.
///
/// The shorter value is conceptually padded with zero octets at its end,
/// the two are compared lexicographically, and if they are still equal
/// the longer one is the greater. Since an octet can never be below
/// zero, this collapses into comparing the common prefix and falling
/// back to the lengths.
fn canonical_order(left: &[u8], right: &[u8]) -> cmp::Ordering {
    let common = cmp::min(left.len(), right.len());
    left[..common].cmp(&right[..common])
        .then_with(|| left.len().cmp(&right.len()))
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use hex_literal::hex;
    use super::*;

    fn reader(data: &[u8], mode: Mode) -> Reader {
        Reader::new(Bytes::copy_from_slice(data), mode)
    }

    #[test]
    fn read_bool() {
        for mode in [Mode::Ber, Mode::Cer, Mode::Der] {
            let mut rdr = reader(&hex!("0101FF"), mode);
            assert_eq!(rdr.take_bool().unwrap(), true);
            assert!(rdr.is_exhausted());

            let mut rdr = reader(&hex!("010100"), mode);
            assert_eq!(rdr.take_bool().unwrap(), false);
        }

        // Any non-zero octet is true under BER, rejected otherwise.
        assert_eq!(
            reader(&hex!("010101"), Mode::Ber).take_bool().unwrap(), true
        );
        assert!(reader(&hex!("010101"), Mode::Der).take_bool().is_err());
        assert!(reader(&hex!("010101"), Mode::Cer).take_bool().is_err());

        // Bad lengths.
        assert!(reader(&hex!("0100"), Mode::Ber).take_bool().is_err());
        assert!(reader(&hex!("0102FFFF"), Mode::Ber).take_bool().is_err());
    }

    #[test]
    fn cursor_stays_on_failure() {
        let mut rdr = reader(&hex!("010101"), Mode::Der);
        assert!(rdr.take_bool().is_err());
        assert_eq!(rdr.remaining(), 3);
        assert!(rdr.try_take_i8().is_err());
        assert_eq!(rdr.remaining(), 3);

        // A width miss doesn’t advance either.
        let mut rdr = reader(&hex!("02020080"), Mode::Der);
        assert_eq!(rdr.try_take_i8().unwrap(), None);
        assert_eq!(rdr.remaining(), 4);
        assert_eq!(rdr.try_take_u8().unwrap(), Some(128));
        assert!(rdr.is_exhausted());
    }

    #[test]
    fn read_integers() {
        let mut rdr = reader(&hex!("020180"), Mode::Der);
        assert_eq!(rdr.try_take_i8().unwrap(), Some(-128));

        let mut rdr = reader(&hex!("020180"), Mode::Der);
        assert_eq!(rdr.try_take_u8().unwrap(), None);

        // 128 needs the padded form for unsigned.
        let mut rdr = reader(&hex!("02020080"), Mode::Der);
        assert_eq!(rdr.try_take_u8().unwrap(), Some(128));

        let mut rdr = reader(&hex!("02020080"), Mode::Der);
        assert_eq!(rdr.try_take_i16().unwrap(), Some(128));

        // Redundant leading octets.
        assert!(
            reader(&hex!("02020000"), Mode::Ber).take_integer().is_err()
        );
        assert!(
            reader(&hex!("0202FF80"), Mode::Ber).take_integer().is_err()
        );
        assert!(
            reader(&hex!("0202FF7F"), Mode::Ber).take_integer().is_ok()
        );
        assert!(reader(&hex!("0200"), Mode::Ber).take_integer().is_err());

        // Big integers.
        let mut rdr = reader(
            &hex!("020900FFFFFFFFFFFFFFFF"), Mode::Der
        );
        assert_eq!(
            rdr.take_big_integer().unwrap(),
            BigInt::from(u64::MAX)
        );

        let mut rdr = reader(&hex!("0202FF00"), Mode::Der);
        assert_eq!(rdr.take_big_integer().unwrap(), BigInt::from(-256));

        // The unsigned raw form refuses negative values.
        assert!(
            reader(&hex!("0202FF00"), Mode::Der).take_unsigned().is_err()
        );
        assert_eq!(
            reader(&hex!("02020080"), Mode::Der).take_unsigned()
                .unwrap().value_slice(),
            &hex!("80")
        );
    }

    #[test]
    fn read_null() {
        let mut rdr = reader(&hex!("0500"), Mode::Der);
        rdr.take_null().unwrap();
        assert!(rdr.is_exhausted());
        rdr.check_exhausted().unwrap();

        assert!(reader(&hex!("050100"), Mode::Der).take_null().is_err());
    }

    #[test]
    fn read_oid() {
        let mut rdr = reader(&hex!("06072B060105050701"), Mode::Der);
        assert_eq!(
            rdr.take_oid_string().unwrap(),
            "1.3.6.1.5.5.7.1"
        );
        assert!(rdr.is_exhausted());

        assert_eq!(
            reader(&hex!("06078837 84CCD885 52"), Mode::Der)
                .take_oid_string().unwrap(),
            "2.999.1234567890"
        );

        // Sub-identifier with leading 0x80.
        assert!(
            reader(&hex!("06028001"), Mode::Der).take_oid().is_err()
        );
        // Empty content.
        assert!(reader(&hex!("0600"), Mode::Der).take_oid().is_err());
    }

    #[test]
    fn read_enumerated() {
        #[derive(Debug, Eq, PartialEq)]
        enum Color { Red, Green, Blue }

        impl Enumerated for Color {
            type Repr = u8;

            fn from_repr(repr: u8) -> Option<Self> {
                match repr {
                    0 => Some(Color::Red),
                    1 => Some(Color::Green),
                    2 => Some(Color::Blue),
                    _ => None
                }
            }
        }

        let mut rdr = reader(&hex!("0A0101"), Mode::Der);
        assert_eq!(
            rdr.take_enumerated_value::<Color>().unwrap(), Color::Green
        );
        assert!(rdr.is_exhausted());

        // Unknown discriminant.
        assert!(
            reader(&hex!("0A0117"), Mode::Der)
                .take_enumerated_value::<Color>().is_err()
        );
        // Wrong tag: INTEGER is not ENUMERATED.
        assert!(
            reader(&hex!("020101"), Mode::Der)
                .take_enumerated_value::<Color>().is_err()
        );
        // Raw access.
        assert_eq!(
            reader(&hex!("0A0117"), Mode::Der).take_enumerated()
                .unwrap().as_slice(),
            &hex!("17")
        );
    }

    #[test]
    fn read_sequence() {
        let mut rdr = reader(&hex!("3006 020101 020102"), Mode::Der);
        let mut seq = rdr.take_sequence().unwrap();
        assert!(rdr.is_exhausted());
        assert_eq!(seq.try_take_i32().unwrap(), Some(1));
        assert_eq!(seq.try_take_i32().unwrap(), Some(2));
        seq.check_exhausted().unwrap();

        // A primitive sequence is no sequence.
        assert!(
            reader(&hex!("1006020101020102"), Mode::Der)
                .take_sequence().is_err()
        );

        // Indefinite length under BER.
        let mut rdr = reader(
            &hex!("3080 020101 020102 0000"), Mode::Ber
        );
        let mut seq = rdr.take_sequence().unwrap();
        assert!(rdr.is_exhausted());
        assert_eq!(seq.try_take_i32().unwrap(), Some(1));
        assert_eq!(seq.try_take_i32().unwrap(), Some(2));
        assert!(seq.is_exhausted());

        // ... but not under DER.
        assert!(
            reader(&hex!("3080020101020102 0000"), Mode::Der)
                .take_sequence().is_err()
        );
        // Definite constructed is rejected under CER in turn.
        assert!(
            reader(&hex!("3006020101020102"), Mode::Cer)
                .take_sequence().is_err()
        );
    }

    #[test]
    fn read_set_of() {
        // Out of canonical order: rejected in DER, fine in BER.
        let data = hex!("3106 020102 020101");
        assert!(reader(&data, Mode::Der).take_set_of().is_err());
        assert!(reader(&data, Mode::Der).take_set_of_unchecked().is_ok());
        let mut set = reader(&data, Mode::Ber).take_set_of().unwrap();
        assert_eq!(set.try_take_i32().unwrap(), Some(2));
        assert_eq!(set.try_take_i32().unwrap(), Some(1));

        // In order.
        let data = hex!("3106 020101 020102");
        let mut set = reader(&data, Mode::Der).take_set_of().unwrap();
        assert_eq!(set.try_take_i32().unwrap(), Some(1));
        assert_eq!(set.try_take_i32().unwrap(), Some(2));
        set.check_exhausted().unwrap();

        // Equal elements are allowed.
        let data = hex!("3106 020101 020101");
        assert!(reader(&data, Mode::Der).take_set_of().is_ok());

        // A shorter prefix sorts before the longer value.
        let data = hex!("3107 020101 02020101");
        assert!(reader(&data, Mode::Der).take_set_of().is_ok());
        let data = hex!("3107 02020101 020101");
        assert!(reader(&data, Mode::Der).take_set_of().is_err());
    }

    #[test]
    fn read_bit_string() {
        let data = hex!("0307 040A3B5F291CD0");
        let bits = reader(&data, Mode::Der).take_bit_string().unwrap();
        assert_eq!(bits.unused(), 4);
        assert_eq!(bits.octets(), &hex!("0A3B5F291CD0"));

        // Constructed in BER, forbidden in DER.
        let data = hex!("2380 0303000A3B 030204D0 0000");
        let bits = reader(&data, Mode::Ber).take_bit_string().unwrap();
        assert_eq!(bits.unused(), 4);
        assert_eq!(bits.octets(), &hex!("0A3BD0"));
        assert!(reader(&data, Mode::Der).take_bit_string().is_err());

        // try_take returns None on the constructed shape under BER.
        let mut rdr = reader(&data, Mode::Ber);
        assert!(
            rdr.try_take_primitive_bit_string().unwrap().is_none()
        );
        assert_eq!(rdr.remaining(), data.len());
        // ... and still reads it as a whole.
        assert!(rdr.take_bit_string().is_ok());
        assert!(rdr.is_exhausted());
    }

    #[test]
    fn copy_bit_string() {
        let data = hex!("0307 040A3B5F291CD0");
        let mut buf = [0u8; 8];
        let mut rdr = reader(&data, Mode::Der);
        assert_eq!(
            rdr.try_copy_bit_string(&mut buf).unwrap(), Some((4, 6))
        );
        assert_eq!(&buf[..6], &hex!("0A3B5F291CD0"));
        assert!(rdr.is_exhausted());

        // Too small a destination.
        let mut buf = [0u8; 4];
        let mut rdr = reader(&data, Mode::Der);
        assert_eq!(rdr.try_copy_bit_string(&mut buf).unwrap(), None);
        assert_eq!(rdr.remaining(), data.len());

        // Reassembly into the destination.
        let data = hex!("2380 0303000A3B 030204D0 0000");
        let mut buf = [0u8; 8];
        let mut rdr = reader(&data, Mode::Ber);
        assert_eq!(
            rdr.try_copy_bit_string(&mut buf).unwrap(), Some((4, 3))
        );
        assert_eq!(&buf[..3], &hex!("0A3BD0"));
    }

    #[test]
    fn read_octet_string() {
        let data = hex!("0403 666F6F");
        let os = reader(&data, Mode::Der).take_octet_string().unwrap();
        assert_eq!(os, b"foo".as_ref());

        // Constructed, definite, BER only.
        let data = hex!("240A 0403666F6F 0403626172");
        let os = reader(&data, Mode::Ber).take_octet_string().unwrap();
        assert_eq!(os, b"foobar".as_ref());
        assert!(reader(&data, Mode::Der).take_octet_string().is_err());
        assert!(reader(&data, Mode::Cer).take_octet_string().is_err());

        let mut rdr = reader(&data, Mode::Ber);
        assert!(
            rdr.try_take_primitive_octet_string().unwrap().is_none()
        );
        assert_eq!(rdr.remaining(), data.len());

        // Copying.
        let mut buf = [0u8; 16];
        let mut rdr = reader(&data, Mode::Ber);
        assert_eq!(
            rdr.try_copy_octet_string(&mut buf).unwrap(), Some(6)
        );
        assert_eq!(&buf[..6], b"foobar");

        let mut buf = [0u8; 3];
        let mut rdr = reader(&data, Mode::Ber);
        assert_eq!(rdr.try_copy_octet_string(&mut buf).unwrap(), None);
        assert_eq!(rdr.remaining(), data.len());
    }

    #[test]
    fn read_character_string() {
        // IA5String, primitive.
        let data = hex!("1605 68656C6C6F");
        assert_eq!(
            reader(&data, Mode::Der).take_character_string(22).unwrap(),
            "hello"
        );

        // Constructed UTF8String under BER. The segments carry the
        // OCTET STRING tag per X.690 8.23.6.
        let data = hex!("2C80 0403636166 0402C3A9 0000");
        assert_eq!(
            reader(&data, Mode::Ber).take_character_string(12).unwrap(),
            "caf\u{e9}"
        );
        // A segment boundary may split a UTF-8 sequence; reassembly
        // happens before decoding.
        let data = hex!("2C80 0404636166C3 0401A9 0000");
        assert_eq!(
            reader(&data, Mode::Ber).take_character_string(12).unwrap(),
            "caf\u{e9}"
        );

        // Content violating the character set.
        let mut rdr = reader(&hex!("1203616263"), Mode::Der);
        assert!(rdr.take_character_string(18).is_err());
        assert_eq!(rdr.remaining(), 5);

        // Unknown or unsupported tag numbers.
        let mut rdr = reader(&hex!("1403616263"), Mode::Der);
        let err = rdr.take_character_string(20).unwrap_err();
        assert!(!err.is_malformed());
        let err = rdr.take_character_string(2).unwrap_err();
        assert!(!err.is_malformed());
        assert_eq!(rdr.remaining(), 5);

        // Raw bytes don’t care about the character set.
        let mut buf = [0u8; 8];
        let mut rdr = reader(&hex!("1203616263"), Mode::Der);
        assert_eq!(
            rdr.try_copy_character_string_bytes(18, &mut buf).unwrap(),
            Some(3)
        );
        assert_eq!(&buf[..3], b"abc");

        // Decoded copy.
        let mut buf = [0u8; 8];
        let mut rdr = reader(&hex!("1605 68656C6C6F"), Mode::Der);
        assert_eq!(
            rdr.try_copy_character_string(22, &mut buf).unwrap(),
            Some(5)
        );
        assert_eq!(&buf[..5], b"hello");
        let mut buf = [0u8; 3];
        let mut rdr = reader(&hex!("1605 68656C6C6F"), Mode::Der);
        assert_eq!(
            rdr.try_copy_character_string(22, &mut buf).unwrap(), None
        );
        assert_eq!(rdr.remaining(), 7);
    }

    #[test]
    fn peeking() {
        let data = hex!("3006 020101 020102 0500");
        let rdr = reader(&data, Mode::Der);
        assert_eq!(rdr.peek_tag().unwrap(), Tag::SEQUENCE);
        assert_eq!(
            rdr.peek_encoded_value().unwrap().as_ref(),
            &hex!("3006020101020102")
        );
        assert_eq!(
            rdr.peek_content_bytes().unwrap().as_ref(),
            &hex!("020101020102")
        );

        // Peeking over and over returns the same bytes.
        let mut rdr = rdr;
        for _ in 0..3 {
            assert_eq!(rdr.peek_tag().unwrap(), Tag::SEQUENCE);
        }
        assert_eq!(
            rdr.take_encoded_value().unwrap().as_ref(),
            &hex!("3006020101020102")
        );
        assert_eq!(rdr.peek_tag().unwrap(), Tag::NULL);
        rdr.skip_value().unwrap();
        assert!(rdr.peek_tag().is_err());
        rdr.check_exhausted().unwrap();
    }

    #[test]
    fn indefinite_encoded_value() {
        // The encoded value includes the end-of-contents octets, the
        // content bytes don’t.
        let data = hex!("2480 0403666F6F 0000");
        let rdr = reader(&data, Mode::Ber);
        assert_eq!(rdr.peek_encoded_value().unwrap().as_ref(), &data[..]);
        assert_eq!(
            rdr.peek_content_bytes().unwrap().as_ref(),
            &hex!("0403666F6F")
        );

        // Nested indefinite values.
        let data = hex!("2480 2480 0403666F6F 0000 0000");
        let rdr = reader(&data, Mode::Ber);
        assert_eq!(rdr.peek_encoded_value().unwrap().as_ref(), &data[..]);

        // Missing terminator.
        let data = hex!("2480 0403666F6F");
        assert!(
            reader(&data, Mode::Ber).peek_encoded_value().is_err()
        );
        // Terminator with content.
        let data = hex!("2480 0403666F6F 0001FF");
        assert!(
            reader(&data, Mode::Ber).peek_encoded_value().is_err()
        );
    }

    #[test]
    fn expected_tags() {
        // An implicitly tagged integer.
        let data = hex!("9F2101 2A");
        let mut rdr = reader(&data, Mode::Der);
        assert_eq!(
            rdr.try_take_i8_if(Tag::ctx(33)).unwrap(), Some(42)
        );
        assert!(rdr.is_exhausted());

        // Tag mismatch is malformed data.
        let mut rdr = reader(&data, Mode::Der);
        let err = rdr.try_take_i8_if(Tag::ctx(7)).unwrap_err();
        assert!(err.is_malformed());

        // A universal expected tag with the wrong number is caller
        // misuse.
        let mut rdr = reader(&hex!("020101"), Mode::Der);
        let err = rdr.try_take_i8_if(Tag::BOOLEAN).unwrap_err();
        assert!(!err.is_malformed());
        // ... with the right number it is fine.
        assert_eq!(
            rdr.try_take_i8_if(Tag::INTEGER).unwrap(), Some(1)
        );

        // The constructed flag is not compared.
        let data = hex!("240A 0403666F6F 0403626172");
        let os = reader(&data, Mode::Ber)
            .take_octet_string_if(Tag::OCTET_STRING).unwrap();
        assert_eq!(os, b"foobar".as_ref());
    }

    #[test]
    fn trailing_data() {
        let mut rdr = reader(&hex!("0500 0500"), Mode::Der);
        rdr.take_null().unwrap();
        assert!(rdr.check_exhausted().is_err());
        rdr.take_null().unwrap();
        rdr.check_exhausted().unwrap();
    }

    #[test]
    fn length_forms() {
        // Non-minimal long form length: BER yes, DER/CER no.
        let data = hex!("0482 00037878 78");
        assert!(
            reader(&data, Mode::Ber).take_octet_string().is_ok()
        );
        assert!(
            reader(&data, Mode::Der).take_octet_string().is_err()
        );
        assert!(
            reader(&data, Mode::Cer).take_octet_string().is_err()
        );

        // 128 content octets take the two-octet form.
        let mut data = vec![0x04, 0x81, 0x80];
        data.extend_from_slice(&[0x55; 128]);
        let mut rdr = Reader::new(data, Mode::Der);
        assert_eq!(
            rdr.take_octet_string().unwrap().len(), 128
        );
        assert!(rdr.is_exhausted());
    }
}
