//! BER-encoded bit strings.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use bytes::Bytes;
use crate::error::Error;
use crate::mode::Mode;
use super::segments::Segments;


//------------ BitString -----------------------------------------------------

/// A bit string value.
///
/// Bit strings are a sequence of bits. Unlike [`OctetString`]s, they do
/// not need to contain a multiple of eight bits.
///
/// There are two types of methods for accessing the data in a bit string.
/// Methods starting with `bit` operate on the individual bits while those
/// mentioning octets access entire octets and ignore the fact that there
/// may be unused bits in the final octet.
///
/// # BER Encoding
///
/// When encoded in BER, bit strings can either be a primitive or a
/// constructed value.
///
/// If encoded as a primitive value, the first octet of the content
/// contains the number of unused bits in the last octet and the following
/// octets contain the bits with the first bit in the most significant bit
/// of the octet.
///
/// In the constructed encoding, the bit string is represented as a
/// sequence of bit strings which in turn may either be constructed or
/// primitive encodings. The only limitation in this nesting is that only
/// the last primitively encoded segment may have a non-zero number of
/// unused bits.
///
/// With BER, the sender can choose either form of encoding. With CER, the
/// primitive encoding must be chosen if its content would be no more than
/// 1000 octets long. Otherwise, the constructed encoding is to be chosen,
/// which must contain a flat sequence of primitively encoded segments,
/// each of these except for the last one with exactly 1000 octets of
/// content. With DER, only the primitive form is allowed.
///
/// # Unused bits
///
/// Under CER and DER, the unused bits of the final octet must be zero on
/// the wire. BER allows them to carry arbitrary junk. The value read is
/// kept exactly as encoded, so anything hashing or re-encoding the raw
/// octets sees the original bits; [`normalized_last_octet`] provides the
/// cleaned view.
///
/// [`OctetString`]: super::OctetString
/// [`normalized_last_octet`]: Self::normalized_last_octet
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitString {
    /// The number of unused bits in the last octet.
    unused: u8,

    /// The octets of the bit string as read.
    octets: Bytes,
}

impl BitString {
    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the number of bits in the bit string.
    pub fn bit_len(&self) -> usize {
        (self.octets.len() << 3) - (self.unused as usize)
    }

    /// Returns the number of octets in the bit string.
    pub fn octet_len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the value of the given bit.
    ///
    /// Bits are counted in wire order: bit 0 is the most significant bit
    /// of the first octet. Bits past the end of the string are reported
    /// as unset.
    pub fn bit(&self, bit: usize) -> bool {
        if bit >= self.bit_len() {
            return false
        }
        let idx = bit >> 3;
        let mask = 0x80u8 >> (bit & 7);
        self.octets[idx] & mask != 0
    }

    /// Returns the octets of the bit string exactly as they were encoded.
    ///
    /// Under BER the unused bits of the final octet may be non-zero here.
    pub fn octets(&self) -> &[u8] {
        self.octets.as_ref()
    }

    /// Returns a bytes value of the octets of the bit string.
    pub fn octet_bytes(&self) -> Bytes {
        self.octets.clone()
    }

    /// Returns the last octet with the unused bits cleared.
    ///
    /// Returns `None` if the bit string is empty.
    pub fn normalized_last_octet(&self) -> Option<u8> {
        self.octets.last().map(|&last| {
            last & (0xFFu8 << self.unused)
        })
    }
}


/// # Decoding
impl BitString {
    /// Creates a value from the content octets of a primitive encoding.
    pub(crate) fn from_primitive(
        content: Bytes, mode: Mode,
    ) -> Result<Self, Error> {
        let (unused, _) = check_segment(content.as_ref(), mode)?;
        Ok(BitString { unused, octets: content.slice(1..) })
    }

    /// Creates a value by reassembling a constructed encoding.
    ///
    /// The body is the content of the outer constructed value, scoped by
    /// the reader.
    pub(crate) fn from_constructed(
        body: &[u8], mode: Mode,
    ) -> Result<Self, Error> {
        let mut octets = Vec::new();
        let unused = reassemble(body, mode, &mut octets)?;
        Ok(BitString { unused, octets: octets.into() })
    }
}


/// Checks one primitive bit string content and splits off the lead octet.
///
/// Returns the unused bit count and the payload octets.
fn check_segment(content: &[u8], mode: Mode) -> Result<(u8, &[u8]), Error> {
    let Some((&unused, payload)) = content.split_first() else {
        return Err(Error::malformed("empty bit string content"))
    };
    if unused > 7 {
        return Err(Error::malformed("invalid unused bit count"))
    }
    if payload.is_empty() && unused != 0 {
        return Err(Error::malformed("unused bits in empty bit string"))
    }
    if mode == Mode::Cer && content.len() > 1000 {
        return Err(Error::malformed(
            "overlong primitive bit string in CER mode"
        ))
    }
    if mode.is_restricted() && unused > 0 {
        // Payload can’t be empty at this point.
        let last = payload[payload.len() - 1];
        if last & !(0xFFu8 << unused) != 0 {
            return Err(Error::malformed("unused bits are set"))
        }
    }
    Ok((unused, payload))
}

/// Reassembles the segments of a constructed bit string into `out`.
///
/// Returns the unused bit count of the final segment.
pub(crate) fn reassemble(
    body: &[u8], mode: Mode, out: &mut Vec<u8>,
) -> Result<u8, Error> {
    let mut segments = Segments::new(body, mode, 3);
    let mut unused = 0;
    let mut prev_len = None;
    let mut aggregate = 0usize;
    while let Some(segment) = segments.next_segment()? {
        if unused != 0 {
            return Err(Error::malformed(
                "unused bits before the final bit string segment"
            ))
        }
        if mode == Mode::Cer {
            if let Some(prev_len) = prev_len {
                if prev_len != 1000 {
                    return Err(Error::malformed(
                        "short intermediary bit string segment in CER mode"
                    ))
                }
            }
        }
        let (segment_unused, payload) = check_segment(segment, mode)?;
        unused = segment_unused;
        prev_len = Some(segment.len());
        aggregate += segment.len();
        out.extend_from_slice(payload);
    }
    if mode == Mode::Cer && aggregate <= 1000 {
        return Err(Error::malformed(
            "constructed bit string of 1000 octets or less in CER mode"
        ))
    }
    Ok(unused)
}

/// Interprets reassembled bits as a named bit list.
///
/// The `unused` and `payload` arguments are the parts of the already
/// validated encoded value.
pub(crate) fn interpret_named_bits<T: Flags>(
    unused: u8, payload: &[u8], mode: Mode,
) -> Result<T, Error> {
    if mode.is_restricted() {
        // Trailing zero bits must be trimmed, so the last bit present
        // must be one.
        if let Some(&last) = payload.last() {
            if last & (1u8 << unused) == 0 {
                return Err(Error::malformed(
                    "named bit list with trailing zero bits"
                ))
            }
        }
    }
    let mut buf = [0u8; 16];
    let Some(target) = buf.get_mut(..payload.len()) else {
        return Err(Error::malformed("named bit list too long for flags type"))
    };
    target.copy_from_slice(payload);
    if let Some(last) = target.last_mut() {
        // BER leaves the unused bits as they came; mask them off before
        // they turn into phantom flags.
        *last &= 0xFFu8 << unused;
    }
    let bits = T::Repr::from_wire_octets(
        &buf[..payload.len()]
    ).ok_or_else(|| {
        Error::malformed("named bit list too long for flags type")
    })?;
    Ok(T::from_bits(bits))
}


//------------ Flags ---------------------------------------------------------

/// A Rust type that mirrors an ASN.1 named bit list.
///
/// A named bit list is a BIT STRING whose individual bits carry meaning.
/// On the wire, named bit 0 is the *most* significant bit of the first
/// content octet. Flag types conventionally go the other way, so the
/// reader hands implementations an integer in which bit 0 holds named
/// bit 0, bit 1 holds named bit 1, and so on – the reverse of the wire
/// bit order within each octet. This reversal is part of the public
/// contract.
///
/// Implementations declare their backing integer width through the
/// [`Repr`][Self::Repr] type; encoded values with more bits than the
/// backing type are rejected as malformed.
pub trait Flags: Sized {
    /// The backing integer type declared for the flags.
    type Repr: FlagsRepr;

    /// Creates a value from the reversed bits described above.
    fn from_bits(bits: Self::Repr) -> Self;
}

/// An integer type that can back a [`Flags`] implementation.
///
/// The trait is sealed: it is implemented for the unsigned integer types
/// with widths from 8 to 64 bits and cannot be implemented elsewhere.
pub trait FlagsRepr: Sized + sealed::Sealed {
    /// Folds wire octets into the flags value, reversing each octet.
    ///
    /// Returns `None` if there are more octets than fit the type.
    fn from_wire_octets(octets: &[u8]) -> Option<Self>;
}

mod sealed {
    pub trait Sealed { }
}

macro_rules! flags_repr {
    ( $type:ident ) => {
        impl sealed::Sealed for $type { }

        impl FlagsRepr for $type {
            fn from_wire_octets(octets: &[u8]) -> Option<Self> {
                if octets.len() > ($type::BITS / 8) as usize {
                    return None
                }
                let mut res = 0;
                for (idx, &octet) in octets.iter().enumerate() {
                    res |= $type::from(octet.reverse_bits()) << (idx * 8);
                }
                Some(res)
            }
        }
    }
}

flags_repr!(u8);
flags_repr!(u16);
flags_repr!(u32);
flags_repr!(u64);


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn primitive(content: &'static [u8], mode: Mode) -> Result<BitString, Error> {
        BitString::from_primitive(Bytes::from_static(content), mode)
    }

    #[test]
    fn primitive_content() {
        let bits = primitive(b"\x04\x0A\x3B\x5F\x29\x1C\xD0", Mode::Der)
            .unwrap();
        assert_eq!(bits.unused(), 4);
        assert_eq!(bits.octets(), b"\x0A\x3B\x5F\x29\x1C\xD0");
        assert_eq!(bits.bit_len(), 44);
        assert_eq!(bits.normalized_last_octet(), Some(0xD0));
        assert!(bits.bit(4));
        assert!(!bits.bit(5));
        assert!(bits.bit(43));
        assert!(!bits.bit(44));
        assert!(!bits.bit(4000));

        // The empty bit string.
        let bits = primitive(b"\x00", Mode::Der).unwrap();
        assert_eq!(bits.bit_len(), 0);
        assert_eq!(bits.normalized_last_octet(), None);
    }

    #[test]
    fn primitive_content_errors() {
        assert!(primitive(b"", Mode::Ber).is_err());
        assert!(primitive(b"\x08\xFF", Mode::Ber).is_err());
        assert!(primitive(b"\x01", Mode::Ber).is_err());

        // Junk in the unused bits is a BER privilege.
        assert!(primitive(b"\x04\xD4", Mode::Der).is_err());
        assert!(primitive(b"\x04\xD4", Mode::Cer).is_err());
        let bits = primitive(b"\x04\xD4", Mode::Ber).unwrap();
        assert_eq!(bits.octets(), b"\xD4");
        assert_eq!(bits.normalized_last_octet(), Some(0xD0));
    }

    #[test]
    fn constructed() {
        // Two segments, the second carrying the unused bits.
        let bits = BitString::from_constructed(
            b"\x03\x03\x00\x0A\x3B\x03\x02\x04\xD0", Mode::Ber
        ).unwrap();
        assert_eq!(bits.unused(), 4);
        assert_eq!(bits.octets(), b"\x0A\x3B\xD0");

        // Unused bits in a non-final segment.
        assert!(
            BitString::from_constructed(
                b"\x03\x02\x04\xD0\x03\x03\x00\x0A\x3B", Mode::Ber
            ).is_err()
        );
    }

    #[test]
    fn cer_segmenting() {
        fn body(first_len: usize, second_len: usize) -> Vec<u8> {
            let mut res = Vec::new();
            res.extend_from_slice(b"\x03\x82");
            res.extend_from_slice(
                &u16::try_from(first_len).unwrap().to_be_bytes()
            );
            res.push(0);
            res.resize(res.len() + first_len - 1, 0xAA);
            res.extend_from_slice(b"\x03\x82");
            res.extend_from_slice(
                &u16::try_from(second_len).unwrap().to_be_bytes()
            );
            res.push(0);
            res.resize(res.len() + second_len - 1, 0xAA);
            res
        }

        // 1000 octet intermediary, happy case.
        let bits = BitString::from_constructed(
            &body(1000, 600), Mode::Cer
        ).unwrap();
        assert_eq!(bits.octet_len(), 999 + 599);

        // Short intermediary.
        assert!(
            BitString::from_constructed(&body(999, 600), Mode::Cer).is_err()
        );
        // Overlong segment.
        assert!(
            BitString::from_constructed(&body(1000, 1001), Mode::Cer).is_err()
        );
        // Aggregate of 1000 octets or less should have been primitive.
        assert!(
            BitString::from_constructed(&body(500, 500), Mode::Cer).is_err()
        );
        // BER doesn’t care about any of this.
        assert!(
            BitString::from_constructed(&body(500, 500), Mode::Ber).is_ok()
        );
    }

    #[test]
    fn named_bits() {
        struct TestFlags(u64);

        impl Flags for TestFlags {
            type Repr = u64;

            fn from_bits(bits: u64) -> Self {
                TestFlags(bits)
            }
        }

        // Named bit 0 is the most significant bit of the first octet.
        let flags: TestFlags = interpret_named_bits(
            7, b"\x80", Mode::Der
        ).unwrap();
        assert_eq!(flags.0, 1);

        let flags: TestFlags = interpret_named_bits(
            4, b"\x0A\x3B\x5F\x29\x1C\xD0", Mode::Der
        ).unwrap();
        let expected: u64 = [
            4u32, 6, 10, 11, 12, 14, 15, 17, 19, 20, 21, 22, 23, 26, 28,
            31, 35, 36, 37, 40, 41, 43,
        ].iter().map(|&bit| 1u64 << bit).sum();
        assert_eq!(flags.0, expected);

        // BER junk in the unused bits doesn’t turn into flags.
        let flags: TestFlags = interpret_named_bits(
            7, b"\x83", Mode::Ber
        ).unwrap();
        assert_eq!(flags.0, 1);

        // Untrimmed trailing zero bits are rejected in DER mode only.
        assert!(
            interpret_named_bits::<TestFlags>(
                2, b"\x80\x00", Mode::Der
            ).is_err()
        );
        assert!(
            interpret_named_bits::<TestFlags>(
                2, b"\x80\x00", Mode::Ber
            ).is_ok()
        );

        // More bits than the flags type has.
        struct ByteFlags(u8);

        impl Flags for ByteFlags {
            type Repr = u8;

            fn from_bits(bits: u8) -> Self {
                ByteFlags(bits)
            }
        }

        assert!(
            interpret_named_bits::<ByteFlags>(
                0, b"\x80\x80", Mode::Ber
            ).is_err()
        );
        assert_eq!(
            interpret_named_bits::<ByteFlags>(
                0, b"\x41", Mode::Ber
            ).unwrap().0,
            0x82
        );
    }
}
