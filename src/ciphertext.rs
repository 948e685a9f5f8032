use crate::error::ParseError;
use crate::primitives::{Tag, TAG_SIZE};
use num::BigUint;
use std::fmt;

/// An IPPE ciphertext: `n` masked segments of `m` bits each, followed by
/// the tag in the clear.
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub(crate) segments: Vec<BigUint>,
    pub(crate) segment_bits: u64,
    pub(crate) tag: Tag,
}

impl Ciphertext {
    pub(crate) fn new(segments: Vec<BigUint>, segment_bits: u64, tag: Tag) -> Self {
        debug_assert!(segments.iter().all(|s| s.bits() <= segment_bits));
        Self {
            segments,
            segment_bits,
            tag,
        }
    }

    /// Number of segments (the vector dimension `n`)
    pub fn dimension(&self) -> usize {
        self.segments.len()
    }

    /// Width `m` of each segment
    pub fn segment_bits(&self) -> u64 {
        self.segment_bits
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// `n * m + l * 8`
    pub fn bit_len(&self) -> usize {
        self.segments.len() * self.segment_bits as usize + TAG_SIZE * 8
    }

    fn segment_bytes(segment_bits: u64) -> usize {
        ((segment_bits + 7) / 8) as usize
    }

    /// Each segment as a fixed-width big-endian field, then the tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let width = Self::segment_bytes(self.segment_bits);
        let mut out = Vec::with_capacity(self.segments.len() * width + TAG_SIZE);

        for segment in &self.segments {
            let bytes = segment.to_bytes_be();
            let padded = width.saturating_sub(bytes.len());
            out.extend(std::iter::repeat(0u8).take(padded));
            // Zero encodes as a single 0 byte
            out.extend_from_slice(&bytes[bytes.len().saturating_sub(width)..]);
        }
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_bytes(data: &[u8], dimension: usize, segment_bits: u64) -> Result<Self, ParseError> {
        let width = Self::segment_bytes(segment_bits);
        if segment_bits == 0 || data.len() != dimension * width + TAG_SIZE {
            return Err(ParseError);
        }

        let (body, tag_bytes) = data.split_at(dimension * width);
        let segments = body
            .chunks(width)
            .map(|chunk| {
                let segment = BigUint::from_bytes_be(chunk);
                if segment.bits() > segment_bits {
                    Err(ParseError)
                } else {
                    Ok(segment)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tag: Tag = Default::default();
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            segments,
            segment_bits,
            tag,
        })
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("dimension", &self.segments.len())
            .field("segment_bits", &self.segment_bits)
            .field("tag", &hex::encode(self.tag))
            .finish()
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn sample() -> Ciphertext {
        let segments = vec![
            BigUint::from(0u8),
            BigUint::from(0x1234u32),
            (BigUint::from(1u8) << 19u32) - 1u8,
        ];
        Ciphertext::new(segments, 20, hex!("00010203 04050607 08090a0b 0c0d0e0f"))
    }

    #[test]
    fn bit_length() {
        let ct = sample();
        assert_eq!(ct.bit_len(), 3 * 20 + 128);
        assert_eq!(ct.dimension(), 3);
    }

    #[test]
    fn binary_encoding() {
        let ct = sample();
        let bytes = ct.to_bytes();
        assert_eq!(bytes.len(), 3 * 3 + 16);
        assert_eq!(&bytes[0..9], &hex!("000000 001234 07ffff")[..]);
        assert_eq!(ct, Ciphertext::from_bytes(&bytes, 3, 20).unwrap());
    }

    #[test]
    fn binary_encoding_invalid_length() {
        let bin = vec![0, 1, 2, 3];
        assert_eq!(Ciphertext::from_bytes(&bin, 3, 20), Err(ParseError));
    }

    #[test]
    fn binary_encoding_segment_too_wide() {
        let mut bytes = sample().to_bytes();
        bytes[0] = 0xff;
        assert_eq!(Ciphertext::from_bytes(&bytes, 3, 20), Err(ParseError));
    }

    #[test]
    fn display_is_hex_of_bytes() {
        let ct = sample();
        assert_eq!(ct.to_string(), hex::encode(ct.to_bytes()));
    }
}
