use crate::primitives::{AesBlock, Prf, PrfKey};
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use byteorder::{BigEndian, ByteOrder};
use zeroize::ZeroizeOnDrop;

/*
 * AES-128 in counter mode. The counter block for keystream `index` is
 * index (u64, BE) || ctr (u64, BE) with ctr counting up from zero, so
 * each index gets its own independent stream under the same key.
 */
#[derive(Debug, ZeroizeOnDrop)]
pub struct Aes128CtrPrf {
    cipher: Aes128,
}

impl Aes128CtrPrf {
    #[inline]
    fn counter_block(index: u64, ctr: u64) -> AesBlock {
        let mut block = AesBlock::default();
        BigEndian::write_u64(&mut block[0..8], index);
        BigEndian::write_u64(&mut block[8..16], ctr);
        block
    }
}

impl Prf for Aes128CtrPrf {
    fn new(key: &PrfKey) -> Self {
        let cipher = Aes128::new(key);
        Self { cipher }
    }

    fn keystream(&self, index: u64, out: &mut [u8]) {
        let mut blocks: Vec<AesBlock> = (0..((out.len() + 15) / 16) as u64)
            .map(|ctr| Self::counter_block(index, ctr))
            .collect();
        self.cipher.encrypt_blocks(&mut blocks);

        for (chunk, block) in out.chunks_mut(16).zip(blocks.iter()) {
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::generic_array::GenericArray;
    use hex_literal::hex;
    use num::BigUint;

    fn init_prf() -> Aes128CtrPrf {
        let key: [u8; 16] = hex!("00010203 04050607 08090a0b 0c0d0e0f");
        let key_array = GenericArray::from_slice(&key);
        Prf::new(key_array)
    }

    #[test]
    fn prf_counter_block_layout() {
        let block = Aes128CtrPrf::counter_block(0x0011223344556677, 0x8899aabbccddeeff);
        assert_eq!(block.as_slice(), &hex!("00112233 44556677 8899aabb ccddeeff")[..]);
    }

    #[test]
    fn prf_known_block() {
        // FIPS-197 appendix C.1
        let prf = init_prf();
        let mut block = Aes128CtrPrf::counter_block(0x0011223344556677, 0x8899aabbccddeeff);
        prf.cipher.encrypt_block(&mut block);
        assert_eq!(block.as_slice(), &hex!("69c4e0d8 6a7b0430 d8cdb780 70b4c55a")[..]);
    }

    #[test]
    fn prf_keystream_is_deterministic() {
        let prf = init_prf();
        let mut a = [0u8; 40];
        let mut b = [0u8; 40];
        prf.keystream(7, &mut a);
        prf.keystream(7, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn prf_keystream_differs_by_index() {
        let prf = init_prf();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        prf.keystream(0, &mut a);
        prf.keystream(1, &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn prf_keystream_prefix_is_stable() {
        let prf = init_prf();
        let mut short = [0u8; 5];
        let mut long = [0u8; 37];
        prf.keystream(3, &mut short);
        prf.keystream(3, &mut long);
        assert_eq!(short[..], long[..5]);
    }

    #[test]
    fn prf_evaluate_width() {
        let prf = init_prf();
        for bits in [1u64, 7, 64, 100, 128, 130, 257].iter() {
            let value = prf.evaluate(2, *bits);
            assert!(value < (BigUint::from(1u8) << *bits));
        }
    }

    #[test]
    fn prf_evaluate_matches_keystream() {
        let prf = init_prf();
        let mut bytes = [0u8; 16];
        prf.keystream(9, &mut bytes);
        assert_eq!(prf.evaluate(9, 128), BigUint::from_bytes_be(&bytes));
        assert_eq!(prf.evaluate(9, 8), BigUint::from(bytes[0]));
    }
}
