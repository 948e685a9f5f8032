pub mod prf;
pub mod prime;
pub mod prp;

use aes::cipher::{consts::U16, generic_array::GenericArray};
use aes::Block;
use num::BigUint;

pub type AesBlock = Block;
pub type PrfKey = GenericArray<u8, U16>;
pub const TAG_SIZE: usize = 16;
pub type Tag = [u8; TAG_SIZE];

pub trait Prf {
    fn new(key: &PrfKey) -> Self;

    /// Fills `out` with the keystream for `index`.
    fn keystream(&self, index: u64, out: &mut [u8]);

    /// The first `bits` bits of the keystream for `index`, as an integer.
    fn evaluate(&self, index: u64, bits: u64) -> BigUint {
        let num_bytes = ((bits + 7) / 8) as usize;
        let mut out = vec![0u8; num_bytes];
        self.keystream(index, &mut out);
        let value = BigUint::from_bytes_be(&out);
        // Drop the trailing bits of the last byte
        value >> (num_bytes as u64 * 8 - bits)
    }
}
