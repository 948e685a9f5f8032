use crate::error::{OsseError, Result};
use rand::{CryptoRng, Rng};
use std::iter::Enumerate;
use std::slice::Iter;

/// A bijection over `[0, N)` stored alongside its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    forward: Vec<usize>,
    inverse: Vec<usize>,
}

impl Permutation {
    /// Knuth (Fisher-Yates) shuffle of `[0, n)`.
    pub fn generate<R: Rng + CryptoRng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut forward: Vec<usize> = (0..n).collect();

        (1..n).rev().for_each(|i| {
            let j = rng.gen_range(0..=i);
            forward.swap(i, j);
        });

        let inverse = invert(&forward);
        Self { forward, inverse }
    }

    /// Builds the pair from a forward array, rejecting anything that is not
    /// a permutation of `[0, len)`.
    pub fn from_forward(forward: Vec<usize>) -> Result<Self> {
        check_bijection(&forward)?;
        let inverse = invert(&forward);
        Ok(Self { forward, inverse })
    }

    /// Builds the pair from both arrays and checks `inverse[forward[i]] == i`.
    pub fn from_parts(forward: Vec<usize>, inverse: Vec<usize>) -> Result<Self> {
        if forward.len() != inverse.len() {
            return Err(OsseError::InvalidPermutation(format!(
                "key has {} entries but inverse has {}",
                forward.len(),
                inverse.len()
            )));
        }
        check_bijection(&forward)?;
        if let Some(i) = (0..forward.len()).find(|&i| inverse[forward[i]] != i) {
            return Err(OsseError::InvalidPermutation(format!(
                "inverse does not undo the key at position {}",
                i
            )));
        }
        Ok(Self { forward, inverse })
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    #[inline]
    pub fn permute(&self, input: usize) -> usize {
        self.forward[input]
    }

    #[inline]
    pub fn invert(&self, input: usize) -> usize {
        self.inverse[input]
    }

    pub fn forward(&self) -> Enumerate<Iter<usize>> {
        self.forward.iter().enumerate()
    }

    pub fn inverse(&self) -> Enumerate<Iter<usize>> {
        self.inverse.iter().enumerate()
    }

    pub fn forward_slice(&self) -> &[usize] {
        &self.forward
    }

    pub fn inverse_slice(&self) -> &[usize] {
        &self.inverse
    }
}

/// `ik[pk[i]] = i`
pub fn invert(forward: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0usize; forward.len()];
    for (index, val) in forward.iter().enumerate() {
        inverse[*val] = index;
    }
    inverse
}

fn check_bijection(forward: &[usize]) -> Result<()> {
    let mut seen = vec![false; forward.len()];
    for &val in forward {
        if val >= forward.len() {
            return Err(OsseError::InvalidPermutation(format!(
                "value {} out of range for {} entries",
                val,
                forward.len()
            )));
        }
        if seen[val] {
            return Err(OsseError::InvalidPermutation(format!("value {} repeated", val)));
        }
        seen[val] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    quickcheck! {
        fn generated_pair_is_inverse(n: u8) -> bool {
            let mut rng = ChaCha20Rng::from_entropy();
            let perm = Permutation::generate(n as usize, &mut rng);

            perm.len() == n as usize
                && (0..perm.len()).all(|i| perm.invert(perm.permute(i)) == i)
                && (0..perm.len()).all(|i| perm.permute(perm.invert(i)) == i)
        }

        fn generated_forward_is_bijection(n: u8) -> bool {
            let mut rng = ChaCha20Rng::from_entropy();
            let perm = Permutation::generate(n as usize, &mut rng);
            let mut values = perm.forward_slice().to_vec();
            values.sort_unstable();
            values == (0..n as usize).collect::<Vec<_>>()
        }
    }

    #[test]
    fn known_inverse() {
        assert_eq!(invert(&[2, 0, 1]), vec![1, 2, 0]);
    }

    #[test]
    fn empty_permutation() {
        let mut rng = ChaCha20Rng::from_entropy();
        let perm = Permutation::generate(0, &mut rng);
        assert!(perm.is_empty());
    }

    #[test]
    fn shuffle_moves_things() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let perm = Permutation::generate(64, &mut rng);
        let identity: Vec<usize> = (0..64).collect();
        assert_ne!(perm.forward_slice(), identity.as_slice());
    }

    #[test]
    fn from_forward_rejects_repeats() {
        let result = Permutation::from_forward(vec![0, 1, 1]);
        assert!(matches!(result, Err(OsseError::InvalidPermutation(_))));
    }

    #[test]
    fn from_forward_rejects_out_of_range() {
        let result = Permutation::from_forward(vec![0, 3, 1]);
        assert!(matches!(result, Err(OsseError::InvalidPermutation(_))));
    }

    #[test]
    fn from_parts_rejects_wrong_inverse() {
        let result = Permutation::from_parts(vec![2, 0, 1], vec![2, 0, 1]);
        assert!(matches!(result, Err(OsseError::InvalidPermutation(_))));
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let result = Permutation::from_parts(vec![1, 0], vec![1, 0, 2]);
        assert!(matches!(result, Err(OsseError::InvalidPermutation(_))));
    }

    #[test]
    fn from_parts_accepts_real_pair() {
        let perm = Permutation::from_parts(vec![2, 0, 1], vec![1, 2, 0]).unwrap();
        assert_eq!(perm.permute(0), 2);
        assert_eq!(perm.invert(2), 0);
        assert_eq!(perm.forward().map(|(_, v)| *v).collect::<Vec<_>>(), vec![2, 0, 1]);
    }
}
