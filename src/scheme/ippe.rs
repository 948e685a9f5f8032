/*
 * Inner-product predicate encryption over 0/1 vectors.
 *
 * A ciphertext for x in {0,1}^n is c_0 || ... || c_{n-1} || k where k is a
 * fresh 16-byte tag and
 *
 *   y_i = (r * x_i + e_i) mod q
 *   c_i = y_i XOR F(k, i)
 *
 * F is AES-128-CTR keyed by the tag. The noise e_i in [0, p) and the
 * blinding scalar r in [1, q) come from the same PRF keyed by k XOR s,
 * where s is the secret share key, so they are fresh for every ciphertext
 * but can be regenerated by the key holder.
 */

use crate::{
    ciphertext::Ciphertext,
    config::EngineParams,
    error::{OsseError, Result},
    observe::{Observer, Phase, PhaseTimer},
    primitives::{
        prf::Aes128CtrPrf,
        prime::{is_probable_prime, random_prime_candidate},
        Prf, PrfKey, Tag, TAG_SIZE,
    },
    vectorize::BitVector,
};

use num::{BigUint, Zero};
use rand::{rngs::OsRng, RngCore};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

// Extra keystream bits taken before reducing, so the reduction bias is
// below 2^-64
const REDUCTION_SLACK_BITS: u64 = 64;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    p: BigUint,
    #[zeroize(skip)]
    q: BigUint,
    share_key: Tag,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Draws candidate pairs until both are prime (and distinct), in
    /// parallel, giving up after `max_prime_attempts` pairs.
    pub fn generate(params: &EngineParams) -> Result<Self> {
        params.validate()?;
        let bits = params.prime_bits;
        let rounds = params.miller_rabin_rounds;

        let found = (0..params.max_prime_attempts)
            .into_par_iter()
            .find_map_any(|_| {
                let mut rng = OsRng;
                let p = random_prime_candidate(bits, &mut rng);
                let q = random_prime_candidate(bits, &mut rng);
                if p != q
                    && is_probable_prime(&p, rounds, &mut rng)
                    && is_probable_prime(&q, rounds, &mut rng)
                {
                    Some((p, q))
                } else {
                    None
                }
            });

        let (p, q) = found.ok_or(OsseError::PrimeSearchExhausted {
            attempts: params.max_prime_attempts,
        })?;

        let mut share_key: Tag = Default::default();
        OsRng.fill_bytes(&mut share_key);

        Ok(Self { p, q, share_key })
    }

    /// `n = bitlen(p)`
    pub fn p_bits(&self) -> u64 {
        self.p.bits()
    }

    /// `m = bitlen(q)`
    pub fn q_bits(&self) -> u64 {
        self.q.bits()
    }

    fn share_prf(&self, tag: &Tag) -> Aes128CtrPrf {
        let mut key = *tag;
        key.iter_mut()
            .zip(self.share_key.iter())
            .for_each(|(k, s)| *k ^= s);
        let prf = Prf::new(PrfKey::from_slice(&key));
        key.zeroize();
        prf
    }

    /// `e_i` in `[0, p)`
    fn noise(&self, share: &Aes128CtrPrf, index: usize) -> BigUint {
        share.evaluate(index as u64, self.p.bits() + REDUCTION_SLACK_BITS) % &self.p
    }

    /// `r` in `[1, q)`, drawn from the stream just past the last position
    fn blinding_scalar(&self, share: &Aes128CtrPrf, dimension: usize) -> BigUint {
        let q_minus_one = &self.q - 1u8;
        share.evaluate(dimension as u64, self.q.bits() + REDUCTION_SLACK_BITS) % q_minus_one + 1u8
    }

    /// `a^-1 mod q` for `a` in `[1, q)`
    fn invert_mod_q(&self, a: &BigUint) -> BigUint {
        let exponent = &self.q - 2u8;
        a.modpow(&exponent, &self.q)
    }
}

/// The key holder's view of the scheme for vectors of one fixed dimension.
#[derive(Debug, Clone)]
pub struct PredicateEncryption {
    key: Arc<SecretKey>,
    dimension: usize,
}

impl PredicateEncryption {
    /// Generates a fresh secret key for vectors of length `dimension`.
    pub fn new(dimension: usize, params: &EngineParams, observer: &dyn Observer) -> Result<Self> {
        let timer = PhaseTimer::start(observer, Phase::KeyGen);
        let key = SecretKey::generate(params)?;
        timer.finish(2);

        tracing::debug!(
            p_bits = key.p_bits(),
            q_bits = key.q_bits(),
            dimension,
            "secret key generated"
        );

        Self::from_key(Arc::new(key), dimension)
    }

    fn from_key(key: Arc<SecretKey>, dimension: usize) -> Result<Self> {
        // Inner products up to `dimension` must survive reduction mod p and q
        let bound = BigUint::from(dimension);
        if bound >= key.p || bound >= key.q {
            return Err(OsseError::InvalidConfig(format!(
                "dimension {} too large for {}-bit primes",
                dimension,
                key.p_bits().min(key.q_bits())
            )));
        }
        Ok(Self { key, dimension })
    }

    /// Another view over the same secret key for a different dimension.
    pub fn with_dimension(&self, dimension: usize) -> Result<Self> {
        Self::from_key(Arc::clone(&self.key), dimension)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// `m`
    pub fn segment_bits(&self) -> u64 {
        self.key.q_bits()
    }

    /// `n * m + l * 8`
    pub fn ciphertext_bits(&self) -> usize {
        self.dimension * self.segment_bits() as usize + TAG_SIZE * 8
    }

    /// `F(k, i)`: `m` bits of AES-128-CTR keystream for position `i`
    /// under the tag `k`.
    pub fn prf(&self, tag: &Tag, index: usize) -> BigUint {
        Aes128CtrPrf::new(PrfKey::from_slice(tag)).evaluate(index as u64, self.segment_bits())
    }

    pub fn encrypt(&self, x: &BitVector) -> Result<Ciphertext> {
        if x.len() != self.dimension {
            return Err(OsseError::DimensionMismatch {
                expected: self.dimension,
                actual: x.len(),
            });
        }

        let mut tag: Tag = Default::default();
        OsRng.fill_bytes(&mut tag);

        let m = self.segment_bits();
        let q = &self.key.q;
        let mask: Aes128CtrPrf = Prf::new(PrfKey::from_slice(&tag));
        let share = self.key.share_prf(&tag);
        let r = self.key.blinding_scalar(&share, self.dimension);

        let segments = x
            .iter()
            .enumerate()
            .map(|(i, bit)| {
                let e = self.key.noise(&share, i);
                let y = (&r * u8::from(bit) + e) % q;
                y ^ mask.evaluate(i as u64, m)
            })
            .collect();

        Ok(Ciphertext::new(segments, m, tag))
    }

    pub fn decrypt(&self, c: &Ciphertext) -> Result<BitVector> {
        self.check_length(c)?;

        let q = &self.key.q;
        let share = self.key.share_prf(&c.tag);
        let r_inv = self
            .key
            .invert_mod_q(&self.key.blinding_scalar(&share, self.dimension));

        let bits = self
            .blinded_shares(c, &share)
            .map(|v| {
                let u = v * &r_inv % q;
                (u % &self.key.p).bit(0)
            })
            .collect::<Vec<bool>>();

        Ok(BitVector::from(bits))
    }

    /// `<x1, x2> mod p`, computed segment by segment without recovering
    /// either plaintext bit.
    pub fn inner_product(&self, c1: &Ciphertext, c2: &Ciphertext) -> Result<BigUint> {
        self.check_length(c1)?;
        self.check_length(c2)?;

        let q = &self.key.q;
        let share1 = self.key.share_prf(&c1.tag);
        let share2 = self.key.share_prf(&c2.tag);

        // Each share is r * x_i mod q, so the sum is r1 * r2 * <x1, x2> mod q
        let blinded = self
            .blinded_shares(c1, &share1)
            .zip(self.blinded_shares(c2, &share2))
            .fold(BigUint::zero(), |acc, (a, b)| (acc + a * b) % q);

        let r1 = self.key.blinding_scalar(&share1, self.dimension);
        let r2 = self.key.blinding_scalar(&share2, self.dimension);
        let unblind = self.key.invert_mod_q(&(r1 * r2 % q));

        Ok(blinded * unblind % q % &self.key.p)
    }

    fn check_length(&self, c: &Ciphertext) -> Result<()> {
        if c.dimension() != self.dimension || c.segment_bits() != self.segment_bits() {
            return Err(OsseError::CiphertextLength {
                expected: self.ciphertext_bits(),
                actual: c.bit_len(),
            });
        }
        Ok(())
    }

    /// `(c_i XOR F(k, i) - e_i) mod q` for every position, i.e. `r * x_i mod q`
    fn blinded_shares<'a>(
        &'a self,
        c: &'a Ciphertext,
        share: &'a Aes128CtrPrf,
    ) -> impl Iterator<Item = BigUint> + 'a {
        let q = &self.key.q;
        let m = self.segment_bits();
        let mask: Aes128CtrPrf = Prf::new(PrfKey::from_slice(&c.tag));

        c.segments.iter().enumerate().map(move |(i, segment)| {
            let y = (segment ^ mask.evaluate(i as u64, m)) % q;
            let e = self.key.noise(share, i) % q;
            (y + q - e) % q
        })
    }
}
