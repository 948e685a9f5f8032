use num::bigint::RandBigInt;
use num::{BigUint, Integer, One, Zero};
use rand::{CryptoRng, Rng};

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Miller-Rabin with `rounds` random bases drawn from `rng`.
///
/// A composite passes with probability at most `4^-rounds`; a prime always
/// passes.
pub fn is_probable_prime<R: Rng + CryptoRng + ?Sized>(
    n: &BigUint,
    rounds: usize,
    rng: &mut R,
) -> bool {
    let two = BigUint::from(2u8);
    let three = BigUint::from(3u8);

    if *n == two || *n == three {
        return true;
    }
    if *n < two || n.is_even() {
        return false;
    }

    // Cheap rejection before any modular exponentiation
    for p in SMALL_PRIMES.iter() {
        let p = BigUint::from(*p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // n - 1 = 2^s * d with d odd
    let n_minus_one = n - 1u8;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// An odd number of exactly `bits` bits (top and bottom bit set).
pub fn random_prime_candidate<R: Rng + CryptoRng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    let mut candidate = rng.gen_biguint(bits);
    candidate.set_bit(bits - 1, true);
    candidate.set_bit(0, true);
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn small_values() {
        let mut rng = OsRng;
        let primes = [2u32, 3, 5, 7, 11, 97, 101, 7919];
        let composites = [0u32, 1, 4, 9, 15, 91, 561, 7917];

        for p in primes.iter() {
            assert!(is_probable_prime(&BigUint::from(*p), 10, &mut rng), "{} is prime", p);
        }
        for c in composites.iter() {
            assert!(!is_probable_prime(&BigUint::from(*c), 10, &mut rng), "{} is composite", c);
        }
    }

    #[test]
    fn carmichael_numbers() {
        let mut rng = OsRng;
        // Fermat liars for every coprime base
        for c in [41041u64, 825265, 321197185, 5394826801].iter() {
            assert!(!is_probable_prime(&BigUint::from(*c), 10, &mut rng));
        }
    }

    #[test]
    fn large_known_primes() {
        let mut rng = OsRng;
        // 2^61 - 1 and 2^127 - 1 (Mersenne)
        let m61 = (BigUint::one() << 61u32) - 1u8;
        let m127 = (BigUint::one() << 127u32) - 1u8;
        assert!(is_probable_prime(&m61, 10, &mut rng));
        assert!(is_probable_prime(&m127, 10, &mut rng));

        // 2^128 + 1 = 59649589127497217 * 5704689200685129054721
        let f7 = (BigUint::one() << 128u32) + 1u8;
        assert!(!is_probable_prime(&f7, 10, &mut rng));
    }

    #[test]
    fn product_of_two_large_primes() {
        let mut rng = OsRng;
        let m61 = (BigUint::one() << 61u32) - 1u8;
        let m31 = (BigUint::one() << 31u32) - 1u8;
        assert!(!is_probable_prime(&(&m61 * &m31), 10, &mut rng));
    }

    #[test]
    fn candidate_shape() {
        let mut rng = OsRng;
        for bits in [16u64, 64, 128, 129].iter() {
            let candidate = random_prime_candidate(*bits, &mut rng);
            assert_eq!(candidate.bits(), *bits);
            assert!(candidate.is_odd());
        }
    }
}
