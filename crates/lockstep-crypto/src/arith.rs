//! Modular arithmetic over arbitrary-precision integers
//!
//! Everything the key exchange needs: modular exponentiation by repeated
//! squaring and an optional Miller-Rabin probable-prime check for domain
//! parameters. Operands are [`BigUint`], so results are exact at any width.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::error::CryptoError;

/// Compute `base^exponent mod modulus`.
///
/// Right-to-left square-and-multiply: one squaring per exponent bit and one
/// multiplication per set bit, so cost grows with `log2(exponent)`. Every
/// intermediate is reduced modulo `modulus`, so no value exceeds
/// `modulus²`.
///
/// `exponent == 0` yields `1 mod modulus`.
///
/// # Errors
///
/// - `InvalidModulus` if `modulus <= 1`
pub fn modpow(
    base: &BigUint,
    exponent: &BigUint,
    modulus: &BigUint,
) -> Result<BigUint, CryptoError> {
    if *modulus <= BigUint::one() {
        return Err(CryptoError::InvalidModulus);
    }

    let mut result = BigUint::one() % modulus;
    let mut square = base % modulus;

    for bit in 0..exponent.bits() {
        if exponent.bit(bit) {
            result = (&result * &square) % modulus;
        }
        square = (&square * &square) % modulus;
    }

    debug_assert!(result < *modulus);
    Ok(result)
}

/// [`modpow`] for demonstration-size parameters.
///
/// Products are widened to `u128` before reduction, so any `u64` modulus is
/// handled without overflow.
///
/// # Errors
///
/// - `InvalidModulus` if `modulus <= 1`
pub fn modpow_u64(base: u64, exponent: u64, modulus: u64) -> Result<u64, CryptoError> {
    if modulus <= 1 {
        return Err(CryptoError::InvalidModulus);
    }

    let m = u128::from(modulus);
    let mut result: u128 = 1;
    let mut square = u128::from(base) % m;
    let mut e = exponent;

    while e > 0 {
        if e & 1 == 1 {
            result = result * square % m;
        }
        square = square * square % m;
        e >>= 1;
    }

    Ok(result as u64)
}

/// Miller-Rabin probable-prime test with `rounds` random witnesses.
///
/// A composite passes with probability at most `4^-rounds`.
pub fn is_probable_prime<R: RngCore + CryptoRng>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let two = BigUint::from(2u8);
    let three = BigUint::from(3u8);

    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if !n.bit(0) {
        return false;
    }

    let n_minus_1 = n - BigUint::one();

    // n - 1 = d * 2^s with d odd
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);

        // n > 3 here, so modpow cannot fail
        let Ok(mut x) = modpow(&a, &d, n) else {
            return false;
        };

        if x.is_one() || x == n_minus_1 {
            continue;
        }

        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
            if x.is_zero() || x.is_one() {
                return false;
            }
        }

        return false;
    }

    true
}

/// Number of bytes needed to hold any residue modulo `modulus`.
pub fn modulus_byte_len(modulus: &BigUint) -> usize {
    modulus.bits().div_ceil(8) as usize
}

/// Big-endian encoding of `value`, left-padded with zeros to `len` bytes.
///
/// Values wider than `len` are returned unpadded.
pub fn to_fixed_be_bytes(value: &BigUint, len: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    if raw.len() >= len {
        return raw;
    }

    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(&raw);
    out
}
