//! Finite-field Diffie-Hellman key agreement
//!
//! Both parties share public [`DomainParameters`], pick a private scalar and
//! publish `g^secret mod p`. Each side raises the peer's public value to its
//! own secret and arrives at the same [`SharedSecret`], because
//! `(g^a)^b ≡ (g^b)^a (mod p)`.
//!
//! # Trust Model
//!
//! [`DomainParameters::new`] checks ranges only. It does not prove that the
//! modulus is prime or that the generator is a primitive root; callers that
//! accept parameters from an untrusted source can opt into
//! [`DomainParameters::check_probable_prime`].

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{
    arith::{is_probable_prime, modpow, modulus_byte_len, to_fixed_be_bytes},
    error::CryptoError,
};

/// RFC 3526 group 14 modulus (2048-bit MODP), big-endian hex.
const MODP_2048_HEX: &[u8] = b"\
FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
83655D23DCA3AD961C62F356208552BB9ED529077096966D\
670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
15728E5A8AACAA68FFFFFFFFFFFFFFFF";

/// Public parameters shared by both endpoints for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParameters {
    modulus: BigUint,
    generator: BigUint,
}

impl DomainParameters {
    /// Create parameters after range checks.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if `modulus <= 3` or `generator` is outside
    ///   `[2, modulus - 2]`
    pub fn new(modulus: BigUint, generator: BigUint) -> Result<Self, CryptoError> {
        if modulus <= BigUint::from(3u8) {
            return Err(CryptoError::InvalidParameters {
                reason: "modulus must be greater than 3".to_string(),
            });
        }

        let upper = &modulus - BigUint::from(2u8);
        if generator < BigUint::from(2u8) || generator > upper {
            return Err(CryptoError::InvalidParameters {
                reason: "generator must lie in [2, modulus - 2]".to_string(),
            });
        }

        Ok(Self { modulus, generator })
    }

    /// Textbook parameters `p = 23, g = 5`.
    ///
    /// A discrete log in this group is found by trying 21 exponents. Useful
    /// for known-answer tests, never for protecting data.
    pub fn toy() -> Self {
        Self { modulus: BigUint::from(23u8), generator: BigUint::from(5u8) }
    }

    /// RFC 3526 2048-bit MODP group with generator 2.
    pub fn modp_2048() -> Self {
        let modulus = BigUint::parse_bytes(MODP_2048_HEX, 16).unwrap_or_default();
        debug_assert_eq!(modulus.bits(), 2048);

        Self { modulus, generator: BigUint::from(2u8) }
    }

    /// The prime modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The generator `g`.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Width in bytes of residues modulo `p`.
    pub fn element_len(&self) -> usize {
        modulus_byte_len(&self.modulus)
    }

    /// Run a Miller-Rabin test on the modulus.
    ///
    /// Not performed by [`DomainParameters::new`]. Parameters from a trusted
    /// named group do not need it.
    pub fn check_probable_prime<R: RngCore + CryptoRng>(
        &self,
        rounds: usize,
        rng: &mut R,
    ) -> Result<(), CryptoError> {
        if is_probable_prime(&self.modulus, rounds, rng) {
            Ok(())
        } else {
            Err(CryptoError::InvalidParameters { reason: "modulus is composite".to_string() })
        }
    }
}

/// One party's private scalar and the matching public value.
///
/// The secret never leaves this struct in serialized form. Its limbs are
/// zeroized on drop; temporaries inside `modpow` are not covered.
pub struct KeyPair {
    secret: BigUint,
    public: BigUint,
}

impl KeyPair {
    /// Build a key pair from a known secret.
    ///
    /// # Errors
    ///
    /// - `InvalidSecret` if `secret` is outside `[1, modulus - 2]`
    pub fn from_secret(params: &DomainParameters, secret: BigUint) -> Result<Self, CryptoError> {
        let upper = params.modulus() - BigUint::from(2u8);
        if secret < BigUint::one() || secret > upper {
            return Err(CryptoError::InvalidSecret);
        }

        let public = modpow(params.generator(), &secret, params.modulus())?;
        Ok(Self { secret, public })
    }

    /// Private scalar. Only the owning session should read this.
    pub fn secret(&self) -> &BigUint {
        &self.secret
    }

    /// Public value `g^secret mod p`.
    pub fn public(&self) -> &BigUint {
        &self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("secret", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

impl Zeroize for KeyPair {
    /// Overwrite the secret's limbs in place. The public value is left alone.
    fn zeroize(&mut self) {
        self.secret.zeroize();
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Shared value both parties compute from the exchange.
///
/// Stored as fixed-width big-endian bytes (left-padded to the modulus width)
/// so key derivation sees the same input on both sides regardless of
/// leading zeros.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    /// Fixed-width big-endian encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The secret as an integer.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.bytes)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret").field("len", &self.bytes.len()).finish()
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Generate a key pair with a secret drawn uniformly from `[1, modulus - 2]`.
///
/// The returned public value always passes [`validate_public_value`].
///
/// The `CryptoRng` bound keeps test-only generators out of this path unless
/// they are explicitly marked cryptographic (seeded `ChaCha20Rng` in
/// simulation).
pub fn generate_key_pair<R: RngCore + CryptoRng>(
    params: &DomainParameters,
    rng: &mut R,
) -> Result<KeyPair, CryptoError> {
    // gen_biguint_range samples [low, high), so high = modulus - 1
    let high = params.modulus() - BigUint::one();

    // In small groups the public value can land on modulus - 1, which the
    // peer would refuse. Redraw until it passes.
    loop {
        let secret = rng.gen_biguint_range(&BigUint::one(), &high);
        let pair = KeyPair::from_secret(params, secret)?;
        if validate_public_value(pair.public(), params.modulus()).is_ok() {
            return Ok(pair);
        }
    }
}

/// Check that a peer's public value lies in `[2, modulus - 2]`.
///
/// # Errors
///
/// - `InvalidPublicValue` for `0`, `1`, `modulus - 1` or anything `>= modulus`
pub fn validate_public_value(peer_public: &BigUint, modulus: &BigUint) -> Result<(), CryptoError> {
    let two = BigUint::from(2u8);
    if *modulus < BigUint::from(4u8) {
        return Err(CryptoError::InvalidPublicValue);
    }

    let upper = modulus - &two;
    if *peer_public < two || *peer_public > upper {
        return Err(CryptoError::InvalidPublicValue);
    }

    Ok(())
}

/// Compute `peer_public^own_secret mod modulus`.
///
/// # Errors
///
/// - `InvalidPublicValue` if the peer value fails [`validate_public_value`]
/// - `InvalidModulus` if `modulus <= 1`
pub fn compute_shared_secret(
    own_secret: &BigUint,
    peer_public: &BigUint,
    modulus: &BigUint,
) -> Result<SharedSecret, CryptoError> {
    validate_public_value(peer_public, modulus)?;

    let value = modpow(peer_public, own_secret, modulus)?;
    let bytes = to_fixed_be_bytes(&value, modulus_byte_len(modulus));

    Ok(SharedSecret { bytes })
}
