//! Substitution-permutation block cipher
//!
//! A 16-byte block is loaded into a 4×4 [`CipherState`] and run through the
//! reference round structure:
//!
//! ```text
//! AddRoundKey(k0)
//! for round in 1..rounds:
//!     SubBytes → ShiftRows → MixColumns → AddRoundKey(k_round)
//! SubBytes → ShiftRows → AddRoundKey(k_rounds)      (no MixColumns)
//! ```
//!
//! Decryption applies the inverse steps in reverse order with the same
//! [`RoundKeySchedule`].

mod sbox;
mod schedule;
mod state;

pub use sbox::{INV_SBOX, SBOX, gf_inv, gf_mul};
pub use schedule::{RoundKeySchedule, expand_round_keys};
pub use state::CipherState;

use crate::error::CryptoError;

/// Cipher block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Supported cipher key widths.
///
/// The round count is a fixed function of the key width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeySize {
    /// 16-byte key, 10 rounds
    #[default]
    Aes128,
    /// 24-byte key, 12 rounds
    Aes192,
    /// 32-byte key, 14 rounds
    Aes256,
}

impl KeySize {
    /// Key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Number of rounds for this key width.
    pub const fn rounds(self) -> usize {
        match self {
            Self::Aes128 => 10,
            Self::Aes192 => 12,
            Self::Aes256 => 14,
        }
    }

    /// Key size for a key of `len` bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` for anything but 16, 24 or 32
    pub fn from_key_len(len: usize) -> Result<Self, CryptoError> {
        match len {
            16 => Ok(Self::Aes128),
            24 => Ok(Self::Aes192),
            32 => Ok(Self::Aes256),
            actual => Err(CryptoError::InvalidKeyLength { actual }),
        }
    }

    /// Key size from a width in bits (128, 192 or 256).
    pub fn from_bits(bits: u16) -> Result<Self, CryptoError> {
        Self::from_key_len(usize::from(bits / 8))
    }
}

/// Encrypt one block.
pub fn encrypt_block(block: &[u8; BLOCK_SIZE], schedule: &RoundKeySchedule) -> [u8; BLOCK_SIZE] {
    let rounds = schedule.rounds();
    let mut state = CipherState::from_block(block);

    state.add_round_key(schedule.round_key(0));

    for round in 1..rounds {
        state.sub_bytes();
        state.shift_rows();
        state.mix_columns();
        state.add_round_key(schedule.round_key(round));
    }

    state.sub_bytes();
    state.shift_rows();
    state.add_round_key(schedule.round_key(rounds));

    state.into_block()
}

/// Decrypt one block. Exact inverse of [`encrypt_block`].
pub fn decrypt_block(block: &[u8; BLOCK_SIZE], schedule: &RoundKeySchedule) -> [u8; BLOCK_SIZE] {
    let rounds = schedule.rounds();
    let mut state = CipherState::from_block(block);

    state.add_round_key(schedule.round_key(rounds));
    state.inv_shift_rows();
    state.inv_sub_bytes();

    for round in (1..rounds).rev() {
        state.add_round_key(schedule.round_key(round));
        state.inv_mix_columns();
        state.inv_shift_rows();
        state.inv_sub_bytes();
    }

    state.add_round_key(schedule.round_key(0));

    state.into_block()
}

/// Encrypt one block in place.
pub fn encrypt_block_in_place(block: &mut [u8; BLOCK_SIZE], schedule: &RoundKeySchedule) {
    *block = encrypt_block(block, schedule);
}

/// Decrypt one block in place.
pub fn decrypt_block_in_place(block: &mut [u8; BLOCK_SIZE], schedule: &RoundKeySchedule) {
    *block = decrypt_block(block, schedule);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> [u8; BLOCK_SIZE] {
        let bytes = hex::decode(s).unwrap();
        let mut out = [0u8; BLOCK_SIZE];
        out.copy_from_slice(&bytes);
        out
    }

    fn check_vector(key: &str, plaintext: &str, ciphertext: &str) {
        let schedule = expand_round_keys(&hex::decode(key).unwrap()).unwrap();
        let pt = block(plaintext);
        let ct = block(ciphertext);

        assert_eq!(encrypt_block(&pt, &schedule), ct, "encrypt under key {key}");
        assert_eq!(decrypt_block(&ct, &schedule), pt, "decrypt under key {key}");

        let mut in_place = pt;
        encrypt_block_in_place(&mut in_place, &schedule);
        assert_eq!(in_place, ct);
        decrypt_block_in_place(&mut in_place, &schedule);
        assert_eq!(in_place, pt);
    }

    #[test]
    fn fips_197_appendix_b() {
        check_vector(
            "2b7e151628aed2a6abf7158809cf4f3c",
            "3243f6a8885a308d313198a2e0370734",
            "3925841d02dc09fbdc118597196a0b32",
        );
    }

    #[test]
    fn fips_197_appendix_c() {
        let plaintext = "00112233445566778899aabbccddeeff";
        check_vector("000102030405060708090a0b0c0d0e0f", plaintext, "69c4e0d86a7b0430d8cdb78070b4c55a");
        check_vector(
            "000102030405060708090a0b0c0d0e0f1011121314151617",
            plaintext,
            "dda97ca4864cdfe06eaf70a0ec0d7191",
        );
        check_vector(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
            plaintext,
            "8ea2b7ca516745bfeafc49904b496089",
        );
    }

    #[test]
    fn key_size_table() {
        assert_eq!(KeySize::from_bits(128), Ok(KeySize::Aes128));
        assert_eq!(KeySize::from_bits(192), Ok(KeySize::Aes192));
        assert_eq!(KeySize::from_bits(256), Ok(KeySize::Aes256));
        assert!(KeySize::from_bits(64).is_err());
        assert_eq!(KeySize::Aes192.rounds(), 12);
    }

    #[test]
    fn single_bit_change_spreads_across_block() {
        let schedule = expand_round_keys(&[0x11; 16]).unwrap();
        let a = [0u8; BLOCK_SIZE];
        let mut b = a;
        b[0] = 1;

        let ca = encrypt_block(&a, &schedule);
        let cb = encrypt_block(&b, &schedule);
        let differing = ca.iter().zip(&cb).filter(|(x, y)| x != y).count();

        assert!(differing >= 12, "only {differing} bytes changed");
    }
}
