//! Round key expansion
//!
//! Expands a 16/24/32-byte cipher key into `rounds + 1` block-sized subkeys
//! using the reference word recurrence: every `Nk`-th word is rotated,
//! substituted and mixed with a round constant, so no two subkeys repeat.

use zeroize::Zeroize;

use super::{BLOCK_SIZE, KeySize, sbox::SBOX};
use crate::error::CryptoError;

/// Round constants, successive powers of `x` in GF(2^8)
const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

type Word = [u8; 4];

/// Per-round subkeys derived from one cipher key.
///
/// Computed once per session and wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeySchedule {
    key_size: KeySize,
    round_keys: Vec<[u8; BLOCK_SIZE]>,
}

impl RoundKeySchedule {
    /// Key size the schedule was expanded from.
    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Number of full rounds.
    pub fn rounds(&self) -> usize {
        self.key_size.rounds()
    }

    /// Subkey for `round` (0 is the initial whitening key).
    ///
    /// # Panics
    ///
    /// Panics if `round > self.rounds()`.
    pub fn round_key(&self, round: usize) -> &[u8; BLOCK_SIZE] {
        &self.round_keys[round]
    }

    /// All subkeys in order.
    pub fn round_keys(&self) -> &[[u8; BLOCK_SIZE]] {
        &self.round_keys
    }
}

impl std::fmt::Debug for RoundKeySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundKeySchedule")
            .field("key_size", &self.key_size)
            .field("round_keys", &self.round_keys.len())
            .finish()
    }
}

impl Drop for RoundKeySchedule {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

/// Expand `cipher_key` into `rounds + 1` subkeys.
///
/// The round count is fixed by the key length: 16 bytes → 10 rounds,
/// 24 → 12, 32 → 14.
///
/// A 32-byte key whose two halves are equal would make subkeys 0 and 1
/// identical, so it is refused.
///
/// # Errors
///
/// - `InvalidKeyLength` if `cipher_key` is not 16, 24 or 32 bytes
/// - `WeakKey` for a 32-byte key with identical halves
pub fn expand_round_keys(cipher_key: &[u8]) -> Result<RoundKeySchedule, CryptoError> {
    let key_size = KeySize::from_key_len(cipher_key.len())?;

    if key_size == KeySize::Aes256 && cipher_key[..16] == cipher_key[16..] {
        return Err(CryptoError::WeakKey);
    }

    let nk = key_size.key_len() / 4;
    let total_words = 4 * (key_size.rounds() + 1);

    let mut words: Vec<Word> = Vec::with_capacity(total_words);
    for chunk in cipher_key.chunks_exact(4) {
        words.push([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    for i in nk..total_words {
        let mut temp = words[i - 1];
        if i % nk == 0 {
            temp = sub_word(rot_word(temp));
            temp[0] ^= RCON[i / nk - 1];
        } else if nk > 6 && i % nk == 4 {
            temp = sub_word(temp);
        }

        let prev = words[i - nk];
        words.push([prev[0] ^ temp[0], prev[1] ^ temp[1], prev[2] ^ temp[2], prev[3] ^ temp[3]]);
    }

    let round_keys = words
        .chunks_exact(4)
        .map(|chunk| {
            let mut key = [0u8; BLOCK_SIZE];
            for (col, word) in chunk.iter().enumerate() {
                key[4 * col..4 * col + 4].copy_from_slice(word);
            }
            key
        })
        .collect::<Vec<_>>();

    words.zeroize();

    debug_assert_eq!(round_keys.len(), key_size.rounds() + 1);
    Ok(RoundKeySchedule { key_size, round_keys })
}

fn rot_word(word: Word) -> Word {
    [word[1], word[2], word[3], word[0]]
}

fn sub_word(word: Word) -> Word {
    word.map(|b| SBOX[b as usize])
}
