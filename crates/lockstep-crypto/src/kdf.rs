//! Session key derivation using HKDF
//!
//! One shared secret feeds three independent keys. Each key gets its own
//! HKDF `info` label, so learning one key reveals nothing about the others.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{
    cipher::{BLOCK_SIZE, KeySize},
    exchange::SharedSecret,
};

type HmacSha256 = Hmac<Sha256>;

/// Size of each endpoint's handshake nonce
pub const NONCE_SIZE: usize = 32;

/// Size of the record authentication key
pub const MAC_KEY_SIZE: usize = 32;

/// Prefix shared by every derivation label
const LABEL_PREFIX: &[u8] = b"lockstep v1 ";

/// Label for the block cipher key
const CIPHER_LABEL: &[u8] = b"cipher";

/// Label for the chaining-mode IV seed
const IV_LABEL: &[u8] = b"iv";

/// Label for the record MAC key
const MAC_LABEL: &[u8] = b"mac";

/// Label mixed into per-record IVs
const RECORD_IV_LABEL: &[u8] = b"record iv";

/// Working keys for one session.
///
/// Both endpoints derive an identical value. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    cipher_key: Vec<u8>,
    iv: [u8; BLOCK_SIZE],
    mac_key: [u8; MAC_KEY_SIZE],
}

impl SessionKeys {
    /// Block cipher key (16, 24 or 32 bytes).
    pub fn cipher_key(&self) -> &[u8] {
        &self.cipher_key
    }

    /// Seed for per-record initialization vectors.
    pub fn iv(&self) -> &[u8; BLOCK_SIZE] {
        &self.iv
    }

    /// Record authentication key.
    pub fn mac_key(&self) -> &[u8; MAC_KEY_SIZE] {
        &self.mac_key
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cipher_key_len", &self.cipher_key.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SessionKeys {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.iv.zeroize();
        self.mac_key.zeroize();
    }
}

/// Derive the session's cipher key, IV seed and MAC key.
///
/// HKDF-SHA256 with `salt = client_nonce || server_nonce` and the shared
/// secret as input keying material. Each output uses
/// `info = "lockstep v1 " || label`.
///
/// # Security
///
/// - Changing the secret, either nonce or the label changes every output
/// - Outputs under different labels are independent HKDF expansions
/// - Deterministic: both endpoints compute the same keys
pub fn derive_session_keys(
    shared_secret: &SharedSecret,
    client_nonce: &[u8; NONCE_SIZE],
    server_nonce: &[u8; NONCE_SIZE],
    key_size: KeySize,
) -> SessionKeys {
    let mut salt = [0u8; 2 * NONCE_SIZE];
    salt[..NONCE_SIZE].copy_from_slice(client_nonce);
    salt[NONCE_SIZE..].copy_from_slice(server_nonce);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared_secret.as_bytes());

    let mut cipher_key = vec![0u8; key_size.key_len()];
    expand_labeled(&hkdf, CIPHER_LABEL, &mut cipher_key);

    let mut iv = [0u8; BLOCK_SIZE];
    expand_labeled(&hkdf, IV_LABEL, &mut iv);

    let mut mac_key = [0u8; MAC_KEY_SIZE];
    expand_labeled(&hkdf, MAC_LABEL, &mut mac_key);

    SessionKeys { cipher_key, iv, mac_key }
}

fn expand_labeled(hkdf: &Hkdf<Sha256>, label: &[u8], out: &mut [u8]) {
    let mut info = Vec::with_capacity(LABEL_PREFIX.len() + label.len());
    info.extend_from_slice(LABEL_PREFIX);
    info.extend_from_slice(label);

    let Ok(()) = hkdf.expand(&info, out) else {
        unreachable!("outputs of at most 32 bytes are valid HKDF-SHA256 lengths");
    };
}

/// Derive the IV for one record.
///
/// `HMAC-SHA256(iv_seed, "record iv" || direction || sequence)` truncated to
/// one block. Every record in a direction gets a fresh IV, so equal
/// plaintexts sent twice do not produce equal ciphertexts.
pub fn derive_record_iv(iv_seed: &[u8; BLOCK_SIZE], direction: u8, sequence: u64) -> [u8; BLOCK_SIZE] {
    let Ok(mut mac) = HmacSha256::new_from_slice(iv_seed) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(RECORD_IV_LABEL);
    mac.update(&[direction]);
    mac.update(&sequence.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&digest[..BLOCK_SIZE]);
    iv
}
