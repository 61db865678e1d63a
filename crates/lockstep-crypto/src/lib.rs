//! Lockstep Cryptographic Primitives
//!
//! Building blocks for the Lockstep secure channel. Every function is pure
//! apart from key generation, which takes its randomness from the caller so
//! tests can drive it from a seeded generator.
//!
//! # Key Lifecycle
//!
//! ```text
//! DomainParameters (p, g)
//!        │
//!        ▼
//! KeyPair (secret, g^secret mod p) ── exchange public values ──┐
//!        │                                                      │
//!        ▼                                                      ▼
//! SharedSecret = peer_public^secret mod p   (same on both sides)
//!        │
//!        ▼
//! HKDF(salt = client_nonce || server_nonce) → SessionKeys
//!        │                       │                  │
//!        ▼                       ▼                  ▼
//!   cipher key              IV seed             MAC key
//!        │                       │                  │
//!        ▼                       ▼                  ▼
//! RoundKeySchedule      per-record IV      HMAC-SHA256 tag
//!        │                       │
//!        └──────── CBC ──────────┘
//! ```
//!
//! # Security
//!
//! Key agreement:
//! - Peer public values outside `[2, p - 2]` are rejected before use
//! - Secrets are wiped on drop and never appear in `Debug` output
//!
//! Confidentiality:
//! - Records are CBC-chained under a fresh IV per record
//! - The unchained ECB mode exists for comparison only
//!
//! Integrity:
//! - Every record carries an HMAC-SHA256 tag over its ciphertext
//! - Tags are compared in constant time
//!
//! The cipher is a from-scratch rendition of the reference 128-bit block
//! design. It has no side-channel hardening and is not a substitute for a
//! vetted library.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod arith;
pub mod cipher;
pub mod error;
pub mod exchange;
pub mod kdf;
pub mod mac;
pub mod mode;

pub use cipher::{
    BLOCK_SIZE, KeySize, RoundKeySchedule, decrypt_block, decrypt_block_in_place, encrypt_block,
    encrypt_block_in_place, expand_round_keys,
};
pub use error::CryptoError;
pub use exchange::{
    DomainParameters, KeyPair, SharedSecret, compute_shared_secret, generate_key_pair,
    validate_public_value,
};
pub use kdf::{MAC_KEY_SIZE, NONCE_SIZE, SessionKeys, derive_record_iv, derive_session_keys};
pub use mac::{TAG_SIZE, compute_tag, verify_tag};
pub use mode::{decrypt_cbc, decrypt_ecb, encrypt_cbc, encrypt_ecb, pad, unpad};
