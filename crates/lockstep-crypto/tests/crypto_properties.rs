//! Property-based tests for the Lockstep primitives
//!
//! 1. **Agreement**: both sides of an exchange compute the same secret
//! 2. **Round-trip**: decrypt(encrypt(m)) == m for blocks and CBC messages
//! 3. **Chaining**: repeated plaintext blocks repeat under ECB, never under CBC
//! 4. **Integrity**: any flipped bit in data or tag fails verification
//! 5. **Schedule**: subkeys never repeat within a schedule

use lockstep_crypto::{
    BLOCK_SIZE, DomainParameters, KeySize, compute_shared_secret, compute_tag, decrypt_block,
    decrypt_cbc, derive_session_keys, encrypt_block, encrypt_cbc, encrypt_ecb, expand_round_keys,
    generate_key_pair, verify_tag,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn key_size_strategy() -> impl Strategy<Value = KeySize> {
    prop_oneof![Just(KeySize::Aes128), Just(KeySize::Aes192), Just(KeySize::Aes256)]
}

// 32-byte keys with equal halves are refused, so force them apart
fn cipher_key(key_size: KeySize, mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.truncate(key_size.key_len());
    if key_size == KeySize::Aes256 && bytes[..16] == bytes[16..] {
        bytes[31] ^= 0x80;
    }
    bytes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_toy_exchange_agrees(seed in any::<u64>()) {
        let params = DomainParameters::toy();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = generate_key_pair(&params, &mut rng).unwrap();
        let b = generate_key_pair(&params, &mut rng).unwrap();

        let ab = compute_shared_secret(a.secret(), b.public(), params.modulus()).unwrap();
        let ba = compute_shared_secret(b.secret(), a.public(), params.modulus()).unwrap();

        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn prop_block_roundtrip(
        key_size in key_size_strategy(),
        key in prop::collection::vec(any::<u8>(), 32),
        block in any::<[u8; BLOCK_SIZE]>(),
    ) {
        let schedule = expand_round_keys(&cipher_key(key_size, key)).unwrap();
        let ct = encrypt_block(&block, &schedule);

        prop_assert_eq!(decrypt_block(&ct, &schedule), block);
    }

    #[test]
    fn prop_cbc_roundtrip(
        key_size in key_size_strategy(),
        key in prop::collection::vec(any::<u8>(), 32),
        iv in any::<[u8; BLOCK_SIZE]>(),
        plaintext in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let schedule = expand_round_keys(&cipher_key(key_size, key)).unwrap();
        let ct = encrypt_cbc(&plaintext, &schedule, &iv);

        prop_assert_eq!(ct.len() % BLOCK_SIZE, 0);
        prop_assert!(ct.len() > plaintext.len());
        prop_assert_eq!(decrypt_cbc(&ct, &schedule, &iv).unwrap(), plaintext);
    }

    #[test]
    fn prop_ecb_repeats_cbc_does_not(
        key in prop::collection::vec(any::<u8>(), 16),
        iv in any::<[u8; BLOCK_SIZE]>(),
        block in any::<[u8; BLOCK_SIZE]>(),
    ) {
        let schedule = expand_round_keys(&key).unwrap();
        let msg = [block, block].concat();

        let ecb = encrypt_ecb(&msg, &schedule);
        prop_assert_eq!(&ecb[..16], &ecb[16..32]);

        let cbc = encrypt_cbc(&msg, &schedule, &iv);
        prop_assert_ne!(&cbc[..16], &cbc[16..32]);
    }

    #[test]
    fn prop_flipped_bit_fails_verification(
        mac_key in any::<[u8; 32]>(),
        data in prop::collection::vec(any::<u8>(), 1..200),
        flip_index in any::<prop::sample::Index>(),
        bit in 0u8..8,
        flip_tag in any::<bool>(),
    ) {
        let tag = compute_tag(&mac_key, &data);
        prop_assert!(verify_tag(&mac_key, &data, &tag));

        if flip_tag {
            let mut bad = tag;
            bad[flip_index.index(bad.len())] ^= 1 << bit;
            prop_assert!(!verify_tag(&mac_key, &data, &bad));
        } else {
            let mut bad = data.clone();
            let i = flip_index.index(bad.len());
            bad[i] ^= 1 << bit;
            prop_assert!(!verify_tag(&mac_key, &bad, &tag));
        }
    }

    #[test]
    fn prop_subkeys_never_repeat(
        key_size in key_size_strategy(),
        key in prop::collection::vec(any::<u8>(), 32),
    ) {
        let schedule = expand_round_keys(&cipher_key(key_size, key)).unwrap();
        let keys = schedule.round_keys();

        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                prop_assert_ne!(keys[i], keys[j]);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_derived_keys_depend_on_nonces(
        seed in any::<u64>(),
        client_nonce in any::<[u8; 32]>(),
        server_nonce in any::<[u8; 32]>(),
    ) {
        prop_assume!(client_nonce != server_nonce);

        let params = DomainParameters::toy();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = generate_key_pair(&params, &mut rng).unwrap();
        let b = generate_key_pair(&params, &mut rng).unwrap();
        let shared = compute_shared_secret(a.secret(), b.public(), params.modulus()).unwrap();

        let keys = derive_session_keys(&shared, &client_nonce, &server_nonce, KeySize::Aes128);
        let swapped = derive_session_keys(&shared, &server_nonce, &client_nonce, KeySize::Aes128);

        prop_assert_ne!(keys.cipher_key(), swapped.cipher_key());
        prop_assert_ne!(keys.mac_key(), swapped.mac_key());
        prop_assert_ne!(keys.iv(), swapped.iv());
    }
}

#[test]
fn modp_exchange_agrees() {
    let params = DomainParameters::modp_2048();
    let mut rng = ChaCha20Rng::seed_from_u64(2024);

    for _ in 0..3 {
        let a = generate_key_pair(&params, &mut rng).unwrap();
        let b = generate_key_pair(&params, &mut rng).unwrap();

        let ab = compute_shared_secret(a.secret(), b.public(), params.modulus()).unwrap();
        let ba = compute_shared_secret(b.secret(), a.public(), params.modulus()).unwrap();
        assert_eq!(ab, ba);
    }
}
