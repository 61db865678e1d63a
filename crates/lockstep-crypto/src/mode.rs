//! Block chaining modes and PKCS#7 padding
//!
//! CBC is the mode used for records: each plaintext block is XORed with the
//! previous ciphertext block (the IV for the first) before encryption, so
//! identical plaintext blocks encrypt differently.
//!
//! ECB encrypts every block independently. It leaks repeated blocks and is
//! only exposed for comparison.

use crate::{
    cipher::{BLOCK_SIZE, RoundKeySchedule, decrypt_block, encrypt_block},
    error::CryptoError,
};

/// Append PKCS#7 padding.
///
/// Always adds between 1 and [`BLOCK_SIZE`] bytes, each equal to the pad
/// length. Already-aligned input gets a whole extra block.
pub fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

/// Strip PKCS#7 padding.
///
/// # Errors
///
/// - `Padding` if the final byte is 0 or larger than a block, or the
///   trailing bytes are not all equal to it
pub fn unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::Padding);
    };

    let pad_len = usize::from(last);
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > data.len() {
        return Err(CryptoError::Padding);
    }

    let (body, padding) = data.split_at(data.len() - pad_len);
    if padding.iter().any(|&b| b != last) {
        return Err(CryptoError::Padding);
    }

    Ok(body)
}

fn check_ciphertext_len(len: usize) -> Result<(), CryptoError> {
    if len == 0 || len % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength { actual: len, block_size: BLOCK_SIZE });
    }
    Ok(())
}

fn to_block(chunk: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(chunk);
    block
}

fn xor_in_place(block: &mut [u8; BLOCK_SIZE], other: &[u8; BLOCK_SIZE]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

/// Pad and encrypt `plaintext` in CBC mode.
///
/// Output length is the padded length, a positive multiple of
/// [`BLOCK_SIZE`].
pub fn encrypt_cbc(plaintext: &[u8], schedule: &RoundKeySchedule, iv: &[u8; BLOCK_SIZE]) -> Vec<u8> {
    let padded = pad(plaintext);
    let mut out = Vec::with_capacity(padded.len());
    let mut chain = *iv;

    for chunk in padded.chunks_exact(BLOCK_SIZE) {
        let mut block = to_block(chunk);
        xor_in_place(&mut block, &chain);
        chain = encrypt_block(&block, schedule);
        out.extend_from_slice(&chain);
    }

    out
}

/// Decrypt a CBC ciphertext and strip its padding.
///
/// # Errors
///
/// - `InvalidCiphertextLength` if `ciphertext` is empty or not block-aligned
/// - `Padding` if the recovered padding is malformed
pub fn decrypt_cbc(
    ciphertext: &[u8],
    schedule: &RoundKeySchedule,
    iv: &[u8; BLOCK_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    check_ciphertext_len(ciphertext.len())?;

    let mut out = Vec::with_capacity(ciphertext.len());
    let mut chain = *iv;

    for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
        let block = to_block(chunk);
        let mut plain = decrypt_block(&block, schedule);
        xor_in_place(&mut plain, &chain);
        out.extend_from_slice(&plain);
        chain = block;
    }

    let body_len = unpad(&out)?.len();
    out.truncate(body_len);
    Ok(out)
}

/// Pad and encrypt `plaintext` with no chaining.
///
/// Equal plaintext blocks give equal ciphertext blocks.
pub fn encrypt_ecb(plaintext: &[u8], schedule: &RoundKeySchedule) -> Vec<u8> {
    pad(plaintext)
        .chunks_exact(BLOCK_SIZE)
        .flat_map(|chunk| encrypt_block(&to_block(chunk), schedule))
        .collect()
}

/// Decrypt an unchained ciphertext and strip its padding.
///
/// # Errors
///
/// - `InvalidCiphertextLength` if `ciphertext` is empty or not block-aligned
/// - `Padding` if the recovered padding is malformed
pub fn decrypt_ecb(ciphertext: &[u8], schedule: &RoundKeySchedule) -> Result<Vec<u8>, CryptoError> {
    check_ciphertext_len(ciphertext.len())?;

    let mut out: Vec<u8> = ciphertext
        .chunks_exact(BLOCK_SIZE)
        .flat_map(|chunk| decrypt_block(&to_block(chunk), schedule))
        .collect();

    let body_len = unpad(&out)?.len();
    out.truncate(body_len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::expand_round_keys;

    fn schedule() -> RoundKeySchedule {
        expand_round_keys(&hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap()).unwrap()
    }

    #[test]
    fn pad_lengths() {
        assert_eq!(pad(b""), vec![16u8; 16]);
        assert_eq!(pad(b"abc").len(), 16);
        assert_eq!(pad(&[0u8; 15])[15], 1);
        assert_eq!(pad(&[0u8; 16]).len(), 32);
        assert_eq!(&pad(&[0u8; 16])[16..], &[16u8; 16]);
    }

    #[test]
    fn unpad_rejects_malformed() {
        let mut block = pad(b"hello");
        assert_eq!(unpad(&block).unwrap(), b"hello");

        *block.last_mut().unwrap() = 0;
        assert_eq!(unpad(&block), Err(CryptoError::Padding));

        *block.last_mut().unwrap() = 17;
        assert_eq!(unpad(&block), Err(CryptoError::Padding));

        let mut block = pad(b"hello");
        block[12] ^= 0xff;
        assert_eq!(unpad(&block), Err(CryptoError::Padding));

        assert_eq!(unpad(&[]), Err(CryptoError::Padding));
    }

    #[test]
    fn cbc_sp800_38a_first_block() {
        // F.2.1 CBC-AES128.Encrypt, block 1
        let iv: [u8; 16] = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap().try_into().unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = encrypt_cbc(&plaintext, &schedule(), &iv);

        assert_eq!(hex::encode(&ciphertext[..16]), "7649abac8119b246cee98e9b12e9197d");
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn cbc_round_trip() {
        let iv = [7u8; 16];
        for len in [0, 1, 15, 16, 17, 100] {
            let msg: Vec<u8> = (0..len as u8).collect();
            let ct = encrypt_cbc(&msg, &schedule(), &iv);
            assert_eq!(ct.len() % BLOCK_SIZE, 0);
            assert_eq!(decrypt_cbc(&ct, &schedule(), &iv).unwrap(), msg);
        }
    }

    #[test]
    fn cbc_rejects_unaligned_ciphertext() {
        let iv = [0u8; 16];
        assert_eq!(
            decrypt_cbc(&[], &schedule(), &iv),
            Err(CryptoError::InvalidCiphertextLength { actual: 0, block_size: 16 })
        );
        assert_eq!(
            decrypt_cbc(&[0u8; 17], &schedule(), &iv),
            Err(CryptoError::InvalidCiphertextLength { actual: 17, block_size: 16 })
        );
    }

    #[test]
    fn ecb_leaks_repeated_blocks_cbc_does_not() {
        let msg = [0x41u8; 48];
        let iv = [0x24u8; 16];

        let ecb = encrypt_ecb(&msg, &schedule());
        assert_eq!(ecb[0..16], ecb[16..32]);
        assert_eq!(ecb[16..32], ecb[32..48]);

        let cbc = encrypt_cbc(&msg, &schedule(), &iv);
        assert_ne!(cbc[0..16], cbc[16..32]);
        assert_ne!(cbc[16..32], cbc[32..48]);

        assert_eq!(decrypt_ecb(&ecb, &schedule()).unwrap(), msg);
    }
}
