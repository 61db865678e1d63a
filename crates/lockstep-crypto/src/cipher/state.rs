//! The cipher's 4×4 working register and its round steps
//!
//! Bytes are stored column-major: input byte `i` sits at row `i % 4`,
//! column `i / 4`. Each step has an exact inverse used by decryption.

use super::{
    BLOCK_SIZE,
    sbox::{INV_SBOX, SBOX, gf_mul},
};

/// Working state for one block.
///
/// Created fresh per block, mutated in place by the round steps and
/// discarded once the output bytes are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherState {
    bytes: [u8; BLOCK_SIZE],
}

impl CipherState {
    /// Load a block into the state.
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Self {
        Self { bytes: *block }
    }

    /// Read the state back out as a block.
    pub fn into_block(self) -> [u8; BLOCK_SIZE] {
        self.bytes
    }

    /// Byte at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.bytes[row + 4 * col]
    }

    /// Replace every byte through the substitution table.
    pub fn sub_bytes(&mut self) {
        for byte in &mut self.bytes {
            *byte = SBOX[*byte as usize];
        }
    }

    /// Inverse of [`CipherState::sub_bytes`].
    pub fn inv_sub_bytes(&mut self) {
        for byte in &mut self.bytes {
            *byte = INV_SBOX[*byte as usize];
        }
    }

    /// Rotate row `r` left by `r` positions. Row 0 is untouched.
    pub fn shift_rows(&mut self) {
        let old = self.bytes;
        for row in 1..4 {
            for col in 0..4 {
                self.bytes[row + 4 * col] = old[row + 4 * ((col + row) % 4)];
            }
        }
    }

    /// Inverse of [`CipherState::shift_rows`].
    pub fn inv_shift_rows(&mut self) {
        let old = self.bytes;
        for row in 1..4 {
            for col in 0..4 {
                self.bytes[row + 4 * ((col + row) % 4)] = old[row + 4 * col];
            }
        }
    }

    /// Multiply every column by the fixed matrix
    /// `[[2,3,1,1],[1,2,3,1],[1,1,2,3],[3,1,1,2]]` over GF(2^8).
    ///
    /// Any single changed input byte changes all four bytes of its column.
    pub fn mix_columns(&mut self) {
        for col in 0..4 {
            let c = 4 * col;
            let [a0, a1, a2, a3] = [self.bytes[c], self.bytes[c + 1], self.bytes[c + 2], self.bytes[c + 3]];

            self.bytes[c] = gf_mul(a0, 2) ^ gf_mul(a1, 3) ^ a2 ^ a3;
            self.bytes[c + 1] = a0 ^ gf_mul(a1, 2) ^ gf_mul(a2, 3) ^ a3;
            self.bytes[c + 2] = a0 ^ a1 ^ gf_mul(a2, 2) ^ gf_mul(a3, 3);
            self.bytes[c + 3] = gf_mul(a0, 3) ^ a1 ^ a2 ^ gf_mul(a3, 2);
        }
    }

    /// Inverse of [`CipherState::mix_columns`], matrix
    /// `[[14,11,13,9],[9,14,11,13],[13,9,14,11],[11,13,9,14]]`.
    pub fn inv_mix_columns(&mut self) {
        for col in 0..4 {
            let c = 4 * col;
            let [a0, a1, a2, a3] = [self.bytes[c], self.bytes[c + 1], self.bytes[c + 2], self.bytes[c + 3]];

            self.bytes[c] = gf_mul(a0, 14) ^ gf_mul(a1, 11) ^ gf_mul(a2, 13) ^ gf_mul(a3, 9);
            self.bytes[c + 1] = gf_mul(a0, 9) ^ gf_mul(a1, 14) ^ gf_mul(a2, 11) ^ gf_mul(a3, 13);
            self.bytes[c + 2] = gf_mul(a0, 13) ^ gf_mul(a1, 9) ^ gf_mul(a2, 14) ^ gf_mul(a3, 11);
            self.bytes[c + 3] = gf_mul(a0, 11) ^ gf_mul(a1, 13) ^ gf_mul(a2, 9) ^ gf_mul(a3, 14);
        }
    }

    /// XOR a round key into the state. Self-inverse.
    pub fn add_round_key(&mut self, round_key: &[u8; BLOCK_SIZE]) {
        for (byte, key) in self.bytes.iter_mut().zip(round_key) {
            *byte ^= key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CipherState {
        let mut block = [0u8; BLOCK_SIZE];
        for (i, b) in block.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(17).wrapping_add(3);
        }
        CipherState::from_block(&block)
    }

    #[test]
    fn add_round_key_first_column() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(&[0x48, 0x65, 0x6c, 0x6c]);
        let mut key = [0u8; BLOCK_SIZE];
        key[..4].copy_from_slice(&[0x2b, 0x7e, 0x15, 0x16]);

        let mut state = CipherState::from_block(&block);
        state.add_round_key(&key);

        assert_eq!(&state.into_block()[..4], &[0x63, 0x1b, 0x79, 0x7a]);
    }

    #[test]
    fn shift_rows_moves_bytes_by_row_index() {
        let block: [u8; BLOCK_SIZE] = core::array::from_fn(|i| i as u8);
        let mut state = CipherState::from_block(&block);
        state.shift_rows();

        for col in 0..4 {
            assert_eq!(state.get(0, col), block[4 * col], "row 0 is unshifted");
            assert_eq!(state.get(1, col), block[1 + 4 * ((col + 1) % 4)]);
            assert_eq!(state.get(2, col), block[2 + 4 * ((col + 2) % 4)]);
            assert_eq!(state.get(3, col), block[3 + 4 * ((col + 3) % 4)]);
        }
    }

    #[test]
    fn mix_columns_known_column() {
        // db 13 53 45 -> 8e 4d a1 bc
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(&[0xdb, 0x13, 0x53, 0x45]);
        let mut state = CipherState::from_block(&block);
        state.mix_columns();

        assert_eq!(&state.into_block()[..4], &[0x8e, 0x4d, 0xa1, 0xbc]);
    }

    #[test]
    fn mix_columns_diffuses_single_byte() {
        let base = sample();
        for row in 0..4 {
            let mut changed = base.into_block();
            changed[row] ^= 0x01;

            let mut a = base;
            let mut b = CipherState::from_block(&changed);
            a.mix_columns();
            b.mix_columns();

            for r in 0..4 {
                assert_ne!(a.get(r, 0), b.get(r, 0), "row {r} must change when input row {row} does");
            }
        }
    }

    #[test]
    fn every_step_has_an_inverse() {
        let original = sample();
        let key: [u8; BLOCK_SIZE] = core::array::from_fn(|i| 0xa5 ^ i as u8);

        let mut s = original;
        s.sub_bytes();
        s.inv_sub_bytes();
        assert_eq!(s, original);

        s.shift_rows();
        s.inv_shift_rows();
        assert_eq!(s, original);

        s.mix_columns();
        s.inv_mix_columns();
        assert_eq!(s, original);

        s.add_round_key(&key);
        s.add_round_key(&key);
        assert_eq!(s, original);
    }
}
