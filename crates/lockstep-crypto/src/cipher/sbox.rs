//! GF(2^8) arithmetic and the substitution tables
//!
//! Both tables are built at compile time from the field inverse followed by
//! the reference affine transform. Nothing is recomputed per call.

/// Reduction polynomial `x^8 + x^4 + x^3 + x + 1` without the `x^8` term
const REDUCTION: u8 = 0x1b;

/// Affine transform constant
const AFFINE_CONSTANT: u8 = 0x63;

/// Multiply two field elements modulo the reduction polynomial.
pub const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= REDUCTION;
        }
        b >>= 1;
        i += 1;
    }
    product
}

/// Multiplicative inverse, `a^254`. Zero maps to zero.
pub const fn gf_inv(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }

    // 254 = 0b1111_1110: square-and-multiply over the seven high bits
    let mut result = 1u8;
    let mut power = a;
    let mut exp = 254u8;
    while exp > 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, power);
        }
        power = gf_mul(power, power);
        exp >>= 1;
    }
    result
}

const fn affine(x: u8) -> u8 {
    x ^ x.rotate_left(1) ^ x.rotate_left(2) ^ x.rotate_left(3) ^ x.rotate_left(4) ^ AFFINE_CONSTANT
}

const fn build_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = affine(gf_inv(i as u8));
        i += 1;
    }
    table
}

const fn invert(table: &[u8; 256]) -> [u8; 256] {
    let mut inverse = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inverse[table[i] as usize] = i as u8;
        i += 1;
    }
    inverse
}

/// Forward substitution table
pub const SBOX: [u8; 256] = build_sbox();

/// Inverse substitution table, `INV_SBOX[SBOX[x]] == x`
pub const INV_SBOX: [u8; 256] = invert(&SBOX);
