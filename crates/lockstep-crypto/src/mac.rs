//! Record authentication tags (HMAC-SHA256)

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::kdf::MAC_KEY_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Size of a record tag in bytes
pub const TAG_SIZE: usize = 32;

fn keyed(mac_key: &[u8; MAC_KEY_SIZE], data: &[u8]) -> HmacSha256 {
    let Ok(mut mac) = HmacSha256::new_from_slice(mac_key) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(data);
    mac
}

/// Compute the tag for `data`.
pub fn compute_tag(mac_key: &[u8; MAC_KEY_SIZE], data: &[u8]) -> [u8; TAG_SIZE] {
    keyed(mac_key, data).finalize().into_bytes().into()
}

/// Check `tag` against `data` in constant time.
///
/// Returns `false` for a tag of the wrong length.
pub fn verify_tag(mac_key: &[u8; MAC_KEY_SIZE], data: &[u8], tag: &[u8]) -> bool {
    keyed(mac_key, data).verify_slice(tag).is_ok()
}
