//! Container-level decryption for BMD model files.
//!
//! Every file starts with a 3-byte magic and a version byte. Versions 12,
//! 14 and 15 are encrypted and carry a little-endian payload size at bytes
//! 4..8; version 10 stores the payload in the clear after the header.

mod cast5;
mod gost;
mod idea;
mod keys;
mod lea;
mod modulus;
mod rc5;
mod rc6;
mod tea;
mod threeway;
mod xor;

pub use keys::{LEA_KEY, TRS_XOR_KEY, XOR_KEY};
pub use modulus::decrypt_modulus;
pub use xor::{decrypt_sidecar, decrypt_xor};

use crate::error::FormatError;

const MAGIC: &[u8; 3] = b"BMD";

/// Block cipher decryption interface for the modulus stage ciphers.
pub(crate) trait BlockCipher {
    fn block_size(&self) -> usize;
    /// `src` and `dst` are both exactly `block_size` bytes.
    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]);
}

/// RC5/RC6 shared key schedule (P32/Q32 magic constants, three mixing
/// passes over the longer of the two tables).
pub(crate) fn rc_expand_key(key: &[u8], s_len: usize) -> Vec<u32> {
    const P32: u32 = 0xB7E1_5163;
    const Q32: u32 = 0x9E37_79B9;

    let cw = (key.len() / 4).max(1);
    let mut l = vec![0u32; cw];
    for i in (0..key.len()).rev() {
        l[i / 4] = (l[i / 4] << 8).wrapping_add(key[i] as u32);
    }

    let mut s = vec![0u32; s_len];
    s[0] = P32;
    for i in 1..s_len {
        s[i] = s[i - 1].wrapping_add(Q32);
    }

    let mut a = 0u32;
    let mut b = 0u32;
    let mut ii = 0;
    let mut jj = 0;
    for _ in 0..(3 * s_len).max(3 * cw) {
        a = s[ii].wrapping_add(a).wrapping_add(b).rotate_left(3);
        s[ii] = a;
        b = l[jj].wrapping_add(a).wrapping_add(b).rotate_left(a.wrapping_add(b) & 31);
        l[jj] = b;
        ii = (ii + 1) % s_len;
        jj = (jj + 1) % cw;
    }
    s
}

/// Returns the container version byte, or an error when the magic or
/// header length is wrong.
pub fn container_version(raw: &[u8]) -> Result<u8, FormatError> {
    if raw.len() < 4 {
        return Err(FormatError::Truncated("header"));
    }
    if &raw[..3] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    Ok(raw[3])
}

/// Extracts the encrypted payload region of a sized container.
fn sized_payload(raw: &[u8]) -> Result<&[u8], FormatError> {
    if raw.len() < 8 {
        return Err(FormatError::Truncated("payload size"));
    }
    let size = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
    raw.get(8..8 + size)
        .ok_or(FormatError::Truncated("payload"))
}

/// Validates the container header and returns the decrypted model payload.
pub fn decrypt_container(raw: &[u8]) -> Result<Vec<u8>, FormatError> {
    match container_version(raw)? {
        10 => Ok(raw[4..].to_vec()),
        12 => Ok(decrypt_xor(sized_payload(raw)?)),
        14 => decrypt_modulus(sized_payload(raw)?),
        15 => Ok(lea::decrypt_lea(sized_payload(raw)?, &LEA_KEY)),
        other => Err(FormatError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            decrypt_container(b"XYZ\x0Apayload"),
            Err(FormatError::BadMagic)
        ));
    }

    #[test]
    fn rejects_short_header() {
        assert!(matches!(
            decrypt_container(b"BM"),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        assert!(matches!(
            decrypt_container(b"BMD\x0Bpayload"),
            Err(FormatError::UnsupportedVersion(11))
        ));
    }

    #[test]
    fn plain_version_passes_payload_through() {
        let mut raw = b"BMD\x0A".to_vec();
        raw.extend_from_slice(b"model bytes");
        assert_eq!(decrypt_container(&raw).unwrap(), b"model bytes");
    }

    #[test]
    fn sized_payload_respects_declared_length() {
        let mut raw = b"BMD\x0C".to_vec();
        raw.extend_from_slice(&(4u32).to_le_bytes());
        raw.extend_from_slice(&[1, 2, 3, 4, 99, 99]); // trailing junk ignored
        assert_eq!(decrypt_container(&raw).unwrap().len(), 4);
    }

    #[test]
    fn sized_payload_rejects_overrun() {
        let mut raw = b"BMD\x0C".to_vec();
        raw.extend_from_slice(&(100u32).to_le_bytes());
        raw.extend_from_slice(&[0; 10]);
        assert!(matches!(
            decrypt_container(&raw),
            Err(FormatError::Truncated(_))
        ));
    }
}
