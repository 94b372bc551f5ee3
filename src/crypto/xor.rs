//! Chained-XOR stream decryption for version 12 containers, plus the
//! 3-byte repeating XOR used by camera sidecar files.

use super::keys::{TRS_XOR_KEY, XOR_CHAIN_INIT, XOR_CHAIN_STEP, XOR_KEY};

/// Decrypts a version 12 payload. Each output byte depends on the key
/// byte at `i & 15` and a running chain seeded from the previous
/// ciphertext byte.
pub fn decrypt_xor(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut chain = XOR_CHAIN_INIT;
    for (i, &b) in data.iter().enumerate() {
        out.push((b ^ XOR_KEY[i & 15]).wrapping_sub(chain));
        chain = b.wrapping_add(XOR_CHAIN_STEP);
    }
    out
}

/// Decrypts a camera sidecar payload with the 3-byte repeating key.
/// The transform is an involution.
pub fn decrypt_sidecar(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ TRS_XOR_KEY[i % 3])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_xor(plain: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(plain.len());
        let mut chain = XOR_CHAIN_INIT;
        for (i, &p) in plain.iter().enumerate() {
            let c = p.wrapping_add(chain) ^ XOR_KEY[i & 15];
            out.push(c);
            chain = c.wrapping_add(XOR_CHAIN_STEP);
        }
        out
    }

    #[test]
    fn xor_round_trip() {
        let plain: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let cipher = encrypt_xor(&plain);
        assert_ne!(cipher, plain);
        assert_eq!(decrypt_xor(&cipher), plain);
    }

    #[test]
    fn xor_empty() {
        assert!(decrypt_xor(&[]).is_empty());
    }

    #[test]
    fn sidecar_is_involution() {
        let plain = b"0 15.0 270.0 180.0 1.0".to_vec();
        let once = decrypt_sidecar(&plain);
        assert_ne!(once, plain);
        assert_eq!(decrypt_sidecar(&once), plain);
    }
}
