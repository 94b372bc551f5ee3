//! TEA with big-endian words, used as modulus stage cipher slot 0.

use super::BlockCipher;

const DELTA: u32 = 0x9E37_79B9;
const DECRYPT_SUM: u32 = 0xC6EF_3720;
const ROUNDS: usize = 32;

pub struct Tea {
    k: [u32; 4],
}

impl Tea {
    pub fn new(key: &[u8]) -> Self {
        let mut k = [0u32; 4];
        for (i, word) in k.iter_mut().enumerate() {
            *word = u32::from_be_bytes([key[i * 4], key[i * 4 + 1], key[i * 4 + 2], key[i * 4 + 3]]);
        }
        Self { k }
    }
}

impl BlockCipher for Tea {
    fn block_size(&self) -> usize {
        8
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let mut v0 = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        let mut v1 = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        let [k0, k1, k2, k3] = self.k;
        let mut sum = DECRYPT_SUM;
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(
                (v0 << 4).wrapping_add(k2) ^ v0.wrapping_add(sum) ^ (v0 >> 5).wrapping_add(k3),
            );
            v0 = v0.wrapping_sub(
                (v1 << 4).wrapping_add(k0) ^ v1.wrapping_add(sum) ^ (v1 >> 5).wrapping_add(k1),
            );
            sum = sum.wrapping_sub(DELTA);
        }
        dst[0..4].copy_from_slice(&v0.to_be_bytes());
        dst[4..8].copy_from_slice(&v1.to_be_bytes());
    }
}

#[cfg(test)]
pub(crate) fn encrypt_block(cipher: &Tea, src: &[u8], dst: &mut [u8]) {
    let mut v0 = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
    let mut v1 = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
    let [k0, k1, k2, k3] = cipher.k;
    let mut sum = 0u32;
    for _ in 0..ROUNDS {
        sum = sum.wrapping_add(DELTA);
        v0 = v0.wrapping_add(
            (v1 << 4).wrapping_add(k0) ^ v1.wrapping_add(sum) ^ (v1 >> 5).wrapping_add(k1),
        );
        v1 = v1.wrapping_add(
            (v0 << 4).wrapping_add(k2) ^ v0.wrapping_add(sum) ^ (v0 >> 5).wrapping_add(k3),
        );
    }
    dst[0..4].copy_from_slice(&v0.to_be_bytes());
    dst[4..8].copy_from_slice(&v1.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tea_round_trip() {
        let cipher = Tea::new(b"0123456789abcdef");
        let plain = *b"8bytemsg";
        let mut enc = [0u8; 8];
        encrypt_block(&cipher, &plain, &mut enc);
        assert_ne!(enc, plain);
        let mut dec = [0u8; 8];
        cipher.decrypt_block(&enc, &mut dec);
        assert_eq!(dec, plain);
    }
}
