//! RC5 (w=32, r=16) decryption, modulus stage cipher slot 3.
//! 8-byte block, 16-byte key.

use super::rc_expand_key;
use super::BlockCipher;

const ROUNDS: usize = 16;

pub struct Rc5 {
    s: Vec<u32>,
}

impl Rc5 {
    pub fn new(key: &[u8]) -> Self {
        Self {
            s: rc_expand_key(&key[..16], 2 * (ROUNDS + 1)),
        }
    }
}

impl BlockCipher for Rc5 {
    fn block_size(&self) -> usize {
        8
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let s = &self.s;
        let mut a = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut b = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);

        for i in (1..=ROUNDS).rev() {
            b = b.wrapping_sub(s[2 * i + 1]).rotate_right(a & 31) ^ a;
            a = a.wrapping_sub(s[2 * i]).rotate_right(b & 31) ^ b;
        }
        b = b.wrapping_sub(s[1]);
        a = a.wrapping_sub(s[0]);

        dst[0..4].copy_from_slice(&a.to_le_bytes());
        dst[4..8].copy_from_slice(&b.to_le_bytes());
    }
}
