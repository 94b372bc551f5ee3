//! RC6 (w=32, r=20) decryption, modulus stage cipher slot 4.
//! 16-byte block, 16-byte key.

use super::rc_expand_key;
use super::BlockCipher;

const ROUNDS: usize = 20;

pub struct Rc6 {
    s: Vec<u32>,
}

impl Rc6 {
    pub fn new(key: &[u8]) -> Self {
        Self {
            s: rc_expand_key(&key[..16], 2 * ROUNDS + 4),
        }
    }
}

fn quad(x: u32) -> u32 {
    x.wrapping_mul(x.wrapping_mul(2).wrapping_add(1)).rotate_left(5)
}

impl BlockCipher for Rc6 {
    fn block_size(&self) -> usize {
        16
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let s = &self.s;
        let mut a = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut b = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
        let mut c = u32::from_le_bytes([src[8], src[9], src[10], src[11]]);
        let mut d = u32::from_le_bytes([src[12], src[13], src[14], src[15]]);

        c = c.wrapping_sub(s[2 * ROUNDS + 3]);
        a = a.wrapping_sub(s[2 * ROUNDS + 2]);

        for i in (1..=ROUNDS).rev() {
            (a, b, c, d) = (d, a, b, c);
            let u = quad(d);
            let t = quad(b);
            c = c.wrapping_sub(s[2 * i + 1]).rotate_right(t & 31) ^ u;
            a = a.wrapping_sub(s[2 * i]).rotate_right(u & 31) ^ t;
        }

        d = d.wrapping_sub(s[1]);
        b = b.wrapping_sub(s[0]);

        dst[0..4].copy_from_slice(&a.to_le_bytes());
        dst[4..8].copy_from_slice(&b.to_le_bytes());
        dst[8..12].copy_from_slice(&c.to_le_bytes());
        dst[12..16].copy_from_slice(&d.to_le_bytes());
    }
}
