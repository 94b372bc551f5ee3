//! LEA-256 in ECB mode for version 15 containers.
//!
//! 32 rounds, 192 round keys, little-endian 32-bit words. Only the
//! decryption direction is needed by the pipeline; the forward cipher
//! lives in the test module to validate round trips.

use super::keys::LEA_DELTA;

const ROUNDS: usize = 32;
const SCHEDULE_SHIFTS: [u32; 6] = [1, 3, 6, 11, 13, 17];

pub struct Lea256 {
    rk: [u32; ROUNDS * 6],
}

impl Lea256 {
    pub fn new(key: &[u8; 32]) -> Self {
        let mut t = [0u32; 8];
        for (i, word) in t.iter_mut().enumerate() {
            *word = u32::from_le_bytes([key[i * 4], key[i * 4 + 1], key[i * 4 + 2], key[i * 4 + 3]]);
        }
        let mut rk = [0u32; ROUNDS * 6];
        for i in 0..ROUNDS as u32 {
            let delta = LEA_DELTA[(i & 7) as usize];
            let base = ((i * 6) & 7) as usize;
            for j in 0..6u32 {
                let idx = (base + j as usize) & 7;
                t[idx] = t[idx]
                    .wrapping_add(delta.rotate_left(i + j))
                    .rotate_left(SCHEDULE_SHIFTS[j as usize]);
                rk[(i * 6 + j) as usize] = t[idx];
            }
        }
        Self { rk }
    }

    pub fn decrypt_block(&self, block: &mut [u8; 16]) {
        let mut s = [0u32; 4];
        for (i, word) in s.iter_mut().enumerate() {
            *word = u32::from_le_bytes([
                block[i * 4],
                block[i * 4 + 1],
                block[i * 4 + 2],
                block[i * 4 + 3],
            ]);
        }
        for r in (0..ROUNDS).rev() {
            let rk = &self.rk[r * 6..r * 6 + 6];
            let t0 = s[3];
            let t1 = s[0].rotate_right(9).wrapping_sub(t0 ^ rk[0]) ^ rk[1];
            let t2 = s[1].rotate_left(5).wrapping_sub(t1 ^ rk[2]) ^ rk[3];
            let t3 = s[2].rotate_left(3).wrapping_sub(t2 ^ rk[4]) ^ rk[5];
            s = [t0, t1, t2, t3];
        }
        for (i, word) in s.iter().enumerate() {
            block[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
    }
}

/// Decrypts every complete 16-byte block in place. A trailing partial
/// block is passed through unchanged.
pub fn decrypt_lea(data: &[u8], key: &[u8; 32]) -> Vec<u8> {
    let cipher = Lea256::new(key);
    let mut out = data.to_vec();
    for chunk in out.chunks_exact_mut(16) {
        let mut block = [0u8; 16];
        block.copy_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        chunk.copy_from_slice(&block);
    }
    out
}
