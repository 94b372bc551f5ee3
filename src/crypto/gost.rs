//! GOST 28147-89 decryption, modulus stage cipher slot 7.
//! 8-byte block, 32-byte key, 32 rounds.

use super::BlockCipher;

// 8 rows of 4-bit substitutions.
const SBOX: [[u8; 16]; 8] = [
    [4, 10, 9, 2, 13, 8, 0, 14, 6, 11, 1, 12, 7, 15, 5, 3],
    [14, 11, 4, 12, 6, 13, 15, 10, 2, 3, 8, 1, 0, 7, 5, 9],
    [5, 8, 1, 13, 10, 3, 4, 2, 14, 15, 12, 7, 6, 0, 9, 11],
    [7, 13, 10, 1, 0, 8, 9, 15, 14, 4, 6, 12, 11, 2, 5, 3],
    [6, 12, 7, 1, 5, 15, 13, 8, 4, 10, 9, 14, 0, 3, 11, 2],
    [4, 11, 10, 0, 7, 2, 1, 13, 3, 6, 8, 5, 9, 12, 15, 14],
    [13, 11, 4, 1, 3, 15, 5, 9, 0, 10, 14, 7, 6, 8, 2, 12],
    [1, 15, 13, 0, 5, 7, 10, 4, 9, 2, 3, 14, 6, 11, 8, 12],
];

pub struct Gost {
    schedule: [u32; 32],
    // Pairs of 4-bit rows folded into byte-wide tables.
    lookup: [[u32; 256]; 4],
}

impl Gost {
    pub fn new(key: &[u8]) -> Self {
        let mut k = [0u32; 8];
        for (i, word) in k.iter_mut().enumerate() {
            *word = u32::from_le_bytes([key[i * 4], key[i * 4 + 1], key[i * 4 + 2], key[i * 4 + 3]]);
        }

        // Decryption order: K[0..7] once, then K[7..0] three times.
        let mut schedule = [0u32; 32];
        schedule[..8].copy_from_slice(&k);
        for rep in 0..3 {
            for i in 0..8 {
                schedule[8 + rep * 8 + i] = k[7 - i];
            }
        }

        let mut lookup = [[0u32; 256]; 4];
        for (half, table) in lookup.iter_mut().enumerate() {
            let low = SBOX[2 * half];
            let high = SBOX[2 * half + 1];
            for (i, entry) in table.iter_mut().enumerate() {
                let lo = low[i & 0x0F] as u32;
                let hi = high[(i >> 4) & 0x0F] as u32;
                *entry = (lo | (hi << 4)) << (8 * half);
            }
        }

        Self { schedule, lookup }
    }

    fn substitute(&self, value: u32) -> u32 {
        self.lookup[0][(value & 0xFF) as usize]
            | self.lookup[1][((value >> 8) & 0xFF) as usize]
            | self.lookup[2][((value >> 16) & 0xFF) as usize]
            | self.lookup[3][((value >> 24) & 0xFF) as usize]
    }
}

impl BlockCipher for Gost {
    fn block_size(&self) -> usize {
        8
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let mut n1 = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut n2 = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);

        for i in 0..31 {
            let rotated = self.substitute(n1.wrapping_add(self.schedule[i])).rotate_left(11);
            let next = n2 ^ rotated;
            n2 = n1;
            n1 = next;
        }

        // Final round keeps halves in place.
        let rotated = self.substitute(n1.wrapping_add(self.schedule[31])).rotate_left(11);
        n2 ^= rotated;

        dst[0..4].copy_from_slice(&n1.to_le_bytes());
        dst[4..8].copy_from_slice(&n2.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_block(c: &Gost, src: &[u8], dst: &mut [u8]) {
        let mut n1 = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut n2 = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
        // Encryption order: K[0..7] three times, then K[7..0].
        let mut schedule = [0u32; 32];
        for rep in 0..3 {
            schedule[rep * 8..rep * 8 + 8].copy_from_slice(&c.schedule[..8]);
        }
        for i in 0..8 {
            schedule[24 + i] = c.schedule[7 - i];
        }
        for i in 0..31 {
            let rotated = c.substitute(n1.wrapping_add(schedule[i])).rotate_left(11);
            let next = n2 ^ rotated;
            n2 = n1;
            n1 = next;
        }
        let rotated = c.substitute(n1.wrapping_add(schedule[31])).rotate_left(11);
        n2 ^= rotated;
        dst[0..4].copy_from_slice(&n1.to_le_bytes());
        dst[4..8].copy_from_slice(&n2.to_le_bytes());
    }

    #[test]
    fn gost_round_trip() {
        let cipher = Gost::new(b"webzen#@!01webzen#@!01webzen#@!0");
        let plain = *b"gostblok";
        let mut enc = [0u8; 8];
        encrypt_block(&cipher, &plain, &mut enc);
        assert_ne!(enc, plain);
        let mut dec = [0u8; 8];
        cipher.decrypt_block(&enc, &mut dec);
        assert_eq!(dec, plain);
    }
}
