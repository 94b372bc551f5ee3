//! 3-Way block cipher decryption, modulus stage cipher slot 1.
//! 12-byte block, 12-byte key, 11 rounds.

use super::BlockCipher;

const ROUNDS: usize = 11;
const START_D: u32 = 0xB1B1;

pub struct ThreeWay {
    k: [u32; 3],
}

impl ThreeWay {
    pub fn new(key: &[u8]) -> Self {
        let mut k = [0u32; 3];
        for (i, word) in k.iter_mut().enumerate() {
            *word = u32::from_be_bytes([key[4 * i], key[4 * i + 1], key[4 * i + 2], key[4 * i + 3]]);
        }
        let (a0, a1, a2) = mu(theta(k[0], k[1], k[2]));
        Self {
            k: [a0.swap_bytes(), a1.swap_bytes(), a2.swap_bytes()],
        }
    }
}

impl BlockCipher for ThreeWay {
    fn block_size(&self) -> usize {
        12
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let mut a0 = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut a1 = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
        let mut a2 = u32::from_le_bytes([src[8], src[9], src[10], src[11]]);

        let mut rc = START_D;
        (a0, a1, a2) = mu((a0, a1, a2));

        for _ in 0..ROUNDS {
            a0 ^= self.k[0] ^ (rc << 16);
            a1 ^= self.k[1];
            a2 ^= self.k[2] ^ rc;
            (a0, a1, a2) = rho(a0, a1, a2);
            rc <<= 1;
            if rc & 0x10000 != 0 {
                rc ^= 0x11011;
            }
            rc &= 0xFFFF;
        }

        a0 ^= self.k[0] ^ (rc << 16);
        a1 ^= self.k[1];
        a2 ^= self.k[2] ^ rc;
        (a0, a1, a2) = mu(theta(a0, a1, a2));

        dst[0..4].copy_from_slice(&a0.to_le_bytes());
        dst[4..8].copy_from_slice(&a1.to_le_bytes());
        dst[8..12].copy_from_slice(&a2.to_le_bytes());
    }
}

fn reverse_bits_in_bytes(mut a: u32) -> u32 {
    a = ((a & 0xAAAA_AAAA) >> 1) | ((a & 0x5555_5555) << 1);
    a = ((a & 0xCCCC_CCCC) >> 2) | ((a & 0x3333_3333) << 2);
    ((a & 0xF0F0_F0F0) >> 4) | ((a & 0x0F0F_0F0F) << 4)
}

fn theta(a0: u32, a1: u32, a2: u32) -> (u32, u32, u32) {
    let c0 = a0 ^ a1 ^ a2;
    let c = c0.rotate_left(16) ^ c0.rotate_left(8);
    let b0 = (a0 << 24) ^ (a2 >> 8) ^ (a1 << 8) ^ (a0 >> 24);
    let b1 = (a1 << 24) ^ (a0 >> 8) ^ (a2 << 8) ^ (a1 >> 24);
    (a0 ^ c ^ b0, a1 ^ c ^ b1, a2 ^ c ^ ((b0 >> 16) ^ (b1 << 16)))
}

fn mu((a0, a1, a2): (u32, u32, u32)) -> (u32, u32, u32) {
    (
        reverse_bits_in_bytes(a2),
        reverse_bits_in_bytes(a1),
        reverse_bits_in_bytes(a0),
    )
}

fn pi_gamma_pi(a0: u32, a1: u32, a2: u32) -> (u32, u32, u32) {
    let b2 = a2.rotate_left(1);
    let b0 = a0.rotate_left(22);
    let r0 = (b0 ^ (a1 | !b2)).rotate_left(1);
    let r2 = (b2 ^ (b0 | !a1)).rotate_left(22);
    let r1 = a1 ^ (b2 | !b0);
    (r0, r1, r2)
}

fn rho(a0: u32, a1: u32, a2: u32) -> (u32, u32, u32) {
    let (a0, a1, a2) = theta(a0, a1, a2);
    pi_gamma_pi(a0, a1, a2)
}
