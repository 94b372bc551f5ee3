//! IDEA decryption, modulus stage cipher slot 6.
//! 8-byte block, 16-byte key, 8 rounds, arithmetic mod 65537.

use super::BlockCipher;

pub struct Idea {
    dk: [u16; 52],
}

impl Idea {
    pub fn new(key: &[u8]) -> Self {
        Self {
            dk: invert_keys(&expand_key(&key[..16])),
        }
    }
}

impl BlockCipher for Idea {
    fn block_size(&self) -> usize {
        8
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let k = &self.dk;
        let mut x0 = u16::from_be_bytes([src[0], src[1]]);
        let mut x1 = u16::from_be_bytes([src[2], src[3]]);
        let mut x2 = u16::from_be_bytes([src[4], src[5]]);
        let mut x3 = u16::from_be_bytes([src[6], src[7]]);

        let mut p = 0;
        for _ in 0..8 {
            x0 = mul_mod(x0, k[p]);
            x1 = x1.wrapping_add(k[p + 1]);
            x2 = x2.wrapping_add(k[p + 2]);
            x3 = mul_mod(x3, k[p + 3]);

            let t0 = x1;
            let t1 = x2;
            x2 ^= x0;
            x1 ^= x3;

            x2 = mul_mod(x2, k[p + 4]);
            x1 = x1.wrapping_add(x2);
            x1 = mul_mod(x1, k[p + 5]);
            x2 = x2.wrapping_add(x1);

            x0 ^= x1;
            x3 ^= x2;
            x1 ^= t1;
            x2 ^= t0;
            p += 6;
        }

        let o0 = mul_mod(x0, k[p]);
        let o1 = x2.wrapping_add(k[p + 1]);
        let o2 = x1.wrapping_add(k[p + 2]);
        let o3 = mul_mod(x3, k[p + 3]);

        dst[0..2].copy_from_slice(&o0.to_be_bytes());
        dst[2..4].copy_from_slice(&o1.to_be_bytes());
        dst[4..6].copy_from_slice(&o2.to_be_bytes());
        dst[6..8].copy_from_slice(&o3.to_be_bytes());
    }
}

fn expand_key(key: &[u8]) -> [u16; 52] {
    let mut z = [0u16; 52];
    for i in 0..8 {
        z[i] = u16::from_be_bytes([key[i * 2], key[i * 2 + 1]]);
    }
    for i in 8..52 {
        z[i] = match i & 7 {
            6 => (z[i - 7] << 9) | (z[i - 14] >> 7),
            7 => (z[i - 15] << 9) | (z[i - 14] >> 7),
            _ => (z[i - 7] << 9) | (z[i - 6] >> 7),
        };
    }
    z
}

fn invert_keys(enc: &[u16; 52]) -> [u16; 52] {
    let mut dec = [0u16; 52];
    let mut p = 0;
    let mut q = 52;

    let mut push4 = |dec: &mut [u16; 52], q: &mut usize, vals: [u16; 4]| {
        for v in vals {
            *q -= 1;
            dec[*q] = v;
        }
    };

    push4(
        &mut dec,
        &mut q,
        [
            mul_inverse(enc[p + 3]),
            add_inverse(enc[p + 2]),
            add_inverse(enc[p + 1]),
            mul_inverse(enc[p]),
        ],
    );
    p += 4;

    for _ in 1..8 {
        q -= 1;
        dec[q] = enc[p + 1];
        q -= 1;
        dec[q] = enc[p];
        p += 2;

        // Middle rounds swap the two additive inverses.
        push4(
            &mut dec,
            &mut q,
            [
                mul_inverse(enc[p + 3]),
                add_inverse(enc[p + 1]),
                add_inverse(enc[p + 2]),
                mul_inverse(enc[p]),
            ],
        );
        p += 4;
    }

    q -= 1;
    dec[q] = enc[p + 1];
    q -= 1;
    dec[q] = enc[p];
    p += 2;

    push4(
        &mut dec,
        &mut q,
        [
            mul_inverse(enc[p + 3]),
            add_inverse(enc[p + 2]),
            add_inverse(enc[p + 1]),
            mul_inverse(enc[p]),
        ],
    );

    dec
}

/// Multiplication mod 65537 with 0 standing in for 2^16.
fn mul_mod(a: u16, b: u16) -> u16 {
    let ai = if a == 0 { 0x10000u32 } else { a as u32 };
    let bi = if b == 0 { 0x10000u32 } else { b as u32 };
    let r = ai.wrapping_mul(bi) % 0x10001;
    if r == 0x10000 {
        0
    } else {
        r as u16
    }
}

/// Multiplicative inverse mod 65537 via the extended Euclidean algorithm.
fn mul_inverse(x: u16) -> u16 {
    if x <= 1 {
        return x;
    }
    let mut t1 = 0x10001u32 / x as u32;
    let mut y = 0x10001u32 % x as u32;
    if y == 1 {
        return (0x10001 - t1) as u16;
    }
    let mut t0 = 1u32;
    let mut xv = x as u32;
    while y != 1 {
        let q = xv / y;
        xv %= y;
        t0 = (t0 + q * t1) % 0x10001;
        if xv == 1 {
            return t0 as u16;
        }
        let q2 = y / xv;
        y %= xv;
        t1 = (t1 + q2 * t0) % 0x10001;
    }
    (0x10001 - t1) as u16
}

fn add_inverse(x: u16) -> u16 {
    x.wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_block(enc: &[u16; 52], src: &[u8], dst: &mut [u8]) {
        let mut x0 = u16::from_be_bytes([src[0], src[1]]);
        let mut x1 = u16::from_be_bytes([src[2], src[3]]);
        let mut x2 = u16::from_be_bytes([src[4], src[5]]);
        let mut x3 = u16::from_be_bytes([src[6], src[7]]);
        let mut p = 0;
        for _ in 0..8 {
            x0 = mul_mod(x0, enc[p]);
            x1 = x1.wrapping_add(enc[p + 1]);
            x2 = x2.wrapping_add(enc[p + 2]);
            x3 = mul_mod(x3, enc[p + 3]);
            let t0 = x1;
            let t1 = x2;
            x2 ^= x0;
            x1 ^= x3;
            x2 = mul_mod(x2, enc[p + 4]);
            x1 = x1.wrapping_add(x2);
            x1 = mul_mod(x1, enc[p + 5]);
            x2 = x2.wrapping_add(x1);
            x0 ^= x1;
            x3 ^= x2;
            x1 ^= t1;
            x2 ^= t0;
            p += 6;
        }
        let o0 = mul_mod(x0, enc[p]);
        let o1 = x2.wrapping_add(enc[p + 1]);
        let o2 = x1.wrapping_add(enc[p + 2]);
        let o3 = mul_mod(x3, enc[p + 3]);
        dst[0..2].copy_from_slice(&o0.to_be_bytes());
        dst[2..4].copy_from_slice(&o1.to_be_bytes());
        dst[4..6].copy_from_slice(&o2.to_be_bytes());
        dst[6..8].copy_from_slice(&o3.to_be_bytes());
    }

    #[test]
    fn mul_inverse_is_inverse() {
        for x in [1u16, 2, 3, 1000, 0x7FFF, 0xFFFF] {
            assert_eq!(mul_mod(x, mul_inverse(x)), 1, "x = {x}");
        }
    }

    #[test]
    fn idea_round_trip() {
        let key = b"0123456789abcdef";
        let cipher = Idea::new(key);
        let enc_keys = expand_key(key);
        let plain = *b"ideablok";
        let mut enc = [0u8; 8];
        encrypt_block(&enc_keys, &plain, &mut enc);
        assert_ne!(enc, plain);
        let mut dec = [0u8; 8];
        cipher.decrypt_block(&enc, &mut dec);
        assert_eq!(dec, plain);
    }
}
