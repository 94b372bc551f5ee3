//! Two-stage decryption for version 14 containers.
//!
//! The first two bytes of the payload select a stage cipher each (by an
//! index into a fixed table of 8). Stage 1 partially decrypts the buffer
//! with a hard-coded key to recover the embedded 32-byte key at bytes
//! 2..34, and stage 2 decrypts the remaining payload with that key.

use crate::error::FormatError;

use super::cast5::Cast5Cipher;
use super::gost::Gost;
use super::idea::Idea;
use super::keys::MODULUS_STAGE1_KEY;
use super::rc5::Rc5;
use super::rc6::Rc6;
use super::tea::Tea;
use super::threeway::ThreeWay;
use super::BlockCipher;

/// Selects a stage cipher by index. Slot 5 (MARS) has no reference
/// implementation and is rejected.
fn stage_cipher(selector: u8, key: &[u8]) -> Result<Box<dyn BlockCipher>, FormatError> {
    Ok(match selector & 7 {
        0 => Box::new(Tea::new(key)),
        1 => Box::new(ThreeWay::new(key)),
        2 => Box::new(Cast5Cipher::new(key)),
        3 => Box::new(Rc5::new(key)),
        4 => Box::new(Rc6::new(key)),
        6 => Box::new(Idea::new(key)),
        7 => Box::new(Gost::new(key)),
        _ => return Err(FormatError::UnsupportedCipher(selector & 7)),
    })
}

fn decrypt_blocks(cipher: &dyn BlockCipher, data: &mut [u8]) {
    let bs = cipher.block_size();
    let mut tmp = vec![0u8; bs];
    let mut i = 0;
    while i + bs <= data.len() {
        cipher.decrypt_block(&data[i..i + bs], &mut tmp);
        data[i..i + bs].copy_from_slice(&tmp);
        i += bs;
    }
}

/// Decrypts a version 14 payload. Buffers shorter than the 34-byte crypto
/// header pass through unchanged.
pub fn decrypt_modulus(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    if data.len() < 34 {
        return Ok(data.to_vec());
    }

    let mut buf = data.to_vec();
    let stage1_selector = buf[1];
    let stage2_selector = buf[0];
    let size = buf.len();
    let data_size = size - 34;

    // Stage 1: partial decryption recovers the embedded key.
    let cipher1 = stage_cipher(stage1_selector, &MODULUS_STAGE1_KEY)?;
    let block = 1024 - (1024 % cipher1.block_size());

    if data_size > 4 * block {
        let index = 2 + (data_size >> 1);
        decrypt_blocks(cipher1.as_ref(), &mut buf[index..index + block]);
    }
    if data_size > block {
        let index = size - block;
        decrypt_blocks(cipher1.as_ref(), &mut buf[index..index + block]);
        decrypt_blocks(cipher1.as_ref(), &mut buf[2..2 + block]);
    }

    let mut key2 = [0u8; 32];
    key2.copy_from_slice(&buf[2..34]);

    // Stage 2: decrypt the payload with the recovered key.
    let cipher2 = stage_cipher(stage2_selector, &key2)?;
    let decrypt_size = data_size - (data_size % cipher2.block_size());
    if decrypt_size > 0 {
        decrypt_blocks(cipher2.as_ref(), &mut buf[34..34 + decrypt_size]);
    }

    Ok(buf.split_off(34))
}
