//! CAST5 decryption, modulus stage cipher slot 2, backed by the
//! RustCrypto implementation.

use cast5::cipher::{Block, BlockDecrypt, Key, KeyInit};
use cast5::Cast5;

use super::BlockCipher;

pub struct Cast5Cipher {
    inner: Cast5,
}

impl Cast5Cipher {
    pub fn new(key: &[u8]) -> Self {
        Self {
            inner: Cast5::new(Key::<Cast5>::from_slice(&key[..16])),
        }
    }
}

impl BlockCipher for Cast5Cipher {
    fn block_size(&self) -> usize {
        8
    }

    fn decrypt_block(&self, src: &[u8], dst: &mut [u8]) {
        let mut block = Block::<Cast5>::clone_from_slice(src);
        self.inner.decrypt_block(&mut block);
        dst[..8].copy_from_slice(&block);
    }
}
