//! Fixed key material for the BMD container ciphers.

/// Chained-XOR key (version 12 containers).
pub const XOR_KEY: [u8; 16] = [
    0xD1, 0x73, 0x52, 0xF6, 0xD2, 0x9A, 0xCB, 0x27, 0x3E, 0xAF, 0x59, 0x31, 0x37, 0xB3, 0xE7, 0xA2,
];

/// Initial chain byte for the XOR scheme.
pub const XOR_CHAIN_INIT: u8 = 0x5E;

/// Per-byte increment folded into the XOR chain.
pub const XOR_CHAIN_STEP: u8 = 0x3D;

/// 3-byte repeating XOR key used by camera override sidecar files.
pub const TRS_XOR_KEY: [u8; 3] = [0xFC, 0xCF, 0xAB];

/// LEA-256 key (version 15 containers).
pub const LEA_KEY: [u8; 32] = [
    0xCC, 0x50, 0x45, 0x13, 0xC2, 0xA6, 0x57, 0x4E, 0xD6, 0x9A, 0x45, 0x89, 0xBF, 0x2F, 0xBC, 0xD9,
    0x39, 0xB3, 0xB3, 0xBD, 0x50, 0xBD, 0xCC, 0xB6, 0x85, 0x46, 0xD1, 0xD6, 0x16, 0x54, 0xE0, 0x87,
];

/// Key-schedule deltas for LEA-256.
pub const LEA_DELTA: [u32; 8] = [
    0xC3EF_E9DB,
    0x4462_6B02,
    0x79E2_7C8A,
    0x78DF_30EC,
    0x715E_A49E,
    0xC785_DA0A,
    0xE04E_F22A,
    0xE5C4_0957,
];

/// Stage-1 key for the two-stage modulus scheme (version 14 containers).
pub const MODULUS_STAGE1_KEY: [u8; 32] = *b"webzen#@!01webzen#@!01webzen#@!0";
