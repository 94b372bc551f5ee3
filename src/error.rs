//! Error taxonomy for the render pipeline.
//!
//! `FormatError` aborts a single item (the batch continues); `DecodeError`
//! only degrades that mesh to its average-color fallback. Empty parse or
//! classification results are not errors at all - they produce a fully
//! transparent output image.

use std::path::PathBuf;

/// Container or model data could not be interpreted. Fails the item.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid BMD magic")]
    BadMagic,

    #[error("unsupported BMD version {0}")]
    UnsupportedVersion(u8),

    #[error("truncated BMD container ({0})")]
    Truncated(&'static str),

    #[error("invalid mesh count {0}")]
    InvalidMeshCount(u16),

    /// The modulus scheme selected a stage cipher this crate has no
    /// reference implementation for.
    #[error("unsupported stage cipher selector {0}")]
    UnsupportedCipher(u8),
}

/// A texture file could not be read or decoded. The mesh still renders,
/// shaded with a flat placeholder color.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("texture read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("texture file too short: {path}")]
    TooShort { path: PathBuf },

    #[error("unknown texture extension: {path}")]
    UnknownExtension { path: PathBuf },

    #[error("texture decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}
