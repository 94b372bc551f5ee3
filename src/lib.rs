//! Batch renderer for encrypted BMD item models.
//!
//! The pipeline: decrypt the container ([`crypto`]), parse meshes and
//! bones ([`model`]), pose with the bind skeleton ([`skeleton`]), pick a
//! view and project ([`camera`]), rasterize in blend passes ([`render`],
//! [`raster`]) with textures from [`texture`], then align, crop and
//! center the icon ([`standardize`]). [`batch`] drives the whole catalog
//! in parallel.

pub mod batch;
pub mod camera;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod model;
pub mod raster;
pub mod render;
pub mod skeleton;
pub mod standardize;
pub mod texture;

pub use error::{DecodeError, FormatError};
