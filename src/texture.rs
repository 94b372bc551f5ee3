//! Texture resolution: directory index, container decoding and a
//! thread-safe decode cache.
//!
//! Textures live in wrapper containers next to the model files: `.ozj`
//! is a 24-byte header followed by JPEG data, `.ozt` a 4-byte header
//! followed by TGA data (the variant that carries alpha).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use image::RgbaImage;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::DecodeError;

const OZJ_HEADER: usize = 24;
const OZT_HEADER: usize = 4;

/// Resolves a texture name recorded in a model to a decoded image.
pub trait TextureResolver: Sync {
    fn resolve(&self, tex_name: &str) -> Option<Arc<RgbaImage>>;
}

/// Resolver that never finds anything. Meshes fall back to their average
/// placeholder color.
pub struct NullResolver;

impl TextureResolver for NullResolver {
    fn resolve(&self, _tex_name: &str) -> Option<Arc<RgbaImage>> {
        None
    }
}

/// Lowercased stem of a possibly backslash-separated texture path.
pub(crate) fn path_stem(name: &str) -> String {
    let name = name.replace('\\', "/");
    let base = name.rsplit('/').next().unwrap_or(&name);
    let stem = base.rsplit_once('.').map_or(base, |(s, _)| s);
    stem.to_ascii_lowercase()
}

/// Maps lowercase texture stems to container paths. For duplicate stems
/// the TGA-bearing `.ozt` wins over `.ozj`.
pub struct TextureIndex {
    entries: HashMap<String, PathBuf>,
}

impl TextureIndex {
    /// Scans `item_dir/texture/` plus any `<sub>/texture/` directory one
    /// level down (case-insensitive directory name).
    pub fn build(item_dir: &Path) -> Self {
        let mut search_dirs = vec![item_dir.join("texture")];
        if let Ok(entries) = fs::read_dir(item_dir) {
            for entry in entries.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                for name in ["Texture", "texture"] {
                    let sub = entry.path().join(name);
                    if sub.is_dir() {
                        search_dirs.push(sub);
                        break;
                    }
                }
            }
        }

        let mut entries: HashMap<String, PathBuf> = HashMap::new();
        for dir in search_dirs {
            for file in WalkDir::new(&dir).into_iter().flatten() {
                if !file.file_type().is_file() {
                    continue;
                }
                let path = file.path();
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase())
                    .unwrap_or_default();
                if ext != "ozj" && ext != "ozt" {
                    continue;
                }
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_ascii_lowercase())
                    .unwrap_or_default();
                match entries.get(&stem) {
                    None => {
                        entries.insert(stem, path.to_path_buf());
                    }
                    Some(existing) => {
                        let existing_ozj = existing
                            .extension()
                            .is_some_and(|e| e.eq_ignore_ascii_case("ozj"));
                        if ext == "ozt" && existing_ozj {
                            entries.insert(stem, path.to_path_buf());
                        }
                    }
                }
            }
        }
        debug!(count = entries.len(), "texture index built");
        Self { entries }
    }

    pub fn resolve_path(&self, tex_name: &str) -> Option<&Path> {
        self.entries.get(&path_stem(tex_name)).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads and decodes an `.ozj` or `.ozt` container into RGBA.
pub fn load_texture(path: &Path) -> Result<RgbaImage, DecodeError> {
    let raw = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let (header, format) = match ext.as_str() {
        "ozj" => (OZJ_HEADER, image::ImageFormat::Jpeg),
        "ozt" => (OZT_HEADER, image::ImageFormat::Tga),
        _ => {
            return Err(DecodeError::UnknownExtension {
                path: path.to_path_buf(),
            })
        }
    };
    if raw.len() <= header {
        return Err(DecodeError::TooShort {
            path: path.to_path_buf(),
        });
    }

    let img = image::load_from_memory_with_format(&raw[header..], format).map_err(|source| {
        DecodeError::Decode {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(img.to_rgba8())
}

/// Thread-safe texture cache over an index. Failed loads are cached as
/// misses so broken files are not re-read per mesh.
pub struct TextureCache {
    index: TextureIndex,
    items: RwLock<HashMap<PathBuf, Option<Arc<RgbaImage>>>>,
}

impl TextureCache {
    pub fn new(index: TextureIndex) -> Self {
        Self {
            index,
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl TextureResolver for TextureCache {
    fn resolve(&self, tex_name: &str) -> Option<Arc<RgbaImage>> {
        let path = self.index.resolve_path(tex_name)?.to_path_buf();

        if let Ok(items) = self.items.read() {
            if let Some(entry) = items.get(&path) {
                return entry.clone();
            }
        }

        // Decode outside the lock; a racing thread may do the same work,
        // the first insert wins.
        let img = match load_texture(&path) {
            Ok(img) => Some(Arc::new(img)),
            Err(err) => {
                debug!(%err, "texture load failed");
                None
            }
        };

        let mut items = self.items.write().ok()?;
        items.entry(path).or_insert(img).clone()
    }
}
