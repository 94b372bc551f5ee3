//! Run configuration: a JSON file plus CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings for a batch run. Unset fields in the file keep defaults;
/// CLI flags override both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the encrypted model files and their textures.
    pub item_dir: PathBuf,
    /// Item catalog JSON.
    pub catalog: PathBuf,
    /// Per-item render override JSON, optional.
    pub entries: Option<PathBuf>,
    pub output_dir: PathBuf,

    pub render_size: usize,
    pub supersample: usize,
    /// Worker thread count; 0 picks one per CPU.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_dir: PathBuf::new(),
            catalog: PathBuf::new(),
            entries: None,
            output_dir: PathBuf::new(),
            render_size: 256,
            supersample: 2,
            workers: 0,
        }
    }
}

/// CLI flag values that take priority over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub item_dir: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub entries: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub render_size: Option<usize>,
    pub workers: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Applies CLI overrides and fills path defaults relative to the
    /// item directory.
    pub fn resolve(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(v) = overrides.item_dir {
            self.item_dir = v;
        }
        if let Some(v) = overrides.catalog {
            self.catalog = v;
        }
        if let Some(v) = overrides.entries {
            self.entries = Some(v);
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.render_size {
            self.render_size = v;
        }
        if let Some(v) = overrides.workers {
            self.workers = v;
        }

        if self.item_dir.as_os_str().is_empty() {
            anyhow::bail!("no item directory configured (set item_dir or pass --data)");
        }
        if self.catalog.as_os_str().is_empty() {
            self.catalog = self.item_dir.join("items.json");
        }
        if self.entries.is_none() {
            let candidate = self.item_dir.join("entries.json");
            if candidate.exists() {
                self.entries = Some(candidate);
            }
        }
        if self.output_dir.as_os_str().is_empty() {
            self.output_dir = self.item_dir.join("renders");
        }
        if self.render_size == 0 {
            self.render_size = 256;
        }
        if self.supersample == 0 {
            self.supersample = 2;
        }
        Ok(())
    }
}
