//! Per-item render overrides.
//!
//! Entries come from a JSON file keyed by `"section_index"`. Every field
//! has a default, so an absent entry (or an empty object) renders with
//! the house style: auto camera, standardization on, a -45 degree
//! display angle and 70% canvas fill.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Which pipeline produced the stored rotation values. Binary-sourced
/// rotations carry in-game camera conventions and get extra correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Binary,
    #[default]
    Custom,
}

/// Camera selection. `Auto` routes on the stored Y rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    #[default]
    Auto,
    Noflip,
    Correction,
    Fallback,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderEntry {
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    pub rot_x: f64,
    pub rot_y: f64,
    pub rot_z: f64,
    pub scale: f64,
    pub source: EntrySource,
    pub camera: CameraMode,
    pub use_bones: Option<bool>,
    pub standardize: bool,
    pub display_angle: f64,
    pub fill_ratio: f64,
    pub flip: bool,
    pub flip_canvas: bool,
    pub mirror_pair: bool,
    pub perspective: bool,
    pub fov: f64,
    pub keep_all_meshes: bool,
    pub additive_textures: Vec<String>,
    pub tint: [f64; 3],
    pub tint_textures: Vec<String>,
}

impl Default for RenderEntry {
    fn default() -> Self {
        Self {
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            scale: 1.0,
            source: EntrySource::default(),
            camera: CameraMode::default(),
            use_bones: None,
            standardize: true,
            display_angle: -45.0,
            fill_ratio: 0.70,
            flip: false,
            flip_canvas: false,
            mirror_pair: false,
            perspective: false,
            fov: 75.0,
            keep_all_meshes: false,
            additive_textures: Vec::new(),
            tint: [0.0; 3],
            tint_textures: Vec::new(),
        }
    }
}

impl RenderEntry {
    /// A tint is active when any channel was set.
    pub fn has_tint(&self) -> bool {
        self.tint.iter().any(|&c| c != 0.0)
    }
}

/// `(section, index)` item key.
pub type EntryKey = (u32, u32);

/// Loads the override table. Keys are `"section_index"` strings.
pub fn load_entries(path: &Path) -> Result<HashMap<EntryKey, RenderEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read entries {}", path.display()))?;
    let raw: HashMap<String, RenderEntry> = serde_json::from_str(&text)
        .with_context(|| format!("parse entries {}", path.display()))?;

    let mut entries = HashMap::with_capacity(raw.len());
    for (key, entry) in raw {
        let parsed = key
            .split_once('_')
            .and_then(|(s, i)| Some((s.parse::<u32>().ok()?, i.parse::<u32>().ok()?)));
        match parsed {
            Some(k) => {
                entries.insert(k, entry);
            }
            None => anyhow::bail!("invalid entry key {key:?} in {}", path.display()),
        }
    }
    Ok(entries)
}
