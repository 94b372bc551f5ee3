//! Batch rendering across the whole item catalog.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::ItemDef;
use crate::crypto::decrypt_container;
use crate::entry::{EntryKey, RenderEntry};
use crate::model::parse_model;
use crate::render::render_model;
use crate::standardize;
use crate::texture::TextureResolver;

/// Shared state for one batch run.
pub struct BatchContext<'a> {
    pub item_dir: &'a Path,
    pub output_dir: &'a Path,
    pub textures: &'a dyn TextureResolver,
    pub entries: &'a std::collections::HashMap<EntryKey, RenderEntry>,
    pub render_size: usize,
    pub supersample: usize,
}

/// Outcome of one item. A failed item carries the error text; the batch
/// keeps going.
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub section: u32,
    pub index: u32,
    pub name: String,
    pub error: Option<String>,
}

impl ItemResult {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Renders every catalog item in parallel. Results come back in catalog
/// order regardless of scheduling.
pub fn run(ctx: &BatchContext<'_>, items: &[ItemDef]) -> Vec<ItemResult> {
    let start = Instant::now();
    let done = AtomicUsize::new(0);
    let total = items.len();

    let results: Vec<ItemResult> = items
        .par_iter()
        .map(|item| {
            let result = process_item(ctx, item);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % 100 == 0 || n == total {
                let rate = n as f64 / start.elapsed().as_secs_f64().max(1e-6);
                info!(done = n, total, rate = format!("{rate:.1}/s"), "progress");
            }
            result
        })
        .collect();

    let failed = results.iter().filter(|r| !r.ok()).count();
    info!(
        rendered = total - failed,
        failed,
        elapsed = format!("{:.1}s", start.elapsed().as_secs_f64()),
        "batch finished"
    );
    results
}

fn process_item(ctx: &BatchContext<'_>, item: &ItemDef) -> ItemResult {
    let mut result = ItemResult {
        section: item.section,
        index: item.index,
        name: item.name.clone(),
        error: None,
    };
    if let Err(err) = render_item(ctx, item) {
        warn!(
            section = item.section,
            index = item.index,
            name = %item.name,
            error = %format!("{err:#}"),
            "item failed"
        );
        result.error = Some(format!("{err:#}"));
    }
    result
}

fn render_item(ctx: &BatchContext<'_>, item: &ItemDef) -> Result<()> {
    let model_path = ctx.item_dir.join(&item.model);
    let raw = fs::read(&model_path)
        .with_context(|| format!("read model {}", model_path.display()))?;
    let payload = decrypt_container(&raw)
        .with_context(|| format!("decrypt {}", model_path.display()))?;
    let (meshes, bones) = parse_model(&payload)
        .with_context(|| format!("parse {}", model_path.display()))?;

    debug!(
        model = %item.model,
        meshes = meshes.len(),
        bones = bones.len(),
        "parsed model"
    );

    let entry = ctx.entries.get(&(item.section, item.index));
    let mut img = render_model(
        meshes,
        &bones,
        entry,
        ctx.textures,
        ctx.render_size,
        ctx.supersample,
    );

    if ctx.supersample > 1 {
        img = standardize::downsample(img, ctx.render_size as u32);
    }
    img = standardize::remove_small_clusters(img, 0.02);

    let fallback = RenderEntry::default();
    let e = entry.unwrap_or(&fallback);
    let size = ctx.render_size as u32;
    img = if e.mirror_pair {
        standardize::mirror_pair(img, size, e.fill_ratio)
    } else if e.standardize {
        standardize::standardize(img, size, e.display_angle, e.fill_ratio, e.flip)
    } else {
        standardize::crop_and_center(img, size, e.fill_ratio)
    };
    if e.flip_canvas {
        img = image::imageops::flip_horizontal(&img);
    }

    let out_path = output_path(ctx.output_dir, item);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    img.save(&out_path)
        .with_context(|| format!("write {}", out_path.display()))?;
    Ok(())
}

fn output_path(output_dir: &Path, item: &ItemDef) -> PathBuf {
    output_dir
        .join(item.section.to_string())
        .join(format!("{}.png", item.index))
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    section: u32,
    section_name: &'a str,
    index: u32,
    name: &'a str,
    model: &'a str,
    image: String,
}

/// Writes `manifest.json` describing every catalog item and its image.
pub fn write_manifest(path: &Path, items: &[ItemDef]) -> Result<()> {
    let entries: Vec<ManifestEntry<'_>> = items
        .iter()
        .map(|it| ManifestEntry {
            section: it.section,
            section_name: &it.section_name,
            index: it.index,
            name: &it.name,
            model: &it.model,
            image: format!("{}/{}.png", it.section, it.index),
        })
        .collect();
    let data = serde_json::to_vec_pretty(&entries).context("encode manifest")?;
    fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
