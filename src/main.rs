//! bmd-render - batch renderer for encrypted BMD item models.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bmd_render::batch::{self, BatchContext};
use bmd_render::catalog::load_catalog;
use bmd_render::config::{Config, Overrides};
use bmd_render::crypto::{container_version, decrypt_container};
use bmd_render::entry::load_entries;
use bmd_render::model::parse_model;
use bmd_render::texture::{TextureCache, TextureIndex};

#[derive(Parser)]
#[command(name = "bmd-render")]
#[command(about = "Batch renderer for encrypted BMD item models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the item catalog to standardized icons
    Render {
        /// Path to config.json
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Item directory holding models and textures
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Item catalog JSON
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Per-item render override JSON
        #[arg(long)]
        entries: Option<PathBuf>,

        /// Render only items from this section
        #[arg(long)]
        section: Option<u32>,

        /// Render only the item with this index (requires --section)
        #[arg(long, requires = "section")]
        index: Option<u32>,

        /// Render only the first N items
        #[arg(long, value_name = "N")]
        test: Option<usize>,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Canvas size in pixels
        #[arg(long)]
        size: Option<usize>,
    },

    /// Decrypt and parse one model, printing mesh and bone stats
    Inspect {
        /// Path to a .bmd file
        model: PathBuf,
    },

    /// Write the decrypted payload of one model to a file
    Decrypt {
        /// Path to a .bmd file
        model: PathBuf,

        /// Output path (default: input with .bin extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            config,
            data,
            output,
            catalog,
            entries,
            section,
            index,
            test,
            workers,
            size,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            };
            cfg.resolve(Overrides {
                item_dir: data,
                catalog,
                entries,
                output_dir: output,
                render_size: size,
                workers,
            })?;
            cmd_render(cfg, section, index, test)
        }
        Commands::Inspect { model } => cmd_inspect(&model),
        Commands::Decrypt { model, output } => cmd_decrypt(&model, output),
    }
}

fn cmd_render(
    cfg: Config,
    section: Option<u32>,
    index: Option<u32>,
    test: Option<usize>,
) -> Result<()> {
    let mut items = load_catalog(&cfg.catalog)?;
    if let Some(section) = section {
        items.retain(|it| it.section == section && index.map_or(true, |i| it.index == i));
    }
    if let Some(n) = test {
        items.truncate(n);
    }
    if items.is_empty() {
        info!("no items to render");
        return Ok(());
    }

    let entries = match &cfg.entries {
        Some(path) => load_entries(path)?,
        None => HashMap::new(),
    };

    let index = TextureIndex::build(&cfg.item_dir);
    info!(textures = index.len(), entries = entries.len(), items = items.len(), "starting batch");
    let cache = TextureCache::new(index);

    rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.workers)
        .build_global()
        .context("build worker pool")?;

    let ctx = BatchContext {
        item_dir: &cfg.item_dir,
        output_dir: &cfg.output_dir,
        textures: &cache,
        entries: &entries,
        render_size: cfg.render_size,
        supersample: cfg.supersample,
    };
    let results = batch::run(&ctx, &items);

    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("create {}", cfg.output_dir.display()))?;
    batch::write_manifest(&cfg.output_dir.join("manifest.json"), &items)?;

    let failed: Vec<_> = results.iter().filter(|r| !r.ok()).collect();
    if !failed.is_empty() {
        for r in failed.iter().take(20) {
            eprintln!("  {}: {}", r.name, r.error.as_deref().unwrap_or(""));
        }
        anyhow::bail!("{} of {} items failed", failed.len(), results.len());
    }
    Ok(())
}

fn cmd_inspect(model: &Path) -> Result<()> {
    let raw = fs::read(model).with_context(|| format!("read {}", model.display()))?;
    let version = container_version(&raw)?;
    let payload = decrypt_container(&raw)?;
    let (meshes, bones) = parse_model(&payload)?;

    println!("{}: version {}, {} bytes decrypted", model.display(), version, payload.len());
    println!("meshes: {}", meshes.len());
    for (i, m) in meshes.iter().enumerate() {
        println!(
            "  [{i}] {} verts, {} normals, {} uvs, {} tris, texture {:?}",
            m.verts.len(),
            m.normals.len(),
            m.uvs.len(),
            m.tris.len(),
            m.tex_path
        );
    }
    println!("bones: {}", bones.len());
    for (i, b) in bones.iter().enumerate() {
        if b.is_dummy {
            println!("  [{i}] dummy");
        } else {
            println!("  [{i}] parent {}", b.parent);
        }
    }
    Ok(())
}

fn cmd_decrypt(model: &Path, output: Option<PathBuf>) -> Result<()> {
    let raw = fs::read(model).with_context(|| format!("read {}", model.display()))?;
    let payload = decrypt_container(&raw)?;
    let out = output.unwrap_or_else(|| model.with_extension("bin"));
    fs::write(&out, &payload).with_context(|| format!("write {}", out.display()))?;
    println!("{} -> {} ({} bytes)", model.display(), out.display(), payload.len());
    Ok(())
}
