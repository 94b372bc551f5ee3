//! End-to-end pipeline tests over synthetic model files on disk.

use std::collections::HashMap;
use std::fs;

use bmd_render::batch::{self, BatchContext};
use bmd_render::catalog::ItemDef;
use bmd_render::crypto::decrypt_container;
use bmd_render::entry::{load_entries, RenderEntry};
use bmd_render::model::parse_model;
use bmd_render::texture::{TextureCache, TextureIndex};

/// A plaintext container holding one quad mesh in the model x-z plane.
fn quad_model_file() -> Vec<u8> {
    let mut d = Vec::new();
    d.extend_from_slice(b"BMD");
    d.push(10);

    d.extend_from_slice(b"quad");
    d.resize(4 + 32, 0); // name field
    d.extend_from_slice(&1u16.to_le_bytes()); // meshes
    d.extend_from_slice(&0u16.to_le_bytes()); // bones
    d.extend_from_slice(&0u16.to_le_bytes()); // actions

    // Mesh header: nv, nn, ntc, nt, texture index.
    for c in [4i16, 1, 4, 1, 0] {
        d.extend_from_slice(&c.to_le_bytes());
    }
    let verts = [
        [0.0f32, 0.0, 0.0],
        [10.0, 0.0, 0.0],
        [10.0, 0.0, 10.0],
        [0.0, 0.0, 10.0],
    ];
    for v in verts {
        d.extend_from_slice(&0i16.to_le_bytes()); // node
        d.extend_from_slice(&0i16.to_le_bytes());
        for f in v {
            d.extend_from_slice(&f.to_le_bytes());
        }
    }
    // One normal record.
    d.extend_from_slice(&0i16.to_le_bytes());
    d.extend_from_slice(&0i16.to_le_bytes());
    for f in [0.0f32, 1.0, 0.0] {
        d.extend_from_slice(&f.to_le_bytes());
    }
    d.extend_from_slice(&0i16.to_le_bytes());
    d.extend_from_slice(&0i16.to_le_bytes());
    // Texcoords.
    for uv in [[0.0f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
        for f in uv {
            d.extend_from_slice(&f.to_le_bytes());
        }
    }
    // One quad record.
    let mut tri = [0u8; 64];
    tri[0] = 4;
    for k in 0..4u16 {
        tri[2 + k as usize * 2..4 + k as usize * 2].copy_from_slice(&k.to_le_bytes());
        tri[18 + k as usize * 2..20 + k as usize * 2].copy_from_slice(&k.to_le_bytes());
    }
    d.extend_from_slice(&tri);
    // Texture path.
    let mut tex = [0u8; 32];
    tex[..8].copy_from_slice(b"quad.jpg");
    d.extend_from_slice(&tex);

    d
}

#[test]
fn decrypts_and_parses_quad_container() {
    let file = quad_model_file();
    let payload = decrypt_container(&file).unwrap();
    let (meshes, bones) = parse_model(&payload).unwrap();
    assert_eq!(meshes.len(), 1);
    assert!(bones.is_empty());
    assert_eq!(meshes[0].verts.len(), 4);
    assert_eq!(meshes[0].tris[0].polygon, 4);
    assert_eq!(meshes[0].tex_path, "quad.jpg");
}

#[test]
fn batch_renders_quad_to_png() {
    let data_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    fs::write(data_dir.path().join("quad.bmd"), quad_model_file()).unwrap();

    // Skip PCA alignment so the output shape is predictable.
    let entries_path = data_dir.path().join("entries.json");
    fs::write(&entries_path, r#"{"0_1": {"standardize": false, "fill_ratio": 0.5}}"#).unwrap();
    let entries = load_entries(&entries_path).unwrap();

    let cache = TextureCache::new(TextureIndex::build(data_dir.path()));
    let ctx = BatchContext {
        item_dir: data_dir.path(),
        output_dir: out_dir.path(),
        textures: &cache,
        entries: &entries,
        render_size: 64,
        supersample: 2,
    };
    let items = vec![ItemDef {
        section: 0,
        section_name: "Test".into(),
        index: 1,
        name: "Quad".into(),
        model: "quad.bmd".into(),
    }];

    let results = batch::run(&ctx, &items);
    assert_eq!(results.len(), 1);
    assert!(results[0].ok(), "{:?}", results[0].error);

    let img = image::open(out_dir.path().join("0").join("1.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (64, 64));
    // A face-on quad cropped then fit to half the canvas: opaque at the
    // center, transparent near the border.
    assert_eq!(img.get_pixel(32, 32)[3], 255);
    assert_eq!(img.get_pixel(4, 4)[3], 0);
    assert_eq!(img.get_pixel(60, 60)[3], 0);

    // Coverage is close to the fitted square (32x32 pixels).
    let opaque = img.pixels().filter(|p| p[3] > 0).count() as f64;
    assert!((opaque - 1024.0).abs() / 1024.0 < 0.1, "coverage {opaque}");
}

#[test]
fn batch_mixes_failures_with_successes() {
    let data_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    fs::write(data_dir.path().join("quad.bmd"), quad_model_file()).unwrap();
    // Bad magic fails the item without failing the batch.
    fs::write(data_dir.path().join("bad.bmd"), b"XXXX____").unwrap();

    let cache = TextureCache::new(TextureIndex::build(data_dir.path()));
    let entries: HashMap<_, RenderEntry> = HashMap::new();
    let ctx = BatchContext {
        item_dir: data_dir.path(),
        output_dir: out_dir.path(),
        textures: &cache,
        entries: &entries,
        render_size: 32,
        supersample: 1,
    };
    let items = vec![
        ItemDef {
            section: 0,
            section_name: String::new(),
            index: 1,
            name: "Bad".into(),
            model: "bad.bmd".into(),
        },
        ItemDef {
            section: 0,
            section_name: String::new(),
            index: 2,
            name: "Quad".into(),
            model: "quad.bmd".into(),
        },
    ];

    let results = batch::run(&ctx, &items);
    assert!(!results[0].ok());
    assert!(results[1].ok(), "{:?}", results[1].error);
    assert!(out_dir.path().join("0").join("2.png").exists());
    assert!(!out_dir.path().join("0").join("1.png").exists());

    batch::write_manifest(&out_dir.path().join("manifest.json"), &items).unwrap();
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.path().join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest.as_array().unwrap().len(), 2);
}
