//! Mesh classification heuristics.
//!
//! Rendering an item in isolation loses two things the game supplies: the
//! character body underneath equipment, and blend state driven by game
//! logic. This module reconstructs both from texture names, texture
//! contents and geometry shape. The rules are behind a trait so they can
//! be swapped out without touching the render pipeline.

use crate::entry::RenderEntry;
use crate::model::{Mesh, Triangle};
use crate::texture::{path_stem, TextureResolver};

/// Blend class assigned to a mesh before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshClass {
    Opaque,
    Alpha,
    Additive,
    /// Rendered into a separate buffer and composited under the rest.
    BackgroundAdditive,
}

/// Pluggable mesh heuristics: which meshes to drop, and how the kept
/// ones blend.
pub trait MeshClassifier: Sync {
    /// Removes overlay, effect and body meshes prior to rendering.
    fn filter(
        &self,
        meshes: Vec<Mesh>,
        entry: Option<&RenderEntry>,
        textures: &dyn TextureResolver,
    ) -> Vec<Mesh>;

    /// Assigns a blend class to each mesh, parallel to the input slice.
    fn classify(
        &self,
        meshes: &[Mesh],
        entry: Option<&RenderEntry>,
        textures: &dyn TextureResolver,
    ) -> Vec<MeshClass>;
}

/// The default texture-name and geometry heuristics.
pub struct HeuristicClassifier;

impl MeshClassifier for HeuristicClassifier {
    fn filter(
        &self,
        mut meshes: Vec<Mesh>,
        entry: Option<&RenderEntry>,
        textures: &dyn TextureResolver,
    ) -> Vec<Mesh> {
        let keep_all = entry.is_some_and(|e| e.keep_all_meshes);
        if !keep_all {
            let non_effect: Vec<Mesh> = meshes
                .iter()
                .filter(|m| !is_effect_mesh(m) && !is_body_mesh(m))
                .cloned()
                .collect();
            if !non_effect.is_empty() {
                meshes = non_effect;
            }
            if meshes.len() > 1 {
                meshes = filter_glow_layers(meshes, textures);
            }
        }
        meshes
    }

    fn classify(
        &self,
        meshes: &[Mesh],
        entry: Option<&RenderEntry>,
        textures: &dyn TextureResolver,
    ) -> Vec<MeshClass> {
        let mut classes: Vec<MeshClass> = meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                if is_force_additive(&mesh.tex_path, entry) {
                    return MeshClass::BackgroundAdditive;
                }
                // A single-mesh model cannot be an overlay on nothing,
                // and a mesh with an additive counterpart is the base
                // layer rather than the glow.
                let billboard = meshes.len() > 1
                    && is_billboard_jpeg(mesh)
                    && !has_additive_counterpart(meshes, i);
                if is_additive_texture(&mesh.tex_path)
                    || billboard
                    || is_duplicate_geometry_overlay(meshes, i)
                    || is_tga_paired_glow_jpeg(meshes, i, textures)
                {
                    MeshClass::Additive
                } else if is_alpha_overlay(meshes, i, textures, entry) {
                    MeshClass::Alpha
                } else {
                    MeshClass::Opaque
                }
            })
            .collect();

        // Without any opaque mesh everything would blend onto an empty
        // canvas; promote the first additive (or alpha) mesh.
        if !classes.iter().any(|&c| c == MeshClass::Opaque) {
            if let Some(first) = classes
                .iter_mut()
                .find(|c| matches!(c, MeshClass::Additive | MeshClass::Alpha))
            {
                *first = MeshClass::Opaque;
            }
        }
        classes
    }
}

fn is_jpeg_ext(ext: &str) -> bool {
    ext == "jpg" || ext == "jpeg"
}

/// Textures with an `_r` stem suffix are additive glow/liquid overlays by
/// naming convention.
pub fn is_additive_texture(tex_path: &str) -> bool {
    path_stem(tex_path).ends_with("_r")
}

/// Small JPEG-textured overlays (single quads up to small octahedra) that
/// the game draws additively.
fn is_billboard_jpeg(mesh: &Mesh) -> bool {
    if mesh.verts.len() > 16 || mesh.tris.len() > 12 || mesh.verts.is_empty() {
        return false;
    }
    is_jpeg_ext(&mesh.tex_ext())
}

fn has_additive_counterpart(meshes: &[Mesh], idx: usize) -> bool {
    let (nv, nt) = (meshes[idx].verts.len(), meshes[idx].tris.len());
    meshes.iter().enumerate().any(|(j, m)| {
        j != idx
            && is_additive_texture(&m.tex_path)
            && m.verts.len() == nv
            && m.tris.len() == nt
    })
}

/// A non-TGA mesh repeating the exact geometry counts of an earlier mesh
/// is a glow/effect overlay layer. TGA repeats are usually symmetric
/// pairs (wings, fabric) and stay opaque.
fn is_duplicate_geometry_overlay(meshes: &[Mesh], idx: usize) -> bool {
    if idx == 0 || meshes[idx].tex_ext() == "tga" {
        return false;
    }
    let (nv, nt) = (meshes[idx].verts.len(), meshes[idx].tris.len());
    meshes[..idx]
        .iter()
        .any(|m| m.verts.len() == nv && m.tris.len() == nt)
}

/// A tiny-textured JPEG mesh in a model that also has TGA meshes is a
/// gradient/glow fill, not a body texture.
fn is_tga_paired_glow_jpeg(
    meshes: &[Mesh],
    idx: usize,
    textures: &dyn TextureResolver,
) -> bool {
    if !is_jpeg_ext(&meshes[idx].tex_ext()) {
        return false;
    }
    let has_tga = meshes
        .iter()
        .enumerate()
        .any(|(i, m)| i != idx && m.tex_ext() == "tga");
    if !has_tga {
        return false;
    }
    match textures.resolve(&meshes[idx].tex_path) {
        Some(tex) => tex.width() <= 32 && tex.height() <= 32,
        None => false,
    }
}

/// A TGA mesh whose geometry mirrors a JPEG body mesh (counts within 2x
/// both ways, bounding boxes overlapping) is a decorative overlay and
/// alpha-blends instead of going through the depth buffer.
fn is_alpha_overlay(
    meshes: &[Mesh],
    idx: usize,
    textures: &dyn TextureResolver,
    entry: Option<&RenderEntry>,
) -> bool {
    if meshes[idx].tex_ext() != "tga" {
        return false;
    }
    let (tga_v, tga_t) = (meshes[idx].verts.len(), meshes[idx].tris.len());
    for (i, m) in meshes.iter().enumerate() {
        if i == idx || !is_jpeg_ext(&m.tex_ext()) {
            continue;
        }
        let (jpg_v, jpg_t) = (m.verts.len(), m.tris.len());
        if jpg_v == 0 || jpg_t == 0 {
            continue;
        }
        if is_force_additive(&m.tex_path, entry) {
            continue;
        }
        // Tiny JPEG textures are glow fills, not bodies.
        if let Some(tex) = textures.resolve(&m.tex_path) {
            if tex.width() <= 32 && tex.height() <= 32 {
                continue;
            }
        }
        if tga_v <= jpg_v * 2
            && jpg_v <= tga_v * 2
            && tga_t <= jpg_t * 2
            && jpg_t <= tga_t * 2
            && mesh_bbox_overlap(&meshes[idx], m)
        {
            return true;
        }
    }
    false
}

fn mesh_bounds(mesh: &Mesh) -> Option<([f32; 3], [f32; 3])> {
    let mut iter = mesh.verts.iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    for v in iter {
        for k in 0..3 {
            min[k] = min[k].min(v[k]);
            max[k] = max[k].max(v[k]);
        }
    }
    Some((min, max))
}

/// True when per-axis overlap reaches 40% of the larger span on every
/// non-degenerate axis.
fn mesh_bbox_overlap(a: &Mesh, b: &Mesh) -> bool {
    const MIN_OVERLAP_RATIO: f32 = 0.40;
    let (Some((a_min, a_max)), Some((b_min, b_max))) = (mesh_bounds(a), mesh_bounds(b)) else {
        return false;
    };
    for k in 0..3 {
        let max_span = (a_max[k] - a_min[k]).max(b_max[k] - b_min[k]);
        if max_span < 0.001 {
            continue;
        }
        let overlap = a_max[k].min(b_max[k]) - a_min[k].max(b_min[k]);
        if overlap <= 0.0 || overlap / max_span < MIN_OVERLAP_RATIO {
            return false;
        }
    }
    true
}

/// Mean RGB of a texture, with the flat placeholder gray as default.
pub fn average_color(tex: &image::RgbaImage) -> [u8; 4] {
    let n = (tex.width() * tex.height()) as f64;
    if n == 0.0 {
        return [160, 160, 170, 255];
    }
    let mut sum = [0.0f64; 3];
    for p in tex.pixels() {
        for c in 0..3 {
            sum[c] += p.0[c] as f64;
        }
    }
    [
        (sum[0] / n + 0.5) as u8,
        (sum[1] / n + 0.5) as u8,
        (sum[2] / n + 0.5) as u8,
        255,
    ]
}

/// Removes glow-layer meshes: JPEG+TGA groups sharing exact geometry
/// counts, standalone bright desaturated JPEG shimmer layers, and tiny
/// near-black skin placeholder textures. The mesh with the most
/// triangles is never removed, and a filter that would empty the model
/// is discarded.
fn filter_glow_layers(meshes: Vec<Mesh>, textures: &dyn TextureResolver) -> Vec<Mesh> {
    let mut remove = vec![false; meshes.len()];

    // JPEG+TGA pairs with identical geometry counts.
    for i in 0..meshes.len() {
        if remove[i] {
            continue;
        }
        let key = (meshes[i].verts.len(), meshes[i].tris.len());
        let group: Vec<usize> = (0..meshes.len())
            .filter(|&j| (meshes[j].verts.len(), meshes[j].tris.len()) == key)
            .collect();
        if group.len() < 2 {
            continue;
        }
        let has_jpg = group.iter().any(|&j| is_jpeg_ext(&meshes[j].tex_ext()));
        let has_tga = group.iter().any(|&j| meshes[j].tex_ext() == "tga");
        if has_jpg && has_tga {
            for j in group {
                remove[j] = true;
            }
        }
    }

    // The primary body mesh is the surviving one with the most triangles.
    let max_tris_idx = (0..meshes.len())
        .filter(|&i| !remove[i])
        .max_by_key(|&i| meshes[i].tris.len());

    for i in 0..meshes.len() {
        if remove[i] || Some(i) == max_tris_idx {
            continue;
        }
        if is_bright_glow_jpeg(&meshes[i], textures) || is_dark_filler(&meshes[i], textures) {
            remove[i] = true;
        }
    }

    if remove.iter().all(|&r| !r) {
        return meshes;
    }
    let kept: Vec<Mesh> = meshes
        .iter()
        .zip(&remove)
        .filter(|(_, &r)| !r)
        .map(|(m, _)| m.clone())
        .collect();
    if kept.is_empty() {
        meshes
    } else {
        kept
    }
}

/// Very bright, desaturated JPEG textures are shimmer overlays.
fn is_bright_glow_jpeg(mesh: &Mesh, textures: &dyn TextureResolver) -> bool {
    if !is_jpeg_ext(&mesh.tex_ext()) {
        return false;
    }
    let Some(tex) = textures.resolve(&mesh.tex_path) else {
        return false;
    };
    let [r, g, b, _] = average_color(&tex);
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let brightness = (r + g + b) / 3.0;
    let max_c = r.max(g).max(b);
    let min_c = r.min(g).min(b);
    let saturation = if max_c > 0.0 { (max_c - min_c) / max_c } else { 0.0 };
    brightness > 180.0 && saturation < 0.25
}

/// Tiny, nearly black textures are character-skin placeholders; with no
/// body underneath they would render as solid black patches.
fn is_dark_filler(mesh: &Mesh, textures: &dyn TextureResolver) -> bool {
    let Some(tex) = textures.resolve(&mesh.tex_path) else {
        return false;
    };
    if tex.width() > 16 || tex.height() > 16 {
        return false;
    }
    let [r, g, b, _] = average_color(&tex);
    (r as f64 + g as f64 + b as f64) / 3.0 < 10.0
}

/// Matches `(mini_|hangul)?gra` followed by a digit, underscore or end
/// of stem: the gradient-effect texture naming family.
fn is_gradient_effect(stem: &str) -> bool {
    let rest = stem
        .strip_prefix("mini_")
        .or_else(|| stem.strip_prefix("hangul"))
        .unwrap_or(stem);
    match rest.strip_prefix("gra") {
        Some(tail) => {
            tail.is_empty() || tail.starts_with(|c: char| c.is_ascii_digit() || c == '_')
        }
        None => false,
    }
}

const EFFECT_PATTERNS: &[&str] = &[
    "glow", "flare", "chrome", "effect", "aura", "shiny", "spark", "fire", "blur", "elec_light",
    "arrowlight", "lighting_mega", "pin_star", "lightmarks", "light_blue", "light_red", "energy",
    "plasma", "shine", "halo", "trail", "gradation", "sdblight", "alpha_line", "4x4", "damage",
    "ground_wind", "ground_star", "line_of_big", "force", "runeset", "shockwave", "swordeff",
    "cursorpin", "empact", "circle_shield", "arrowbom", "raypiece",
];

// Prefix-only to avoid substrings like "requitalbox_flame_wood" (a metal
// frame, not a fire effect).
const EFFECT_PREFIXES: &[&str] = &["flame"];

/// Aura/glow/effect overlay detection by texture name, falling back to a
/// small-geometry heuristic for tiny low-span decals.
pub fn is_effect_mesh(mesh: &Mesh) -> bool {
    let stem = mesh.tex_stem();
    if is_gradient_effect(&stem)
        || EFFECT_PATTERNS.iter().any(|p| stem.contains(p))
        || EFFECT_PREFIXES.iter().any(|p| stem.starts_with(p))
    {
        return true;
    }

    // Small geometry with little spatial extent; large quads such as
    // blade decals stay.
    let nv = mesh.verts.len();
    if nv > 0 && nv <= 8 && mesh.tris.len() <= 4 {
        if let Some((min, max)) = mesh_bounds(mesh) {
            let span = (0..3).map(|k| max[k] - min[k]).fold(0.0f32, f32::max);
            return span <= 20.0;
        }
    }
    false
}

fn after_digits(s: &str) -> Option<&str> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(&s[end..])
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

/// Character body/skin/hair texture stems. These name character-model
/// textures baked into equipment files and never equipment itself.
pub fn is_body_mesh(mesh: &Mesh) -> bool {
    let stem = mesh.tex_stem();
    let s = stem.as_str();

    // hqskin(2)?(_)?class<digits>
    if let Some(rest) = s.strip_prefix("hqskin") {
        let rest = rest.strip_prefix('2').unwrap_or(rest);
        let rest = rest.strip_prefix('_').unwrap_or(rest);
        if rest.strip_prefix("class").is_some_and(starts_with_digit) {
            return true;
        }
    }
    // skinclass<digits>head
    if let Some(rest) = s.strip_prefix("skinclass") {
        if after_digits(rest).is_some_and(|t| t.starts_with("head")) {
            return true;
        }
    }
    // item<digits>_head
    if let Some(rest) = s.strip_prefix("item") {
        if after_digits(rest).is_some_and(|t| t.starts_with("_head")) {
            return true;
        }
    }
    // level_man<digits>
    if s.strip_prefix("level_man").is_some_and(starts_with_digit) {
        return true;
    }
    s.starts_with("nude_")
        || s.starts_with("skin_barbarian")
        || s.starts_with("skin_warrior")
        || s.starts_with("skin_class")
        || s.starts_with("hair_r")
        || s.starts_with("hqhair_r")
        || s.starts_with("cobraset_hair")
        || s.starts_with("tknight_hair")
}

/// Per-item override: texture stems listed in `additive_textures` are
/// rendered as background-additive regardless of other heuristics.
pub fn is_force_additive(tex_path: &str, entry: Option<&RenderEntry>) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    if entry.additive_textures.is_empty() {
        return false;
    }
    let stem = path_stem(tex_path);
    entry
        .additive_textures
        .iter()
        .any(|s| s.eq_ignore_ascii_case(&stem))
}

/// Whether a tinted entry applies its tint to this texture. An empty
/// `tint_textures` list tints everything.
pub fn should_tint_mesh(tex_path: &str, entry: &RenderEntry) -> bool {
    if entry.tint_textures.is_empty() {
        return true;
    }
    let stem = path_stem(tex_path);
    entry
        .tint_textures
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&stem))
}

/// Removes small disconnected vertex components from a mesh, keeping the
/// largest component, any component of at least `min_verts` vertices,
/// and small components close to the largest one's bounding box.
/// Meshes small enough to be symmetric billboard pairs pass through.
pub fn filter_components(mesh: &Mesh, min_verts: usize) -> Mesh {
    if mesh.verts.is_empty() || mesh.tris.is_empty() || mesh.verts.len() <= 2 * min_verts {
        return mesh.clone();
    }

    let nv = mesh.verts.len();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nv];
    for tri in &mesh.tris {
        let n = if tri.polygon == 4 { 4 } else { 3 };
        for a in 0..n {
            for b in a + 1..n {
                let (va, vb) = (tri.vertex[a], tri.vertex[b]);
                if va < 0 || va as usize >= nv || vb < 0 || vb as usize >= nv {
                    continue;
                }
                adj[va as usize].push(vb as usize);
                adj[vb as usize].push(va as usize);
            }
        }
    }

    let mut visited = vec![false; nv];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for v in 0..nv {
        if visited[v] || adj[v].is_empty() {
            continue;
        }
        let mut comp = Vec::new();
        let mut stack = vec![v];
        while let Some(cur) = stack.pop() {
            if visited[cur] {
                continue;
            }
            visited[cur] = true;
            comp.push(cur);
            for &nb in &adj[cur] {
                if !visited[nb] {
                    stack.push(nb);
                }
            }
        }
        components.push(comp);
    }

    if components.len() <= 1 {
        return mesh.clone();
    }

    let largest_idx = components
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| c.len())
        .map(|(i, _)| i)
        .unwrap_or(0);
    let largest = &components[largest_idx];

    let mut l_min = mesh.verts[largest[0]];
    let mut l_max = l_min;
    for &vi in largest {
        for k in 0..3 {
            l_min[k] = l_min[k].min(mesh.verts[vi][k]);
            l_max[k] = l_max[k].max(mesh.verts[vi][k]);
        }
    }
    let l_span = (0..3)
        .map(|k| (l_max[k] - l_min[k]) as f64)
        .fold(0.0f64, f64::max);

    let mut keep = vec![false; nv];
    for &vi in largest {
        keep[vi] = true;
    }
    for (i, comp) in components.iter().enumerate() {
        if i == largest_idx {
            continue;
        }
        let keep_comp = if comp.len() >= min_verts {
            true
        } else {
            // Keep strays whose center sits near the main body's box.
            let mut center = [0.0f64; 3];
            for &vi in comp {
                for k in 0..3 {
                    center[k] += mesh.verts[vi][k] as f64;
                }
            }
            let mut dist_sq = 0.0;
            for k in 0..3 {
                let c = center[k] / comp.len() as f64;
                let (lo, hi) = (l_min[k] as f64, l_max[k] as f64);
                let d = if c < lo {
                    lo - c
                } else if c > hi {
                    c - hi
                } else {
                    0.0
                };
                dist_sq += d * d;
            }
            dist_sq < l_span * l_span * 0.16
        };
        if keep_comp {
            for &vi in comp {
                keep[vi] = true;
            }
        }
    }

    let kept_tris: Vec<Triangle> = mesh
        .tris
        .iter()
        .filter(|tri| {
            tri.vertex[..3].iter().all(|&v| {
                v >= 0 && (v as usize) < nv && keep[v as usize]
            })
        })
        .copied()
        .collect();

    let mut out = mesh.clone();
    out.tris = kept_tris;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::NullResolver;

    fn mesh(tex_path: &str, nv: usize, nt: usize) -> Mesh {
        Mesh {
            verts: vec![[0.0; 3]; nv],
            nodes: vec![0; nv],
            tris: vec![Triangle::default(); nt],
            tex_path: tex_path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn additive_texture_suffix() {
        assert!(is_additive_texture("item\\secret_R.jpg"));
        assert!(is_additive_texture("songko2_r.jpg"));
        assert!(!is_additive_texture("rock.jpg"));
    }

    #[test]
    fn gradient_effect_names() {
        for stem in ["gra1", "gra_blue", "gra", "mini_gra3", "hangulgra_x"] {
            assert!(is_gradient_effect(stem), "{stem}");
        }
        for stem in ["grass", "grande", "granite"] {
            assert!(!is_gradient_effect(stem), "{stem}");
        }
    }

    #[test]
    fn effect_mesh_by_name_and_geometry() {
        assert!(is_effect_mesh(&mesh("fire_glow.jpg", 100, 50)));
        assert!(is_effect_mesh(&mesh("flamething.jpg", 100, 50)));
        assert!(!is_effect_mesh(&mesh("requitalbox_flame_wood.jpg", 100, 50)));

        // Tiny quad with no extent is an effect.
        let tiny = mesh("decal.jpg", 4, 2);
        assert!(is_effect_mesh(&tiny));

        // Same counts but a large span stays.
        let mut large = mesh("decal.jpg", 4, 2);
        large.verts = vec![
            [0.0; 3],
            [50.0, 0.0, 0.0],
            [50.0, 50.0, 0.0],
            [0.0, 50.0, 0.0],
        ];
        assert!(!is_effect_mesh(&large));
    }

    #[test]
    fn body_mesh_patterns() {
        for name in [
            "HQSkinClass313.jpg",
            "HQskin2Class314.jpg",
            "hqskin_Class109.jpg",
            "Skinclass206head_N.jpg",
            "nude_Armor.jpg",
            "Item3002_Head.jpg",
            "item3002_headhair.jpg",
            "skin_barbarian_01.jpg",
            "level_man022.jpg",
            "HQhair_R.tga",
            "cobraset_hair.jpg",
        ] {
            assert!(is_body_mesh(&mesh(name, 10, 5)), "{name}");
        }
        for name in [
            "Skinclass206_headhelmet.jpg",
            "itemx_head.jpg",
            "blade.jpg",
            "hairpin.jpg",
        ] {
            assert!(!is_body_mesh(&mesh(name, 10, 5)), "{name}");
        }
    }

    #[test]
    fn classify_assigns_additive_for_suffix_and_promotes_base() {
        let meshes = vec![mesh("glowy_r.jpg", 30, 20)];
        let classes = HeuristicClassifier.classify(&meshes, None, &NullResolver);
        // Sole additive mesh is promoted to opaque.
        assert_eq!(classes, vec![MeshClass::Opaque]);

        let meshes = vec![mesh("body.tga", 100, 60), mesh("glowy_r.jpg", 30, 20)];
        let classes = HeuristicClassifier.classify(&meshes, None, &NullResolver);
        assert_eq!(classes, vec![MeshClass::Opaque, MeshClass::Additive]);
    }

    #[test]
    fn duplicate_geometry_overlay_is_additive_for_jpg_only() {
        let meshes = vec![
            mesh("base00.jpg", 40, 30),
            mesh("base01.jpg", 40, 30),
            mesh("wing.tga", 40, 30),
        ];
        assert!(is_duplicate_geometry_overlay(&meshes, 1));
        assert!(!is_duplicate_geometry_overlay(&meshes, 2));
        assert!(!is_duplicate_geometry_overlay(&meshes, 0));
    }

    #[test]
    fn force_additive_respects_entry_list() {
        let entry = RenderEntry {
            additive_textures: vec!["Liquid".into()],
            ..Default::default()
        };
        assert!(is_force_additive("item\\liquid.jpg", Some(&entry)));
        assert!(!is_force_additive("item\\bottle.jpg", Some(&entry)));
        assert!(!is_force_additive("item\\liquid.jpg", None));
    }

    #[test]
    fn tint_list_empty_means_all() {
        let entry = RenderEntry::default();
        assert!(should_tint_mesh("anything.jpg", &entry));
        let entry = RenderEntry {
            tint_textures: vec!["blade".into()],
            ..Default::default()
        };
        assert!(should_tint_mesh("x\\BLADE.jpg", &entry));
        assert!(!should_tint_mesh("hilt.jpg", &entry));
    }

    fn quad(tris: &mut Vec<Triangle>, a: i16, b: i16, c: i16) {
        let mut t = Triangle {
            polygon: 3,
            ..Default::default()
        };
        t.vertex[0] = a;
        t.vertex[1] = b;
        t.vertex[2] = c;
        tris.push(t);
    }

    #[test]
    fn component_filter_drops_distant_fragment() {
        // Main body: 13 connected vertices around the origin. Fragment: a
        // far-away triangle of 3 vertices.
        let mut m = Mesh::default();
        for i in 0..13 {
            m.verts.push([i as f32, 0.0, 0.0]);
        }
        for v in [[500.0f32, 500.0, 500.0], [501.0, 500.0, 500.0], [500.0, 501.0, 500.0]] {
            m.verts.push(v);
        }
        m.nodes = vec![0; m.verts.len()];
        for i in 0..12i16 {
            quad(&mut m.tris, i, i + 1, 0);
        }
        quad(&mut m.tris, 13, 14, 15);

        let filtered = filter_components(&m, 6);
        assert_eq!(filtered.tris.len(), 12);

        // A nearby fragment of the same size survives.
        let mut near = m.clone();
        near.verts[13] = [13.0, 1.0, 0.0];
        near.verts[14] = [14.0, 1.0, 0.0];
        near.verts[15] = [13.0, 2.0, 0.0];
        let filtered = filter_components(&near, 6);
        assert_eq!(filtered.tris.len(), 13);
    }

    #[test]
    fn component_filter_skips_small_meshes() {
        let mut m = Mesh::default();
        for i in 0..8 {
            m.verts.push([i as f32, 0.0, 0.0]);
        }
        quad(&mut m.tris, 0, 1, 2);
        quad(&mut m.tris, 5, 6, 7);
        let filtered = filter_components(&m, 6);
        assert_eq!(filtered.tris.len(), 2);
    }
}
