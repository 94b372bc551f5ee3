//! Whole-model rendering: mesh filtering, blend classification and the
//! four rasterization passes.

use glam::DVec3;
use image::RgbaImage;
use tracing::debug;

use crate::camera::{self, RENDER_MARGIN, VIEW_FALLBACK};
use crate::classify::{
    self, average_color, filter_components, HeuristicClassifier, MeshClass, MeshClassifier,
};
use crate::entry::RenderEntry;
use crate::model::{Bone, Mesh};
use crate::raster::{
    composite_under, rasterize_triangle, remove_background_dark, BlendMode, FrameBuffer,
    LightConfig,
};
use crate::skeleton;
use crate::texture::TextureResolver;

/// Brightness threshold for background removal behind force-additive
/// overlays.
const BACKGROUND_DARK_THRESHOLD: u32 = 60;

/// Minimum vertex count for keeping a disconnected mesh component.
const COMPONENT_MIN_VERTS: usize = 6;

/// Renders a parsed model to a straight-alpha RGBA image of
/// `size * supersample` pixels on a side. An empty model (or one whose
/// meshes were all filtered away) yields a fully transparent canvas at
/// the base size.
pub fn render_model(
    meshes: Vec<Mesh>,
    bones: &[Bone],
    entry: Option<&RenderEntry>,
    textures: &dyn TextureResolver,
    size: usize,
    supersample: usize,
) -> RgbaImage {
    let classifier = HeuristicClassifier;
    let mut meshes = classifier.filter(meshes, entry, textures);

    if camera::should_use_bones(entry) {
        skeleton::apply_bind_pose(&mut meshes, bones);
    }

    // Stray components are dropped per mesh before classification so
    // geometry counts reflect what actually draws.
    let body_meshes: Vec<Mesh> = meshes
        .iter()
        .map(|m| filter_components(m, COMPONENT_MIN_VERTS))
        .collect();
    if body_meshes.is_empty() {
        return RgbaImage::new(size as u32, size as u32);
    }

    let view = match entry {
        Some(e) => camera::view_matrix(e),
        None => *VIEW_FALLBACK,
    };

    let render_size = size * supersample;

    let mut all_min = DVec3::splat(f64::INFINITY);
    let mut all_max = DVec3::splat(f64::NEG_INFINITY);
    for m in &body_meshes {
        for v in &m.verts {
            let t = view * DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64);
            all_min = all_min.min(t);
            all_max = all_max.max(t);
        }
    }
    let center = (all_min + all_max) / 2.0;
    let span = (all_max.x - all_min.x).max(all_max.y - all_min.y).max(0.001);
    let margin = RENDER_MARGIN * supersample;
    let scale = (render_size as f64 - 2.0 * margin as f64) / span;

    let classes = classifier.classify(&body_meshes, entry, textures);
    debug!(
        meshes = body_meshes.len(),
        opaque = classes.iter().filter(|&&c| c == MeshClass::Opaque).count(),
        alpha = classes.iter().filter(|&&c| c == MeshClass::Alpha).count(),
        additive = classes.iter().filter(|&&c| c == MeshClass::Additive).count(),
        "classified meshes"
    );

    let mut fb = FrameBuffer::new(render_size, render_size);
    let lc = LightConfig::default();

    let pass = |fb: &mut FrameBuffer, class, mode| {
        for (mesh, _) in body_meshes
            .iter()
            .zip(&classes)
            .filter(|(_, &c)| c == class)
        {
            rasterize_mesh(fb, mesh, &view, center, scale, render_size, entry, textures, &lc, mode);
        }
    };

    pass(&mut fb, MeshClass::Opaque, BlendMode::Opaque);
    pass(&mut fb, MeshClass::Alpha, BlendMode::Alpha);
    pass(&mut fb, MeshClass::Additive, BlendMode::Additive);

    // Force-additive overlays render opaque into their own buffer; after
    // stripping the dark background they composite under the main image
    // so they only show through uncovered areas.
    if classes.contains(&MeshClass::BackgroundAdditive) {
        let mut bg = FrameBuffer::new(render_size, render_size);
        pass(&mut bg, MeshClass::BackgroundAdditive, BlendMode::Opaque);
        remove_background_dark(&mut bg, BACKGROUND_DARK_THRESHOLD);
        composite_under(&mut fb, &bg);
    }

    fb.into_image()
}

#[allow(clippy::too_many_arguments)]
fn rasterize_mesh(
    fb: &mut FrameBuffer,
    mesh: &Mesh,
    view: &glam::DMat3,
    center: DVec3,
    scale: f64,
    render_size: usize,
    entry: Option<&RenderEntry>,
    textures: &dyn TextureResolver,
    lc: &LightConfig,
    mode: BlendMode,
) {
    if mesh.verts.is_empty() {
        return;
    }

    let proj = camera::project_vertices(&mesh.verts, view, center, scale, render_size, entry);

    let resolved = textures.resolve(&mesh.tex_path);
    let tinted = match (entry, &resolved) {
        (Some(e), Some(tex)) if e.has_tint() && classify::should_tint_mesh(&mesh.tex_path, e) => {
            Some(apply_tint(tex, e.tint))
        }
        _ => None,
    };
    let tex: Option<&RgbaImage> = tinted.as_ref().or(resolved.as_deref());

    let fallback = tex.map_or([160, 160, 170, 255], average_color);

    for tri in &mesh.tris {
        let vi = [
            tri.vertex[0] as i32,
            tri.vertex[1] as i32,
            tri.vertex[2] as i32,
        ];
        let ti = [
            tri.texcoord[0] as i32,
            tri.texcoord[1] as i32,
            tri.texcoord[2] as i32,
        ];
        rasterize_triangle(fb, &proj, &mesh.uvs, vi, ti, tex, fallback, lc, mode);

        if tri.polygon == 4 {
            let vi2 = [vi[0], tri.vertex[2] as i32, tri.vertex[3] as i32];
            let ti2 = [ti[0], tri.texcoord[2] as i32, tri.texcoord[3] as i32];
            rasterize_triangle(fb, &proj, &mesh.uvs, vi2, ti2, tex, fallback, lc, mode);
        }
    }
}

/// Multiplies texture RGB by the tint factors, clamped, leaving alpha.
fn apply_tint(src: &RgbaImage, tint: [f64; 3]) -> RgbaImage {
    let mut out = src.clone();
    for p in out.pixels_mut() {
        for c in 0..3 {
            p[c] = (p[c] as f64 * tint[c]).min(255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Triangle;
    use crate::texture::NullResolver;
    use image::Rgba;

    fn quad_mesh(tex_path: &str) -> Mesh {
        // A 10x10 quad in the model x-z plane, which the fallback view
        // presents face-on.
        let mut tri = Triangle {
            polygon: 4,
            ..Default::default()
        };
        tri.vertex = [0, 1, 2, 3];
        tri.texcoord = [0, 0, 0, 0];
        Mesh {
            verts: vec![
                [0.0, 0.0, 0.0],
                [10.0, 0.0, 0.0],
                [10.0, 0.0, 10.0],
                [0.0, 0.0, 10.0],
            ],
            nodes: vec![0; 4],
            uvs: vec![[0.0, 0.0]],
            tris: vec![tri],
            tex_path: tex_path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn renders_quad_centered_with_margin() {
        let img = render_model(vec![quad_mesh("a.jpg")], &[], None, &NullResolver, 64, 1);
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(img.get_pixel(32, 32)[3], 255);
        // The 16px margin stays clear.
        assert_eq!(img.get_pixel(8, 8)[3], 0);
        assert_eq!(img.get_pixel(56, 56)[3], 0);
    }

    #[test]
    fn empty_model_is_transparent_at_base_size() {
        let img = render_model(Vec::new(), &[], None, &NullResolver, 64, 2);
        assert_eq!(img.dimensions(), (64, 64));
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn supersample_scales_canvas() {
        let img = render_model(vec![quad_mesh("a.jpg")], &[], None, &NullResolver, 64, 2);
        assert_eq!(img.dimensions(), (128, 128));
        assert_eq!(img.get_pixel(64, 64)[3], 255);
    }

    #[test]
    fn force_additive_mesh_still_produces_content() {
        let entry = RenderEntry {
            additive_textures: vec!["a".into()],
            ..Default::default()
        };
        let img = render_model(
            vec![quad_mesh("a.jpg")],
            &[],
            Some(&entry),
            &NullResolver,
            64,
            1,
        );
        // The untextured gray fallback is bright enough to survive the
        // background removal.
        assert!(img.get_pixel(32, 32)[3] > 0);
    }

    #[test]
    fn tint_multiplies_channels() {
        let mut tex = RgbaImage::new(2, 2);
        for p in tex.pixels_mut() {
            *p = Rgba([200, 100, 50, 255]);
        }
        let tinted = apply_tint(&tex, [0.5, 1.0, 2.0]);
        let p = tinted.get_pixel(0, 0);
        assert_eq!(p.0, [100, 100, 100, 255]);
    }
}
