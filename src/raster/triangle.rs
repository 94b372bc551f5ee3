//! Triangle rasterization with flat shading, barycentric interpolation
//! and a depth buffer where larger view-space depth is closer.
//!
//! This is the hot path; the pixel loop allocates nothing.

use image::RgbaImage;

use crate::camera::Projected;

use super::lighting::{aces_tonemap, LightConfig, SRGB_TO_LINEAR};
use super::sampler::sample_texture;
use super::FrameBuffer;

/// How a triangle's pixels combine with the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Depth test and write, replacing color and alpha.
    Opaque,
    /// Depth test without write, straight-alpha compositing.
    Alpha,
    /// No depth interaction; colors add and alpha tracks luminance.
    Additive,
}

const BARY_TOLERANCE: f64 = -0.001;
const MIN_ALPHA: u8 = 8;

pub fn clamp255(v: f64) -> u8 {
    if v < 0.0 {
        0
    } else if v > 255.0 {
        255
    } else {
        (v + 0.5) as u8
    }
}

#[allow(clippy::too_many_arguments)]
pub fn rasterize_triangle(
    fb: &mut FrameBuffer,
    proj: &Projected,
    uvs: &[[f32; 2]],
    vi: [i32; 3],
    ti: [i32; 3],
    tex: Option<&RgbaImage>,
    fallback: [u8; 4],
    lc: &LightConfig,
    mode: BlendMode,
) {
    let nv = proj.x.len() as i32;
    if vi.iter().any(|&i| i < 0 || i >= nv) {
        return;
    }
    let idx = [vi[0] as usize, vi[1] as usize, vi[2] as usize];

    let (x0, y0, z0) = (proj.x[idx[0]], proj.y[idx[0]], proj.depth[idx[0]]);
    let (x1, y1, z1) = (proj.x[idx[1]], proj.y[idx[1]], proj.depth[idx[1]]);
    let (x2, y2, z2) = (proj.x[idx[2]], proj.y[idx[2]], proj.depth[idx[2]]);

    let nuv = uvs.len() as i32;
    let has_uv = tex.is_some() && ti.iter().all(|&i| i >= 0 && i < nuv);
    let [uv0, uv1, uv2] = if has_uv {
        [
            uvs[ti[0] as usize].map(f64::from),
            uvs[ti[1] as usize].map(f64::from),
            uvs[ti[2] as usize].map(f64::from),
        ]
    } else {
        [[0.0; 2]; 3]
    };

    // Flat shading from the screen-space face normal.
    let (e1x, e1y, e1z) = (x1 - x0, y1 - y0, z1 - z0);
    let (e2x, e2y, e2z) = (x2 - x0, y2 - y0, z2 - z0);
    let nx = e1y * e2z - e1z * e2y;
    let ny = e1z * e2x - e1x * e2z;
    let nz = e1x * e2y - e1y * e2x;
    let nl = (nx * nx + ny * ny + nz * nz).sqrt();
    if nl < 1e-8 {
        return;
    }
    let shade = lc.shade(glam::DVec3::new(nx / nl, ny / nl, nz / nl));

    let size = fb.width;
    let min_x = (x0.min(x1).min(x2) as i64).max(0) as usize;
    let max_x = ((x0.max(x1).max(x2) as i64) + 1).min(size as i64 - 1);
    let min_y = (y0.min(y1).min(y2) as i64).max(0) as usize;
    let max_y = ((y0.max(y1).max(y2) as i64) + 1).min(size as i64 - 1);
    if max_x < 0 || max_y < 0 {
        return;
    }
    let (max_x, max_y) = (max_x as usize, max_y as usize);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let det = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);
    if det.abs() < 1e-8 {
        return;
    }
    let inv_det = 1.0 / det;

    let dy12 = y1 - y2;
    let dx21 = x2 - x1;
    let dy20 = y2 - y0;
    let dx02 = x0 - x2;

    let srgb = &*SRGB_TO_LINEAR;
    for sy in min_y..=max_y {
        let dsy = sy as f64 - y2;
        let row = sy * size;
        for sx in min_x..=max_x {
            let dsx = sx as f64 - x2;
            let w0 = (dy12 * dsx + dx21 * dsy) * inv_det;
            let w1 = (dy20 * dsx + dx02 * dsy) * inv_det;
            let w2 = 1.0 - w0 - w1;
            if w0 < BARY_TOLERANCE || w1 < BARY_TOLERANCE || w2 < BARY_TOLERANCE {
                continue;
            }

            let z = w0 * z0 + w1 * z1 + w2 * z2;
            let z_idx = row + sx;
            if mode != BlendMode::Additive && z <= fb.depth[z_idx] {
                continue;
            }

            let [cr, cg, cb, ca] = match tex {
                Some(tex) if has_uv => {
                    let u = w0 * uv0[0] + w1 * uv1[0] + w2 * uv2[0];
                    let v = w0 * uv0[1] + w1 * uv1[1] + w2 * uv2[1];
                    sample_texture(tex, u, v)
                }
                _ => fallback,
            };
            if ca < MIN_ALPHA {
                continue;
            }

            // sRGB decode, shade, tone map, re-encode.
            let shade_exp = shade * lc.exposure;
            let fr = aces_tonemap(srgb[cr as usize] * shade_exp).powf(lc.inv_gamma) * 255.0;
            let fg = aces_tonemap(srgb[cg as usize] * shade_exp).powf(lc.inv_gamma) * 255.0;
            let fb_ = aces_tonemap(srgb[cb as usize] * shade_exp).powf(lc.inv_gamma) * 255.0;

            let px = z_idx * 4;
            match mode {
                BlendMode::Opaque => {
                    fb.depth[z_idx] = z;
                    fb.color[px] = clamp255(fr);
                    fb.color[px + 1] = clamp255(fg);
                    fb.color[px + 2] = clamp255(fb_);
                    fb.color[px + 3] = ca;
                }
                BlendMode::Alpha => {
                    // Straight-alpha over, without claiming the depth.
                    let a = ca as f64 / 255.0;
                    let da = fb.color[px + 3] as f64 / 255.0;
                    fb.color[px] = clamp255(fr * a + fb.color[px] as f64 * (1.0 - a));
                    fb.color[px + 1] = clamp255(fg * a + fb.color[px + 1] as f64 * (1.0 - a));
                    fb.color[px + 2] = clamp255(fb_ * a + fb.color[px + 2] as f64 * (1.0 - a));
                    fb.color[px + 3] = clamp255((a + da * (1.0 - a)) * 255.0);
                }
                BlendMode::Additive => {
                    fb.color[px] = clamp255(fb.color[px] as f64 + fr);
                    fb.color[px + 1] = clamp255(fb.color[px + 1] as f64 + fg);
                    fb.color[px + 2] = clamp255(fb.color[px + 2] as f64 + fb_);
                    // Dark additions stay transparent.
                    let lum = clamp255(fr * 0.299 + fg * 0.587 + fb_ * 0.114);
                    if lum > fb.color[px + 3] {
                        fb.color[px + 3] = lum;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj(points: &[(f64, f64, f64)]) -> Projected {
        Projected {
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
            depth: points.iter().map(|p| p.2).collect(),
        }
    }

    fn draw(fb: &mut FrameBuffer, pts: &[(f64, f64, f64)], mode: BlendMode, color: [u8; 4]) {
        let p = proj(pts);
        let lc = LightConfig::default();
        rasterize_triangle(fb, &p, &[], [0, 1, 2], [0, 1, 2], None, color, &lc, mode);
    }

    fn coverage(fb: &FrameBuffer) -> usize {
        fb.color.chunks_exact(4).filter(|c| c[3] > 0).count()
    }

    #[test]
    fn opaque_triangle_covers_pixels() {
        let mut fb = FrameBuffer::new(64, 64);
        draw(
            &mut fb,
            &[(8.0, 8.0, 0.0), (56.0, 8.0, 0.0), (8.0, 56.0, 0.0)],
            BlendMode::Opaque,
            [200, 200, 200, 255],
        );
        let covered = coverage(&fb);
        // Half of a 48x48 box, within rasterization tolerance.
        assert!((1000..1400).contains(&covered), "covered = {covered}");
    }

    #[test]
    fn larger_depth_wins() {
        let mut fb = FrameBuffer::new(32, 32);
        let tri = [(2.0, 2.0, 0.0), (30.0, 2.0, 0.0), (2.0, 30.0, 0.0)];
        draw(&mut fb, &tri, BlendMode::Opaque, [255, 0, 0, 255]);
        let red = fb.color[(10 * 32 + 10) * 4];

        // Farther triangle must not overwrite.
        let far = [(2.0, 2.0, -5.0), (30.0, 2.0, -5.0), (2.0, 30.0, -5.0)];
        draw(&mut fb, &far, BlendMode::Opaque, [0, 255, 0, 255]);
        assert_eq!(fb.color[(10 * 32 + 10) * 4], red);
        assert_eq!(fb.color[(10 * 32 + 10) * 4 + 1], 0);

        // Nearer triangle replaces.
        let near = [(2.0, 2.0, 5.0), (30.0, 2.0, 5.0), (2.0, 30.0, 5.0)];
        draw(&mut fb, &near, BlendMode::Opaque, [0, 0, 255, 255]);
        assert!(fb.color[(10 * 32 + 10) * 4 + 2] > 0);
    }

    #[test]
    fn additive_never_darkens() {
        let mut fb = FrameBuffer::new(32, 32);
        let tri = [(2.0, 2.0, 0.0), (30.0, 2.0, 0.0), (2.0, 30.0, 0.0)];
        draw(&mut fb, &tri, BlendMode::Opaque, [60, 60, 60, 255]);
        let before: Vec<u8> = fb.color.clone();
        draw(&mut fb, &tri, BlendMode::Additive, [40, 40, 40, 255]);
        for (b, a) in before.iter().zip(&fb.color) {
            assert!(a >= b);
        }
    }

    #[test]
    fn alpha_blend_does_not_claim_depth() {
        let mut fb = FrameBuffer::new(32, 32);
        let tri = [(2.0, 2.0, 1.0), (30.0, 2.0, 1.0), (2.0, 30.0, 1.0)];
        draw(&mut fb, &tri, BlendMode::Alpha, [255, 255, 255, 128]);
        let z = fb.depth[10 * 32 + 10];
        assert_eq!(z, f64::NEG_INFINITY);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mut fb = FrameBuffer::new(16, 16);
        let p = proj(&[(2.0, 2.0, 0.0), (14.0, 2.0, 0.0)]);
        let lc = LightConfig::default();
        rasterize_triangle(
            &mut fb,
            &p,
            &[],
            [0, 1, 5],
            [0, 1, 2],
            None,
            [255, 255, 255, 255],
            &lc,
            BlendMode::Opaque,
        );
        assert_eq!(coverage(&fb), 0);
    }

    #[test]
    fn degenerate_triangle_draws_nothing() {
        let mut fb = FrameBuffer::new(16, 16);
        draw(
            &mut fb,
            &[(2.0, 2.0, 0.0), (8.0, 8.0, 0.0), (14.0, 14.0, 0.0)],
            BlendMode::Opaque,
            [255, 255, 255, 255],
        );
        assert_eq!(coverage(&fb), 0);
    }
}
