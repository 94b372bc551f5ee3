//! Post-render image standardization.
//!
//! Rendered items come out at arbitrary orientations. Standardization
//! aligns the principal axis of the opaque pixels to a target display
//! angle (PCA over pixel positions), resolves the 180 degree ambiguity
//! by comparing the spread of the two ends, then crops, scales and
//! centers onto a square canvas. Cleanup helpers (cluster removal,
//! supersample reduction, mirror pairing) live here too.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Crops to the opaque bounding box, then scales and centers. The path
/// used when PCA alignment is disabled for an item.
pub fn crop_and_center(img: RgbaImage, size: u32, fill_ratio: f64) -> RgbaImage {
    scale_and_center(&crop_alpha(&img), size, fill_ratio)
}

/// Aligns, orients, crops, scales and centers the image. Images with
/// fewer than 10 opaque pixels pass through untouched.
pub fn standardize(
    img: RgbaImage,
    size: u32,
    target_angle_deg: f64,
    fill_ratio: f64,
    force_flip: bool,
) -> RgbaImage {
    let (w, h) = img.dimensions();

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if img.get_pixel(x, y)[3] > 0 {
                xs.push(x as f64);
                ys.push(y as f64);
            }
        }
    }
    if xs.len() < 10 {
        return img;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut cov_xx, mut cov_xy, mut cov_yy) = (0.0, 0.0, 0.0);
    for i in 0..xs.len() {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        cov_xx += dx * dx;
        cov_xy += dx * dy;
        cov_yy += dy * dy;
    }
    cov_xx /= n;
    cov_xy /= n;
    cov_yy /= n;

    let evec = principal_axis(cov_xx, cov_xy, cov_yy);
    let current_angle = evec[1].atan2(evec[0]).to_degrees();

    // Target angle is given in math convention (y up); image rows grow
    // downward, so the sign flips.
    let target_img = -target_angle_deg;

    // The principal axis has a 180 degree ambiguity, so the correction
    // normalizes into [-90, 90].
    let mut rotate = current_angle - target_img;
    while rotate > 90.0 {
        rotate -= 180.0;
    }
    while rotate < -90.0 {
        rotate += 180.0;
    }

    let mut rotated = rotate_bilinear(img, rotate);

    let mut need_flip = detect_flip_rotated(&rotated, target_img);
    if force_flip {
        need_flip = !need_flip;
    }
    if need_flip {
        rotated = imageops::rotate180(&rotated);
    }

    scale_and_center(&crop_alpha(&rotated), size, fill_ratio)
}

/// Principal eigenvector of the 2x2 symmetric covariance matrix
/// `[[a, b], [b, d]]`.
fn principal_axis(a: f64, b: f64, d: f64) -> [f64; 2] {
    let trace = a + d;
    let det = a * d - b * b;
    let disc = (trace * trace / 4.0 - det).max(0.0);
    let eval1 = trace / 2.0 + disc.sqrt();

    if b.abs() > 1e-12 {
        let (x, y) = (eval1 - d, b);
        let len = (x * x + y * y).sqrt();
        if len < 1e-12 {
            [1.0, 0.0]
        } else {
            [x / len, y / len]
        }
    } else if a >= d {
        [1.0, 0.0]
    } else {
        [0.0, 1.0]
    }
}

/// Decides whether the rotated image is upside down along the target
/// axis. Pixels are projected on the target direction and split at the
/// bounding-box center; the end with the wider perpendicular spread
/// belongs at the top-left. Images under 20 opaque pixels never flip.
fn detect_flip_rotated(rotated: &RgbaImage, target_img_deg: f64) -> bool {
    let (w, h) = rotated.dimensions();

    let mut pts: Vec<(f64, f64)> = Vec::new();
    let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
    let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
    for y in 0..h {
        for x in 0..w {
            if rotated.get_pixel(x, y)[3] > 0 {
                let (fx, fy) = (x as f64, y as f64);
                pts.push((fx, fy));
                min_x = min_x.min(fx);
                max_x = max_x.max(fx);
                min_y = min_y.min(fy);
                max_y = max_y.max(fy);
            }
        }
    }
    if pts.len() < 20 {
        return false;
    }

    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;
    let rad = target_img_deg.to_radians();
    let (diag_x, diag_y) = (rad.cos(), rad.sin());

    let mut neg_perps = Vec::new();
    let mut pos_perps = Vec::new();
    for (px, py) in pts {
        let dx = px - cx;
        let dy = py - cy;
        let proj = dx * diag_x + dy * diag_y;
        let perp = -dx * diag_y + dy * diag_x;
        if proj < 0.0 {
            neg_perps.push(perp);
        } else {
            pos_perps.push(perp);
        }
    }

    let spread_tl = stddev(&neg_perps);
    let spread_br = stddev(&pos_perps);
    spread_br > spread_tl * 1.2
}

fn stddev(vals: &[f64]) -> f64 {
    if vals.len() < 10 {
        return 0.0;
    }
    let n = vals.len() as f64;
    let sum: f64 = vals.iter().sum();
    let sum2: f64 = vals.iter().map(|v| v * v).sum();
    let mean = sum / n;
    (sum2 / n - mean * mean).max(0.0).sqrt()
}

/// Rotates with an expanded canvas and bilinear resampling. Angles under
/// half a degree are a no-op.
fn rotate_bilinear(img: RgbaImage, angle_deg: f64) -> RgbaImage {
    if angle_deg.abs() < 0.5 {
        return img;
    }

    let (w, h) = img.dimensions();
    let (wf, hf) = (w as f64, h as f64);
    let rad = angle_deg.to_radians();
    let new_w = (wf * rad.cos().abs() + hf * rad.sin().abs()).ceil() as u32;
    let new_h = (wf * rad.sin().abs() + hf * rad.cos().abs()).ceil() as u32;

    let mut dst = RgbaImage::new(new_w, new_h);
    let (cx, cy) = (wf / 2.0, hf / 2.0);
    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);
    let (cos_a, sin_a) = (rad.cos(), rad.sin());

    for dy in 0..new_h {
        for dx in 0..new_w {
            // Inverse mapping around the canvas center.
            let rx = dx as f64 - ncx;
            let ry = dy as f64 - ncy;
            let sx = rx * cos_a + ry * sin_a + cx;
            let sy = -rx * sin_a + ry * cos_a + cy;

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            if x0 < 0 || y0 < 0 || x0 + 1 >= w as i64 || y0 + 1 >= h as i64 {
                continue;
            }
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            let c00 = img.get_pixel(x0 as u32, y0 as u32).0;
            let c10 = img.get_pixel(x0 as u32 + 1, y0 as u32).0;
            let c01 = img.get_pixel(x0 as u32, y0 as u32 + 1).0;
            let c11 = img.get_pixel(x0 as u32 + 1, y0 as u32 + 1).0;

            let mut out = [0u8; 4];
            for c in 0..4 {
                let v = c00[c] as f64 * (1.0 - fx) * (1.0 - fy)
                    + c10[c] as f64 * fx * (1.0 - fy)
                    + c01[c] as f64 * (1.0 - fx) * fy
                    + c11[c] as f64 * fx * fy;
                out[c] = clamp8(v);
            }
            dst.put_pixel(dx, dy, Rgba(out));
        }
    }
    dst
}

fn clamp8(v: f64) -> u8 {
    if v < 0.0 {
        0
    } else if v > 255.0 {
        255
    } else {
        (v + 0.5) as u8
    }
}

fn alpha_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = img.dimensions();
    let (mut min_x, mut min_y) = (w, h);
    let (mut max_x, mut max_y) = (0, 0);
    let mut any = false;
    for y in 0..h {
        for x in 0..w {
            if img.get_pixel(x, y)[3] > 0 {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                any = true;
            }
        }
    }
    any.then_some((min_x, min_y, max_x, max_y))
}

fn crop_alpha(img: &RgbaImage) -> RgbaImage {
    match alpha_bounds(img) {
        Some((min_x, min_y, max_x, max_y)) if max_x > min_x && max_y > min_y => {
            imageops::crop_imm(img, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image()
        }
        _ => img.clone(),
    }
}

fn scale_and_center(img: &RgbaImage, canvas_size: u32, fill_ratio: f64) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    let mut canvas = RgbaImage::new(canvas_size, canvas_size);
    if src_w == 0 || src_h == 0 {
        return canvas;
    }

    let max_dim = canvas_size as f64 * fill_ratio;
    let scale = max_dim / (src_w.max(src_h) as f64);
    let new_w = ((src_w as f64 * scale + 0.5) as u32).max(1);
    let new_h = ((src_h as f64 * scale + 0.5) as u32).max(1);

    let scaled = imageops::resize(img, new_w, new_h, FilterType::CatmullRom);
    let off_x = (canvas_size.saturating_sub(new_w)) / 2;
    let off_y = (canvas_size.saturating_sub(new_h)) / 2;
    imageops::replace(&mut canvas, &scaled, i64::from(off_x), i64::from(off_y));
    canvas
}

/// 8-connected component labels over the opaque pixels. Returns the
/// label grid (-1 for transparent) and per-component pixel counts.
fn label_components(img: &RgbaImage) -> (Vec<i32>, Vec<usize>) {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut alpha = vec![false; w * h];
    for y in 0..h {
        for x in 0..w {
            alpha[y * w + x] = img.get_pixel(x as u32, y as u32)[3] > 0;
        }
    }

    let mut labels = vec![-1i32; w * h];
    let mut sizes = Vec::new();
    let mut queue = Vec::with_capacity(1024);
    for start in 0..w * h {
        if !alpha[start] || labels[start] >= 0 {
            continue;
        }
        let id = sizes.len() as i32;
        labels[start] = id;
        queue.clear();
        queue.push(start);
        let mut size = 0usize;
        while let Some(cur) = queue.pop() {
            size += 1;
            let (cx, cy) = ((cur % w) as i64, (cur / w) as i64);
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (cx + dx, cy + dy);
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let ni = ny as usize * w + nx as usize;
                    if alpha[ni] && labels[ni] < 0 {
                        labels[ni] = id;
                        queue.push(ni);
                    }
                }
            }
        }
        sizes.push(size);
    }
    (labels, sizes)
}

/// Clears disconnected pixel groups smaller than `min_ratio` of the
/// total opaque pixel count. Stray rasterization specks disappear;
/// single-component images pass through.
pub fn remove_small_clusters(img: RgbaImage, min_ratio: f64) -> RgbaImage {
    let (labels, sizes) = label_components(&img);
    if sizes.len() <= 1 {
        return img;
    }
    let total: usize = sizes.iter().sum();
    let min_size = (total as f64 * min_ratio) as usize;

    let mut out = img;
    let w = out.width() as usize;
    for (i, &label) in labels.iter().enumerate() {
        if label >= 0 && sizes[label as usize] < min_size {
            let (x, y) = ((i % w) as u32, (i / w) as u32);
            out.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    out
}

fn keep_largest_component(img: RgbaImage) -> RgbaImage {
    let (labels, sizes) = label_components(&img);
    if sizes.len() <= 1 {
        return img;
    }
    let best = sizes
        .iter()
        .enumerate()
        .max_by_key(|&(_, &s)| s)
        .map(|(i, _)| i as i32)
        .unwrap_or(0);

    let mut out = img;
    let w = out.width() as usize;
    for (i, &label) in labels.iter().enumerate() {
        if label >= 0 && label != best {
            let (x, y) = ((i % w) as u32, (i / w) as u32);
            out.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    out
}

/// Halves a supersampled render with premultiplied-alpha filtering so
/// transparent edges do not pick up dark halos. Images already at or
/// under the target pass through.
pub fn downsample(img: RgbaImage, target_size: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w <= target_size && h <= target_size {
        return img;
    }

    let mut premul = img;
    for p in premul.pixels_mut() {
        let a = p[3] as f64 / 255.0;
        for c in 0..3 {
            p[c] = (p[c] as f64 * a + 0.5) as u8;
        }
    }

    let scaled = imageops::resize(&premul, target_size, target_size, FilterType::CatmullRom);

    let mut out = scaled;
    for p in out.pixels_mut() {
        let a = p[3] as f64;
        if a > 1.0 {
            let inv = 255.0 / a;
            for c in 0..3 {
                p[c] = clamp8(p[c] as f64 * inv);
            }
        }
    }
    out
}

/// Builds a side-by-side pair from a single rendered item: isolates the
/// largest connected blob (one boot out of a bone-posed pair), mirrors
/// it and composes original and mirror with a small gap, then fits the
/// pair onto the canvas.
pub fn mirror_pair(img: RgbaImage, size: u32, fill_ratio: f64) -> RgbaImage {
    let isolated = keep_largest_component(img);
    let cropped = crop_alpha(&isolated);
    let (cw, ch) = cropped.dimensions();
    if cw == 0 || ch == 0 {
        return isolated;
    }

    let mirrored = imageops::flip_horizontal(&cropped);

    let gap = (cw / 8).max(2);
    let pair_w = cw * 2 + gap;
    let mut pair = RgbaImage::new(pair_w, ch);
    imageops::replace(&mut pair, &cropped, 0, 0);
    imageops::replace(&mut pair, &mirrored, i64::from(cw + gap), 0);

    let max_dim = size as f64 * fill_ratio;
    let scale = (max_dim / pair_w as f64).min(max_dim / ch as f64);
    let dst_w = ((pair_w as f64 * scale) as u32).max(1);
    let dst_h = ((ch as f64 * scale) as u32).max(1);

    let scaled = imageops::resize(&pair, dst_w, dst_h, FilterType::CatmullRom);
    let mut canvas = RgbaImage::new(size, size);
    let off_x = (size.saturating_sub(dst_w)) / 2;
    let off_y = (size.saturating_sub(dst_h)) / 2;
    imageops::replace(&mut canvas, &scaled, i64::from(off_x), i64::from(off_y));
    canvas
}
