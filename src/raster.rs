//! Software rasterization target and whole-buffer compositing passes.

mod lighting;
mod sampler;
mod triangle;

pub use lighting::{aces_tonemap, LightConfig, SRGB_TO_LINEAR};
pub use sampler::sample_texture;
pub use triangle::{clamp255, rasterize_triangle, BlendMode};

use std::collections::VecDeque;

use image::RgbaImage;

/// Flat RGBA color buffer plus a per-pixel depth buffer. Depth starts at
/// negative infinity and larger values are closer to the camera.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    /// RGBA interleaved, `width * height * 4` bytes.
    pub color: Vec<u8>,
    pub depth: Vec<f64>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![0; width * height * 4],
            depth: vec![f64::NEG_INFINITY; width * height],
        }
    }

    /// Moves the color plane into an image.
    pub fn into_image(self) -> RgbaImage {
        RgbaImage::from_raw(self.width as u32, self.height as u32, self.color)
            .unwrap_or_else(|| RgbaImage::new(self.width as u32, self.height as u32))
    }
}

/// Composites `bg` under `dst` (Porter-Duff dst-over): the background only
/// shows through where the main buffer is not already opaque.
pub fn composite_under(dst: &mut FrameBuffer, bg: &FrameBuffer) {
    for (d, b) in dst.color.chunks_exact_mut(4).zip(bg.color.chunks_exact(4)) {
        if b[3] == 0 {
            continue;
        }
        let dst_a = d[3] as f64 / 255.0;
        let bg_alpha = b[3] as f64 / 255.0 * (1.0 - dst_a);
        if bg_alpha < 1.0 / 255.0 {
            continue;
        }
        for c in 0..3 {
            d[c] = clamp255(d[c] as f64 + b[c] as f64 * bg_alpha);
        }
        let new_a = (dst_a + bg_alpha * (1.0 - dst_a)).min(1.0);
        d[3] = (new_a * 255.0 + 0.5) as u8;
    }
}

/// Clears dark pixels reachable from the canvas border, then fades dark
/// pixels along the resulting content boundary.
///
/// Only border-connected darkness is background; dark pixels enclosed by
/// bright content stay. The erosion passes use twice the flood threshold
/// to catch compression fringes around the cleared region.
pub fn remove_background_dark(fb: &mut FrameBuffer, threshold: u32) {
    let size = fb.width;
    if size == 0 || fb.height != size {
        return;
    }
    let n = size * size;
    let mut visited = vec![false; n];

    let is_dark = |color: &[u8], x: usize, y: usize| -> bool {
        let i = (y * size + x) * 4;
        if color[i + 3] == 0 {
            return true;
        }
        let bright = (color[i] as u32 + color[i + 1] as u32 + color[i + 2] as u32) / 3;
        bright < threshold
    };

    let mut queue = VecDeque::with_capacity(size * 4);
    let seed = |x: usize, y: usize, visited: &mut Vec<bool>, queue: &mut VecDeque<usize>| {
        let idx = y * size + x;
        if !visited[idx] && is_dark(&fb.color, x, y) {
            visited[idx] = true;
            queue.push_back(idx);
        }
    };
    for x in 0..size {
        seed(x, 0, &mut visited, &mut queue);
        seed(x, size - 1, &mut visited, &mut queue);
    }
    for y in 1..size.saturating_sub(1) {
        seed(0, y, &mut visited, &mut queue);
        seed(size - 1, y, &mut visited, &mut queue);
    }

    const DX: [isize; 4] = [-1, 1, 0, 0];
    const DY: [isize; 4] = [0, 0, -1, 1];
    while let Some(cur) = queue.pop_front() {
        let (cx, cy) = (cur % size, cur / size);
        for d in 0..4 {
            let nx = cx as isize + DX[d];
            let ny = cy as isize + DY[d];
            if nx < 0 || nx >= size as isize || ny < 0 || ny >= size as isize {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            let idx = ny * size + nx;
            if !visited[idx] && is_dark(&fb.color, nx, ny) {
                visited[idx] = true;
                queue.push_back(idx);
            }
        }
    }

    for (idx, &hit) in visited.iter().enumerate() {
        if hit {
            fb.color[idx * 4 + 3] = 0;
        }
    }

    // Edge erosion against the cleared background.
    let edge_threshold = threshold * 2;
    for _ in 0..3 {
        let mut to_fade: Vec<(usize, u8)> = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let i = (y * size + x) * 4;
                if fb.color[i + 3] == 0 {
                    continue;
                }
                let bright =
                    (fb.color[i] as u32 + fb.color[i + 1] as u32 + fb.color[i + 2] as u32) / 3;
                if bright >= edge_threshold {
                    continue;
                }
                let touches_edge = (0..4).any(|d| {
                    let nx = x as isize + DX[d];
                    let ny = y as isize + DY[d];
                    if nx < 0 || nx >= size as isize || ny < 0 || ny >= size as isize {
                        return true;
                    }
                    fb.color[(ny as usize * size + nx as usize) * 4 + 3] == 0
                });
                if touches_edge {
                    let new_a = (fb.color[i + 3] as u32 * bright / edge_threshold) as u8;
                    to_fade.push((i, new_a));
                }
            }
        }
        if to_fade.is_empty() {
            break;
        }
        for (i, a) in to_fade {
            fb.color[i + 3] = a;
        }
    }
}
