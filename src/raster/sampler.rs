//! Bilinear texture sampling with UV wrapping.

use image::RgbaImage;

/// Samples a texture at (u, v) with bilinear filtering. UVs wrap, so
/// coordinates outside [0, 1) tile the texture.
pub fn sample_texture(tex: &RgbaImage, u: f64, v: f64) -> [u8; 4] {
    let w = tex.width() as usize;
    let h = tex.height() as usize;
    if w == 0 || h == 0 {
        return [0; 4];
    }

    let mut u = u - u.trunc();
    if u < 0.0 {
        u += 1.0;
    }
    let mut v = v - v.trunc();
    if v < 0.0 {
        v += 1.0;
    }

    let fx = u * (w - 1) as f64;
    let fy = v * (h - 1) as f64;
    let x0 = fx as usize;
    let y0 = fy as usize;
    let x1 = (x0 + 1) % w;
    let y1 = (y0 + 1) % h;
    let dx = fx - x0 as f64;
    let dy = fy - y0 as f64;

    let stride = w * 4;
    let pix = tex.as_raw();
    let i00 = y0 * stride + x0 * 4;
    let i10 = y0 * stride + x1 * 4;
    let i01 = y1 * stride + x0 * 4;
    let i11 = y1 * stride + x1 * 4;

    let w00 = (1.0 - dx) * (1.0 - dy);
    let w10 = dx * (1.0 - dy);
    let w01 = (1.0 - dx) * dy;
    let w11 = dx * dy;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let f = pix[i00 + c] as f64 * w00
            + pix[i10 + c] as f64 * w10
            + pix[i01 + c] as f64 * w01
            + pix[i11 + c] as f64 * w11;
        out[c] = (f + 0.5) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        img
    }

    #[test]
    fn corners_sample_exact_texels() {
        let tex = checker();
        assert_eq!(sample_texture(&tex, 0.0, 0.0), [255, 0, 0, 255]);
        assert_eq!(sample_texture(&tex, 1.0 - 1e-9, 0.0)[1], 255);
    }

    #[test]
    fn midpoint_blends_texels() {
        let tex = checker();
        let c = sample_texture(&tex, 0.5, 0.0);
        assert_eq!(c[0], 128);
        assert_eq!(c[1], 128);
    }

    #[test]
    fn negative_uv_wraps() {
        let tex = checker();
        assert_eq!(sample_texture(&tex, -1.0, 0.0), sample_texture(&tex, 0.0, 0.0));
    }
}
