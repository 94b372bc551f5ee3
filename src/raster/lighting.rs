//! Flat-shading light rig, sRGB conversion and ACES tone mapping.

use std::sync::LazyLock;

use glam::DVec3;

/// Precomputed lighting parameters shared by every triangle of a render.
#[derive(Debug, Clone)]
pub struct LightConfig {
    pub light_dir: DVec3,
    pub rim_dir: DVec3,
    pub view_dir: DVec3,
    /// Blinn-Phong half vector between the main light and the viewer.
    pub half_main: DVec3,
    pub ambient: f64,
    pub hemi: f64,
    pub direct: f64,
    pub rim: f64,
    pub spec_int: f64,
    pub spec_pow: f64,
    pub exposure: f64,
    pub inv_gamma: f64,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light_dir = DVec3::new(180.0, 260.0, 140.0).normalize();
        let rim_dir = DVec3::new(-160.0, 130.0, -210.0).normalize();
        let view_dir = DVec3::new(0.0, -110.0, -400.0).normalize();
        Self {
            light_dir,
            rim_dir,
            view_dir,
            half_main: (light_dir - view_dir).normalize(),
            ambient: 0.55,
            hemi: 0.50,
            direct: 1.50,
            rim: 0.60,
            spec_int: 0.45,
            spec_pow: 12.0,
            exposure: 1.05,
            inv_gamma: 1.0 / 2.2,
        }
    }
}

impl LightConfig {
    /// Combined lighting scalar for a unit face normal. Lambertian terms
    /// use the absolute dot product so back faces light the same way.
    pub fn shade(&self, normal: DVec3) -> f64 {
        let ndl_main = normal.dot(self.light_dir).abs();
        let ndl_rim = normal.dot(self.rim_dir).abs();
        let hemi = (1.0 - normal.y.abs()) * 0.5 + 0.5;
        let ndh = normal.dot(self.half_main).max(0.0);
        let spec = ndh.powf(self.spec_pow) * self.spec_int;
        self.ambient + hemi * self.hemi + ndl_main * self.direct + ndl_rim * self.rim + spec
    }
}

/// sRGB byte to linear intensity, gamma 2.2.
pub static SRGB_TO_LINEAR: LazyLock<[f64; 256]> = LazyLock::new(|| {
    let mut lut = [0.0; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = (i as f64 / 255.0).powf(2.2);
    }
    lut
});

/// ACES filmic tone mapping of a linear value.
pub fn aces_tonemap(x: f64) -> f64 {
    (x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)
}
