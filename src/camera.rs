//! View-matrix construction and screen projection.
//!
//! Stored item rotations come from two different pipelines with different
//! conventions, so the view matrix is routed three ways on the stored Y
//! rotation: values near 270 degrees get a correction matrix on top of
//! the item rotation, values near 90 degrees fall back to a fixed view,
//! and everything else uses the plain no-flip camera.

use std::sync::LazyLock;

use glam::{DMat3, DVec3};

use crate::entry::{CameraMode, EntrySource, RenderEntry};

/// Default vertical field of view for perspective projection, degrees.
pub const DEFAULT_FOV: f64 = 75.0;

/// Pixel margin kept free around the model, per supersample unit.
pub const RENDER_MARGIN: usize = 16;

fn deg(d: f64) -> f64 {
    d.to_radians()
}

/// Converts model space (z-up) to view space (y-up).
static MODEL_FLIP: LazyLock<DMat3> = LazyLock::new(|| DMat3::from_rotation_x(deg(-90.0)));

static MIRROR_X: LazyLock<DMat3> =
    LazyLock::new(|| DMat3::from_diagonal(DVec3::new(-1.0, 1.0, 1.0)));

/// Fixed view used when the stored rotation cannot be trusted.
pub static VIEW_FALLBACK: LazyLock<DMat3> = LazyLock::new(|| {
    *MIRROR_X * DMat3::from_rotation_x(deg(-15.0)) * DMat3::from_rotation_y(deg(12.0)) * *MODEL_FLIP
});

/// The rotation most stored entries were calibrated against.
static ENTRY_DEFAULT: LazyLock<DMat3> = LazyLock::new(|| {
    DMat3::from_rotation_z(deg(15.0))
        * DMat3::from_rotation_y(deg(270.0))
        * DMat3::from_rotation_x(deg(180.0))
});

/// Maps the default stored rotation onto the fallback view, so that
/// per-item deviations from the default carry over.
pub static VIEW_CORRECTION: LazyLock<DMat3> =
    LazyLock::new(|| *VIEW_FALLBACK * ENTRY_DEFAULT.inverse());

/// Camera without the model-space flip, for entries whose rotation
/// already encodes the full orientation.
pub static VIEW_NOFLIP: LazyLock<DMat3> =
    LazyLock::new(|| *MIRROR_X * DMat3::from_rotation_x(deg(-15.0)));

/// Circular distance between two angles in degrees, in [0, 180].
pub fn angle_dist(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

fn entry_rotation(entry: &RenderEntry) -> DMat3 {
    DMat3::from_rotation_z(deg(entry.rot_z))
        * DMat3::from_rotation_y(deg(entry.rot_y))
        * DMat3::from_rotation_x(deg(entry.rot_x))
}

/// Builds the 3x3 view matrix for an entry.
pub fn view_matrix(entry: &RenderEntry) -> DMat3 {
    let rot = entry_rotation(entry);

    match entry.camera {
        CameraMode::Noflip => return *VIEW_NOFLIP * rot,
        CameraMode::Correction => return *VIEW_CORRECTION * rot,
        CameraMode::Fallback => return *VIEW_FALLBACK,
        CameraMode::Auto => {}
    }

    if angle_dist(entry.rot_y, 270.0) <= 45.0 {
        *VIEW_CORRECTION * rot
    } else if angle_dist(entry.rot_y, 90.0) <= 45.0 {
        *VIEW_FALLBACK
    } else {
        *VIEW_NOFLIP * rot
    }
}

/// True when the entry routes to the fixed fallback view.
pub fn is_fallback_path(entry: &RenderEntry) -> bool {
    match entry.camera {
        CameraMode::Fallback => true,
        CameraMode::Auto => {
            angle_dist(entry.rot_y, 90.0) <= 45.0 && angle_dist(entry.rot_y, 270.0) > 45.0
        }
        _ => false,
    }
}

/// Whether bind-pose bone transforms should be applied before rendering.
/// Binary-sourced entries were calibrated against the raw mesh, except on
/// the fallback path where the reference viewer always applied bones.
pub fn should_use_bones(entry: Option<&RenderEntry>) -> bool {
    let Some(entry) = entry else {
        return true;
    };
    if let Some(explicit) = entry.use_bones {
        return explicit;
    }
    if entry.source == EntrySource::Binary {
        return angle_dist(entry.rot_y, 90.0) <= 45.0 && angle_dist(entry.rot_y, 270.0) > 45.0;
    }
    true
}

/// Projected screen coordinates (x, y) and raw view-space depth per vertex.
pub struct Projected {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub depth: Vec<f64>,
}

/// Transforms vertices to screen space. `center` and `scale` come from the
/// whole-model bounding box so every mesh shares one frame. Perspective
/// entries get a depth-dependent scale factor derived from the field of
/// view and the model's own extent.
pub fn project_vertices(
    verts: &[[f32; 3]],
    view: &DMat3,
    center: DVec3,
    scale: f64,
    render_size: usize,
    entry: Option<&RenderEntry>,
) -> Projected {
    let n = verts.len();
    let mut out = Projected {
        x: Vec::with_capacity(n),
        y: Vec::with_capacity(n),
        depth: Vec::with_capacity(n),
    };
    let half = render_size as f64 / 2.0;

    let use_persp = entry.is_some_and(|e| e.perspective);
    let mut cam_dist = 0.0;
    let mut z_center = 0.0;
    if use_persp {
        let fov = entry
            .map(|e| if e.fov == 0.0 { DEFAULT_FOV } else { e.fov })
            .unwrap_or(DEFAULT_FOV);
        let half_fov = deg(fov / 2.0);

        let mut z_min = f64::INFINITY;
        let mut z_max = f64::NEG_INFINITY;
        let mut xy_max = 0.0f64;
        for v in verts {
            let t = *view * DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64);
            z_min = z_min.min(t.z);
            z_max = z_max.max(t.z);
            xy_max = xy_max.max((t.x - center.x).abs()).max((t.y - center.y).abs());
        }
        z_center = (z_min + z_max) / 2.0;
        cam_dist = xy_max.max(0.001) / half_fov.tan();
    }

    for v in verts {
        let mut t = *view * DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64);
        if use_persp {
            let depth = (cam_dist - (t.z - z_center)).max(0.1);
            let factor = cam_dist / depth;
            t.x *= factor;
            t.y *= factor;
        }
        out.x.push((t.x - center.x) * scale + half);
        out.y.push(-(t.y - center.y) * scale + half);
        out.depth.push(t.z);
    }
    out
}
