//! Decrypted BMD model data: meshes, triangles and the bone hierarchy.

mod parser;

pub use parser::parse_model;

/// One face record. `polygon` is 3 for a triangle and 4 for a quad; the
/// fourth index slot is only meaningful for quads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Triangle {
    pub polygon: u8,
    pub vertex: [i16; 4],
    pub normal: [i16; 4],
    pub texcoord: [i16; 4],
}

/// A single mesh with parallel vertex/bone-index arrays and the texture
/// path recorded in the file (backslashes already normalized).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub verts: Vec<[f32; 3]>,
    /// Per-vertex bone index, parallel to `verts`.
    pub nodes: Vec<i16>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tris: Vec<Triangle>,
    pub tex_path: String,
}

impl Mesh {
    /// Lowercased stem of the recorded texture path, without directories
    /// or extension.
    pub fn tex_stem(&self) -> String {
        let name = self.tex_path.rsplit('/').next().unwrap_or(&self.tex_path);
        let stem = name.rsplit_once('.').map_or(name, |(s, _)| s);
        stem.to_ascii_lowercase()
    }

    /// Lowercased extension of the recorded texture path.
    pub fn tex_ext(&self) -> String {
        let name = self.tex_path.rsplit('/').next().unwrap_or(&self.tex_path);
        name.rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// One bone of the skeleton with its bind pose (first key of the first
/// action). Dummy bones carry no transform.
#[derive(Debug, Clone, Default)]
pub struct Bone {
    pub parent: i32,
    pub is_dummy: bool,
    pub bind_position: [f64; 3],
    /// Euler angles in radians, XYZ order.
    pub bind_rotation: [f64; 3],
}
