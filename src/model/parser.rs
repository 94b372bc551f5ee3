//! Binary layout parser for decrypted model payloads.
//!
//! All reads are bounds-checked; a short read yields zero (or an empty
//! string) and pins the cursor at the end of the buffer, so truncated
//! files degrade to empty geometry instead of panicking.

use crate::error::FormatError;

use super::{Bone, Mesh, Triangle};

const MAX_MESHES: u16 = 100;
const TRIANGLE_RECORD: usize = 64;

struct Reader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, off: 0 }
    }

    /// Reads a NUL-terminated string out of a fixed-width field.
    fn read_str(&mut self, n: usize) -> String {
        if self.off + n > self.data.len() {
            self.off = self.data.len();
            return String::new();
        }
        let field = &self.data[self.off..self.off + n];
        self.off += n;
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        String::from_utf8_lossy(&field[..end]).into_owned()
    }

    fn read_i16(&mut self) -> i16 {
        if self.off + 2 > self.data.len() {
            self.off = self.data.len();
            return 0;
        }
        let v = i16::from_le_bytes([self.data[self.off], self.data[self.off + 1]]);
        self.off += 2;
        v
    }

    fn read_u16(&mut self) -> u16 {
        if self.off + 2 > self.data.len() {
            self.off = self.data.len();
            return 0;
        }
        let v = u16::from_le_bytes([self.data[self.off], self.data[self.off + 1]]);
        self.off += 2;
        v
    }

    fn read_f32(&mut self) -> f32 {
        if self.off + 4 > self.data.len() {
            self.off = self.data.len();
            return 0.0;
        }
        let v = f32::from_le_bytes([
            self.data[self.off],
            self.data[self.off + 1],
            self.data[self.off + 2],
            self.data[self.off + 3],
        ]);
        self.off += 4;
        v
    }

    fn read_byte(&mut self) -> u8 {
        if self.off >= self.data.len() {
            return 0;
        }
        let b = self.data[self.off];
        self.off += 1;
        b
    }

    /// Count fields are signed on disk; corrupted negatives clamp to zero.
    fn read_count(&mut self) -> usize {
        self.read_i16().max(0) as usize
    }
}

/// Parses a decrypted model payload into meshes and bones.
pub fn parse_model(data: &[u8]) -> Result<(Vec<Mesh>, Vec<Bone>), FormatError> {
    let mut r = Reader::new(data);

    let _name = r.read_str(32);
    let mesh_count = r.read_u16();
    let bone_count = r.read_u16();
    let action_count = r.read_u16();

    if mesh_count > MAX_MESHES {
        return Err(FormatError::InvalidMeshCount(mesh_count));
    }

    let mut meshes = Vec::with_capacity(mesh_count as usize);
    for _ in 0..mesh_count {
        meshes.push(read_mesh(&mut r));
    }

    // Action table: key counts, plus skipped lock-position tracks.
    let mut action_keys = Vec::with_capacity(action_count as usize);
    for _ in 0..action_count {
        let num_keys = r.read_count();
        let lock_pos = r.read_byte() > 0;
        if lock_pos {
            r.off = (r.off + num_keys * 12).min(r.data.len());
        }
        action_keys.push(num_keys);
    }

    let mut bones = Vec::with_capacity(bone_count as usize);
    for _ in 0..bone_count {
        bones.push(read_bone(&mut r, &action_keys));
    }

    Ok((meshes, bones))
}

fn read_mesh(r: &mut Reader) -> Mesh {
    let nv = r.read_count();
    let nn = r.read_count();
    let ntc = r.read_count();
    let nt = r.read_count();
    let _texture_index = r.read_i16();

    // Vertex: node:i16, pad:i16, x/y/z:f32.
    let mut verts = Vec::with_capacity(nv);
    let mut nodes = Vec::with_capacity(nv);
    for _ in 0..nv {
        nodes.push(r.read_i16());
        let _pad = r.read_i16();
        verts.push([r.read_f32(), r.read_f32(), r.read_f32()]);
    }

    // Normal: node:i16, pad:i16, nx/ny/nz:f32, bind:i16, pad:i16.
    let mut normals = Vec::with_capacity(nn);
    for _ in 0..nn {
        let _node = r.read_i16();
        let _pad = r.read_i16();
        let n = [r.read_f32(), r.read_f32(), r.read_f32()];
        let _bind_vertex = r.read_i16();
        let _pad = r.read_i16();
        normals.push(n);
    }

    let mut uvs = Vec::with_capacity(ntc);
    for _ in 0..ntc {
        uvs.push([r.read_f32(), r.read_f32()]);
    }

    // Triangles are fixed 64-byte records with index blocks at fixed
    // offsets; the rest of the record is skipped.
    let mut tris = Vec::with_capacity(nt);
    for _ in 0..nt {
        let base = r.off;
        if base + TRIANGLE_RECORD > r.data.len() {
            break;
        }
        let mut tri = Triangle {
            polygon: r.data[base],
            ..Default::default()
        };
        for k in 0..4 {
            tri.vertex[k] = read_i16_at(r.data, base + 2 + k * 2);
            tri.normal[k] = read_i16_at(r.data, base + 10 + k * 2);
            tri.texcoord[k] = read_i16_at(r.data, base + 18 + k * 2);
        }
        tris.push(tri);
        r.off += TRIANGLE_RECORD;
    }

    let tex_path = r.read_str(32).replace('\\', "/");

    Mesh {
        verts,
        nodes,
        normals,
        uvs,
        tris,
        tex_path,
    }
}

fn read_bone(r: &mut Reader, action_keys: &[usize]) -> Bone {
    if r.read_byte() > 0 {
        return Bone {
            parent: -1,
            is_dummy: true,
            ..Default::default()
        };
    }

    let _name = r.read_str(32);
    let parent = r.read_i16() as i32;

    let mut bind_position = [0.0f64; 3];
    let mut bind_rotation = [0.0f64; 3];
    for (a, &num_keys) in action_keys.iter().enumerate() {
        if num_keys == 0 {
            continue;
        }
        for k in 0..num_keys {
            let p = [
                r.read_f32() as f64,
                r.read_f32() as f64,
                r.read_f32() as f64,
            ];
            if a == 0 && k == 0 {
                bind_position = p;
            }
        }
        for k in 0..num_keys {
            let rot = [
                r.read_f32() as f64,
                r.read_f32() as f64,
                r.read_f32() as f64,
            ];
            if a == 0 && k == 0 {
                bind_rotation = rot;
            }
        }
    }

    Bone {
        parent,
        is_dummy: false,
        bind_position,
        bind_rotation,
    }
}

fn read_i16_at(data: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([data[off], data[off + 1]])
}
