use bevy::math::Vec3;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use sv_atlas::{BoxFace, PartBox, ResolvedBox};

use crate::CubeDef;

/// One model pixel in scene units.
pub const PX: f32 = 1.0 / 16.0;

/// CPU-side triangle list, handed to the backend for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned bounds in scene units, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

impl From<MeshData> for Mesh {
    fn from(data: MeshData) -> Self {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, data.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, data.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, data.uvs);
        mesh.insert_indices(Indices::U32(data.indices));
        mesh
    }
}

/// Where a cuboid samples its six faces from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeUv {
    pub part_box: PartBox,
    /// Sample every face right-to-left and swap the east/west panels.
    pub mirrored: bool,
    /// Actual pixel size of the bound texture.
    pub tex_size: [u32; 2],
}

impl CubeUv {
    pub fn new(resolved: ResolvedBox, tex_size: [u32; 2]) -> Self {
        Self {
            part_box: resolved.part_box,
            mirrored: resolved.mirrored,
            tex_size,
        }
    }
}

pub fn cube_mesh(cube: &CubeDef, uv: &CubeUv) -> MeshData {
    let mut data = MeshData::default();
    add_cube(cube, uv, &mut data);
    data
}

fn add_cube(cube: &CubeDef, uv: &CubeUv, data: &mut MeshData) {
    let [tex_w, tex_h] = uv.tex_size;
    let [x, y, z] = cube.from;
    let [w, h, d] = cube.size;
    let inf = cube.inflate;

    // Expand by `inflate` on all sides. Y is "down" in model coordinates.
    let x1 = x - inf;
    let y1 = y - inf;
    let z1 = z - inf;
    let x2 = x + w + inf;
    let y2 = y + h + inf;
    let z2 = z + d + inf;

    // Convert to scene units (1px=1/16) and flip Y.
    let p = |xx: f32, yy: f32, zz: f32| -> [f32; 3] { [xx * PX, -yy * PX, zz * PX] };

    // Match ModelBox's 8 base vertices naming.
    let v7 = p(x1, y1, z1);
    let v0 = p(x2, y1, z1);
    let v1 = p(x2, y2, z1);
    let v2 = p(x1, y2, z1);
    let v3 = p(x1, y1, z2);
    let v4 = p(x2, y1, z2);
    let v5 = p(x2, y2, z2);
    let v6 = p(x1, y2, z2);

    // `TexturedQuad` assigns UVs to 4 vertices as:
    // 0: (u2, v1), 1: (u1, v1), 2: (u1, v2), 3: (u2, v2)
    let mirrored = uv.mirrored;
    let uv4 = |face: BoxFace| -> [[f32; 2]; 4] {
        let [mut u1, v1, mut u2, v2] = face_rect(&uv.part_box, face);
        if mirrored {
            std::mem::swap(&mut u1, &mut u2);
        }
        let to_uv = |uu: u32, vv: u32| -> [f32; 2] {
            [uu as f32 / tex_w as f32, vv as f32 / tex_h as f32]
        };
        [to_uv(u2, v1), to_uv(u1, v1), to_uv(u1, v2), to_uv(u2, v2)]
    };

    let (east, west) = if mirrored {
        (uv4(BoxFace::West), uv4(BoxFace::East))
    } else {
        (uv4(BoxFace::East), uv4(BoxFace::West))
    };

    // Quads in the exact vertex order from vanilla `ModelBox`.
    add_quad(data, [v4, v0, v1, v5], [1.0, 0.0, 0.0], east);
    add_quad(data, [v7, v3, v6, v2], [-1.0, 0.0, 0.0], west);
    add_quad(data, [v4, v3, v7, v0], [0.0, 1.0, 0.0], uv4(BoxFace::Top));
    add_quad(data, [v1, v2, v6, v5], [0.0, -1.0, 0.0], uv4(BoxFace::Bottom));
    add_quad(data, [v0, v7, v2, v1], [0.0, 0.0, -1.0], uv4(BoxFace::North));
    add_quad(data, [v3, v4, v5, v6], [0.0, 0.0, 1.0], uv4(BoxFace::South));
}

/// Face corners as `[u1, v1, u2, v2]` in texture pixels.
fn face_rect(part_box: &PartBox, face: BoxFace) -> [u32; 4] {
    let r = part_box.face(face);
    match face {
        // The bottom panel is stored upside down.
        BoxFace::Bottom => [r.x, r.bottom(), r.right(), r.y],
        _ => [r.x, r.y, r.right(), r.bottom()],
    }
}

fn add_quad(
    data: &mut MeshData,
    mut verts: [[f32; 3]; 4],
    normal: [f32; 3],
    mut uv: [[f32; 2]; 4],
) {
    // Ensure both triangles are consistently front-facing.
    let a = Vec3::from_array(verts[0]);
    let b = Vec3::from_array(verts[1]);
    let c = Vec3::from_array(verts[2]);
    let actual = (b - a).cross(c - a);
    let expected = Vec3::from_array(normal);
    if actual.dot(expected) < 0.0 {
        verts = [verts[0], verts[3], verts[2], verts[1]];
        uv = [uv[0], uv[3], uv[2], uv[1]];
    }

    let base = data.positions.len() as u32;
    for i in 0..4 {
        data.positions.push(verts[i]);
        data.normals.push(normal);
        data.uvs.push(uv[i]);
    }
    data.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_uv(mirrored: bool) -> CubeUv {
        CubeUv {
            part_box: PartBox::new(0, 0, 8, 8, 8),
            mirrored,
            tex_size: [64, 64],
        }
    }

    #[test]
    fn cube_has_six_quads() {
        let cube = CubeDef::new([-4.0, -8.0, -4.0], [8.0, 8.0, 8.0], 0.0);
        let data = cube_mesh(&cube, &head_uv(false));
        assert_eq!(data.positions.len(), 24);
        assert_eq!(data.indices.len(), 36);
        let (min, max) = data.bounds().unwrap();
        assert!((max.x - min.x - 0.5).abs() < 1e-6);
        assert!((max.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn inflate_grows_every_side() {
        let cube = CubeDef::new([-4.0, -8.0, -4.0], [8.0, 8.0, 8.0], 0.5);
        let (min, max) = cube_mesh(&cube, &head_uv(false)).bounds().unwrap();
        assert!((max.x - min.x - 9.0 * PX).abs() < 1e-6);
        assert!((max.z - min.z - 9.0 * PX).abs() < 1e-6);
    }

    #[test]
    fn mirroring_only_touches_uvs() {
        let cube = CubeDef::new([-1.0, -2.0, -2.0], [4.0, 12.0, 4.0], 0.0);
        let plain = cube_mesh(&cube, &head_uv(false));
        let mirrored = cube_mesh(&cube, &head_uv(true));
        assert_eq!(plain.positions, mirrored.positions);
        assert_eq!(plain.indices, mirrored.indices);
        assert_ne!(plain.uvs, mirrored.uvs);
    }

    #[test]
    fn uvs_are_normalized_to_the_texture() {
        let cube = CubeDef::new([-4.0, -8.0, -4.0], [8.0, 8.0, 8.0], 0.0);
        let mut uv = head_uv(false);
        uv.tex_size = [64, 32];
        let data = cube_mesh(&cube, &uv);
        assert!(data.uvs.iter().all(|[u, v]| (0.0..=1.0).contains(u) && (0.0..=1.0).contains(v)));
        // Front face spans (8,8)-(16,16): v tops out at 16/32.
        assert!(data.uvs.iter().any(|[_, v]| (*v - 0.5).abs() < 1e-6));
    }
}
