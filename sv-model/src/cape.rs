use bevy::math::{Quat, Vec3};
use sv_atlas::{AtlasKind, AtlasPart, CapeLayout, resolve_box};
use tracing::debug;

use crate::{CubeDef, CubeUv, MaterialKind, PX, SceneBackend, SceneHandles, cube_mesh};

/// Hinge point behind the torso, relative to the model root (vanilla coordinates; +Y is down).
pub const CAPE_PIVOT_PX: [f32; 3] = [0.0, 0.0, 2.0];

/// The cape hangs from its top edge: 10 wide, 16 tall, 1 deep.
pub const CAPE_CUBE: CubeDef = CubeDef::new([-5.0, 0.0, 0.0], [10.0, 16.0, 1.0], 0.0);

fn cape_uv(layout: CapeLayout) -> CubeUv {
    let kind = AtlasKind::Cape(layout);
    // The cape table always carries the box; a failure here means the table itself is broken.
    let resolved = resolve_box(AtlasPart::Cape, kind).unwrap_or(sv_atlas::ResolvedBox {
        part_box: sv_atlas::PartBox::new(0, 0, 10, 16, 1),
        mirrored: false,
    });
    CubeUv::new(resolved, layout.dimensions())
}

/// A single hinged cape mesh.
///
/// Starts hidden and untextured. The texture handle is borrowed from the cache and never
/// released here.
#[derive(Debug)]
pub struct CapeModel<H: SceneHandles> {
    hinge: H::Node,
    mesh_node: H::Node,
    mesh: H::Mesh,
    material: H::Material,
    layout: CapeLayout,
    texture: Option<H::Texture>,
    visible: bool,
    disposed: bool,
}

impl<H: SceneHandles> CapeModel<H> {
    pub fn build<B: SceneBackend<H>>(backend: &mut B, parent: H::Node) -> Self {
        let layout = CapeLayout::Modern;
        let hinge = backend.spawn_node(
            "CapeHinge",
            Some(parent),
            Vec3::new(CAPE_PIVOT_PX[0], -CAPE_PIVOT_PX[1], CAPE_PIVOT_PX[2]) * PX,
        );
        let mesh = backend.create_mesh(cube_mesh(&CAPE_CUBE, &cape_uv(layout)));
        let material = backend.create_material(MaterialKind::Cutout);
        let mesh_node = backend.spawn_mesh_node("CapeMesh", hinge, &mesh, &material);
        backend.set_visible(hinge, false);

        Self {
            hinge,
            mesh_node,
            mesh,
            material,
            layout,
            texture: None,
            visible: false,
            disposed: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn texture(&self) -> Option<&H::Texture> {
        self.texture.as_ref()
    }

    pub fn mesh_node(&self) -> H::Node {
        self.mesh_node
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Moves the hinge under a new parent, e.g. the root of a rebuilt player model.
    pub fn reparent<B: SceneBackend<H>>(&mut self, backend: &mut B, parent: H::Node) {
        if self.disposed {
            return;
        }
        backend.set_parent(self.hinge, parent);
    }

    /// Swaps the bound texture. Visibility is left to the caller.
    pub fn set_texture<B: SceneBackend<H>>(
        &mut self,
        backend: &mut B,
        texture: &H::Texture,
        layout: CapeLayout,
    ) {
        if self.disposed {
            return;
        }
        if layout != self.layout {
            self.layout = layout;
            backend.update_mesh_uvs(&self.mesh, cube_mesh(&CAPE_CUBE, &cape_uv(layout)).uvs);
        }
        backend.set_material_texture(&self.material, Some(texture));
        self.texture = Some(texture.clone());
    }

    pub fn clear_texture<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        if self.disposed || self.texture.is_none() {
            return;
        }
        backend.set_material_texture(&self.material, None);
        self.texture = None;
    }

    pub fn set_visible<B: SceneBackend<H>>(&mut self, backend: &mut B, visible: bool) {
        if self.disposed || self.visible == visible {
            return;
        }
        self.visible = visible;
        backend.set_visible(self.hinge, visible);
    }

    /// Swings the cape backwards by `angle` radians around its top edge.
    pub fn set_sway<B: SceneBackend<H>>(&self, backend: &mut B, angle: f32) {
        if self.disposed {
            return;
        }
        backend.set_rotation(self.hinge, Quat::from_rotation_x(-angle));
    }

    /// Releases the mesh, material and nodes. The texture stays with its owner.
    pub fn dispose<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.visible = false;
        self.texture = None;
        backend.despawn_node(self.hinge);
        backend.release_mesh(self.mesh.clone());
        backend.release_material(self.material.clone());
        debug!("disposed cape model");
    }
}

impl<H: SceneHandles> Drop for CapeModel<H> {
    fn drop(&mut self) {
        if !self.disposed {
            tracing::warn!("cape model dropped without dispose; GPU objects leaked");
        }
    }
}
