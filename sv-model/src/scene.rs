use std::fmt;

use bevy::math::{Quat, Vec3};
use image::RgbaImage;

use crate::MeshData;

/// Handle types a scene backend hands out.
///
/// Kept separate from [`SceneBackend`] so long-lived owners (models, sessions) can name their
/// handles without borrowing whatever the backend borrows for the duration of a frame.
pub trait SceneHandles: 'static {
    type Node: Copy + Eq + fmt::Debug + Send + Sync;
    type Mesh: Clone + fmt::Debug + Send + Sync;
    type Material: Clone + fmt::Debug + Send + Sync;
    type Texture: Clone + fmt::Debug + Send + Sync;
    type Viewport: Clone + fmt::Debug + Send + Sync;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Base skin layer.
    Opaque,
    /// Overlay shells and capes: 0-alpha pixels are cut out.
    Cutout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub fov_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

/// Everything the model builders and the viewer need from a renderer.
///
/// Create/release calls are strictly paired by the callers; releasing a handle twice is a
/// caller bug.
pub trait SceneBackend<H: SceneHandles> {
    fn spawn_node(&mut self, name: &str, parent: Option<H::Node>, translation: Vec3) -> H::Node;
    /// Spawns a child node that draws `mesh` with `material`.
    fn spawn_mesh_node(
        &mut self,
        name: &str,
        parent: H::Node,
        mesh: &H::Mesh,
        material: &H::Material,
    ) -> H::Node;
    fn set_parent(&mut self, node: H::Node, parent: H::Node);
    fn set_rotation(&mut self, node: H::Node, rotation: Quat);
    fn set_visible(&mut self, node: H::Node, visible: bool);
    /// Removes `node` and all of its descendants.
    fn despawn_node(&mut self, node: H::Node);

    fn create_mesh(&mut self, data: MeshData) -> H::Mesh;
    fn update_mesh_uvs(&mut self, mesh: &H::Mesh, uvs: Vec<[f32; 2]>);
    fn release_mesh(&mut self, mesh: H::Mesh);

    fn create_material(&mut self, kind: MaterialKind) -> H::Material;
    /// `None` restores the flat placeholder fill.
    fn set_material_texture(&mut self, material: &H::Material, texture: Option<&H::Texture>);
    fn release_material(&mut self, material: H::Material);

    fn upload_texture(&mut self, label: &str, image: &RgbaImage) -> H::Texture;
    fn release_texture(&mut self, texture: H::Texture);

    fn create_viewport(&mut self, config: &ViewportConfig) -> H::Viewport;
    fn bind_controls(&mut self, viewport: &H::Viewport);
    fn unbind_controls(&mut self, viewport: &H::Viewport);
    fn start_frames(&mut self, viewport: &H::Viewport);
    fn stop_frames(&mut self, viewport: &H::Viewport);
    /// Places the camera and submits the frame.
    fn present(&mut self, viewport: &H::Viewport, camera: &CameraPose);
    fn release_viewport(&mut self, viewport: H::Viewport);
}
