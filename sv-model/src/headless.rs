use std::collections::HashMap;

use bevy::math::{Quat, Vec3};
use image::RgbaImage;
use tracing::warn;

use crate::{CameraPose, MaterialKind, MeshData, SceneBackend, SceneHandles, ViewportConfig};

/// Opaque id handed out by [`HeadlessScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessId(pub u64);

#[derive(Debug, Clone)]
pub struct HeadlessNode {
    pub name: String,
    pub parent: Option<HeadlessId>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub visible: bool,
    pub mesh: Option<HeadlessId>,
    pub material: Option<HeadlessId>,
}

#[derive(Debug, Clone)]
pub struct HeadlessMaterial {
    pub kind: MaterialKind,
    pub texture: Option<HeadlessId>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessViewport {
    pub config: Option<ViewportConfig>,
    pub controls_bound: bool,
    pub frames_running: bool,
    pub presented: u64,
    pub camera: Option<CameraPose>,
}

/// Number of objects alive in a [`HeadlessScene`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveCounts {
    pub nodes: usize,
    pub meshes: usize,
    pub materials: usize,
    pub textures: usize,
    pub viewports: usize,
    pub controls: usize,
    pub frame_loops: usize,
}

impl LiveCounts {
    pub fn total(&self) -> usize {
        self.nodes
            + self.meshes
            + self.materials
            + self.textures
            + self.viewports
            + self.controls
            + self.frame_loops
    }
}

/// In-memory scene used by tests and tools that never open a window.
///
/// Every create/release is tracked, so leaks and double releases show up as numbers instead
/// of driver crashes.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_id: u64,
    nodes: HashMap<HeadlessId, HeadlessNode>,
    meshes: HashMap<HeadlessId, MeshData>,
    materials: HashMap<HeadlessId, HeadlessMaterial>,
    textures: HashMap<HeadlessId, [u32; 2]>,
    viewports: HashMap<HeadlessId, HeadlessViewport>,
    invalid_releases: usize,
    uploads: usize,
}

impl SceneHandles for HeadlessScene {
    type Node = HeadlessId;
    type Mesh = HeadlessId;
    type Material = HeadlessId;
    type Texture = HeadlessId;
    type Viewport = HeadlessId;
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> HeadlessId {
        self.next_id += 1;
        HeadlessId(self.next_id)
    }

    fn invalid(&mut self, what: &str, id: HeadlessId) {
        warn!(?id, "{what}: handle is not alive");
        self.invalid_releases += 1;
    }

    pub fn live_resources(&self) -> LiveCounts {
        LiveCounts {
            nodes: self.nodes.len(),
            meshes: self.meshes.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
            viewports: self.viewports.len(),
            controls: self.viewports.values().filter(|v| v.controls_bound).count(),
            frame_loops: self.viewports.values().filter(|v| v.frames_running).count(),
        }
    }

    /// Releases, despawns, unbinds and presents that hit a handle which was not alive.
    pub fn invalid_releases(&self) -> usize {
        self.invalid_releases
    }

    /// Total texture uploads over the scene's lifetime.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn node(&self, id: HeadlessId) -> Option<&HeadlessNode> {
        self.nodes.get(&id)
    }

    pub fn mesh(&self, id: HeadlessId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    pub fn material(&self, id: HeadlessId) -> Option<&HeadlessMaterial> {
        self.materials.get(&id)
    }

    pub fn texture_size(&self, id: HeadlessId) -> Option<[u32; 2]> {
        self.textures.get(&id).copied()
    }

    pub fn viewport(&self, id: HeadlessId) -> Option<&HeadlessViewport> {
        self.viewports.get(&id)
    }

    /// True when the node and all of its ancestors are visible.
    pub fn is_effectively_visible(&self, id: HeadlessId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) if node.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn children(&self, id: HeadlessId) -> Vec<HeadlessId> {
        let mut out: Vec<_> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        out.sort();
        out
    }

    /// Material of the first mesh node named `name`.
    pub fn material_of(&self, name: &str) -> Option<&HeadlessMaterial> {
        let material = self.nodes.values().find(|n| n.name == name)?.material?;
        self.materials.get(&material)
    }

    pub fn find_node(&self, name: &str) -> Option<HeadlessId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }
}

impl SceneBackend<HeadlessScene> for HeadlessScene {
    fn spawn_node(
        &mut self,
        name: &str,
        parent: Option<HeadlessId>,
        translation: Vec3,
    ) -> HeadlessId {
        let id = self.alloc();
        self.nodes.insert(
            id,
            HeadlessNode {
                name: name.to_string(),
                parent,
                translation,
                rotation: Quat::IDENTITY,
                visible: true,
                mesh: None,
                material: None,
            },
        );
        id
    }

    fn spawn_mesh_node(
        &mut self,
        name: &str,
        parent: HeadlessId,
        mesh: &HeadlessId,
        material: &HeadlessId,
    ) -> HeadlessId {
        let id = self.spawn_node(name, Some(parent), Vec3::ZERO);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.mesh = Some(*mesh);
            node.material = Some(*material);
        }
        id
    }

    fn set_parent(&mut self, node: HeadlessId, parent: HeadlessId) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.parent = Some(parent);
        }
    }

    fn set_rotation(&mut self, node: HeadlessId, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.rotation = rotation;
        }
    }

    fn set_visible(&mut self, node: HeadlessId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.visible = visible;
        }
    }

    fn despawn_node(&mut self, node: HeadlessId) {
        if !self.nodes.contains_key(&node) {
            self.invalid("despawn_node", node);
            return;
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.nodes.remove(&current);
        }
    }

    fn create_mesh(&mut self, data: MeshData) -> HeadlessId {
        let id = self.alloc();
        self.meshes.insert(id, data);
        id
    }

    fn update_mesh_uvs(&mut self, mesh: &HeadlessId, uvs: Vec<[f32; 2]>) {
        if let Some(data) = self.meshes.get_mut(mesh) {
            data.uvs = uvs;
        }
    }

    fn release_mesh(&mut self, mesh: HeadlessId) {
        if self.meshes.remove(&mesh).is_none() {
            self.invalid("release_mesh", mesh);
        }
    }

    fn create_material(&mut self, kind: MaterialKind) -> HeadlessId {
        let id = self.alloc();
        self.materials.insert(id, HeadlessMaterial { kind, texture: None });
        id
    }

    fn set_material_texture(&mut self, material: &HeadlessId, texture: Option<&HeadlessId>) {
        if let Some(material) = self.materials.get_mut(material) {
            material.texture = texture.copied();
        }
    }

    fn release_material(&mut self, material: HeadlessId) {
        if self.materials.remove(&material).is_none() {
            self.invalid("release_material", material);
        }
    }

    fn upload_texture(&mut self, _label: &str, image: &RgbaImage) -> HeadlessId {
        let id = self.alloc();
        self.uploads += 1;
        self.textures.insert(id, [image.width(), image.height()]);
        id
    }

    fn release_texture(&mut self, texture: HeadlessId) {
        if self.textures.remove(&texture).is_none() {
            self.invalid("release_texture", texture);
        }
    }

    fn create_viewport(&mut self, config: &ViewportConfig) -> HeadlessId {
        let id = self.alloc();
        self.viewports.insert(
            id,
            HeadlessViewport {
                config: Some(*config),
                ..Default::default()
            },
        );
        id
    }

    fn bind_controls(&mut self, viewport: &HeadlessId) {
        if let Some(v) = self.viewports.get_mut(viewport) {
            v.controls_bound = true;
        }
    }

    fn unbind_controls(&mut self, viewport: &HeadlessId) {
        let was_bound = self
            .viewports
            .get_mut(viewport)
            .map(|v| std::mem::replace(&mut v.controls_bound, false));
        if was_bound != Some(true) {
            self.invalid("unbind_controls", *viewport);
        }
    }

    fn start_frames(&mut self, viewport: &HeadlessId) {
        if let Some(v) = self.viewports.get_mut(viewport) {
            v.frames_running = true;
        }
    }

    fn stop_frames(&mut self, viewport: &HeadlessId) {
        let was_running = self
            .viewports
            .get_mut(viewport)
            .map(|v| std::mem::replace(&mut v.frames_running, false));
        if was_running != Some(true) {
            self.invalid("stop_frames", *viewport);
        }
    }

    fn present(&mut self, viewport: &HeadlessId, camera: &CameraPose) {
        let Some(v) = self.viewports.get_mut(viewport) else {
            return;
        };
        if v.frames_running {
            v.presented += 1;
            v.camera = Some(*camera);
        } else {
            self.invalid("present", *viewport);
        }
    }

    fn release_viewport(&mut self, viewport: HeadlessId) {
        if self.viewports.remove(&viewport).is_none() {
            self.invalid("release_viewport", viewport);
        }
    }
}
