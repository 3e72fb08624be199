use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::camera::Viewport;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, Face, TextureDimension, TextureFormat};
use image::RgbaImage;
use sv_model::{
    CameraPose, MaterialKind, MeshData, SceneBackend, SceneHandles, ViewportConfig,
};
use tracing::warn;

/// Base color of untextured materials.
pub const PLACEHOLDER_COLOR: Color = Color::srgb(0.235, 0.235, 0.267);

/// Handle types of the bevy renderer. The viewport is its camera entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BevyHandles;

impl SceneHandles for BevyHandles {
    type Node = Entity;
    type Mesh = Handle<Mesh>;
    type Material = Handle<StandardMaterial>;
    type Texture = Handle<Image>;
    type Viewport = Entity;
}

/// Marks a viewer camera that accepts orbit drags.
#[derive(Component, Debug, Default)]
pub struct OrbitInput;

/// Marks a viewer camera whose frame loop is running.
#[derive(Component, Debug, Default)]
pub struct FrameLoop;

#[derive(Component, Debug)]
pub struct ViewerCamera;

/// [`SceneBackend`] over a borrowed bevy world. Built fresh inside each exclusive system.
pub struct BevyScene<'w> {
    world: &'w mut World,
}

impl<'w> BevyScene<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    fn despawn(&mut self, entity: Entity) {
        if !self.world.despawn(entity) {
            warn!(?entity, "despawn of missing entity");
        }
    }
}

fn rgba_to_image(rgba: &RgbaImage) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: rgba.width(),
            height: rgba.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.data = Some(rgba.as_raw().clone());

    // Skin art is pixel art: no filtering, no wrap bleeding at atlas edges.
    let mut sampler = ImageSamplerDescriptor::nearest();
    sampler.address_mode_u = ImageAddressMode::ClampToEdge;
    sampler.address_mode_v = ImageAddressMode::ClampToEdge;
    sampler.address_mode_w = ImageAddressMode::ClampToEdge;
    image.sampler = ImageSampler::Descriptor(sampler);
    image
}

impl SceneBackend<BevyHandles> for BevyScene<'_> {
    fn spawn_node(&mut self, name: &str, parent: Option<Entity>, translation: Vec3) -> Entity {
        let entity = self
            .world
            .spawn((
                Name::new(name.to_string()),
                Transform::from_translation(translation),
                Visibility::Inherited,
            ))
            .id();
        if let Some(parent) = parent {
            self.world.entity_mut(parent).add_child(entity);
        }
        entity
    }

    fn spawn_mesh_node(
        &mut self,
        name: &str,
        parent: Entity,
        mesh: &Handle<Mesh>,
        material: &Handle<StandardMaterial>,
    ) -> Entity {
        let entity = self
            .world
            .spawn((
                Name::new(name.to_string()),
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                Visibility::Inherited,
            ))
            .id();
        self.world.entity_mut(parent).add_child(entity);
        entity
    }

    fn set_parent(&mut self, node: Entity, parent: Entity) {
        if let Ok(mut parent) = self.world.get_entity_mut(parent) {
            parent.add_child(node);
        }
    }

    fn set_rotation(&mut self, node: Entity, rotation: Quat) {
        if let Some(mut transform) = self.world.get_mut::<Transform>(node) {
            transform.rotation = rotation;
        }
    }

    fn set_visible(&mut self, node: Entity, visible: bool) {
        if let Some(mut visibility) = self.world.get_mut::<Visibility>(node) {
            *visibility = if visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
    }

    fn despawn_node(&mut self, node: Entity) {
        self.despawn(node);
    }

    fn create_mesh(&mut self, data: MeshData) -> Handle<Mesh> {
        self.world.resource_mut::<Assets<Mesh>>().add(Mesh::from(data))
    }

    fn update_mesh_uvs(&mut self, mesh: &Handle<Mesh>, uvs: Vec<[f32; 2]>) {
        if let Some(mesh) = self.world.resource_mut::<Assets<Mesh>>().get_mut(mesh) {
            mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        }
    }

    fn release_mesh(&mut self, mesh: Handle<Mesh>) {
        self.world.resource_mut::<Assets<Mesh>>().remove(&mesh);
    }

    fn create_material(&mut self, kind: MaterialKind) -> Handle<StandardMaterial> {
        // Overlay and cape pixels with 0 alpha are holes; the faces behind them must draw.
        let (alpha_mode, cull_mode) = match kind {
            MaterialKind::Opaque => (AlphaMode::Opaque, Some(Face::Back)),
            MaterialKind::Cutout => (AlphaMode::Mask(0.5), None),
        };
        self.world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                base_color: PLACEHOLDER_COLOR,
                alpha_mode,
                unlit: true,
                perceptual_roughness: 1.0,
                metallic: 0.0,
                double_sided: cull_mode.is_none(),
                cull_mode,
                ..Default::default()
            })
    }

    fn set_material_texture(
        &mut self,
        material: &Handle<StandardMaterial>,
        texture: Option<&Handle<Image>>,
    ) {
        let mut materials = self.world.resource_mut::<Assets<StandardMaterial>>();
        let Some(material) = materials.get_mut(material) else {
            return;
        };
        material.base_color_texture = texture.cloned();
        material.base_color = if texture.is_some() {
            Color::WHITE
        } else {
            PLACEHOLDER_COLOR
        };
    }

    fn release_material(&mut self, material: Handle<StandardMaterial>) {
        self.world
            .resource_mut::<Assets<StandardMaterial>>()
            .remove(&material);
    }

    fn upload_texture(&mut self, _label: &str, image: &RgbaImage) -> Handle<Image> {
        self.world
            .resource_mut::<Assets<Image>>()
            .add(rgba_to_image(image))
    }

    fn release_texture(&mut self, texture: Handle<Image>) {
        self.world.resource_mut::<Assets<Image>>().remove(&texture);
    }

    fn create_viewport(&mut self, config: &ViewportConfig) -> Entity {
        self.world
            .spawn((
                Name::new("SkinViewerCamera"),
                ViewerCamera,
                Camera3d::default(),
                Camera {
                    is_active: false,
                    viewport: Some(Viewport {
                        physical_position: UVec2::ZERO,
                        physical_size: UVec2::new(config.width, config.height),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Projection::Perspective(PerspectiveProjection {
                    fov: config.fov_deg.to_radians(),
                    ..Default::default()
                }),
                Transform::default(),
            ))
            .id()
    }

    fn bind_controls(&mut self, viewport: &Entity) {
        if let Ok(mut camera) = self.world.get_entity_mut(*viewport) {
            camera.insert(OrbitInput);
        }
    }

    fn unbind_controls(&mut self, viewport: &Entity) {
        if let Ok(mut camera) = self.world.get_entity_mut(*viewport) {
            camera.remove::<OrbitInput>();
        }
    }

    fn start_frames(&mut self, viewport: &Entity) {
        if let Ok(mut camera) = self.world.get_entity_mut(*viewport) {
            camera.insert(FrameLoop);
            if let Some(mut cam) = camera.get_mut::<Camera>() {
                cam.is_active = true;
            }
        }
    }

    fn stop_frames(&mut self, viewport: &Entity) {
        if let Ok(mut camera) = self.world.get_entity_mut(*viewport) {
            camera.remove::<FrameLoop>();
            if let Some(mut cam) = camera.get_mut::<Camera>() {
                cam.is_active = false;
            }
        }
    }

    fn present(&mut self, viewport: &Entity, pose: &CameraPose) {
        let running = self.world.get::<FrameLoop>(*viewport).is_some();
        if !running {
            return;
        }
        if let Some(mut transform) = self.world.get_mut::<Transform>(*viewport) {
            *transform = Transform::from_translation(pose.eye).looking_at(pose.target, Vec3::Y);
        }
    }

    fn release_viewport(&mut self, viewport: Entity) {
        self.despawn(viewport);
    }
}
