use bevy::math::{EulerRot, Quat, Vec3};
use sv_atlas::{AtlasKind, AtlasPart, BodyVariant, SkinLayout, resolve_box};
use tracing::debug;

use crate::{
    CubeDef, CubeUv, JointPose, MaterialKind, PX, PartDef, SceneBackend, SceneHandles, cube_mesh,
};
use crate::part;

// Indices of the jointed parts in `PLAYER_PARTS`. The body (1) never rotates.
pub const PLAYER_HEAD: usize = 0;
pub const PLAYER_RIGHT_ARM: usize = 2;
pub const PLAYER_LEFT_ARM: usize = 3;
pub const PLAYER_RIGHT_LEG: usize = 4;
pub const PLAYER_LEFT_LEG: usize = 5;

/// Vanilla player origin is near the shoulders. Lift by 24px so feet sit at Y=0.
pub const PLAYER_ROOT_OFFSET_PX: [f32; 3] = [0.0, 24.0, 0.0];

/// Skin layout assumed until a texture is bound.
const DEFAULT_LAYOUT: SkinLayout = SkinLayout::Modern;

pub static PLAYER_PARTS: [PartDef; 6] = [
    part! {
        name: "head",
        pivot: (0.0, 0.0, 0.0),
        base: AtlasPart::Head,
        overlay: AtlasPart::HeadOverlay,
        from: (-4.0, -8.0, -4.0),
        size: (8.0, 8.0, 8.0),
        inflate: 0.5,
    },
    part! {
        name: "body",
        pivot: (0.0, 0.0, 0.0),
        base: AtlasPart::Torso,
        overlay: AtlasPart::TorsoOverlay,
        from: (-4.0, 0.0, -2.0),
        size: (8.0, 12.0, 4.0),
        inflate: 0.25,
    },
    part! {
        name: "right_arm",
        pivot: (-5.0, 2.0, 0.0),
        base: AtlasPart::ArmRight,
        overlay: AtlasPart::ArmRightOverlay,
        from: (-3.0, -2.0, -2.0),
        size: (4.0, 12.0, 4.0),
        inflate: 0.25,
    },
    part! {
        name: "left_arm",
        pivot: (5.0, 2.0, 0.0),
        base: AtlasPart::ArmLeft,
        overlay: AtlasPart::ArmLeftOverlay,
        from: (-1.0, -2.0, -2.0),
        size: (4.0, 12.0, 4.0),
        inflate: 0.25,
    },
    part! {
        name: "right_leg",
        pivot: (-1.9, 12.0, 0.0),
        base: AtlasPart::LegRight,
        overlay: AtlasPart::LegRightOverlay,
        from: (-2.0, 0.0, -2.0),
        size: (4.0, 12.0, 4.0),
        inflate: 0.25,
    },
    part! {
        name: "left_leg",
        pivot: (1.9, 12.0, 0.0),
        base: AtlasPart::LegLeft,
        overlay: AtlasPart::LegLeftOverlay,
        from: (-2.0, 0.0, -2.0),
        size: (4.0, 12.0, 4.0),
        inflate: 0.25,
    },
];

/// Base cuboid of `def` for the given variant.
///
/// Slim arms lose one pixel on the outer side so the shoulder seam stays put.
pub fn part_cube(def: &PartDef, variant: BodyVariant) -> CubeDef {
    let mut from = def.from;
    let mut size = def.size;
    if def.base.is_arm() {
        let width = variant.arm_width() as f32;
        if def.base == AtlasPart::ArmRight {
            from[0] += size[0] - width;
        }
        size[0] = width;
    }
    CubeDef::new(from, size, 0.0)
}

fn part_uv(
    atlas_part: AtlasPart,
    variant: BodyVariant,
    layout: SkinLayout,
    tex_size: [u32; 2],
) -> Option<CubeUv> {
    let mut resolved = resolve_box(atlas_part, AtlasKind::Skin(layout)).ok()?;
    if atlas_part.is_arm() {
        resolved.part_box = resolved.part_box.with_width(variant.arm_width());
    }
    Some(CubeUv::new(resolved, tex_size))
}

#[derive(Debug)]
struct Shell<H: SceneHandles> {
    node: H::Node,
    mesh: H::Mesh,
    cube: CubeDef,
}

#[derive(Debug)]
struct PartInstance<H: SceneHandles> {
    pivot: H::Node,
    base: Shell<H>,
    overlay: Shell<H>,
}

/// The six-part player figure as it lives in the scene.
///
/// Owns its meshes, materials and nodes; never the skin texture, which belongs to the
/// texture cache.
#[derive(Debug)]
pub struct PlayerModel<H: SceneHandles> {
    variant: BodyVariant,
    layout: SkinLayout,
    tex_size: [u32; 2],
    root: H::Node,
    parts: Vec<PartInstance<H>>,
    base_material: H::Material,
    overlay_material: H::Material,
    textured: bool,
    overlays_visible: bool,
    disposed: bool,
}

impl<H: SceneHandles> PlayerModel<H> {
    pub fn build<B: SceneBackend<H>>(
        backend: &mut B,
        variant: BodyVariant,
        parent: Option<H::Node>,
    ) -> Self {
        let root = backend.spawn_node(
            "PlayerModelRoot",
            parent,
            Vec3::from_array(PLAYER_ROOT_OFFSET_PX) * PX,
        );
        let base_material = backend.create_material(MaterialKind::Opaque);
        let overlay_material = backend.create_material(MaterialKind::Cutout);
        let tex_size = DEFAULT_LAYOUT.dimensions();

        let mut parts = Vec::with_capacity(PLAYER_PARTS.len());
        for def in &PLAYER_PARTS {
            let pivot = Vec3::new(def.pivot[0] * PX, -def.pivot[1] * PX, def.pivot[2] * PX);
            let pivot = backend.spawn_node(&format!("PlayerPart[{}]", def.name), Some(root), pivot);

            let base_cube = part_cube(def, variant);
            let overlay_cube = CubeDef {
                inflate: def.overlay_inflate,
                ..base_cube
            };
            let base = spawn_shell(
                backend,
                pivot,
                &format!("PlayerMesh[{}]", def.name),
                base_cube,
                part_uv(def.base, variant, DEFAULT_LAYOUT, tex_size),
                &base_material,
            );
            let overlay = spawn_shell(
                backend,
                pivot,
                &format!("PlayerOverlay[{}]", def.name),
                overlay_cube,
                part_uv(def.overlay, variant, DEFAULT_LAYOUT, tex_size),
                &overlay_material,
            );
            // Shells stay hidden until a skin with a second layer is bound.
            backend.set_visible(overlay.node, false);
            parts.push(PartInstance {
                pivot,
                base,
                overlay,
            });
        }
        debug!(%variant, "built player model");

        Self {
            variant,
            layout: DEFAULT_LAYOUT,
            tex_size,
            root,
            parts,
            base_material,
            overlay_material,
            textured: false,
            overlays_visible: false,
            disposed: false,
        }
    }

    pub fn variant(&self) -> BodyVariant {
        self.variant
    }

    pub fn root(&self) -> H::Node {
        self.root
    }

    pub fn layout(&self) -> SkinLayout {
        self.layout
    }

    pub fn is_textured(&self) -> bool {
        self.textured
    }

    pub fn overlays_visible(&self) -> bool {
        self.overlays_visible
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Width of the right arm's base cuboid in model pixels.
    pub fn arm_width_px(&self) -> f32 {
        self.parts
            .get(PLAYER_RIGHT_ARM)
            .map(|part| part.base.cube)
            .unwrap_or_else(|| part_cube(&PLAYER_PARTS[PLAYER_RIGHT_ARM], self.variant))
            .size[0]
    }

    /// Mesh handles of every part (base then overlay), in part order.
    pub fn meshes(&self) -> impl Iterator<Item = &H::Mesh> {
        self.parts
            .iter()
            .flat_map(|part| [&part.base.mesh, &part.overlay.mesh])
    }

    /// Binds a decoded skin. UVs are rewritten in place when the layout or size changed;
    /// geometry is never touched.
    pub fn bind_skin<B: SceneBackend<H>>(
        &mut self,
        backend: &mut B,
        texture: &H::Texture,
        layout: SkinLayout,
        tex_size: [u32; 2],
    ) {
        if self.disposed {
            return;
        }
        if layout != self.layout || tex_size != self.tex_size {
            self.layout = layout;
            self.tex_size = tex_size;
            self.rewrite_uvs(backend);
        }
        backend.set_material_texture(&self.base_material, Some(texture));
        backend.set_material_texture(&self.overlay_material, Some(texture));
        self.textured = true;
        self.set_overlays_visible(backend, layout.has_overlays());
    }

    /// Drops the skin binding and falls back to the flat placeholder fill.
    pub fn clear_skin<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        if self.disposed {
            return;
        }
        backend.set_material_texture(&self.base_material, None);
        backend.set_material_texture(&self.overlay_material, None);
        self.textured = false;
        self.set_overlays_visible(backend, false);
    }

    pub fn apply_pose<B: SceneBackend<H>>(&self, backend: &mut B, pose: &JointPose) {
        if self.disposed {
            return;
        }
        let joints = [
            (PLAYER_HEAD, pose.head),
            (PLAYER_RIGHT_ARM, pose.right_arm),
            (PLAYER_LEFT_ARM, pose.left_arm),
            (PLAYER_RIGHT_LEG, pose.right_leg),
            (PLAYER_LEFT_LEG, pose.left_leg),
        ];
        for (idx, euler) in joints {
            let rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
            backend.set_rotation(self.parts[idx].pivot, rotation);
        }
    }

    /// Releases every node, mesh and material. Safe to call more than once.
    pub fn dispose<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        backend.despawn_node(self.root);
        for part in self.parts.drain(..) {
            backend.release_mesh(part.base.mesh);
            backend.release_mesh(part.overlay.mesh);
        }
        backend.release_material(self.base_material.clone());
        backend.release_material(self.overlay_material.clone());
        debug!(variant = %self.variant, "disposed player model");
    }

    fn set_overlays_visible<B: SceneBackend<H>>(&mut self, backend: &mut B, visible: bool) {
        self.overlays_visible = visible;
        for part in &self.parts {
            backend.set_visible(part.overlay.node, visible);
        }
    }

    fn rewrite_uvs<B: SceneBackend<H>>(&self, backend: &mut B) {
        for (def, part) in PLAYER_PARTS.iter().zip(&self.parts) {
            for (atlas_part, shell) in [(def.base, &part.base), (def.overlay, &part.overlay)] {
                // Parts the layout lacks keep their old coordinates; their shell is hidden.
                if let Some(uv) = part_uv(atlas_part, self.variant, self.layout, self.tex_size) {
                    backend.update_mesh_uvs(&shell.mesh, cube_mesh(&shell.cube, &uv).uvs);
                }
            }
        }
    }
}

impl<H: SceneHandles> Drop for PlayerModel<H> {
    fn drop(&mut self) {
        if !self.disposed {
            tracing::warn!("player model dropped without dispose; GPU objects leaked");
        }
    }
}

fn spawn_shell<H: SceneHandles, B: SceneBackend<H>>(
    backend: &mut B,
    parent: H::Node,
    name: &str,
    cube: CubeDef,
    uv: Option<CubeUv>,
    material: &H::Material,
) -> Shell<H> {
    // The default layout resolves every part; the fallback only guards table edits.
    let uv = uv.unwrap_or(CubeUv {
        part_box: sv_atlas::PartBox::new(0, 0, 0, 0, 0),
        mirrored: false,
        tex_size: DEFAULT_LAYOUT.dimensions(),
    });
    let mesh = backend.create_mesh(cube_mesh(&cube, &uv));
    let node = backend.spawn_mesh_node(name, parent, &mesh, material);
    Shell { node, mesh, cube }
}
