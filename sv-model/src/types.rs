use sv_atlas::AtlasPart;

/// One rigid body part: a base cuboid and the slightly larger overlay shell around it.
#[derive(Debug, Clone, Copy)]
pub struct PartDef {
    pub name: &'static str,
    /// Rotation point in model pixels (vanilla coordinates; +Y is down).
    pub pivot: [f32; 3],
    pub base: AtlasPart,
    pub overlay: AtlasPart,
    /// Lower corner (x, y, z) of the base cuboid, relative to the pivot.
    pub from: [f32; 3],
    /// Dimensions (w, h, d) in model pixels at classic proportions.
    pub size: [f32; 3],
    /// How far the overlay shell sits outside the base, in model pixels.
    pub overlay_inflate: f32,
}

/// A cuboid ready for meshing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeDef {
    pub from: [f32; 3],
    pub size: [f32; 3],
    pub inflate: f32,
}

impl CubeDef {
    pub const fn new(from: [f32; 3], size: [f32; 3], inflate: f32) -> Self {
        Self {
            from,
            size,
            inflate,
        }
    }
}
