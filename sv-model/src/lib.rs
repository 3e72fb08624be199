//! Player and cape models, and the procedural animation that drives them.
//!
//! Key constraints for this crate:
//! - Geometry is hardcoded as Rust static data (parts + cuboids), nothing is loaded.
//! - Texture coordinates always come from `sv_atlas`, normalized against the bound texture.
//! - Every GPU-side object goes through [`SceneBackend`] and is released by an explicit
//!   `dispose`; nothing here relies on drop order.

mod animation;
mod cape;
mod headless;
mod mesh;
mod player;
mod scene;
mod types;

pub use animation::*;
pub use cape::*;
pub use headless::*;
pub use mesh::*;
pub use player::*;
pub use scene::*;
pub use types::*;

// Small DSL macro to keep the part table readable.
#[macro_export]
macro_rules! part {
    (
        name: $name:expr,
        pivot: ($px:expr, $py:expr, $pz:expr),
        base: $base:expr,
        overlay: $overlay:expr,
        from: ($x:expr, $y:expr, $z:expr),
        size: ($w:expr, $h:expr, $d:expr),
        inflate: $inflate:expr $(,)?
    ) => {
        $crate::PartDef {
            name: $name,
            pivot: [$px as f32, $py as f32, $pz as f32],
            base: $base,
            overlay: $overlay,
            from: [$x as f32, $y as f32, $z as f32],
            size: [$w as f32, $h as f32, $d as f32],
            overlay_inflate: $inflate as f32,
        }
    };
}

#[cfg(test)]
mod tests;
