//! Texture loading, prop reconciliation and the mounted viewer session.
//!
//! The session is written against `sv_model::SceneBackend`, so everything up to the GPU
//! boundary runs the same under the headless backend (tests) and the bevy backend (the app).
//! Texture loads happen on worker threads; their results are routed back on the frame thread
//! through [`TextureCache::tick`], which keeps every scene mutation single-threaded.

mod bevy_scene;
mod cache;
mod controls;
mod error;
mod fetch;
mod latest;
mod plugin;
mod props;
mod reconcile;
mod session;
mod thumbnail;

pub use bevy_scene::*;
pub use cache::*;
pub use controls::*;
pub use error::*;
pub use fetch::*;
pub use latest::*;
pub use plugin::*;
pub use props::*;
pub use reconcile::*;
pub use session::*;
pub use thumbnail::*;
