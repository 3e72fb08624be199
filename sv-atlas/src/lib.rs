//! Skin and cape atlas conventions.
//!
//! Everything in here is pure pixel bookkeeping:
//! - which image sizes are accepted as a skin or a cape,
//! - where each body part lives inside the atlas,
//! - how the flat head / cape previews are cut out of a decoded image.
//!
//! No GPU or I/O. The mesh builder and the loader both sit on top of this crate.

mod error;
mod layout;
mod region;
mod thumbnail;
mod variant;

pub use error::*;
pub use layout::*;
pub use region::*;
pub use thumbnail::*;
pub use variant::*;
