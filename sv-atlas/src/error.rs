use crate::{AtlasKind, AtlasPart};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    /// The decoded image has dimensions that match no known skin or cape template.
    #[error("unsupported atlas layout: {width}x{height}")]
    UnsupportedLayout { width: u32, height: u32 },
    /// The layout is known but carries no pixels for this part (legacy overlays).
    #[error("{part:?} has no region in the {kind:?} layout")]
    MissingRegion { part: AtlasPart, kind: AtlasKind },
    /// Asking a skin layout for a cape part or the other way around.
    #[error("{part:?} does not belong to a {kind:?} atlas")]
    PartMismatch { part: AtlasPart, kind: AtlasKind },
}
