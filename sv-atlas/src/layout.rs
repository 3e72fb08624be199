use serde::{Deserialize, Serialize};

use crate::AtlasError;

/// Skin templates, keyed by their pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinLayout {
    /// 64x64, with independent left limbs and a second layer for every part.
    Modern,
    /// 64x32, pre-1.8. Left limbs reuse the right ones and there are no overlays.
    Legacy,
}

impl SkinLayout {
    pub const fn dimensions(self) -> [u32; 2] {
        match self {
            Self::Modern => [64, 64],
            Self::Legacy => [64, 32],
        }
    }

    pub fn detect(width: u32, height: u32) -> Result<Self, AtlasError> {
        match (width, height) {
            (64, 64) => Ok(Self::Modern),
            (64, 32) => Ok(Self::Legacy),
            _ => Err(AtlasError::UnsupportedLayout { width, height }),
        }
    }

    pub const fn has_overlays(self) -> bool {
        matches!(self, Self::Modern)
    }
}

/// Cape templates, keyed by their pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapeLayout {
    /// 64x32, the current template (elytra space on the right is ignored).
    Modern,
    /// 22x17, the original tightly packed template.
    Legacy,
}

impl CapeLayout {
    pub const fn dimensions(self) -> [u32; 2] {
        match self {
            Self::Modern => [64, 32],
            Self::Legacy => [22, 17],
        }
    }

    pub fn detect(width: u32, height: u32) -> Result<Self, AtlasError> {
        match (width, height) {
            (64, 32) => Ok(Self::Modern),
            (22, 17) => Ok(Self::Legacy),
            _ => Err(AtlasError::UnsupportedLayout { width, height }),
        }
    }
}

/// Accepts `width` x `height` if it matches any skin or cape template.
pub fn check_atlas_size(width: u32, height: u32) -> Result<(), AtlasError> {
    SkinLayout::detect(width, height)
        .map(|_| ())
        .or_else(|_| CapeLayout::detect(width, height).map(|_| ()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtlasKind {
    Skin(SkinLayout),
    Cape(CapeLayout),
}

impl AtlasKind {
    pub const fn dimensions(self) -> [u32; 2] {
        match self {
            Self::Skin(layout) => layout.dimensions(),
            Self::Cape(layout) => layout.dimensions(),
        }
    }
}

impl From<SkinLayout> for AtlasKind {
    fn from(layout: SkinLayout) -> Self {
        Self::Skin(layout)
    }
}

impl From<CapeLayout> for AtlasKind {
    fn from(layout: CapeLayout) -> Self {
        Self::Cape(layout)
    }
}
