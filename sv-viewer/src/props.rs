use serde::{Deserialize, Serialize};
use sv_atlas::BodyVariant;
use sv_model::AnimationKind;

/// Everything the host can set on a mounted viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerProps {
    pub skin_url: Option<String>,
    pub cape_url: Option<String>,
    pub variant: BodyVariant,
    pub width: u32,
    pub height: u32,
    pub animation: AnimationKind,
    pub animation_speed: f32,
    pub zoom: f32,
}

impl Default for ViewerProps {
    fn default() -> Self {
        Self {
            skin_url: None,
            cape_url: None,
            variant: BodyVariant::Classic,
            width: 300,
            height: 400,
            animation: AnimationKind::Idle,
            animation_speed: 1.0,
            zoom: 1.0,
        }
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().map(str::trim).filter(|url| !url.is_empty())
}

impl ViewerProps {
    /// Skin URL, with blank strings treated as absent.
    pub fn skin(&self) -> Option<&str> {
        non_empty(&self.skin_url)
    }

    /// Cape URL, with blank strings treated as absent.
    pub fn cape(&self) -> Option<&str> {
        non_empty(&self.cape_url)
    }

    /// Zoom clamped to something a camera can use.
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom.clamp(0.25, 4.0)
        } else {
            1.0
        }
    }
}

/// What the host shows around the viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerStatus {
    pub loading: bool,
    pub error: Option<String>,
}
