use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sv_viewer::ViewerProps;

/// Public skin endpoint keyed by undashed player UUID.
pub const PLAYER_SKIN_ENDPOINT: &str = "https://mc-heads.net/skin/";
/// Public cape endpoint. Players without a cape get a 404, which the viewer shows as no cape.
pub const PLAYER_CAPE_ENDPOINT: &str = "https://mc-heads.net/cape/";

/// Contents of the optional `--config` TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial viewer props.
    pub viewer: ViewerProps,
    /// Capes fetched at startup so switching to them is instant.
    pub preload_capes: Vec<String>,
    /// Loader worker threads.
    pub workers: usize,
    /// Thumbnail height in pixels.
    pub thumbnail_size: u32,
    /// Sent as the `Origin` of network image requests.
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewer: ViewerProps::default(),
            preload_capes: Vec::new(),
            workers: 4,
            thumbnail_size: 48,
            origin: "http://localhost".to_string(),
        }
    }
}

pub fn load(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse(text: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(text)?;
    if config.workers == 0 {
        bail!("workers must be at least 1");
    }
    Ok(config)
}

/// Undashed lowercase form of a player UUID.
fn player_id(uuid: &str) -> Result<String> {
    let id: String = uuid.trim().chars().filter(|c| *c != '-').collect();
    if id.len() != 32 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("not a player uuid: {uuid:?}");
    }
    Ok(id.to_ascii_lowercase())
}

/// Skin URL for a player UUID, dashed or not.
pub fn player_skin_url(uuid: &str) -> Result<String> {
    Ok(format!("{PLAYER_SKIN_ENDPOINT}{}", player_id(uuid)?))
}

/// Cape URL for a player UUID, dashed or not.
pub fn player_cape_url(uuid: &str) -> Result<String> {
    Ok(format!("{PLAYER_CAPE_ENDPOINT}{}", player_id(uuid)?))
}

#[cfg(test)]
mod tests {
    use sv_atlas::BodyVariant;
    use sv_model::AnimationKind;

    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn viewer_table_overrides_props() {
        let config = parse(
            r#"
            workers = 2
            preload_capes = ["https://example.com/a.png", "asset://localhost/capes/b.png"]

            [viewer]
            skin_url = "https://example.com/skin.png"
            variant = "slim"
            animation = "walk"
            animation_speed = 1.5
            width = 640
            "#,
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.preload_capes.len(), 2);
        assert_eq!(config.viewer.skin(), Some("https://example.com/skin.png"));
        assert_eq!(config.viewer.variant, BodyVariant::Slim);
        assert_eq!(config.viewer.animation, AnimationKind::Walk);
        assert_eq!(config.viewer.width, 640);
        assert_eq!(config.viewer.height, ViewerProps::default().height);
        assert_eq!(config.thumbnail_size, 48);
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(parse("workers = 0").is_err());
        assert!(parse("[viewer]\nvariant = \"wide\"").is_err());
    }

    #[test]
    fn player_uuid_resolves_to_skin_and_cape_urls() {
        assert_eq!(
            player_skin_url("069A79F4-44E9-4726-A5BE-FCA90E38AAF5").unwrap(),
            "https://mc-heads.net/skin/069a79f444e94726a5befca90e38aaf5"
        );
        assert_eq!(
            player_cape_url("069a79f444e94726a5befca90e38aaf5").unwrap(),
            "https://mc-heads.net/cape/069a79f444e94726a5befca90e38aaf5"
        );
        assert!(player_skin_url("notch").is_err());
        assert!(player_cape_url("notch").is_err());
        assert!(player_skin_url("069a79f444e94726a5befca90e38aaf").is_err());
    }
}
