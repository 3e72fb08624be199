use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use sv_atlas::BodyVariant;
use sv_model::AnimationKind;

use crate::config::{self, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "sv-app")]
#[command(version, about = "Interactive 3D viewer for Minecraft skins and capes")]
pub struct Args {
    /// Skin image URL (http, https, file:// or asset://localhost/)
    #[arg(long)]
    pub skin: Option<String>,

    /// Cape image URL
    #[arg(long)]
    pub cape: Option<String>,

    /// Load the public skin and cape of this player UUID where --skin / --cape are not given
    #[arg(long, value_name = "UUID")]
    pub player: Option<String>,

    /// Body variant: classic (steve) or slim (alex)
    #[arg(long)]
    pub variant: Option<BodyVariant>,

    /// Animation: idle or walk
    #[arg(long)]
    pub animation: Option<AnimationKind>,

    /// Animation speed multiplier
    #[arg(long)]
    pub speed: Option<f32>,

    #[arg(long)]
    pub zoom: Option<f32>,

    /// Viewport width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Loader worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// TOML config file; flags override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => config::load(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        let props = &mut config.viewer;
        if let Some(skin) = &self.skin {
            props.skin_url = Some(skin.clone());
        } else if let Some(uuid) = &self.player {
            props.skin_url = Some(config::player_skin_url(uuid)?);
        }
        if let Some(cape) = &self.cape {
            props.cape_url = Some(cape.clone());
        } else if let Some(uuid) = self.player.as_ref().filter(|_| props.cape().is_none()) {
            props.cape_url = Some(config::player_cape_url(uuid)?);
        }
        if let Some(variant) = self.variant {
            props.variant = variant;
        }
        if let Some(animation) = self.animation {
            props.animation = animation;
        }
        if let Some(speed) = self.speed {
            props.animation_speed = speed;
        }
        if let Some(zoom) = self.zoom {
            props.zoom = zoom;
        }
        if let Some(width) = self.width {
            props.width = width;
        }
        if let Some(height) = self.height {
            props.height = height;
        }
        if let Some(workers) = self.workers {
            config.workers = workers.max(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sv-app").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = args(&["--variant", "Alex", "--animation", "WALK", "--width", "500"])
            .load_config()
            .unwrap();
        assert_eq!(config.viewer.variant, BodyVariant::Slim);
        assert_eq!(config.viewer.animation, AnimationKind::Walk);
        assert_eq!(config.viewer.width, 500);
        assert_eq!(config.viewer.skin_url, None);
    }

    #[test]
    fn explicit_skin_beats_player() {
        let config = args(&[
            "--player",
            "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "--skin",
            "file:///tmp/me.png",
        ])
        .load_config()
        .unwrap();
        assert_eq!(config.viewer.skin(), Some("file:///tmp/me.png"));

        let config = args(&["--player", "069a79f4-44e9-4726-a5be-fca90e38aaf5"])
            .load_config()
            .unwrap();
        assert_eq!(
            config.viewer.skin(),
            Some("https://mc-heads.net/skin/069a79f444e94726a5befca90e38aaf5")
        );
        assert_eq!(
            config.viewer.cape(),
            Some("https://mc-heads.net/cape/069a79f444e94726a5befca90e38aaf5")
        );
    }

    #[test]
    fn explicit_cape_beats_player() {
        let config = args(&[
            "--player",
            "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "--cape",
            "asset://localhost/capes/migrator.png",
        ])
        .load_config()
        .unwrap();
        assert_eq!(config.viewer.cape(), Some("asset://localhost/capes/migrator.png"));
        assert_eq!(
            config.viewer.skin(),
            Some("https://mc-heads.net/skin/069a79f444e94726a5befca90e38aaf5")
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Args::try_parse_from(["sv-app", "--variant", "wide"]).is_err());
        assert!(args(&["--player", "nobody"]).load_config().is_err());
        assert_eq!(args(&["--workers", "0"]).load_config().unwrap().workers, 1);
    }
}
