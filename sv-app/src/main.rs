mod cli;
mod config;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::{EguiPlugin, PrimaryEguiContext};
use clap::Parser;
use sv_atlas::ThumbnailPart;
use sv_viewer::{SkinViewer, SkinViewerPlugin, TextureCache, UrlFetcher};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::ui::ViewerUiPlugin;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().load_config()?;
    info!(
        skin = config.viewer.skin(),
        cape = config.viewer.cape(),
        variant = %config.viewer.variant,
        "Starting skin viewer"
    );

    let fetcher = UrlFetcher::new(config.origin.clone())?;
    let cache = TextureCache::spawn(Arc::new(fetcher), config.workers);
    let mut viewer = SkinViewer::new(config.viewer.clone(), cache);
    viewer.preload_capes(&config.preload_capes);

    let size = config.thumbnail_size;
    viewer.add_thumbnail(ThumbnailPart::Head, size, config.viewer.skin());
    viewer.add_thumbnail(ThumbnailPart::CapeFront, size, config.viewer.cape());
    for url in &config.preload_capes {
        viewer.add_thumbnail(ThumbnailPart::CapeFront, size, Some(url));
    }

    let window = Window {
        title: "Skin Viewer".to_string(),
        resolution: (config.viewer.width as f32 + 300.0, config.viewer.height.max(480) as f32)
            .into(),
        ..default()
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(window),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .add_plugins(EguiPlugin::default())
        .insert_resource(ClearColor(Color::srgb(0.11, 0.11, 0.13)))
        .insert_resource(viewer)
        .add_plugins((SkinViewerPlugin, ViewerUiPlugin))
        .add_systems(Startup, spawn_ui_camera)
        .run();
    Ok(())
}

/// Full-window camera that clears the frame and carries the egui panel. The viewer camera
/// draws its own viewport on top.
fn spawn_ui_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("UiCamera"),
        Camera2d,
        Camera {
            order: -1,
            ..default()
        },
        PrimaryEguiContext,
    ));
}
