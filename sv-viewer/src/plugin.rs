use bevy::app::AppExit;
use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use sv_atlas::ThumbnailPart;

use crate::{
    BevyHandles, BevyScene, OrbitInput, SessionPhase, TextureCache, ThumbnailSlot, ViewerProps,
    ViewerSession, ViewerStatus,
};

/// The single viewer a host app drives, plus its texture cache and thumbnail slots.
#[derive(Resource)]
pub struct SkinViewer {
    session: ViewerSession<BevyHandles>,
    cache: TextureCache<BevyHandles>,
    queued: Option<ViewerProps>,
    thumbnails: Vec<ThumbnailSlot>,
}

impl SkinViewer {
    pub fn new(props: ViewerProps, cache: TextureCache<BevyHandles>) -> Self {
        Self {
            session: ViewerSession::new(props),
            cache,
            queued: None,
            thumbnails: Vec::new(),
        }
    }

    /// Latest props, including ones not applied yet.
    pub fn props(&self) -> &ViewerProps {
        self.queued.as_ref().unwrap_or_else(|| self.session.props())
    }

    /// Queues new props; they are reconciled at the start of the next frame.
    pub fn set_props(&mut self, props: ViewerProps) {
        if &props != self.props() {
            self.queued = Some(props);
        }
    }

    pub fn status(&self) -> ViewerStatus {
        self.session.status()
    }

    pub fn session(&self) -> &ViewerSession<BevyHandles> {
        &self.session
    }

    pub fn preload_capes<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.preload(urls);
    }

    /// Adds a thumbnail slot and returns its index.
    pub fn add_thumbnail(&mut self, part: ThumbnailPart, size: u32, url: Option<&str>) -> usize {
        let mut slot = ThumbnailSlot::new(part, size);
        slot.set_source(url, &mut self.cache);
        self.thumbnails.push(slot);
        self.thumbnails.len() - 1
    }

    pub fn set_thumbnail_source(&mut self, index: usize, url: Option<&str>) {
        if let Some(slot) = self.thumbnails.get_mut(index) {
            slot.set_source(url, &mut self.cache);
        }
    }

    pub fn thumbnails(&self) -> &[ThumbnailSlot] {
        &self.thumbnails
    }
}

pub struct SkinViewerPlugin;

impl Plugin for SkinViewerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (viewer_input_system, viewer_drive_system)
                .chain()
                .run_if(resource_exists::<SkinViewer>),
        )
        .add_systems(Last, viewer_shutdown_system.run_if(resource_exists::<SkinViewer>));
    }
}

/// Left-drag orbits the camera while its controls are bound.
pub fn viewer_input_system(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    bound: Query<(), With<OrbitInput>>,
    mut viewer: ResMut<SkinViewer>,
) {
    let mut delta = Vec2::ZERO;
    for ev in motion_events.read() {
        delta += ev.delta;
    }
    if !buttons.pressed(MouseButton::Left) || delta == Vec2::ZERO {
        return;
    }
    let Some(camera) = viewer.session.viewport().copied() else {
        return;
    };
    if bound.contains(camera) {
        viewer.session.drag(delta);
    }
}

/// Mounts on first run, then each frame: reconcile queued props, route finished loads and
/// render.
pub fn viewer_drive_system(world: &mut World) {
    let dt = world.resource::<Time>().delta_secs();
    world.resource_scope(|world, mut viewer: Mut<SkinViewer>| {
        let viewer = &mut *viewer;
        let mut scene = BevyScene::new(world);

        if viewer.session.phase() == SessionPhase::Uninitialized {
            viewer.session.mount(&mut scene, &mut viewer.cache);
        }
        if let Some(props) = viewer.queued.take() {
            viewer.session.update(props, &mut scene, &mut viewer.cache);
        }
        for completion in viewer.cache.tick() {
            // Stale results are expected here and carry nothing to report.
            let _ = viewer
                .session
                .handle_completion(&completion, &mut scene, &mut viewer.cache);
            for slot in &mut viewer.thumbnails {
                let _ = slot.handle_completion(&completion);
            }
        }
        viewer.session.frame(dt, &mut scene);
    });
}

/// Runs the session teardown once the app is asked to exit.
pub fn viewer_shutdown_system(world: &mut World) {
    if world.resource::<Events<AppExit>>().is_empty() {
        return;
    }
    world.resource_scope(|world, mut viewer: Mut<SkinViewer>| {
        let viewer = &mut *viewer;
        let mut scene = BevyScene::new(world);
        viewer.session.dispose(&mut scene);
        viewer.cache.release_textures(&mut scene);
    });
}
