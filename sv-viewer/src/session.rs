use bevy::math::{Vec2, Vec3};
use sv_atlas::{CapeLayout, SkinLayout};
use sv_model::{
    AnimationState, CapeModel, PlayerModel, SceneBackend, SceneHandles, ViewportConfig,
};
use tracing::{debug, info, warn};

use crate::{
    DecodedImage, Effect, LatestRequest, LoadCompletion, LoadStatus, OrbitControls, TextureCache,
    ViewerError, ViewerProps, ViewerStatus, plan,
};

pub const FIELD_OF_VIEW_DEG: f32 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Mounted,
    Disposed,
}

/// Which slot of the session a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    Skin,
    Cape,
}

struct BoundSkin<H: SceneHandles> {
    url: String,
    texture: H::Texture,
    layout: SkinLayout,
    size: [u32; 2],
}

/// Everything that exists only while mounted.
struct Mounted<H: SceneHandles> {
    viewport: H::Viewport,
    stage: H::Node,
    controls: OrbitControls,
    player: PlayerModel<H>,
    cape: CapeModel<H>,
    skin_request: LatestRequest,
    cape_request: LatestRequest,
    skin: Option<BoundSkin<H>>,
}

enum Lifecycle<H: SceneHandles> {
    Uninitialized,
    Mounted(Box<Mounted<H>>),
    Disposed,
}

/// One mounted skin viewer: camera, controls, player, cape and animation.
///
/// Props are diffed against the last applied set and each change runs the narrowest effect
/// from the reconcile table. [`ViewerSession::dispose`] is the only teardown path and runs
/// its steps in a fixed order:
///
/// 1. stop the frame loop,
/// 2. unbind input controls,
/// 3. dispose the cape, then the player,
/// 4. despawn the stage and release the viewport.
///
/// A disposed session ignores everything.
pub struct ViewerSession<H: SceneHandles> {
    lifecycle: Lifecycle<H>,
    props: ViewerProps,
    animation: AnimationState,
    error: Option<String>,
}

impl<H: SceneHandles> ViewerSession<H> {
    pub fn new(props: ViewerProps) -> Self {
        let animation = AnimationState::new(props.animation, props.animation_speed);
        Self {
            lifecycle: Lifecycle::Uninitialized,
            props,
            animation,
            error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.lifecycle {
            Lifecycle::Uninitialized => SessionPhase::Uninitialized,
            Lifecycle::Mounted(_) => SessionPhase::Mounted,
            Lifecycle::Disposed => SessionPhase::Disposed,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.phase() == SessionPhase::Disposed
    }

    pub fn props(&self) -> &ViewerProps {
        &self.props
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn status(&self) -> ViewerStatus {
        let loading = match &self.lifecycle {
            Lifecycle::Mounted(m) => m.skin_request.is_pending() || m.cape_request.is_pending(),
            _ => false,
        };
        ViewerStatus {
            loading,
            error: self.error.clone(),
        }
    }

    pub fn player(&self) -> Option<&PlayerModel<H>> {
        self.mounted().map(|m| &m.player)
    }

    pub fn cape(&self) -> Option<&CapeModel<H>> {
        self.mounted().map(|m| &m.cape)
    }

    pub fn viewport(&self) -> Option<&H::Viewport> {
        self.mounted().map(|m| &m.viewport)
    }

    /// URL of the skin texture currently bound to the player.
    pub fn bound_skin_url(&self) -> Option<&str> {
        self.mounted()
            .and_then(|m| m.skin.as_ref())
            .map(|s| s.url.as_str())
    }

    /// Loads this session still waits for.
    pub fn pending_loads(&self) -> usize {
        self.mounted().map_or(0, |m| {
            usize::from(m.skin_request.is_pending()) + usize::from(m.cape_request.is_pending())
        })
    }

    fn mounted(&self) -> Option<&Mounted<H>> {
        match &self.lifecycle {
            Lifecycle::Mounted(m) => Some(m.as_ref()),
            _ => None,
        }
    }

    /// Creates the scene and starts the frame loop. Only valid once, from `Uninitialized`.
    pub fn mount<B: SceneBackend<H>>(&mut self, backend: &mut B, cache: &mut TextureCache<H>) {
        if !matches!(self.lifecycle, Lifecycle::Uninitialized) {
            debug!(phase = ?self.phase(), "mount ignored");
            return;
        }
        self.create_scene(backend, cache);
        info!(
            width = self.props.width,
            height = self.props.height,
            variant = %self.props.variant,
            "skin viewer mounted"
        );
    }

    fn create_scene<B: SceneBackend<H>>(&mut self, backend: &mut B, cache: &mut TextureCache<H>) {
        let viewport = backend.create_viewport(&ViewportConfig {
            width: self.props.width.max(1),
            height: self.props.height.max(1),
            fov_deg: FIELD_OF_VIEW_DEG,
        });
        backend.bind_controls(&viewport);
        let stage = backend.spawn_node("ViewerStage", None, Vec3::ZERO);
        let player = PlayerModel::build(backend, self.props.variant, Some(stage));
        let cape = CapeModel::build(backend, player.root());

        self.lifecycle = Lifecycle::Mounted(Box::new(Mounted {
            viewport: viewport.clone(),
            stage,
            controls: OrbitControls::new(self.props.effective_zoom()),
            player,
            cape,
            skin_request: LatestRequest::new(),
            cape_request: LatestRequest::new(),
            skin: None,
        }));
        self.error = None;
        self.load_skin(backend, cache);
        self.load_cape(backend, cache);
        backend.start_frames(&viewport);
    }

    /// Applies a new prop set. Before mount the props are just stored; after dispose this
    /// does nothing.
    pub fn update<B: SceneBackend<H>>(
        &mut self,
        props: ViewerProps,
        backend: &mut B,
        cache: &mut TextureCache<H>,
    ) {
        match self.lifecycle {
            Lifecycle::Disposed => return,
            Lifecycle::Uninitialized => {
                self.animation.set_kind(props.animation);
                self.animation.set_speed(props.animation_speed);
                self.props = props;
                return;
            }
            Lifecycle::Mounted(_) => {}
        }

        let effects = plan(&self.props, &props);
        self.props = props;
        for effect in effects {
            debug!(?effect, "reconciling");
            match effect {
                Effect::Remount => self.remount(backend, cache),
                Effect::RebuildPlayer => self.rebuild_player(backend),
                Effect::LoadSkin => self.load_skin(backend, cache),
                Effect::LoadCape => self.load_cape(backend, cache),
                Effect::Animate => {
                    self.animation.set_kind(self.props.animation);
                    self.animation.set_speed(self.props.animation_speed);
                }
            }
        }
    }

    fn remount<B: SceneBackend<H>>(&mut self, backend: &mut B, cache: &mut TextureCache<H>) {
        self.teardown(backend);
        self.create_scene(backend, cache);
        debug!(
            width = self.props.width,
            height = self.props.height,
            zoom = self.props.effective_zoom(),
            "skin viewer remounted"
        );
    }

    fn rebuild_player<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        let variant = self.props.variant;
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        // Park the cape on the stage so it outlives the old model's node tree.
        m.cape.reparent(backend, m.stage);
        m.player.dispose(backend);
        m.player = PlayerModel::build(backend, variant, Some(m.stage));
        m.cape.reparent(backend, m.player.root());
        if let Some(skin) = &m.skin {
            m.player
                .bind_skin(backend, &skin.texture, skin.layout, skin.size);
        }
    }

    fn load_skin<B: SceneBackend<H>>(&mut self, backend: &mut B, cache: &mut TextureCache<H>) {
        let url = self.props.skin().map(str::to_string);
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        let Some(url) = url else {
            m.skin_request.clear();
            m.skin = None;
            m.player.clear_skin(backend);
            self.error = None;
            return;
        };
        m.skin_request.begin(&url);
        match cache.request(&url) {
            LoadStatus::Pending => {}
            LoadStatus::Ready(image) => {
                m.skin_request.clear();
                self.bind_skin(&url, Ok(image), backend, cache);
            }
            LoadStatus::Failed(err) => {
                m.skin_request.clear();
                self.bind_skin(&url, Err(err), backend, cache);
            }
        }
    }

    fn load_cape<B: SceneBackend<H>>(&mut self, backend: &mut B, cache: &mut TextureCache<H>) {
        let url = self.props.cape().map(str::to_string);
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        let Some(url) = url else {
            m.cape_request.clear();
            m.cape.set_visible(backend, false);
            m.cape.clear_texture(backend);
            return;
        };
        m.cape_request.begin(&url);
        match cache.request(&url) {
            LoadStatus::Pending => {}
            LoadStatus::Ready(image) => {
                m.cape_request.clear();
                self.bind_cape(&url, Ok(image), backend, cache);
            }
            LoadStatus::Failed(err) => {
                m.cape_request.clear();
                self.bind_cape(&url, Err(err), backend, cache);
            }
        }
    }

    /// Routes a finished load to whichever slot still waits for it.
    ///
    /// Returns [`ViewerError::StaleResult`] when nothing does: the URL was superseded or
    /// cleared, the session was remounted or disposed, or the load belongs to someone else.
    /// Load and decode failures are absorbed into the status and never returned.
    pub fn handle_completion<B: SceneBackend<H>>(
        &mut self,
        completion: &LoadCompletion,
        backend: &mut B,
        cache: &mut TextureCache<H>,
    ) -> Result<TextureSlot, ViewerError> {
        let url = completion.url.as_str();
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return Err(ViewerError::stale(url));
        };
        let skin = m.skin_request.resolve(url);
        let cape = m.cape_request.resolve(url);
        if !skin && !cape {
            debug!(url, "dropping stale texture result");
            return Err(ViewerError::stale(url));
        }
        if skin {
            self.bind_skin(url, completion.result.clone(), backend, cache);
        }
        if cape {
            self.bind_cape(url, completion.result.clone(), backend, cache);
        }
        Ok(if skin { TextureSlot::Skin } else { TextureSlot::Cape })
    }

    fn bind_skin<B: SceneBackend<H>>(
        &mut self,
        url: &str,
        result: Result<DecodedImage, ViewerError>,
        backend: &mut B,
        cache: &mut TextureCache<H>,
    ) {
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        let bound = result.and_then(|image| {
            let size = [image.width(), image.height()];
            let layout = SkinLayout::detect(size[0], size[1]).map_err(|source| {
                ViewerError::UnsupportedLayout {
                    url: url.to_string(),
                    source,
                }
            })?;
            let texture = cache
                .upload(url, backend)
                .ok_or_else(|| ViewerError::load(url, "decoded image was evicted"))?;
            Ok(BoundSkin {
                url: url.to_string(),
                texture,
                layout,
                size,
            })
        });
        match bound {
            Ok(skin) => {
                m.player
                    .bind_skin(backend, &skin.texture, skin.layout, skin.size);
                debug!(url, layout = ?skin.layout, "skin bound");
                m.skin = Some(skin);
                self.error = None;
            }
            Err(err) => {
                warn!("skin unavailable, showing placeholder: {err}");
                m.skin = None;
                m.player.clear_skin(backend);
                self.error = Some(err.to_string());
            }
        }
    }

    fn bind_cape<B: SceneBackend<H>>(
        &mut self,
        url: &str,
        result: Result<DecodedImage, ViewerError>,
        backend: &mut B,
        cache: &mut TextureCache<H>,
    ) {
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        let bound = result.and_then(|image| {
            let layout = CapeLayout::detect(image.width(), image.height()).map_err(|source| {
                ViewerError::UnsupportedLayout {
                    url: url.to_string(),
                    source,
                }
            })?;
            let texture = cache
                .upload(url, backend)
                .ok_or_else(|| ViewerError::load(url, "decoded image was evicted"))?;
            Ok((texture, layout))
        });
        match bound {
            Ok((texture, layout)) => {
                m.cape.set_texture(backend, &texture, layout);
                m.cape.set_visible(backend, true);
                debug!(url, ?layout, "cape bound");
            }
            Err(err) => {
                // Most accounts have no cape; this is not worth an error banner.
                debug!("cape hidden: {err}");
                m.cape.set_visible(backend, false);
                m.cape.clear_texture(backend);
            }
        }
    }

    /// Feeds a pointer drag to the orbit controls.
    pub fn drag(&mut self, delta: Vec2) {
        if let Lifecycle::Mounted(m) = &mut self.lifecycle {
            m.controls.drag(delta);
        }
    }

    /// One frame: advance the animation by `dt` seconds, pose the models, move the camera
    /// and present.
    pub fn frame<B: SceneBackend<H>>(&mut self, dt: f32, backend: &mut B) {
        let Lifecycle::Mounted(m) = &mut self.lifecycle else {
            return;
        };
        let pose = self.animation.advance(dt);
        m.player.apply_pose(backend, &pose);
        if m.cape.is_visible() {
            m.cape.set_sway(backend, pose.cape);
        }
        let camera = m.controls.update(dt);
        backend.present(&m.viewport, &camera);
    }

    /// Tears everything down. Safe to call any number of times, including before mount.
    pub fn dispose<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        if self.is_disposed() {
            return;
        }
        let was_mounted = self.teardown(backend);
        self.lifecycle = Lifecycle::Disposed;
        if was_mounted {
            info!("skin viewer disposed");
        }
    }

    fn teardown<B: SceneBackend<H>>(&mut self, backend: &mut B) -> bool {
        let Lifecycle::Mounted(mut m) =
            std::mem::replace(&mut self.lifecycle, Lifecycle::Uninitialized)
        else {
            return false;
        };
        // The loop goes first so no queued frame can reach a released object.
        backend.stop_frames(&m.viewport);
        backend.unbind_controls(&m.viewport);
        m.skin_request.clear();
        m.cape_request.clear();
        m.cape.dispose(backend);
        m.player.dispose(backend);
        backend.despawn_node(m.stage);
        backend.release_viewport(m.viewport.clone());
        true
    }
}

impl<H: SceneHandles> Drop for ViewerSession<H> {
    fn drop(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Mounted(_)) {
            warn!("viewer session dropped while mounted; call dispose first");
        }
    }
}
