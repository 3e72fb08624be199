use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use sv_atlas::{BodyVariant, Thumbnail};
use sv_model::AnimationKind;
use sv_viewer::SkinViewer;

const PANEL_WIDTH: f32 = 280.0;

/// Thumbnail slot showing the current skin's head.
pub const SKIN_THUMBNAIL: usize = 0;
/// Thumbnail slot showing the current cape.
pub const CAPE_THUMBNAIL: usize = 1;

pub struct ViewerUiPlugin;

impl Plugin for ViewerUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerUiState>()
            .add_systems(EguiPrimaryContextPass, viewer_panel.run_if(resource_exists::<SkinViewer>));
    }
}

/// Text fields are edited here and only pushed to the viewer on apply.
#[derive(Resource, Default)]
pub struct ViewerUiState {
    initialized: bool,
    skin: String,
    cape: String,
    thumbnails: Vec<Option<(u64, egui::TextureHandle)>>,
}

fn thumbnail_image(thumbnail: &Thumbnail) -> egui::ColorImage {
    let image = &thumbnail.image;
    egui::ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn viewer_panel(
    mut contexts: EguiContexts,
    mut viewer: ResMut<SkinViewer>,
    mut state: ResMut<ViewerUiState>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let state = &mut *state;
    let mut props = viewer.props().clone();
    if !state.initialized {
        state.skin = props.skin_url.clone().unwrap_or_default();
        state.cape = props.cape_url.clone().unwrap_or_default();
        state.initialized = true;
    }

    // Re-upload thumbnails whose raster changed since last frame.
    state.thumbnails.resize(viewer.thumbnails().len(), None);
    for (idx, slot) in viewer.thumbnails().iter().enumerate() {
        let stale = state.thumbnails[idx]
            .as_ref()
            .is_none_or(|(revision, _)| *revision != slot.revision());
        if stale {
            let texture = ctx.load_texture(
                format!("thumbnail-{idx}"),
                thumbnail_image(slot.thumbnail()),
                egui::TextureOptions::NEAREST,
            );
            state.thumbnails[idx] = Some((slot.revision(), texture));
        }
    }

    let status = viewer.status();
    let mut apply_urls = false;
    let mut picked_cape = None;

    egui::SidePanel::right("skin_viewer_panel")
        .resizable(false)
        .exact_width(PANEL_WIDTH)
        .show(ctx, |ui| {
            ui.heading("Skin");
            ui.label("Skin URL:");
            let skin = ui.text_edit_singleline(&mut state.skin);
            ui.label("Cape URL:");
            let cape = ui.text_edit_singleline(&mut state.cape);
            let submitted = (skin.lost_focus() || cape.lost_focus())
                && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Apply").clicked() || submitted {
                apply_urls = true;
            }

            ui.separator();
            egui::ComboBox::from_label("Model")
                .selected_text(props.variant.to_string())
                .show_ui(ui, |ui| {
                    for variant in [BodyVariant::Classic, BodyVariant::Slim] {
                        ui.selectable_value(&mut props.variant, variant, variant.to_string());
                    }
                });
            egui::ComboBox::from_label("Animation")
                .selected_text(props.animation.to_string())
                .show_ui(ui, |ui| {
                    for kind in [AnimationKind::Idle, AnimationKind::Walk] {
                        ui.selectable_value(&mut props.animation, kind, kind.to_string());
                    }
                });
            ui.add(egui::Slider::new(&mut props.animation_speed, 0.0..=3.0).text("Speed"));
            ui.add(egui::Slider::new(&mut props.zoom, 0.25..=4.0).text("Zoom"));
            ui.horizontal(|ui| {
                ui.label("Size:");
                ui.add(egui::DragValue::new(&mut props.width).range(64..=2048));
                ui.label("x");
                ui.add(egui::DragValue::new(&mut props.height).range(64..=2048));
            });

            ui.separator();
            if status.loading {
                ui.label("Loading...");
            }
            if let Some(error) = &status.error {
                ui.colored_label(egui::Color32::from_rgb(230, 90, 90), error);
            }

            ui.separator();
            ui.label("Thumbnails (click a cape to wear it):");
            ui.horizontal_wrapped(|ui| {
                for (idx, entry) in state.thumbnails.iter().enumerate() {
                    let Some((_, texture)) = entry else {
                        continue;
                    };
                    let size = texture.size_vec2();
                    let response = ui.add(
                        egui::Image::new((texture.id(), size)).sense(egui::Sense::click()),
                    );
                    if idx != SKIN_THUMBNAIL && response.clicked() {
                        picked_cape = viewer.thumbnails()[idx].url().map(str::to_string);
                    }
                }
            });
        });

    if let Some(url) = picked_cape {
        state.cape = url;
        apply_urls = true;
    }
    if apply_urls {
        props.skin_url = non_blank(&state.skin);
        props.cape_url = non_blank(&state.cape);
        let skin = props.skin().map(str::to_string);
        let cape = props.cape().map(str::to_string);
        viewer.set_thumbnail_source(SKIN_THUMBNAIL, skin.as_deref());
        viewer.set_thumbnail_source(CAPE_THUMBNAIL, cape.as_deref());
    }
    viewer.set_props(props);
}
