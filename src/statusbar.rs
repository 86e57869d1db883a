use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::camera::CameraState;
use crate::config::AppConfig;
use crate::dataset::{AviationDataset, LoadingState};
use crate::scene::ProjectionSummary;
use crate::theme::{AppTheme, to_egui_color32};

/// FPS smoothing state using exponential moving average.
#[derive(Resource, Default)]
pub struct StatusBarState {
    /// Smoothed FPS value
    pub fps: f32,
}

impl StatusBarState {
    pub fn record_frame(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let instant_fps = 1.0 / dt;
        if self.fps == 0.0 {
            self.fps = instant_fps;
        } else {
            self.fps += FPS_SMOOTHING * (instant_fps - self.fps);
        }
    }
}

/// Height of the statusbar in pixels.
const STATUSBAR_HEIGHT: f32 = 22.0;
/// Font size for all statusbar text.
const FONT_SIZE: f32 = 11.0;
/// EMA smoothing factor for FPS (lower = smoother, 0.05 = ~1s window at 60fps).
const FPS_SMOOTHING: f32 = 0.05;

/// Render the bottom statusbar as an egui BottomPanel.
///
/// Must run before the side panel so it spans the full window width.
pub fn render_statusbar(
    mut contexts: EguiContexts,
    theme: Res<AppTheme>,
    data: Res<AviationDataset>,
    summary: Res<ProjectionSummary>,
    camera: Option<Res<CameraState>>,
    config: Res<AppConfig>,
    time: Res<Time>,
    mut state: ResMut<StatusBarState>,
) {
    state.record_frame(time.delta_secs());

    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let panel_bg = to_egui_color32(theme.bg_secondary());
    let border_color = to_egui_color32(theme.bg_contrast());
    let dim = to_egui_color32(theme.text_dim());
    let primary = to_egui_color32(theme.text_primary());

    let frame = egui::Frame::default()
        .fill(panel_bg)
        .stroke(egui::Stroke::new(1.0, border_color))
        .inner_margin(egui::Margin::symmetric(8, 2));

    egui::TopBottomPanel::bottom("statusbar")
        .exact_height(STATUSBAR_HEIGHT)
        .frame(frame)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                // -- Dataset status --
                render_load_section(ui, data.state, &theme);

                separator(ui, dim);

                ui.label(
                    egui::RichText::new(format!("{} entities", summary.stats.total))
                        .size(FONT_SIZE)
                        .color(primary),
                );

                if camera.as_ref().is_some_and(|c| c.is_flying()) {
                    separator(ui, dim);
                    ui.label(
                        egui::RichText::new("Flying home")
                            .size(FONT_SIZE)
                            .color(to_egui_color32(theme.accent_primary())),
                    );
                }

                separator(ui, dim);

                // -- FPS --
                ui.label(
                    egui::RichText::new(format!("{:.0} FPS", state.fps))
                        .size(FONT_SIZE)
                        .color(primary),
                );

                // -- Right-aligned: home position + range --
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.spacing_mut().item_spacing.x = 6.0;

                    if let Some(camera) = &camera {
                        ui.label(
                            egui::RichText::new(format!("Range {:.1} km", camera.view.distance / 1000.0))
                                .size(FONT_SIZE)
                                .color(dim),
                        );
                        separator(ui, dim);
                    }

                    ui.label(
                        egui::RichText::new(format!(
                            "Home {:.4}, {:.4}",
                            config.home.latitude,
                            config.home.longitude,
                        ))
                        .size(FONT_SIZE)
                        .color(primary),
                    );
                });
            });
        });
}

fn load_status(state: LoadingState) -> &'static str {
    match state {
        LoadingState::NotStarted => "Idle",
        LoadingState::Loading => "Loading",
        LoadingState::Ready => "Loaded",
        LoadingState::Failed => "No data",
    }
}

/// Render the load status dot and label.
fn render_load_section(ui: &mut egui::Ui, state: LoadingState, theme: &AppTheme) {
    let color = match state {
        LoadingState::NotStarted => to_egui_color32(theme.text_dim()),
        LoadingState::Loading => to_egui_color32(theme.warn()),
        LoadingState::Ready => to_egui_color32(theme.ok()),
        LoadingState::Failed => to_egui_color32(theme.error()),
    };

    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 4.0, color);
    ui.label(egui::RichText::new(load_status(state)).size(FONT_SIZE).color(color));
}

/// Draw a dim vertical separator between statusbar sections.
fn separator(ui: &mut egui::Ui, color: egui::Color32) {
    ui.label(egui::RichText::new("|").size(FONT_SIZE).color(color));
}
