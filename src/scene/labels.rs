use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::camera::MainCamera;
use crate::theme::to_egui_color32;

/// Labels further than this from the camera are not drawn
pub const LABEL_MAX_DISTANCE: f32 = 60_000.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_SHADOW: egui::Color32 = egui::Color32::from_black_alpha(200);

/// Text floating above a scene entity, drawn as an egui overlay
#[derive(Component, Debug, Clone)]
pub struct WorldLabel {
    pub text: String,
    pub color: Color,
    /// Scene position the label is pinned to
    pub anchor: Vec3,
}

/// Whether a label at `anchor` is close enough to `camera` to draw
pub fn label_in_range(camera: Vec3, anchor: Vec3) -> bool {
    camera.distance_squared(anchor) <= LABEL_MAX_DISTANCE * LABEL_MAX_DISTANCE
}

/// Paints world labels behind every egui window so panels stay on top.
pub fn render_world_labels(
    mut contexts: EguiContexts,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    labels: Query<&WorldLabel>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let painter = ctx.layer_painter(egui::LayerId::background());
    let font = egui::FontId::proportional(LABEL_FONT_SIZE);
    let camera_pos = camera_transform.translation();

    for label in labels.iter() {
        if !label_in_range(camera_pos, label.anchor) {
            continue;
        }
        let Ok(screen) = camera.world_to_viewport(camera_transform, label.anchor) else {
            continue;
        };
        let pos = egui::pos2(screen.x, screen.y);
        painter.text(
            pos + egui::vec2(1.0, 1.0),
            egui::Align2::CENTER_BOTTOM,
            &label.text,
            font.clone(),
            LABEL_SHADOW,
        );
        painter.text(
            pos,
            egui::Align2::CENTER_BOTTOM,
            &label.text,
            font.clone(),
            to_egui_color32(label.color),
        );
    }
}
