use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use super::{
    GlowGizmos, InfoPopup, ProjectionSummary, RouteGizmos,
    configure_gizmos, draw_scene_gizmos, rebuild_scene, render_info_popup, render_world_labels,
    setup_scene,
};
use crate::config::AppConfig;
use crate::geo::LocalFrame;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        // The frame is needed by camera setup at Startup, so it is derived
        // from config here rather than in a system.
        let frame = app
            .world()
            .get_resource::<AppConfig>()
            .map(|config| {
                LocalFrame::new(
                    config.home.latitude,
                    config.home.longitude,
                    config.camera.vertical_exaggeration,
                )
            })
            .unwrap_or_default();

        app
            .insert_resource(frame)
            .init_resource::<ProjectionSummary>()
            .init_resource::<InfoPopup>()
            .init_gizmo_group::<GlowGizmos>()
            .init_gizmo_group::<RouteGizmos>()
            .add_systems(Startup, (setup_scene, configure_gizmos))
            .add_systems(Update, (rebuild_scene, draw_scene_gizmos).chain())
            .add_systems(EguiPrimaryContextPass, (render_world_labels, render_info_popup));
    }
}
