use bevy::picking::mesh_picking::MeshPickingPlugin;
use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};

mod camera;
mod config;
mod dataset;
mod filters;
mod geo;
mod keyboard;
mod panel;
mod paths;
mod projection;
mod scene;
mod statusbar;
mod theme;

use camera::CameraPlugin;
use config::ConfigPlugin;
use dataset::DatasetPlugin;
use filters::{PanelSections, ViewFilters};
use keyboard::{handle_keyboard_shortcuts, update_help_overlay, HelpOverlayState};
use scene::ScenePlugin;
use statusbar::StatusBarState;
use theme::AppTheme;

const CLEAR_COLOR: Color = Color::srgb(0.03, 0.04, 0.07);

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Airfield 3D - Aviation Data Viewer".to_string(),
                    resolution: (1440, 900).into(),
                    ..default()
                }),
                ..default()
            }),
            MeshPickingPlugin,
            EguiPlugin::default(),
            // Config first: ScenePlugin reads it while building
            ConfigPlugin,
            DatasetPlugin,
            ScenePlugin,
            CameraPlugin,
        ))
        .insert_resource(ClearColor(CLEAR_COLOR))
        .init_resource::<ViewFilters>()
        .init_resource::<PanelSections>()
        .init_resource::<AppTheme>()
        .init_resource::<StatusBarState>()
        .init_resource::<HelpOverlayState>()
        .add_systems(Startup, theme::load_theme_from_config)
        .add_systems(Update, (handle_keyboard_shortcuts, update_help_overlay).chain())
        .add_systems(
            EguiPrimaryContextPass,
            (
                theme::install_icon_font,
                theme::apply_egui_theme,
                // Bottom panel before the side panel so it spans the window
                statusbar::render_statusbar,
                panel::render_control_panel,
            )
                .chain(),
        )
        .run();
}
