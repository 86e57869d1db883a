use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::camera::FlyToHome;
use crate::filters::{Layer, ViewFilters};
use crate::scene::InfoPopup;

/// Resource for help overlay visibility
#[derive(Resource, Default)]
pub struct HelpOverlayState {
    pub visible: bool,
}

/// Component for help overlay UI
#[derive(Component)]
pub struct HelpOverlay;

/// Digit keys toggle layers in panel order
const LAYER_KEYS: [KeyCode; 6] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
];

/// System to handle keyboard shortcuts
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut fly_home: MessageWriter<FlyToHome>,
    mut popup: ResMut<InfoPopup>,
    mut filters: ResMut<ViewFilters>,
    mut help_state: ResMut<HelpOverlayState>,
    mut contexts: EguiContexts,
) {
    // Check if egui wants keyboard input (e.g., typing in the search box)
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_keyboard_input() {
            return;
        }
    }

    // H - Fly back to the home view
    if keyboard.just_pressed(KeyCode::KeyH) {
        fly_home.write(FlyToHome);
    }

    // Escape - Close the pinned popup, then the help overlay
    if keyboard.just_pressed(KeyCode::Escape) {
        if !popup.close_pinned() && help_state.visible {
            help_state.visible = false;
        }
    }

    // F1 - Toggle help overlay
    if keyboard.just_pressed(KeyCode::F1) {
        help_state.visible = !help_state.visible;
    }

    for (key, layer) in LAYER_KEYS.iter().zip(Layer::ALL) {
        if keyboard.just_pressed(*key) {
            let enabled = filters.0.layer(layer);
            let next = filters.0.clone().with_layer(layer, !enabled);
            filters.set_if_neq(ViewFilters(next));
        }
    }
}

/// System to create/update help overlay
pub fn update_help_overlay(
    mut commands: Commands,
    help_state: Res<HelpOverlayState>,
    existing_overlay: Query<Entity, With<HelpOverlay>>,
) {
    if !help_state.visible {
        for entity in existing_overlay.iter() {
            commands.entity(entity).despawn();
        }
        return;
    }

    if !existing_overlay.is_empty() {
        return;
    }

    let help_text = "\
Keyboard Shortcuts
------------------
H     Fly to home view
Esc   Close pinned info
1     Toggle waypoints
2     Toggle obstacles
3     Toggle airspace
4     Toggle SID
5     Toggle STAR
6     Toggle approach
F1    Toggle this help

Mouse
-----
Left drag   Orbit
Right drag  Pan
Wheel       Zoom
Click       Pin entity info
";

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: Val::Percent(50.0),
            left: Val::Percent(50.0),
            margin: UiRect {
                left: Val::Px(-150.0),
                top: Val::Px(-180.0),
                ..default()
            },
            width: Val::Px(300.0),
            padding: UiRect::all(Val::Px(20.0)),
            flex_direction: FlexDirection::Column,
            ..default()
        },
        BackgroundColor(Color::srgba(0.1, 0.1, 0.15, 0.95)),
        HelpOverlay,
    )).with_children(|parent| {
        parent.spawn((
            Text::new(help_text),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            TextColor(Color::srgb(0.9, 0.9, 0.9)),
        ));
    });
}
