use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use catppuccin::FlavorName;

use crate::config::AppConfig;

/// Convert a catppuccin color to a bevy Color via its RGB values.
fn cat_to_bevy(c: &catppuccin::Color) -> Color {
    Color::srgb(
        c.rgb.r as f32 / 255.0,
        c.rgb.g as f32 / 255.0,
        c.rgb.b as f32 / 255.0,
    )
}

/// Central theme resource for the application.
///
/// Wraps a catppuccin flavor and provides accessor methods returning
/// `bevy::color::Color` values from the active palette. Only the UI chrome is
/// themed; map entity colors are fixed.
#[derive(Resource)]
pub struct AppTheme {
    active_flavor: FlavorName,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            active_flavor: FlavorName::Mocha,
        }
    }
}

impl AppTheme {
    pub fn flavor(&self) -> FlavorName {
        self.active_flavor
    }

    pub fn set_flavor(&mut self, flavor: FlavorName) {
        self.active_flavor = flavor;
    }

    fn colors(&self) -> &catppuccin::FlavorColors {
        &catppuccin::PALETTE.get_flavor(self.active_flavor).colors
    }

    pub fn is_dark(&self) -> bool {
        self.active_flavor != FlavorName::Latte
    }

    // -- Semantic accessors --

    pub fn bg_primary(&self) -> Color { cat_to_bevy(&self.colors().base) }
    pub fn bg_secondary(&self) -> Color { cat_to_bevy(&self.colors().mantle) }
    pub fn bg_contrast(&self) -> Color { cat_to_bevy(&self.colors().surface0) }
    pub fn text_primary(&self) -> Color { cat_to_bevy(&self.colors().text) }
    pub fn text_dim(&self) -> Color { cat_to_bevy(&self.colors().overlay1) }
    pub fn accent_primary(&self) -> Color { cat_to_bevy(&self.colors().blue) }
    pub fn ok(&self) -> Color { cat_to_bevy(&self.colors().green) }
    pub fn warn(&self) -> Color { cat_to_bevy(&self.colors().yellow) }
    pub fn error(&self) -> Color { cat_to_bevy(&self.colors().red) }
}

/// Convert a `bevy::color::Color` to `egui::Color32`.
pub fn to_egui_color32(color: Color) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        (srgba.alpha * 255.0) as u8,
    )
}

/// Convert a `bevy::color::Color` to `egui::Color32` with a custom alpha.
pub fn to_egui_color32_alpha(color: Color, alpha: u8) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        alpha,
    )
}

/// All available flavor names for iteration in UI.
pub const ALL_FLAVORS: &[FlavorName] = &[
    FlavorName::Latte,
    FlavorName::Frappe,
    FlavorName::Macchiato,
    FlavorName::Mocha,
];

pub fn flavor_display_name(flavor: FlavorName) -> &'static str {
    match flavor {
        FlavorName::Latte => "Latte",
        FlavorName::Frappe => "Frappe",
        FlavorName::Macchiato => "Macchiato",
        FlavorName::Mocha => "Mocha",
    }
}

/// Case-insensitive lookup of a flavor by its display name
pub fn flavor_from_name(name: &str) -> Option<FlavorName> {
    ALL_FLAVORS
        .iter()
        .copied()
        .find(|f| flavor_display_name(*f).eq_ignore_ascii_case(name.trim()))
}

/// Startup system: pick up the flavor saved in config
pub fn load_theme_from_config(config: Res<AppConfig>, mut theme: ResMut<AppTheme>) {
    match flavor_from_name(&config.ui.theme) {
        Some(flavor) => theme.set_flavor(flavor),
        None => warn!("Unknown theme {:?}, keeping {}", config.ui.theme, flavor_display_name(theme.flavor())),
    }
}

/// Build egui visuals from the active palette
pub fn egui_visuals(theme: &AppTheme) -> egui::Visuals {
    let mut visuals = if theme.is_dark() {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.panel_fill = to_egui_color32(theme.bg_secondary());
    visuals.window_fill = to_egui_color32(theme.bg_primary());
    visuals.extreme_bg_color = to_egui_color32(theme.bg_contrast());
    visuals.override_text_color = Some(to_egui_color32(theme.text_primary()));
    visuals.selection.bg_fill = to_egui_color32_alpha(theme.accent_primary(), 120);
    visuals.hyperlink_color = to_egui_color32(theme.accent_primary());
    visuals
}

/// System that applies the palette to egui whenever `AppTheme` changes.
pub fn apply_egui_theme(
    theme: Res<AppTheme>,
    mut contexts: EguiContexts,
) {
    if !theme.is_changed() {
        return;
    }
    if let Ok(ctx) = contexts.ctx_mut() {
        ctx.set_visuals(egui_visuals(&theme));
    }
}

/// Registers the phosphor icon font the first time an egui context is available.
pub fn install_icon_font(mut contexts: EguiContexts, mut installed: Local<bool>) {
    if *installed {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
    *installed = true;
}
