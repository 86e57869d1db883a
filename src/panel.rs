//! Left-hand control panel: search, layer and sub-filter toggles, fly-home,
//! airport info and theme selection.
//!
//! Widgets edit a working copy of the filter state; the copy is swapped into
//! `ViewFilters` only when it differs, so an idle panel never triggers a
//! scene rebuild.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use egui_phosphor::regular;

use crate::camera::FlyToHome;
use crate::config::{save_config, AppConfig};
use crate::dataset::{AviationDataset, Dataset, LoadingState, ObstacleType};
use crate::filters::{FilterState, Layer, PanelSections, ViewFilters};
use crate::geo::METERS_TO_FEET;
use crate::projection::ProjectionStats;
use crate::scene::ProjectionSummary;
use crate::theme::{flavor_display_name, to_egui_color32, AppTheme, ALL_FLAVORS};

const PANEL_WIDTH: f32 = 270.0;

pub fn render_control_panel(
    mut contexts: EguiContexts,
    data: Res<AviationDataset>,
    mut filters: ResMut<ViewFilters>,
    mut sections: ResMut<PanelSections>,
    summary: Res<ProjectionSummary>,
    mut theme: ResMut<AppTheme>,
    mut config: ResMut<AppConfig>,
    mut fly_home: MessageWriter<FlyToHome>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let mut next = filters.0.clone();
    let mut next_sections = sections.clone();
    let mut flavor = theme.flavor();

    egui::SidePanel::left("control_panel")
        .default_width(PANEL_WIDTH)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(format!("{} Airfield 3D", regular::AIRPLANE_TAKEOFF));
                ui.add_space(4.0);

                if ui
                    .button(format!("{} Fly to home", regular::HOUSE))
                    .on_hover_text("Return the camera to the home view (H)")
                    .clicked()
                {
                    fly_home.write(FlyToHome);
                }

                ui.separator();
                render_search(ui, &mut next);
                ui.separator();

                section(ui, "Layers", &mut next_sections.layers, |ui| {
                    render_layer_toggles(ui, &mut next);
                });
                section(ui, "Obstacle types", &mut next_sections.obstacle_types, |ui| {
                    render_obstacle_types(ui, &mut next, &data.dataset);
                });
                section(ui, "Waypoint sources", &mut next_sections.waypoint_sources, |ui| {
                    render_waypoint_sources(ui, &mut next);
                });
                section(ui, "Info", &mut next_sections.info, |ui| {
                    render_airport_info(ui, &data, &summary.stats, &theme);
                });

                ui.separator();
                egui::ComboBox::from_label("Theme")
                    .selected_text(flavor_display_name(flavor))
                    .show_ui(ui, |ui| {
                        for f in ALL_FLAVORS {
                            ui.selectable_value(&mut flavor, *f, flavor_display_name(*f));
                        }
                    });
            });
        });

    if filters.set_if_neq(ViewFilters(next)) {
        debug!("Filters changed");
    }
    sections.set_if_neq(next_sections);

    if flavor != theme.flavor() {
        theme.set_flavor(flavor);
        config.ui.theme = flavor_display_name(flavor).to_string();
        save_config(&config);
    }
}

/// Collapsible section whose open state lives in `PanelSections`
fn section(ui: &mut egui::Ui, title: &str, open: &mut bool, add_contents: impl FnOnce(&mut egui::Ui)) {
    let response = egui::CollapsingHeader::new(title)
        .open(Some(*open))
        .show(ui, add_contents);
    if response.header_response.clicked() {
        *open = !*open;
    }
}

pub fn render_search(ui: &mut egui::Ui, filters: &mut FilterState) {
    let mut search = filters.search.clone();
    ui.horizontal(|ui| {
        ui.label(regular::MAGNIFYING_GLASS);
        ui.add(
            egui::TextEdit::singleline(&mut search)
                .hint_text("Search waypoints / obstacles")
                .desired_width(f32::INFINITY),
        );
    });
    if search != filters.search {
        *filters = std::mem::take(filters).with_search(search);
    }
}

pub fn render_layer_toggles(ui: &mut egui::Ui, filters: &mut FilterState) {
    for layer in Layer::ALL {
        let mut enabled = filters.layer(layer);
        if ui.checkbox(&mut enabled, layer.display_name()).changed() {
            *filters = std::mem::take(filters).with_layer(layer, enabled);
        }
    }
}

/// Obstacle type toggles with per-type counts from the dataset
pub fn render_obstacle_types(ui: &mut egui::Ui, filters: &mut FilterState, dataset: &Dataset) {
    ui.add_enabled_ui(filters.layer(Layer::Obstacles), |ui| {
        for obstacle_type in ObstacleType::ALL {
            let mut enabled = filters.obstacle_type(obstacle_type);
            let count = dataset.obstacle_count(obstacle_type);
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, 2.0, to_egui_color32(obstacle_type.color()));
                if ui
                    .checkbox(&mut enabled, obstacle_type.display_name())
                    .changed()
                {
                    *filters = std::mem::take(filters).with_obstacle_type(obstacle_type, enabled);
                }
                ui.weak(format!("({})", count));
            });
        }
    });
}

pub fn render_waypoint_sources(ui: &mut egui::Ui, filters: &mut FilterState) {
    if filters.sources.is_empty() {
        ui.weak("No waypoint sources");
        return;
    }
    let tags: Vec<String> = filters.sources.keys().cloned().collect();
    ui.add_enabled_ui(filters.layer(Layer::Waypoints), |ui| {
        for tag in tags {
            let mut enabled = filters.source(&tag);
            if ui.checkbox(&mut enabled, &tag).changed() {
                *filters = std::mem::take(filters).with_source(tag, enabled);
            }
        }
    });
}

/// Airport header, load state and visible counts
pub fn render_airport_info(
    ui: &mut egui::Ui,
    data: &AviationDataset,
    stats: &ProjectionStats,
    theme: &AppTheme,
) {
    match data.state {
        LoadingState::NotStarted | LoadingState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading dataset...");
            });
            return;
        }
        LoadingState::Failed => {
            ui.label(egui::RichText::new("No data").color(to_egui_color32(theme.error())));
            if let Some(error) = &data.error {
                ui.label(egui::RichText::new(error).small().weak());
            }
            return;
        }
        LoadingState::Ready => {}
    }

    let airport = &data.dataset.airport;
    if !airport.icao.is_empty() || !airport.name_kr.is_empty() {
        ui.strong(format!("{} {}", airport.icao, airport.name_kr).trim().to_string());
        ui.label(format!(
            "Elevation {:.0} m ({:.0} ft)",
            airport.elevation,
            airport.elevation * METERS_TO_FEET
        ));
    }
    if let Some(source) = &data.source {
        ui.label(egui::RichText::new(source).small().weak());
    }

    ui.add_space(4.0);
    egui::Grid::new("visible_counts").num_columns(2).show(ui, |ui| {
        let dataset = &data.dataset;
        let rows = [
            ("Waypoints", stats.waypoints, dataset.waypoints.len()),
            ("Obstacles", stats.obstacles, dataset.obstacles.len()),
            ("Airspace", stats.airspace, dataset.airspace.len()),
            ("Procedures", stats.procedures, dataset.procedures.len()),
        ];
        for (label, shown, total) in rows {
            ui.label(label);
            ui.label(format!("{} / {}", shown, total));
            ui.end_row();
        }
        ui.label("Legs");
        ui.label(stats.legs.to_string());
        ui.end_row();
    });
}
