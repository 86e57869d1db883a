use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use super::EntityInfo;
use crate::config::AppConfig;
use crate::geo::haversine_distance_nm;

/// Info popup state. A clicked entity stays pinned until closed; otherwise
/// the popup follows the hovered entity.
#[derive(Resource, Default, Debug, Clone)]
pub struct InfoPopup {
    pub hovered: Option<(Entity, EntityInfo)>,
    pub pinned: Option<(Entity, EntityInfo)>,
}

impl InfoPopup {
    /// Pinned entity wins over the hovered one
    pub fn visible(&self) -> Option<&EntityInfo> {
        self.pinned
            .as_ref()
            .or(self.hovered.as_ref())
            .map(|(_, info)| info)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Unpin the popup. Returns whether anything was pinned.
    pub fn close_pinned(&mut self) -> bool {
        self.pinned.take().is_some()
    }

    /// Point both slots at their respawned entities after a rebuild.
    /// A slot whose entity was filtered out is emptied.
    pub fn retarget(&mut self, find: impl Fn(&EntityInfo) -> Option<Entity>) {
        for slot in [&mut self.hovered, &mut self.pinned] {
            *slot = slot.take().and_then(|(_, info)| find(&info).map(|entity| (entity, info)));
        }
    }
}

/// Observer for clicks on a scene entity: pins its popup
pub fn on_entity_click<E: EntityEvent>(
    event: On<E>,
    infos: Query<&EntityInfo>,
    mut popup: ResMut<InfoPopup>,
) {
    let entity = event.event().event_target();
    if let Ok(info) = infos.get(entity) {
        debug!("Scene entity clicked: {}", info.title);
        popup.pinned = Some((entity, info.clone()));
    }
}

/// Observer for the pointer entering a scene entity
pub fn on_entity_over<E: EntityEvent>(
    event: On<E>,
    infos: Query<&EntityInfo>,
    mut popup: ResMut<InfoPopup>,
) {
    let entity = event.event().event_target();
    if let Ok(info) = infos.get(entity) {
        popup.hovered = Some((entity, info.clone()));
    }
}

/// Observer for the pointer leaving a scene entity
pub fn on_entity_out<E: EntityEvent>(event: On<E>, mut popup: ResMut<InfoPopup>) {
    let entity = event.event().event_target();
    if popup.hovered.as_ref().is_some_and(|(e, _)| *e == entity) {
        popup.hovered = None;
    }
}

/// Popup body: description lines and the distance from home
pub fn render_info_contents(ui: &mut egui::Ui, info: &EntityInfo, distance_nm: Option<f64>) {
    for line in info.description.lines() {
        ui.label(line);
    }
    if let Some(nm) = distance_nm {
        ui.separator();
        ui.label(egui::RichText::new(format!("{:.1} NM from home", nm)).weak());
    }
}

pub fn render_info_popup(
    mut contexts: EguiContexts,
    mut popup: ResMut<InfoPopup>,
    config: Res<AppConfig>,
) {
    let Some(info) = popup.visible().cloned() else {
        return;
    };
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let distance_nm = info.anchor.map(|at| {
        haversine_distance_nm(config.home.latitude, config.home.longitude, at.lat, at.lon)
    });

    let pinned = popup.is_pinned();
    let mut open = true;
    let mut window = egui::Window::new(info.title.as_str())
        .id(egui::Id::new("entity_info_popup"))
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .collapsible(false)
        .resizable(false);
    if pinned {
        window = window.open(&mut open);
    }
    window.show(ctx, |ui| render_info_contents(ui, &info, distance_nm));

    if !open {
        popup.close_pinned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::EntityKind;
    use egui_kittest::{Harness, kittest::Queryable};

    fn info(title: &str) -> EntityInfo {
        EntityInfo {
            kind: EntityKind::Waypoint,
            title: title.to_string(),
            description: format!("Waypoint {}\nAltitude 100 m", title),
            anchor: None,
        }
    }

    #[test]
    fn pinned_entity_wins_over_hover() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();

        let mut popup = InfoPopup::default();
        assert!(popup.visible().is_none());

        popup.hovered = Some((a, info("HOVER")));
        assert_eq!(popup.visible().map(|i| i.title.as_str()), Some("HOVER"));

        popup.pinned = Some((b, info("PIN")));
        assert_eq!(popup.visible().map(|i| i.title.as_str()), Some("PIN"));

        assert!(popup.close_pinned());
        assert!(!popup.close_pinned());
        assert_eq!(popup.visible().map(|i| i.title.as_str()), Some("HOVER"));

        popup.hovered = None;
        assert!(popup.visible().is_none());
    }

    #[derive(EntityEvent)]
    struct TestClick {
        entity: Entity,
    }

    #[derive(EntityEvent)]
    struct TestOver {
        entity: Entity,
    }

    #[derive(EntityEvent)]
    struct TestOut {
        entity: Entity,
    }

    fn observed_entity(app: &mut App, title: &str) -> Entity {
        app.world_mut()
            .spawn(info(title))
            .observe(on_entity_click::<TestClick>)
            .observe(on_entity_over::<TestOver>)
            .observe(on_entity_out::<TestOut>)
            .id()
    }

    #[test]
    fn click_observer_pins_the_clicked_entity() {
        let mut app = App::new();
        app.init_resource::<InfoPopup>();
        let _other = observed_entity(&mut app, "BRAVO");
        let target = observed_entity(&mut app, "ALPHA");

        app.world_mut().trigger(TestClick { entity: target });

        let popup = app.world().resource::<InfoPopup>();
        let (entity, pinned) = popup.pinned.as_ref().expect("click should pin");
        assert_eq!(*entity, target);
        assert_eq!(pinned.title, "ALPHA");
        assert!(popup.hovered.is_none());
    }

    #[test]
    fn hover_observers_follow_the_pointer() {
        let mut app = App::new();
        app.init_resource::<InfoPopup>();
        let a = observed_entity(&mut app, "ALPHA");
        let b = observed_entity(&mut app, "BRAVO");

        app.world_mut().trigger(TestOver { entity: a });
        assert_eq!(
            app.world().resource::<InfoPopup>().visible().map(|i| i.title.clone()),
            Some("ALPHA".to_string())
        );

        // Leaving some other entity keeps the current hover
        app.world_mut().trigger(TestOut { entity: b });
        assert!(app.world().resource::<InfoPopup>().hovered.is_some());

        app.world_mut().trigger(TestOut { entity: a });
        assert!(app.world().resource::<InfoPopup>().visible().is_none());
    }

    #[test]
    fn retarget_moves_or_drops_popup_entries() {
        let mut world = World::new();
        let old = world.spawn_empty().id();
        let new = world.spawn_empty().id();

        let mut popup = InfoPopup {
            hovered: Some((old, info("GONE"))),
            pinned: Some((old, info("ALPHA"))),
        };
        popup.retarget(|i| (i.title == "ALPHA").then_some(new));

        assert!(popup.hovered.is_none());
        assert_eq!(popup.pinned.as_ref().map(|(e, _)| *e), Some(new));
    }

    #[test]
    fn test_popup_shows_description_and_distance() {
        let harness = Harness::new_ui_state(
            |ui, info: &mut EntityInfo| {
                render_info_contents(ui, info, Some(2.54));
            },
            info("ALPHA"),
        );

        harness.get_by_label("Waypoint ALPHA");
        harness.get_by_label("Altitude 100 m");
        harness.get_by_label("2.5 NM from home");
    }
}
