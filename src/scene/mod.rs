//! Scene adapter: materialises projected entities as Bevy entities.
//!
//! Every rebuild despawns everything tagged `SceneEntity` and spawns the new
//! projection from scratch. Nothing is diffed.

pub mod labels;
pub mod mesh;
pub mod picking;
pub mod plugin;

use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::dataset::{AviationDataset, LonLat};
use crate::filters::ViewFilters;
use crate::geo::LocalFrame;
use crate::projection::{self, EntityKind, GeoPosition, ProjectionStats, RenderableEntity, Shape};

pub use labels::*;
pub use picking::*;
pub use plugin::*;

/// Radius of the pickable anchor placed at the start of each procedure line
const POLYLINE_ANCHOR_RADIUS: f32 = 60.0;
/// Thickness of the runway slab
const RUNWAY_THICKNESS: f32 = 2.0;
/// Lift labels a little above their anchor
const LABEL_LIFT: f32 = 60.0;
const MIN_COLUMN_HEIGHT: f32 = 1.0;
const GROUND_SIZE: f32 = 600_000.0;
const GROUND_COLOR: Color = Color::srgb(0.08, 0.1, 0.13);

/// Marker for every entity spawned from a projection
#[derive(Component)]
pub struct SceneEntity;

/// Popup data attached to pickable scene entities
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub kind: EntityKind,
    pub title: String,
    pub description: String,
    /// Representative position, used for the distance-from-home readout
    pub anchor: Option<LonLat>,
}

/// A polyline drawn with gizmos every frame, in scene coordinates
#[derive(Component, Debug, Clone)]
pub struct PolylineGizmo {
    pub points: Vec<Vec3>,
    pub color: Color,
    pub glow: bool,
}

/// Wireframe outline of an extruded polygon
#[derive(Component, Debug, Clone)]
pub struct OutlineGizmo {
    pub bottom: Vec<Vec3>,
    pub top: Vec<Vec3>,
    pub color: Color,
}

/// Result of the most recent projection pass
#[derive(Resource, Default, Debug)]
pub struct ProjectionSummary {
    pub stats: ProjectionStats,
    pub rebuilds: u32,
}

/// Startup system: lighting and the ground plane the map sits on
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.0, 1.0, 0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: GROUND_COLOR,
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_xyz(0.0, -1.0, 0.0),
        Pickable::IGNORE,
    ));
}

/// Rebuilds the scene whenever the dataset or the filters change
pub fn rebuild_scene(
    mut commands: Commands,
    data: Res<AviationDataset>,
    filters: Res<ViewFilters>,
    frame: Res<LocalFrame>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut summary: ResMut<ProjectionSummary>,
    mut popup: ResMut<InfoPopup>,
    existing: Query<Entity, With<SceneEntity>>,
) {
    if !data.is_changed() && !filters.is_changed() {
        return;
    }

    let mut removed = 0;
    for entity in existing.iter() {
        commands.entity(entity).despawn();
        removed += 1;
    }

    let entities = projection::project(&data.dataset, &filters.0);
    let spawned: Vec<Entity> = entities
        .iter()
        .map(|entity| spawn_entity(&mut commands, &frame, &mut meshes, &mut materials, entity))
        .collect();

    // Keep the popup on entities that survived the rebuild
    popup.retarget(|info| {
        entities
            .iter()
            .zip(&spawned)
            .find(|(e, _)| e.kind == info.kind && e.name == info.title)
            .map(|(_, id)| *id)
    });

    summary.stats = ProjectionStats::from_entities(&entities);
    summary.rebuilds += 1;
    debug!("Scene rebuilt: {} removed, {} spawned", removed, entities.len());
}

fn unlit(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        unlit: true,
        alpha_mode: if color.alpha() < 1.0 { AlphaMode::Blend } else { AlphaMode::Opaque },
        ..default()
    }
}

fn anchor_of(shape: &Shape) -> Option<LonLat> {
    let geo = |p: &GeoPosition| LonLat::new(p.lon, p.lat);
    match shape {
        Shape::Corridor { start, .. } => Some(geo(start)),
        Shape::Point { position, .. } => Some(geo(position)),
        Shape::Cylinder { center, .. } => Some(geo(center)),
        Shape::ExtrudedPolygon { ring, .. } => ring.first().copied(),
        Shape::Polyline { positions, .. } => positions.first().map(geo),
    }
}

fn spawn_entity(
    commands: &mut Commands,
    frame: &LocalFrame,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    entity: &RenderableEntity,
) -> Entity {
    let info = EntityInfo {
        kind: entity.kind,
        title: entity.name.clone(),
        description: entity.description.clone(),
        anchor: anchor_of(&entity.shape),
    };
    let name = Name::new(format!("{:?}: {}", entity.kind, entity.name));

    let mut spawned = match &entity.shape {
        Shape::Corridor { start, end, width, color } => {
            let a = frame.position(start);
            let b = frame.position(end);
            let direction = Vec3::new(b.x - a.x, 0.0, b.z - a.z);
            let length = direction.length().max(1.0);
            let center = (a + b) / 2.0 + Vec3::Y * (RUNWAY_THICKNESS / 2.0);
            let transform = if direction.length_squared() > 0.0 {
                Transform::from_translation(center).looking_to(direction, Vec3::Y)
            } else {
                Transform::from_translation(center)
            };
            commands.spawn((
                name,
                SceneEntity,
                info,
                Mesh3d(meshes.add(Cuboid::new(*width as f32, RUNWAY_THICKNESS, length))),
                MeshMaterial3d(materials.add(unlit(*color))),
                transform,
            ))
        }
        Shape::Point { position, radius, color, outline, label } => {
            let world = frame.position(position);
            let mut spawned = commands.spawn((
                name,
                SceneEntity,
                info,
                WorldLabel {
                    text: label.text.clone(),
                    color: label.color,
                    anchor: world + Vec3::Y * (radius + LABEL_LIFT),
                },
                Mesh3d(meshes.add(Sphere::new(*radius))),
                MeshMaterial3d(materials.add(unlit(*color))),
                Transform::from_translation(world),
            ));
            spawned.with_child((
                Mesh3d(meshes.add(Sphere::new(radius * 1.3))),
                MeshMaterial3d(materials.add(unlit(outline.with_alpha(0.3)))),
                Pickable::IGNORE,
            ));
            spawned
        }
        Shape::Cylinder { center, length, top_radius, bottom_radius, color, label } => {
            let world = frame.position(center);
            let height = frame.height(*length).max(MIN_COLUMN_HEIGHT);
            commands.spawn((
                name,
                SceneEntity,
                info,
                WorldLabel {
                    text: label.text.clone(),
                    color: label.color,
                    anchor: world + Vec3::Y * (height / 2.0 + LABEL_LIFT),
                },
                Mesh3d(meshes.add(ConicalFrustum {
                    radius_top: *top_radius as f32,
                    radius_bottom: *bottom_radius as f32,
                    height,
                })),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: *color,
                    ..default()
                })),
                Transform::from_translation(world),
            ))
        }
        Shape::ExtrudedPolygon { ring, base, top, fill, outline } => {
            let footprint: Vec<Vec2> = ring
                .iter()
                .map(|c| {
                    let p = frame.to_world(c.lat, c.lon, 0.0);
                    Vec2::new(p.x, p.z)
                })
                .collect();
            let base_y = frame.height(*base);
            let top_y = frame.height(*top);
            let outline_ring = mesh::open_ring(&footprint);
            let at = |y: f32| outline_ring.iter().map(|p| Vec3::new(p.x, y, p.y)).collect();
            commands.spawn((
                name,
                SceneEntity,
                info,
                OutlineGizmo {
                    bottom: at(base_y),
                    top: at(top_y),
                    color: *outline,
                },
                Mesh3d(meshes.add(mesh::extruded_polygon(&footprint, base_y, top_y))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    double_sided: true,
                    cull_mode: None,
                    ..unlit(*fill)
                })),
                Transform::default(),
            ))
        }
        Shape::Polyline { positions, color, glow, .. } => {
            let points: Vec<Vec3> = positions.iter().map(|p| frame.position(p)).collect();
            let start = points.first().copied().unwrap_or_default();
            commands.spawn((
                name,
                SceneEntity,
                info,
                PolylineGizmo {
                    points,
                    color: *color,
                    glow: *glow,
                },
                Mesh3d(meshes.add(Sphere::new(POLYLINE_ANCHOR_RADIUS))),
                MeshMaterial3d(materials.add(unlit(*color))),
                Transform::from_translation(start),
            ))
        }
    };

    spawned
        .observe(on_entity_click::<Pointer<Click>>)
        .observe(on_entity_over::<Pointer<Over>>)
        .observe(on_entity_out::<Pointer<Out>>)
        .id()
}

/// Gizmo group for the wide translucent halo behind glowing routes
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct GlowGizmos;

/// Gizmo group for the core of glowing routes
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct RouteGizmos;

const GLOW_LINE_WIDTH: f32 = 12.0;
const GLOW_ALPHA: f32 = 0.25;

pub fn configure_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = projection::LEG_LINE_WIDTH;
    let (config, _) = config_store.config_mut::<RouteGizmos>();
    config.line.width = projection::ROUTE_LINE_WIDTH;
    let (config, _) = config_store.config_mut::<GlowGizmos>();
    config.line.width = GLOW_LINE_WIDTH;
}

/// Draws procedure polylines and airspace outlines
pub fn draw_scene_gizmos(
    mut gizmos: Gizmos,
    mut route_gizmos: Gizmos<RouteGizmos>,
    mut glow_gizmos: Gizmos<GlowGizmos>,
    polylines: Query<&PolylineGizmo>,
    outlines: Query<&OutlineGizmo>,
) {
    for line in polylines.iter() {
        if line.points.len() < 2 {
            continue;
        }
        if line.glow {
            glow_gizmos.linestrip(line.points.iter().copied(), line.color.with_alpha(GLOW_ALPHA));
            route_gizmos.linestrip(line.points.iter().copied(), line.color);
        } else {
            gizmos.linestrip(line.points.iter().copied(), line.color);
        }
    }

    for outline in outlines.iter() {
        if outline.bottom.len() < 2 {
            continue;
        }
        for ring in [&outline.bottom, &outline.top] {
            gizmos.linestrip(ring.iter().chain(ring.first()).copied(), outline.color);
        }
        for (b, t) in outline.bottom.iter().zip(outline.top.iter()) {
            gizmos.line(*b, *t, outline.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_dataset;
    use crate::filters::{FilterState, Layer};

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .insert_resource(LocalFrame::new(35.0, 129.0, 1.0))
            .init_resource::<ProjectionSummary>()
            .init_resource::<InfoPopup>()
            .init_resource::<ViewFilters>()
            .insert_resource(AviationDataset {
                dataset: parse_dataset(
                    r#"{
                        "waypoints": {"ALPHA": {"lat": 35.0, "lon": 129.0, "sources": ["NAV1"]}},
                        "obstacles": [{"id": "42", "type": "Tower", "lat": 35.01, "lon": 129.01, "elevation": 80}],
                        "airspace": [{"name": "P-1", "coordinates": [[[129.0, 35.0], [129.1, 35.0], [129.1, 35.1]]]}],
                        "procedures": {"SID": [{"name": "DEP1", "table": "t", "coordinates": [[129.0, 35.0], [129.1, 35.1]]}]}
                    }"#,
                )
                .unwrap(),
                ..default()
            })
            .add_systems(Update, rebuild_scene);
        app
    }

    fn scene_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<SceneEntity>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn rebuild_spawns_one_scene_entity_per_projected_entity() {
        let mut app = test_app();
        app.world_mut().resource_mut::<ViewFilters>().0 =
            FilterState::default().with_source("NAV1", true);
        app.update();

        // runway, waypoint, obstacle, airspace, route
        assert_eq!(scene_count(&mut app), 5);
        assert_eq!(app.world().resource::<ProjectionSummary>().stats.total, 5);
    }

    #[test]
    fn repeated_rebuilds_replace_instead_of_append() {
        let mut app = test_app();
        app.world_mut().resource_mut::<ViewFilters>().0 =
            FilterState::default().with_source("NAV1", true);
        app.update();
        let first = scene_count(&mut app);

        for _ in 0..3 {
            // Touch the resource without changing its value to force a rebuild
            app.world_mut().resource_mut::<ViewFilters>().set_changed();
            app.update();
            assert_eq!(scene_count(&mut app), first);
        }
        assert!(app.world().resource::<ProjectionSummary>().rebuilds >= 4);
    }

    #[test]
    fn filter_change_shrinks_scene() {
        let mut app = test_app();
        app.world_mut().resource_mut::<ViewFilters>().0 =
            FilterState::default().with_source("NAV1", true);
        app.update();

        let next = app.world().resource::<ViewFilters>().0.clone().with_layer(Layer::Obstacles, false);
        app.world_mut().resource_mut::<ViewFilters>().0 = next;
        app.update();
        assert_eq!(scene_count(&mut app), 4);

        let infos: Vec<EntityKind> = app
            .world_mut()
            .query::<&EntityInfo>()
            .iter(app.world())
            .map(|i| i.kind)
            .collect();
        assert!(infos.iter().all(|k| !matches!(k, EntityKind::Obstacle(_))));
    }

    fn entity_titled(app: &mut App, title: &str) -> Option<(Entity, EntityInfo)> {
        app.world_mut()
            .query::<(Entity, &EntityInfo)>()
            .iter(app.world())
            .find(|(_, info)| info.title == title)
            .map(|(entity, info)| (entity, info.clone()))
    }

    fn set_search(app: &mut App, search: &str) {
        let next = app.world().resource::<ViewFilters>().0.clone().with_search(search);
        app.world_mut().resource_mut::<ViewFilters>().0 = next;
    }

    #[test]
    fn pinned_popup_survives_rebuilds_while_visible() {
        let mut app = test_app();
        app.world_mut().resource_mut::<ViewFilters>().0 =
            FilterState::default().with_source("NAV1", true);
        app.update();

        let pinned = entity_titled(&mut app, "ALPHA").expect("waypoint spawned");
        let hovered = entity_titled(&mut app, "42").expect("obstacle spawned");
        {
            let mut popup = app.world_mut().resource_mut::<InfoPopup>();
            popup.pinned = Some(pinned.clone());
            popup.hovered = Some(hovered);
        }

        // Typing narrows the scene to ALPHA; the obstacle hover goes away
        set_search(&mut app, "AL");
        app.update();
        let (respawned, _) = entity_titled(&mut app, "ALPHA").expect("waypoint still visible");
        let popup = app.world().resource::<InfoPopup>();
        assert_ne!(respawned, pinned.0);
        assert_eq!(popup.pinned.as_ref().map(|(e, _)| *e), Some(respawned));
        assert!(popup.hovered.is_none());

        set_search(&mut app, "ZULU");
        app.update();
        assert!(app.world().resource::<InfoPopup>().pinned.is_none());
    }

    #[test]
    fn no_rebuild_without_changes() {
        let mut app = test_app();
        app.update();
        let rebuilds = app.world().resource::<ProjectionSummary>().rebuilds;
        app.update();
        app.update();
        assert_eq!(app.world().resource::<ProjectionSummary>().rebuilds, rebuilds);
    }
}
