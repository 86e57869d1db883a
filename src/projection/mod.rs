//! Entity projection.
//!
//! `project` maps the loaded dataset plus the current filter state to a flat,
//! declarative list of renderable entities. It has no side effects; the scene
//! adapter owns spawning and despawning.

pub mod stats;

use bevy::prelude::*;

use crate::dataset::{
    AirspaceZone, Dataset, LonLat, Obstacle, ObstacleType, Procedure, ProcedureCategory, Waypoint,
};
use crate::filters::{FilterState, Layer};

pub use stats::ProjectionStats;

/// Waypoint display altitude when the record has none
pub const DEFAULT_WAYPOINT_ALTITUDE: f64 = 100.0;
pub const DEFAULT_AIRSPACE_BASE: f64 = 0.0;
pub const DEFAULT_AIRSPACE_TOP: f64 = 3000.0;
/// Synthetic climb for simplified procedure routes: 500 + index * 50
pub const ROUTE_BASE_ALTITUDE: f64 = 500.0;
pub const ROUTE_ALTITUDE_STEP: f64 = 50.0;
/// Leg altitude when neither start nor end altitude is given
pub const DEFAULT_LEG_ALTITUDE: f64 = 1000.0;

pub const WAYPOINT_MARKER_RADIUS: f32 = 40.0;
pub const OBSTACLE_BOTTOM_RADIUS: f64 = 30.0;
pub const OBSTACLE_TOP_RADIUS: f64 = 12.0;
pub const ROUTE_LINE_WIDTH: f32 = 4.0;
pub const LEG_LINE_WIDTH: f32 = 2.0;

const WAYPOINT_COLOR: Color = Color::srgb(0.0, 0.85, 1.0);
const WAYPOINT_OUTLINE: Color = Color::WHITE;
const LABEL_COLOR: Color = Color::WHITE;
const AIRSPACE_FILL: Color = Color::srgba(0.25, 0.55, 1.0, 0.18);
const AIRSPACE_OUTLINE: Color = Color::srgba(0.45, 0.75, 1.0, 0.9);
const RUNWAY_COLOR: Color = Color::srgb(0.82, 0.82, 0.85);

/// Fixed runway of the home airport, always drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunwaySpec {
    pub name: &'static str,
    pub start: LonLat,
    pub end: LonLat,
    pub width_m: f64,
}

/// RKPK 18L/36R
pub const HOME_RUNWAY: RunwaySpec = RunwaySpec {
    name: "18L/36R",
    start: LonLat::new(128.9356, 35.1925),
    end: LonLat::new(128.9417, 35.1640),
    width_m: 60.0,
};

/// Geographic position; altitude in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
}

impl GeoPosition {
    pub const fn new(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt }
    }

    pub fn at(coord: LonLat, alt: f64) -> Self {
        Self::new(coord.lon, coord.lat, alt)
    }
}

/// What a projected entity represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Runway,
    Waypoint,
    Obstacle(ObstacleType),
    Airspace,
    ProcedureRoute(ProcedureCategory),
    ProcedureLeg(ProcedureCategory),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub color: Color,
}

impl Label {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: LABEL_COLOR }
    }
}

/// Renderer primitive plus styling
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Flat ground strip between two points
    Corridor {
        start: GeoPosition,
        end: GeoPosition,
        width: f64,
        color: Color,
    },
    Point {
        position: GeoPosition,
        radius: f32,
        color: Color,
        outline: Color,
        label: Label,
    },
    /// Vertical column; `center` sits at half its length so it spans ground..length
    Cylinder {
        center: GeoPosition,
        length: f64,
        top_radius: f64,
        bottom_radius: f64,
        color: Color,
        label: Label,
    },
    ExtrudedPolygon {
        ring: Vec<LonLat>,
        base: f64,
        top: f64,
        fill: Color,
        outline: Color,
    },
    Polyline {
        positions: Vec<GeoPosition>,
        width: f32,
        color: Color,
        glow: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableEntity {
    pub kind: EntityKind,
    pub name: String,
    /// Popup text shown on hover/click
    pub description: String,
    pub shape: Shape,
}

/// Project the dataset through the filters into the full set of visible entities.
pub fn project(dataset: &Dataset, filters: &FilterState) -> Vec<RenderableEntity> {
    let mut entities = vec![runway_entity(&HOME_RUNWAY, dataset.airport.elevation)];

    if filters.layer(Layer::Waypoints) {
        entities.extend(
            dataset
                .waypoints
                .iter()
                .filter(|(name, waypoint)| waypoint_visible(name, waypoint, filters))
                .map(|(name, waypoint)| waypoint_entity(name, waypoint)),
        );
    }

    if filters.layer(Layer::Obstacles) {
        entities.extend(
            dataset
                .obstacles
                .iter()
                .filter(|o| filters.obstacle_type(o.obstacle_type) && filters.matches_search(&o.id))
                .map(obstacle_entity),
        );
    }

    if filters.layer(Layer::Airspace) {
        entities.extend(dataset.airspace.iter().filter_map(airspace_entity));
    }

    for category in ProcedureCategory::ALL {
        if !filters.layer(Layer::Procedure(category)) {
            continue;
        }
        for procedure in dataset.procedures.get(category) {
            entities.extend(procedure_entities(category, procedure));
        }
    }

    entities
}

fn waypoint_visible(name: &str, waypoint: &Waypoint, filters: &FilterState) -> bool {
    filters.matches_search(name) && waypoint.sources.iter().any(|tag| filters.source(tag))
}

fn runway_entity(runway: &RunwaySpec, elevation: f64) -> RenderableEntity {
    RenderableEntity {
        kind: EntityKind::Runway,
        name: format!("RWY {}", runway.name),
        description: format!("Runway {}\nWidth {:.0} m", runway.name, runway.width_m),
        shape: Shape::Corridor {
            start: GeoPosition::at(runway.start, elevation),
            end: GeoPosition::at(runway.end, elevation),
            width: runway.width_m,
            color: RUNWAY_COLOR,
        },
    }
}

fn waypoint_entity(name: &str, waypoint: &Waypoint) -> RenderableEntity {
    let altitude = waypoint.altitude.unwrap_or(DEFAULT_WAYPOINT_ALTITUDE);
    RenderableEntity {
        kind: EntityKind::Waypoint,
        name: name.to_string(),
        description: format!(
            "Waypoint {}\nLat {:.5}  Lon {:.5}\nAltitude {:.0} m\nSources: {}",
            name,
            waypoint.lat,
            waypoint.lon,
            altitude,
            waypoint.sources.join(", "),
        ),
        shape: Shape::Point {
            position: GeoPosition::new(waypoint.lon, waypoint.lat, altitude),
            radius: WAYPOINT_MARKER_RADIUS,
            color: WAYPOINT_COLOR,
            outline: WAYPOINT_OUTLINE,
            label: Label::new(name),
        },
    }
}

fn obstacle_entity(obstacle: &Obstacle) -> RenderableEntity {
    let kind = obstacle.obstacle_type;
    RenderableEntity {
        kind: EntityKind::Obstacle(kind),
        name: obstacle.id.clone(),
        description: format!(
            "Obstacle {} ({})\nLat {:.5}  Lon {:.5}\nElevation {:.1} m",
            obstacle.id,
            kind.display_name(),
            obstacle.lat,
            obstacle.lon,
            obstacle.elevation,
        ),
        shape: Shape::Cylinder {
            center: GeoPosition::new(obstacle.lon, obstacle.lat, obstacle.elevation / 2.0),
            length: obstacle.elevation,
            top_radius: OBSTACLE_TOP_RADIUS,
            bottom_radius: OBSTACLE_BOTTOM_RADIUS,
            color: kind.color(),
            label: Label::new(format!("{} {:.0}m", obstacle.id, obstacle.elevation)),
        },
    }
}

fn airspace_entity(zone: &AirspaceZone) -> Option<RenderableEntity> {
    let ring = zone.outer_ring()?;
    let base = zone.base_alt.unwrap_or(DEFAULT_AIRSPACE_BASE);
    let top = zone.top_alt.unwrap_or(DEFAULT_AIRSPACE_TOP);
    let name = zone.name.clone().unwrap_or_else(|| "Unnamed airspace".to_string());
    Some(RenderableEntity {
        kind: EntityKind::Airspace,
        description: format!("Airspace {}\n{:.0} - {:.0} m", name, base, top),
        name,
        shape: Shape::ExtrudedPolygon {
            ring: ring.to_vec(),
            base,
            top,
            fill: AIRSPACE_FILL,
            outline: AIRSPACE_OUTLINE,
        },
    })
}

/// Route altitude of the `index`th point of a simplified route
pub fn route_altitude(index: usize) -> f64 {
    ROUTE_BASE_ALTITUDE + index as f64 * ROUTE_ALTITUDE_STEP
}

fn procedure_entities(category: ProcedureCategory, procedure: &Procedure) -> Vec<RenderableEntity> {
    let color = category.color();
    let mut entities = Vec::new();

    if procedure.coordinates.len() >= 2 {
        entities.push(RenderableEntity {
            kind: EntityKind::ProcedureRoute(category),
            name: procedure.name.clone(),
            description: format!(
                "{} {}\nTable: {}\n{} route points",
                category.display_name(),
                procedure.name,
                procedure.table,
                procedure.coordinates.len(),
            ),
            shape: Shape::Polyline {
                positions: procedure
                    .coordinates
                    .iter()
                    .enumerate()
                    .map(|(i, c)| GeoPosition::at(*c, route_altitude(i)))
                    .collect(),
                width: ROUTE_LINE_WIDTH,
                color,
                glow: true,
            },
        });
    }

    for (index, leg) in procedure.legs.iter().enumerate() {
        if leg.coordinates.len() < 2 {
            continue;
        }
        let altitude = leg.start_alt.or(leg.end_alt).unwrap_or(DEFAULT_LEG_ALTITUDE);
        let seq = leg.seq.unwrap_or(index as u32 + 1);
        entities.push(RenderableEntity {
            kind: EntityKind::ProcedureLeg(category),
            name: format!("{} #{}", procedure.name, seq),
            description: format!(
                "{} {} leg {}\nTable: {}\nAltitude {:.0} m",
                category.display_name(),
                procedure.name,
                seq,
                procedure.table,
                altitude,
            ),
            shape: Shape::Polyline {
                positions: leg.coordinates.iter().map(|c| GeoPosition::at(*c, altitude)).collect(),
                width: LEG_LINE_WIDTH,
                color,
                glow: false,
            },
        });
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{parse_dataset, ProcedureLeg};

    fn alpha_dataset() -> Dataset {
        parse_dataset(
            r#"{"waypoints": {"ALPHA": {"lat": 35.0, "lon": 129.0, "sources": ["NAV1"]}}}"#,
        )
        .unwrap()
    }

    fn nav1_filters() -> FilterState {
        FilterState::default().with_source("NAV1", true)
    }

    fn of_kind(entities: &[RenderableEntity], pred: impl Fn(EntityKind) -> bool) -> Vec<&RenderableEntity> {
        entities.iter().filter(|e| pred(e.kind)).collect()
    }

    fn sample_dataset() -> Dataset {
        parse_dataset(
            r#"{
                "airport": {"name_kr": "김해", "icao": "RKPK", "elevation": 4},
                "waypoints": {
                    "ALPHA": {"lat": 35.0, "lon": 129.0, "sources": ["NAV1"]},
                    "BRAVO": {"lat": 35.1, "lon": 129.1, "altitude": 900, "sources": ["NAV2"]},
                    "CHARLIE": {"lat": 35.2, "lon": 129.2, "sources": ["NAV1", "NAV2"]}
                },
                "obstacles": [
                    {"id": "42", "type": "Tower", "lat": 1, "lon": 1, "elevation": 80},
                    {"id": "B-7", "type": "Building", "lat": 2, "lon": 2, "elevation": 30},
                    {"id": "X-1", "type": "Crane", "lat": 3, "lon": 3, "elevation": 55}
                ],
                "airspace": [
                    {"name": "P-518", "base_alt": 500, "top_alt": 5000, "coordinates": [[[0, 0], [1, 0], [1, 1]]]},
                    {"coordinates": [[[2, 2], [3, 2], [3, 3]], [[2.1, 2.1], [2.2, 2.1], [2.2, 2.2]]]},
                    {"name": "EMPTY", "coordinates": []},
                    {"name": "EMPTY-RING", "coordinates": [[]]}
                ],
                "procedures": {
                    "SID": [{"name": "DEP1", "table": "sid_tbl",
                             "coordinates": [[0, 0], [1, 1], [2, 2]],
                             "legs": [
                                 {"seq": 1, "start_alt": 1200, "end_alt": 3000, "coordinates": [[0, 0], [1, 1]]},
                                 {"seq": 2, "end_alt": 4000, "coordinates": [[1, 1], [2, 2]]},
                                 {"seq": 3, "coordinates": [[2, 2], [3, 3]]},
                                 {"seq": 4, "coordinates": [[3, 3]]}
                             ]}],
                    "STAR": [{"name": "ARR1", "table": "star_tbl", "coordinates": [[5, 5]]}],
                    "APPROACH": [{"name": "ILS36", "table": "iap_tbl", "coordinates": [[0, 0], [0, 1]]}]
                }
            }"#,
        )
        .unwrap()
    }

    fn everything() -> FilterState {
        FilterState::default()
            .with_source("NAV1", true)
            .with_source("NAV2", true)
    }

    #[test]
    fn alpha_with_empty_search_projects_one_point_at_default_altitude() {
        let entities = project(&alpha_dataset(), &nav1_filters());
        let waypoints = of_kind(&entities, |k| k == EntityKind::Waypoint);
        assert_eq!(waypoints.len(), 1);

        let Shape::Point { position, label, .. } = &waypoints[0].shape else {
            panic!("waypoint should project to a point");
        };
        assert_eq!(*position, GeoPosition::new(129.0, 35.0, 100.0));
        assert_eq!(label.text, "ALPHA");
    }

    #[test]
    fn alpha_with_non_matching_search_projects_no_waypoints() {
        let filters = nav1_filters().with_search("beta");
        let entities = project(&alpha_dataset(), &filters);
        assert!(of_kind(&entities, |k| k == EntityKind::Waypoint).is_empty());
    }

    #[test]
    fn runway_is_always_first() {
        let filters = Layer::ALL
            .iter()
            .fold(FilterState::default(), |f, layer| f.with_layer(*layer, false));
        let entities = project(&sample_dataset(), &filters);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind, EntityKind::Runway);

        let entities = project(&sample_dataset(), &everything());
        assert_eq!(entities[0].kind, EntityKind::Runway);
        assert_eq!(of_kind(&entities, |k| k == EntityKind::Runway).len(), 1);
    }

    #[test]
    fn waypoint_inclusion_follows_layer_search_and_sources() {
        let dataset = sample_dataset();
        let names = |filters: &FilterState| -> Vec<String> {
            of_kind(&project(&dataset, filters), |k| k == EntityKind::Waypoint)
                .into_iter()
                .map(|e| e.name.clone())
                .collect()
        };

        assert_eq!(names(&everything()), vec!["ALPHA", "BRAVO", "CHARLIE"]);
        assert!(names(&everything().with_layer(Layer::Waypoints, false)).is_empty());
        assert_eq!(names(&everything().with_search("ar")), vec!["CHARLIE"]);
        assert_eq!(names(&everything().with_search("BrAv")), vec!["BRAVO"]);
        // CHARLIE survives because one of its sources is still on
        assert_eq!(names(&everything().with_source("NAV2", false)), vec!["ALPHA", "CHARLIE"]);
        // No sources registered at all hides every waypoint
        assert!(names(&FilterState::default()).is_empty());
    }

    #[test]
    fn waypoint_altitude_is_kept_when_present() {
        let entities = project(&sample_dataset(), &everything().with_search("BRAVO"));
        let bravo = of_kind(&entities, |k| k == EntityKind::Waypoint)[0];
        let Shape::Point { position, .. } = &bravo.shape else {
            panic!("expected point");
        };
        assert_eq!(position.alt, 900.0);
    }

    #[test]
    fn tower_toggled_off_is_excluded() {
        let dataset = parse_dataset(
            r#"{"obstacles": [{"id": "42", "type": "Tower", "lat": 1, "lon": 1, "elevation": 80}]}"#,
        )
        .unwrap();
        let filters = FilterState::default().with_obstacle_type(ObstacleType::Tower, false);
        let entities = project(&dataset, &filters);
        assert!(of_kind(&entities, |k| matches!(k, EntityKind::Obstacle(_))).is_empty());

        let entities = project(&dataset, &FilterState::default());
        assert_eq!(of_kind(&entities, |k| matches!(k, EntityKind::Obstacle(_))).len(), 1);
    }

    #[test]
    fn obstacle_column_spans_ground_to_elevation() {
        let entities = project(&sample_dataset(), &everything().with_search("42"));
        let tower = of_kind(&entities, |k| k == EntityKind::Obstacle(ObstacleType::Tower))[0];
        let Shape::Cylinder { center, length, top_radius, bottom_radius, color, .. } = &tower.shape else {
            panic!("obstacle should project to a cylinder");
        };
        assert_eq!(*length, 80.0);
        assert_eq!(center.alt, 40.0);
        assert_eq!(center.alt - length / 2.0, 0.0);
        assert!(bottom_radius > top_radius);
        assert_eq!(*color, ObstacleType::Tower.color());
    }

    #[test]
    fn unknown_obstacle_type_renders_with_fallback_color() {
        let entities = project(&sample_dataset(), &everything());
        let crane = entities.iter().find(|e| e.name == "X-1").unwrap();
        assert_eq!(crane.kind, EntityKind::Obstacle(ObstacleType::Etc));
        let Shape::Cylinder { color, .. } = &crane.shape else {
            panic!("expected cylinder");
        };
        assert_eq!(*color, ObstacleType::Etc.color());

        // The fallback is governed by the ETC toggle
        let hidden = project(&sample_dataset(), &everything().with_obstacle_type(ObstacleType::Etc, false));
        assert!(hidden.iter().all(|e| e.name != "X-1"));
    }

    #[test]
    fn obstacle_search_matches_id() {
        let entities = project(&sample_dataset(), &everything().with_search("b-"));
        let obstacles = of_kind(&entities, |k| matches!(k, EntityKind::Obstacle(_)));
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].name, "B-7");

        let none = project(&sample_dataset(), &everything().with_layer(Layer::Obstacles, false));
        assert!(of_kind(&none, |k| matches!(k, EntityKind::Obstacle(_))).is_empty());
    }

    #[test]
    fn empty_airspace_is_skipped_without_error() {
        let dataset = parse_dataset(r#"{"airspace": [{"name": "EMPTY", "coordinates": []}]}"#).unwrap();
        let entities = project(&dataset, &FilterState::default());
        assert!(of_kind(&entities, |k| k == EntityKind::Airspace).is_empty());
    }

    #[test]
    fn airspace_defaults_and_outer_ring() {
        let entities = project(&sample_dataset(), &everything());
        let zones = of_kind(&entities, |k| k == EntityKind::Airspace);
        assert_eq!(zones.len(), 2);

        let Shape::ExtrudedPolygon { base, top, ring, .. } = &zones[0].shape else {
            panic!("expected polygon");
        };
        assert_eq!((*base, *top), (500.0, 5000.0));
        assert_eq!(ring.len(), 3);

        let Shape::ExtrudedPolygon { base, top, ring, .. } = &zones[1].shape else {
            panic!("expected polygon");
        };
        assert_eq!((*base, *top), (DEFAULT_AIRSPACE_BASE, DEFAULT_AIRSPACE_TOP));
        assert_eq!(ring[0], LonLat::new(2.0, 2.0));
        assert_eq!(zones[1].name, "Unnamed airspace");
    }

    #[test]
    fn search_never_gates_airspace_or_procedures() {
        let filters = everything().with_search("zzz-no-match");
        let entities = project(&sample_dataset(), &filters);
        assert_eq!(of_kind(&entities, |k| k == EntityKind::Airspace).len(), 2);
        assert!(!of_kind(&entities, |k| matches!(k, EntityKind::ProcedureRoute(_))).is_empty());
        assert!(of_kind(&entities, |k| k == EntityKind::Waypoint).is_empty());
        assert!(of_kind(&entities, |k| matches!(k, EntityKind::Obstacle(_))).is_empty());
    }

    #[test]
    fn route_altitude_climbs_fifty_per_point() {
        let entities = project(&sample_dataset(), &everything());
        let route = of_kind(&entities, |k| k == EntityKind::ProcedureRoute(ProcedureCategory::Sid))[0];
        let Shape::Polyline { positions, glow, color, .. } = &route.shape else {
            panic!("expected polyline");
        };
        let altitudes: Vec<f64> = positions.iter().map(|p| p.alt).collect();
        assert_eq!(altitudes, vec![500.0, 550.0, 600.0]);
        assert!(*glow);
        assert_eq!(*color, ProcedureCategory::Sid.color());
    }

    #[test]
    fn single_point_route_is_skipped() {
        let entities = project(&sample_dataset(), &everything());
        assert!(of_kind(&entities, |k| k == EntityKind::ProcedureRoute(ProcedureCategory::Star)).is_empty());
    }

    #[test]
    fn leg_altitude_falls_back_start_end_default() {
        let entities = project(&sample_dataset(), &everything());
        let legs = of_kind(&entities, |k| k == EntityKind::ProcedureLeg(ProcedureCategory::Sid));
        // The fourth leg has a single coordinate and is dropped
        assert_eq!(legs.len(), 3);

        let altitudes: Vec<f64> = legs
            .iter()
            .map(|leg| match &leg.shape {
                Shape::Polyline { positions, glow, .. } => {
                    assert!(!glow);
                    assert!(positions.iter().all(|p| p.alt == positions[0].alt));
                    positions[0].alt
                }
                other => panic!("expected polyline, got {:?}", other),
            })
            .collect();
        assert_eq!(altitudes, vec![1200.0, 4000.0, DEFAULT_LEG_ALTITUDE]);
    }

    #[test]
    fn procedure_categories_are_gated_independently() {
        let filters = everything().with_layer(Layer::Procedure(ProcedureCategory::Sid), false);
        let entities = project(&sample_dataset(), &filters);
        assert!(of_kind(&entities, |k| matches!(
            k,
            EntityKind::ProcedureRoute(ProcedureCategory::Sid) | EntityKind::ProcedureLeg(ProcedureCategory::Sid)
        ))
        .is_empty());
        assert_eq!(
            of_kind(&entities, |k| k == EntityKind::ProcedureRoute(ProcedureCategory::Approach)).len(),
            1
        );
    }

    #[test]
    fn legs_render_without_route() {
        let mut dataset = Dataset::default();
        dataset.procedures.star.push(Procedure {
            name: "ARR2".to_string(),
            table: "star_tbl".to_string(),
            coordinates: Vec::new(),
            legs: vec![ProcedureLeg {
                seq: None,
                start_alt: None,
                end_alt: Some(2500.0),
                coordinates: vec![LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)],
            }],
        });
        let entities = project(&dataset, &FilterState::default());
        let legs = of_kind(&entities, |k| k == EntityKind::ProcedureLeg(ProcedureCategory::Star));
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].name, "ARR2 #1");
    }

    #[test]
    fn projection_is_pure_and_does_not_accumulate() {
        let dataset = sample_dataset();
        let filters = everything();
        let first = project(&dataset, &filters);
        let second = project(&dataset, &filters);
        let third = project(&dataset, &filters);
        assert_eq!(first, second);
        assert_eq!(second.len(), third.len());
    }
}
