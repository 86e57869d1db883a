use bevy::prelude::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// `null` reads as the type's default instead of failing the document
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep the well-formed pairs of a coordinate list and drop the rest
fn pairs_from_value(value: Value) -> Vec<LonLat> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<LonLat>(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_coordinates<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<LonLat>, D::Error> {
    Ok(pairs_from_value(Value::deserialize(deserializer)?))
}

fn lenient_rings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<LonLat>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(rings) => rings.into_iter().map(pairs_from_value).collect(),
        _ => Vec::new(),
    })
}

/// Whole numbers given as integers, floats or numeric strings
fn lenient_seq<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let seq = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(seq.and_then(|n| u32::try_from(n).ok()))
}

/// Non-numeric altitudes read as absent
fn lenient_altitude<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

/// Metadata for the home airport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirportInfo {
    /// Korean display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_kr: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icao: String,
    /// Field elevation
    #[serde(default, deserialize_with = "null_as_default")]
    pub elevation: f64,
}

/// A `[lon, lat]` pair. Extra trailing values (e.g. altitude) are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl<'de> Deserialize<'de> for LonLat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<f64>::deserialize(deserializer)?;
        match raw.as_slice() {
            [lon, lat, ..] => Ok(LonLat::new(*lon, *lat)),
            _ => Err(serde::de::Error::invalid_length(
                raw.len(),
                &"a [lon, lat] coordinate pair",
            )),
        }
    }
}

/// Named navigational point. The name is the key of the `waypoints` object.
#[derive(Debug, Clone, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    /// Display altitude; projection substitutes a default when absent
    #[serde(default, deserialize_with = "lenient_altitude")]
    pub altitude: Option<f64>,
    /// Provenance tags (which source tables listed this fix)
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
}

/// Obstacle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
pub enum ObstacleType {
    Building,
    Tower,
    Natural,
    Tree,
    Navaid,
    /// Catch-all, also used for any type string we don't recognise
    #[default]
    #[serde(rename = "ETC", other)]
    Etc,
}

impl ObstacleType {
    pub const ALL: [ObstacleType; 6] = [
        ObstacleType::Building,
        ObstacleType::Tower,
        ObstacleType::Natural,
        ObstacleType::Tree,
        ObstacleType::Navaid,
        ObstacleType::Etc,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ObstacleType::Building => "Building",
            ObstacleType::Tower => "Tower",
            ObstacleType::Natural => "Natural",
            ObstacleType::Tree => "Tree",
            ObstacleType::Navaid => "Navaid",
            ObstacleType::Etc => "ETC",
        }
    }

    /// Column color for this obstacle type
    pub fn color(&self) -> Color {
        match self {
            ObstacleType::Building => Color::srgb(0.55, 0.6, 0.7),  // Slate
            ObstacleType::Tower => Color::srgb(1.0, 0.25, 0.25),    // Red
            ObstacleType::Natural => Color::srgb(0.65, 0.45, 0.25), // Brown
            ObstacleType::Tree => Color::srgb(0.2, 0.75, 0.3),      // Green
            ObstacleType::Navaid => Color::srgb(0.7, 0.35, 1.0),    // Purple
            ObstacleType::Etc => Color::srgb(1.0, 0.65, 0.0),       // Orange
        }
    }
}

fn id_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "obstacle id must be a string or number, got {}",
            other
        ))),
    }
}

/// Unknown strings, `null` and non-string values all become `Etc`
fn lenient_obstacle_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObstacleType, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::String(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => ObstacleType::Etc,
    })
}

/// Point hazard with vertical extent
#[derive(Debug, Clone, Deserialize)]
pub struct Obstacle {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_obstacle_type")]
    pub obstacle_type: ObstacleType,
    pub lat: f64,
    pub lon: f64,
    /// Height above ground
    pub elevation: f64,
}

/// Bounded volume: polygon footprint times an altitude band
#[derive(Debug, Clone, Deserialize)]
pub struct AirspaceZone {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_altitude")]
    pub base_alt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_altitude")]
    pub top_alt: Option<f64>,
    /// Polygon rings; only the first (outer) ring is drawn
    #[serde(default, deserialize_with = "lenient_rings")]
    pub coordinates: Vec<Vec<LonLat>>,
}

impl AirspaceZone {
    /// Outer boundary ring, if it has at least one vertex
    pub fn outer_ring(&self) -> Option<&[LonLat]> {
        self.coordinates
            .first()
            .map(Vec::as_slice)
            .filter(|ring| !ring.is_empty())
    }
}

/// Procedure family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcedureCategory {
    Sid,
    Star,
    Approach,
}

impl ProcedureCategory {
    pub const ALL: [ProcedureCategory; 3] = [
        ProcedureCategory::Sid,
        ProcedureCategory::Star,
        ProcedureCategory::Approach,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ProcedureCategory::Sid => "SID",
            ProcedureCategory::Star => "STAR",
            ProcedureCategory::Approach => "APPROACH",
        }
    }

    /// Line color for routes and legs of this category
    pub fn color(&self) -> Color {
        match self {
            ProcedureCategory::Sid => Color::srgb(0.0, 0.9, 0.45),      // Green
            ProcedureCategory::Star => Color::srgb(1.0, 0.8, 0.0),      // Amber
            ProcedureCategory::Approach => Color::srgb(1.0, 0.3, 0.85), // Magenta
        }
    }
}

/// A sub-segment of a procedure with its own altitude band
#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureLeg {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub seq: Option<u32>,
    #[serde(default, deserialize_with = "lenient_altitude")]
    pub start_alt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_altitude")]
    pub end_alt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<LonLat>,
}

/// Named flight path
#[derive(Debug, Clone, Deserialize)]
pub struct Procedure {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Source table the procedure was extracted from
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: String,
    /// Simplified overall route
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<LonLat>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub legs: Vec<ProcedureLeg>,
}

/// Procedures grouped by category, as keyed in the source document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcedureSet {
    #[serde(rename = "SID", default, deserialize_with = "null_as_default")]
    pub sid: Vec<Procedure>,
    #[serde(rename = "STAR", default, deserialize_with = "null_as_default")]
    pub star: Vec<Procedure>,
    #[serde(rename = "APPROACH", default, deserialize_with = "null_as_default")]
    pub approach: Vec<Procedure>,
}

impl ProcedureSet {
    pub fn get(&self, category: ProcedureCategory) -> &[Procedure] {
        match category {
            ProcedureCategory::Sid => &self.sid,
            ProcedureCategory::Star => &self.star,
            ProcedureCategory::Approach => &self.approach,
        }
    }

    pub fn len(&self) -> usize {
        self.sid.len() + self.star.len() + self.approach.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The whole aviation dataset. Read-only once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub airport: AirportInfo,
    /// Keyed by waypoint name; ordered so projection output is stable
    #[serde(default, deserialize_with = "null_as_default")]
    pub waypoints: BTreeMap<String, Waypoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub obstacles: Vec<Obstacle>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub airspace: Vec<AirspaceZone>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub procedures: ProcedureSet,
}

impl Dataset {
    /// Every distinct waypoint source tag
    pub fn waypoint_sources(&self) -> BTreeSet<String> {
        self.waypoints
            .values()
            .flat_map(|w| w.sources.iter().cloned())
            .collect()
    }

    /// Number of obstacles of the given type
    pub fn obstacle_count(&self, obstacle_type: ObstacleType) -> usize {
        self.obstacles
            .iter()
            .filter(|o| o.obstacle_type == obstacle_type)
            .count()
    }
}
