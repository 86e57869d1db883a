//! Geodesic helpers and the local scene frame.
//!
//! The scene is a flat local tangent plane around the home coordinate, in
//! Bevy's Y-up convention: X = east, Y = up, -Z = north, one unit per meter.

use bevy::prelude::*;

use crate::projection::GeoPosition;

/// Earth radius in nautical miles (WGS-84 mean radius)
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Earth radius in meters (WGS-84 mean radius)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Conversion factor: meters to feet
pub const METERS_TO_FEET: f64 = 3.28084;

/// Calculate the great-circle distance between two lat/lon points
/// using the Haversine formula. Returns distance in nautical miles.
pub fn haversine_distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_NM * c
}

/// Converts geographic positions to scene coordinates around a fixed origin.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Multiplier applied to altitudes so low procedures stay readable
    pub vertical_exaggeration: f32,
    meters_per_deg_lon: f64,
}

impl LocalFrame {
    pub fn new(origin_lat: f64, origin_lon: f64, vertical_exaggeration: f32) -> Self {
        let meters_per_deg_lat = EARTH_RADIUS_M.to_radians();
        Self {
            origin_lat,
            origin_lon,
            vertical_exaggeration,
            meters_per_deg_lon: meters_per_deg_lat * origin_lat.to_radians().cos(),
        }
    }

    /// Horizontal offset (east, north) in meters from the origin
    pub fn offset_m(&self, lat: f64, lon: f64) -> (f64, f64) {
        let east = (lon - self.origin_lon) * self.meters_per_deg_lon;
        let north = (lat - self.origin_lat) * EARTH_RADIUS_M.to_radians();
        (east, north)
    }

    pub fn to_world(&self, lat: f64, lon: f64, alt_m: f64) -> Vec3 {
        let (east, north) = self.offset_m(lat, lon);
        Vec3::new(
            east as f32,
            alt_m as f32 * self.vertical_exaggeration,
            -north as f32,
        )
    }

    pub fn position(&self, pos: &GeoPosition) -> Vec3 {
        self.to_world(pos.lat, pos.lon, pos.alt)
    }

    /// Scale a vertical extent into scene units
    pub fn height(&self, meters: f64) -> f32 {
        meters as f32 * self.vertical_exaggeration
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}
