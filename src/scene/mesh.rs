use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use earcutr::earcut;

/// Drop a trailing vertex that repeats the first one (GeoJSON-style closed ring)
pub fn open_ring(ring: &[Vec2]) -> &[Vec2] {
    match ring {
        [first, .., last] if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Ear-clip a ring into triangles, as indices into the ring.
/// Empty when the ring cannot be triangulated.
pub fn cap_triangles(ring: &[Vec2]) -> Vec<u32> {
    let coords: Vec<f64> = ring.iter().flat_map(|p| [p.x as f64, p.y as f64]).collect();
    match earcut(&coords, &[], 2) {
        Ok(indices) => indices.into_iter().map(|i| i as u32).collect(),
        Err(_) => {
            warn!("Airspace cap triangulation failed for {} vertices", ring.len());
            Vec::new()
        }
    }
}

/// Prism mesh for an airspace volume.
///
/// `ring` holds ground-plane vertices as (x, z). Walls are built for every
/// edge; top and bottom caps are ear-clipped so concave boundaries stay
/// inside the zone, and only emitted for rings of three or more vertices.
/// Meant for a double-sided material, so winding is not relied on.
pub fn extruded_polygon(ring: &[Vec2], base: f32, top: f32) -> Mesh {
    let ring = open_ring(ring);
    let n = ring.len();

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    if n >= 2 {
        let edges = if n == 2 { 1 } else { n };
        for i in 0..edges {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            let edge = b - a;
            let normal = Vec3::new(edge.y, 0.0, -edge.x).normalize_or_zero();
            let start = positions.len() as u32;
            for (p, y) in [(a, base), (b, base), (b, top), (a, top)] {
                positions.push([p.x, y, p.y]);
                normals.push(normal.to_array());
            }
            indices.extend_from_slice(&[start, start + 1, start + 2, start, start + 2, start + 3]);
        }
    }

    if n >= 3 {
        let cap = cap_triangles(ring);
        for (y, normal) in [(top, Vec3::Y), (base, Vec3::NEG_Y)] {
            let start = positions.len() as u32;
            for p in ring {
                positions.push([p.x, y, p.y]);
                normals.push(normal.to_array());
            }
            indices.extend(cap.iter().map(|i| start + i));
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}
