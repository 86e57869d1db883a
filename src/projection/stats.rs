use std::collections::BTreeSet;

use super::{EntityKind, RenderableEntity};

/// Per-kind counts of a projection, for the info display
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionStats {
    pub waypoints: usize,
    pub obstacles: usize,
    pub airspace: usize,
    /// Procedures with at least one visible route or leg
    pub procedures: usize,
    pub routes: usize,
    pub legs: usize,
    pub total: usize,
}

impl ProjectionStats {
    pub fn from_entities(entities: &[RenderableEntity]) -> Self {
        let mut stats = Self::default();
        let mut procedures = BTreeSet::new();
        for entity in entities {
            match entity.kind {
                EntityKind::Runway => {}
                EntityKind::Waypoint => stats.waypoints += 1,
                EntityKind::Obstacle(_) => stats.obstacles += 1,
                EntityKind::Airspace => stats.airspace += 1,
                EntityKind::ProcedureRoute(category) => {
                    stats.routes += 1;
                    procedures.insert((category, entity.name.as_str()));
                }
                EntityKind::ProcedureLeg(category) => {
                    stats.legs += 1;
                    // Leg names are "<procedure> #<seq>"
                    let procedure = entity
                        .name
                        .rsplit_once(" #")
                        .map_or(entity.name.as_str(), |(name, _)| name);
                    procedures.insert((category, procedure));
                }
            }
        }
        stats.procedures = procedures.len();
        stats.total = entities.len();
        stats
    }
}
