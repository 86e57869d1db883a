//! View filter state.
//!
//! `FilterState` is an immutable value: every transition returns a new value,
//! and the panel swaps the whole thing into the `ViewFilters` resource. Bevy's
//! change detection on that resource is what triggers a scene rebuild.

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::{ObstacleType, ProcedureCategory};

/// Top-level map layers that can be toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Waypoints,
    Obstacles,
    Airspace,
    Procedure(ProcedureCategory),
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Waypoints,
        Layer::Obstacles,
        Layer::Airspace,
        Layer::Procedure(ProcedureCategory::Sid),
        Layer::Procedure(ProcedureCategory::Star),
        Layer::Procedure(ProcedureCategory::Approach),
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Layer::Waypoints => "Waypoints",
            Layer::Obstacles => "Obstacles",
            Layer::Airspace => "Airspace",
            Layer::Procedure(category) => category.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub waypoints: bool,
    pub obstacles: bool,
    pub airspace: bool,
    pub sid: bool,
    pub star: bool,
    pub approach: bool,
    pub obstacle_types: BTreeMap<ObstacleType, bool>,
    /// Waypoint source tag -> enabled. A tag with no entry counts as disabled.
    pub sources: BTreeMap<String, bool>,
    pub search: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            waypoints: true,
            obstacles: true,
            airspace: true,
            sid: true,
            star: true,
            approach: true,
            obstacle_types: ObstacleType::ALL.iter().map(|t| (*t, true)).collect(),
            sources: BTreeMap::new(),
            search: String::new(),
        }
    }
}

impl FilterState {
    pub fn layer(&self, layer: Layer) -> bool {
        match layer {
            Layer::Waypoints => self.waypoints,
            Layer::Obstacles => self.obstacles,
            Layer::Airspace => self.airspace,
            Layer::Procedure(ProcedureCategory::Sid) => self.sid,
            Layer::Procedure(ProcedureCategory::Star) => self.star,
            Layer::Procedure(ProcedureCategory::Approach) => self.approach,
        }
    }

    pub fn with_layer(mut self, layer: Layer, enabled: bool) -> Self {
        let slot = match layer {
            Layer::Waypoints => &mut self.waypoints,
            Layer::Obstacles => &mut self.obstacles,
            Layer::Airspace => &mut self.airspace,
            Layer::Procedure(ProcedureCategory::Sid) => &mut self.sid,
            Layer::Procedure(ProcedureCategory::Star) => &mut self.star,
            Layer::Procedure(ProcedureCategory::Approach) => &mut self.approach,
        };
        *slot = enabled;
        self
    }

    /// Types without an entry are shown
    pub fn obstacle_type(&self, obstacle_type: ObstacleType) -> bool {
        self.obstacle_types.get(&obstacle_type).copied().unwrap_or(true)
    }

    pub fn with_obstacle_type(mut self, obstacle_type: ObstacleType, enabled: bool) -> Self {
        self.obstacle_types.insert(obstacle_type, enabled);
        self
    }

    pub fn source(&self, tag: &str) -> bool {
        self.sources.get(tag).copied().unwrap_or(false)
    }

    pub fn with_source(mut self, tag: impl Into<String>, enabled: bool) -> Self {
        self.sources.insert(tag.into(), enabled);
        self
    }

    /// Register the given source tags, enabled. Tags already present keep their setting.
    pub fn with_sources(mut self, tags: BTreeSet<String>) -> Self {
        for tag in tags {
            self.sources.entry(tag).or_insert(true);
        }
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Case-insensitive substring match against the search term as typed.
    /// An empty term matches everything.
    pub fn matches_search(&self, text: &str) -> bool {
        if self.search.is_empty() {
            return true;
        }
        text.to_lowercase().contains(&self.search.to_lowercase())
    }
}

/// Resource wrapping the current filter value
#[derive(Resource, Default, Clone, PartialEq, Debug)]
pub struct ViewFilters(pub FilterState);

/// Collapsible side-panel sections. Presentation only; projection never reads this.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PanelSections {
    pub layers: bool,
    pub obstacle_types: bool,
    pub waypoint_sources: bool,
    pub info: bool,
}

impl Default for PanelSections {
    fn default() -> Self {
        Self {
            layers: true,
            obstacle_types: false,
            waypoint_sources: false,
            info: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_show_everything_but_unknown_sources() {
        let filters = FilterState::default();
        for layer in Layer::ALL {
            assert!(filters.layer(layer), "{} should default on", layer.display_name());
        }
        for obstacle_type in ObstacleType::ALL {
            assert!(filters.obstacle_type(obstacle_type));
        }
        assert!(!filters.source("NAV1"));
        assert!(filters.search.is_empty());
    }

    #[test]
    fn transitions_return_new_values() {
        let original = FilterState::default();
        let next = original.clone().with_layer(Layer::Procedure(ProcedureCategory::Star), false);
        assert!(original.star);
        assert!(!next.star);
        assert!(!next.layer(Layer::Procedure(ProcedureCategory::Star)));
        assert_ne!(original, next);
    }

    #[test]
    fn with_sources_keeps_existing_settings() {
        let filters = FilterState::default()
            .with_source("NAV1", false)
            .with_sources(["NAV1", "NAV2"].iter().map(|s| s.to_string()).collect());
        assert!(!filters.source("NAV1"));
        assert!(filters.source("NAV2"));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filters = FilterState::default().with_search("alp");
        assert!(filters.matches_search("ALPHA"));
        assert!(filters.matches_search("xalpx"));
        assert!(!filters.matches_search("BRAVO"));
        assert!(FilterState::default().matches_search("anything"));
    }

    #[test]
    fn search_whitespace_is_part_of_the_term() {
        assert!(!FilterState::default().with_search(" alp").matches_search("ALPHA"));
        assert!(!FilterState::default().with_search("  ").matches_search("ALPHA"));
        assert!(FilterState::default().with_search("P-5").matches_search("p-518"));
    }

    #[test]
    fn obstacle_type_toggle() {
        let filters = FilterState::default().with_obstacle_type(ObstacleType::Tower, false);
        assert!(!filters.obstacle_type(ObstacleType::Tower));
        assert!(filters.obstacle_type(ObstacleType::Building));
    }
}
