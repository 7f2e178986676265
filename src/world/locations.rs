//! Named quest locations
//!
//! Areas on the map that explore objectives point at, plus simple
//! navigation hints toward them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Map;
use crate::ecs::Position;

/// A named area on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestLocation {
    pub location_id: String,
    pub area_name: String,
    pub position: Position,
    /// Radius in tiles (Chebyshev)
    pub radius: i32,
    pub description: String,
    #[serde(default)]
    pub discovered: bool,
}

impl QuestLocation {
    pub fn new(
        location_id: impl Into<String>,
        area_name: impl Into<String>,
        position: Position,
        radius: i32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            area_name: area_name.into(),
            position,
            radius,
            description: description.into(),
            discovered: false,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.position.chebyshev_distance(&pos) <= self.radius
    }
}

/// All known quest locations, keyed by id
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: BTreeMap<String, QuestLocation>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location. Returns false if the id is taken.
    pub fn add(&mut self, location: QuestLocation) -> bool {
        if self.locations.contains_key(&location.location_id) {
            log::warn!("Location '{}' already registered", location.location_id);
            return false;
        }
        self.locations.insert(location.location_id.clone(), location);
        true
    }

    pub fn get(&self, id: &str) -> Option<&QuestLocation> {
        self.locations.get(id)
    }

    /// Mark a location discovered. Returns false for unknown ids.
    pub fn discover(&mut self, id: &str) -> bool {
        match self.locations.get_mut(id) {
            Some(loc) => {
                loc.discovered = true;
                true
            }
            None => false,
        }
    }

    /// First location whose area contains `pos`
    pub fn location_at(&self, pos: Position) -> Option<&QuestLocation> {
        self.locations.values().find(|l| l.contains(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestLocation> {
        self.locations.values()
    }

    /// Ids of discovered locations (for saves)
    pub fn discovered_ids(&self) -> Vec<String> {
        self.locations
            .values()
            .filter(|l| l.discovered)
            .map(|l| l.location_id.clone())
            .collect()
    }

    /// Compass direction from `from` toward a location
    pub fn direction_to(&self, from: Position, id: &str) -> Option<&'static str> {
        let loc = self.get(id)?;
        let dx = loc.position.x - from.x;
        let dy = loc.position.y - from.y;
        Some(if dx.abs() > dy.abs() {
            if dx > 0 { "East" } else { "West" }
        } else if dy > 0 {
            "South"
        } else {
            "North"
        })
    }

    /// One-line hint for the quest log
    pub fn navigation_hint(&self, from: Position, id: &str) -> String {
        let Some(loc) = self.get(id) else {
            return "Location not found".to_string();
        };
        if !loc.discovered {
            return format!("Search for {}", loc.description);
        }
        let dx = (loc.position.x - from.x) as f32;
        let dy = (loc.position.y - from.y) as f32;
        let distance = (dx * dx + dy * dy).sqrt() as i32;
        let direction = self.direction_to(from, id).unwrap_or("North");
        format!("Head {} to {} ({} tiles away)", direction, loc.area_name, distance)
    }

    /// Walkable marker tiles around a location, on rings in the eight compass directions
    pub fn objective_markers(&self, map: &Map, id: &str) -> Vec<Position> {
        const COMPASS: [(i32, i32); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

        let Some(loc) = self.get(id) else {
            return Vec::new();
        };
        let mut markers = Vec::new();
        for r in 1..=loc.radius {
            for (dx, dy) in COMPASS {
                let p = loc.position.offset(dx * r, dy * r);
                if map.is_walkable(p.x, p.y) {
                    markers.push(p);
                }
            }
        }
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocationRegistry {
        let mut reg = LocationRegistry::new();
        reg.add(QuestLocation::new("old_well", "Old Well", Position::new(10, 10), 2, "a crumbling well"));
        reg
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = registry();
        assert!(!reg.add(QuestLocation::new("old_well", "Dup", Position::new(0, 0), 1, "")));
    }

    #[test]
    fn test_location_at_uses_radius() {
        let reg = registry();
        assert!(reg.location_at(Position::new(12, 8)).is_some());
        assert!(reg.location_at(Position::new(13, 10)).is_none());
    }

    #[test]
    fn test_navigation_hint() {
        let mut reg = registry();
        assert_eq!(reg.navigation_hint(Position::new(0, 10), "old_well"), "Search for a crumbling well");
        reg.discover("old_well");
        assert_eq!(
            reg.navigation_hint(Position::new(0, 10), "old_well"),
            "Head East to Old Well (10 tiles away)"
        );
        assert_eq!(reg.direction_to(Position::new(10, 20), "old_well"), Some("North"));
    }

    #[test]
    fn test_markers_are_walkable() {
        let reg = registry();
        let mut map = Map::new(20, 20);
        map.set_tile(11, 10, super::super::TileType::Rock);
        let markers = reg.objective_markers(&map, "old_well");
        assert_eq!(markers.len(), 15);
        assert!(!markers.contains(&Position::new(11, 10)));
    }
}
