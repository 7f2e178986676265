//! Monster spawning over time
//!
//! Spawn points, a periodic spawn timer, and the initial population.

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::monsters::{spawn_monster, MonsterKind, MonsterTemplates};
use crate::ecs::{BlocksMovement, Monster, Position};
use crate::world::Map;

/// Initial monsters keep at least this distance from the player
const SAFE_RADIUS: i32 = 8;

/// A periodic spawn rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRule {
    pub kind: MonsterKind,
    /// Chance a spawn actually happens when this rule is picked
    pub spawn_chance: f64,
}

/// What the spawner wants placed this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: MonsterKind,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct MonsterSpawner {
    spawn_points: Vec<Position>,
    rules: Vec<(String, SpawnRule)>,
    timer: f32,
    /// Seconds between spawn attempts
    pub interval: f32,
    /// No new spawns while this many monsters are alive
    pub max_active: usize,
}

impl Default for MonsterSpawner {
    fn default() -> Self {
        Self {
            spawn_points: Vec::new(),
            rules: Vec::new(),
            timer: 0.0,
            interval: 10.0,
            max_active: 40,
        }
    }
}

impl MonsterSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spawn_point(&mut self, pos: Position) {
        self.spawn_points.push(pos);
    }

    pub fn remove_spawn_point(&mut self, pos: Position) {
        if let Some(index) = self.spawn_points.iter().position(|p| *p == pos) {
            self.spawn_points.remove(index);
        }
    }

    pub fn spawn_points(&self) -> &[Position] {
        &self.spawn_points
    }

    /// Register (or replace) a named spawn rule
    pub fn register_template(&mut self, name: impl Into<String>, rule: SpawnRule) {
        let name = name.into();
        match self.rules.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = rule,
            None => self.rules.push((name, rule)),
        }
    }

    /// Advance the timer; on expiry maybe produce a spawn request
    pub fn update(&mut self, dt: f32, active_monsters: usize, rng: &mut impl Rng) -> Option<SpawnRequest> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer = 0.0;

        if self.spawn_points.is_empty() || self.rules.is_empty() || active_monsters >= self.max_active {
            return None;
        }

        let (_, rule) = &self.rules[rng.gen_range(0..self.rules.len())];
        if !rng.gen_bool(rule.spawn_chance.clamp(0.0, 1.0)) {
            return None;
        }
        let position = self.spawn_points[rng.gen_range(0..self.spawn_points.len())];
        Some(SpawnRequest { kind: rule.kind, position })
    }
}

/// Populate the map with `count` monsters on free tiles away from the player
pub fn spawn_initial_monsters(
    world: &mut World,
    map: &Map,
    templates: &MonsterTemplates,
    count: usize,
    player_pos: Position,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let occupied: Vec<Position> = world
        .query::<(&Position, &BlocksMovement)>()
        .iter()
        .map(|(_, (p, _))| *p)
        .collect();
    let mut candidates: Vec<Position> = map
        .walkable_tiles()
        .filter(|p| p.chebyshev_distance(&player_pos) >= SAFE_RADIUS && !occupied.contains(p))
        .collect();

    let mut spawned = Vec::with_capacity(count);
    while spawned.len() < count && !candidates.is_empty() {
        let pos = candidates.swap_remove(rng.gen_range(0..candidates.len()));
        let Some(template) = templates.pick(rng) else {
            log::warn!("No monster templates with a positive spawn weight");
            break;
        };
        spawned.push(spawn_monster(world, template, pos));
    }
    log::info!("Spawned {} initial monsters", spawned.len());
    spawned
}

/// Number of living monsters
pub fn count_monsters(world: &World) -> usize {
    world.query::<&Monster>().iter().count()
}
