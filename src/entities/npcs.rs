//! NPC entity creation
//!
//! NPCs are non-hostile characters the player talks to. Each points at a
//! dialog tree and may hand out quests.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::ecs::{BlocksMovement, Name, Position, Renderable};

fn default_interaction_radius() -> i32 {
    2
}

/// NPC component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub npc_id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub dialog_id: Option<String>,
    #[serde(default)]
    pub quest_giver: bool,
    /// Tiles (Chebyshev)
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: i32,
}

impl Npc {
    pub fn new(npc_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            npc_id: npc_id.into(),
            name: name.into(),
            title: String::new(),
            dialog_id: None,
            quest_giver: false,
            interaction_radius: default_interaction_radius(),
        }
    }

    /// Name with title, e.g. "Captain Thorne, Guard Captain"
    pub fn full_name(&self) -> String {
        if self.title.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.title)
        }
    }

    pub fn glyph(&self) -> char {
        if self.quest_giver { '!' } else { '☺' }
    }

    pub fn color(&self) -> (u8, u8, u8) {
        if self.quest_giver {
            (255, 215, 0)
        } else {
            (180, 180, 255)
        }
    }
}

/// NPC placement as stored in content files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcDef {
    #[serde(flatten)]
    pub npc: Npc,
    pub x: i32,
    pub y: i32,
}

/// Spawn an NPC at a position
pub fn spawn_npc(world: &mut World, npc: Npc, pos: Position) -> Entity {
    let renderable = Renderable::new(npc.glyph(), npc.color()).with_order(60);
    world.spawn((Name::new(npc.name.clone()), pos, renderable, npc, BlocksMovement))
}

/// NPC standing exactly on a tile
pub fn npc_at(world: &World, pos: Position) -> Option<Entity> {
    world
        .query::<(&Position, &Npc)>()
        .iter()
        .find(|(_, (p, _))| **p == pos)
        .map(|(e, _)| e)
}

/// Closest NPC whose interaction radius reaches the player
pub fn npc_in_range(world: &World, player_pos: Position) -> Option<Entity> {
    world
        .query::<(&Position, &Npc)>()
        .iter()
        .filter(|(_, (p, npc))| p.chebyshev_distance(&player_pos) <= npc.interaction_radius)
        .min_by_key(|(_, (p, _))| p.chebyshev_distance(&player_pos))
        .map(|(e, _)| e)
}
