//! Entity creation and management

pub mod monsters;
pub mod npcs;
pub mod player;
pub mod spawner;

pub use monsters::{
    spawn_monster, split_slime, MonsterFamily, MonsterKind, MonsterTemplate, MonsterTemplates,
};
pub use npcs::{npc_at, npc_in_range, spawn_npc, Npc, NpcDef};
pub use player::spawn_player;
pub use spawner::{count_monsters, spawn_initial_monsters, MonsterSpawner, SpawnRequest, SpawnRule};
