//! Monster roster and spawning
//!
//! Every monster kind, its family and look, the stat templates that
//! drive them, and slime splitting.

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ecs::{
    Animation, BlocksMovement, Combat, Health, Monster, Name, Position, Renderable, Speed, XpReward, AI,
};
use crate::world::Map;

/// Size a freshly spawned slime starts at
pub const SLIME_START_SIZE: i32 = 32;
/// Slimes at or below this size no longer split
pub const SLIME_MIN_SIZE: i32 = 16;
/// Size lost per split
const SLIME_SPLIT_SHRINK: i32 = 8;

/// Broad monster families, used for colouring and spawn tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterFamily {
    Basic,
    Elemental,
    Undead,
    Magical,
    Forest,
    Dark,
    Aquatic,
    Insectoid,
    Celestial,
    Construct,
    Plant,
    Desert,
    Mountain,
    Swamp,
    Cosmic,
    Mechanical,
    Crystal,
    Netherworld,
    Spirit,
}

impl MonsterFamily {
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            MonsterFamily::Basic => (255, 60, 60),
            MonsterFamily::Elemental => (255, 140, 40),
            MonsterFamily::Undead => (180, 200, 170),
            MonsterFamily::Magical => (255, 120, 255),
            MonsterFamily::Forest => (90, 170, 60),
            MonsterFamily::Dark => (140, 60, 160),
            MonsterFamily::Aquatic => (60, 160, 220),
            MonsterFamily::Insectoid => (170, 130, 60),
            MonsterFamily::Celestial => (255, 250, 180),
            MonsterFamily::Construct => (170, 170, 190),
            MonsterFamily::Plant => (60, 200, 90),
            MonsterFamily::Desert => (220, 190, 110),
            MonsterFamily::Mountain => (150, 150, 160),
            MonsterFamily::Swamp => (110, 140, 70),
            MonsterFamily::Cosmic => (110, 70, 200),
            MonsterFamily::Mechanical => (200, 200, 90),
            MonsterFamily::Crystal => (140, 240, 255),
            MonsterFamily::Netherworld => (200, 40, 40),
            MonsterFamily::Spirit => (200, 230, 255),
        }
    }
}

/// Every kind of monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterKind {
    // Basic
    Dragon,
    Spider,
    Ghost,
    Skeleton,
    Slime,
    Goblin,
    Orc,
    Troll,
    // Elemental
    FireElemental,
    IceElemental,
    StormElemental,
    EarthGolem,
    // Undead
    Zombie,
    Wraith,
    Vampire,
    Lich,
    // Magical
    Pixie,
    Phoenix,
    Unicorn,
    Griffin,
    // Forest
    Treant,
    Wolf,
    Bear,
    Dryad,
    // Dark
    Demon,
    ShadowStalker,
    Nightmare,
    DarkWizard,
    // Aquatic
    Merfolk,
    Kraken,
    Siren,
    Leviathan,
    // Insectoid
    GiantAnt,
    Scorpion,
    Mantis,
    Beetle,
    // Celestial
    Angel,
    CosmicWyrm,
    VoidWalker,
    // Construct
    ClockworkKnight,
    SteamGolem,
    ArcaneTurret,
    LivingArmor,
    // Plant
    VenusTrap,
    MushroomKing,
    ThornElemental,
    AncientVine,
    // Desert
    SandWurm,
    MummyLord,
    DustDjinn,
    ScarabSwarm,
    // Mountain
    RockGiant,
    Harpy,
    FrostTitan,
    ThunderBird,
    // Swamp
    BogWitch,
    Hydra,
    MushroomZombie,
    WillOWisp,
    // Cosmic
    ElderBeing,
    MindFlayer,
    ChaosSpawn,
    VoidHorror,
    // Mechanical
    MechaDragon,
    LaserHound,
    NanoSwarm,
    WarGolem,
    // Crystal
    CrystalGolem,
    PrismElemental,
    GemBasilisk,
    DiamondPhoenix,
    // Netherworld
    SoulReaper,
    ChaosDemon,
    HellKnight,
    PlagueBearer,
    // Spirit
    FireSpirit,
    WaterSpirit,
    EarthSpirit,
    AirSpirit,
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 79] = [
        MonsterKind::Dragon, MonsterKind::Spider, MonsterKind::Ghost, MonsterKind::Skeleton,
        MonsterKind::Slime, MonsterKind::Goblin, MonsterKind::Orc, MonsterKind::Troll,
        MonsterKind::FireElemental, MonsterKind::IceElemental, MonsterKind::StormElemental, MonsterKind::EarthGolem,
        MonsterKind::Zombie, MonsterKind::Wraith, MonsterKind::Vampire, MonsterKind::Lich,
        MonsterKind::Pixie, MonsterKind::Phoenix, MonsterKind::Unicorn, MonsterKind::Griffin,
        MonsterKind::Treant, MonsterKind::Wolf, MonsterKind::Bear, MonsterKind::Dryad,
        MonsterKind::Demon, MonsterKind::ShadowStalker, MonsterKind::Nightmare, MonsterKind::DarkWizard,
        MonsterKind::Merfolk, MonsterKind::Kraken, MonsterKind::Siren, MonsterKind::Leviathan,
        MonsterKind::GiantAnt, MonsterKind::Scorpion, MonsterKind::Mantis, MonsterKind::Beetle,
        MonsterKind::Angel, MonsterKind::CosmicWyrm, MonsterKind::VoidWalker,
        MonsterKind::ClockworkKnight, MonsterKind::SteamGolem, MonsterKind::ArcaneTurret, MonsterKind::LivingArmor,
        MonsterKind::VenusTrap, MonsterKind::MushroomKing, MonsterKind::ThornElemental, MonsterKind::AncientVine,
        MonsterKind::SandWurm, MonsterKind::MummyLord, MonsterKind::DustDjinn, MonsterKind::ScarabSwarm,
        MonsterKind::RockGiant, MonsterKind::Harpy, MonsterKind::FrostTitan, MonsterKind::ThunderBird,
        MonsterKind::BogWitch, MonsterKind::Hydra, MonsterKind::MushroomZombie, MonsterKind::WillOWisp,
        MonsterKind::ElderBeing, MonsterKind::MindFlayer, MonsterKind::ChaosSpawn, MonsterKind::VoidHorror,
        MonsterKind::MechaDragon, MonsterKind::LaserHound, MonsterKind::NanoSwarm, MonsterKind::WarGolem,
        MonsterKind::CrystalGolem, MonsterKind::PrismElemental, MonsterKind::GemBasilisk, MonsterKind::DiamondPhoenix,
        MonsterKind::SoulReaper, MonsterKind::ChaosDemon, MonsterKind::HellKnight, MonsterKind::PlagueBearer,
        MonsterKind::FireSpirit, MonsterKind::WaterSpirit, MonsterKind::EarthSpirit, MonsterKind::AirSpirit,
    ];

    /// Snake-case id used by content files and kill objectives
    pub fn id(&self) -> &'static str {
        self.info().0
    }

    pub fn display_name(&self) -> &'static str {
        self.info().1
    }

    pub fn glyph(&self) -> char {
        self.info().2
    }

    pub fn family(&self) -> MonsterFamily {
        self.info().3
    }

    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            MonsterKind::Slime => (0, 255, 0),
            MonsterKind::Spider => (139, 69, 19),
            MonsterKind::Wolf => (128, 128, 128),
            MonsterKind::Ghost => (200, 200, 255),
            MonsterKind::Skeleton => (255, 255, 240),
            _ => self.family().color(),
        }
    }

    pub fn from_id(id: &str) -> Option<MonsterKind> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }

    /// Target names a kill of this kind counts toward: the id, the
    /// lowercase name and its plural, the family, and the catch-alls
    /// used by generated quests
    pub fn quest_tags(&self) -> Vec<String> {
        let name = self.display_name().to_lowercase();
        let mut tags = vec![self.id().to_string(), name.clone(), plural(&name)];
        tags.push(format!("{:?}", self.family()).to_lowercase());
        tags.push("hostile creatures".to_string());
        tags.push("dangerous beasts".to_string());
        tags.dedup();
        tags
    }

    pub fn splits_on_death(&self) -> bool {
        matches!(self, MonsterKind::Slime)
    }

    fn info(&self) -> (&'static str, &'static str, char, MonsterFamily) {
        use MonsterFamily as F;
        match self {
            MonsterKind::Dragon => ("dragon", "Dragon", 'D', F::Basic),
            MonsterKind::Spider => ("spider", "Spider", 's', F::Basic),
            MonsterKind::Ghost => ("ghost", "Ghost", 'g', F::Basic),
            MonsterKind::Skeleton => ("skeleton", "Skeleton", 'k', F::Basic),
            MonsterKind::Slime => ("slime", "Slime", 'j', F::Basic),
            MonsterKind::Goblin => ("goblin", "Goblin", 'o', F::Basic),
            MonsterKind::Orc => ("orc", "Orc", 'O', F::Basic),
            MonsterKind::Troll => ("troll", "Troll", 'T', F::Basic),
            MonsterKind::FireElemental => ("fire_elemental", "Fire Elemental", 'E', F::Elemental),
            MonsterKind::IceElemental => ("ice_elemental", "Ice Elemental", 'E', F::Elemental),
            MonsterKind::StormElemental => ("storm_elemental", "Storm Elemental", 'E', F::Elemental),
            MonsterKind::EarthGolem => ("earth_golem", "Earth Golem", 'G', F::Elemental),
            MonsterKind::Zombie => ("zombie", "Zombie", 'z', F::Undead),
            MonsterKind::Wraith => ("wraith", "Wraith", 'W', F::Undead),
            MonsterKind::Vampire => ("vampire", "Vampire", 'V', F::Undead),
            MonsterKind::Lich => ("lich", "Lich", 'L', F::Undead),
            MonsterKind::Pixie => ("pixie", "Pixie", 'p', F::Magical),
            MonsterKind::Phoenix => ("phoenix", "Phoenix", 'P', F::Magical),
            MonsterKind::Unicorn => ("unicorn", "Unicorn", 'u', F::Magical),
            MonsterKind::Griffin => ("griffin", "Griffin", 'F', F::Magical),
            MonsterKind::Treant => ("treant", "Treant", 'T', F::Forest),
            MonsterKind::Wolf => ("wolf", "Wolf", 'w', F::Forest),
            MonsterKind::Bear => ("bear", "Bear", 'B', F::Forest),
            MonsterKind::Dryad => ("dryad", "Dryad", 'd', F::Forest),
            MonsterKind::Demon => ("demon", "Demon", '&', F::Dark),
            MonsterKind::ShadowStalker => ("shadow_stalker", "Shadow Stalker", 'S', F::Dark),
            MonsterKind::Nightmare => ("nightmare", "Nightmare", 'N', F::Dark),
            MonsterKind::DarkWizard => ("dark_wizard", "Dark Wizard", '@', F::Dark),
            MonsterKind::Merfolk => ("merfolk", "Merfolk", 'm', F::Aquatic),
            MonsterKind::Kraken => ("kraken", "Kraken", 'K', F::Aquatic),
            MonsterKind::Siren => ("siren", "Siren", 'n', F::Aquatic),
            MonsterKind::Leviathan => ("leviathan", "Leviathan", 'L', F::Aquatic),
            MonsterKind::GiantAnt => ("giant_ant", "Giant Ant", 'a', F::Insectoid),
            MonsterKind::Scorpion => ("scorpion", "Scorpion", 'x', F::Insectoid),
            MonsterKind::Mantis => ("mantis", "Mantis", 'i', F::Insectoid),
            MonsterKind::Beetle => ("beetle", "Beetle", 'b', F::Insectoid),
            MonsterKind::Angel => ("angel", "Angel", 'A', F::Celestial),
            MonsterKind::CosmicWyrm => ("cosmic_wyrm", "Cosmic Wyrm", 'D', F::Celestial),
            MonsterKind::VoidWalker => ("void_walker", "Void Walker", 'v', F::Celestial),
            MonsterKind::ClockworkKnight => ("clockwork_knight", "Clockwork Knight", 'K', F::Construct),
            MonsterKind::SteamGolem => ("steam_golem", "Steam Golem", 'G', F::Construct),
            MonsterKind::ArcaneTurret => ("arcane_turret", "Arcane Turret", 't', F::Construct),
            MonsterKind::LivingArmor => ("living_armor", "Living Armor", '[', F::Construct),
            MonsterKind::VenusTrap => ("venus_trap", "Venus Trap", 'v', F::Plant),
            MonsterKind::MushroomKing => ("mushroom_king", "Mushroom King", 'M', F::Plant),
            MonsterKind::ThornElemental => ("thorn_elemental", "Thorn Elemental", 'E', F::Plant),
            MonsterKind::AncientVine => ("ancient_vine", "Ancient Vine", 'V', F::Plant),
            MonsterKind::SandWurm => ("sand_wurm", "Sand Wurm", 'W', F::Desert),
            MonsterKind::MummyLord => ("mummy_lord", "Mummy Lord", 'M', F::Desert),
            MonsterKind::DustDjinn => ("dust_djinn", "Dust Djinn", 'J', F::Desert),
            MonsterKind::ScarabSwarm => ("scarab_swarm", "Scarab Swarm", 'c', F::Desert),
            MonsterKind::RockGiant => ("rock_giant", "Rock Giant", 'H', F::Mountain),
            MonsterKind::Harpy => ("harpy", "Harpy", 'h', F::Mountain),
            MonsterKind::FrostTitan => ("frost_titan", "Frost Titan", 'H', F::Mountain),
            MonsterKind::ThunderBird => ("thunder_bird", "Thunder Bird", 'B', F::Mountain),
            MonsterKind::BogWitch => ("bog_witch", "Bog Witch", 'w', F::Swamp),
            MonsterKind::Hydra => ("hydra", "Hydra", 'Y', F::Swamp),
            MonsterKind::MushroomZombie => ("mushroom_zombie", "Mushroom Zombie", 'z', F::Swamp),
            MonsterKind::WillOWisp => ("will_o_wisp", "Will-o'-Wisp", 'e', F::Swamp),
            MonsterKind::ElderBeing => ("elder_being", "Elder Being", 'X', F::Cosmic),
            MonsterKind::MindFlayer => ("mind_flayer", "Mind Flayer", 'f', F::Cosmic),
            MonsterKind::ChaosSpawn => ("chaos_spawn", "Chaos Spawn", 'c', F::Cosmic),
            MonsterKind::VoidHorror => ("void_horror", "Void Horror", 'X', F::Cosmic),
            MonsterKind::MechaDragon => ("mecha_dragon", "Mecha Dragon", 'D', F::Mechanical),
            MonsterKind::LaserHound => ("laser_hound", "Laser Hound", 'C', F::Mechanical),
            MonsterKind::NanoSwarm => ("nano_swarm", "Nano Swarm", '%', F::Mechanical),
            MonsterKind::WarGolem => ("war_golem", "War Golem", 'G', F::Mechanical),
            MonsterKind::CrystalGolem => ("crystal_golem", "Crystal Golem", 'G', F::Crystal),
            MonsterKind::PrismElemental => ("prism_elemental", "Prism Elemental", 'E', F::Crystal),
            MonsterKind::GemBasilisk => ("gem_basilisk", "Gem Basilisk", 'R', F::Crystal),
            MonsterKind::DiamondPhoenix => ("diamond_phoenix", "Diamond Phoenix", 'P', F::Crystal),
            MonsterKind::SoulReaper => ("soul_reaper", "Soul Reaper", 'R', F::Netherworld),
            MonsterKind::ChaosDemon => ("chaos_demon", "Chaos Demon", '&', F::Netherworld),
            MonsterKind::HellKnight => ("hell_knight", "Hell Knight", 'K', F::Netherworld),
            MonsterKind::PlagueBearer => ("plague_bearer", "Plague Bearer", 'Q', F::Netherworld),
            MonsterKind::FireSpirit => ("fire_spirit", "Fire Spirit", 'y', F::Spirit),
            MonsterKind::WaterSpirit => ("water_spirit", "Water Spirit", 'y', F::Spirit),
            MonsterKind::EarthSpirit => ("earth_spirit", "Earth Spirit", 'y', F::Spirit),
            MonsterKind::AirSpirit => ("air_spirit", "Air Spirit", 'y', F::Spirit),
        }
    }
}

fn plural(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('f') {
        format!("{}ves", stem)
    } else if name.ends_with('s') || name.ends_with('x') || name.ends_with("ch") {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

/// Stats a monster kind spawns with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub kind: MonsterKind,
    pub health: i32,
    pub damage: i32,
    /// Tiles per second
    pub speed: f32,
    pub xp_reward: u32,
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: f32,
}

fn default_spawn_weight() -> f32 {
    1.0
}

impl MonsterTemplate {
    /// Built-in stats for a kind
    pub fn default_for(kind: MonsterKind) -> Self {
        let (health, damage, speed) = match kind {
            MonsterKind::Dragon => (200, 50, 2.0),
            MonsterKind::Spider => (80, 20, 4.0),
            MonsterKind::Ghost => (100, 30, 3.0),
            MonsterKind::Skeleton => (120, 35, 2.0),
            MonsterKind::Slime => (60, 15, 1.0),
            _ => (100, 10, 2.0),
        };
        Self {
            kind,
            health,
            damage,
            speed,
            xp_reward: (health / 4) as u32,
            spawn_weight: default_spawn_weight(),
        }
    }
}

/// The set of templates in play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplates {
    pub templates: Vec<MonsterTemplate>,
}

impl Default for MonsterTemplates {
    fn default() -> Self {
        Self {
            templates: MonsterKind::ALL.iter().map(|k| MonsterTemplate::default_for(*k)).collect(),
        }
    }
}

impl MonsterTemplates {
    /// Template for a kind, falling back to the built-in stats
    pub fn get(&self, kind: MonsterKind) -> MonsterTemplate {
        self.templates
            .iter()
            .find(|t| t.kind == kind)
            .cloned()
            .unwrap_or_else(|| MonsterTemplate::default_for(kind))
    }

    /// Weighted random template
    pub fn pick(&self, rng: &mut impl Rng) -> Option<&MonsterTemplate> {
        let total: f32 = self.templates.iter().map(|t| t.spawn_weight.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = rng.gen_range(0.0..total);
        for template in &self.templates {
            let weight = template.spawn_weight.max(0.0);
            if roll < weight {
                return Some(template);
            }
            roll -= weight;
        }
        self.templates.last()
    }
}

/// Spawn a monster from its template
pub fn spawn_monster(world: &mut World, template: &MonsterTemplate, pos: Position) -> Entity {
    let kind = template.kind;
    let size = if kind.splits_on_death() { SLIME_START_SIZE } else { 0 };
    world.spawn((
        Name::new(kind.display_name()),
        pos,
        Renderable::new(kind.glyph(), kind.color()).with_order(50),
        Monster { kind, size },
        Health::new(template.health),
        Combat::new(template.damage, 0),
        Speed::new(template.speed),
        AI::new(pos),
        Animation::new(),
        BlocksMovement,
        XpReward(template.xp_reward),
    ))
}

/// Children spawned when a monster of `size` splits, or None if it doesn't
pub fn split_size(size: i32) -> Option<i32> {
    if size > SLIME_MIN_SIZE {
        Some((size - SLIME_SPLIT_SHRINK).max(SLIME_MIN_SIZE))
    } else {
        None
    }
}

/// Spawn the two halves of a dead slime on free tiles nearby
pub fn split_slime(
    world: &mut World,
    map: &Map,
    template: &MonsterTemplate,
    at: Position,
    size: i32,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let Some(child_size) = split_size(size) else {
        return Vec::new();
    };

    let mut spawned = Vec::new();
    for _ in 0..2 {
        let Some(pos) = free_tile_near(world, map, at, rng) else {
            log::debug!("No room for slime split at ({}, {})", at.x, at.y);
            break;
        };
        let entity = spawn_monster(world, template, pos);
        if let Ok(mut monster) = world.get::<&mut Monster>(entity) {
            monster.size = child_size;
        }
        if let Ok(mut health) = world.get::<&mut Health>(entity) {
            *health = Health::new(child_size * 2);
        }
        spawned.push(entity);
    }
    spawned
}

fn free_tile_near(world: &World, map: &Map, at: Position, rng: &mut impl Rng) -> Option<Position> {
    let occupied: Vec<Position> = world
        .query::<(&Position, &BlocksMovement)>()
        .iter()
        .map(|(_, (p, _))| *p)
        .collect();

    let mut candidates = Vec::new();
    for dy in -2..=2 {
        for dx in -2..=2 {
            let p = at.offset(dx, dy);
            if (dx, dy) != (0, 0) && map.is_walkable(p.x, p.y) && !occupied.contains(&p) {
                candidates.push(p);
            }
        }
    }
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ids_round_trip() {
        for kind in MonsterKind::ALL {
            assert_eq!(MonsterKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn test_quest_tags() {
        let wolf = MonsterKind::Wolf.quest_tags();
        assert_eq!(wolf[0], "wolf");
        assert!(wolf.contains(&"wolves".to_string()));
        assert!(wolf.contains(&"forest".to_string()));
        assert_eq!(wolf.iter().filter(|t| *t == "wolf").count(), 1);

        let stalker = MonsterKind::ShadowStalker.quest_tags();
        assert!(stalker.contains(&"shadow_stalker".to_string()));
        assert!(stalker.contains(&"shadow stalkers".to_string()));
        assert!(stalker.contains(&"hostile creatures".to_string()));
    }

    #[test]
    fn test_serde_name_matches_id() {
        let ron_text = ron::to_string(&MonsterKind::WillOWisp).unwrap();
        assert_eq!(ron_text, "will_o_wisp");
        let json = serde_json::to_string(&MonsterKind::ShadowStalker).unwrap();
        assert_eq!(json, "\"shadow_stalker\"");
    }

    #[test]
    fn test_default_templates() {
        let dragon = MonsterTemplate::default_for(MonsterKind::Dragon);
        assert_eq!((dragon.health, dragon.damage), (200, 50));
        let wolf = MonsterTemplate::default_for(MonsterKind::Wolf);
        assert_eq!((wolf.health, wolf.damage, wolf.speed), (100, 10, 2.0));
    }

    #[test]
    fn test_split_sizes() {
        assert_eq!(split_size(32), Some(24));
        assert_eq!(split_size(20), Some(16));
        assert_eq!(split_size(16), None);
    }

    #[test]
    fn test_split_slime_spawns_two() {
        let mut world = World::new();
        let map = Map::new(10, 10);
        let mut rng = StdRng::seed_from_u64(4);
        let template = MonsterTemplate::default_for(MonsterKind::Slime);
        let kids = split_slime(&mut world, &map, &template, Position::new(5, 5), 32, &mut rng);
        assert_eq!(kids.len(), 2);
        for kid in kids {
            assert_eq!(world.get::<&Monster>(kid).unwrap().size, 24);
            assert_eq!(world.get::<&Health>(kid).unwrap().max, 48);
        }
    }

    #[test]
    fn test_pick_respects_zero_weights() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut only_wolf = MonsterTemplates::default();
        for t in &mut only_wolf.templates {
            t.spawn_weight = if t.kind == MonsterKind::Wolf { 1.0 } else { 0.0 };
        }
        for _ in 0..20 {
            assert_eq!(only_wolf.pick(&mut rng).unwrap().kind, MonsterKind::Wolf);
        }
    }
}
