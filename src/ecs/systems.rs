//! ECS Systems
//!
//! Game logic systems that operate on entities with specific components.

use hecs::{Entity, World};
use rand::Rng;

use crate::ecs::{
    AIState, Animation, AnimationState, BlocksMovement, Combat, Direction, Monster, Name, Player, Position,
    Speed, AI,
};
use crate::world::{find_path, Map};

/// Chance per frame that a wandering monster picks a new heading
const WANDER_TURN_CHANCE: f64 = 0.02;

/// AI actions that need to be executed
#[derive(Debug, Clone, PartialEq)]
pub enum AIAction {
    Move { entity: Entity, to: Position },
    Attack { attacker: Entity, damage: i32 },
}

/// An attack against the player, resolved by the game
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterAttack {
    pub attacker: Entity,
    pub name: String,
    pub damage: i32,
}

/// Decide what every monster does this frame
pub fn run_monster_ai(
    world: &mut World,
    map: &Map,
    player_pos: Position,
    dt: f32,
    speed_multiplier: f32,
    rng: &mut impl Rng,
) -> Vec<AIAction> {
    let mut actions = Vec::new();

    // Collect first to avoid holding a query borrow while mutating
    let monsters: Vec<(Entity, Position)> = world
        .query::<(&Position, &Monster, &AI)>()
        .iter()
        .map(|(entity, (pos, _, _))| (entity, *pos))
        .collect();

    for (entity, pos) in monsters {
        let distance = pos.chebyshev_distance(&player_pos);

        let Ok((ai, combat, speed)) = world.query_one_mut::<(&mut AI, &mut Combat, &mut Speed)>(entity) else {
            continue;
        };
        combat.tick(dt);

        if distance <= combat.attack_range {
            ai.state = AIState::Attack;
            ai.target = Some(player_pos);
            speed.progress = 0.0;
            if combat.ready() {
                combat.trigger();
                actions.push(AIAction::Attack { attacker: entity, damage: combat.attack });
            }
            continue;
        }

        let steps = speed.accumulate(dt, speed_multiplier);

        if distance <= ai.chase_range {
            ai.state = AIState::Chase;
            ai.target = Some(player_pos);
            if steps > 0 {
                let reach = ai.chase_range * 2;
                if let Some(next) = find_path(map, pos, player_pos, reach).and_then(|p| p.first().copied()) {
                    if next != player_pos {
                        actions.push(AIAction::Move { entity, to: next });
                    }
                }
            }
            continue;
        }

        ai.state = AIState::Wander;
        ai.target = None;
        if rng.gen_bool(WANDER_TURN_CHANCE) {
            ai.wander_dir = Direction::all()[rng.gen_range(0..4)];
        }
        if steps > 0 {
            let (dx, dy) = ai.wander_dir.delta();
            let to = pos.offset(dx, dy);
            if map.is_walkable(to.x, to.y) {
                actions.push(AIAction::Move { entity, to });
            } else {
                // Bumped into something; turn around next frame
                ai.wander_dir = Direction::all()[rng.gen_range(0..4)];
            }
        }
    }

    actions
}

/// Check if a tile is free for a monster to step onto
fn is_free(world: &World, map: &Map, pos: Position) -> bool {
    if !map.is_walkable(pos.x, pos.y) {
        return false;
    }
    let blocked = world
        .query::<(&Position, &BlocksMovement)>()
        .iter()
        .any(|(_, (p, _))| *p == pos);
    let player_there = world.query::<(&Position, &Player)>().iter().any(|(_, (p, _))| *p == pos);
    !blocked && !player_there
}

/// Apply moves and collect the attacks for the game to resolve
pub fn execute_ai_actions(world: &mut World, map: &Map, actions: Vec<AIAction>) -> Vec<MonsterAttack> {
    let mut attacks = Vec::new();

    for action in actions {
        match action {
            AIAction::Move { entity, to } => {
                if !is_free(world, map, to) {
                    continue;
                }
                let Ok((pos, anim)) = world.query_one_mut::<(&mut Position, Option<&mut Animation>)>(entity) else {
                    continue;
                };
                let (dx, dy) = (to.x - pos.x, to.y - pos.y);
                *pos = to;
                if let Some(anim) = anim {
                    anim.facing = Direction::from_delta(dx, dy);
                    anim.set_state(AnimationState::Walking);
                }
            }
            AIAction::Attack { attacker, damage } => {
                let name = world
                    .get::<&Name>(attacker)
                    .map(|n| n.0.clone())
                    .unwrap_or_else(|_| "Monster".to_string());
                if let Ok(mut anim) = world.get::<&mut Animation>(attacker) {
                    anim.set_state(AnimationState::Attacking);
                }
                attacks.push(MonsterAttack { attacker, name, damage });
            }
        }
    }

    attacks
}

/// Advance every animation by one frame's time
pub fn tick_animations(world: &mut World, dt: f32) {
    for (_, anim) in world.query_mut::<&mut Animation>() {
        anim.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Health;
    use crate::entities::{spawn_monster, MonsterKind, MonsterTemplate};
    use crate::world::TileType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(monster_at: Position) -> (World, Entity) {
        let mut world = World::new();
        let template = MonsterTemplate::default_for(MonsterKind::Wolf);
        let monster = spawn_monster(&mut world, &template, monster_at);
        world.spawn((Player, Position::new(5, 5), Health::new(100)));
        (world, monster)
    }

    #[test]
    fn test_adjacent_monster_attacks_once_per_cooldown() {
        let map = Map::new(12, 12);
        let mut rng = StdRng::seed_from_u64(1);
        let (mut world, monster) = setup(Position::new(6, 5));

        let actions = run_monster_ai(&mut world, &map, Position::new(5, 5), 0.1, 1.0, &mut rng);
        assert_eq!(actions, vec![AIAction::Attack { attacker: monster, damage: 10 }]);

        // Still on cooldown
        let actions = run_monster_ai(&mut world, &map, Position::new(5, 5), 0.1, 1.0, &mut rng);
        assert!(actions.is_empty());

        let attacks = execute_ai_actions(&mut world, &map, vec![AIAction::Attack { attacker: monster, damage: 10 }]);
        assert_eq!(attacks[0].name, "Wolf");
    }

    #[test]
    fn test_chasing_monster_steps_toward_player() {
        let map = Map::new(12, 12);
        let mut rng = StdRng::seed_from_u64(1);
        let (mut world, monster) = setup(Position::new(9, 5));

        // Wolves walk 2 tiles/s; half a second is one step
        let actions = run_monster_ai(&mut world, &map, Position::new(5, 5), 0.5, 1.0, &mut rng);
        assert_eq!(actions.len(), 1);
        execute_ai_actions(&mut world, &map, actions);

        let pos = *world.get::<&Position>(monster).unwrap();
        assert_eq!(pos.chebyshev_distance(&Position::new(5, 5)), 3);
        assert_eq!(world.get::<&AI>(monster).unwrap().state, AIState::Chase);
    }

    #[test]
    fn test_no_move_until_whole_tile_accrued() {
        let map = Map::new(12, 12);
        let mut rng = StdRng::seed_from_u64(1);
        let (mut world, _) = setup(Position::new(9, 5));
        let actions = run_monster_ai(&mut world, &map, Position::new(5, 5), 0.1, 1.0, &mut rng);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_moves_into_walls_are_dropped() {
        let mut map = Map::new(12, 12);
        map.set_tile(8, 5, TileType::StoneWall);
        let (mut world, monster) = setup(Position::new(9, 5));
        execute_ai_actions(&mut world, &map, vec![AIAction::Move { entity: monster, to: Position::new(8, 5) }]);
        assert_eq!(*world.get::<&Position>(monster).unwrap(), Position::new(9, 5));

        // Nor onto the player
        execute_ai_actions(&mut world, &map, vec![AIAction::Move { entity: monster, to: Position::new(5, 5) }]);
        assert_eq!(*world.get::<&Position>(monster).unwrap(), Position::new(9, 5));
    }
}
