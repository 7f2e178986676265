//! ECS Components
//!
//! All components used in the game's entity-component system.

use serde::{Deserialize, Serialize};

use crate::entities::MonsterKind;
use crate::items::{Equipment, Inventory, Item};
use crate::progression::xp_for_level;

// ============================================================================
// Position & Movement
// ============================================================================

/// Position in tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (allows diagonal)
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Position shifted by a delta
    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

/// Cardinal facing / movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn all() -> &'static [Direction] {
        &[Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Direction of the dominant axis of a delta
    pub fn from_delta(dx: i32, dy: i32) -> Direction {
        if dx.abs() > dy.abs() {
            if dx > 0 { Direction::Right } else { Direction::Left }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Movement speed in tiles per second, with fractional progress carried between frames
#[derive(Debug, Clone, Copy)]
pub struct Speed {
    pub tiles_per_second: f32,
    pub progress: f32,
}

impl Speed {
    pub fn new(tiles_per_second: f32) -> Self {
        Self { tiles_per_second, progress: 0.0 }
    }

    /// Accumulate movement for a frame and return how many whole tiles may be stepped
    pub fn accumulate(&mut self, dt: f32, multiplier: f32) -> u32 {
        self.progress += self.tiles_per_second * multiplier * dt;
        let steps = self.progress.floor().max(0.0);
        self.progress -= steps;
        steps as u32
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Visual representation of an entity
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Character to display
    pub glyph: char,
    /// Foreground color (RGB)
    pub fg: (u8, u8, u8),
    /// Render order (higher = on top)
    pub render_order: i32,
}

impl Renderable {
    pub fn new(glyph: char, fg: (u8, u8, u8)) -> Self {
        Self {
            glyph,
            fg,
            render_order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }
}

/// Animation states for animated entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Walking,
    Attacking,
    Hurt,
    Dying,
}

/// Frame-based animation driver
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub state: AnimationState,
    pub frame: u8,
    pub timer: f32,
    /// Facing used to pick frames
    pub facing: Direction,
}

impl Animation {
    pub const FRAME_COUNT: u8 = 4;
    pub const FRAME_TIME: f32 = 0.15;

    pub fn new() -> Self {
        Self {
            state: AnimationState::Idle,
            frame: 0,
            timer: 0.0,
            facing: Direction::Down,
        }
    }

    /// Switch state, restarting the frame cycle on change
    pub fn set_state(&mut self, state: AnimationState) {
        if self.state != state {
            self.state = state;
            self.frame = 0;
            self.timer = 0.0;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.timer += dt;
        while self.timer >= Self::FRAME_TIME {
            self.timer -= Self::FRAME_TIME;
            self.frame = (self.frame + 1) % Self::FRAME_COUNT;
            // Transient states fall back to idle after one cycle
            if self.frame == 0 && matches!(self.state, AnimationState::Attacking | AnimationState::Hurt) {
                self.state = AnimationState::Idle;
            }
        }
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Identity & Naming
// ============================================================================

/// Name component for entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks an entity as the player
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Marks an entity as a monster
#[derive(Debug, Clone, Copy)]
pub struct Monster {
    pub kind: MonsterKind,
    /// Body size, used by splitting monsters
    pub size: i32,
}

// ============================================================================
// Combat
// ============================================================================

/// Health pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.current).max(0);
        self.current -= actual;
        actual
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.max - self.current).max(0);
        self.current += actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn percentage(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// Mana pool, refilled by mana potions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Mana {
    pub current: i32,
    pub max: i32,
}

impl Mana {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn restore(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.max - self.current).max(0);
        self.current += actual;
        actual
    }
}

/// Stamina pool, refilled by stamina potions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stamina {
    pub current: i32,
    pub max: i32,
}

impl Stamina {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn restore(&mut self, amount: i32) -> i32 {
        let actual = amount.min(self.max - self.current).max(0);
        self.current += actual;
        actual
    }
}

/// Melee combat values
#[derive(Debug, Clone, Copy)]
pub struct Combat {
    pub attack: i32,
    pub defense: i32,
    /// Reach in tiles (Chebyshev)
    pub attack_range: i32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    pub cooldown_left: f32,
}

impl Combat {
    pub fn new(attack: i32, defense: i32) -> Self {
        Self {
            attack,
            defense,
            attack_range: 1,
            attack_cooldown: 1.0,
            cooldown_left: 0.0,
        }
    }

    pub fn ready(&self) -> bool {
        self.cooldown_left <= 0.0
    }

    pub fn trigger(&mut self) {
        self.cooldown_left = self.attack_cooldown;
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown_left = (self.cooldown_left - dt).max(0.0);
    }
}

/// Experience and level
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    pub current_xp: u32,
    pub xp_to_next: u32,
}

impl Experience {
    pub fn new() -> Self {
        Self {
            level: 1,
            current_xp: 0,
            xp_to_next: xp_for_level(2),
        }
    }

    /// Add XP and return the number of levels gained
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.current_xp += amount;
        let mut gained = 0;
        while self.current_xp >= self.xp_to_next {
            self.current_xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = xp_for_level(self.level + 1);
            gained += 1;
        }
        gained
    }
}

impl Default for Experience {
    fn default() -> Self {
        Self::new()
    }
}

/// XP granted when this entity dies
#[derive(Debug, Clone, Copy)]
pub struct XpReward(pub u32);

// ============================================================================
// Items
// ============================================================================

/// The player's bag
#[derive(Debug, Clone)]
pub struct InventoryComponent {
    pub inventory: Inventory,
}

/// The player's worn gear
#[derive(Debug, Clone, Default)]
pub struct EquipmentComponent {
    pub equipment: Equipment,
}

/// An item lying on the map
#[derive(Debug, Clone)]
pub struct GroundItem {
    pub item: Item,
}

// ============================================================================
// AI
// ============================================================================

/// AI behavior component
#[derive(Debug, Clone)]
pub struct AI {
    pub state: AIState,
    pub target: Option<Position>,
    pub home: Position,
    /// Distance at which the player is noticed
    pub chase_range: i32,
    /// Current wander heading
    pub wander_dir: Direction,
}

impl AI {
    pub fn new(home: Position) -> Self {
        Self {
            state: AIState::Idle,
            target: None,
            home,
            chase_range: 5,
            wander_dir: Direction::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIState {
    Idle,
    Wander,
    Chase,
    Attack,
}

// ============================================================================
// Blocking
// ============================================================================

/// Marks an entity as blocking movement
#[derive(Debug, Clone, Copy, Default)]
pub struct BlocksMovement;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_multi_level() {
        let mut xp = Experience::new();
        // 100 for level 2, 150 for level 3
        let gained = xp.add_xp(260);
        assert_eq!(gained, 2);
        assert_eq!(xp.level, 3);
        assert_eq!(xp.current_xp, 10);
        assert_eq!(xp.xp_to_next, 200);
    }

    #[test]
    fn test_speed_accumulates_fractional_steps() {
        let mut speed = Speed::new(2.0);
        assert_eq!(speed.accumulate(0.25, 1.0), 0);
        assert_eq!(speed.accumulate(0.25, 1.0), 1);
        assert_eq!(speed.accumulate(1.0, 2.0), 4);
    }

    #[test]
    fn test_health_clamps() {
        let mut hp = Health::new(10);
        assert_eq!(hp.take_damage(25), 10);
        assert!(hp.is_dead());
        assert_eq!(hp.heal(4), 4);
        assert_eq!(hp.heal(100), 6);
    }

    #[test]
    fn test_animation_hurt_returns_to_idle() {
        let mut anim = Animation::new();
        anim.set_state(AnimationState::Hurt);
        anim.tick(Animation::FRAME_TIME * Animation::FRAME_COUNT as f32 + 0.01);
        assert_eq!(anim.state, AnimationState::Idle);
    }
}
