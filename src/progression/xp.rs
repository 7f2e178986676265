//! Experience and leveling
//!
//! The XP curve and what a level-up grants.

use crate::ecs::Health;

/// Max health added for every level gained
pub const HEALTH_PER_LEVEL: i32 = 10;

/// XP needed to go from `level - 1` to `level`
pub fn xp_for_level(level: u32) -> u32 {
    match level {
        0 | 1 => 0,
        // 100 for level 2, +50 for each level after
        _ => 100 + (level - 2) * 50,
    }
}

/// Total XP needed from level 1 to reach a given level
pub fn total_xp_for_level(level: u32) -> u32 {
    (2..=level).map(xp_for_level).sum()
}

/// Raise max health for each gained level and top the pool up by the same amount
pub fn apply_level_ups(health: &mut Health, levels: u32) {
    if levels == 0 {
        return;
    }
    let bonus = HEALTH_PER_LEVEL * levels as i32;
    health.max += bonus;
    health.current = (health.current + bonus).min(health.max);
}

/// Rank shown next to the level in the sidebar
pub fn level_title(level: u32) -> &'static str {
    match level {
        0..=2 => "Wanderer",
        3..=5 => "Adventurer",
        6..=9 => "Veteran",
        10..=14 => "Champion",
        15..=19 => "Hero",
        _ => "Legend",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_curve() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 100);
        assert_eq!(xp_for_level(3), 150);
        assert_eq!(xp_for_level(5), 250);
        assert_eq!(total_xp_for_level(3), 250);
        assert_eq!(total_xp_for_level(1), 0);
    }

    #[test]
    fn test_level_up_health() {
        let mut hp = Health::new(100);
        hp.take_damage(40);
        apply_level_ups(&mut hp, 2);
        assert_eq!(hp.max, 120);
        assert_eq!(hp.current, 80);
    }

    #[test]
    fn test_level_title() {
        assert_eq!(level_title(1), "Wanderer");
        assert_eq!(level_title(12), "Champion");
        assert_eq!(level_title(40), "Legend");
    }
}
