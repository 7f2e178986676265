//! Procedural outdoor map generation
//!
//! Grass field walled by stone, with rock formations, scattered boulders
//! and a sprinkling of decoration.

use rand::Rng;

use super::{Map, TileType};

/// Number of rock formations
const FORMATIONS: std::ops::RangeInclusive<u32> = 10..=15;
/// Number of scattered rocks
const SCATTERED_ROCKS: std::ops::RangeInclusive<u32> = 20..=30;
/// Chance a scattered rock is a 2x2 boulder
const BOULDER_CHANCE: f64 = 0.3;
/// Chance a formation cell grows into its orthogonal neighbours
const FORMATION_SPREAD_CHANCE: f64 = 0.4;
/// Chance a remaining grass tile gets decorated
const DECORATION_CHANCE: f64 = 0.08;

/// Generate an outdoor map
pub fn generate_outdoor(width: i32, height: i32, rng: &mut impl Rng) -> Map {
    let mut map = Map::new(width, height);

    add_border(&mut map);

    // Too small for anything but the border
    if map.width < 8 || map.height < 8 {
        return map;
    }

    for _ in 0..rng.gen_range(FORMATIONS) {
        add_formation(&mut map, rng);
    }

    for _ in 0..rng.gen_range(SCATTERED_ROCKS) {
        let x = rng.gen_range(2..=map.width - 3);
        let y = rng.gen_range(2..=map.height - 3);
        if rng.gen_bool(BOULDER_CHANCE) {
            for dy in 0..2 {
                for dx in 0..2 {
                    map.set_tile(x + dx, y + dy, TileType::Rock);
                }
            }
        } else {
            map.set_tile(x, y, TileType::Rock);
        }
    }

    decorate(&mut map, rng);

    log::debug!("Generated {}x{} outdoor map", map.width, map.height);
    map
}

fn add_border(map: &mut Map) {
    for x in 0..map.width {
        map.set_tile(x, 0, TileType::StoneWall);
        map.set_tile(x, map.height - 1, TileType::StoneWall);
    }
    for y in 0..map.height {
        map.set_tile(0, y, TileType::StoneWall);
        map.set_tile(map.width - 1, y, TileType::StoneWall);
    }
}

fn inside_margin(map: &Map, x: i32, y: i32) -> bool {
    x >= 2 && x < map.width - 2 && y >= 2 && y < map.height - 2
}

/// Irregular rock blob grown by a short random walk
fn add_formation(map: &mut Map, rng: &mut impl Rng) {
    let start = (rng.gen_range(3..=map.width - 4), rng.gen_range(3..=map.height - 4));
    let steps = rng.gen_range(3..=6);

    let mut points = vec![start];
    for _ in 0..steps {
        let (last_x, last_y) = points[points.len() - 1];
        for _ in 0..3 {
            let nx = last_x + rng.gen_range(-1..=1);
            let ny = last_y + rng.gen_range(-1..=1);
            if inside_margin(map, nx, ny) {
                points.push((nx, ny));
                break;
            }
        }
    }

    for (px, py) in points {
        map.set_tile(px, py, TileType::Rock);
        if rng.gen_bool(FORMATION_SPREAD_CHANCE) {
            for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                if inside_margin(map, px + dx, py + dy) {
                    map.set_tile(px + dx, py + dy, TileType::Rock);
                }
            }
        }
    }
}

fn decorate(map: &mut Map, rng: &mut impl Rng) {
    const DECORATIONS: [TileType; 4] = [TileType::Tree, TileType::Dirt, TileType::Sand, TileType::Water];

    for y in 1..map.height - 1 {
        for x in 1..map.width - 1 {
            let is_grass = map.get_tile(x, y).map_or(false, |t| t.tile_type == TileType::Grass);
            if is_grass && rng.gen_bool(DECORATION_CHANCE) {
                let deco = DECORATIONS[rng.gen_range(0..DECORATIONS.len())];
                map.set_tile(x, y, deco);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_border_is_walled() {
        let mut rng = StdRng::seed_from_u64(42);
        let map = generate_outdoor(40, 30, &mut rng);
        for x in 0..map.width {
            assert_eq!(map.get_tile(x, 0).unwrap().tile_type, TileType::StoneWall);
            assert_eq!(map.get_tile(x, map.height - 1).unwrap().tile_type, TileType::StoneWall);
        }
        for y in 0..map.height {
            assert_eq!(map.get_tile(0, y).unwrap().tile_type, TileType::StoneWall);
            assert_eq!(map.get_tile(map.width - 1, y).unwrap().tile_type, TileType::StoneWall);
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = generate_outdoor(50, 50, &mut StdRng::seed_from_u64(7));
        let b = generate_outdoor(50, 50, &mut StdRng::seed_from_u64(7));
        let types_a: Vec<TileType> = a.tiles.iter().map(|t| t.tile_type).collect();
        let types_b: Vec<TileType> = b.tiles.iter().map(|t| t.tile_type).collect();
        assert_eq!(types_a, types_b);
    }

    #[test]
    fn test_has_rocks_and_spawn() {
        let mut rng = StdRng::seed_from_u64(3);
        let map = generate_outdoor(80, 80, &mut rng);
        assert!(map.tiles.iter().any(|t| t.tile_type == TileType::Rock));
        assert!(map.spawn_position(&mut rng).is_some());
    }

    #[test]
    fn test_tiny_map_is_just_border() {
        let mut rng = StdRng::seed_from_u64(3);
        let map = generate_outdoor(5, 5, &mut rng);
        assert!(map.is_walkable(2, 2));
    }
}
