//! A* pathfinding over the tile grid
//!
//! Monsters use this to chase the player around obstacles.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::Map;
use crate::ecs::Position;

/// Cost of an orthogonal step
const STRAIGHT_COST: i32 = 10;
/// Cost of a diagonal step (~ sqrt(2) * 10)
const DIAGONAL_COST: i32 = 14;

const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

#[derive(Clone, Copy, Eq, PartialEq)]
struct Node {
    pos: Position,
    g_cost: i32,
    f_cost: i32,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(a: Position, b: Position) -> i32 {
    a.chebyshev_distance(&b) * STRAIGHT_COST
}

/// Swap an unwalkable goal for its first walkable neighbour
fn resolve_goal(map: &Map, goal: Position) -> Option<Position> {
    if map.is_walkable(goal.x, goal.y) {
        return Some(goal);
    }
    NEIGHBOURS
        .iter()
        .map(|&(dx, dy)| goal.offset(dx, dy))
        .find(|p| map.is_walkable(p.x, p.y))
}

/// Find a path from `start` to `goal`.
///
/// The returned path excludes `start` and ends at the (possibly adjusted)
/// goal. Nodes farther than `max_distance` from the start are never expanded.
/// Diagonal steps may not cut the corner of a blocked tile.
pub fn find_path(map: &Map, start: Position, goal: Position, max_distance: i32) -> Option<Vec<Position>> {
    let goal = resolve_goal(map, goal)?;
    if start == goal {
        return Some(Vec::new());
    }
    if goal.chebyshev_distance(&start) > max_distance {
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut g_scores: HashMap<Position, i32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();

    g_scores.insert(start, 0);
    open.push(Node {
        pos: start,
        g_cost: 0,
        f_cost: heuristic(start, goal),
    });

    while let Some(current) = open.pop() {
        if current.pos == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        if !closed.insert(current.pos) {
            continue;
        }

        for &(dx, dy) in NEIGHBOURS.iter() {
            let next = current.pos.offset(dx, dy);
            if closed.contains(&next) || !map.is_walkable(next.x, next.y) {
                continue;
            }
            if next.chebyshev_distance(&start) > max_distance {
                continue;
            }

            let step = if dx != 0 && dy != 0 {
                // No squeezing between two blocked corners
                if !map.is_walkable(current.pos.x + dx, current.pos.y)
                    || !map.is_walkable(current.pos.x, current.pos.y + dy)
                {
                    continue;
                }
                DIAGONAL_COST
            } else {
                STRAIGHT_COST
            };

            let tentative = current.g_cost + step;
            if tentative < *g_scores.get(&next).unwrap_or(&i32::MAX) {
                g_scores.insert(next, tentative);
                came_from.insert(next, current.pos);
                open.push(Node {
                    pos: next,
                    g_cost: tentative,
                    f_cost: tentative + heuristic(next, goal),
                });
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &HashMap<Position, Position>, start: Position, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
