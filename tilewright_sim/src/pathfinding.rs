// A* pathfinding over the tile grid.
//
// Each query builds a fresh traversal-cost grid from the current world
// state (`CostGrid::build`), then runs a 4-directional A* over it. Costs:
//
// - `base_tile_cost` for a tile with nothing blocking.
// - `closed_passage_cost` when the only blockers are closed passages
//   (doors). Routing through doors is discouraged but permitted; the
//   navigator opens them on the way.
// - Blocked (no traversal at all) when anything else impassable is present.
//   This is a hard block, never a large finite weight.
// - `occupied_tile_penalty` extra when another agent stands on the tile.
//   Agents never hard-block a route: they move, so the navigator waits
//   behind them for a bounded number of ticks instead.
//
// The open set is a `BinaryHeap` with reversed ordering used as a min-heap,
// and scores live in `Vec`s indexed by flat tile index (no `HashMap`). Ties
// on f-score break on tile index, and neighbors expand in N, E, S, W order.
//
// The heuristic is Manhattan distance times the cheapest tile cost, which
// is admissible.
//
// See also: `navigation.rs` which turns the first step of a path into one
// rotate/open/move action per tick, `config.rs` for `PathingCosts`.
//
// **Critical constraint: determinism.** A* is a pure function of the world
// snapshot and the endpoints. Integer costs only.

use crate::types::{Facing, ObjectId, TileCoord};
use crate::world::World;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Per-query traversal costs. `None` means the tile cannot be entered.
#[derive(Clone, Debug)]
pub struct CostGrid {
    pub width: u32,
    pub height: u32,
    costs: Vec<Option<u32>>,
    min_cost: u32,
}

impl CostGrid {
    /// Build costs from the current world state. `mover` (the agent doing
    /// the pathfinding) is ignored when counting occupants.
    pub fn build(world: &World, mover: Option<ObjectId>) -> Self {
        let costs_cfg = &world.config.pathing;
        let mut costs = Vec::with_capacity(world.grid.len());
        for (_, tile) in world.grid.iter() {
            let mut hard_block = false;
            let mut closed_passage = false;
            let mut occupied = false;
            for id in tile.iter() {
                if Some(id) == mover {
                    continue;
                }
                if world.is_agent(id) {
                    occupied = true;
                    continue;
                }
                let Some(obj) = world.get(id) else {
                    continue;
                };
                if !obj.blocks_movement() {
                    continue;
                }
                if obj.is_closed_passage() {
                    closed_passage = true;
                } else {
                    hard_block = true;
                }
            }
            let cost = if hard_block {
                None
            } else {
                let base = if closed_passage {
                    costs_cfg.closed_passage_cost
                } else {
                    costs_cfg.base_tile_cost
                };
                let penalty = if occupied {
                    costs_cfg.occupied_tile_penalty
                } else {
                    0
                };
                Some(base + penalty)
            };
            costs.push(cost);
        }
        log::trace!(
            "built {}x{} cost grid",
            world.grid.width,
            world.grid.height
        );
        Self {
            width: world.grid.width,
            height: world.grid.height,
            costs,
            min_cost: costs_cfg.base_tile_cost.min(costs_cfg.closed_passage_cost).max(1),
        }
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
        {
            Some(coord.x as usize + coord.y as usize * self.width as usize)
        } else {
            None
        }
    }

    fn coord_of(&self, index: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((index % w) as i32, (index / w) as i32)
    }

    /// Cost of entering `coord`, or `None` if blocked or out of bounds.
    pub fn cost(&self, coord: TileCoord) -> Option<u32> {
        self.index(coord).and_then(|i| self.costs[i])
    }
}

/// The result of a successful A* search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    /// Tiles from start to goal (inclusive).
    pub tiles: Vec<TileCoord>,
    /// Sum of entry costs of every tile after the start.
    pub total_cost: u32,
}

impl PathResult {
    /// Number of steps (tiles entered).
    pub fn len(&self) -> usize {
        self.tiles.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First step of the best path toward a goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextStep {
    /// The tile to enter next. Equal to the start when already there.
    pub next: TileCoord,
    /// Number of steps in the full path.
    pub path_length: u32,
    pub total_cost: u32,
}

/// Entry in the A* open set (min-heap via reversed ordering).
#[derive(PartialEq, Eq)]
struct OpenEntry {
    index: usize,
    f_score: u32,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score is "greatest".
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Find the cheapest 4-directional path from `start` to `goal`.
///
/// Returns `None` if either endpoint is out of bounds, the goal is blocked,
/// or no path exists. The start tile's own cost is never checked.
pub fn astar(grid: &CostGrid, start: TileCoord, goal: TileCoord) -> Option<PathResult> {
    let si = grid.index(start)?;
    let gi = grid.index(goal)?;
    if start == goal {
        return Some(PathResult {
            tiles: vec![start],
            total_cost: 0,
        });
    }
    grid.costs[gi]?;

    let n = grid.costs.len();
    let mut g_score = vec![u32::MAX; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];

    g_score[si] = 0;
    let heuristic = |c: TileCoord| c.manhattan_distance(goal) * grid.min_cost;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        index: si,
        f_score: heuristic(start),
    });

    while let Some(current) = open.pop() {
        let ci = current.index;
        if ci == gi {
            return Some(reconstruct_path(grid, &came_from, si, gi, g_score[gi]));
        }
        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        let current_coord = grid.coord_of(ci);
        let current_g = g_score[ci];

        for facing in Facing::ALL {
            let neighbor = current_coord.step(facing);
            let Some(ni) = grid.index(neighbor) else {
                continue;
            };
            if closed[ni] {
                continue;
            }
            let Some(step_cost) = grid.costs[ni] else {
                continue;
            };
            let tentative_g = current_g.saturating_add(step_cost);
            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                came_from[ni] = Some(ci);
                open.push(OpenEntry {
                    index: ni,
                    f_score: tentative_g.saturating_add(heuristic(neighbor)),
                });
            }
        }
    }

    None
}

fn reconstruct_path(
    grid: &CostGrid,
    came_from: &[Option<usize>],
    start: usize,
    goal: usize,
    total_cost: u32,
) -> PathResult {
    let mut tiles = vec![grid.coord_of(goal)];
    let mut current = goal;
    while current != start {
        match came_from[current] {
            Some(prev) => {
                tiles.push(grid.coord_of(prev));
                current = prev;
            }
            None => break,
        }
    }
    tiles.reverse();
    PathResult { tiles, total_cost }
}

/// Pathfind from `from` to `to` on a fresh cost grid and return the first
/// step. `mover` is left out of the occupancy count.
pub fn next_step_for(
    world: &World,
    mover: Option<ObjectId>,
    from: TileCoord,
    to: TileCoord,
) -> Option<NextStep> {
    let grid = CostGrid::build(world, mover);
    let path = astar(&grid, from, to);
    let step = path.map(|p| NextStep {
        next: p.tiles.get(1).copied().unwrap_or(from),
        path_length: p.len() as u32,
        total_cost: p.total_cost,
    });
    log::trace!("next_step {from} -> {to}: {step:?}");
    step
}

/// Pathfind from `from` to `to` and return the first step, or `None` if no
/// path exists.
pub fn next_step(world: &World, from: TileCoord, to: TileCoord) -> Option<NextStep> {
    let mover = world.agent_at(from);
    next_step_for(world, mover, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::object::ObjectTemplate;
    use crate::types::Layer;

    fn world(w: u32, h: u32) -> World {
        World::with_config(
            1,
            SimConfig {
                grid_size: (w, h),
                ..SimConfig::default()
            },
        )
    }

    fn wall(world: &mut World, x: i32, y: i32) -> ObjectId {
        world
            .spawn_at(ObjectTemplate::fixture("wall"), TileCoord::new(x, y), Layer::Structure)
            .unwrap()
    }

    #[test]
    fn straight_line() {
        let w = world(5, 1);
        let step = next_step(&w, TileCoord::new(0, 0), TileCoord::new(4, 0)).unwrap();
        assert_eq!(step.next, TileCoord::new(1, 0));
        assert_eq!(step.path_length, 4);
        assert_eq!(step.total_cost, 4);
    }

    #[test]
    fn start_equals_goal() {
        let w = world(3, 3);
        let step = next_step(&w, TileCoord::new(1, 1), TileCoord::new(1, 1)).unwrap();
        assert_eq!(step.next, TileCoord::new(1, 1));
        assert_eq!(step.path_length, 0);
    }

    #[test]
    fn routes_around_walls() {
        // . # .
        // . # .
        // . . .
        let mut w = world(3, 3);
        wall(&mut w, 1, 0);
        wall(&mut w, 1, 1);
        let step = next_step(&w, TileCoord::new(0, 0), TileCoord::new(2, 0)).unwrap();
        assert_eq!(step.next, TileCoord::new(0, 1));
        assert_eq!(step.path_length, 6);
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let mut w = world(3, 3);
        wall(&mut w, 1, 0);
        wall(&mut w, 1, 1);
        wall(&mut w, 1, 2);
        assert!(next_step(&w, TileCoord::new(0, 0), TileCoord::new(2, 0)).is_none());
    }

    #[test]
    fn blocked_goal_is_unreachable() {
        let mut w = world(3, 1);
        wall(&mut w, 2, 0);
        assert!(next_step(&w, TileCoord::new(0, 0), TileCoord::new(2, 0)).is_none());
    }

    #[test]
    fn out_of_bounds_is_unreachable() {
        let w = world(3, 3);
        assert!(next_step(&w, TileCoord::new(0, 0), TileCoord::new(5, 0)).is_none());
    }

    #[test]
    fn closed_door_costs_more_than_floor() {
        let mut w = world(3, 3);
        w.spawn_at(ObjectTemplate::door(0), TileCoord::new(1, 1), Layer::Structure)
            .unwrap();
        let grid = CostGrid::build(&w, None);
        assert_eq!(grid.cost(TileCoord::new(1, 1)), Some(20));
        assert_eq!(grid.cost(TileCoord::new(0, 0)), Some(1));
    }

    #[test]
    fn routes_through_closed_door() {
        // The only way through the wall is the door.
        let mut w = world(30, 3);
        for y in 0..3 {
            if y != 1 {
                wall(&mut w, 15, y);
            }
        }
        w.spawn_at(ObjectTemplate::door(0), TileCoord::new(15, 1), Layer::Structure)
            .unwrap();
        let step = next_step(&w, TileCoord::new(14, 1), TileCoord::new(16, 1)).unwrap();
        assert_eq!(step.next, TileCoord::new(15, 1));
        assert_eq!(step.total_cost, 21);
    }

    #[test]
    fn other_agents_add_cost_but_do_not_block() {
        let mut w = world(3, 1);
        let mover = w
            .spawn_agent("a", TileCoord::new(0, 0), Facing::East)
            .unwrap();
        w.spawn_agent("b", TileCoord::new(1, 0), Facing::West).unwrap();
        let step = next_step(&w, TileCoord::new(0, 0), TileCoord::new(2, 0)).unwrap();
        assert_eq!(step.next, TileCoord::new(1, 0));
        assert_eq!(step.total_cost, 1 + 10 + 1);

        let grid = CostGrid::build(&w, Some(mover));
        assert_eq!(grid.cost(TileCoord::new(0, 0)), Some(1));
    }

    #[test]
    fn repeated_queries_agree() {
        let mut w = world(8, 8);
        for (x, y) in [(2, 1), (2, 2), (2, 3), (5, 4), (5, 5), (4, 5)] {
            wall(&mut w, x, y);
        }
        let from = TileCoord::new(0, 2);
        let to = TileCoord::new(7, 7);
        let first = next_step(&w, from, to);
        for _ in 0..5 {
            assert_eq!(next_step(&w, from, to), first);
        }
    }
}
