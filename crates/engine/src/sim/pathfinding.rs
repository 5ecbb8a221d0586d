use std::collections::HashSet;

use tracing::debug;

use super::grid::GridCell;
use super::scene::Passability;

pub const MAX_PATH_EXPANSIONS: u32 = 500;

const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: GridCell,
    g_cost: u32,
    f_cost: u32,
    parent: Option<usize>,
}

/// Grid A* with 4-connectivity and a Manhattan heuristic.
///
/// Returns the waypoints after `start` up to and including `goal`, or an empty
/// sequence when the goal is unreachable or the expansion cap is exceeded.
/// The goal cell is always treated as traversable.
pub fn find_path<P>(grid: &P, start: GridCell, goal: GridCell) -> Vec<GridCell>
where
    P: Passability + ?Sized,
{
    let mut nodes = vec![PathNode {
        cell: start,
        g_cost: 0,
        f_cost: 0,
        parent: None,
    }];
    let mut open: Vec<usize> = vec![0];
    let mut closed: HashSet<GridCell> = HashSet::new();
    let mut expansions = 0u32;

    while !open.is_empty() {
        if expansions > MAX_PATH_EXPANSIONS {
            debug!(
                start = %start,
                goal = %goal,
                expansions,
                "pathfinding_expansion_cap_reached"
            );
            return Vec::new();
        }
        expansions = expansions.saturating_add(1);

        let best_slot = pick_best_open_slot(&open, &nodes);
        let current_index = open[best_slot];
        let current = nodes[current_index];
        if current.cell == goal {
            return reconstruct_path(&nodes, current_index);
        }

        open.remove(best_slot);
        closed.insert(current.cell);

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let neighbor = current.cell.offset(dx, dy);
            if !(neighbor == goal || grid.is_passable(neighbor)) {
                continue;
            }
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative_g = current.g_cost.saturating_add(1);
            let already_open = open
                .iter()
                .copied()
                .find(|&index| nodes[index].cell == neighbor);
            match already_open {
                Some(index) => {
                    let node = &mut nodes[index];
                    if tentative_g < node.g_cost {
                        let h_cost = node.f_cost.saturating_sub(node.g_cost);
                        node.g_cost = tentative_g;
                        node.f_cost = tentative_g.saturating_add(h_cost);
                        node.parent = Some(current_index);
                    }
                }
                None => {
                    let h_cost = neighbor.manhattan_distance(goal);
                    nodes.push(PathNode {
                        cell: neighbor,
                        g_cost: tentative_g,
                        f_cost: tentative_g.saturating_add(h_cost),
                        parent: Some(current_index),
                    });
                    open.push(nodes.len() - 1);
                }
            }
        }
    }

    Vec::new()
}

/// Lowest f wins; ties go to the earliest open slot.
fn pick_best_open_slot(open: &[usize], nodes: &[PathNode]) -> usize {
    let mut best_slot = 0usize;
    for slot in 1..open.len() {
        if nodes[open[slot]].f_cost < nodes[open[best_slot]].f_cost {
            best_slot = slot;
        }
    }
    best_slot
}

fn reconstruct_path(nodes: &[PathNode], goal_index: usize) -> Vec<GridCell> {
    let mut path = Vec::new();
    let mut cursor = goal_index;
    while let Some(parent) = nodes[cursor].parent {
        path.push(nodes[cursor].cell);
        cursor = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGrid {
        width: i32,
        height: i32,
        blocked: HashSet<GridCell>,
    }

    impl TestGrid {
        fn open(width: i32, height: i32) -> Self {
            Self {
                width,
                height,
                blocked: HashSet::new(),
            }
        }

        fn block(mut self, x: i32, y: i32) -> Self {
            self.blocked.insert(GridCell::new(x, y));
            self
        }
    }

    impl Passability for TestGrid {
        fn is_passable(&self, cell: GridCell) -> bool {
            cell.x >= 0
                && cell.y >= 0
                && cell.x < self.width
                && cell.y < self.height
                && !self.blocked.contains(&cell)
        }
    }

    fn assert_four_adjacent(start: GridCell, path: &[GridCell]) {
        let mut previous = start;
        for cell in path {
            assert_eq!(previous.manhattan_distance(*cell), 1, "{previous} -> {cell}");
            previous = *cell;
        }
    }

    #[test]
    fn astar_tie_break_follows_neighbor_order() {
        let grid = TestGrid::open(3, 3);
        let path = find_path(&grid, GridCell::new(0, 0), GridCell::new(2, 2));
        assert_eq!(
            path,
            vec![
                GridCell::new(0, 1),
                GridCell::new(0, 2),
                GridCell::new(1, 2),
                GridCell::new(2, 2),
            ]
        );
    }

    #[test]
    fn astar_path_never_steps_onto_blocked_cell() {
        let mut grid = TestGrid::open(7, 5);
        for y in 0..4 {
            grid = grid.block(3, y);
        }
        let start = GridCell::new(1, 2);
        let goal = GridCell::new(5, 2);
        let path = find_path(&grid, start, goal);

        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        assert_four_adjacent(start, &path);
        for cell in &path[..path.len() - 1] {
            assert!(grid.is_passable(*cell), "path crossed blocked cell {cell}");
        }
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn astar_is_deterministic_on_symmetric_map() {
        let grid = TestGrid::open(5, 5).block(2, 2);
        let first = find_path(&grid, GridCell::new(0, 2), GridCell::new(4, 2));
        let second = find_path(&grid, GridCell::new(0, 2), GridCell::new(4, 2));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn occupied_goal_is_still_reachable() {
        let grid = TestGrid::open(5, 1).block(3, 0);
        let path = find_path(&grid, GridCell::new(0, 0), GridCell::new(3, 0));
        assert_eq!(
            path,
            vec![GridCell::new(1, 0), GridCell::new(2, 0), GridCell::new(3, 0)]
        );
    }

    #[test]
    fn start_equal_to_goal_yields_empty_path() {
        let grid = TestGrid::open(3, 3);
        assert!(find_path(&grid, GridCell::new(1, 1), GridCell::new(1, 1)).is_empty());
    }

    #[test]
    fn walled_off_goal_yields_empty_path() {
        let grid = TestGrid::open(5, 5)
            .block(3, 0)
            .block(3, 1)
            .block(3, 2)
            .block(3, 3)
            .block(3, 4);
        assert!(find_path(&grid, GridCell::new(0, 0), GridCell::new(4, 4)).is_empty());
    }

    #[test]
    fn corridor_within_expansion_cap_is_found() {
        let grid = TestGrid::open(451, 1);
        let path = find_path(&grid, GridCell::new(0, 0), GridCell::new(450, 0));
        assert_eq!(path.len(), 450);
        assert_eq!(path.last(), Some(&GridCell::new(450, 0)));
    }

    #[test]
    fn corridor_beyond_expansion_cap_yields_empty_path() {
        let grid = TestGrid::open(700, 1);
        let path = find_path(&grid, GridCell::new(0, 0), GridCell::new(650, 0));
        assert!(path.is_empty());
    }
}
