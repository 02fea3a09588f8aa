//! A* over the cell grid.
//!
//! Paths are searched between the front cells of leaf rooms. Besides plain
//! occupancy, a candidate cell is refused when it touches a reserved cell
//! (one-cell halo around multi-cell rooms) or sits directly in front of an
//! occupied room's door. The goal is always accepted as the final step.
//!
//! The search is stateless per call: the node arena and the open/closed sets
//! are rebuilt every time.

use crate::grid::{manhattan, CellGrid, CellPosition};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Ordered cells from start to goal, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellPosition>,
}

impl Path {
    pub fn cells(&self) -> &[CellPosition] {
        &self.cells
    }

    pub fn start(&self) -> CellPosition {
        self.cells[0]
    }

    pub fn goal(&self) -> CellPosition {
        self.cells[self.cells.len() - 1]
    }

    /// Number of cells, never zero.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of moves, `cell_count() - 1`.
    pub fn steps(&self) -> usize {
        self.cells.len() - 1
    }
}

struct SearchNode {
    position: CellPosition,
    g: u32,
    parent: Option<usize>,
}

/// Open-set entry. Pops lowest f, then lowest h, then earliest insertion.
#[derive(Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Read-only A* view of a grid.
pub struct Pathfinder<'g> {
    grid: &'g CellGrid,
}

impl<'g> Pathfinder<'g> {
    pub fn new(grid: &'g CellGrid) -> Self {
        Self { grid }
    }

    /// Whether a path may pass through `pos` as an intermediate cell.
    pub fn is_passable(&self, pos: CellPosition) -> bool {
        if !self.grid.contains(pos) || self.grid.is_occupied(pos) {
            return false;
        }
        self.grid.neighbors(pos).all(|(_, next)| match self.grid.occupant(next) {
            None => true,
            Some(occ) if occ.reserved => false,
            Some(occ) => next.step(occ.facing) != pos,
        })
    }

    /// Shortest 4-connected path, or `None` when the open set runs dry.
    ///
    /// `from == to` yields a single-cell path.
    pub fn find_path(&self, from: CellPosition, to: CellPosition) -> Option<Path> {
        if !self.grid.contains(from) || !self.grid.contains(to) {
            return None;
        }
        if from == to {
            return Some(Path { cells: vec![from] });
        }

        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open = BinaryHeap::new();
        let mut best_g: HashMap<CellPosition, u32> = HashMap::new();
        let mut closed: HashSet<CellPosition> = HashSet::new();
        let mut seq = 0u64;

        let h = manhattan(from, to);
        nodes.push(SearchNode {
            position: from,
            g: 0,
            parent: None,
        });
        best_g.insert(from, 0);
        open.push(OpenEntry {
            f: h,
            h,
            seq,
            node: 0,
        });

        while let Some(entry) = open.pop() {
            let current = entry.node;
            let pos = nodes[current].position;
            if !closed.insert(pos) {
                continue;
            }
            if pos == to {
                return Some(Path {
                    cells: Self::walk_back(&nodes, current),
                });
            }

            let g = nodes[current].g + 1;
            for (_, next) in self.grid.neighbors(pos) {
                if closed.contains(&next) {
                    continue;
                }
                if next != to && !self.is_passable(next) {
                    continue;
                }
                if best_g.get(&next).is_some_and(|&known| known <= g) {
                    continue;
                }
                best_g.insert(next, g);
                nodes.push(SearchNode {
                    position: next,
                    g,
                    parent: Some(current),
                });
                seq += 1;
                let h = manhattan(next, to);
                open.push(OpenEntry {
                    f: g + h,
                    h,
                    seq,
                    node: nodes.len() - 1,
                });
            }
        }

        None
    }

    fn walk_back(nodes: &[SearchNode], mut index: usize) -> Vec<CellPosition> {
        let mut cells = vec![nodes[index].position];
        while let Some(parent) = nodes[index].parent {
            cells.push(nodes[parent].position);
            index = parent;
        }
        cells.reverse();
        cells
    }
}

/// Convenience wrapper over [`Pathfinder::find_path`].
pub fn find_path(grid: &CellGrid, from: CellPosition, to: CellPosition) -> Option<Path> {
    Pathfinder::new(grid).find_path(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Direction, Occupant};
    use crate::rooms::ArchetypeId;
    use crate::spawn::SpawnHandle;

    fn occupy(grid: &mut CellGrid, pos: CellPosition, facing: Direction, reserved: bool) {
        grid.set(
            pos,
            Some(Occupant {
                archetype: ArchetypeId(0),
                facing,
                reserved,
                handle: SpawnHandle(0),
            }),
        );
    }

    fn assert_contiguous(path: &Path) {
        for pair in path.cells().windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1, "gap in {:?}", path.cells());
        }
    }

    #[test]
    fn test_straight_line() {
        let grid = CellGrid::new(5, 5);
        let path = find_path(&grid, CellPosition::new(0, 2), CellPosition::new(4, 2)).unwrap();
        assert_eq!(path.steps(), 4);
        assert_eq!(path.start(), CellPosition::new(0, 2));
        assert_eq!(path.goal(), CellPosition::new(4, 2));
        assert_contiguous(&path);
    }

    #[test]
    fn test_same_cell() {
        let grid = CellGrid::new(3, 3);
        let p = CellPosition::new(1, 1);
        let path = find_path(&grid, p, p).unwrap();
        assert_eq!(path.cells(), &[p]);
        assert_eq!(path.steps(), 0);
    }

    #[test]
    fn test_shortest_length_is_manhattan_on_empty_grid() {
        let grid = CellGrid::new(7, 7);
        let from = CellPosition::new(1, 1);
        let to = CellPosition::new(5, 4);
        let path = find_path(&grid, from, to).unwrap();
        assert_eq!(path.steps() as u32, manhattan(from, to));
        assert_contiguous(&path);
    }

    #[test]
    fn test_goal_accepted_even_if_occupied() {
        let mut grid = CellGrid::new(3, 2);
        let goal = CellPosition::new(2, 0);
        occupy(&mut grid, goal, Direction::Up, false);
        let path = find_path(&grid, CellPosition::new(0, 0), goal).unwrap();
        assert_eq!(path.goal(), goal);
        assert_contiguous(&path);
    }

    #[test]
    fn test_goal_facing_only_approach_is_unreachable() {
        // The goal's own door locks out (1,0), the only way in.
        let mut grid = CellGrid::new(3, 1);
        let goal = CellPosition::new(2, 0);
        occupy(&mut grid, goal, Direction::Left, false);
        assert!(find_path(&grid, CellPosition::new(0, 0), goal).is_none());
    }

    #[test]
    fn test_blocked_corridor_has_no_path() {
        let mut grid = CellGrid::new(3, 1);
        occupy(&mut grid, CellPosition::new(1, 0), Direction::Up, false);
        assert_eq!(
            find_path(&grid, CellPosition::new(0, 0), CellPosition::new(2, 0)),
            None
        );
    }

    #[test]
    fn test_detours_around_door_front() {
        let mut grid = CellGrid::new(5, 5);
        // room at (2,2) facing right: (3,2) is its door front
        occupy(&mut grid, CellPosition::new(2, 2), Direction::Right, false);
        let finder = Pathfinder::new(&grid);
        assert!(!finder.is_passable(CellPosition::new(3, 2)));
        assert!(finder.is_passable(CellPosition::new(1, 2)));

        let path = finder
            .find_path(CellPosition::new(3, 1), CellPosition::new(3, 3))
            .unwrap();
        assert!(!path.cells().contains(&CellPosition::new(3, 2)));
        assert_eq!(path.cell_count(), 5);
        assert_contiguous(&path);

        // but the door front itself can be a goal
        let path = finder
            .find_path(CellPosition::new(3, 0), CellPosition::new(3, 2))
            .unwrap();
        assert_eq!(path.goal(), CellPosition::new(3, 2));
    }

    #[test]
    fn test_reserved_halo() {
        let mut grid = CellGrid::new(5, 5);
        let reserved = CellPosition::new(2, 2);
        occupy(&mut grid, reserved, Direction::Down, true);
        let halo: Vec<_> = Direction::ALL.iter().map(|&d| reserved.step(d)).collect();

        let path = find_path(&grid, CellPosition::new(0, 2), CellPosition::new(4, 2)).unwrap();
        for cell in &halo {
            assert!(!path.cells().contains(cell), "path entered halo at {cell}");
        }
        assert_contiguous(&path);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let grid = CellGrid::new(3, 3);
        assert_eq!(
            find_path(&grid, CellPosition::new(-1, 0), CellPosition::new(2, 2)),
            None
        );
    }

    #[test]
    fn test_repeatable() {
        let mut grid = CellGrid::new(8, 8);
        occupy(&mut grid, CellPosition::new(4, 4), Direction::Left, false);
        occupy(&mut grid, CellPosition::new(2, 5), Direction::Down, true);
        let a = find_path(&grid, CellPosition::new(0, 0), CellPosition::new(7, 7));
        let b = find_path(&grid, CellPosition::new(0, 0), CellPosition::new(7, 7));
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}
