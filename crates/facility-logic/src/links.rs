//! Spanning connections between placed leaves.
//!
//! Starting from the first leaf, the planner repeatedly joins the closest
//! unconnected leaf to the connected set (Prim-style over Manhattan distance
//! between leaf cells) and routes a path between the two door fronts. Path
//! cells are not occupied here; they only collect exit marks that the
//! committer later turns into rooms.

use crate::error::GenerationError;
use crate::exits::ExitMarks;
use crate::grid::{manhattan, CellGrid, CellPosition};
use crate::leaf::PlacedLeaf;
use crate::pathfinding::{Path, Pathfinder};
use serde::{Deserialize, Serialize};

/// One routed link between two leaves, by index into the placed-leaf list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    /// Cells on the routed path, door fronts included.
    pub length: usize,
    /// Added after the spanning tree.
    pub extra: bool,
}

/// Output of [`connect_leaves`]: the tree's marks and its edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPlan {
    pub marks: ExitMarks,
    pub connections: Vec<Connection>,
}

/// Connect every leaf into one tree. Exactly `leaves.len() - 1` connections
/// on success; any unroutable pair fails the attempt.
pub fn connect_leaves(grid: &CellGrid, leaves: &[PlacedLeaf]) -> Result<LinkPlan, GenerationError> {
    let mut plan = LinkPlan::default();
    if leaves.len() < 2 {
        return Ok(plan);
    }

    let mut connected = vec![0usize];
    let mut remaining: Vec<usize> = (1..leaves.len()).collect();

    while !remaining.is_empty() {
        let (ri, ci) = closest_pair(leaves, &remaining, &connected);
        let to = remaining.remove(ri);
        let from = connected[ci];

        let connection = connect_pair(grid, leaves, from, to, false, &mut plan.marks)?;
        log::debug!(
            "Linked leaf {} {} -> leaf {} {} ({} cells)",
            from,
            leaves[from].position,
            to,
            leaves[to].position,
            connection.length
        );
        plan.connections.push(connection);
        connected.push(to);
    }

    log::info!(
        "Linked {} leaves with {} connections, {} cells marked",
        leaves.len(),
        plan.connections.len(),
        plan.marks.len()
    );
    Ok(plan)
}

/// Index into `remaining` and `connected` of the closest pair. The first pair
/// found wins ties (remaining outer, connected inner).
fn closest_pair(leaves: &[PlacedLeaf], remaining: &[usize], connected: &[usize]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_distance = u32::MAX;
    for (ri, &r) in remaining.iter().enumerate() {
        for (ci, &c) in connected.iter().enumerate() {
            let distance = manhattan(leaves[r].position, leaves[c].position);
            if distance < best_distance {
                best_distance = distance;
                best = (ri, ci);
            }
        }
    }
    best
}

/// Route and mark a path between the fronts of two leaves.
pub fn connect_pair(
    grid: &CellGrid,
    leaves: &[PlacedLeaf],
    from: usize,
    to: usize,
    extra: bool,
    marks: &mut ExitMarks,
) -> Result<Connection, GenerationError> {
    let start = usable_front(grid, &leaves[from])?;
    let goal = usable_front(grid, &leaves[to])?;

    let path = Pathfinder::new(grid)
        .find_path(start, goal)
        .ok_or(GenerationError::PathNotFound {
            from: start,
            to: goal,
        })?;

    mark_path(grid, &path, leaves[from].position, leaves[to].position, marks)?;
    Ok(Connection {
        from,
        to,
        length: path.cell_count(),
        extra,
    })
}

/// The leaf's front cell, if it is inside the grid and still free.
fn usable_front(grid: &CellGrid, leaf: &PlacedLeaf) -> Result<CellPosition, GenerationError> {
    let front = leaf.front();
    if !grid.contains(front) || grid.is_occupied(front) {
        return Err(GenerationError::LeafFrontBlocked {
            leaf: leaf.position,
        });
    }
    Ok(front)
}

/// Give every free path cell exits toward its path neighbours, and the two
/// ends an exit toward their own leaf.
pub fn mark_path(
    grid: &CellGrid,
    path: &Path,
    from_leaf: CellPosition,
    to_leaf: CellPosition,
    marks: &mut ExitMarks,
) -> Result<(), GenerationError> {
    let cells = path.cells();
    for (i, &pos) in cells.iter().enumerate() {
        if grid.is_occupied(pos) {
            continue;
        }
        if i > 0 {
            marks.mark_toward(pos, cells[i - 1])?;
        }
        if i + 1 < cells.len() {
            marks.mark_toward(pos, cells[i + 1])?;
        }
    }
    marks.mark_toward(path.start(), from_leaf)?;
    marks.mark_toward(path.goal(), to_leaf)?;
    Ok(())
}
