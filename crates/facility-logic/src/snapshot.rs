//! Read-only copy of an attempt's state for debug views.
//!
//! Hosts draw gizmos from it; the harness prints it as text. Nothing in the
//! generator reads a snapshot back.

use crate::exits::{ExitMarks, ExitSet};
use crate::grid::{CellGrid, CellPosition, Direction};
use crate::leaf::PlacedLeaf;
use crate::links::Connection;
use crate::rooms::{ArchetypeId, FacilityPreset, RoomShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCell {
    pub position: CellPosition,
    pub archetype: ArchetypeId,
    pub shape: RoomShape,
    pub facing: Direction,
    pub reserved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedCell {
    pub position: CellPosition,
    pub exits: ExitSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub width: i32,
    pub height: i32,
    /// Occupied cells only, column by column.
    pub cells: Vec<SnapshotCell>,
    /// Exit marks in position order.
    pub marks: Vec<MarkedCell>,
    pub leaves: Vec<PlacedLeaf>,
    pub connections: Vec<Connection>,
}

impl LayoutSnapshot {
    pub fn capture(
        grid: &CellGrid,
        preset: &FacilityPreset,
        marks: &ExitMarks,
        leaves: &[PlacedLeaf],
        connections: &[Connection],
    ) -> Self {
        let cells = grid
            .positions(|c| c.is_occupied())
            .into_iter()
            .filter_map(|position| {
                let occ = grid.occupant(position)?;
                let shape = preset.archetype(occ.archetype)?.shape();
                Some(SnapshotCell {
                    position,
                    archetype: occ.archetype,
                    shape,
                    facing: occ.facing,
                    reserved: occ.reserved,
                })
            })
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            cells,
            marks: marks
                .iter()
                .map(|(position, exits)| MarkedCell { position, exits })
                .collect(),
            leaves: leaves.to_vec(),
            connections: connections.to_vec(),
        }
    }

    /// Exits marked at `pos`, if any.
    pub fn exits_at(&self, pos: CellPosition) -> Option<ExitSet> {
        self.marks
            .iter()
            .find(|m| m.position == pos)
            .map(|m| m.exits)
    }

    /// One glyph per cell, highest `y` on the first line.
    ///
    /// `L` leaf, `#` reserved footprint, box-drawing glyphs for corridor
    /// rooms by their exits, `+` a marked cell nothing was placed on, `·`
    /// empty.
    pub fn render_ascii(&self) -> String {
        let occupied: BTreeMap<CellPosition, &SnapshotCell> =
            self.cells.iter().map(|c| (c.position, c)).collect();
        let marks: BTreeMap<CellPosition, ExitSet> =
            self.marks.iter().map(|m| (m.position, m.exits)).collect();

        let mut out = String::new();
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let pos = CellPosition::new(x, y);
                let glyph = match (occupied.get(&pos), marks.get(&pos)) {
                    (Some(cell), _) if cell.reserved => '#',
                    (Some(cell), _) if cell.shape == RoomShape::Leaf => 'L',
                    (Some(_), Some(&exits)) => exit_glyph(exits),
                    (Some(_), None) => '?',
                    (None, Some(_)) => '+',
                    (None, None) => '·',
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Box-drawing glyph for an exit set. `Up` points to the previous line.
fn exit_glyph(exits: ExitSet) -> char {
    const U: ExitSet = ExitSet::UP;
    const R: ExitSet = ExitSet::RIGHT;
    const D: ExitSet = ExitSet::DOWN;
    const L: ExitSet = ExitSet::LEFT;

    let table: [(ExitSet, char); 11] = [
        (U.union(D), '│'),
        (L.union(R), '─'),
        (U.union(R), '└'),
        (R.union(D), '┌'),
        (D.union(L), '┐'),
        (L.union(U), '┘'),
        (U.union(R).union(D), '├'),
        (U.union(D).union(L), '┤'),
        (U.union(R).union(L), '┴'),
        (R.union(D).union(L), '┬'),
        (ExitSet::all(), '┼'),
    ];
    table
        .iter()
        .find(|(set, _)| *set == exits)
        .map(|&(_, glyph)| glyph)
        .unwrap_or('?')
}
