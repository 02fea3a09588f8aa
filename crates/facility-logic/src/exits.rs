//! Exit masks and the per-attempt exit-mark map.
//!
//! Planners accumulate, for every cell a corridor passes through, the set of
//! directions the cell connects to. The committer later reads each set to
//! pick a room shape.

use crate::error::GenerationError;
use crate::grid::{CellGrid, CellPosition, Direction};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

bitflags! {
    /// Set of cardinal exits of one cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ExitSet: u8 {
        const UP = 1 << 0;
        const RIGHT = 1 << 1;
        const DOWN = 1 << 2;
        const LEFT = 1 << 3;
    }
}

impl ExitSet {
    pub fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => ExitSet::UP,
            Direction::Right => ExitSet::RIGHT,
            Direction::Down => ExitSet::DOWN,
            Direction::Left => ExitSet::LEFT,
        }
    }

    pub fn of(dirs: &[Direction]) -> Self {
        dirs.iter()
            .fold(ExitSet::empty(), |acc, &d| acc | ExitSet::from_direction(d))
    }

    pub fn add(&mut self, dir: Direction) {
        *self |= ExitSet::from_direction(dir);
    }

    pub fn has(self, dir: Direction) -> bool {
        self.contains(ExitSet::from_direction(dir))
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Member directions in cycle order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&d| self.has(d))
    }
}

/// Accumulated exits per marked cell for one attempt.
///
/// Ordered by position so that consumers iterate deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitMarks {
    marks: BTreeMap<CellPosition, ExitSet>,
}

impl ExitMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dir` to the exits of `pos`, creating the mark if needed.
    pub fn mark(&mut self, pos: CellPosition, dir: Direction) {
        self.marks.entry(pos).or_default().add(dir);
    }

    /// Mark `pos` as connecting toward the adjacent cell `toward`.
    pub fn mark_toward(
        &mut self,
        pos: CellPosition,
        toward: CellPosition,
    ) -> Result<(), GenerationError> {
        let dir = CellGrid::direction_between(pos, toward)?;
        self.mark(pos, dir);
        Ok(())
    }

    pub fn get(&self, pos: CellPosition) -> Option<ExitSet> {
        self.marks.get(&pos).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellPosition, ExitSet)> + '_ {
        self.marks.iter().map(|(&p, &e)| (p, e))
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl FromIterator<(CellPosition, ExitSet)> for ExitMarks {
    fn from_iter<I: IntoIterator<Item = (CellPosition, ExitSet)>>(iter: I) -> Self {
        Self {
            marks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_set_accumulates() {
        let mut exits = ExitSet::empty();
        assert_eq!(exits.count(), 0);
        exits.add(Direction::Up);
        exits.add(Direction::Up);
        exits.add(Direction::Left);
        assert_eq!(exits.count(), 2);
        assert!(exits.has(Direction::Left));
        assert!(!exits.has(Direction::Down));
        assert_eq!(exits, ExitSet::of(&[Direction::Left, Direction::Up]));
    }

    #[test]
    fn test_directions_in_cycle_order() {
        let exits = ExitSet::of(&[Direction::Left, Direction::Down, Direction::Up]);
        let dirs: Vec<_> = exits.directions().collect();
        assert_eq!(dirs, vec![Direction::Up, Direction::Down, Direction::Left]);
    }

    #[test]
    fn test_marks_merge_per_cell() {
        let mut marks = ExitMarks::new();
        let p = CellPosition::new(2, 2);
        marks.mark(p, Direction::Up);
        marks
            .mark_toward(p, CellPosition::new(3, 2))
            .expect("adjacent");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks.get(p), Some(ExitSet::UP | ExitSet::RIGHT));
        assert!(marks.mark_toward(p, CellPosition::new(3, 3)).is_err());
    }
}
