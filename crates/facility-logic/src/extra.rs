//! Redundant connections on top of the spanning tree.
//!
//! Extra paths are optional: a pair that cannot be routed is skipped and the
//! shortfall is logged and reported, never fatal.

use crate::error::GenerationError;
use crate::exits::ExitMarks;
use crate::grid::{manhattan, CellGrid};
use crate::leaf::PlacedLeaf;
use crate::links::{connect_pair, Connection};
use crate::rooms::{ExtraPathStrategy, FacilityPreset};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the extra-path pass set out to do and what it managed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPathReport {
    pub target: u32,
    pub added: u32,
    /// Random draws consumed (`Fixed`/`ByLeafCount`) or pairs tried (`ByDistance`).
    pub attempts: u32,
}

impl ExtraPathReport {
    pub fn shortfall(&self) -> u32 {
        self.target.saturating_sub(self.added)
    }
}

/// Order-independent key for a pair of leaf indices.
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

struct ExtraPathPlanner<'a> {
    grid: &'a CellGrid,
    leaves: &'a [PlacedLeaf],
    min_distance: u32,
    linked: BTreeSet<(usize, usize)>,
    connections: Vec<Connection>,
}

impl<'a> ExtraPathPlanner<'a> {
    /// Route one pair. `Ok(false)` when the pair could not be routed.
    fn try_link(
        &mut self,
        from: usize,
        to: usize,
        marks: &mut ExitMarks,
    ) -> Result<bool, GenerationError> {
        match connect_pair(self.grid, self.leaves, from, to, true, marks) {
            Ok(connection) => {
                log::debug!(
                    "Extra link leaf {} -> leaf {} ({} cells)",
                    from,
                    to,
                    connection.length
                );
                self.linked.insert(pair_key(from, to));
                self.connections.push(connection);
                Ok(true)
            }
            Err(err) if err.is_soft_for_extra_path() => {
                log::debug!("Skipping extra link {} -> {}: {}", from, to, err);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Random distinct, unlinked, far-enough pairs until `target` links or
    /// `max_draws` draws are spent.
    fn fixed(
        &mut self,
        target: u32,
        max_draws: u32,
        marks: &mut ExitMarks,
        rng: &mut impl Rng,
    ) -> Result<ExtraPathReport, GenerationError> {
        let n = self.leaves.len();
        let mut report = ExtraPathReport {
            target,
            ..Default::default()
        };
        while report.added < target && report.attempts < max_draws {
            report.attempts += 1;
            let from = rng.gen_range(0..n);
            let to = rng.gen_range(0..n);
            if from == to || self.linked.contains(&pair_key(from, to)) {
                continue;
            }
            if manhattan(self.leaves[from].position, self.leaves[to].position) < self.min_distance {
                continue;
            }
            if self.try_link(from, to, marks)? {
                report.added += 1;
            }
        }
        Ok(report)
    }

    /// Farthest eligible pairs first, up to `max_count` links.
    fn by_distance(
        &mut self,
        max_count: u32,
        marks: &mut ExitMarks,
    ) -> Result<ExtraPathReport, GenerationError> {
        let n = self.leaves.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                if self.linked.contains(&(i, j)) {
                    continue;
                }
                let distance = manhattan(self.leaves[i].position, self.leaves[j].position);
                if distance >= self.min_distance {
                    pairs.push((i, j, distance));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.cmp(&a.2));

        let target = max_count.min(pairs.len() as u32);
        let mut report = ExtraPathReport {
            target,
            ..Default::default()
        };
        for (i, j, _) in pairs {
            if report.added >= target {
                break;
            }
            report.attempts += 1;
            if self.try_link(i, j, marks)? {
                report.added += 1;
            }
        }
        Ok(report)
    }
}

/// Number of extra links `ByLeafCount` asks for: `max(1, round((n - 1) × p))`
/// with ties rounded to even.
pub fn leaf_count_target(leaves: usize, percentage: f32) -> u32 {
    let raw = (leaves.saturating_sub(1) as f32 * percentage).round_ties_even();
    (raw.max(0.0) as u32).max(1)
}

/// Add redundant connections per the preset's strategy. `tree` holds the
/// spanning connections; those pairs are never linked twice.
pub fn add_extra_paths(
    preset: &FacilityPreset,
    grid: &CellGrid,
    leaves: &[PlacedLeaf],
    tree: &[Connection],
    marks: &mut ExitMarks,
    rng: &mut impl Rng,
) -> Result<(Vec<Connection>, ExtraPathReport), GenerationError> {
    if leaves.len() < 2 || preset.extra_paths == ExtraPathStrategy::None {
        return Ok((Vec::new(), ExtraPathReport::default()));
    }

    let mut planner = ExtraPathPlanner {
        grid,
        leaves,
        min_distance: preset.extra_path_min_distance,
        linked: tree.iter().map(|c| pair_key(c.from, c.to)).collect(),
        connections: Vec::new(),
    };

    let report = match preset.extra_paths {
        ExtraPathStrategy::None => ExtraPathReport::default(),
        ExtraPathStrategy::Fixed { count } => {
            planner.fixed(count, preset.extra_path_attempts, marks, rng)?
        }
        ExtraPathStrategy::ByDistance { max_count } => planner.by_distance(max_count, marks)?,
        ExtraPathStrategy::ByLeafCount { percentage } => {
            let target = leaf_count_target(leaves.len(), percentage);
            planner.fixed(target, preset.extra_path_attempts, marks, rng)?
        }
    };

    if report.shortfall() > 0 {
        log::warn!(
            "Could only create {}/{} extra paths",
            report.added,
            report.target
        );
    } else {
        log::info!("Added {} extra paths", report.added);
    }
    Ok((planner.connections, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellPosition, Direction, Occupant};
    use crate::links::connect_leaves;
    use crate::rooms::ArchetypeId;
    use crate::spawn::SpawnHandle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corners(grid: &mut CellGrid) -> Vec<PlacedLeaf> {
        let spots = [
            (CellPosition::new(0, 1), Direction::Right),
            (CellPosition::new(8, 1), Direction::Left),
            (CellPosition::new(0, 7), Direction::Right),
            (CellPosition::new(8, 7), Direction::Left),
        ];
        spots
            .iter()
            .map(|&(position, facing)| {
                grid.set(
                    position,
                    Some(Occupant {
                        archetype: ArchetypeId(0),
                        facing,
                        reserved: false,
                        handle: SpawnHandle(0),
                    }),
                );
                PlacedLeaf {
                    archetype: ArchetypeId(0),
                    position,
                    facing,
                }
            })
            .collect()
    }

    fn preset(extra_paths: ExtraPathStrategy) -> FacilityPreset {
        FacilityPreset {
            cells_x: 9,
            cells_y: 9,
            extra_paths,
            extra_path_min_distance: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_leaf_count_target() {
        assert_eq!(leaf_count_target(5, 0.5), 2);
        assert_eq!(leaf_count_target(4, 0.5), 2); // 1.5 rounds to even
        assert_eq!(leaf_count_target(6, 0.5), 2); // 2.5 rounds to even
        assert_eq!(leaf_count_target(2, 0.0), 1);
        assert_eq!(leaf_count_target(11, 1.0), 10);
    }

    #[test]
    fn test_none_strategy_adds_nothing() {
        let mut grid = CellGrid::new(9, 9);
        let leaves = corners(&mut grid);
        let plan = connect_leaves(&grid, &leaves).unwrap();
        let mut marks = plan.marks.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let (extra, report) = add_extra_paths(
            &preset(ExtraPathStrategy::None),
            &grid,
            &leaves,
            &plan.connections,
            &mut marks,
            &mut rng,
        )
        .unwrap();
        assert!(extra.is_empty());
        assert_eq!(report, ExtraPathReport::default());
        assert_eq!(marks, plan.marks);
    }

    #[test]
    fn test_by_distance_links_farthest_unlinked_pairs() {
        let mut grid = CellGrid::new(9, 9);
        let leaves = corners(&mut grid);
        let plan = connect_leaves(&grid, &leaves).unwrap();
        let mut marks = plan.marks.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let (extra, report) = add_extra_paths(
            &preset(ExtraPathStrategy::ByDistance { max_count: 1 }),
            &grid,
            &leaves,
            &plan.connections,
            &mut marks,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.target, 1);
        assert_eq!(report.added, 1);
        assert_eq!(extra.len(), 1);
        // diagonals are the farthest pairs
        let key = pair_key(extra[0].from, extra[0].to);
        assert!(key == (0, 3) || key == (1, 2), "got {key:?}");
        assert!(extra[0].extra);
    }

    #[test]
    fn test_never_duplicates_a_pair() {
        let mut grid = CellGrid::new(9, 9);
        let leaves = corners(&mut grid);
        let plan = connect_leaves(&grid, &leaves).unwrap();
        let mut marks = plan.marks.clone();
        let mut rng = StdRng::seed_from_u64(11);
        let (extra, report) = add_extra_paths(
            &FacilityPreset {
                extra_path_attempts: 200,
                ..preset(ExtraPathStrategy::Fixed { count: 10 })
            },
            &grid,
            &leaves,
            &plan.connections,
            &mut marks,
            &mut rng,
        )
        .unwrap();

        let mut keys: BTreeSet<_> = plan
            .connections
            .iter()
            .map(|c| pair_key(c.from, c.to))
            .collect();
        for c in &extra {
            assert!(keys.insert(pair_key(c.from, c.to)), "duplicate {c:?}");
        }
        assert!(report.added < report.target);
        assert_eq!(report.added as usize, extra.len());
        assert!(report.attempts <= 200);
    }

    #[test]
    fn test_min_distance_filters_pairs() {
        let mut grid = CellGrid::new(9, 9);
        let leaves = corners(&mut grid);
        let plan = connect_leaves(&grid, &leaves).unwrap();
        let mut marks = plan.marks.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let (extra, report) = add_extra_paths(
            &FacilityPreset {
                extra_path_min_distance: 100,
                ..preset(ExtraPathStrategy::ByDistance { max_count: 3 })
            },
            &grid,
            &leaves,
            &plan.connections,
            &mut marks,
            &mut rng,
        )
        .unwrap();
        assert!(extra.is_empty());
        assert_eq!(report.target, 0);
    }
}
