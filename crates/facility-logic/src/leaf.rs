//! Leaf (dead-end room) placement.
//!
//! Leaves go down first, in preset order, `count` instances per archetype.
//! Each instance draws one cell uniformly from every cell that passes the
//! constraints, then a facing. Corridors are routed between leaf fronts
//! afterwards, so a leaf is only valid if its front cell is usable.

use crate::error::GenerationError;
use crate::grid::{manhattan, CellGrid, CellPosition, Direction};
use crate::rooms::{ArchetypeId, FacilityPreset, LeafRules, RoomArchetype, RoomShape};
use crate::spawn::{SpawnRequest, Spawner};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A leaf that has been spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedLeaf {
    pub archetype: ArchetypeId,
    pub position: CellPosition,
    pub facing: Direction,
}

impl PlacedLeaf {
    /// The cell in front of the door. May lie outside the grid.
    pub fn front(&self) -> CellPosition {
        self.position.step(self.facing)
    }
}

struct Candidate {
    position: CellPosition,
    facings: Vec<Direction>,
}

/// Place every leaf instance of `preset`, in order.
pub fn place_leaves(
    preset: &FacilityPreset,
    grid: &mut CellGrid,
    spawner: &mut impl Spawner,
    rng: &mut impl Rng,
) -> Result<Vec<PlacedLeaf>, GenerationError> {
    let leaf_ids = preset.archetypes_with_shape(RoomShape::Leaf);
    if leaf_ids.is_empty() {
        return Err(GenerationError::MissingArchetype {
            shape: RoomShape::Leaf,
        });
    }

    let mut placed: Vec<PlacedLeaf> = Vec::new();
    for id in leaf_ids {
        let Some(archetype) = preset.archetype(id) else {
            continue;
        };
        let Some(rules) = archetype.leaf_rules() else {
            continue;
        };

        for instance in 0..archetype.count {
            let candidates = candidates(grid, archetype, rules, &placed);
            if candidates.is_empty() {
                return Err(GenerationError::PlacementExhausted {
                    archetype: archetype.name.clone(),
                    instance: instance + 1,
                });
            }

            let chosen = &candidates[rng.gen_range(0..candidates.len())];
            let facing = if rules.direction_override.is_some() {
                chosen.facings[0]
            } else {
                chosen.facings[rng.gen_range(0..chosen.facings.len())]
            };

            let request = SpawnRequest {
                id,
                archetype,
                position: chosen.position,
                facing,
            };
            if !spawner.try_spawn(grid, &request) {
                return Err(GenerationError::SpawnRejected {
                    archetype: archetype.name.clone(),
                    position: chosen.position,
                });
            }

            log::debug!(
                "Leaf '{}' #{} at {} facing {} ({} candidates)",
                archetype.name,
                instance + 1,
                chosen.position,
                facing,
                candidates.len()
            );
            placed.push(PlacedLeaf {
                archetype: id,
                position: chosen.position,
                facing,
            });
        }
    }

    log::info!("Placed {} leaves", placed.len());
    Ok(placed)
}

/// Every free cell that satisfies `rules`, paired with its admissible facings.
fn candidates(
    grid: &CellGrid,
    archetype: &RoomArchetype,
    rules: &LeafRules,
    placed: &[PlacedLeaf],
) -> Vec<Candidate> {
    grid.positions(|cell| !cell.is_occupied())
        .into_iter()
        .filter(|&pos| {
            grid.edge_distance(pos)
                .is_some_and(|d| rules.accepts_edge_distance(d))
        })
        .filter(|&pos| {
            placed.iter().all(|leaf| {
                manhattan(pos, leaf.position) >= rules.min_cells_from_leaf && leaf.front() != pos
            })
        })
        .filter_map(|pos| {
            let facings: Vec<Direction> = match rules.direction_override {
                Some(offset) => grid
                    .nearest_edge_inward(pos)
                    .map(|inward| vec![inward.rotate(offset)])
                    .unwrap_or_default(),
                None => Direction::ALL.to_vec(),
            };
            let facings: Vec<Direction> = facings
                .into_iter()
                .filter(|&facing| facing_is_admissible(grid, archetype, placed, pos, facing))
                .collect();
            (!facings.is_empty()).then_some(Candidate {
                position: pos,
                facings,
            })
        })
        .collect()
}

/// The door must open onto a free in-bounds cell, and the footprint must fit
/// without covering that cell or any placed leaf's front.
fn facing_is_admissible(
    grid: &CellGrid,
    archetype: &RoomArchetype,
    placed: &[PlacedLeaf],
    pos: CellPosition,
    facing: Direction,
) -> bool {
    let front = pos.step(facing);
    if !grid.contains(front) || grid.is_occupied(front) {
        return false;
    }
    let Some(footprint) = grid.footprint_cells(pos, facing, &archetype.footprint) else {
        return false;
    };
    footprint.iter().all(|&cell| {
        cell != pos
            && cell != front
            && !grid.is_occupied(cell)
            && placed.iter().all(|leaf| leaf.front() != cell)
    })
}
