//! Turns exit marks into corridor rooms.
//!
//! Every marked cell that is still free is classified and filled with an
//! archetype of the matching shape. Must-place archetypes (chance 100 with a
//! count) are served first until their quota runs out; after that the
//! regular (chance < 100) archetypes of the shape are preferred.

use crate::classify::classify;
use crate::error::GenerationError;
use crate::exits::ExitMarks;
use crate::grid::CellGrid;
use crate::rooms::{ArchetypeId, FacilityPreset, RoomShape};
use crate::spawn::{SpawnRequest, Spawner};
use rand::Rng;
use std::collections::BTreeMap;

pub struct LayoutCommitter<'p> {
    preset: &'p FacilityPreset,
    quotas: BTreeMap<ArchetypeId, u32>,
}

impl<'p> LayoutCommitter<'p> {
    pub fn new(preset: &'p FacilityPreset) -> Self {
        let quotas = preset
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, room)| room.is_must_place())
            .map(|(i, room)| (ArchetypeId(i), room.count))
            .collect();
        Self { preset, quotas }
    }

    /// Quota still owed for `id`.
    pub fn remaining(&self, id: ArchetypeId) -> u32 {
        self.quotas.get(&id).copied().unwrap_or(0)
    }

    /// Pick an archetype for `shape`.
    pub fn select(
        &self,
        shape: RoomShape,
        rng: &mut impl Rng,
    ) -> Result<ArchetypeId, GenerationError> {
        let all = self.preset.archetypes_with_shape(shape);
        if all.is_empty() {
            return Err(GenerationError::MissingArchetype { shape });
        }

        let required: Vec<ArchetypeId> = all
            .iter()
            .copied()
            .filter(|&id| self.remaining(id) > 0)
            .collect();
        if !required.is_empty() {
            return Ok(required[rng.gen_range(0..required.len())]);
        }

        let regular: Vec<ArchetypeId> = all
            .iter()
            .copied()
            .filter(|&id| {
                self.preset
                    .archetype(id)
                    .is_some_and(|room| room.spawn_chance() < 100)
            })
            .collect();
        if !regular.is_empty() {
            return Ok(regular[rng.gen_range(0..regular.len())]);
        }

        Ok(all[rng.gen_range(0..all.len())])
    }

    fn consume(&mut self, id: ArchetypeId) {
        if let Some(left) = self.quotas.get_mut(&id) {
            *left = left.saturating_sub(1);
        }
    }

    /// Spawn a room on every free marked cell, in position order. Returns the
    /// number of rooms placed.
    pub fn commit(
        mut self,
        grid: &mut CellGrid,
        marks: &ExitMarks,
        spawner: &mut impl Spawner,
        rng: &mut impl Rng,
    ) -> Result<usize, GenerationError> {
        let mut placed = 0;
        for (position, exits) in marks.iter() {
            if grid.is_occupied(position) {
                continue;
            }
            let (shape, facing) = classify(exits)
                .ok_or(GenerationError::ClassificationUnresolvable { position, exits })?;
            let id = self.select(shape, rng)?;
            let Some(archetype) = self.preset.archetype(id) else {
                return Err(GenerationError::MissingArchetype { shape });
            };

            let request = SpawnRequest {
                id,
                archetype,
                position,
                facing,
            };
            if !spawner.try_spawn(grid, &request) {
                return Err(GenerationError::SpawnRejected {
                    archetype: archetype.name.clone(),
                    position,
                });
            }
            self.consume(id);
            placed += 1;
        }

        if let Some((id, remaining)) = self
            .quotas
            .iter()
            .map(|(&id, &left)| (id, left))
            .find(|&(_, left)| left > 0)
        {
            let archetype = self
                .preset
                .archetype(id)
                .map(|room| room.name.clone())
                .unwrap_or_default();
            return Err(GenerationError::QuotaUnsatisfied {
                archetype,
                remaining,
            });
        }

        log::info!("Committed {} corridor rooms", placed);
        Ok(placed)
    }
}
