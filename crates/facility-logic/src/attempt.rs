//! One generation attempt, start to finish.
//!
//! ```text
//! place_leaves ─▶ connect_leaves ─▶ add_extra_paths ─▶ LayoutCommitter::commit
//!                       └──────── ExitMarks ──────────────────┘
//! ```
//!
//! A fresh grid, exit-mark map and RNG belong to each attempt. Any error
//! abandons the attempt; retrying with another seed is the caller's call.

use crate::commit::LayoutCommitter;
use crate::error::GenerationError;
use crate::exits::ExitMarks;
use crate::extra::{add_extra_paths, ExtraPathReport};
use crate::grid::CellGrid;
use crate::leaf::{place_leaves, PlacedLeaf};
use crate::links::{connect_leaves, Connection};
use crate::rooms::FacilityPreset;
use crate::snapshot::LayoutSnapshot;
use crate::spawn::{GridSpawner, Placement, Spawner};
use crate::validate::{validate_preset, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Raw state of a finished attempt, for callers bringing their own spawner.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub seed: u64,
    pub grid: CellGrid,
    pub leaves: Vec<PlacedLeaf>,
    /// Spanning connections first, then extra ones.
    pub connections: Vec<Connection>,
    pub extra: ExtraPathReport,
    pub marks: ExitMarks,
    /// Corridor rooms placed by the committer.
    pub corridor_rooms: usize,
}

/// A successful attempt as handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityLayout {
    pub seed: u64,
    pub placements: Vec<Placement>,
    pub leaves: Vec<PlacedLeaf>,
    pub connections: Vec<Connection>,
    pub extra: ExtraPathReport,
    pub snapshot: LayoutSnapshot,
}

impl FacilityLayout {
    pub fn tree_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| !c.extra)
    }

    pub fn extra_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| c.extra)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Reject presets with validation errors; log the warnings.
fn check_preset(preset: &FacilityPreset) -> Result<(), GenerationError> {
    let mut first_error = None;
    for issue in validate_preset(preset) {
        match issue.severity {
            Severity::Error => {
                first_error.get_or_insert(issue.message);
            }
            Severity::Warning => log::warn!("Preset '{}': {}", preset.name, issue.message),
        }
    }
    match first_error {
        Some(message) => Err(GenerationError::InvalidPreset(message)),
        None => Ok(()),
    }
}

/// Run one attempt through `spawner`.
pub fn run_attempt_with(
    preset: &FacilityPreset,
    seed: u64,
    spawner: &mut impl Spawner,
) -> Result<Attempt, GenerationError> {
    check_preset(preset)?;

    let mut grid = CellGrid::with_metrics(
        preset.cells_x,
        preset.cells_y,
        preset.cell_size,
        preset.cell_spacing,
    );
    let mut rng = StdRng::seed_from_u64(seed);
    log::info!(
        "Generating '{}' on {}×{} with seed {}",
        preset.name,
        preset.cells_x,
        preset.cells_y,
        seed
    );

    let leaves = place_leaves(preset, &mut grid, spawner, &mut rng)?;
    let plan = connect_leaves(&grid, &leaves)?;
    let mut marks = plan.marks;
    let mut connections = plan.connections;

    let (extra_connections, extra) =
        add_extra_paths(preset, &grid, &leaves, &connections, &mut marks, &mut rng)?;
    connections.extend(extra_connections);

    let corridor_rooms = LayoutCommitter::new(preset).commit(&mut grid, &marks, spawner, &mut rng)?;

    Ok(Attempt {
        seed,
        grid,
        leaves,
        connections,
        extra,
        marks,
        corridor_rooms,
    })
}

/// Run one attempt with a [`GridSpawner`] and package the result.
pub fn run_attempt(preset: &FacilityPreset, seed: u64) -> Result<FacilityLayout, GenerationError> {
    let mut spawner = GridSpawner::new();
    let attempt = run_attempt_with(preset, seed, &mut spawner)?;
    let snapshot = LayoutSnapshot::capture(
        &attempt.grid,
        preset,
        &attempt.marks,
        &attempt.leaves,
        &attempt.connections,
    );
    Ok(FacilityLayout {
        seed,
        placements: spawner.into_placements(),
        leaves: attempt.leaves,
        connections: attempt.connections,
        extra: attempt.extra,
        snapshot,
    })
}
