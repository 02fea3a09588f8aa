//! Pure layout generation for grid-based facilities.
//!
//! This crate contains all generation logic that is independent of any
//! engine or runtime. A preset and a seed go in; room placements, the routed
//! connections and a debug snapshot come out. Rooms reach the grid only
//! through the [`spawn::Spawner`] trait, so a host can attach its own visual
//! instances while the logic stays unit-testable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`attempt`] | One full attempt: leaves → links → extra paths → commit |
//! | [`classify`] | Exit set → room shape and facing |
//! | [`commit`] | Exit marks → corridor rooms, must-place quotas |
//! | [`error`] | `GenerationError`, every fatal attempt condition |
//! | [`exits`] | `ExitSet` bitflags and the per-attempt exit-mark map |
//! | [`extra`] | Redundant connections (fixed, by distance, by leaf count) |
//! | [`grid`] | Cells, directions, occupancy, edge and world-space helpers |
//! | [`leaf`] | Constrained placement of dead-end rooms |
//! | [`links`] | Nearest-pair spanning tree between leaves |
//! | [`pathfinding`] | A* with reserved-halo and door-front rules |
//! | [`rooms`] | Room archetypes and the JSON preset |
//! | [`snapshot`] | Read-only debug copy, ASCII rendering |
//! | [`spawn`] | Spawn interface and the bundled recording spawner |
//! | [`validate`] | Preset and layout validation |
//!
//! ```no_run
//! use facility_logic::{run_attempt, FacilityPreset};
//!
//! let preset = FacilityPreset::default();
//! match run_attempt(&preset, 42) {
//!     Ok(layout) => print!("{}", layout.snapshot.render_ascii()),
//!     Err(err) => eprintln!("attempt failed: {err}"),
//! }
//! ```

pub mod attempt;
pub mod classify;
pub mod commit;
pub mod error;
pub mod exits;
pub mod extra;
pub mod grid;
pub mod leaf;
pub mod links;
pub mod pathfinding;
pub mod rooms;
pub mod snapshot;
pub mod spawn;
pub mod validate;

pub use attempt::{run_attempt, run_attempt_with, Attempt, FacilityLayout};
pub use error::GenerationError;
pub use rooms::FacilityPreset;
