//! Attempt-level failures.
//!
//! Every fatal condition of a generation attempt is a variant here. The
//! attempt driver decides whether to reseed and retry; nothing in this crate
//! retries locally.

use crate::exits::ExitSet;
use crate::grid::CellPosition;
use crate::rooms::RoomShape;
use thiserror::Error;

/// Why a generation attempt (or one of its phases) failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Two positions were expected to share a single cardinal axis but do not.
    /// Always a caller bug.
    #[error("positions {from} and {to} are identical or not axis-aligned")]
    Geometry { from: CellPosition, to: CellPosition },

    /// No cell satisfies the constraints for a required leaf instance.
    #[error("no valid cell for leaf '{archetype}' (instance {instance})")]
    PlacementExhausted { archetype: String, instance: u32 },

    /// A placed leaf has no free, in-bounds cell in front of its door.
    #[error("leaf at {leaf} has no free cell in front of its door")]
    LeafFrontBlocked { leaf: CellPosition },

    /// A* exhausted its open set.
    #[error("no path from {from} to {to}")]
    PathNotFound { from: CellPosition, to: CellPosition },

    /// A marked cell carries an exit count outside {2, 3, 4}.
    #[error("cell {position} has unclassifiable exits {exits:?}")]
    ClassificationUnresolvable { position: CellPosition, exits: ExitSet },

    /// A shape is needed but the preset has no archetype for it.
    #[error("preset has no {shape} archetype")]
    MissingArchetype { shape: RoomShape },

    /// The spawn interface refused a placement the planner considered valid.
    #[error("spawner rejected '{archetype}' at {position}")]
    SpawnRejected {
        archetype: String,
        position: CellPosition,
    },

    /// A must-place archetype was not placed often enough.
    #[error("must-place room '{archetype}' still needs {remaining} more")]
    QuotaUnsatisfied { archetype: String, remaining: u32 },

    /// The preset failed validation before generation started.
    #[error("invalid preset: {0}")]
    InvalidPreset(String),
}

impl GenerationError {
    /// Failures an optional connection may swallow: the pair is skipped and
    /// counted as a shortfall instead of failing the attempt.
    pub fn is_soft_for_extra_path(&self) -> bool {
        matches!(
            self,
            GenerationError::PathNotFound { .. } | GenerationError::LeafFrontBlocked { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_positions() {
        let err = GenerationError::PathNotFound {
            from: CellPosition::new(1, 2),
            to: CellPosition::new(5, 5),
        };
        assert_eq!(err.to_string(), "no path from (1, 2) to (5, 5)");
    }

    #[test]
    fn test_soft_failures() {
        let leaf = CellPosition::new(0, 0);
        assert!(GenerationError::LeafFrontBlocked { leaf }.is_soft_for_extra_path());
        assert!(!GenerationError::Geometry { from: leaf, to: leaf }.is_soft_for_extra_path());
        assert!(!GenerationError::InvalidPreset("x".into()).is_soft_for_extra_path());
    }
}
