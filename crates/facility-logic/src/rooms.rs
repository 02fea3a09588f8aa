//! Room archetypes and the generator preset.
//!
//! A preset is the read-only input of one attempt: grid dimensions, cell
//! metrics, an ordered list of room archetypes and the extra-path strategy.
//! Presets are plain serde data and can be loaded from JSON.
//!
//! ```
//! use facility_logic::rooms::{FacilityPreset, RoomShape};
//!
//! let preset = FacilityPreset::default();
//! assert_eq!(preset.cells_x, 7);
//! assert!(!preset.archetypes_with_shape(RoomShape::Leaf).is_empty());
//! ```

use crate::error::GenerationError;
use crate::grid::{CellOffset, Direction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an archetype within [`FacilityPreset::rooms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(pub usize);

/// Shape category of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomShape {
    /// Dead end, placed before any corridor.
    Leaf,
    /// Two opposite exits.
    Straight,
    /// Two adjacent exits.
    Corner,
    /// Three exits.
    TJunction,
    /// Four exits.
    Cross,
}

impl RoomShape {
    pub const CORRIDORS: [RoomShape; 4] = [
        RoomShape::Straight,
        RoomShape::Corner,
        RoomShape::TJunction,
        RoomShape::Cross,
    ];
}

impl fmt::Display for RoomShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomShape::Leaf => "leaf",
            RoomShape::Straight => "straight",
            RoomShape::Corner => "corner",
            RoomShape::TJunction => "t-junction",
            RoomShape::Cross => "cross",
        };
        f.write_str(name)
    }
}

/// Placement constraints of a leaf archetype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafRules {
    /// Minimum Manhattan distance to the nearest border (`None` = unbounded).
    pub min_cells_from_edge: Option<u32>,
    /// Maximum Manhattan distance to the nearest border (`None` = unbounded).
    pub max_cells_from_edge: Option<u32>,
    /// Minimum Manhattan distance to every previously placed leaf.
    pub min_cells_from_leaf: u32,
    /// Fixed facing relative to the inward direction of the nearest border.
    /// `Up` faces straight inward, `Right` a quarter turn clockwise from it.
    pub direction_override: Option<Direction>,
}

impl LeafRules {
    pub fn accepts_edge_distance(&self, distance: u32) -> bool {
        self.min_cells_from_edge.map_or(true, |min| distance >= min)
            && self.max_cells_from_edge.map_or(true, |max| distance <= max)
    }
}

/// Role-specific data. Corridor roles carry nothing beyond the shared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RoomRole {
    Leaf(LeafRules),
    Straight,
    Corner,
    TJunction,
    Cross,
}

impl RoomRole {
    pub fn shape(&self) -> RoomShape {
        match self {
            RoomRole::Leaf(_) => RoomShape::Leaf,
            RoomRole::Straight => RoomShape::Straight,
            RoomRole::Corner => RoomShape::Corner,
            RoomRole::TJunction => RoomShape::TJunction,
            RoomRole::Cross => RoomShape::Cross,
        }
    }
}

fn default_spawn_chance() -> u8 {
    100
}

/// A configured room type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomArchetype {
    pub name: String,
    pub role: RoomRole,
    /// 1–100. Leaves always behave as 100.
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: u8,
    /// Leaves: instances to place. Corridors with chance 100: must-place quota.
    #[serde(default)]
    pub count: u32,
    /// Extra cells of a multi-cell room, authored for a `Down` facing.
    #[serde(default)]
    pub footprint: Vec<CellOffset>,
}

impl RoomArchetype {
    pub fn leaf(name: &str, count: u32, rules: LeafRules) -> Self {
        Self {
            name: name.to_string(),
            role: RoomRole::Leaf(rules),
            spawn_chance: 100,
            count,
            footprint: Vec::new(),
        }
    }

    pub fn corridor(name: &str, role: RoomRole, spawn_chance: u8) -> Self {
        Self {
            name: name.to_string(),
            role,
            spawn_chance,
            count: 0,
            footprint: Vec::new(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_footprint(mut self, footprint: Vec<CellOffset>) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn shape(&self) -> RoomShape {
        self.role.shape()
    }

    pub fn leaf_rules(&self) -> Option<&LeafRules> {
        match &self.role {
            RoomRole::Leaf(rules) => Some(rules),
            _ => None,
        }
    }

    pub fn spawn_chance(&self) -> u8 {
        match self.role {
            RoomRole::Leaf(_) => 100,
            _ => self.spawn_chance,
        }
    }

    /// Corridor archetype that has to appear `count` times in every layout.
    pub fn is_must_place(&self) -> bool {
        self.shape() != RoomShape::Leaf && self.spawn_chance() == 100 && self.count > 0
    }
}

/// How redundant connections are added after the spanning tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtraPathStrategy {
    /// Tree only.
    None,
    /// Exactly `count` extra connections between random leaf pairs.
    Fixed { count: u32 },
    /// The farthest pairs first, up to `max_count`.
    ByDistance { max_count: u32 },
    /// `max(1, round((leaves - 1) × percentage))` random extra connections.
    ByLeafCount { percentage: f32 },
}

impl Default for ExtraPathStrategy {
    fn default() -> Self {
        ExtraPathStrategy::ByDistance { max_count: 3 }
    }
}

fn default_name() -> String {
    "Facility".to_string()
}
fn default_cells() -> u32 {
    7
}
fn default_cell_size() -> f32 {
    10.0
}
fn default_cell_spacing() -> f32 {
    0.1
}
fn default_extra_path_min_distance() -> u32 {
    5
}
fn default_extra_path_attempts() -> u32 {
    10
}
fn default_attempts() -> u8 {
    8
}

/// Everything one generation attempt reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityPreset {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_cells")]
    pub cells_x: u32,
    #[serde(default = "default_cells")]
    pub cells_y: u32,
    /// World size of one cell.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// World gap between neighbouring cells.
    #[serde(default = "default_cell_spacing")]
    pub cell_spacing: f32,
    /// Leaves are placed in this order.
    pub rooms: Vec<RoomArchetype>,
    #[serde(default)]
    pub extra_paths: ExtraPathStrategy,
    /// Leaf pairs closer than this never get an extra connection.
    #[serde(default = "default_extra_path_min_distance")]
    pub extra_path_min_distance: u32,
    /// Random pair draws allowed for `Fixed` and `ByLeafCount`.
    #[serde(default = "default_extra_path_attempts")]
    pub extra_path_attempts: u32,
    /// Attempts the driver makes before giving up (1–16).
    #[serde(default = "default_attempts")]
    pub attempts: u8,
    /// Seed of the first attempt. `None` draws one.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for FacilityPreset {
    fn default() -> Self {
        Self {
            name: default_name(),
            cells_x: default_cells(),
            cells_y: default_cells(),
            cell_size: default_cell_size(),
            cell_spacing: default_cell_spacing(),
            rooms: vec![
                RoomArchetype::leaf(
                    "Entrance",
                    1,
                    LeafRules {
                        max_cells_from_edge: Some(0),
                        min_cells_from_leaf: 3,
                        direction_override: Some(Direction::Up),
                        ..Default::default()
                    },
                ),
                RoomArchetype::leaf(
                    "Office",
                    3,
                    LeafRules {
                        min_cells_from_edge: Some(1),
                        min_cells_from_leaf: 3,
                        ..Default::default()
                    },
                ),
                RoomArchetype::corridor("Hallway", RoomRole::Straight, 80),
                RoomArchetype::corridor("Service Hallway", RoomRole::Straight, 100)
                    .with_count(1),
                RoomArchetype::corridor("Corner", RoomRole::Corner, 100),
                RoomArchetype::corridor("T-Junction", RoomRole::TJunction, 60),
                RoomArchetype::corridor("Crossroads", RoomRole::Cross, 60),
            ],
            extra_paths: ExtraPathStrategy::default(),
            extra_path_min_distance: default_extra_path_min_distance(),
            extra_path_attempts: default_extra_path_attempts(),
            attempts: default_attempts(),
            seed: None,
        }
    }
}

impl FacilityPreset {
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        serde_json::from_str(json).map_err(|e| GenerationError::InvalidPreset(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GenerationError> {
        serde_json::to_string_pretty(self).map_err(|e| GenerationError::InvalidPreset(e.to_string()))
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&RoomArchetype> {
        self.rooms.get(id.0)
    }

    /// Ids of every archetype of `shape`, in preset order.
    pub fn archetypes_with_shape(&self, shape: RoomShape) -> Vec<ArchetypeId> {
        self.rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.shape() == shape)
            .map(|(i, _)| ArchetypeId(i))
            .collect()
    }

    /// Total leaf instances the preset asks for.
    pub fn leaf_count(&self) -> u32 {
        self.rooms
            .iter()
            .filter(|r| r.shape() == RoomShape::Leaf)
            .map(|r| r.count)
            .sum()
    }
}
