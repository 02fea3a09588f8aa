//! Preset and layout validation.
//!
//! Pure functions that take a preset or a finished layout and return a list
//! of issues. Preset errors stop an attempt before it starts; layout checks
//! are run by the harness after generation.

use crate::attempt::FacilityLayout;
use crate::exits::ExitSet;
use crate::grid::CellPosition;
use crate::rooms::{ExtraPathStrategy, FacilityPreset, RoomShape};
use crate::spawn::Placement;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Attempts the driver is allowed to make.
pub const ATTEMPT_RANGE: std::ops::RangeInclusive<u8> = 1..=16;

/// Cells a preset may ask for along each axis.
pub const GRID_RANGE: std::ops::RangeInclusive<u32> = 3..=50;

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

fn error(category: &'static str, message: String) -> ValidationIssue {
    ValidationIssue {
        category,
        severity: Severity::Error,
        message,
    }
}

// ── A. Preset ───────────────────────────────────────────────────────────

/// Check a preset before generating from it.
pub fn validate_preset(preset: &FacilityPreset) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let (min, max) = (*GRID_RANGE.start(), *GRID_RANGE.end());
    if preset.cells_x < min || preset.cells_y < min {
        issues.push(error(
            "grid",
            format!(
                "grid {}×{} is smaller than {min}×{min}",
                preset.cells_x, preset.cells_y
            ),
        ));
    } else if preset.cells_x > max || preset.cells_y > max {
        issues.push(error(
            "grid",
            format!(
                "grid {}×{} is larger than {max}×{max}",
                preset.cells_x, preset.cells_y
            ),
        ));
    }
    if preset.cell_size <= 0.0 || preset.cell_spacing < 0.0 {
        issues.push(error(
            "grid",
            format!(
                "cell size {} / spacing {} out of range",
                preset.cell_size, preset.cell_spacing
            ),
        ));
    }
    if !ATTEMPT_RANGE.contains(&preset.attempts) {
        issues.push(error(
            "attempts",
            format!("attempts {} outside 1..=16", preset.attempts),
        ));
    }

    if preset.archetypes_with_shape(RoomShape::Leaf).is_empty() {
        issues.push(error("rooms", "no leaf archetype".to_string()));
    }

    for room in &preset.rooms {
        match room.leaf_rules() {
            Some(rules) => {
                if room.count == 0 {
                    issues.push(error(
                        "rooms",
                        format!("leaf '{}' has count 0", room.name),
                    ));
                }
                if let (Some(min), Some(max)) = (rules.min_cells_from_edge, rules.max_cells_from_edge)
                {
                    if min > max {
                        issues.push(error(
                            "rooms",
                            format!(
                                "leaf '{}' edge band {}..={} is inverted",
                                room.name, min, max
                            ),
                        ));
                    }
                }
            }
            None => {
                if !(1..=100).contains(&room.spawn_chance) {
                    issues.push(error(
                        "rooms",
                        format!(
                            "'{}' spawn chance {} outside 1..=100",
                            room.name, room.spawn_chance
                        ),
                    ));
                }
            }
        }
    }

    for shape in RoomShape::CORRIDORS {
        if preset.archetypes_with_shape(shape).is_empty() {
            issues.push(ValidationIssue {
                category: "rooms",
                severity: Severity::Warning,
                message: format!("no {} archetype; layouts that need one will fail", shape),
            });
        }
    }

    if let ExtraPathStrategy::ByLeafCount { percentage } = preset.extra_paths {
        if !(0.0..=1.0).contains(&percentage) {
            issues.push(error(
                "extra_paths",
                format!("percentage {} outside 0..=1", percentage),
            ));
        }
    }

    issues
}

// ── B. Layout geometry ──────────────────────────────────────────────────

/// No cell is claimed by two placements.
pub fn check_overlaps(placements: &[Placement]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut owner: BTreeMap<CellPosition, &str> = BTreeMap::new();
    for p in placements {
        for cell in p.cells() {
            if let Some(prev) = owner.insert(cell, &p.name) {
                issues.push(error(
                    "overlap",
                    format!("{} claimed by both '{}' and '{}'", cell, prev, p.name),
                ));
            }
        }
    }
    issues
}

/// Every placed cell lies inside the grid.
pub fn check_in_bounds(placements: &[Placement], width: i32, height: i32) -> Vec<ValidationIssue> {
    placements
        .iter()
        .flat_map(|p| p.cells().map(move |cell| (p, cell)))
        .filter(|(_, c)| c.x < 0 || c.y < 0 || c.x >= width || c.y >= height)
        .map(|(p, c)| {
            error(
                "bounds",
                format!("'{}' has a cell at {} outside {}×{}", p.name, c, width, height),
            )
        })
        .collect()
}

// ── C. Connectivity ─────────────────────────────────────────────────────

fn corridor_cells(placements: &[Placement]) -> BTreeSet<CellPosition> {
    placements
        .iter()
        .filter(|p| p.shape != RoomShape::Leaf)
        .map(|p| p.position)
        .collect()
}

/// Every leaf door opens onto a corridor room. Skipped for lone leaves,
/// which have nothing to connect to.
pub fn check_leaf_fronts(layout: &FacilityLayout) -> Vec<ValidationIssue> {
    if layout.leaves.len() < 2 {
        return Vec::new();
    }
    let corridors = corridor_cells(&layout.placements);
    layout
        .leaves
        .iter()
        .filter(|leaf| !corridors.contains(&leaf.front()))
        .map(|leaf| {
            error(
                "leaf_front",
                format!(
                    "leaf at {} faces {} but {} holds no corridor",
                    leaf.position,
                    leaf.facing,
                    leaf.front()
                ),
            )
        })
        .collect()
}

/// Every corridor exit leads to a room that opens back toward it.
pub fn check_exit_reciprocity(layout: &FacilityLayout) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let corridors = corridor_cells(&layout.placements);
    let leaf_fronts: BTreeMap<CellPosition, CellPosition> = layout
        .leaves
        .iter()
        .map(|leaf| (leaf.position, leaf.front()))
        .collect();
    let exits_at = |pos| layout.snapshot.exits_at(pos).unwrap_or(ExitSet::empty());

    for &pos in &corridors {
        for dir in exits_at(pos).directions() {
            let next = pos.step(dir);
            let ok = if corridors.contains(&next) {
                exits_at(next).has(dir.opposite())
            } else {
                leaf_fronts.get(&next) == Some(&pos)
            };
            if !ok {
                issues.push(error(
                    "exits",
                    format!("corridor at {} opens {} onto nothing that opens back", pos, dir),
                ));
            }
        }
    }
    issues
}

/// All leaves can reach each other through exit-connected corridors.
pub fn check_leaf_reachability(layout: &FacilityLayout) -> Vec<ValidationIssue> {
    let Some(first) = layout.leaves.first() else {
        return Vec::new();
    };
    if layout.leaves.len() < 2 {
        return Vec::new();
    }
    let corridors = corridor_cells(&layout.placements);

    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    if corridors.contains(&first.front()) {
        seen.insert(first.front());
        queue.push_back(first.front());
    }
    while let Some(pos) = queue.pop_front() {
        let exits = layout.snapshot.exits_at(pos).unwrap_or(ExitSet::empty());
        for dir in exits.directions() {
            let next = pos.step(dir);
            if corridors.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let unreached: Vec<_> = layout
        .leaves
        .iter()
        .filter(|leaf| !seen.contains(&leaf.front()))
        .collect();
    if unreached.is_empty() {
        return Vec::new();
    }
    vec![error(
        "connectivity",
        format!(
            "{} of {} leaves unreachable from the first (e.g. leaf at {})",
            unreached.len(),
            layout.leaves.len(),
            unreached[0].position
        ),
    )]
}

/// Must-place archetypes appear at least `count` times.
pub fn check_quotas(layout: &FacilityLayout, preset: &FacilityPreset) -> Vec<ValidationIssue> {
    let mut placed: BTreeMap<usize, u32> = BTreeMap::new();
    for p in &layout.placements {
        *placed.entry(p.archetype.0).or_default() += 1;
    }
    preset
        .rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| room.is_must_place())
        .filter_map(|(i, room)| {
            let have = placed.get(&i).copied().unwrap_or(0);
            (have < room.count).then(|| {
                error(
                    "quota",
                    format!("'{}' placed {} of {} times", room.name, have, room.count),
                )
            })
        })
        .collect()
}

// ── Master validation ───────────────────────────────────────────────────

/// Run every layout check.
pub fn validate_layout(layout: &FacilityLayout, preset: &FacilityPreset) -> Vec<ValidationIssue> {
    let mut all = Vec::new();
    all.extend(check_overlaps(&layout.placements));
    all.extend(check_in_bounds(
        &layout.placements,
        layout.snapshot.width,
        layout.snapshot.height,
    ));
    all.extend(check_leaf_fronts(layout));
    all.extend(check_exit_reciprocity(layout));
    all.extend(check_leaf_reachability(layout));
    all.extend(check_quotas(layout, preset));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::run_attempt;
    use crate::grid::Direction;
    use crate::leaf::PlacedLeaf;
    use crate::rooms::{ArchetypeId, LeafRules, RoomArchetype, RoomRole};
    use crate::snapshot::{LayoutSnapshot, MarkedCell};
    use crate::spawn::SpawnHandle;

    fn placement(name: &str, shape: RoomShape, x: i32, y: i32, facing: Direction) -> Placement {
        Placement {
            handle: SpawnHandle(0),
            archetype: ArchetypeId(0),
            name: name.to_string(),
            shape,
            position: CellPosition::new(x, y),
            facing,
            footprint: Vec::new(),
            anchor: [0.0; 3],
            yaw_degrees: facing.yaw_degrees(),
        }
    }

    /// Leaf (0,0)→ corridor (1,0) ─ (2,0) ←leaf (3,0).
    fn tiny_layout() -> FacilityLayout {
        let leaves = vec![
            PlacedLeaf {
                archetype: ArchetypeId(0),
                position: CellPosition::new(0, 0),
                facing: Direction::Right,
            },
            PlacedLeaf {
                archetype: ArchetypeId(0),
                position: CellPosition::new(3, 0),
                facing: Direction::Left,
            },
        ];
        let both = ExitSet::LEFT | ExitSet::RIGHT;
        FacilityLayout {
            seed: 0,
            placements: vec![
                placement("A", RoomShape::Leaf, 0, 0, Direction::Right),
                placement("Hall", RoomShape::Straight, 1, 0, Direction::Right),
                placement("Hall", RoomShape::Straight, 2, 0, Direction::Right),
                placement("B", RoomShape::Leaf, 3, 0, Direction::Left),
            ],
            leaves: leaves.clone(),
            connections: Vec::new(),
            extra: Default::default(),
            snapshot: LayoutSnapshot {
                width: 4,
                height: 3,
                marks: vec![
                    MarkedCell {
                        position: CellPosition::new(1, 0),
                        exits: both,
                    },
                    MarkedCell {
                        position: CellPosition::new(2, 0),
                        exits: both,
                    },
                ],
                leaves,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_default_preset_is_clean() {
        let issues = validate_preset(&FacilityPreset::default());
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn test_preset_errors() {
        let mut preset = FacilityPreset {
            cells_x: 2,
            attempts: 0,
            extra_paths: ExtraPathStrategy::ByLeafCount { percentage: 1.5 },
            rooms: vec![
                RoomArchetype::leaf(
                    "Bad",
                    0,
                    LeafRules {
                        min_cells_from_edge: Some(3),
                        max_cells_from_edge: Some(1),
                        ..Default::default()
                    },
                ),
                RoomArchetype::corridor("Zero", RoomRole::Straight, 0),
            ],
            ..Default::default()
        };
        let issues = validate_preset(&preset);
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 6, "{errors:?}");
        // corner, T and cross missing
        assert_eq!(issues.len() - errors.len(), 3);

        preset.rooms.retain(|r| r.shape() != RoomShape::Leaf);
        assert!(validate_preset(&preset)
            .iter()
            .any(|i| i.message == "no leaf archetype"));
    }

    #[test]
    fn test_grid_size_bounds() {
        let oversize = |cells_x, cells_y| FacilityPreset {
            cells_x,
            cells_y,
            ..Default::default()
        };
        let grid_errors = |preset: &FacilityPreset| {
            validate_preset(preset)
                .into_iter()
                .filter(|i| i.category == "grid" && i.severity == Severity::Error)
                .count()
        };
        assert_eq!(grid_errors(&oversize(50, 50)), 0);
        assert_eq!(grid_errors(&oversize(51, 10)), 1);
        assert_eq!(grid_errors(&oversize(10, 51)), 1);
        assert_eq!(grid_errors(&oversize(50_000, 50_000)), 1);
        assert!(matches!(
            run_attempt(&oversize(50_000, 50_000), 0),
            Err(crate::GenerationError::InvalidPreset(_))
        ));
    }

    #[test]
    fn test_tiny_layout_is_valid() {
        let layout = tiny_layout();
        let preset = FacilityPreset::default();
        assert!(check_overlaps(&layout.placements).is_empty());
        assert!(check_in_bounds(&layout.placements, 4, 3).is_empty());
        assert!(check_leaf_fronts(&layout).is_empty());
        assert!(check_exit_reciprocity(&layout).is_empty());
        assert!(check_leaf_reachability(&layout).is_empty());
        // the default preset's Service Hallway is archetype 3, never placed here
        assert_eq!(check_quotas(&layout, &preset).len(), 1);
    }

    #[test]
    fn test_overlap_and_bounds() {
        let mut layout = tiny_layout();
        layout
            .placements
            .push(placement("Dup", RoomShape::Corner, 1, 0, Direction::Up));
        layout
            .placements
            .push(placement("Far", RoomShape::Corner, 9, 0, Direction::Up));
        assert_eq!(check_overlaps(&layout.placements).len(), 1);
        assert_eq!(check_in_bounds(&layout.placements, 4, 3).len(), 1);
    }

    #[test]
    fn test_broken_corridor_detected() {
        let mut layout = tiny_layout();
        layout.placements.remove(2);
        layout.snapshot.marks.remove(1);
        assert_eq!(check_leaf_fronts(&layout).len(), 1);
        assert_eq!(check_exit_reciprocity(&layout).len(), 1);
        assert_eq!(check_leaf_reachability(&layout).len(), 1);
    }

    #[test]
    fn test_generated_layouts_validate() {
        let preset = FacilityPreset::default();
        let mut checked = 0;
        for seed in 0..64 {
            if let Ok(layout) = run_attempt(&preset, seed) {
                let issues = validate_layout(&layout, &preset);
                assert!(issues.is_empty(), "seed {seed}: {issues:?}");
                checked += 1;
            }
        }
        assert!(checked > 0);
    }
}
