//! The spawn interface: the only path by which rooms land on the grid.
//!
//! Planners decide *what* goes *where*; a [`Spawner`] checks the request
//! against the grid, writes occupancy and owns whatever visual instance the
//! host engine attaches to the room. The core only keeps the opaque
//! [`SpawnHandle`] it gets back.

use crate::grid::{CellGrid, CellPosition, Direction, Occupant};
use crate::rooms::{ArchetypeId, RoomArchetype, RoomShape};
use serde::{Deserialize, Serialize};

/// Opaque reference to a spawned room instance. Never dereferenced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnHandle(pub u64);

/// One placement request.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub id: ArchetypeId,
    pub archetype: &'a RoomArchetype,
    pub position: CellPosition,
    pub facing: Direction,
}

/// Host-side placement.
///
/// Implementations must refuse out-of-bounds or occupied primary cells and
/// footprints that leave the grid or overlap, and on success must write the
/// primary cell (facing, archetype, handle) and every footprint cell
/// (reserved) before returning `true`.
pub trait Spawner {
    fn try_spawn(&mut self, grid: &mut CellGrid, request: &SpawnRequest<'_>) -> bool;
}

/// A room as placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub handle: SpawnHandle,
    pub archetype: ArchetypeId,
    pub name: String,
    pub shape: RoomShape,
    pub position: CellPosition,
    pub facing: Direction,
    /// Reserved secondary cells, empty for single-cell rooms.
    pub footprint: Vec<CellPosition>,
    /// World-space centre of the primary cell.
    pub anchor: [f32; 3],
    pub yaw_degrees: f32,
}

impl Placement {
    /// Primary cell followed by footprint cells.
    pub fn cells(&self) -> impl Iterator<Item = CellPosition> + '_ {
        std::iter::once(self.position).chain(self.footprint.iter().copied())
    }
}

/// Spawner that only records placements. Handles count up from zero.
#[derive(Debug, Default)]
pub struct GridSpawner {
    placements: Vec<Placement>,
    next_handle: u64,
}

impl GridSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placements in the order they were accepted.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }
}

impl Spawner for GridSpawner {
    fn try_spawn(&mut self, grid: &mut CellGrid, request: &SpawnRequest<'_>) -> bool {
        let SpawnRequest {
            id,
            archetype,
            position,
            facing,
        } = *request;

        match grid.get(position) {
            None => {
                log::warn!("Refusing '{}' at {}: outside the grid", archetype.name, position);
                return false;
            }
            Some(cell) if cell.is_occupied() => {
                log::warn!("Refusing '{}' at {}: cell is busy", archetype.name, position);
                return false;
            }
            Some(_) => {}
        }

        let footprint = match grid.footprint_cells(position, facing, &archetype.footprint) {
            Some(cells) => cells,
            None => {
                log::warn!(
                    "Refusing '{}' at {} facing {}: footprint leaves the grid",
                    archetype.name,
                    position,
                    facing
                );
                return false;
            }
        };
        if footprint
            .iter()
            .any(|&c| c == position || grid.is_occupied(c))
        {
            log::warn!(
                "Refusing '{}' at {} facing {}: footprint overlaps",
                archetype.name,
                position,
                facing
            );
            return false;
        }

        let handle = SpawnHandle(self.next_handle);
        self.next_handle += 1;

        grid.set(
            position,
            Some(Occupant {
                archetype: id,
                facing,
                reserved: false,
                handle,
            }),
        );
        for &cell in &footprint {
            grid.set(
                cell,
                Some(Occupant {
                    archetype: id,
                    facing,
                    reserved: true,
                    handle,
                }),
            );
        }

        log::debug!(
            "Spawned '{}' ({}) at {} facing {}",
            archetype.name,
            archetype.shape(),
            position,
            facing
        );
        self.placements.push(Placement {
            handle,
            archetype: id,
            name: archetype.name.clone(),
            shape: archetype.shape(),
            position,
            facing,
            footprint,
            anchor: grid.world_anchor(position),
            yaw_degrees: facing.yaw_degrees(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellOffset;
    use crate::rooms::{LeafRules, RoomRole};

    fn request<'a>(
        archetype: &'a RoomArchetype,
        position: CellPosition,
        facing: Direction,
    ) -> SpawnRequest<'a> {
        SpawnRequest {
            id: ArchetypeId(0),
            archetype,
            position,
            facing,
        }
    }

    #[test]
    fn test_spawn_marks_primary_cell() {
        let mut grid = CellGrid::new(5, 5);
        let mut spawner = GridSpawner::new();
        let hall = RoomArchetype::corridor("Hall", RoomRole::Straight, 100);
        let pos = CellPosition::new(2, 2);

        assert!(spawner.try_spawn(&mut grid, &request(&hall, pos, Direction::Right)));
        let occ = grid.occupant(pos).expect("occupied");
        assert_eq!(occ.facing, Direction::Right);
        assert!(!occ.reserved);
        assert_eq!(spawner.placements().len(), 1);
        assert_eq!(spawner.placements()[0].yaw_degrees, 90.0);
    }

    #[test]
    fn test_spawn_refuses_busy_and_out_of_bounds() {
        let mut grid = CellGrid::new(3, 3);
        let mut spawner = GridSpawner::new();
        let hall = RoomArchetype::corridor("Hall", RoomRole::Straight, 100);
        let pos = CellPosition::new(1, 1);

        assert!(spawner.try_spawn(&mut grid, &request(&hall, pos, Direction::Up)));
        assert!(!spawner.try_spawn(&mut grid, &request(&hall, pos, Direction::Up)));
        assert!(!spawner.try_spawn(
            &mut grid,
            &request(&hall, CellPosition::new(3, 0), Direction::Up)
        ));
        assert_eq!(spawner.placements().len(), 1);
    }

    #[test]
    fn test_spawn_reserves_footprint() {
        let mut grid = CellGrid::new(5, 5);
        let mut spawner = GridSpawner::new();
        let hangar = RoomArchetype::leaf("Hangar", 1, LeafRules::default())
            .with_footprint(vec![CellOffset::new(0, 1)]);
        let pos = CellPosition::new(2, 2);

        assert!(spawner.try_spawn(&mut grid, &request(&hangar, pos, Direction::Down)));
        let reserved = grid.occupant(CellPosition::new(2, 3)).expect("reserved");
        assert!(reserved.reserved);
        assert_eq!(reserved.handle, grid.occupant(pos).unwrap().handle);
        assert_eq!(
            spawner.placements()[0].cells().collect::<Vec<_>>(),
            vec![pos, CellPosition::new(2, 3)]
        );
    }

    #[test]
    fn test_spawn_rejects_blocked_footprint_atomically() {
        let mut grid = CellGrid::new(5, 5);
        let mut spawner = GridSpawner::new();
        let hall = RoomArchetype::corridor("Hall", RoomRole::Straight, 100);
        let hangar = RoomArchetype::leaf("Hangar", 1, LeafRules::default())
            .with_footprint(vec![CellOffset::new(0, 1), CellOffset::new(0, 2)]);

        assert!(spawner.try_spawn(
            &mut grid,
            &request(&hall, CellPosition::new(2, 4), Direction::Up)
        ));
        assert!(!spawner.try_spawn(
            &mut grid,
            &request(&hangar, CellPosition::new(2, 2), Direction::Down)
        ));
        assert!(!grid.is_occupied(CellPosition::new(2, 2)));
        assert!(!grid.is_occupied(CellPosition::new(2, 3)));
    }
}
