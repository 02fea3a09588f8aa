//! The cell grid a facility is laid out on.
//!
//! `CellGrid` owns a fixed `W×H` array of cells. Each cell is either empty or
//! owned by a placed room (primary cell with a facing, or a reserved
//! secondary cell of a multi-cell room). Lookups are bounds-checked and
//! return `None` outside the grid; occupancy changes only through
//! [`CellGrid::set`].
//!
//! Coordinates: `x` grows to the right, `y` grows upward. `Direction::Up` is
//! `+y`.

use crate::error::GenerationError;
use crate::rooms::ArchetypeId;
use crate::spawn::SpawnHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four cardinal directions, in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in cycle order. Neighbor enumeration uses this order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Position in the clockwise cycle (Up = 0).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Unit grid offset `(dx, dy)`.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        self.rotate(Direction::Down)
    }

    /// Modular addition over the cycle: `Up` is the identity offset,
    /// `Right` turns a quarter clockwise.
    pub fn rotate(self, offset: Direction) -> Self {
        Self::from_index(self.index() + offset.index())
    }

    /// Yaw of a room facing this way, in degrees around the vertical axis.
    pub fn yaw_degrees(self) -> f32 {
        match self {
            Direction::Up => 0.0,
            Direction::Right => 90.0,
            Direction::Down => 180.0,
            Direction::Left => 270.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

/// Integer grid coordinate. Equality, hashing and ordering use `(x, y)` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub x: i32,
    pub y: i32,
}

impl CellPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent coordinate in `dir`. Not bounds-checked; use
    /// [`CellGrid::neighbor`] for that.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Footprint offset of a multi-cell room, authored for a room facing `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellOffset {
    pub x: i32,
    pub y: i32,
}

impl CellOffset {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rotate into the frame of a room facing `facing`.
    pub fn rotated(self, facing: Direction) -> Self {
        match facing {
            Direction::Up => Self::new(-self.x, -self.y),
            Direction::Right => Self::new(-self.y, self.x),
            Direction::Down => self,
            Direction::Left => Self::new(self.y, -self.x),
        }
    }
}

/// Manhattan distance between two cells.
pub fn manhattan(a: CellPosition, b: CellPosition) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Who owns a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub archetype: ArchetypeId,
    /// Facing of the owning room (copied onto its reserved cells).
    pub facing: Direction,
    /// Secondary footprint cell rather than the room's primary cell.
    pub reserved: bool,
    /// Opaque handle issued by the spawn interface.
    pub handle: SpawnHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub position: CellPosition,
    pub occupant: Option<Occupant>,
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_reserved(&self) -> bool {
        self.occupant.is_some_and(|o| o.reserved)
    }
}

/// Fixed-size occupancy grid for one generation attempt.
#[derive(Debug, Clone)]
pub struct CellGrid {
    width: i32,
    height: i32,
    cell_size: f32,
    cell_spacing: f32,
    elevation: f32,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Grid of unit-size cells with no spacing.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_metrics(width, height, 1.0, 0.0)
    }

    /// Grid whose world anchors use `cell_size` and `cell_spacing`.
    pub fn with_metrics(width: u32, height: u32, cell_size: f32, cell_spacing: f32) -> Self {
        // Coordinates are i32; wider axes are clamped.
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let mut cells = Vec::with_capacity((width as usize).saturating_mul(height as usize));
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell {
                    position: CellPosition::new(x, y),
                    occupant: None,
                });
            }
        }
        Self {
            width,
            height,
            cell_size,
            cell_spacing,
            elevation: 0.0,
            cells,
        }
    }

    /// Set the world-space height the anchors sit at.
    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: CellPosition) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: CellPosition) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn get(&self, pos: CellPosition) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn occupant(&self, pos: CellPosition) -> Option<&Occupant> {
        self.get(pos).and_then(|c| c.occupant.as_ref())
    }

    /// Out-of-bounds positions report as unoccupied.
    pub fn is_occupied(&self, pos: CellPosition) -> bool {
        self.get(pos).is_some_and(Cell::is_occupied)
    }

    /// Replace a cell's occupancy. No-op outside the grid.
    pub fn set(&mut self, pos: CellPosition, occupant: Option<Occupant>) {
        if let Some(i) = self.index(pos) {
            self.cells[i].occupant = occupant;
        }
    }

    /// Adjacent in-bounds cell in `dir`.
    pub fn neighbor(&self, pos: CellPosition, dir: Direction) -> Option<CellPosition> {
        let next = pos.step(dir);
        self.contains(next).then_some(next)
    }

    /// In-bounds neighbors with the direction leading to each, in cycle order.
    pub fn neighbors(
        &self,
        pos: CellPosition,
    ) -> impl Iterator<Item = (Direction, CellPosition)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(pos, dir).map(|next| (dir, next)))
    }

    /// Every cell matching `predicate`, column by column (x outer, y inner).
    pub fn positions<F>(&self, mut predicate: F) -> Vec<CellPosition>
    where
        F: FnMut(&Cell) -> bool,
    {
        let mut out = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let cell = &self.cells[(y * self.width + x) as usize];
                if predicate(cell) {
                    out.push(cell.position);
                }
            }
        }
        out
    }

    /// Edge distances as (left, right, bottom, top).
    fn edge_distances(&self, pos: CellPosition) -> (i32, i32, i32, i32) {
        (
            pos.x,
            self.width - 1 - pos.x,
            pos.y,
            self.height - 1 - pos.y,
        )
    }

    /// Manhattan distance to the closest border cell.
    pub fn edge_distance(&self, pos: CellPosition) -> Option<u32> {
        let (l, r, b, t) = self.edge_distances(pos);
        self.contains(pos).then(|| l.min(r).min(b).min(t) as u32)
    }

    /// Closest border cell. Ties go left, right, bottom, top.
    pub fn nearest_edge(&self, pos: CellPosition) -> Option<CellPosition> {
        if !self.contains(pos) {
            return None;
        }
        let (l, r, b, t) = self.edge_distances(pos);
        let min = l.min(r).min(b).min(t);
        let edge = if min == l {
            CellPosition::new(0, pos.y)
        } else if min == r {
            CellPosition::new(self.width - 1, pos.y)
        } else if min == b {
            CellPosition::new(pos.x, 0)
        } else {
            CellPosition::new(pos.x, self.height - 1)
        };
        Some(edge)
    }

    /// Direction pointing away from the nearest border, toward the interior.
    pub fn nearest_edge_inward(&self, pos: CellPosition) -> Option<Direction> {
        if !self.contains(pos) {
            return None;
        }
        let (l, r, b, t) = self.edge_distances(pos);
        let min = l.min(r).min(b).min(t);
        let dir = if min == l {
            Direction::Right
        } else if min == r {
            Direction::Left
        } else if min == b {
            Direction::Up
        } else {
            Direction::Down
        };
        Some(dir)
    }

    /// Cardinal direction from `from` toward `to`. The two must differ on
    /// exactly one axis.
    pub fn direction_between(
        from: CellPosition,
        to: CellPosition,
    ) -> Result<Direction, GenerationError> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        match (dx.signum(), dy.signum()) {
            (1, 0) => Ok(Direction::Right),
            (-1, 0) => Ok(Direction::Left),
            (0, 1) => Ok(Direction::Up),
            (0, -1) => Ok(Direction::Down),
            _ => Err(GenerationError::Geometry { from, to }),
        }
    }

    /// Uniform pick among directions whose neighbor is in bounds.
    pub fn random_direction(&self, pos: CellPosition, rng: &mut impl Rng) -> Option<Direction> {
        let valid: Vec<Direction> = self.neighbors(pos).map(|(dir, _)| dir).collect();
        if valid.is_empty() {
            log::warn!("No in-bounds direction from {}", pos);
            return None;
        }
        Some(valid[rng.gen_range(0..valid.len())])
    }

    /// Secondary cells of a room at `pos` facing `facing`. `None` if any of
    /// them falls outside the grid. Occupancy is not checked.
    pub fn footprint_cells(
        &self,
        pos: CellPosition,
        facing: Direction,
        offsets: &[CellOffset],
    ) -> Option<Vec<CellPosition>> {
        offsets
            .iter()
            .map(|offset| {
                let r = offset.rotated(facing);
                let cell = CellPosition::new(pos.x + r.x, pos.y + r.y);
                self.contains(cell).then_some(cell)
            })
            .collect()
    }

    /// World-space centre of a cell: `(x, elevation, z)`.
    pub fn world_anchor(&self, pos: CellPosition) -> [f32; 3] {
        let step = self.cell_size + self.cell_spacing;
        let half = self.cell_size * 0.5;
        [
            pos.x as f32 * step + half,
            self.elevation,
            pos.y as f32 * step + half,
        ]
    }
}
