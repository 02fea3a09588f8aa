//! Exit set → room shape and facing.
//!
//! Corridor rooms are authored with a fixed exit layout: a straight room
//! facing `Up` runs vertically, a corner facing `Up` opens down and left, and
//! a T-junction faces its closed side. Rotating the facing rotates the exits.

use crate::exits::ExitSet;
use crate::grid::Direction;
use crate::rooms::RoomShape;

/// Shape and facing for a marked cell, or `None` for exit counts outside
/// 2..=4.
pub fn classify(exits: ExitSet) -> Option<(RoomShape, Direction)> {
    match exits.count() {
        2 => Some(classify_two(exits)),
        3 => Some((RoomShape::TJunction, t_junction_facing(exits))),
        4 => Some((RoomShape::Cross, Direction::Up)),
        _ => None,
    }
}

fn classify_two(exits: ExitSet) -> (RoomShape, Direction) {
    let vertical = ExitSet::UP | ExitSet::DOWN;
    let horizontal = ExitSet::LEFT | ExitSet::RIGHT;
    if exits == vertical {
        return (RoomShape::Straight, Direction::Up);
    }
    if exits == horizontal {
        return (RoomShape::Straight, Direction::Right);
    }
    (RoomShape::Corner, corner_facing(exits))
}

fn corner_facing(exits: ExitSet) -> Direction {
    if exits == ExitSet::DOWN | ExitSet::LEFT {
        Direction::Up
    } else if exits == ExitSet::LEFT | ExitSet::UP {
        Direction::Right
    } else if exits == ExitSet::UP | ExitSet::RIGHT {
        Direction::Down
    } else {
        // RIGHT | DOWN
        Direction::Left
    }
}

/// First missing direction in the order left, right, down, up.
fn t_junction_facing(exits: ExitSet) -> Direction {
    [Direction::Left, Direction::Right, Direction::Down, Direction::Up]
        .into_iter()
        .find(|&d| !exits.has(d))
        .unwrap_or(Direction::Up)
}
