//! Ship definitions and placement geometry.

use crate::board::position_from_index;
use crate::config::{BOARD_SIZE, FLEET};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Parse the wire spelling (`"horizontal"` / `"vertical"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "horizontal" => Some(Orientation::Horizontal),
            "vertical" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipType {
    name: &'static str,
    length: usize,
}

impl ShipType {
    /// Create a new ship type.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// A requested ship position as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipPlacement {
    pub origin_index: usize,
    pub orientation: Orientation,
    pub length: usize,
}

impl ShipPlacement {
    pub const fn new(origin_index: usize, orientation: Orientation, length: usize) -> Self {
        Self {
            origin_index,
            orientation,
            length,
        }
    }
}

/// A ship matched to its fleet entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedShip {
    pub origin_index: usize,
    pub orientation: Orientation,
    pub fleet_index: usize,
}

/// Closed cell range covered by a ship, as inclusive end coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl PlacedShip {
    /// Fleet entry this ship was matched to.
    pub fn ship_type(&self) -> ShipType {
        FLEET[self.fleet_index]
    }

    pub fn length(&self) -> usize {
        self.ship_type().length()
    }

    /// Origin as (x, y).
    pub fn origin(&self) -> (usize, usize) {
        position_from_index(self.origin_index, BOARD_SIZE as usize)
    }

    /// Whether the ship fits inside the board from its origin.
    pub fn in_bounds(&self) -> bool {
        let size = BOARD_SIZE as usize;
        if self.origin_index >= size * size {
            return false;
        }
        let (x, y) = self.origin();
        match self.orientation {
            Orientation::Horizontal => size - x >= self.length(),
            Orientation::Vertical => size - y >= self.length(),
        }
    }

    /// Cells covered by this ship. Only meaningful once `in_bounds` holds.
    pub fn segment(&self) -> Segment {
        let (x, y) = self.origin();
        let last = self.length().saturating_sub(1);
        match self.orientation {
            Orientation::Horizontal => Segment {
                x1: x,
                y1: y,
                x2: x + last,
                y2: y,
            },
            Orientation::Vertical => Segment {
                x1: x,
                y1: y,
                x2: x,
                y2: y + last,
            },
        }
    }

    /// Whether the two ships share any cell.
    pub fn overlaps(&self, other: &PlacedShip) -> bool {
        let a = self.segment();
        let b = other.segment();
        match (self.orientation, other.orientation) {
            (Orientation::Horizontal, Orientation::Horizontal) => {
                a.y1 == b.y1 && ranges_overlap(a.x1, a.x2, b.x1, b.x2)
            }
            (Orientation::Vertical, Orientation::Vertical) => {
                a.x1 == b.x1 && ranges_overlap(a.y1, a.y2, b.y1, b.y2)
            }
            (Orientation::Horizontal, Orientation::Vertical) => crosses(&a, &b),
            (Orientation::Vertical, Orientation::Horizontal) => crosses(&b, &a),
        }
    }
}

fn within(v: usize, lo: usize, hi: usize) -> bool {
    lo <= v && v <= hi
}

/// Two closed intervals overlap iff an endpoint of one lies inside the other.
fn ranges_overlap(a1: usize, a2: usize, b1: usize, b2: usize) -> bool {
    within(a1, b1, b2) || within(a2, b1, b2) || within(b1, a1, a2) || within(b2, a1, a2)
}

fn crosses(h: &Segment, v: &Segment) -> bool {
    within(v.x1, h.x1, h.x2) && within(h.y1, v.y1, v.y2)
}
