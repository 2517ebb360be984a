//! Fleet validation: bounds, overlap and fleet-shape checks before a
//! placement is committed to a board.

use alloc::vec::Vec;
use rand::Rng;

use crate::board::Board;
use crate::common::FleetError;
use crate::config::{BOARD_SIZE, FLEET, NUM_SHIPS};
use crate::ship::{Orientation, PlacedShip, ShipPlacement};

/// Match each requested ship to a distinct fleet entry of the same length.
fn assign_fleet_entries(placements: &[ShipPlacement]) -> Result<Vec<PlacedShip>, FleetError> {
    if placements.len() != NUM_SHIPS {
        return Err(FleetError::WrongShipCount {
            expected: NUM_SHIPS,
            found: placements.len(),
        });
    }
    let mut used = [false; NUM_SHIPS];
    let mut ships = Vec::with_capacity(NUM_SHIPS);
    for (i, p) in placements.iter().enumerate() {
        let fleet_index = FLEET
            .iter()
            .enumerate()
            .position(|(j, def)| !used[j] && def.length() == p.length)
            .ok_or(FleetError::UnexpectedLength {
                ship: i,
                length: p.length,
            })?;
        used[fleet_index] = true;
        ships.push(PlacedShip {
            origin_index: p.origin_index,
            orientation: p.orientation,
            fleet_index,
        });
    }
    Ok(ships)
}

/// Check a full fleet placement and return the ships matched to their fleet
/// entries. Errors name the first violated constraint.
pub fn validate_fleet(placements: &[ShipPlacement]) -> Result<Vec<PlacedShip>, FleetError> {
    let ships = assign_fleet_entries(placements)?;

    if let Some(ship) = ships.iter().position(|s| !s.in_bounds()) {
        return Err(FleetError::OutOfBounds { ship });
    }

    for (i, a) in ships.iter().enumerate() {
        for (j, b) in ships.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Err(FleetError::Overlap {
                    first: i,
                    second: j,
                });
            }
        }
    }
    Ok(ships)
}

/// Validate a placement and stamp it onto a fresh board.
pub fn build_board(placements: &[ShipPlacement]) -> Result<Board, FleetError> {
    let ships = validate_fleet(placements)?;
    let mut board = Board::new();
    for ship in &ships {
        board.stamp_ship(ship.origin_index, ship.length(), ship.orientation);
    }
    Ok(board)
}

/// Produce a random legal placement for the standard fleet.
pub fn random_fleet<R: Rng>(rng: &mut R) -> Result<Vec<ShipPlacement>, FleetError> {
    let size = BOARD_SIZE as usize;
    let mut placed: Vec<PlacedShip> = Vec::with_capacity(NUM_SHIPS);
    for (fleet_index, def) in FLEET.iter().enumerate() {
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > 100 {
                return Err(FleetError::UnableToPlace);
            }
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_x, max_y) = match orientation {
                Orientation::Horizontal => (size - def.length(), size - 1),
                Orientation::Vertical => (size - 1, size - def.length()),
            };
            let x = rng.random_range(0..=max_x);
            let y = rng.random_range(0..=max_y);
            let candidate = PlacedShip {
                origin_index: y * size + x,
                orientation,
                fleet_index,
            };
            if placed.iter().all(|p| !p.overlaps(&candidate)) {
                placed.push(candidate);
                break;
            }
        }
    }
    Ok(placed
        .iter()
        .map(|p| ShipPlacement::new(p.origin_index, p.orientation, p.length()))
        .collect())
}
