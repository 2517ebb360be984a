//! Automated players used by the local simulation.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::board::{index_from_position, position_from_index};
use crate::common::FleetError;
use crate::config::{BOARD_SIZE, CELL_COUNT};
use crate::fleet::random_fleet;
use crate::ship::ShipPlacement;

/// Interface implemented by different player types.
pub trait Player: Send {
    /// Choose positions for the whole fleet.
    fn place_ships(&mut self, rng: &mut SmallRng) -> Result<Vec<ShipPlacement>, FleetError>;

    /// Choose the next cell to fire at.
    fn select_target(&mut self, rng: &mut SmallRng) -> usize;

    /// Inform the player of the result of its last shot.
    fn handle_shot_result(&mut self, _index: usize, _hit: bool) {}
}

/// Hunt/target player: fires at random untried cells until it hits, then
/// works through the neighbours of every hit.
pub struct AiPlayer {
    tried: [bool; CELL_COUNT],
    targets: VecDeque<usize>,
}

impl AiPlayer {
    pub fn new() -> Self {
        Self {
            tried: [false; CELL_COUNT],
            targets: VecDeque::new(),
        }
    }

    fn queue_neighbours(&mut self, index: usize) {
        let size = BOARD_SIZE as usize;
        let (x, y) = position_from_index(index, size);
        let mut push = |nx: usize, ny: usize| {
            let n = index_from_position(nx, ny, size);
            if !self.tried[n] {
                self.targets.push_back(n);
            }
        };
        if x > 0 {
            push(x - 1, y);
        }
        if x + 1 < size {
            push(x + 1, y);
        }
        if y > 0 {
            push(x, y - 1);
        }
        if y + 1 < size {
            push(x, y + 1);
        }
    }
}

impl Default for AiPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for AiPlayer {
    fn place_ships(&mut self, rng: &mut SmallRng) -> Result<Vec<ShipPlacement>, FleetError> {
        random_fleet(rng)
    }

    fn select_target(&mut self, rng: &mut SmallRng) -> usize {
        while let Some(index) = self.targets.pop_front() {
            if !self.tried[index] {
                self.tried[index] = true;
                return index;
            }
        }
        let open: Vec<usize> = (0..CELL_COUNT).filter(|i| !self.tried[*i]).collect();
        // Every cell tried: any index is as good as another.
        let index = if open.is_empty() {
            rng.random_range(0..CELL_COUNT)
        } else {
            open[rng.random_range(0..open.len())]
        };
        self.tried[index] = true;
        index
    }

    fn handle_shot_result(&mut self, index: usize, hit: bool) {
        if hit {
            self.queue_neighbours(index);
        }
    }
}
