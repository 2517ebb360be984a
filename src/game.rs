//! Match state machine for one two-player game.
//!
//! A `Match` owns both players' boards and walks through
//! `AwaitingPlayers -> Placement -> Battle -> Finished`. Every mutating
//! operation returns the events to deliver; the caller decides how they reach
//! the players. Actions that are out of turn, out of phase or from an unknown
//! identity return no events and leave the state untouched.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, error};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, CellState};
use crate::common::{BoardError, FleetError, MatchError};
use crate::fleet::build_board;
use crate::ship::ShipPlacement;

/// One of the two fixed player roles in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum PlayerSlot {
    P1,
    P2,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::P1, PlayerSlot::P2];

    /// The opposing slot.
    pub fn other(self) -> PlayerSlot {
        match self {
            PlayerSlot::P1 => PlayerSlot::P2,
            PlayerSlot::P2 => PlayerSlot::P1,
        }
    }

    fn index(self) -> usize {
        match self {
            PlayerSlot::P1 => 0,
            PlayerSlot::P2 => 1,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerSlot::P1 => write!(f, "p1"),
            PlayerSlot::P2 => write!(f, "p2"),
        }
    }
}

/// Opaque client-chosen token, stable across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientIdentity {
    fn from(s: &str) -> Self {
        Self(String::from(s))
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-level lifecycle state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "camelCase"))]
pub enum Phase {
    AwaitingPlayers,
    Placement,
    Battle,
    Finished,
}

/// A player's view of the match, used to resume after reconnecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchView {
    pub slot: PlayerSlot,
    pub phase: Phase,
    /// Active slot, once the battle has started.
    pub turn: Option<PlayerSlot>,
    pub own: Board,
    /// Opponent board with undamaged ship cells hidden.
    pub opponent: Board,
}

/// Events produced by the match for its players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    Joined {
        slot: PlayerSlot,
    },
    WaitForOpponent,
    BattleStart {
        active_slot: PlayerSlot,
    },
    Hit {
        index: usize,
        target_slot: PlayerSlot,
        winner: Option<PlayerSlot>,
    },
    Miss {
        index: usize,
        next_turn: PlayerSlot,
    },
    PlacementRejected {
        reason: FleetError,
    },
    Resync(MatchView),
    RematchReady,
    MatchAborted {
        reason: MatchError,
    },
}

/// Who an event is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only the identity that triggered the action.
    Sender,
    /// Both players bound to the match.
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: Recipient,
    pub event: MatchEvent,
}

impl Outbound {
    fn sender(event: MatchEvent) -> Self {
        Self {
            to: Recipient::Sender,
            event,
        }
    }

    fn both(event: MatchEvent) -> Self {
        Self {
            to: Recipient::Both,
            event,
        }
    }
}

#[derive(Debug, Clone)]
struct SlotState {
    identity: Option<ClientIdentity>,
    board: Board,
    placement_complete: bool,
    online: bool,
}

impl SlotState {
    fn vacant() -> Self {
        Self {
            identity: None,
            board: Board::new(),
            placement_complete: false,
            online: false,
        }
    }
}

/// Authoritative state of one match between two players.
pub struct Match {
    slots: [SlotState; 2],
    turn: PlayerSlot,
    phase: Phase,
    winner: Option<PlayerSlot>,
    aborted: bool,
    rng: SmallRng,
}

impl Match {
    /// Create an empty match whose first-turn coin flips come from `rng`.
    pub fn new(rng: SmallRng) -> Self {
        Self {
            slots: [SlotState::vacant(), SlotState::vacant()],
            turn: PlayerSlot::P1,
            phase: Phase::AwaitingPlayers,
            winner: None,
            aborted: false,
            rng,
        }
    }

    /// Create a match with reproducible coin flips.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> PlayerSlot {
        self.turn
    }

    pub fn winner(&self) -> Option<PlayerSlot> {
        self.winner
    }

    /// `true` once the match ended through an invariant violation.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn board(&self, slot: PlayerSlot) -> &Board {
        &self.slots[slot.index()].board
    }

    pub fn identity(&self, slot: PlayerSlot) -> Option<&ClientIdentity> {
        self.slots[slot.index()].identity.as_ref()
    }

    pub fn placement_complete(&self, slot: PlayerSlot) -> bool {
        self.slots[slot.index()].placement_complete
    }

    pub fn is_online(&self, slot: PlayerSlot) -> bool {
        self.slots[slot.index()].online
    }

    /// Slot bound to `identity`, if any.
    pub fn slot_of(&self, identity: &ClientIdentity) -> Option<PlayerSlot> {
        PlayerSlot::ALL
            .into_iter()
            .find(|s| self.slots[s.index()].identity.as_ref() == Some(identity))
    }

    /// `true` when a further identity could still join.
    pub fn has_vacancy(&self) -> bool {
        self.slots.iter().any(|s| s.identity.is_none())
    }

    /// `true` when no slot has a live transport.
    pub fn is_vacant(&self) -> bool {
        self.slots.iter().all(|s| !s.online)
    }

    /// Snapshot for `slot`: own board raw, opponent board sanitized.
    pub fn view_for(&self, slot: PlayerSlot) -> MatchView {
        let turn = match self.phase {
            Phase::Battle => Some(self.turn),
            _ => None,
        };
        MatchView {
            slot,
            phase: self.phase,
            turn,
            own: self.board(slot).clone(),
            opponent: self.board(slot.other()).sanitized_view(),
        }
    }

    /// Bind `identity` to a slot, or rebind it if it already holds one.
    pub fn join(&mut self, identity: &ClientIdentity) -> Result<Vec<Outbound>, MatchError> {
        if let Some(slot) = self.slot_of(identity) {
            self.slots[slot.index()].online = true;
            debug!("{} rejoined as {}", identity, slot);
            return Ok(vec![
                Outbound::sender(MatchEvent::Joined { slot }),
                Outbound::sender(MatchEvent::Resync(self.view_for(slot))),
            ]);
        }

        let slot = PlayerSlot::ALL
            .into_iter()
            .find(|s| self.slots[s.index()].identity.is_none())
            .ok_or(MatchError::MatchFull)?;
        let state = &mut self.slots[slot.index()];
        state.identity = Some(identity.clone());
        state.online = true;

        if self.phase == Phase::AwaitingPlayers && !self.has_vacancy() {
            self.phase = Phase::Placement;
        }
        Ok(vec![Outbound::sender(MatchEvent::Joined { slot })])
    }

    /// Validate and commit `identity`'s fleet.
    pub fn submit_placement(
        &mut self,
        identity: &ClientIdentity,
        placements: &[ShipPlacement],
    ) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(identity) else {
            debug!("placement from unknown identity {}", identity);
            return Vec::new();
        };
        if !matches!(self.phase, Phase::AwaitingPlayers | Phase::Placement) {
            debug!("placement from {} outside placement phase", slot);
            return Vec::new();
        }
        if self.slots[slot.index()].placement_complete {
            debug!("{} already placed its fleet", slot);
            return Vec::new();
        }

        let board = match build_board(placements) {
            Ok(board) => board,
            Err(reason) => {
                debug!("rejected placement from {}: {}", slot, reason);
                return vec![Outbound::sender(MatchEvent::PlacementRejected { reason })];
            }
        };
        let state = &mut self.slots[slot.index()];
        state.board = board;
        state.placement_complete = true;

        // Both fleets placed implies both slots are filled.
        if !self.slots[slot.other().index()].placement_complete {
            return vec![Outbound::sender(MatchEvent::WaitForOpponent)];
        }

        self.phase = Phase::Battle;
        self.turn = if self.rng.random() {
            PlayerSlot::P1
        } else {
            PlayerSlot::P2
        };
        vec![Outbound::both(MatchEvent::BattleStart {
            active_slot: self.turn,
        })]
    }

    /// Fire at `target_index` on the opponent's board.
    pub fn fire(&mut self, identity: &ClientIdentity, target_index: usize) -> Vec<Outbound> {
        if self.phase != Phase::Battle {
            debug!("fire from {} outside battle", identity);
            return Vec::new();
        }
        if self.slot_of(identity) != Some(self.turn) {
            debug!("fire from {} out of turn", identity);
            return Vec::new();
        }

        let attacker = self.turn;
        let target = attacker.other();
        match self.resolve_shot(target, target_index) {
            Ok(Some(true)) => {
                if !self.slots[target.index()].board.has_ship() {
                    self.phase = Phase::Finished;
                    self.winner = Some(attacker);
                }
                vec![Outbound::both(MatchEvent::Hit {
                    index: target_index,
                    target_slot: target,
                    winner: self.winner,
                })]
            }
            Ok(Some(false)) => {
                self.turn = target;
                vec![Outbound::both(MatchEvent::Miss {
                    index: target_index,
                    next_turn: self.turn,
                })]
            }
            Ok(None) => {
                debug!("fire at {} is outside the board", target_index);
                Vec::new()
            }
            Err(e) => self.abort(e.into()),
        }
    }

    /// Apply a shot to `target`'s board. `Some(true)` on a hit, `Some(false)`
    /// on a miss, `None` when the index is off the board.
    fn resolve_shot(&mut self, target: PlayerSlot, index: usize) -> Result<Option<bool>, BoardError> {
        let board = &mut self.slots[target.index()].board;
        board.check_invariant()?;
        let Some(cell) = board.cell(index) else {
            return Ok(None);
        };
        match cell {
            CellState::Ship => {
                board.set(index, CellState::DamagedShip)?;
                Ok(Some(true))
            }
            CellState::Empty => {
                board.set(index, CellState::Miss)?;
                Ok(Some(false))
            }
            // Re-firing a resolved cell still costs the turn.
            CellState::Miss | CellState::DamagedShip => Ok(Some(false)),
        }
    }

    fn abort(&mut self, reason: MatchError) -> Vec<Outbound> {
        error!("aborting match: {}", reason);
        self.phase = Phase::Finished;
        self.winner = None;
        self.aborted = true;
        vec![Outbound::both(MatchEvent::MatchAborted { reason })]
    }

    /// Clear the live-transport flag for `identity`; the slot binding stays.
    /// Returns `true` when no player of the match remains online.
    pub fn disconnect(&mut self, identity: &ClientIdentity) -> bool {
        if let Some(slot) = self.slot_of(identity) {
            self.slots[slot.index()].online = false;
        }
        self.is_vacant()
    }

    /// Reset a finished match for another round with the same players.
    pub fn rematch(&mut self, identity: &ClientIdentity) -> Vec<Outbound> {
        if self.phase != Phase::Finished || self.slot_of(identity).is_none() {
            debug!("rematch from {} ignored", identity);
            return Vec::new();
        }
        for state in self.slots.iter_mut() {
            state.board = Board::new();
            state.placement_complete = false;
        }
        self.phase = Phase::Placement;
        self.turn = PlayerSlot::P1;
        self.winner = None;
        self.aborted = false;
        vec![Outbound::both(MatchEvent::RematchReady)]
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("phase", &self.phase)
            .field("turn", &self.turn)
            .field("winner", &self.winner)
            .field("p1", &self.slots[0].identity)
            .field("p2", &self.slots[1].identity)
            .finish()
    }
}
