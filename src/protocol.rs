//! Wire messages exchanged between clients and the match server.
//!
//! Inbound frames are decoded into [`ClientFrame`], whose fields are all
//! optional so that a payload missing a field still decodes and can be
//! reported precisely. [`Command::try_from`] then checks required fields and
//! ranges before anything reaches a match.

use core::fmt;
use core::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::common::{FleetError, MatchError};
use crate::config::CELL_COUNT;
use crate::game::{ClientIdentity, MatchEvent, MatchView, Phase, PlayerSlot};
use crate::registry::MatchId;
use crate::ship::{Orientation, ShipPlacement};

/// Longest identity or match id accepted from a client.
pub const MAX_TOKEN_LEN: usize = 128;

/// Upper bound on the ship array length, well above any legal fleet.
pub const MAX_SHIPS_PER_FRAME: usize = 32;

/// Ship entry as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawShip {
    #[serde(rename = "originIndex", default)]
    pub origin_index: Option<i64>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub length: Option<i64>,
}

impl From<ShipPlacement> for RawShip {
    fn from(p: ShipPlacement) -> Self {
        let orientation = match p.orientation {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        };
        RawShip {
            origin_index: Some(p.origin_index as i64),
            orientation: Some(orientation.to_string()),
            length: Some(p.length as i64),
        }
    }
}

/// Frames sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientFrame {
    Join {
        #[serde(default)]
        identity: Option<String>,
        #[serde(rename = "matchId", default)]
        match_id: Option<String>,
    },
    PlaceShips {
        #[serde(default)]
        identity: Option<String>,
        #[serde(default)]
        ships: Option<Vec<RawShip>>,
    },
    Fire {
        #[serde(default)]
        identity: Option<String>,
        #[serde(default)]
        index: Option<i64>,
    },
    Rematch {
        #[serde(default)]
        identity: Option<String>,
    },
}

impl ClientFrame {
    pub fn join(identity: &str) -> Self {
        ClientFrame::Join {
            identity: Some(identity.to_string()),
            match_id: None,
        }
    }

    pub fn join_match(identity: &str, match_id: &str) -> Self {
        ClientFrame::Join {
            identity: Some(identity.to_string()),
            match_id: Some(match_id.to_string()),
        }
    }

    pub fn place_ships(identity: &str, ships: &[ShipPlacement]) -> Self {
        ClientFrame::PlaceShips {
            identity: Some(identity.to_string()),
            ships: Some(ships.iter().copied().map(RawShip::from).collect()),
        }
    }

    pub fn fire(identity: &str, index: usize) -> Self {
        ClientFrame::Fire {
            identity: Some(identity.to_string()),
            index: Some(index as i64),
        }
    }

    pub fn rematch(identity: &str) -> Self {
        ClientFrame::Rematch {
            identity: Some(identity.to_string()),
        }
    }
}

/// Validated client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join {
        identity: ClientIdentity,
        match_id: Option<MatchId>,
    },
    PlaceShips {
        identity: ClientIdentity,
        ships: Vec<ShipPlacement>,
    },
    Fire {
        identity: ClientIdentity,
        index: usize,
    },
    Rematch {
        identity: ClientIdentity,
    },
}

impl Command {
    pub fn identity(&self) -> &ClientIdentity {
        match self {
            Command::Join { identity, .. }
            | Command::PlaceShips { identity, .. }
            | Command::Fire { identity, .. }
            | Command::Rematch { identity } => identity,
        }
    }
}

/// Why an inbound frame was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame bytes did not decode.
    Undecodable(String),
    MissingField(&'static str),
    /// A string token is empty or too long.
    BadToken(&'static str),
    IndexOutOfRange(i64),
    TooManyShips(usize),
    BadShip { ship: usize, reason: &'static str },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Undecodable(e) => write!(f, "undecodable frame: {}", e),
            ProtocolError::MissingField(name) => write!(f, "missing field `{}`", name),
            ProtocolError::BadToken(name) => write!(f, "field `{}` is empty or too long", name),
            ProtocolError::IndexOutOfRange(i) => write!(f, "index {} is outside 0..{}", i, CELL_COUNT),
            ProtocolError::TooManyShips(n) => write!(f, "{} ships in one placement", n),
            ProtocolError::BadShip { ship, reason } => write!(f, "ship {}: {}", ship, reason),
        }
    }
}

impl std::error::Error for ProtocolError {}

fn token(value: Option<String>, field: &'static str) -> Result<String, ProtocolError> {
    let value = value.ok_or(ProtocolError::MissingField(field))?;
    if value.is_empty() || value.len() > MAX_TOKEN_LEN {
        return Err(ProtocolError::BadToken(field));
    }
    Ok(value)
}

fn identity(value: Option<String>) -> Result<ClientIdentity, ProtocolError> {
    token(value, "identity").map(ClientIdentity::new)
}

fn ship(i: usize, raw: RawShip) -> Result<ShipPlacement, ProtocolError> {
    let origin = raw.origin_index.ok_or(ProtocolError::MissingField("originIndex"))?;
    let origin = usize::try_from(origin).map_err(|_| ProtocolError::BadShip {
        ship: i,
        reason: "negative originIndex",
    })?;
    let orientation = raw
        .orientation
        .ok_or(ProtocolError::MissingField("orientation"))?;
    let orientation = Orientation::parse(&orientation).ok_or(ProtocolError::BadShip {
        ship: i,
        reason: "orientation must be horizontal or vertical",
    })?;
    let length = raw.length.ok_or(ProtocolError::MissingField("length"))?;
    let length = usize::try_from(length)
        .ok()
        .filter(|l| *l > 0)
        .ok_or(ProtocolError::BadShip {
            ship: i,
            reason: "length must be positive",
        })?;
    Ok(ShipPlacement::new(origin, orientation, length))
}

impl TryFrom<ClientFrame> for Command {
    type Error = ProtocolError;

    fn try_from(frame: ClientFrame) -> Result<Self, Self::Error> {
        match frame {
            ClientFrame::Join {
                identity: id,
                match_id,
            } => Ok(Command::Join {
                identity: identity(id)?,
                match_id: match match_id {
                    Some(m) => Some(MatchId::new(token(Some(m), "matchId")?)),
                    None => None,
                },
            }),
            ClientFrame::PlaceShips { identity: id, ships } => {
                let identity = identity(id)?;
                let ships = ships.ok_or(ProtocolError::MissingField("ships"))?;
                if ships.len() > MAX_SHIPS_PER_FRAME {
                    return Err(ProtocolError::TooManyShips(ships.len()));
                }
                let ships = ships
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| ship(i, raw))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Command::PlaceShips { identity, ships })
            }
            ClientFrame::Fire { identity: id, index } => {
                let identity = identity(id)?;
                let raw = index.ok_or(ProtocolError::MissingField("index"))?;
                let index = usize::try_from(raw)
                    .ok()
                    .filter(|i| *i < CELL_COUNT)
                    .ok_or(ProtocolError::IndexOutOfRange(raw))?;
                Ok(Command::Fire { identity, index })
            }
            ClientFrame::Rematch { identity: id } => Ok(Command::Rematch {
                identity: identity(id)?,
            }),
        }
    }
}

/// Board as exposed to clients: cell codes Empty=0, Ship=1, DamagedShip=2,
/// Miss=3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBoard {
    pub size: u8,
    pub cells: Vec<u8>,
}

impl From<&Board> for WireBoard {
    fn from(board: &Board) -> Self {
        WireBoard {
            size: board.size() as u8,
            cells: board.cells().iter().map(|c| *c as u8).collect(),
        }
    }
}

/// Events sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerEvent {
    Joined {
        slot: PlayerSlot,
    },
    JoinRejected {
        reason: String,
    },
    WaitForOpponent {},
    BattleStart {
        #[serde(rename = "activeSlot")]
        active_slot: PlayerSlot,
    },
    Hit {
        index: u8,
        #[serde(rename = "targetSlot")]
        target_slot: PlayerSlot,
        winner: Option<PlayerSlot>,
    },
    Miss {
        index: u8,
        #[serde(rename = "nextTurn")]
        next_turn: PlayerSlot,
    },
    PlacementRejected {
        reason: String,
    },
    BoardState {
        slot: PlayerSlot,
        phase: Phase,
        turn: Option<PlayerSlot>,
        own: WireBoard,
        opponent: WireBoard,
    },
    RematchReady {},
    MatchAborted {
        reason: String,
    },
}

impl ServerEvent {
    pub fn join_rejected(reason: &MatchError) -> Self {
        ServerEvent::JoinRejected {
            reason: reason.to_string(),
        }
    }

    pub fn placement_rejected(reason: &FleetError) -> Self {
        ServerEvent::PlacementRejected {
            reason: reason.to_string(),
        }
    }
}

impl From<&MatchView> for ServerEvent {
    fn from(view: &MatchView) -> Self {
        ServerEvent::BoardState {
            slot: view.slot,
            phase: view.phase,
            turn: view.turn,
            own: WireBoard::from(&view.own),
            opponent: WireBoard::from(&view.opponent),
        }
    }
}

impl From<MatchEvent> for ServerEvent {
    fn from(event: MatchEvent) -> Self {
        match event {
            MatchEvent::Joined { slot } => ServerEvent::Joined { slot },
            MatchEvent::WaitForOpponent => ServerEvent::WaitForOpponent {},
            MatchEvent::BattleStart { active_slot } => ServerEvent::BattleStart { active_slot },
            MatchEvent::Hit {
                index,
                target_slot,
                winner,
            } => ServerEvent::Hit {
                index: index as u8,
                target_slot,
                winner,
            },
            MatchEvent::Miss { index, next_turn } => ServerEvent::Miss {
                index: index as u8,
                next_turn,
            },
            MatchEvent::PlacementRejected { reason } => ServerEvent::placement_rejected(&reason),
            MatchEvent::Resync(view) => ServerEvent::from(&view),
            MatchEvent::RematchReady => ServerEvent::RematchReady {},
            MatchEvent::MatchAborted { reason } => ServerEvent::MatchAborted {
                reason: reason.to_string(),
            },
        }
    }
}

/// Payload encoding used inside length-prefixed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Json,
    Bincode,
}

impl Codec {
    pub fn encode<T: Serialize>(&self, value: &T) -> anyhow::Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(value)
                .map_err(|e| anyhow::anyhow!("Serialization error: {}", e)),
            Codec::Bincode => bincode::serialize(value)
                .map_err(|e| anyhow::anyhow!("Serialization error: {}", e)),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> anyhow::Result<T> {
        match self {
            Codec::Json => serde_json::from_slice(bytes)
                .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e)),
            Codec::Bincode => bincode::deserialize(bytes)
                .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e)),
        }
    }
}

impl FromStr for Codec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Codec::Json),
            "bincode" => Ok(Codec::Bincode),
            other => Err(anyhow::anyhow!("unknown codec `{}` (json|bincode)", other)),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Json => write!(f, "json"),
            Codec::Bincode => write!(f, "bincode"),
        }
    }
}
