#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod board;
mod common;
mod config;
mod fleet;
mod game;
mod player;
mod ship;
#[cfg(feature = "std")]
pub mod gateway;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod sim;
#[cfg(feature = "std")]
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use fleet::*;
pub use game::*;
pub use player::*;
pub use ship::*;
#[cfg(feature = "std")]
pub use gateway::{serve_connection, Gateway};
#[cfg(feature = "std")]
pub use logging::{env_level, init_logging};
#[cfg(feature = "std")]
pub use protocol::{ClientFrame, Codec, Command, ProtocolError, ServerEvent, WireBoard};
#[cfg(feature = "std")]
pub use registry::{MatchId, MatchRegistry};
#[cfg(feature = "std")]
pub use session::{ClientHandle, ConnectionId, Seat, SessionDirectory};
#[cfg(feature = "std")]
pub use transport::tcp::TcpClient;
