use crate::ship::ShipType;

pub const BOARD_SIZE: u8 = 10;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipType; NUM_SHIPS] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Total number of ship cells in the standard fleet.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Number of cells on a board.
pub const CELL_COUNT: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

#[cfg(feature = "std")]
pub use server_config::*;

#[cfg(feature = "std")]
mod server_config {
    use std::time::Duration;

    use crate::protocol::Codec;

    /// Default address the server listens on.
    pub const DEFAULT_BIND: &str = "0.0.0.0:4000";

    /// Largest frame accepted from a client (64 KiB).
    pub const DEFAULT_MAX_FRAME_SIZE: u32 = 64 * 1024;

    /// Runtime settings for the match server.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        pub bind: String,
        pub codec: Codec,
        /// Bound on a single frame read or write.
        pub io_timeout: Duration,
        /// Connections silent for longer than this are closed.
        pub idle_timeout: Duration,
        pub max_frame_size: u32,
        /// Fixes turn coin flips when set.
        pub seed: Option<u64>,
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                bind: DEFAULT_BIND.to_string(),
                codec: Codec::Json,
                io_timeout: Duration::from_secs(30),
                idle_timeout: Duration::from_secs(300),
                max_frame_size: DEFAULT_MAX_FRAME_SIZE,
                seed: None,
            }
        }
    }
}
