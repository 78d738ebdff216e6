//! Blast Arena - a Bomberman-style arena simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (arena generation, bombs, explosions, pawns, rounds)
//! - `settings`: Match settings chosen before a round, persisted as JSON
//! - `tuning`: Data-driven game balance
//! - `error`: Error types shared by the core

pub mod error;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ArenaError, ArenaResult, SettingsError};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Border walls added around the playable area (one on each side)
    pub const BORDER_PADDING: u32 = 2;
    pub const MIN_MAP_SIZE: u32 = 5;
    pub const MAX_MAP_SIZE: u32 = 50;
    pub const MIN_SPAWN_WIDTH: u32 = 2;
    pub const MAX_SPAWN_WIDTH: u32 = 100;
    pub const MIN_PLAYERS: u32 = 1;
    pub const MAX_PLAYERS: u32 = 4;

    /// Spawn zones always sit in the four corners
    pub const SPAWN_ZONE_COUNT: usize = 4;

    /// Distance below which an enemy touches a player (tiles)
    pub const CONTACT_DISTANCE: f32 = 0.8;
}

/// Round a world position to the grid cell it sits on
#[inline]
pub fn round_to_cell(pos: Vec2) -> IVec2 {
    pos.round().as_ivec2()
}

/// World position of a cell's centre
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell.as_vec2()
}
