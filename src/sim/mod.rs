//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod arena;
pub mod bomb;
pub mod damage;
pub mod explosion;
pub mod grid;
pub mod item;
pub mod pawn;
pub mod round;
pub mod state;
pub mod tick;
pub mod timer;

pub use arena::{Arena, ArenaConfig, EnemyCountSource, SpawnZone, generate};
pub use bomb::{Bomb, BombAction, BombPhase};
pub use damage::{DamageOutcome, EntityRef, apply_damage};
pub use explosion::{BlastField, BlastParams, BlastStage, ExplosionMarker, propagate};
pub use grid::{Cell, Direction, Grid, LayerMask};
pub use item::{ItemData, ItemKind, ItemPickup};
pub use pawn::{Enemy, Player, Satchel};
pub use round::{RoundController, RoundOutcome};
pub use state::{Fire, GameEvent, GamePhase, GameState};
pub use tick::{PlayerInput, TickInput, detonate, tick, try_drop_bomb};
pub use timer::Timer;
