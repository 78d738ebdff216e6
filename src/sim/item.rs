//! Items
//!
//! Destroyed soft blocks crumble for a short while, then roll once against the
//! arena's drop rate. A successful roll leaves an item on the cell; the first
//! living player standing on it collects it.

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pawn::Player;
use super::timer::Timer;
use crate::tuning::Tuning;

/// Item identity, used by presentation to pick an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    SpeedUp,
    BombUp,
    FireUp,
    BlastThrough,
    BlastBlock,
    LifeUp,
    Heart,
    Star,
}

/// An item and the effect it has on collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemData {
    pub kind: ItemKind,
    /// Tiles per second
    pub speed_increase: f32,
    pub bombs_increase: i32,
    pub radius_increase: i32,
    /// `Some(true)` enables blast-through, `Some(false)` disables it
    pub blast_through: Option<bool>,
    pub max_lives_increase: i32,
    pub lives_increase: i32,
    /// Seconds of invincibility granted
    pub invincibility: Option<f32>,
}

impl Default for ItemData {
    fn default() -> Self {
        Self::new(ItemKind::SpeedUp)
    }
}

impl ItemData {
    /// An item of `kind` with no effect
    pub const fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            speed_increase: 0.0,
            bombs_increase: 0,
            radius_increase: 0,
            blast_through: None,
            max_lives_increase: 0,
            lives_increase: 0,
            invincibility: None,
        }
    }

    /// Apply every effect to `player`. Returns true if the player died.
    pub fn apply(&self, player: &mut Player, tuning: &Tuning) -> bool {
        let pt = &tuning.player;
        let bt = &tuning.bomb;

        if self.speed_increase != 0.0 {
            player.add_speed(self.speed_increase, pt.min_speed, pt.max_speed);
        }

        if self.bombs_increase != 0 {
            player
                .satchel
                .add_capacity(self.bombs_increase, bt.min_bombs, bt.max_bombs);
        }
        if self.radius_increase != 0 {
            player
                .satchel
                .add_radius(self.radius_increase, bt.min_radius, bt.max_radius);
        }
        if let Some(enable) = self.blast_through {
            player.satchel.blast_through = enable;
        }

        let mut killed = false;
        if self.max_lives_increase > 0 {
            killed |= player.add_max_lives(
                self.max_lives_increase,
                pt.max_lives_limit,
                pt.death_delay,
            );
        }
        if self.lives_increase > 0 {
            killed |= player.add_lives(self.lives_increase, pt.death_delay);
        }
        if let Some(seconds) = self.invincibility
            && player.is_alive()
        {
            player.enable_invincibility(seconds);
        }
        killed
    }
}

/// A destroyed soft block waiting to roll its drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crumble {
    pub cell: IVec2,
    /// Chance in [0, 1]
    pub drop_chance: f32,
    pub timer: Timer<()>,
}

impl Crumble {
    pub fn new(cell: IVec2, drop_chance: f32, destroy_delay: f32) -> Self {
        Self {
            cell,
            drop_chance,
            timer: Timer::new(destroy_delay, ()),
        }
    }
}

/// Roll a crumble's drop
pub fn roll_drop(rng: &mut Pcg32, chance: f32, table: &[ItemData]) -> Option<ItemData> {
    if rng.random::<f32>() >= chance || table.is_empty() {
        return None;
    }
    Some(table[rng.random_range(0..table.len())])
}

/// An item lying on the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemPickup {
    pub id: u32,
    pub cell: IVec2,
    pub item: ItemData,
}
