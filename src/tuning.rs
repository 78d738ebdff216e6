//! Game balance
//!
//! Everything a designer would tweak without touching code: bomb timings,
//! pawn stats, enemy counts per difficulty tier and the item table. Every
//! section is `#[serde(default)]` so a tuning file only needs the values it
//! overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult, SettingsError};
use crate::sim::grid::LayerMask;
use crate::sim::item::{ItemData, ItemKind};

/// Bomb and explosion tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BombTuning {
    /// Seconds between drop and detonation
    pub fuse_time: f32,
    /// Seconds between being hit by fire and detonating
    pub chain_explosion_delay: f32,
    /// Seconds a fire marker keeps burning
    pub explosion_duration: f32,
    /// Seconds a detonated bomb lingers before removal
    pub tail_delay: f32,
    /// Tiles a kicked bomb may travel
    pub max_slide_distance: f32,
    /// Tiles per second while sliding
    pub slide_speed: f32,
    /// Starting satchel capacity
    pub bombs_amount: u32,
    pub explosion_radius: u32,
    pub min_bombs: u32,
    pub max_bombs: u32,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Layers that stop an explosion ray
    pub blocking_mask: LayerMask,
    /// Blocking layers a blast-through bomb burns past
    pub pass_through_mask: LayerMask,
    /// Layers that forbid dropping a bomb on a cell
    pub placement_blocking_mask: LayerMask,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            fuse_time: 3.0,
            chain_explosion_delay: 0.1,
            explosion_duration: 1.0,
            tail_delay: 0.5,
            max_slide_distance: 5.0,
            slide_speed: 8.0,
            bombs_amount: 1,
            explosion_radius: 2,
            min_bombs: 1,
            max_bombs: 8,
            min_radius: 1,
            max_radius: 8,
            blocking_mask: LayerMask::HARD_BLOCK | LayerMask::SOFT_BLOCK,
            pass_through_mask: LayerMask::SOFT_BLOCK,
            placement_blocking_mask: LayerMask::HARD_BLOCK
                | LayerMask::SOFT_BLOCK
                | LayerMask::BOMB,
        }
    }
}

/// Player stats and power-up limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Tiles per second
    pub speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub lives: u32,
    /// Upper bound for max-lives power-ups
    pub max_lives_limit: u32,
    /// Seconds of invincibility after losing a life
    pub hit_invincibility_window: f32,
    /// Seconds between the fatal hit and the death notification
    pub death_delay: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 4.0,
            min_speed: 3.0,
            max_speed: 8.0,
            lives: 3,
            max_lives_limit: 5,
            hit_invincibility_window: 2.0,
            death_delay: 1.25,
        }
    }
}

/// Enemy stats and population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Tiles per second
    pub speed: f32,
    pub death_delay: f32,
    /// Inclusive `(min, max)` enemy count for each difficulty tier
    pub count_per_tier: Vec<(u32, u32)>,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            speed: 2.5,
            death_delay: 1.25,
            count_per_tier: vec![(2, 4), (4, 7), (7, 10)],
        }
    }
}

/// Arena generation and soft block tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTuning {
    /// Attempt budget of the enemy spawn repair pass
    pub enemy_spawn_max_checks: u32,
    /// Seconds a destroyed soft block crumbles before rolling its drop
    pub destroy_delay: f32,
}

impl Default for MapTuning {
    fn default() -> Self {
        Self {
            enemy_spawn_max_checks: 100,
            destroy_delay: 0.5,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub bomb: BombTuning,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub map: MapTuning,
    /// Items a crumbling soft block can drop, chosen uniformly
    pub items: Vec<ItemData>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bomb: BombTuning::default(),
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            map: MapTuning::default(),
            items: default_items(),
        }
    }
}

fn default_items() -> Vec<ItemData> {
    vec![
        ItemData {
            speed_increase: 1.0,
            ..ItemData::new(ItemKind::SpeedUp)
        },
        ItemData {
            bombs_increase: 1,
            ..ItemData::new(ItemKind::BombUp)
        },
        ItemData {
            radius_increase: 1,
            ..ItemData::new(ItemKind::FireUp)
        },
        ItemData {
            blast_through: Some(true),
            ..ItemData::new(ItemKind::BlastThrough)
        },
        ItemData {
            max_lives_increase: 1,
            ..ItemData::new(ItemKind::LifeUp)
        },
        ItemData {
            lives_increase: 1,
            ..ItemData::new(ItemKind::Heart)
        },
        ItemData {
            invincibility: Some(10.0),
            ..ItemData::new(ItemKind::Star)
        },
    ]
}

impl Tuning {
    /// Number of difficulty tiers the enemy table defines
    pub fn enemy_tiers(&self) -> usize {
        self.enemy.count_per_tier.len()
    }

    pub fn validate(&self) -> ArenaResult<()> {
        let b = &self.bomb;
        let p = &self.player;

        for (name, value) in [
            ("fuse time", b.fuse_time),
            ("chain explosion delay", b.chain_explosion_delay),
            ("explosion duration", b.explosion_duration),
            ("tail delay", b.tail_delay),
            ("max slide distance", b.max_slide_distance),
            ("invincibility window", p.hit_invincibility_window),
            ("player death delay", p.death_delay),
            ("enemy death delay", self.enemy.death_delay),
            ("destroy delay", self.map.destroy_delay),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(format!("{name} must be a non-negative duration")));
            }
        }
        if b.slide_speed <= 0.0 || self.enemy.speed < 0.0 {
            return Err(invalid("speeds must be positive".into()));
        }
        if b.min_bombs > b.max_bombs || !(b.min_bombs..=b.max_bombs).contains(&b.bombs_amount) {
            return Err(invalid(format!(
                "bombs amount {} outside {}..={}",
                b.bombs_amount, b.min_bombs, b.max_bombs
            )));
        }
        if b.min_radius > b.max_radius
            || !(b.min_radius..=b.max_radius).contains(&b.explosion_radius)
        {
            return Err(invalid(format!(
                "explosion radius {} outside {}..={}",
                b.explosion_radius, b.min_radius, b.max_radius
            )));
        }
        if !(p.min_speed > 0.0 && p.min_speed <= p.max_speed) {
            return Err(invalid("player speed range is empty".into()));
        }
        if p.lives == 0 || p.lives > p.max_lives_limit {
            return Err(invalid(format!(
                "player lives {} outside 1..={}",
                p.lives, p.max_lives_limit
            )));
        }
        if self.enemy.count_per_tier.is_empty() {
            return Err(invalid("enemy count table is empty".into()));
        }
        if let Some((tier, _)) = self
            .enemy
            .count_per_tier
            .iter()
            .enumerate()
            .find(|(_, (min, max))| min > max)
        {
            return Err(invalid(format!("enemy tier {tier} has min > max")));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let tuning = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }
}

fn invalid(msg: String) -> ArenaError {
    ArenaError::InvalidConfiguration(msg)
}
