//! Arena generation
//!
//! Builds the tile grid in a single row-major pass:
//! - border ring and the hard block lattice first
//! - critical points around spawn zones get a soft block when protection is on
//! - every other non-spawn cell rolls against the soft block probability
//! - free non-spawn cells become enemy spawn candidates
//!
//! A fully packed grid leaves no room for enemies, so a repair pass then
//! opens a bounded number of random soft blocks.

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid};
use crate::consts::*;
use crate::error::{ArenaError, ArenaResult};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Supplies the number of enemies a difficulty tier should get
pub trait EnemyCountSource {
    fn enemy_count(&mut self, tier: usize, rng: &mut Pcg32) -> u32;
}

/// Everything the generator needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Playable width (border excluded)
    pub width: u32,
    /// Playable height (border excluded)
    pub height: u32,
    pub soft_block_probability: u32,
    pub spawn_width: u32,
    pub spawn_protection: bool,
    pub items_drop_rate: u32,
    pub enemy_tier: usize,
    pub players: u32,
    pub enemy_spawn_max_checks: u32,
}

impl ArenaConfig {
    pub fn from_settings(settings: &Settings, tuning: &Tuning) -> Self {
        Self {
            width: settings.map_width,
            height: settings.map_height,
            soft_block_probability: settings.soft_block_probability,
            spawn_width: settings.spawn_width,
            spawn_protection: settings.spawn_protection,
            items_drop_rate: settings.items_drop_rate,
            enemy_tier: settings.enemy_tier,
            players: settings.players,
            enemy_spawn_max_checks: tuning.map.enemy_spawn_max_checks,
        }
    }

    pub fn validate(&self) -> ArenaResult<()> {
        let sizes = MIN_MAP_SIZE..=MAX_MAP_SIZE;
        if !sizes.contains(&self.width) || !sizes.contains(&self.height) {
            return Err(ArenaError::InvalidConfiguration(format!(
                "map size {}x{} outside {MIN_MAP_SIZE}..={MAX_MAP_SIZE}",
                self.width, self.height
            )));
        }
        if self.soft_block_probability > 100 || self.items_drop_rate > 100 {
            return Err(ArenaError::InvalidConfiguration(
                "probabilities must be within 0..=100".into(),
            ));
        }
        if self.spawn_width < MIN_SPAWN_WIDTH {
            return Err(ArenaError::InvalidConfiguration(format!(
                "spawn width {} below {MIN_SPAWN_WIDTH}",
                self.spawn_width
            )));
        }
        Ok(())
    }
}

/// One of the four corner spawn zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnZone {
    pub index: usize,
    /// Cell a player appears on
    pub spawn_point: IVec2,
}

/// A generated arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub grid: Grid,
    pub spawn_zones: [SpawnZone; SPAWN_ZONE_COUNT],
    /// Enemy spawn candidates
    pub free_tiles: Vec<IVec2>,
    items_drop_rate: u32,
}

/// Generate an arena. `source` is asked for an enemy count only when the
/// repair pass runs.
pub fn generate(
    config: &ArenaConfig,
    rng: &mut Pcg32,
    source: &mut impl EnemyCountSource,
) -> ArenaResult<Arena> {
    config.validate()?;

    let mut grid = Grid::new(
        config.width + BORDER_PADDING,
        config.height + BORDER_PADDING,
        config.spawn_width,
        config.spawn_protection,
    );
    let (width, height) = (grid.width(), grid.height());
    let mut free_tiles = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let state = if grid.border_at(x, y) {
                Cell::Border
            } else if grid.lattice_at(x, y) {
                Cell::HardBlock
            } else if grid.critical_at(x, y)
                || (rng.random_range(1..=100) <= config.soft_block_probability
                    && !grid.spawn_at(x, y))
            {
                Cell::SoftBlock
            } else {
                if !grid.spawn_at(x, y) {
                    free_tiles.push(IVec2::new(x, y));
                }
                Cell::Free
            };
            grid.set_cell(IVec2::new(x, y), state)?;
        }
    }

    let mut arena = Arena {
        spawn_zones: spawn_zones(width, height),
        grid,
        free_tiles,
        items_drop_rate: config.items_drop_rate,
    };

    if arena.free_tiles.is_empty() {
        let target = source.enemy_count(config.enemy_tier, rng);
        arena.repair_enemy_spawns(target, config.enemy_spawn_max_checks, rng);
    }

    log::info!(
        "Generated {}x{} arena: {} soft blocks, {} free tiles",
        config.width,
        config.height,
        arena.grid.count(Cell::SoftBlock),
        arena.free_tiles.len()
    );
    Ok(arena)
}

fn spawn_zones(width: i32, height: i32) -> [SpawnZone; SPAWN_ZONE_COUNT] {
    let points = [
        IVec2::new(1, height - 2),
        IVec2::new(width - 2, 1),
        IVec2::new(1, 1),
        IVec2::new(width - 2, height - 2),
    ];
    std::array::from_fn(|index| SpawnZone {
        index,
        spawn_point: points[index],
    })
}

impl Arena {
    /// Spawn points in player order
    pub fn spawn_points(&self) -> [IVec2; SPAWN_ZONE_COUNT] {
        self.spawn_zones.map(|zone| zone.spawn_point)
    }

    /// Chance in [0, 1] that a cleared soft block drops an item
    pub fn drop_chance(&self) -> f32 {
        self.items_drop_rate as f32 / 100.0
    }

    /// Open random soft blocks until `target` enemy cells exist or the attempt
    /// budget runs out. Returns how many cells were opened.
    fn repair_enemy_spawns(&mut self, target: u32, max_checks: u32, rng: &mut Pcg32) -> u32 {
        let (width, height) = (self.grid.width(), self.grid.height());
        let mut opened = 0;

        for _ in 0..max_checks {
            if opened >= target {
                break;
            }
            let x = rng.random_range(1..width - 1);
            let y = rng.random_range(1..height - 1);
            if self.grid.spawn_at(x, y) || self.grid.critical_at(x, y) {
                continue;
            }
            let cell = IVec2::new(x, y);
            if !self.free_tiles.contains(&cell) && self.grid.clear_soft_block(cell) == Ok(true) {
                self.free_tiles.push(cell);
                opened += 1;
            }
        }

        if opened < target {
            log::warn!(
                "Enemy spawn repair exhausted {max_checks} attempts: opened {opened} of {target} cells"
            );
        }
        opened
    }

    /// Clear the soft block at `cell`. Returns false when there is none.
    pub fn clear_destructible(&mut self, cell: IVec2) -> bool {
        self.grid.clear_soft_block(cell).unwrap_or(false)
    }

    /// Remove and return the free tile at `index`
    pub fn take_free_tile(&mut self, index: usize) -> Option<IVec2> {
        (index < self.free_tiles.len()).then(|| self.free_tiles.remove(index))
    }
}
