//! Round controller
//!
//! Tracks how many enemies are alive and decides when the round ends. The
//! outcome is latched: once decided, later deaths change nothing.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::EnemyCountSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Every enemy died while a player was alive
    Won,
    /// Every player died while enemies remained
    Lost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundController {
    count_per_tier: Vec<(u32, u32)>,
    /// Count rolled during arena repair, consumed by the spawn step
    preload: Option<u32>,
    enemies_alive: u32,
    outcome: Option<RoundOutcome>,
    start_tick: u64,
}

impl RoundController {
    pub fn new(count_per_tier: Vec<(u32, u32)>) -> Self {
        Self {
            count_per_tier,
            preload: None,
            enemies_alive: 0,
            outcome: None,
            start_tick: 0,
        }
    }

    fn roll(&self, tier: usize, rng: &mut Pcg32) -> u32 {
        let last = self.count_per_tier.len().saturating_sub(1);
        match self.count_per_tier.get(tier.min(last)) {
            Some(&(min, max)) => rng.random_range(min..=max.max(min)),
            None => 0,
        }
    }

    /// Enemy count for the spawn step: the preloaded count if arena repair
    /// asked for one, otherwise a fresh roll
    pub fn enemies_to_spawn(&mut self, tier: usize, rng: &mut Pcg32) -> u32 {
        match self.preload.take() {
            Some(count) => count,
            None => self.roll(tier, rng),
        }
    }

    /// Start the round with the enemies that actually spawned. A round with
    /// no enemies is won on the spot.
    pub fn begin(&mut self, spawned: u32, tick: u64) -> Option<RoundOutcome> {
        self.enemies_alive = spawned;
        self.start_tick = tick;
        if spawned == 0 {
            return self.finish(RoundOutcome::Won);
        }
        None
    }

    /// A player's death was reported
    pub fn on_player_died(&mut self, all_players_dead: bool) -> Option<RoundOutcome> {
        if self.outcome.is_some() || self.enemies_alive == 0 || !all_players_dead {
            return None;
        }
        self.finish(RoundOutcome::Lost)
    }

    /// An enemy's death was reported
    pub fn on_enemy_died(&mut self, all_players_dead: bool) -> Option<RoundOutcome> {
        if self.outcome.is_some() || all_players_dead {
            return None;
        }
        self.enemies_alive = self.enemies_alive.saturating_sub(1);
        if self.enemies_alive == 0 {
            return self.finish(RoundOutcome::Won);
        }
        None
    }

    fn finish(&mut self, outcome: RoundOutcome) -> Option<RoundOutcome> {
        self.outcome = Some(outcome);
        Some(outcome)
    }

    pub fn enemies_alive(&self) -> u32 {
        self.enemies_alive
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn start_tick(&self) -> u64 {
        self.start_tick
    }
}

impl EnemyCountSource for RoundController {
    fn enemy_count(&mut self, tier: usize, rng: &mut Pcg32) -> u32 {
        let count = self.roll(tier, rng);
        self.preload = Some(count);
        count
    }
}
