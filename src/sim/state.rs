//! Game state and core simulation types
//!
//! Everything a running match needs lives here, including the RNG, so a
//! state can be cloned or serialized and replayed deterministically.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, ArenaConfig, generate};
use super::bomb::Bomb;
use super::damage::EntityRef;
use super::explosion::{BlastStage, ExplosionMarker};
use super::grid::{Direction, LayerMask};
use super::item::{Crumble, ItemKind, ItemPickup};
use super::pawn::{Enemy, Player};
use super::round::{RoundController, RoundOutcome};
use super::timer::Timer;
use crate::consts::*;
use crate::error::ArenaResult;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Round decided
    GameOver,
}

/// Everything the simulation reports to presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Arena generated; pawns are about to appear
    EntitiesSpawnRequested {
        spawn_points: [IVec2; SPAWN_ZONE_COUNT],
        players: u32,
        free_tiles: usize,
        enemy_tier: usize,
    },
    PlayerSpawned { player: u32, cell: IVec2 },
    EnemySpawned { enemy: u32, cell: IVec2 },
    BombDropped { bomb: u32, owner: u32, cell: IVec2 },
    BombKicked { bomb: u32, direction: Direction },
    BombChained { bomb: u32 },
    Exploded {
        bomb: u32,
        cell: IVec2,
        markers: Vec<ExplosionMarker>,
    },
    /// A soft block was destroyed and starts crumbling
    ClearDestructible { cell: IVec2 },
    BombRecovered { bomb: u32, owner: u32 },
    BombDestroyed { bomb: u32 },
    ItemDropped { item: u32, cell: IVec2, kind: ItemKind },
    ItemCollected { item: u32, player: u32, kind: ItemKind },
    /// A player lost a life (`lives == 0` means the hit was fatal)
    PlayerHurt { player: u32, lives: u32 },
    PlayerDied { player: u32 },
    EnemyDied { enemy: u32 },
    PauseToggled { paused: bool },
    GameOver {
        outcome: RoundOutcome,
        /// Ids of players still alive
        survivors: Vec<u32>,
        elapsed_ticks: u64,
    },
}

/// A burning cell left by an explosion. Each entity is burned at most once
/// per fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fire {
    pub cell: IVec2,
    pub direction: Option<Direction>,
    pub stage: BlastStage,
    pub timer: Timer<()>,
    /// Entities this fire has already hit
    pub burned: Vec<EntityRef>,
}

impl Fire {
    pub fn new(marker: ExplosionMarker, duration: f32) -> Self {
        Self {
            cell: marker.cell,
            direction: marker.direction,
            stage: marker.stage,
            timer: Timer::new(duration, ()),
            burned: Vec::new(),
        }
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    pub tuning: Tuning,
    pub arena: Arena,
    /// Indexed by player slot
    pub players: Vec<Player>,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub bombs: Vec<Bomb>,
    /// Sorted by id
    pub items: Vec<ItemPickup>,
    pub crumbles: Vec<Crumble>,
    pub fires: Vec<Fire>,
    pub round: RoundController,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Generate the arena and spawn every pawn
    pub fn new(
        settings: Settings,
        tuning: Tuning,
        seed: u64,
        out_events: &mut Vec<GameEvent>,
    ) -> ArenaResult<Self> {
        tuning.validate()?;
        settings.validate(tuning.enemy_tiers())?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut round = RoundController::new(tuning.enemy.count_per_tier.clone());
        let arena = generate(&ArenaConfig::from_settings(&settings, &tuning), &mut rng, &mut round)?;

        let mut state = Self {
            seed,
            rng,
            settings,
            tuning,
            arena,
            players: Vec::new(),
            enemies: Vec::new(),
            bombs: Vec::new(),
            items: Vec::new(),
            crumbles: Vec::new(),
            fires: Vec::new(),
            round,
            phase: GamePhase::Playing,
            time_ticks: 0,
            next_id: 1,
        };

        out_events.push(GameEvent::EntitiesSpawnRequested {
            spawn_points: state.arena.spawn_points(),
            players: state.settings.players,
            free_tiles: state.arena.free_tiles.len(),
            enemy_tier: state.settings.enemy_tier,
        });
        state.spawn_players(out_events);
        let spawned = state.spawn_enemies(out_events);
        if let Some(outcome) = state.round.begin(spawned, state.time_ticks) {
            state.end_round(outcome, out_events);
        }

        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_players(&mut self, out_events: &mut Vec<GameEvent>) {
        let points = self.arena.spawn_points();
        for (slot, &cell) in points.iter().enumerate().take(self.settings.players as usize) {
            let id = slot as u32;
            self.players
                .push(Player::new(id, cell, &self.tuning.player, &self.tuning.bomb));
            out_events.push(GameEvent::PlayerSpawned { player: id, cell });
        }
    }

    /// Place enemies on random free tiles. Returns how many spawned.
    fn spawn_enemies(&mut self, out_events: &mut Vec<GameEvent>) -> u32 {
        let wanted = self
            .round
            .enemies_to_spawn(self.settings.enemy_tier, &mut self.rng);
        let count = (wanted as usize).min(self.arena.free_tiles.len());

        for _ in 0..count {
            let index = self.rng.random_range(0..self.arena.free_tiles.len());
            let Some(cell) = self.arena.take_free_tile(index) else {
                break;
            };
            let id = self.next_entity_id();
            self.enemies
                .push(Enemy::new(id, cell, self.tuning.enemy.speed));
            out_events.push(GameEvent::EnemySpawned { enemy: id, cell });
            log::debug!("Enemy {id} spawned at {cell}");
        }
        if count < wanted as usize {
            log::warn!("Only {count} of {wanted} enemies fit in the arena");
        }
        count as u32
    }

    /// Latch the outcome and stop the simulation
    pub fn end_round(&mut self, outcome: RoundOutcome, out_events: &mut Vec<GameEvent>) {
        self.phase = GamePhase::GameOver;
        let survivors: Vec<u32> = self
            .players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect();
        let elapsed_ticks = self.time_ticks - self.round.start_tick();
        log::info!(
            "Game over: {outcome:?} after {elapsed_ticks} ticks, survivors {survivors:?}"
        );
        out_events.push(GameEvent::GameOver {
            outcome,
            survivors,
            elapsed_ticks,
        });
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Players dead or dying
    pub fn all_players_dead(&self) -> bool {
        self.players.iter().all(|p| !p.is_alive())
    }

    /// Index of the live bomb sitting on `cell`
    pub fn live_bomb_at(&self, cell: IVec2) -> Option<usize> {
        self.bombs
            .iter()
            .position(|b| b.is_live() && b.cell() == cell)
    }

    /// Tiles and live bombs block pawns
    pub fn is_blocked(&self, cell: IVec2) -> bool {
        self.arena.grid.cell_or_border(cell).is_solid() || self.live_bomb_at(cell).is_some()
    }

    /// Every layer present on `cell`
    pub fn layers_at(&self, cell: IVec2) -> LayerMask {
        let mut layers = self.arena.grid.layers_at(cell);
        if self.live_bomb_at(cell).is_some() {
            layers |= LayerMask::BOMB;
        }
        if self.players.iter().any(|p| p.is_alive() && p.cell() == cell) {
            layers |= LayerMask::PLAYER;
        }
        if self.enemies.iter().any(|e| e.is_alive() && e.cell() == cell) {
            layers |= LayerMask::ENEMY;
        }
        if self.items.iter().any(|i| i.cell == cell) {
            layers |= LayerMask::ITEM;
        }
        layers
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.players.sort_by_key(|p| p.id);
        self.enemies.sort_by_key(|e| e.id);
        self.bombs.sort_by_key(|b| b.id);
        self.items.sort_by_key(|i| i.id);
    }
}
