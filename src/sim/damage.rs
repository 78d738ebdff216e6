//! Damage resolution
//!
//! Every damageable entity is addressed through [`EntityRef`] and resolved by
//! one dispatcher, so fire and enemy contact never need to know what they hit.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GameState};

/// A damageable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// Player slot
    Player(u32),
    Enemy(u32),
    Bomb(u32),
}

/// What a hit did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Dead, invincible, already chained or missing
    Ignored,
    /// Lost a life and survived
    Hurt,
    Killed,
    /// A bomb's fuse was cut short
    Chained,
}

/// Apply one hit to `target`
pub fn apply_damage(
    state: &mut GameState,
    target: EntityRef,
    out_events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    match target {
        EntityRef::Player(id) => {
            let tuning = &state.tuning.player;
            let Some(player) = state.players.iter_mut().find(|p| p.id == id) else {
                return DamageOutcome::Ignored;
            };
            let outcome = player.take_hit(tuning);
            if outcome != DamageOutcome::Ignored {
                out_events.push(GameEvent::PlayerHurt {
                    player: id,
                    lives: player.lives,
                });
            }
            if outcome == DamageOutcome::Killed {
                log::debug!("Player {id} killed");
            }
            outcome
        }
        EntityRef::Enemy(id) => {
            let delay = state.tuning.enemy.death_delay;
            match state.enemies.iter_mut().find(|e| e.id == id) {
                Some(enemy) => {
                    let outcome = enemy.take_hit(delay);
                    if outcome == DamageOutcome::Killed {
                        log::debug!("Enemy {id} killed");
                    }
                    outcome
                }
                None => DamageOutcome::Ignored,
            }
        }
        EntityRef::Bomb(id) => {
            let delay = state.tuning.bomb.chain_explosion_delay;
            let Some(bomb) = state.bombs.iter_mut().find(|b| b.id == id) else {
                return DamageOutcome::Ignored;
            };
            let outcome = bomb.apply_damage(delay);
            if outcome == DamageOutcome::Chained {
                log::debug!("Bomb {id} chained");
                out_events.push(GameEvent::BombChained { bomb: id });
            }
            outcome
        }
    }
}

/// Damageable entities standing on `cell`, in a stable order
pub fn occupants(state: &GameState, cell: IVec2) -> Vec<EntityRef> {
    let players = state
        .players
        .iter()
        .filter(|p| p.is_alive() && p.cell() == cell)
        .map(|p| EntityRef::Player(p.id));
    let enemies = state
        .enemies
        .iter()
        .filter(|e| e.is_alive() && e.cell() == cell)
        .map(|e| EntityRef::Enemy(e.id));
    let bombs = state
        .bombs
        .iter()
        .filter(|b| b.is_live() && b.cell() == cell)
        .map(|b| EntityRef::Bomb(b.id));
    players.chain(enemies).chain(bombs).collect()
}

/// Hit everything on `cell`
pub fn damage_cell(state: &mut GameState, cell: IVec2, out_events: &mut Vec<GameEvent>) {
    for target in occupants(state, cell) {
        apply_damage(state, target, out_events);
    }
}
