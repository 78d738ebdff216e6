//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Each tick runs
//! the same ordered phases:
//! 1. pause handling
//! 2. players (bomb drops, movement, kicks)
//! 3. enemies wander
//! 4. bombs (slides, fuses, detonations, removals)
//! 5. fire damage and expiry, then enemy contact damage
//! 6. crumbling soft blocks and item pickups
//! 7. pawn timers and death notifications

use glam::IVec2;

use super::bomb::{Bomb, BombAction, BombPhase};
use super::damage::{EntityRef, apply_damage, damage_cell, occupants};
use super::explosion::{BlastField, propagate};
use super::grid::{Direction, LayerMask};
use super::item::{Crumble, ItemPickup, roll_drop};
use super::pawn::Life;
use super::state::{Fire, GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Commands from one player for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    /// Held movement direction
    pub direction: Option<Direction>,
    /// Drop a bomb (edge-triggered)
    pub drop_bomb: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Indexed by player slot
    pub players: [PlayerInput; MAX_PLAYERS as usize],
    /// Pause toggle
    pub pause: bool,
}

/// Explosion view of the game state
struct BlastScope<'a> {
    state: &'a mut GameState,
    out_events: &'a mut Vec<GameEvent>,
}

impl BlastField for BlastScope<'_> {
    fn layers_at(&self, cell: IVec2) -> LayerMask {
        self.state.layers_at(cell)
    }

    fn clear_destructible(&mut self, cell: IVec2) {
        let state = &mut *self.state;
        if state.arena.clear_destructible(cell) {
            self.out_events.push(GameEvent::ClearDestructible { cell });
            state.crumbles.push(Crumble::new(
                cell,
                state.arena.drop_chance(),
                state.tuning.map.destroy_delay,
            ));
        }
    }

    fn damage_at(&mut self, cell: IVec2) {
        damage_cell(self.state, cell, self.out_events);
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32, out_events: &mut Vec<GameEvent>) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                out_events.push(GameEvent::PauseToggled { paused: true });
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                out_events.push(GameEvent::PauseToggled { paused: false });
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    update_players(state, input, dt, out_events);
    update_enemies(state, dt);
    update_bombs(state, dt, out_events);
    update_fires(state, dt, out_events);
    enemy_contact(state, out_events);
    update_crumbles(state, dt, out_events);
    collect_items(state, out_events);
    update_pawn_timers(state, dt, out_events);

    state.normalize_order();
}

/// Drop a bomb under a player. Fails silently if the satchel is empty or
/// the cell is taken.
pub fn try_drop_bomb(
    state: &mut GameState,
    player_id: u32,
    out_events: &mut Vec<GameEvent>,
) -> Option<u32> {
    let player = state.player(player_id)?;
    if !player.is_alive() || player.satchel.remaining == 0 {
        return None;
    }
    let cell = player.cell();
    if state
        .layers_at(cell)
        .intersects(state.tuning.bomb.placement_blocking_mask)
    {
        return None;
    }

    let id = state.next_entity_id();
    let player = state.players.iter_mut().find(|p| p.id == player_id)?;
    if !player.satchel.take() {
        return None;
    }
    let bomb = Bomb::new(id, player_id, cell, &player.satchel, &state.tuning.bomb);
    state.bombs.push(bomb);
    out_events.push(GameEvent::BombDropped {
        bomb: id,
        owner: player_id,
        cell,
    });
    log::debug!("Player {player_id} dropped bomb {id} at {cell}");
    Some(id)
}

fn update_players(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    out_events: &mut Vec<GameEvent>,
) {
    for i in 0..state.players.len() {
        let id = state.players[i].id;
        let Some(command) = input.players.get(id as usize).copied() else {
            continue;
        };
        if !state.players[i].is_alive() {
            continue;
        }

        if command.drop_bomb {
            try_drop_bomb(state, id, out_events);
        }

        let Some(dir) = command.direction else {
            continue;
        };
        let resting = {
            let GameState {
                players,
                arena,
                bombs,
                ..
            } = &mut *state;
            let blocked = |cell: IVec2| {
                arena.grid.cell_or_border(cell).is_solid()
                    || bombs.iter().any(|b| b.is_live() && b.cell() == cell)
            };
            players[i].walk(dir, dt, blocked)
        };

        if resting {
            let ahead = state.players[i].cell() + dir.offset();
            if let Some(b) = state.live_bomb_at(ahead)
                && state.bombs[b].kick(dir)
            {
                let bomb = state.bombs[b].id;
                out_events.push(GameEvent::BombKicked { bomb, direction: dir });
                log::debug!("Player {id} kicked bomb {bomb} {dir:?}");
            }
        }
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let GameState {
        enemies,
        rng,
        arena,
        bombs,
        ..
    } = state;
    let blocked = |cell: IVec2| {
        arena.grid.cell_or_border(cell).is_solid()
            || bombs.iter().any(|b| b.is_live() && b.cell() == cell)
    };
    for enemy in enemies.iter_mut() {
        enemy.wander(dt, rng, &blocked);
    }
}

fn update_bombs(state: &mut GameState, dt: f32, out_events: &mut Vec<GameEvent>) {
    let mut i = 0;
    while i < state.bombs.len() {
        let id = state.bombs[i].id;
        let obstacles: Vec<IVec2> = state
            .bombs
            .iter()
            .filter(|b| b.id != id && b.is_live())
            .map(|b| b.cell())
            .chain(state.players.iter().filter(|p| p.is_alive()).map(|p| p.cell()))
            .chain(state.enemies.iter().filter(|e| e.is_alive()).map(|e| e.cell()))
            .collect();
        let grid = &state.arena.grid;
        let blocked =
            |cell: IVec2| grid.cell_or_border(cell).is_solid() || obstacles.contains(&cell);

        let action = state.bombs[i].tick(dt, blocked);

        match action {
            Some(BombAction::Detonate) => detonate(state, id, out_events),
            Some(BombAction::Destroy) => {
                state.bombs[i].destroy();
                out_events.push(GameEvent::BombDestroyed { bomb: id });
            }
            None => {}
        }
        i += 1;
    }
    state.bombs.retain(|b| b.phase != BombPhase::Destroyed);
}

/// Explode a bomb: propagate, return the owner's slot, then start the tail
pub fn detonate(state: &mut GameState, bomb_id: u32, out_events: &mut Vec<GameEvent>) {
    let Some(bomb) = state.bombs.iter_mut().find(|b| b.id == bomb_id) else {
        return;
    };
    let owner = bomb.owner;
    let Some((origin, params)) = bomb.detonate() else {
        return;
    };

    let markers = {
        let mut scope = BlastScope {
            state: &mut *state,
            out_events: &mut *out_events,
        };
        propagate(&mut scope, origin, &params)
    };
    log::debug!(
        "Bomb {bomb_id} exploded at {origin} covering {} cells",
        markers.len()
    );

    // The blast itself already hit whatever stands in it
    let duration = state.tuning.bomb.explosion_duration;
    let fires: Vec<Fire> = markers
        .iter()
        .map(|&marker| Fire {
            burned: occupants(state, marker.cell),
            ..Fire::new(marker, duration)
        })
        .collect();
    state.fires.extend(fires);
    out_events.push(GameEvent::Exploded {
        bomb: bomb_id,
        cell: origin,
        markers,
    });

    if let Some(player) = state.players.iter_mut().find(|p| p.id == owner) {
        player.satchel.recover();
    }
    out_events.push(GameEvent::BombRecovered {
        bomb: bomb_id,
        owner,
    });

    let tail = state.tuning.bomb.tail_delay;
    if let Some(bomb) = state.bombs.iter_mut().find(|b| b.id == bomb_id) {
        bomb.start_tail(tail);
    }
}

fn update_fires(state: &mut GameState, dt: f32, out_events: &mut Vec<GameEvent>) {
    for fire in &mut state.fires {
        fire.timer.tick(dt);
    }
    state.fires.retain(|f| !f.timer.is_finished());

    // Anything that walked or slid into a burning cell
    let mut hits = Vec::new();
    for (i, fire) in state.fires.iter().enumerate() {
        for target in occupants(state, fire.cell) {
            if !fire.burned.contains(&target) {
                hits.push((i, target));
            }
        }
    }
    for (i, target) in hits {
        state.fires[i].burned.push(target);
        apply_damage(state, target, out_events);
    }
}

fn enemy_contact(state: &mut GameState, out_events: &mut Vec<GameEvent>) {
    let mut hits = Vec::new();
    for enemy in state.enemies.iter().filter(|e| e.is_alive()) {
        for player in state.players.iter().filter(|p| p.is_alive()) {
            if enemy.pos.distance(player.pos) < CONTACT_DISTANCE {
                hits.push((enemy.id, player.id, player.cell() - enemy.cell()));
            }
        }
    }

    for (enemy_id, player_id, towards) in hits {
        apply_damage(state, EntityRef::Player(player_id), out_events);

        // Turn away when walking straight into the player
        let GameState {
            enemies,
            rng,
            arena,
            bombs,
            ..
        } = &mut *state;
        if let Some(enemy) = enemies.iter_mut().find(|e| e.id == enemy_id)
            && enemy.direction.is_some_and(|d| d.offset() == towards)
        {
            enemy.pick_direction(rng, |cell: IVec2| {
                arena.grid.cell_or_border(cell).is_solid()
                    || bombs.iter().any(|b| b.is_live() && b.cell() == cell)
            });
        }
    }
}

fn update_crumbles(state: &mut GameState, dt: f32, out_events: &mut Vec<GameEvent>) {
    let mut done = Vec::new();
    for crumble in &mut state.crumbles {
        if crumble.timer.tick(dt).is_some() {
            done.push((crumble.cell, crumble.drop_chance));
        }
    }
    state.crumbles.retain(|c| !c.timer.is_finished());

    for (cell, chance) in done {
        let Some(item) = roll_drop(&mut state.rng, chance, &state.tuning.items) else {
            continue;
        };
        let id = state.next_entity_id();
        state.items.push(ItemPickup { id, cell, item });
        out_events.push(GameEvent::ItemDropped {
            item: id,
            cell,
            kind: item.kind,
        });
        log::debug!("Item {id} ({:?}) dropped at {cell}", item.kind);
    }
}

fn collect_items(state: &mut GameState, out_events: &mut Vec<GameEvent>) {
    let mut i = 0;
    while i < state.items.len() {
        let pickup = state.items[i];
        let collector = state
            .players
            .iter_mut()
            .find(|p| p.is_alive() && p.cell() == pickup.cell);
        match collector {
            Some(player) => {
                pickup.item.apply(player, &state.tuning);
                out_events.push(GameEvent::ItemCollected {
                    item: pickup.id,
                    player: player.id,
                    kind: pickup.item.kind,
                });
                state.items.remove(i);
            }
            None => i += 1,
        }
    }
}

fn update_pawn_timers(state: &mut GameState, dt: f32, out_events: &mut Vec<GameEvent>) {
    // Players report first so a simultaneous wipe counts as a loss
    let mut player_deaths = Vec::new();
    for player in &mut state.players {
        if player.tick_timers(dt) {
            player_deaths.push(player.id);
        }
    }
    for player in player_deaths {
        out_events.push(GameEvent::PlayerDied { player });
        let all_dead = state.all_players_dead();
        if let Some(outcome) = state.round.on_player_died(all_dead) {
            state.end_round(outcome, out_events);
        }
    }

    let mut enemy_deaths = Vec::new();
    for enemy in &mut state.enemies {
        if enemy.tick_timers(dt) {
            enemy_deaths.push(enemy.id);
        }
    }
    state.enemies.retain(|e| e.life != Life::Gone);
    for enemy in enemy_deaths {
        out_events.push(GameEvent::EnemyDied { enemy });
        let all_dead = state.all_players_dead();
        if let Some(outcome) = state.round.on_enemy_died(all_dead) {
            state.end_round(outcome, out_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::explosion::{BlastStage, ExplosionMarker};
    use crate::sim::grid::Cell;
    use crate::sim::item::ItemKind;
    use crate::sim::pawn::Enemy;
    use crate::tuning::Tuning;

    fn state(seed: u64) -> GameState {
        let mut events = Vec::new();
        GameState::new(Settings::default(), Tuning::default(), seed, &mut events).unwrap()
    }

    fn run(state: &mut GameState, input: &TickInput, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            tick(state, input, SIM_DT, &mut events);
        }
        events
    }

    fn ticks_for(seconds: f32) -> usize {
        (seconds / SIM_DT).ceil() as usize + 1
    }

    fn count_hurts(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerHurt { .. }))
            .count()
    }

    fn drop_input() -> TickInput {
        let mut input = TickInput::default();
        input.players[0].drop_bomb = true;
        input
    }

    #[test]
    fn test_pause_toggle_freezes_time() {
        let mut s = state(1);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        let events = run(&mut s, &pause, 1);
        assert_eq!(s.phase, GamePhase::Paused);
        assert_eq!(events, vec![GameEvent::PauseToggled { paused: true }]);

        run(&mut s, &TickInput::default(), 10);
        assert_eq!(s.time_ticks, 0);

        run(&mut s, &pause, 1);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.time_ticks, 1);
    }

    #[test]
    fn test_drop_consumes_slot_and_blocks_second_drop() {
        let mut s = state(2);
        s.players[0].satchel.capacity = 2;
        s.players[0].satchel.remaining = 2;
        let mut events = Vec::new();
        assert!(try_drop_bomb(&mut s, 0, &mut events).is_some());
        assert_eq!(s.players[0].satchel.remaining, 1);
        // same cell is occupied by the first bomb
        assert!(try_drop_bomb(&mut s, 0, &mut events).is_none());
        assert_eq!(s.players[0].satchel.remaining, 1);
        assert_eq!(s.bombs.len(), 1);
    }

    #[test]
    fn test_empty_satchel_drops_nothing() {
        let mut s = state(3);
        s.players[0].satchel.remaining = 0;
        let mut events = Vec::new();
        assert!(try_drop_bomb(&mut s, 0, &mut events).is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn test_bomb_detonates_recovers_and_is_removed() {
        let mut s = state(4);
        s.players[0].enable_invincibility(100.0);
        let events = run(&mut s, &drop_input(), 1);
        let GameEvent::BombDropped { bomb, .. } = events[0] else {
            panic!("expected a drop, got {:?}", events[0]);
        };
        assert_eq!(s.players[0].satchel.remaining, 0);

        let fuse_ticks = (s.tuning.bomb.fuse_time / SIM_DT).ceil() as usize + 1;
        let events = run(&mut s, &TickInput::default(), fuse_ticks);
        let exploded = events
            .iter()
            .position(|e| matches!(e, GameEvent::Exploded { .. }))
            .unwrap();
        let recovered = events
            .iter()
            .position(|e| matches!(e, GameEvent::BombRecovered { .. }))
            .unwrap();
        assert!(exploded < recovered);
        assert_eq!(s.players[0].satchel.remaining, 1);
        assert_eq!(s.bombs[0].phase, BombPhase::Detonating);

        let tail_ticks = (s.tuning.bomb.tail_delay / SIM_DT).ceil() as usize + 1;
        let events = run(&mut s, &TickInput::default(), tail_ticks);
        assert!(events.contains(&GameEvent::BombDestroyed { bomb }));
        assert!(s.bombs.is_empty());
    }

    #[test]
    fn test_explosion_clears_soft_block_and_crumbles() {
        let mut s = state(5);
        let origin = s.players[0].cell();
        let target = origin + IVec2::X;
        s.arena.grid.set_cell(target, Cell::SoftBlock).unwrap();
        s.players[0].enable_invincibility(100.0);

        let mut events = Vec::new();
        let id = try_drop_bomb(&mut s, 0, &mut events).unwrap();
        detonate(&mut s, id, &mut events);

        assert!(events.contains(&GameEvent::ClearDestructible { cell: target }));
        assert_eq!(s.arena.grid.cell(target).unwrap(), Cell::Free);
        // other rays may open protection blocks too
        assert!(s.crumbles.iter().any(|c| c.cell == target));
    }

    #[test]
    fn test_second_detonate_is_ignored() {
        let mut s = state(7);
        s.players[0].enable_invincibility(100.0);
        let mut events = Vec::new();
        let id = try_drop_bomb(&mut s, 0, &mut events).unwrap();
        detonate(&mut s, id, &mut events);
        detonate(&mut s, id, &mut events);

        let exploded = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Exploded { .. }))
            .count();
        let recovered = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BombRecovered { .. }))
            .count();
        assert_eq!((exploded, recovered), (1, 1));
        assert_eq!(s.players[0].satchel.remaining, s.players[0].satchel.capacity);
        assert_eq!(s.bombs[0].phase, BombPhase::Detonating);
    }

    #[test]
    fn test_one_explosion_costs_one_life() {
        let mut s = state(8);
        s.enemies.clear();
        s.tuning.player.hit_invincibility_window = 0.05;
        let lives = s.players[0].lives;

        let mut events = Vec::new();
        let id = try_drop_bomb(&mut s, 0, &mut events).unwrap();
        detonate(&mut s, id, &mut events);
        let duration = s.tuning.bomb.explosion_duration;
        events.extend(run(&mut s, &TickInput::default(), ticks_for(duration)));

        assert_eq!(count_hurts(&events), 1);
        assert_eq!(s.players[0].lives, lives - 1);
        assert!(s.fires.is_empty());
    }

    #[test]
    fn test_walking_into_fire_burns_once() {
        let mut s = state(9);
        s.enemies.clear();
        s.tuning.player.hit_invincibility_window = 0.05;
        // next cell along the spawn arm; the protection block beyond stops the player
        let burning = s.players[0].cell() + IVec2::X;
        s.fires.push(Fire::new(
            ExplosionMarker {
                cell: burning,
                direction: Some(Direction::Right),
                stage: BlastStage::End,
            },
            1.0,
        ));

        let mut input = TickInput::default();
        input.players[0].direction = Some(Direction::Right);
        let events = run(&mut s, &input, 40);

        assert_eq!(s.players[0].cell(), burning);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::PlayerHurt { player: 0, .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_crumble_drops_item_after_delay() {
        let mut s = state(10);
        s.enemies.clear();
        // empty spawn corner, no player stands there
        let cell = s.arena.spawn_points()[1];
        let delay = s.tuning.map.destroy_delay;
        s.crumbles.push(Crumble::new(cell, 1.0, delay));

        let early = run(&mut s, &TickInput::default(), ticks_for(delay) - 3);
        assert!(early.is_empty());
        assert!(s.items.is_empty());

        let events = run(&mut s, &TickInput::default(), 3);
        let dropped: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemDropped { cell: c, .. } if *c == cell))
            .collect();
        assert_eq!(dropped.len(), 1);
        assert!(s.crumbles.is_empty());
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].cell, cell);
    }

    #[test]
    fn test_player_collects_item_and_gains_range() {
        let mut s = state(11);
        s.enemies.clear();
        let fire_up = s
            .tuning
            .items
            .iter()
            .find(|i| i.kind == ItemKind::FireUp)
            .copied()
            .unwrap();
        let radius = s.players[0].satchel.radius;
        let id = s.next_entity_id();
        let cell = s.players[0].cell();
        s.items.push(ItemPickup {
            id,
            cell,
            item: fire_up,
        });

        let events = run(&mut s, &TickInput::default(), 1);
        assert_eq!(
            events,
            vec![GameEvent::ItemCollected {
                item: id,
                player: 0,
                kind: ItemKind::FireUp
            }]
        );
        assert_eq!(s.players[0].satchel.radius, radius + 1);
        assert!(s.items.is_empty());
    }

    #[test]
    fn test_enemy_contact_hurts_player() {
        let mut s = state(12);
        s.enemies.clear();
        let lives = s.players[0].lives;
        let id = s.next_entity_id();
        s.enemies.push(Enemy::new(id, s.players[0].cell(), 0.0));

        let events = run(&mut s, &TickInput::default(), 5);
        assert_eq!(
            events,
            vec![GameEvent::PlayerHurt {
                player: 0,
                lives: lives - 1
            }]
        );
        assert!(s.players[0].is_invincible());
    }

    #[test]
    fn test_player_walks_and_stops_at_wall() {
        let mut s = state(6);
        // slot 0 spawns at (1, H-2); the border is above
        let start = s.players[0].pos;
        let mut input = TickInput::default();
        input.players[0].direction = Some(Direction::Up);
        run(&mut s, &input, 30);
        assert_eq!(s.players[0].pos, start);
    }
}
