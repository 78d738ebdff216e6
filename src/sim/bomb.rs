//! Bomb lifecycle
//!
//! `Armed -> Chained? -> Detonating -> Destroyed`. The bomb owns a single
//! timer whose action says what happens on expiry; chaining replaces the fuse
//! instead of stacking a second countdown.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::damage::DamageOutcome;
use super::explosion::BlastParams;
use super::grid::Direction;
use super::pawn::{Satchel, advance};
use super::timer::Timer;
use crate::tuning::BombTuning;
use crate::{cell_center, round_to_cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombPhase {
    /// Fuse running
    Armed,
    /// Hit by fire, short delay running
    Chained,
    /// Exploded, tail delay running
    Detonating,
    Destroyed,
}

/// What a bomb's timer resumes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombAction {
    Detonate,
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Slide {
    direction: Direction,
    origin: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: u32,
    /// Player slot that dropped the bomb
    pub owner: u32,
    pub pos: Vec2,
    pub phase: BombPhase,
    pub blast: BlastParams,
    /// Immovable: set once chained or after a slide ends
    pub kinematic: bool,
    max_slide_distance: f32,
    slide_speed: f32,
    slide: Option<Slide>,
    timer: Timer<BombAction>,
}

impl Bomb {
    pub fn new(id: u32, owner: u32, cell: IVec2, satchel: &Satchel, tuning: &BombTuning) -> Self {
        Self {
            id,
            owner,
            pos: cell_center(cell),
            phase: BombPhase::Armed,
            blast: BlastParams {
                radius: satchel.radius,
                blocking_mask: tuning.blocking_mask,
                pass_through_mask: tuning.pass_through_mask,
                bypass_soft_blocks: satchel.blast_through,
            },
            kinematic: false,
            max_slide_distance: tuning.max_slide_distance,
            slide_speed: tuning.slide_speed,
            slide: None,
            timer: Timer::new(tuning.fuse_time, BombAction::Detonate),
        }
    }

    pub fn cell(&self) -> IVec2 {
        round_to_cell(self.pos)
    }

    /// Still on the board and waiting to explode
    pub fn is_live(&self) -> bool {
        matches!(self.phase, BombPhase::Armed | BombPhase::Chained)
    }

    pub fn is_sliding(&self) -> bool {
        self.slide.is_some()
    }

    /// Seconds until the current timer expires
    pub fn time_left(&self) -> f32 {
        self.timer.remaining()
    }

    /// Fire reached the bomb: chain it, at most once
    pub fn apply_damage(&mut self, chain_delay: f32) -> DamageOutcome {
        if self.phase != BombPhase::Armed {
            return DamageOutcome::Ignored;
        }
        self.phase = BombPhase::Chained;
        self.stop();
        self.timer = Timer::new(chain_delay, BombAction::Detonate);
        DamageOutcome::Chained
    }

    pub fn can_kick(&self) -> bool {
        self.phase == BombPhase::Armed && !self.kinematic && self.slide.is_none()
    }

    /// Start sliding. Returns false if the bomb can't be kicked.
    pub fn kick(&mut self, direction: Direction) -> bool {
        if !self.can_kick() {
            return false;
        }
        self.slide = Some(Slide {
            direction,
            origin: self.pos,
        });
        true
    }

    fn stop(&mut self) {
        self.slide = None;
        self.kinematic = true;
        self.pos = cell_center(self.cell());
    }

    /// Advance slide and timer; yields the timer's action on expiry
    pub fn tick(&mut self, dt: f32, is_blocked: impl Fn(IVec2) -> bool) -> Option<BombAction> {
        if let Some(slide) = self.slide {
            let (pos, resting) =
                advance(self.pos, slide.direction, self.slide_speed * dt, is_blocked);
            self.pos = pos;
            if resting || pos.distance(slide.origin) >= self.max_slide_distance {
                self.stop();
            }
        }
        self.timer.tick(dt)
    }

    /// Enter the detonation phase and hand back what propagation needs.
    /// `None` once the bomb has already gone off.
    pub fn detonate(&mut self) -> Option<(IVec2, BlastParams)> {
        if !self.is_live() {
            return None;
        }
        self.stop();
        self.phase = BombPhase::Detonating;
        Some((self.cell(), self.blast))
    }

    /// Start the tail delay once the blast and slot recovery are done
    pub fn start_tail(&mut self, tail_delay: f32) {
        self.timer = Timer::new(tail_delay, BombAction::Destroy);
    }

    pub fn destroy(&mut self) {
        self.phase = BombPhase::Destroyed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bomb() -> Bomb {
        let tuning = BombTuning::default();
        Bomb::new(1, 0, IVec2::new(3, 3), &Satchel::new(&tuning), &tuning)
    }

    #[test]
    fn test_fuse_runs_to_detonation() {
        let tuning = BombTuning::default();
        let mut b = bomb();
        assert_eq!(b.tick(tuning.fuse_time - 0.01, |_| false), None);
        assert_eq!(b.tick(0.02, |_| false), Some(BombAction::Detonate));
    }

    #[test]
    fn test_chain_replaces_fuse_once() {
        let mut b = bomb();
        assert_eq!(b.apply_damage(0.1), DamageOutcome::Chained);
        assert!(b.kinematic);
        assert!((b.time_left() - 0.1).abs() < 1e-6);
        assert_eq!(b.apply_damage(0.1), DamageOutcome::Ignored);
        assert_eq!(b.tick(0.05, |_| false), None);
        assert_eq!(b.tick(0.06, |_| false), Some(BombAction::Detonate));
    }

    #[test]
    fn test_detonating_bomb_ignores_damage() {
        let mut b = bomb();
        assert!(b.detonate().is_some());
        assert_eq!(b.apply_damage(0.1), DamageOutcome::Ignored);
        assert!(!b.is_live());
    }

    #[test]
    fn test_detonates_only_once() {
        let mut b = bomb();
        assert_eq!(b.detonate().map(|(cell, _)| cell), Some(IVec2::new(3, 3)));
        assert_eq!(b.detonate(), None);
        b.destroy();
        assert_eq!(b.detonate(), None);
    }

    #[test]
    fn test_kick_slides_until_blocked() {
        let mut b = bomb();
        assert!(b.kick(Direction::Right));
        let wall = IVec2::new(5, 3);
        for _ in 0..60 {
            b.tick(1.0 / 60.0, |c| c == wall);
        }
        assert_eq!(b.pos, Vec2::new(4.0, 3.0));
        assert!(b.kinematic);
        assert!(!b.kick(Direction::Left));
    }

    #[test]
    fn test_kick_stops_at_max_distance() {
        let tuning = BombTuning::default();
        let mut b = bomb();
        b.kick(Direction::Up);
        for _ in 0..120 {
            b.tick(1.0 / 60.0, |_| false);
        }
        assert!(!b.is_sliding());
        let travelled = b.pos.y - 3.0;
        assert!(travelled >= tuning.max_slide_distance - 0.5);
        assert!(travelled <= tuning.max_slide_distance + 0.5);
        assert_eq!(b.pos.y.fract(), 0.0);
    }
}
