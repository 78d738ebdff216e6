//! Players and enemies
//!
//! Pawns move along grid lanes: the axis perpendicular to travel is snapped to
//! the lane centre and travel stops at the centre of a cell whose neighbour
//! ahead is blocked.

use glam::{IVec2, Vec2};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::damage::DamageOutcome;
use super::grid::Direction;
use super::timer::Timer;
use crate::tuning::{BombTuning, PlayerTuning};
use crate::{cell_center, round_to_cell};

/// Lifecycle shared by players and enemies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Life {
    Alive,
    /// Dead, waiting to notify the round controller
    Dying(Timer<()>),
    /// Death has been reported; the pawn no longer takes part
    Gone,
}

impl Life {
    pub fn is_alive(&self) -> bool {
        matches!(self, Life::Alive)
    }

    /// Advance the death timer. Returns true on the tick the pawn is gone.
    fn tick(&mut self, dt: f32) -> bool {
        if let Life::Dying(timer) = self
            && timer.tick(dt).is_some()
        {
            *self = Life::Gone;
            return true;
        }
        false
    }
}

/// Move `distance` tiles along `dir`, stopping at the centre of the current
/// cell if the cell ahead is blocked. A pawn already past that centre holds
/// its position. Returns the new position and whether the pawn is resting
/// against an obstacle.
pub fn advance(
    pos: Vec2,
    dir: Direction,
    distance: f32,
    is_blocked: impl Fn(IVec2) -> bool,
) -> (Vec2, bool) {
    let step = dir.offset();
    let lane = if dir.is_horizontal() {
        Vec2::new(pos.x, pos.y.round())
    } else {
        Vec2::new(pos.x.round(), pos.y)
    };
    let cell = round_to_cell(lane);
    let next = lane + step.as_vec2() * distance;

    if is_blocked(cell + step) {
        let center = cell_center(cell);
        let ahead_of_center = |p: Vec2| (p - center).dot(step.as_vec2());
        if ahead_of_center(next) >= 0.0 {
            let stop = if ahead_of_center(lane) > 0.0 { lane } else { center };
            return (stop, true);
        }
    }
    (next, false)
}

/// Bombs a player carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Satchel {
    pub capacity: u32,
    pub remaining: u32,
    pub radius: u32,
    pub blast_through: bool,
}

impl Satchel {
    pub fn new(tuning: &BombTuning) -> Self {
        Self {
            capacity: tuning.bombs_amount,
            remaining: tuning.bombs_amount,
            radius: tuning.explosion_radius,
            blast_through: false,
        }
    }

    /// Take a bomb out if one is left
    pub fn take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Return a detonated bomb's slot
    pub fn recover(&mut self) {
        self.remaining = (self.remaining + 1).min(self.capacity);
    }

    pub fn add_capacity(&mut self, increase: i32, min: u32, max: u32) {
        self.capacity = add_clamped(self.capacity, increase, min, max);
        self.remaining = add_clamped(self.remaining, increase, 0, self.capacity);
    }

    pub fn add_radius(&mut self, increase: i32, min: u32, max: u32) {
        self.radius = add_clamped(self.radius, increase, min, max);
    }
}

fn add_clamped(value: u32, increase: i32, min: u32, max: u32) -> u32 {
    (i64::from(value) + i64::from(increase)).clamp(i64::from(min), i64::from(max.max(min))) as u32
}

/// A human-controlled pawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Player slot (0..4)
    pub id: u32,
    pub pos: Vec2,
    pub facing: Direction,
    /// Tiles per second
    pub speed: f32,
    pub lives: u32,
    pub max_lives: u32,
    pub satchel: Satchel,
    pub life: Life,
    invincibility: Option<Timer<()>>,
}

impl Player {
    pub fn new(id: u32, cell: IVec2, player: &PlayerTuning, bomb: &BombTuning) -> Self {
        Self {
            id,
            pos: cell_center(cell),
            facing: Direction::Down,
            speed: player.speed,
            lives: player.lives,
            max_lives: player.lives,
            satchel: Satchel::new(bomb),
            life: Life::Alive,
            invincibility: None,
        }
    }

    pub fn cell(&self) -> IVec2 {
        round_to_cell(self.pos)
    }

    pub fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility.is_some()
    }

    /// Lose a life unless dead or invincible
    pub fn take_hit(&mut self, tuning: &PlayerTuning) -> DamageOutcome {
        if !self.is_alive() || self.is_invincible() {
            return DamageOutcome::Ignored;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.die(tuning.death_delay);
            DamageOutcome::Killed
        } else {
            self.invincibility = Some(Timer::new(tuning.hit_invincibility_window, ()));
            DamageOutcome::Hurt
        }
    }

    fn die(&mut self, death_delay: f32) {
        self.invincibility = None;
        self.life = Life::Dying(Timer::new(death_delay, ()));
    }

    /// Returns true if the change killed the player
    pub fn add_lives(&mut self, extra: i32, death_delay: f32) -> bool {
        self.lives = add_clamped(self.lives, extra, 0, self.max_lives);
        if self.lives == 0 && self.is_alive() {
            self.die(death_delay);
            return true;
        }
        false
    }

    pub fn add_max_lives(&mut self, extra: i32, limit: u32, death_delay: f32) -> bool {
        self.max_lives = add_clamped(self.max_lives, extra, 1, limit);
        self.add_lives(extra, death_delay)
    }

    /// Start (or restart) an invincibility window
    pub fn enable_invincibility(&mut self, seconds: f32) {
        self.invincibility = Some(Timer::new(seconds, ()));
    }

    pub fn add_speed(&mut self, increase: f32, min: f32, max: f32) {
        self.speed = (self.speed + increase).clamp(min, max);
    }

    /// Walk one tick in `dir`. Returns true when pressed against an obstacle.
    pub fn walk(&mut self, dir: Direction, dt: f32, is_blocked: impl Fn(IVec2) -> bool) -> bool {
        self.facing = dir;
        let (pos, resting) = advance(self.pos, dir, self.speed * dt, is_blocked);
        self.pos = pos;
        resting
    }

    /// Advance invincibility and death timers. Returns true when the death
    /// should be reported.
    pub fn tick_timers(&mut self, dt: f32) -> bool {
        if let Some(timer) = &mut self.invincibility
            && timer.tick(dt).is_some()
        {
            self.invincibility = None;
        }
        self.life.tick(dt)
    }
}

/// A wandering enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    /// `None` while idle
    pub direction: Option<Direction>,
    pub speed: f32,
    pub life: Life,
}

impl Enemy {
    pub fn new(id: u32, cell: IVec2, speed: f32) -> Self {
        Self {
            id,
            pos: cell_center(cell),
            direction: None,
            speed,
            life: Life::Alive,
        }
    }

    pub fn cell(&self) -> IVec2 {
        round_to_cell(self.pos)
    }

    pub fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    pub fn take_hit(&mut self, death_delay: f32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        self.direction = None;
        self.life = Life::Dying(Timer::new(death_delay, ()));
        DamageOutcome::Killed
    }

    fn at_cell_center(&self) -> bool {
        self.pos.distance_squared(cell_center(self.cell())) < 1e-6
    }

    /// Pick a random direction other than the current one; idle if it is blocked
    pub fn pick_direction(&mut self, rng: &mut Pcg32, is_blocked: impl Fn(IVec2) -> bool) {
        let previous = self.direction;
        let next = loop {
            let candidate = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            if Some(candidate) != previous {
                break candidate;
            }
        };
        self.direction = if is_blocked(self.cell() + next.offset()) {
            None
        } else {
            Some(next)
        };
    }

    /// One tick of wandering
    pub fn wander(&mut self, dt: f32, rng: &mut Pcg32, is_blocked: impl Fn(IVec2) -> bool) {
        if !self.is_alive() {
            return;
        }
        let stuck = match self.direction {
            None => true,
            Some(dir) => self.at_cell_center() && is_blocked(self.cell() + dir.offset()),
        };
        if stuck {
            self.pick_direction(rng, &is_blocked);
        }
        if let Some(dir) = self.direction {
            let (pos, _) = advance(self.pos, dir, self.speed * dt, &is_blocked);
            self.pos = pos;
        }
    }

    /// Returns true when the death should be reported
    pub fn tick_timers(&mut self, dt: f32) -> bool {
        self.life.tick(dt)
    }
}
