//! Countdown timers
//!
//! Every delay in the simulation (fuses, chain delays, invincibility windows,
//! death and crumble delays) is a [`Timer`] advanced by the tick. A timer holds
//! the action to resume when it expires; replacing the timer cancels the old one.

use serde::{Deserialize, Serialize};

/// A countdown carrying the action to resume on expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer<A> {
    remaining: f32,
    action: A,
    fired: bool,
}

impl<A: Copy> Timer<A> {
    pub fn new(seconds: f32, action: A) -> Self {
        Self {
            remaining: seconds.max(0.0),
            action,
            fired: false,
        }
    }

    /// Advance by `dt`; yields the action exactly once, on the tick it expires
    pub fn tick(&mut self, dt: f32) -> Option<A> {
        if self.fired {
            return None;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.fired = true;
            Some(self.action)
        } else {
            None
        }
    }

    /// Seconds left before expiry
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn action(&self) -> A {
        self.action
    }

    pub fn is_finished(&self) -> bool {
        self.fired
    }
}
