//! Flat-world positioning for settlements, brokers and merchants.
//!
//! Path-following is a collaborator concern; the simulation core only needs
//! straight-line distances and a "move toward, report arrival" primitive.

use serde::{Deserialize, Serialize};

/// A merchant counts as arrived when within this distance of its target.
pub const ARRIVAL_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Day-stepped straight-line movement.
#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    pub speed_per_day: f64,
}

impl Navigator {
    pub fn new(speed_per_day: f64) -> Self {
        Self { speed_per_day }
    }

    /// Advance `position` one day toward `target`. Returns true once the
    /// position is within [`ARRIVAL_TOLERANCE`] of the target.
    pub fn advance(&self, position: &mut Position, target: Position) -> bool {
        let dist = position.distance(target);
        if dist <= ARRIVAL_TOLERANCE {
            return true;
        }
        let step = self.speed_per_day.min(dist);
        position.x += (target.x - position.x) / dist * step;
        position.y += (target.y - position.y) / dist * step;
        position.distance(target) <= ARRIVAL_TOLERANCE
    }
}
