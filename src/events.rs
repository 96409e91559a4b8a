//! Settlement event scheduling and lifecycle state.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::world::SettlementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Festival,
    War,
    Famine,
    Boom,
}

impl EventKind {
    pub fn title(self) -> &'static str {
        match self {
            EventKind::Festival => "Harvest Festival",
            EventKind::War => "Civil War",
            EventKind::Famine => "Great Drought",
            EventKind::Boom => "Bountiful Harvest",
        }
    }

    pub fn consumption_multiplier(self) -> f64 {
        match self {
            EventKind::Festival => 2.0,
            EventKind::War => 3.0,
            EventKind::Famine | EventKind::Boom => 1.0,
        }
    }

    pub fn production_multiplier(self) -> f64 {
        match self {
            EventKind::Famine => 0.2,
            EventKind::Boom => 2.0,
            EventKind::Festival | EventKind::War => 1.0,
        }
    }

    /// Producers draw supply shocks, consumers draw demand shocks.
    pub fn draw_for_role(is_producer: bool, rng: &mut ChaCha8Rng) -> Self {
        if is_producer {
            if rng.gen_bool(0.5) {
                EventKind::Famine
            } else {
                EventKind::Boom
            }
        } else if rng.gen_bool(0.5) {
            EventKind::Festival
        } else {
            EventKind::War
        }
    }
}

/// An event drafted for later in the month, waiting for its start day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEvent {
    pub settlement: SettlementId,
    pub kind: EventKind,
    pub start_day: u32,
    pub duration: u32,
}

/// An event currently applying its multipliers to a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: EventKind,
    pub duration: u32,
    pub elapsed: u32,
}

impl ActiveEvent {
    pub fn new(kind: EventKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            elapsed: 0,
        }
    }

    pub fn expired(&self) -> bool {
        self.elapsed >= self.duration
    }
}
