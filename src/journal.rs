//! Chronological record of notable simulation happenings.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{events::EventKind, items::ItemId, world::SettlementId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalEvent {
    EventStarted {
        settlement: SettlementId,
        kind: EventKind,
        duration: u32,
    },
    EventEnded {
        settlement: SettlementId,
        kind: EventKind,
    },
    ContractActivated {
        settlement: SettlementId,
        item: ItemId,
        amount: i64,
        reward: i64,
    },
    ContractCompleted {
        settlement: SettlementId,
        item: ItemId,
        reward: i64,
    },
    ContractExpired {
        settlement: SettlementId,
        item: ItemId,
    },
    RoutePlanned {
        merchant: usize,
        seller: SettlementId,
        buyer: SettlementId,
        item: ItemId,
        quantity: i64,
    },
    Bought {
        merchant: usize,
        settlement: SettlementId,
        item: ItemId,
        amount: i64,
        cost: i64,
    },
    Sold {
        merchant: usize,
        settlement: SettlementId,
        item: ItemId,
        amount: i64,
        revenue: i64,
    },
    InfoPurchased {
        merchant: usize,
        broker: String,
        cost: i64,
        settlements_revealed: usize,
    },
    CapacityUpgraded {
        merchant: usize,
        new_capacity: i64,
        cost: i64,
    },
    EpisodeEnded {
        merchant: usize,
        outcome: crate::agent::EpisodeOutcome,
        final_money: f64,
    },
}

/// Timestamped entry in the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub day: u64,
    pub event: JournalEvent,
}

/// Append-only log of the run, mirrored to the tracing subscriber.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn record(&mut self, day: u64, event: JournalEvent) {
        info!(day, ?event, "journal");
        self.entries.push(JournalEntry { day, event });
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
