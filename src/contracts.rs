//! Delivery contracts offered by settlements.
//!
//! A contract asks for a single delivery of at least `amount` units of one
//! item to one settlement before its time runs out. Partial deliveries never
//! accumulate; a shipment either satisfies the contract outright or leaves it
//! untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{items::ItemId, world::SettlementId};

/// A contract drafted for later in the month, waiting for its start day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingContract {
    pub settlement: SettlementId,
    pub item: ItemId,
    pub amount: i64,
    pub reward: i64,
    pub start_day: u32,
    pub duration: u32,
}

/// A live contract counting down toward expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveContract {
    pub amount: i64,
    pub reward: i64,
    pub days_left: u32,
}

/// All scheduled and live contracts, keyed so each settlement carries at
/// most one live contract per item.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ContractBook {
    scheduled: Vec<PendingContract>,
    active: BTreeMap<(SettlementId, ItemId), ActiveContract>,
}

impl ContractBook {
    pub fn schedule(&mut self, contract: PendingContract) {
        self.scheduled.push(contract);
    }

    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    /// Moves every pending contract whose start day has arrived into the
    /// live book. A settlement already holding a live contract for the same
    /// item keeps it; the newcomer is dropped. Returns the keys that went
    /// live today.
    pub fn activate_due(&mut self, day_of_month: u32) -> Vec<(SettlementId, ItemId)> {
        let mut activated = Vec::new();
        let mut remaining = Vec::with_capacity(self.scheduled.len());
        for pending in self.scheduled.drain(..) {
            if pending.start_day != day_of_month {
                remaining.push(pending);
                continue;
            }
            let key = (pending.settlement, pending.item);
            if self.active.contains_key(&key) {
                continue;
            }
            self.active.insert(
                key,
                ActiveContract {
                    amount: pending.amount,
                    reward: pending.reward,
                    days_left: pending.duration,
                },
            );
            activated.push(key);
        }
        self.scheduled = remaining;
        activated
    }

    /// Counts every live contract down one day and removes the ones that
    /// reach zero. Returns the expired entries.
    pub fn tick_down(&mut self) -> Vec<((SettlementId, ItemId), ActiveContract)> {
        let mut expired = Vec::new();
        for (key, contract) in self.active.iter_mut() {
            contract.days_left = contract.days_left.saturating_sub(1);
            if contract.days_left == 0 {
                expired.push((*key, contract.clone()));
            }
        }
        for (key, _) in &expired {
            self.active.remove(key);
        }
        expired
    }

    pub fn get(&self, settlement: SettlementId, item: ItemId) -> Option<&ActiveContract> {
        self.active.get(&(settlement, item))
    }

    /// The advertised payout for delivering to this settlement, regardless
    /// of how much cargo the caller actually holds.
    pub fn potential_reward(&self, settlement: SettlementId, item: ItemId) -> Option<i64> {
        self.active.get(&(settlement, item)).map(|c| c.reward)
    }

    /// Completes the contract if the delivery covers the full amount.
    /// Returns the reward on success; an undersized delivery leaves the
    /// contract in place and returns `None`.
    pub fn try_complete(
        &mut self,
        settlement: SettlementId,
        item: ItemId,
        delivered: i64,
    ) -> Option<i64> {
        let key = (settlement, item);
        let needed = self.active.get(&key)?.amount;
        if delivered < needed {
            return None;
        }
        self.active.remove(&key).map(|c| c.reward)
    }

    pub fn active_iter(&self) -> impl Iterator<Item = (&(SettlementId, ItemId), &ActiveContract)> {
        self.active.iter()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn clear(&mut self) {
        self.scheduled.clear();
        self.active.clear();
    }
}
