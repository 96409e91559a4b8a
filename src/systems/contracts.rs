//! Monthly contract drafting and daily contract lifecycle.

use anyhow::Result;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{
    contracts::PendingContract,
    engine::{System, SystemContext},
    items::ItemId,
    journal::JournalEvent,
    world::{SettlementId, World},
};

pub struct ContractSystem;

impl ContractSystem {
    pub fn new() -> Self {
        Self
    }

    /// Drafts go to consumer settlements when any exist, otherwise to
    /// anyone.
    fn draft(&self, world: &mut World, rng: &mut ChaCha8Rng) {
        let consumers: Vec<SettlementId> = world
            .settlements
            .iter()
            .filter(|s| !s.is_producer())
            .map(|s| s.id())
            .collect();
        let pool: Vec<SettlementId> = if consumers.is_empty() {
            world.settlements.iter().map(|s| s.id()).collect()
        } else {
            consumers
        };
        if pool.is_empty() || world.catalog.is_empty() {
            return;
        }
        for _ in 0..world.economy.contracts_per_month {
            let settlement = pool[rng.gen_range(0..pool.len())];
            let item = ItemId(rng.gen_range(0..world.catalog.len()) as u16);
            let amount = rng.gen_range(20..101) as i64;
            let bonus = rng.gen_range(1.3..1.5);
            let base = world.catalog.get(item).base_price;
            let reward = (base as f64 * amount as f64 * bonus).round() as i64;
            world.contracts.schedule(PendingContract {
                settlement,
                item,
                amount,
                reward,
                start_day: rng.gen_range(1..29),
                duration: rng.gen_range(7..15),
            });
        }
    }
}

impl Default for ContractSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ContractSystem {
    fn name(&self) -> &'static str {
        "contracts"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if ctx.month_began {
            self.draft(world, rng);
            debug!(
                month = ctx.month,
                scheduled = world.contracts.scheduled_len(),
                "drafted month contracts"
            );
        }

        let activated = world.contracts.activate_due(ctx.day_of_month);
        for (settlement, item) in activated {
            if let Some(contract) = world.contracts.get(settlement, item) {
                let (amount, reward) = (contract.amount, contract.reward);
                world.journal.record(
                    ctx.day,
                    JournalEvent::ContractActivated {
                        settlement,
                        item,
                        amount,
                        reward,
                    },
                );
            }
        }

        // a contract activated today already loses its first day here
        for ((settlement, item), _) in world.contracts.tick_down() {
            world
                .journal
                .record(ctx.day, JournalEvent::ContractExpired { settlement, item });
        }
        Ok(())
    }
}
