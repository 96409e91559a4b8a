//! Daily market tick: consumption, production, tax, population feedback.

use anyhow::Result;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    items::ItemId,
    world::{SettlementId, World},
};

pub struct MarketSystem;

impl MarketSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarketSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MarketSystem {
    fn name(&self) -> &'static str {
        "market"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        let params = world.economy.clone();
        // (producer, sovereign, item, tax) moved after the loop so a
        // sovereign's own tick is not disturbed mid-iteration
        let mut transfers: Vec<(usize, SettlementId, ItemId, i64)> = Vec::new();

        for index in 0..world.settlements.len() {
            let settlement = &mut world.settlements[index];
            let pop_ratio =
                settlement.population as f64 / (settlement.max_population as f64 / 2.0);
            let consumption_multiplier = settlement.consumption_multiplier;
            let production_multiplier = settlement.production_multiplier;
            let is_producer = settlement.is_producer;
            let sovereign = settlement.sovereign;
            let mut all_needs_met = true;

            for line in &mut settlement.lines {
                let base = world.catalog.get(line.item).daily_base_consumption;

                // consumption first; an empty line still eats to zero and
                // counts as unmet
                let demand = ((base as f64 * pop_ratio * consumption_multiplier).round()
                    as i64)
                    .max(1);
                if line.stock >= demand {
                    line.stock -= demand;
                } else {
                    line.stock = 0;
                    all_needs_met = false;
                    debug!(
                        settlement = %settlement.name,
                        item = line.item.0,
                        demand,
                        "shortage"
                    );
                }
                line.last_consumption = demand;

                // production, stopped once stock piles past the hard cap
                if is_producer
                    && line.daily_production > 0
                    && line.stock < params.hard_cap_factor * line.max_stock
                {
                    let produced =
                        (line.daily_production as f64 * production_multiplier).round() as i64;
                    if produced > 0 {
                        line.stock += produced;
                        if let Some(sovereign) = sovereign {
                            let tax = (produced as f64 * params.tax_rate).ceil() as i64;
                            transfers.push((index, sovereign, line.item, tax));
                        }
                    }
                }
            }

            if settlement.grow_population {
                let factor = if all_needs_met {
                    params.growth_factor
                } else {
                    params.decay_factor
                };
                settlement.population = ((settlement.population as f64 * factor).round()
                    as i64)
                    .clamp(settlement.min_population, settlement.max_population);
            }
            if settlement.dynamic_storage {
                let capacity =
                    params.storage_base + settlement.population / params.storage_per_pop;
                for line in &mut settlement.lines {
                    line.max_stock = capacity;
                }
            }
        }

        // tax only moves when the sovereign actually trades the item;
        // otherwise the producer keeps the whole day's production
        for (producer, sovereign, item, tax) in transfers {
            if !world.settlements[sovereign.index()].trades(item) {
                continue;
            }
            if let Some(line) = world.settlements[producer].line_mut(item) {
                line.stock -= tax;
            }
            if let Some(line) = world.settlements[sovereign.index()].line_mut(item) {
                line.stock += tax;
            }
        }
        Ok(())
    }
}
