//! Merchant state and route planning.
//!
//! A merchant only ever acts on settlements it has learned about, either by
//! paying a broker or by stumbling into them while wandering. Money is a
//! float and may go negative; the episode ends there, the arithmetic does
//! not stop it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    items::ItemId,
    nav::Position,
    world::{SettlementId, World},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentParams {
    #[serde(default = "default_starting_money")]
    pub starting_money: f64,
    #[serde(default = "default_capacity_tiers")]
    pub capacity_tiers: Vec<i64>,
    #[serde(default = "default_travel_cost_rate")]
    pub travel_cost_rate: f64,
    #[serde(default = "default_min_profit")]
    pub min_profit: f64,
    #[serde(default = "default_speed_per_day")]
    pub speed_per_day: f64,
    #[serde(default = "default_money_ceiling")]
    pub money_ceiling: f64,
    #[serde(default = "default_max_think_days")]
    pub max_think_days: u32,
    #[serde(default = "default_enable_upgrades")]
    pub enable_upgrades: bool,
}

fn default_starting_money() -> f64 {
    1000.0
}

fn default_capacity_tiers() -> Vec<i64> {
    vec![20, 50, 100]
}

fn default_travel_cost_rate() -> f64 {
    0.5
}

fn default_min_profit() -> f64 {
    10.0
}

fn default_speed_per_day() -> f64 {
    15.0
}

fn default_money_ceiling() -> f64 {
    5000.0
}

fn default_max_think_days() -> u32 {
    2
}

fn default_enable_upgrades() -> bool {
    true
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            starting_money: default_starting_money(),
            capacity_tiers: default_capacity_tiers(),
            travel_cost_rate: default_travel_cost_rate(),
            min_profit: default_min_profit(),
            speed_per_day: default_speed_per_day(),
            money_ceiling: default_money_ceiling(),
            max_think_days: default_max_think_days(),
            enable_upgrades: default_enable_upgrades(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MerchantState {
    Idle,
    Thinking,
    MovingToBuy,
    MovingToSell,
    MovingToBroker,
    Wandering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    Bankrupt,
    Ceiling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cargo {
    pub item: ItemId,
    pub amount: i64,
    /// What was paid for the load, for profit accounting.
    pub cost: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub seller: SettlementId,
    pub buyer: SettlementId,
    pub item: ItemId,
    pub quantity: i64,
    pub projected_profit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: usize,
    pub money: f64,
    pub cargo: Option<Cargo>,
    pub capacity_tier: usize,
    pub known: BTreeSet<SettlementId>,
    pub visited: BTreeSet<SettlementId>,
    pub position: Position,
    pub home: Position,
    pub state: MerchantState,
    pub think_days_left: u32,
    pub route: Option<PlannedRoute>,
    pub wander_target: Option<SettlementId>,
    pub broker_target: Option<Position>,
    pub finished: Option<EpisodeOutcome>,
}

impl Merchant {
    pub fn new(id: usize, home: Position, params: &AgentParams) -> Self {
        Self {
            id,
            money: params.starting_money,
            cargo: None,
            capacity_tier: 0,
            known: BTreeSet::new(),
            visited: BTreeSet::new(),
            position: home,
            home,
            state: MerchantState::Idle,
            think_days_left: 0,
            route: None,
            wander_target: None,
            broker_target: None,
            finished: None,
        }
    }

    pub fn capacity(&self, params: &AgentParams) -> i64 {
        params
            .capacity_tiers
            .get(self.capacity_tier)
            .copied()
            .unwrap_or_else(|| *params.capacity_tiers.last().unwrap_or(&0))
    }

    pub fn remaining_capacity(&self, params: &AgentParams) -> i64 {
        let held = self.cargo.as_ref().map_or(0, |c| c.amount);
        (self.capacity(params) - held).max(0)
    }

    /// Flags the episode outcome once. Later calls never overwrite the
    /// first one.
    pub fn check_outcome(&mut self, params: &AgentParams) -> Option<EpisodeOutcome> {
        if self.finished.is_some() {
            return None;
        }
        let outcome = if self.money < 0.0 {
            Some(EpisodeOutcome::Bankrupt)
        } else if self.money >= params.money_ceiling {
            Some(EpisodeOutcome::Ceiling)
        } else {
            None
        };
        self.finished = outcome;
        outcome
    }

    /// Fresh start at the home position. Knowledge and upgrades reset with
    /// everything else.
    pub fn reset(&mut self, params: &AgentParams) {
        self.money = params.starting_money;
        self.cargo = None;
        self.capacity_tier = 0;
        self.known.clear();
        self.visited.clear();
        self.position = self.home;
        self.state = MerchantState::Idle;
        self.think_days_left = 0;
        self.route = None;
        self.wander_target = None;
        self.broker_target = None;
        self.finished = None;
    }
}

/// Greedy single-leg route search over the merchant's known settlements.
///
/// Deterministic: sellers and buyers are visited in id order and only a
/// strictly better profit displaces the incumbent, so ties go to the
/// first-found pair. Producers never appear as buyers. An active contract at
/// the buyer counts for its full reward even when the planned quantity could
/// not complete it; the merchant finds that out on delivery.
pub fn search_route(world: &World, merchant: &Merchant) -> Option<PlannedRoute> {
    let params = world.agent_params();
    let capacity = merchant.remaining_capacity(params);
    if capacity <= 0 {
        return None;
    }
    let mut best: Option<PlannedRoute> = None;
    for &seller_id in &merchant.known {
        let seller = world.settlement(seller_id);
        for line in seller.lines() {
            if line.stock <= 0 {
                continue;
            }
            let price = match world.price(seller_id, line.item) {
                Some(price) => price,
                None => continue,
            };
            let affordable = (merchant.money / price as f64).floor() as i64;
            let quantity = affordable.min(line.stock).min(capacity);
            if quantity <= 0 {
                continue;
            }
            for &buyer_id in &merchant.known {
                if buyer_id == seller_id {
                    continue;
                }
                let buyer = world.settlement(buyer_id);
                if buyer.is_producer() || !buyer.trades(line.item) {
                    continue;
                }
                let revenue = world
                    .contracts()
                    .potential_reward(buyer_id, line.item)
                    .unwrap_or_else(|| {
                        world
                            .bulk_sell_value(buyer_id, line.item, quantity)
                            .unwrap_or(0)
                    });
                let travel = params.travel_cost_rate
                    * (merchant.position.distance(seller.position())
                        + seller.position().distance(buyer.position()));
                let profit = revenue as f64 - (quantity * price) as f64 - travel;
                if profit <= params.min_profit {
                    continue;
                }
                if best.map_or(true, |b| profit > b.projected_profit) {
                    best = Some(PlannedRoute {
                        seller: seller_id,
                        buyer: buyer_id,
                        item: line.item,
                        quantity,
                        projected_profit: profit,
                    });
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        items::Catalog,
        world::{EconomyParams, MarketLine, SettlementInit, World},
    };

    fn trade_world() -> World {
        let mut world = World::new(
            Catalog::standard(),
            EconomyParams::default(),
            AgentParams::default(),
        );
        let farm = world
            .add_settlement(SettlementInit {
                name: "Farm".to_string(),
                is_producer: true,
                position: Position::new(0.0, 0.0),
                population: 500,
                min_population: 100,
                max_population: 1000,
                grow_population: false,
                dynamic_storage: false,
            })
            .unwrap();
        let town = world
            .add_settlement(SettlementInit {
                name: "Town".to_string(),
                is_producer: false,
                position: Position::new(10.0, 0.0),
                population: 800,
                min_population: 100,
                max_population: 1000,
                grow_population: false,
                dynamic_storage: false,
            })
            .unwrap();
        // producer flush with wheat, consumer starved of it
        world.add_line(farm, MarketLine::new(ItemId(0), 380, 400, 15));
        world.add_line(town, MarketLine::new(ItemId(0), 20, 500, 0));
        world
    }

    fn knowing_merchant(world: &World) -> Merchant {
        let mut merchant = Merchant::new(0, Position::new(0.0, 0.0), world.agent_params());
        for settlement in world.settlements() {
            merchant.known.insert(settlement.id());
        }
        merchant
    }

    #[test]
    fn finds_the_obvious_arbitrage() {
        let world = trade_world();
        let merchant = knowing_merchant(&world);
        let route = search_route(&world, &merchant).expect("route");
        assert_eq!(route.seller, SettlementId(0));
        assert_eq!(route.buyer, SettlementId(1));
        assert_eq!(route.item, ItemId(0));
        assert!(route.quantity > 0);
        assert!(route.projected_profit > world.agent_params().min_profit);
    }

    #[test]
    fn producers_are_never_buyers() {
        let mut world = trade_world();
        // make the consumer the cheap side so the only candidate buyer
        // would be the producer
        world
            .settlement_mut(SettlementId(1))
            .line_mut(ItemId(0))
            .unwrap()
            .stock = 490;
        world
            .settlement_mut(SettlementId(0))
            .line_mut(ItemId(0))
            .unwrap()
            .stock = 10;
        let merchant = knowing_merchant(&world);
        assert!(search_route(&world, &merchant).is_none());
    }

    #[test]
    fn unknown_settlements_are_invisible() {
        let world = trade_world();
        let mut merchant = knowing_merchant(&world);
        merchant.known.remove(&SettlementId(1));
        assert!(search_route(&world, &merchant).is_none());
    }

    #[test]
    fn empty_wallet_finds_nothing() {
        let world = trade_world();
        let mut merchant = knowing_merchant(&world);
        merchant.money = 0.0;
        assert!(search_route(&world, &merchant).is_none());
    }

    #[test]
    fn outcome_fires_exactly_once() {
        let params = AgentParams::default();
        let mut merchant = Merchant::new(0, Position::default(), &params);
        merchant.money = -12.5;
        assert_eq!(merchant.check_outcome(&params), Some(EpisodeOutcome::Bankrupt));
        assert_eq!(merchant.check_outcome(&params), None);
        assert_eq!(merchant.finished, Some(EpisodeOutcome::Bankrupt));
    }
}
