//! Daily merchant behaviour: thinking, travelling, trading.

use anyhow::Result;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{
    agent::{self, Cargo, Merchant, MerchantState},
    engine::{System, SystemContext},
    journal::JournalEvent,
    nav::Navigator,
    world::World,
};

pub struct AgentSystem;

impl AgentSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AgentSystem {
    fn name(&self) -> &'static str {
        "agents"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        let navigator = Navigator::new(world.agent_params.speed_per_day);
        for index in 0..world.merchants.len() {
            let mut merchant = world.merchants[index].clone();
            if merchant.finished.is_some() {
                continue;
            }

            match merchant.state {
                MerchantState::Idle => {
                    merchant.think_days_left =
                        rng.gen_range(0..=world.agent_params.max_think_days);
                    merchant.state = MerchantState::Thinking;
                }
                MerchantState::Thinking => {
                    if merchant.think_days_left > 0 {
                        merchant.think_days_left -= 1;
                    } else {
                        think(ctx, world, &mut merchant);
                    }
                }
                MerchantState::MovingToBroker => {
                    match merchant.broker_target {
                        Some(target) => {
                            if navigator.advance(&mut merchant.position, target) {
                                merchant.broker_target = None;
                                merchant.state = MerchantState::Thinking;
                                merchant.think_days_left = 0;
                            }
                        }
                        None => merchant.state = MerchantState::Idle,
                    }
                }
                MerchantState::MovingToBuy => match merchant.route {
                    Some(route) => {
                        let target = world.settlements[route.seller.index()].position();
                        if navigator.advance(&mut merchant.position, target) {
                            execute_buy(ctx, world, &mut merchant);
                        }
                    }
                    None => merchant.state = MerchantState::Idle,
                },
                MerchantState::MovingToSell => match merchant.route {
                    Some(route) => {
                        let target = world.settlements[route.buyer.index()].position();
                        if navigator.advance(&mut merchant.position, target) {
                            execute_sell(ctx, world, &mut merchant);
                        }
                    }
                    None => merchant.state = MerchantState::Idle,
                },
                MerchantState::Wandering => match merchant.wander_target {
                    Some(target) => {
                        let position = world.settlements[target.index()].position();
                        if navigator.advance(&mut merchant.position, position) {
                            merchant.visited.insert(target);
                            merchant.known.insert(target);
                            merchant.wander_target = None;
                            merchant.state = MerchantState::Idle;
                        }
                    }
                    None => merchant.state = MerchantState::Idle,
                },
            }

            if let Some(outcome) = merchant.check_outcome(&world.agent_params) {
                world.journal.record(
                    ctx.day,
                    JournalEvent::EpisodeEnded {
                        merchant: merchant.id,
                        outcome,
                        final_money: merchant.money,
                    },
                );
            }
            world.merchants[index] = merchant;
        }
        Ok(())
    }
}

/// Decides what the merchant does next: upgrade, buy information, run a
/// trade route, or wander off to discover settlements on foot.
fn think(ctx: &SystemContext, world: &mut World, merchant: &mut Merchant) {
    let params = world.agent_params.clone();

    if params.enable_upgrades {
        if let Some(cost) = world.brokers.upgrade_cost(merchant.capacity_tier) {
            if merchant.money >= cost as f64 {
                if world.brokers.nearest_in_range(merchant.position).is_some() {
                    merchant.money -= cost as f64;
                    merchant.capacity_tier += 1;
                    world.journal.record(
                        ctx.day,
                        JournalEvent::CapacityUpgraded {
                            merchant: merchant.id,
                            new_capacity: merchant.capacity(&params),
                            cost,
                        },
                    );
                    merchant.state = MerchantState::Idle;
                    return;
                }
                if let Some(broker) = world.brokers.nearest(merchant.position) {
                    merchant.broker_target = Some(broker.position);
                    merchant.state = MerchantState::MovingToBroker;
                    return;
                }
            }
        }
    }

    if merchant.known.len() < 2 {
        if let Some(broker) = world.brokers.nearest_in_range(merchant.position).cloned() {
            let local_cost = world.brokers.params().local_info_cost;
            let global_cost = world.brokers.params().global_info_cost;
            if let Some(revealed) =
                world
                    .brokers
                    .buy_local_info(&broker, merchant, &world.settlements)
            {
                world.journal.record(
                    ctx.day,
                    JournalEvent::InfoPurchased {
                        merchant: merchant.id,
                        broker: broker.name.clone(),
                        cost: local_cost,
                        settlements_revealed: revealed,
                    },
                );
            }
            if merchant.known.len() < 2 {
                if let Some(revealed) =
                    world.brokers.buy_global_info(merchant, &world.settlements)
                {
                    world.journal.record(
                        ctx.day,
                        JournalEvent::InfoPurchased {
                            merchant: merchant.id,
                            broker: broker.name,
                            cost: global_cost,
                            settlements_revealed: revealed,
                        },
                    );
                }
            }
            if merchant.known.len() >= 2 {
                merchant.state = MerchantState::Idle;
                return;
            }
        } else if let Some(broker) = world.brokers.nearest(merchant.position) {
            if merchant.money >= world.brokers.params().local_info_cost as f64 {
                merchant.broker_target = Some(broker.position);
                merchant.state = MerchantState::MovingToBroker;
                return;
            }
        }
        start_wandering(world, merchant);
        return;
    }

    match agent::search_route(world, merchant) {
        Some(route) => {
            world.journal.record(
                ctx.day,
                JournalEvent::RoutePlanned {
                    merchant: merchant.id,
                    seller: route.seller,
                    buyer: route.buyer,
                    item: route.item,
                    quantity: route.quantity,
                },
            );
            merchant.route = Some(route);
            merchant.state = MerchantState::MovingToBuy;
        }
        None => start_wandering(world, merchant),
    }
}

/// Heads for the nearest settlement not yet visited this sweep; once every
/// settlement has been seen the sweep starts over.
fn start_wandering(world: &World, merchant: &mut Merchant) {
    if world.settlements.is_empty() {
        merchant.state = MerchantState::Idle;
        return;
    }
    if world
        .settlements
        .iter()
        .all(|s| merchant.visited.contains(&s.id()))
    {
        merchant.visited.clear();
    }
    let target = world
        .settlements
        .iter()
        .filter(|s| !merchant.visited.contains(&s.id()))
        .map(|s| (s.id(), s.position().distance(merchant.position)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id);
    merchant.wander_target = target;
    merchant.state = MerchantState::Wandering;
}

/// One buy at the seller. Quantity is recomputed on the spot; prices may
/// have moved since the route was planned. A quantity of zero abandons the
/// route without touching stock or money.
fn execute_buy(ctx: &SystemContext, world: &mut World, merchant: &mut Merchant) {
    let route = match merchant.route {
        Some(route) => route,
        None => {
            merchant.state = MerchantState::Idle;
            return;
        }
    };
    let quantity = match world.price(route.seller, route.item) {
        Some(price) if price > 0 => {
            let affordable = (merchant.money / price as f64).floor() as i64;
            let stock = world
                .settlement(route.seller)
                .line(route.item)
                .map_or(0, |l| l.stock);
            affordable
                .min(stock)
                .min(merchant.remaining_capacity(&world.agent_params))
        }
        _ => 0,
    };
    if quantity <= 0 {
        merchant.route = None;
        merchant.state = MerchantState::Thinking;
        merchant.think_days_left = 0;
        return;
    }
    let cost = match world.buy_stock(route.seller, route.item, quantity) {
        Some(cost) => cost,
        None => {
            merchant.route = None;
            merchant.state = MerchantState::Thinking;
            merchant.think_days_left = 0;
            return;
        }
    };
    merchant.money -= cost as f64;
    match &mut merchant.cargo {
        Some(cargo) if cargo.item == route.item => {
            cargo.amount += quantity;
            cargo.cost += cost;
        }
        _ => {
            merchant.cargo = Some(Cargo {
                item: route.item,
                amount: quantity,
                cost,
            });
        }
    }
    world.journal.record(
        ctx.day,
        JournalEvent::Bought {
            merchant: merchant.id,
            settlement: route.seller,
            item: route.item,
            amount: quantity,
            cost,
        },
    );
    merchant.state = MerchantState::MovingToSell;
}

/// One sale at the buyer. A live contract covered in full pays its reward;
/// anything else goes through the market at bulk value. Either way the
/// cargo lands in the destination's stock and the merchant goes straight
/// back to thinking about its next move.
fn execute_sell(ctx: &SystemContext, world: &mut World, merchant: &mut Merchant) {
    let route = match merchant.route.take() {
        Some(route) => route,
        None => {
            merchant.state = MerchantState::Idle;
            return;
        }
    };
    let cargo = match merchant.cargo.take() {
        Some(cargo) => cargo,
        None => {
            merchant.state = MerchantState::Idle;
            return;
        }
    };
    if let Some(reward) = world
        .contracts
        .try_complete(route.buyer, cargo.item, cargo.amount)
    {
        world.deposit_stock(route.buyer, cargo.item, cargo.amount);
        merchant.money += reward as f64;
        world.journal.record(
            ctx.day,
            JournalEvent::ContractCompleted {
                settlement: route.buyer,
                item: cargo.item,
                reward,
            },
        );
    } else {
        let revenue = world
            .sell_stock(route.buyer, cargo.item, cargo.amount)
            .unwrap_or(0);
        merchant.money += revenue as f64;
        world.journal.record(
            ctx.day,
            JournalEvent::Sold {
                merchant: merchant.id,
                settlement: route.buyer,
                item: cargo.item,
                amount: cargo.amount,
                revenue,
            },
        );
    }
    merchant.state = MerchantState::Thinking;
    merchant.think_days_left = 0;
}
