//! Information brokers: paid discovery of settlements and capacity upgrades.

use serde::{Deserialize, Serialize};

use crate::{
    agent::Merchant,
    nav::Position,
    world::{Settlement, SettlementId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoTier {
    Local,
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerParams {
    #[serde(default = "default_local_info_cost")]
    pub local_info_cost: i64,
    #[serde(default = "default_global_info_cost")]
    pub global_info_cost: i64,
    #[serde(default = "default_local_radius")]
    pub local_radius: f64,
    #[serde(default = "default_service_range")]
    pub service_range: f64,
    #[serde(default = "default_upgrade_costs")]
    pub upgrade_costs: Vec<i64>,
}

fn default_local_info_cost() -> i64 {
    50
}

fn default_global_info_cost() -> i64 {
    200
}

fn default_local_radius() -> f64 {
    40.0
}

fn default_service_range() -> f64 {
    15.0
}

fn default_upgrade_costs() -> Vec<i64> {
    vec![2500, 10000]
}

impl Default for BrokerParams {
    fn default() -> Self {
        Self {
            local_info_cost: default_local_info_cost(),
            global_info_cost: default_global_info_cost(),
            local_radius: default_local_radius(),
            service_range: default_service_range(),
            upgrade_costs: default_upgrade_costs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
    pub name: String,
    pub position: Position,
    pub serviced: Vec<SettlementId>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BrokerRegistry {
    brokers: Vec<Broker>,
    params: BrokerParams,
}

impl BrokerRegistry {
    pub fn new(params: BrokerParams) -> Self {
        Self {
            brokers: Vec::new(),
            params,
        }
    }

    pub fn add(&mut self, broker: Broker) {
        self.brokers.push(broker);
    }

    pub fn params(&self) -> &BrokerParams {
        &self.params
    }

    pub fn brokers(&self) -> &[Broker] {
        &self.brokers
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }

    /// The closest broker a caller at `position` can talk to, if any is
    /// within service range.
    pub fn nearest_in_range(&self, position: Position) -> Option<&Broker> {
        self.brokers
            .iter()
            .map(|b| (b, b.position.distance(position)))
            .filter(|(_, d)| *d <= self.params.service_range)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(b, _)| b)
    }

    /// The closest broker anywhere, for travel planning.
    pub fn nearest(&self, position: Position) -> Option<&Broker> {
        self.brokers
            .iter()
            .map(|b| (b, b.position.distance(position)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(b, _)| b)
    }

    /// Sells local knowledge: the broker's serviced settlements within the
    /// local radius of the merchant, excluding the one it is standing in.
    /// Charges nothing and reveals nothing when the merchant cannot cover
    /// the fee.
    pub fn buy_local_info(
        &self,
        broker: &Broker,
        merchant: &mut Merchant,
        settlements: &[Settlement],
    ) -> Option<usize> {
        let cost = self.params.local_info_cost;
        if merchant.money < cost as f64 {
            return None;
        }
        merchant.money -= cost as f64;
        let mut revealed = 0;
        for id in &broker.serviced {
            let settlement = match settlements.get(id.index()) {
                Some(settlement) => settlement,
                None => continue,
            };
            let distance = settlement.position().distance(merchant.position);
            if distance > 1.0
                && distance <= self.params.local_radius
                && merchant.known.insert(settlement.id())
            {
                revealed += 1;
            }
        }
        Some(revealed)
    }

    /// Sells the full settlement roster. Same no-charge rule on
    /// insufficient funds.
    pub fn buy_global_info(
        &self,
        merchant: &mut Merchant,
        settlements: &[Settlement],
    ) -> Option<usize> {
        let cost = self.params.global_info_cost;
        if merchant.money < cost as f64 {
            return None;
        }
        merchant.money -= cost as f64;
        let mut revealed = 0;
        for settlement in settlements {
            if merchant.known.insert(settlement.id()) {
                revealed += 1;
            }
        }
        Some(revealed)
    }

    /// Cost of moving from `current_tier` to the next one, `None` at the
    /// top tier.
    pub fn upgrade_cost(&self, current_tier: usize) -> Option<i64> {
        self.params.upgrade_costs.get(current_tier).copied()
    }
}

const CLUSTER_NEIGHBOURS: usize = 3;

/// Builds a cluster for a broker with no assigned settlements: the
/// settlement nearest `seed` becomes the hub, joined by its three nearest
/// neighbours, and the broker sits at the cluster's centroid.
pub fn cluster_around(
    seed: Position,
    settlements: &[Settlement],
) -> (Vec<SettlementId>, Position) {
    let hub = match settlements
        .iter()
        .map(|s| (s, s.position().distance(seed)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(s, _)| s)
    {
        Some(hub) => hub,
        None => return (Vec::new(), seed),
    };
    let mut others: Vec<&Settlement> = settlements
        .iter()
        .filter(|s| s.id() != hub.id())
        .collect();
    others.sort_by(|a, b| {
        a.position()
            .distance(hub.position())
            .total_cmp(&b.position().distance(hub.position()))
    });

    let mut members = vec![hub];
    members.extend(others.into_iter().take(CLUSTER_NEIGHBOURS));
    let centroid = Position::new(
        members.iter().map(|s| s.position().x).sum::<f64>() / members.len() as f64,
        members.iter().map(|s| s.position().y).sum::<f64>() / members.len() as f64,
    );
    (members.iter().map(|s| s.id()).collect(), centroid)
}
