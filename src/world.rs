use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    agent::{AgentParams, Merchant},
    broker::BrokerRegistry,
    contracts::ContractBook,
    events::{ActiveEvent, EventKind, PendingEvent},
    items::{Catalog, ItemId},
    journal::Journal,
    market,
    nav::Position,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SettlementId(pub u32);

impl SettlementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("duplicate settlement name '{0}'")]
    DuplicateName(String),
    #[error("unknown item '{0}'")]
    UnknownItem(String),
    #[error("unknown settlement '{0}'")]
    UnknownSettlement(String),
    #[error("making '{satellite}' a satellite of '{sovereign}' would close a sovereignty cycle")]
    SovereignCycle {
        satellite: String,
        sovereign: String,
    },
}

/// One traded good at one settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketLine {
    pub item: ItemId,
    pub stock: i64,
    pub max_stock: i64,
    pub daily_production: i64,
    pub last_price: i64,
    pub last_consumption: i64,
    pub(crate) initial_stock: i64,
}

impl MarketLine {
    pub fn new(item: ItemId, stock: i64, max_stock: i64, daily_production: i64) -> Self {
        Self {
            item,
            stock,
            max_stock,
            daily_production,
            last_price: 0,
            last_consumption: 0,
            initial_stock: stock,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub(crate) id: SettlementId,
    pub(crate) name: String,
    pub(crate) is_producer: bool,
    pub(crate) position: Position,
    pub(crate) population: i64,
    pub(crate) min_population: i64,
    pub(crate) max_population: i64,
    pub(crate) consumption_multiplier: f64,
    pub(crate) production_multiplier: f64,
    pub(crate) active_event: Option<ActiveEvent>,
    pub(crate) sovereign: Option<SettlementId>,
    pub(crate) satellites: Vec<SettlementId>,
    pub(crate) grow_population: bool,
    pub(crate) dynamic_storage: bool,
    pub(crate) lines: Vec<MarketLine>,
    pub(crate) initial_population: i64,
}

impl Settlement {
    pub fn id(&self) -> SettlementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_producer(&self) -> bool {
        self.is_producer
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn population(&self) -> i64 {
        self.population
    }

    pub fn sovereign(&self) -> Option<SettlementId> {
        self.sovereign
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        self.active_event.as_ref()
    }

    pub fn lines(&self) -> &[MarketLine] {
        &self.lines
    }

    pub fn line(&self, item: ItemId) -> Option<&MarketLine> {
        self.lines.iter().find(|line| line.item == item)
    }

    pub fn line_mut(&mut self, item: ItemId) -> Option<&mut MarketLine> {
        self.lines.iter_mut().find(|line| line.item == item)
    }

    pub fn trades(&self, item: ItemId) -> bool {
        self.line(item).is_some()
    }
}

/// Economy-wide tuning knobs, all scenario-overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyParams {
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default = "default_hard_cap_factor")]
    pub hard_cap_factor: i64,
    #[serde(default = "default_events_per_month")]
    pub events_per_month: usize,
    #[serde(default = "default_contracts_per_month")]
    pub contracts_per_month: usize,
    #[serde(default = "default_storage_base")]
    pub storage_base: i64,
    #[serde(default = "default_storage_per_pop")]
    pub storage_per_pop: i64,
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
}

fn default_tax_rate() -> f64 {
    0.40
}

fn default_hard_cap_factor() -> i64 {
    5
}

fn default_events_per_month() -> usize {
    2
}

fn default_contracts_per_month() -> usize {
    5
}

fn default_storage_base() -> i64 {
    200
}

fn default_storage_per_pop() -> i64 {
    10
}

fn default_growth_factor() -> f64 {
    1.05
}

fn default_decay_factor() -> f64 {
    0.95
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            hard_cap_factor: default_hard_cap_factor(),
            events_per_month: default_events_per_month(),
            contracts_per_month: default_contracts_per_month(),
            storage_base: default_storage_base(),
            storage_per_pop: default_storage_per_pop(),
            growth_factor: default_growth_factor(),
            decay_factor: default_decay_factor(),
        }
    }
}

#[derive(Debug)]
pub struct World {
    pub(crate) settlements: Vec<Settlement>,
    pub(crate) catalog: Catalog,
    pub(crate) contracts: ContractBook,
    pub(crate) scheduled_events: Vec<PendingEvent>,
    pub(crate) journal: Journal,
    pub(crate) brokers: BrokerRegistry,
    pub(crate) merchants: Vec<Merchant>,
    pub(crate) economy: EconomyParams,
    pub(crate) agent_params: AgentParams,
}

pub struct SettlementInit {
    pub name: String,
    pub is_producer: bool,
    pub position: Position,
    pub population: i64,
    pub min_population: i64,
    pub max_population: i64,
    pub grow_population: bool,
    pub dynamic_storage: bool,
}

impl World {
    pub fn new(catalog: Catalog, economy: EconomyParams, agent_params: AgentParams) -> Self {
        Self {
            settlements: Vec::new(),
            catalog,
            contracts: ContractBook::default(),
            scheduled_events: Vec::new(),
            journal: Journal::default(),
            brokers: BrokerRegistry::default(),
            merchants: Vec::new(),
            economy,
            agent_params,
        }
    }

    pub fn add_settlement(&mut self, init: SettlementInit) -> Result<SettlementId, SetupError> {
        if self.settlements.iter().any(|s| s.name == init.name) {
            return Err(SetupError::DuplicateName(init.name));
        }
        let id = SettlementId(self.settlements.len() as u32);
        self.settlements.push(Settlement {
            id,
            name: init.name,
            is_producer: init.is_producer,
            position: init.position,
            population: init.population,
            min_population: init.min_population,
            max_population: init.max_population,
            consumption_multiplier: 1.0,
            production_multiplier: 1.0,
            active_event: None,
            sovereign: None,
            satellites: Vec::new(),
            grow_population: init.grow_population,
            dynamic_storage: init.dynamic_storage,
            lines: Vec::new(),
            initial_population: init.population,
        });
        Ok(id)
    }

    pub fn add_line(&mut self, id: SettlementId, line: MarketLine) {
        let settlement = &mut self.settlements[id.index()];
        settlement.lines.push(line);
        settlement.lines.sort_by_key(|l| l.item);
    }

    /// Links a satellite to its sovereign. Walks the sovereign chain first so
    /// the relation stays a DAG.
    pub fn set_sovereign(
        &mut self,
        satellite: SettlementId,
        sovereign: SettlementId,
    ) -> Result<(), SetupError> {
        let mut cursor = Some(sovereign);
        while let Some(id) = cursor {
            if id == satellite {
                return Err(SetupError::SovereignCycle {
                    satellite: self.settlements[satellite.index()].name.clone(),
                    sovereign: self.settlements[sovereign.index()].name.clone(),
                });
            }
            cursor = self.settlements[id.index()].sovereign;
        }
        self.settlements[satellite.index()].sovereign = Some(sovereign);
        self.settlements[sovereign.index()].satellites.push(satellite);
        Ok(())
    }

    pub fn settlement(&self, id: SettlementId) -> &Settlement {
        &self.settlements[id.index()]
    }

    pub fn settlement_mut(&mut self, id: SettlementId) -> &mut Settlement {
        &mut self.settlements[id.index()]
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn settlement_by_name(&self, name: &str) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.name == name)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn contracts(&self) -> &ContractBook {
        &self.contracts
    }

    pub fn contracts_mut(&mut self) -> &mut ContractBook {
        &mut self.contracts
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn merchants(&self) -> &[Merchant] {
        &self.merchants
    }

    pub fn merchants_mut(&mut self) -> &mut [Merchant] {
        &mut self.merchants
    }

    pub fn add_merchant(&mut self, position: Position) -> usize {
        let id = self.merchants.len();
        self.merchants
            .push(Merchant::new(id, position, &self.agent_params));
        id
    }

    pub fn brokers(&self) -> &BrokerRegistry {
        &self.brokers
    }

    pub fn brokers_mut(&mut self) -> &mut BrokerRegistry {
        &mut self.brokers
    }

    /// Puts an event into effect immediately. Returns false when the
    /// settlement is already under one.
    pub fn apply_event(&mut self, id: SettlementId, kind: EventKind, duration: u32) -> bool {
        let settlement = &mut self.settlements[id.index()];
        if settlement.active_event.is_some() {
            return false;
        }
        settlement.active_event = Some(ActiveEvent::new(kind, duration));
        settlement.consumption_multiplier = kind.consumption_multiplier();
        settlement.production_multiplier = kind.production_multiplier();
        true
    }

    pub fn schedule_event(&mut self, event: PendingEvent) {
        self.scheduled_events.push(event);
    }

    pub fn scheduled_events(&self) -> &[PendingEvent] {
        &self.scheduled_events
    }

    pub fn economy(&self) -> &EconomyParams {
        &self.economy
    }

    pub fn agent_params(&self) -> &AgentParams {
        &self.agent_params
    }

    /// Spot price of one unit at a settlement. `None` when the settlement
    /// does not trade the item.
    pub fn price(&self, id: SettlementId, item: ItemId) -> Option<i64> {
        let settlement = self.settlement(id);
        let line = settlement.line(item)?;
        let base = self.catalog.get(item).base_price;
        Some(market::unit_price(
            line.stock,
            line.max_stock,
            base,
            settlement.is_producer,
        ))
    }

    /// Total proceeds of selling `amount` units into a settlement, unit by
    /// unit against the rising virtual stock.
    pub fn bulk_sell_value(&self, id: SettlementId, item: ItemId, amount: i64) -> Option<i64> {
        let settlement = self.settlement(id);
        let line = settlement.line(item)?;
        let base = self.catalog.get(item).base_price;
        Some(market::bulk_sell_value(
            line.stock,
            line.max_stock,
            base,
            settlement.is_producer,
            amount,
        ))
    }

    /// Debits `quantity` units of stock at the spot price. Returns the total
    /// cost, or `None` when the line is missing or under-stocked.
    pub fn buy_stock(&mut self, id: SettlementId, item: ItemId, quantity: i64) -> Option<i64> {
        if quantity <= 0 {
            return None;
        }
        let price = self.price(id, item)?;
        let line = self.settlements[id.index()].line_mut(item)?;
        if line.stock < quantity {
            return None;
        }
        line.stock -= quantity;
        Some(price * quantity)
    }

    /// Credits `amount` units of stock and returns the bulk-sale proceeds.
    pub fn sell_stock(&mut self, id: SettlementId, item: ItemId, amount: i64) -> Option<i64> {
        let revenue = self.bulk_sell_value(id, item, amount)?;
        let line = self.settlements[id.index()].line_mut(item)?;
        line.stock += amount;
        Some(revenue)
    }

    /// Credits stock without a sale, used when a contract pays the reward
    /// instead of market proceeds.
    pub fn deposit_stock(&mut self, id: SettlementId, item: ItemId, amount: i64) {
        if let Some(line) = self.settlements[id.index()].line_mut(item) {
            line.stock += amount;
        }
    }

    pub(crate) fn refresh_price_caches(&mut self) {
        for settlement in &mut self.settlements {
            let is_producer = settlement.is_producer;
            for line in &mut settlement.lines {
                let base = self.catalog.get(line.item).base_price;
                line.last_price =
                    market::unit_price(line.stock, line.max_stock, base, is_producer);
            }
        }
    }

    /// Restores baseline stock and population, clears events and contracts.
    /// The journal is kept so a multi-episode run stays inspectable.
    pub fn reset_episode(&mut self) {
        for settlement in &mut self.settlements {
            settlement.population = settlement.initial_population;
            settlement.consumption_multiplier = 1.0;
            settlement.production_multiplier = 1.0;
            settlement.active_event = None;
            for line in &mut settlement.lines {
                line.stock = line.initial_stock;
                line.last_consumption = 0;
            }
        }
        self.contracts.clear();
        self.scheduled_events.clear();
        let params = self.agent_params.clone();
        for merchant in &mut self.merchants {
            merchant.reset(&params);
        }
        self.refresh_price_caches();
    }

    pub fn snapshot(&self, scenario: &str, day: u64) -> WorldSnapshot {
        let settlements = self
            .settlements
            .iter()
            .map(|s| SettlementSnapshot {
                id: s.id.0,
                name: s.name.clone(),
                is_producer: s.is_producer,
                population: s.population,
                active_event: s.active_event.as_ref().map(|e| e.kind.title().to_string()),
                lines: s
                    .lines
                    .iter()
                    .map(|line| LineSnapshot {
                        item: self.catalog.get(line.item).name.clone(),
                        stock: line.stock,
                        max_stock: line.max_stock,
                        price: line.last_price,
                    })
                    .collect(),
            })
            .collect();
        let merchants = self
            .merchants
            .iter()
            .map(|m| MerchantSnapshot {
                id: m.id,
                money: m.money,
                x: m.position.x,
                y: m.position.y,
                cargo: m
                    .cargo
                    .as_ref()
                    .map(|c| (self.catalog.get(c.item).name.clone(), c.amount)),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            day,
            active_contracts: self.contracts.active_len(),
            settlements,
            merchants,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub item: String,
    pub stock: i64,
    pub max_stock: i64,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementSnapshot {
    pub id: u32,
    pub name: String,
    pub is_producer: bool,
    pub population: i64,
    pub active_event: Option<String>,
    pub lines: Vec<LineSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MerchantSnapshot {
    pub id: usize,
    pub money: f64,
    pub x: f64,
    pub y: f64,
    pub cargo: Option<(String, i64)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub day: u64,
    pub active_contracts: usize,
    pub settlements: Vec<SettlementSnapshot>,
    pub merchants: Vec<MerchantSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(
            Catalog::standard(),
            EconomyParams::default(),
            AgentParams::default(),
        )
    }

    fn init(name: &str, producer: bool) -> SettlementInit {
        SettlementInit {
            name: name.to_string(),
            is_producer: producer,
            position: Position::new(0.0, 0.0),
            population: 1000,
            min_population: 100,
            max_population: 2000,
            grow_population: false,
            dynamic_storage: false,
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut world = world();
        world.add_settlement(init("Aldern", false)).unwrap();
        let err = world.add_settlement(init("Aldern", true)).unwrap_err();
        assert!(matches!(err, SetupError::DuplicateName(_)));
    }

    #[test]
    fn sovereign_cycles_are_rejected() {
        let mut world = world();
        let a = world.add_settlement(init("A", false)).unwrap();
        let b = world.add_settlement(init("B", true)).unwrap();
        let c = world.add_settlement(init("C", true)).unwrap();
        world.set_sovereign(b, a).unwrap();
        world.set_sovereign(c, b).unwrap();
        let err = world.set_sovereign(a, c).unwrap_err();
        assert!(matches!(err, SetupError::SovereignCycle { .. }));
        // self-sovereignty is the one-node cycle
        assert!(world.set_sovereign(a, a).is_err());
    }

    #[test]
    fn buying_debits_stock_at_spot_price() {
        let mut world = world();
        let id = world.add_settlement(init("Port Vel", false)).unwrap();
        world.add_line(id, MarketLine::new(ItemId(0), 250, 500, 0));
        let spot = world.price(id, ItemId(0)).unwrap();
        let cost = world.buy_stock(id, ItemId(0), 10).unwrap();
        assert_eq!(cost, spot * 10);
        assert_eq!(world.settlement(id).line(ItemId(0)).unwrap().stock, 240);
        // more than the stock on hand is refused outright
        assert!(world.buy_stock(id, ItemId(0), 241).is_none());
    }

    #[test]
    fn reset_restores_baselines() {
        let mut world = world();
        let id = world.add_settlement(init("Aldern", true)).unwrap();
        world.add_line(id, MarketLine::new(ItemId(0), 100, 400, 12));
        {
            let s = world.settlement_mut(id);
            s.population = 55;
            s.consumption_multiplier = 3.0;
            s.line_mut(ItemId(0)).unwrap().stock = 900;
        }
        world.reset_episode();
        let s = world.settlement(id);
        assert_eq!(s.population, 1000);
        assert_eq!(s.consumption_multiplier, 1.0);
        assert_eq!(s.line(ItemId(0)).unwrap().stock, 100);
    }
}
