use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentParams, Merchant},
    broker::{cluster_around, Broker, BrokerParams, BrokerRegistry},
    items::{Catalog, Item},
    nav::Position,
    rng::RngManager,
    world::{EconomyParams, MarketLine, SetupError, SettlementInit, World},
};

fn default_days() -> u64 {
    360
}

fn default_snapshot_interval_days() -> u64 {
    30
}

fn default_population() -> i64 {
    1000
}

fn default_min_population() -> i64 {
    100
}

fn default_max_population() -> i64 {
    2000
}

fn default_producer_max_stock() -> i64 {
    400
}

fn default_consumer_max_stock() -> i64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_days")]
    pub days: u64,
    #[serde(default = "default_snapshot_interval_days")]
    pub snapshot_interval_days: u64,
    #[serde(default)]
    pub economy: EconomyParams,
    #[serde(default)]
    pub agents: AgentParams,
    #[serde(default)]
    pub broker_params: BrokerParams,
    /// Custom catalog; the standard twelve goods when omitted.
    #[serde(default)]
    pub items: Option<Vec<ItemSpec>>,
    pub settlements: Vec<SettlementSpec>,
    #[serde(default)]
    pub brokers: Vec<BrokerSpec>,
    #[serde(default)]
    pub merchants: Vec<MerchantSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub base_price: i64,
    pub daily_base_consumption: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub producer: bool,
    #[serde(default = "default_population")]
    pub population: i64,
    #[serde(default = "default_min_population")]
    pub min_population: i64,
    #[serde(default = "default_max_population")]
    pub max_population: i64,
    #[serde(default)]
    pub grow_population: bool,
    #[serde(default)]
    pub dynamic_storage: bool,
    /// Name of the settlement collecting this one's production tax.
    #[serde(default)]
    pub sovereign: Option<String>,
    pub trades: Vec<TradeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSpec {
    pub item: String,
    /// Units produced per day; drawn uniformly from 10..20 for producers
    /// when omitted.
    #[serde(default)]
    pub production: Option<i64>,
    /// Starting stock; drawn uniformly from 30-50% of capacity when
    /// omitted.
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub max_stock: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub serviced: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantSpec {
    pub x: f64,
    pub y: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn build_world(&self) -> Result<World> {
        let catalog = match &self.items {
            Some(specs) => Catalog::new(
                specs
                    .iter()
                    .map(|spec| Item {
                        name: spec.name.clone(),
                        base_price: spec.base_price,
                        daily_base_consumption: spec.daily_base_consumption,
                    })
                    .collect(),
            ),
            None => Catalog::standard(),
        };
        let mut world = World::new(catalog, self.economy.clone(), self.agents.clone());
        let mut worldgen = RngManager::new(self.seed).stream("worldgen", 0);

        for spec in &self.settlements {
            let id = world.add_settlement(SettlementInit {
                name: spec.name.clone(),
                is_producer: spec.producer,
                position: Position::new(spec.x, spec.y),
                population: spec.population,
                min_population: spec.min_population,
                max_population: spec.max_population,
                grow_population: spec.grow_population,
                dynamic_storage: spec.dynamic_storage,
            })?;
            for trade in &spec.trades {
                let item = world
                    .catalog()
                    .by_name(&trade.item)
                    .ok_or_else(|| SetupError::UnknownItem(trade.item.clone()))?;
                let max_stock = trade.max_stock.unwrap_or_else(|| {
                    if spec.dynamic_storage {
                        self.economy.storage_base
                            + spec.population / self.economy.storage_per_pop
                    } else if spec.producer {
                        default_producer_max_stock()
                    } else {
                        default_consumer_max_stock()
                    }
                });
                let stock = trade.stock.unwrap_or_else(|| {
                    (max_stock as f64 * worldgen.gen_range(0.3..0.5)).round() as i64
                });
                let production = trade.production.unwrap_or_else(|| {
                    if spec.producer {
                        worldgen.gen_range(10..20)
                    } else {
                        0
                    }
                });
                world.add_line(id, MarketLine::new(item, stock, max_stock, production));
            }
        }

        for spec in &self.settlements {
            if let Some(sovereign_name) = &spec.sovereign {
                let satellite = world
                    .settlement_by_name(&spec.name)
                    .map(|s| s.id())
                    .ok_or_else(|| SetupError::UnknownSettlement(spec.name.clone()))?;
                let sovereign = world
                    .settlement_by_name(sovereign_name)
                    .map(|s| s.id())
                    .ok_or_else(|| SetupError::UnknownSettlement(sovereign_name.clone()))?;
                world.set_sovereign(satellite, sovereign)?;
            }
        }

        let mut registry = BrokerRegistry::new(self.broker_params.clone());
        for spec in &self.brokers {
            // a broker with no listed settlements gets a cluster built for
            // it and moves to the cluster's centroid
            let (serviced, position) = if spec.serviced.is_empty() {
                cluster_around(Position::new(spec.x, spec.y), world.settlements())
            } else {
                let mut serviced = Vec::new();
                for name in &spec.serviced {
                    let id = world
                        .settlement_by_name(name)
                        .map(|s| s.id())
                        .ok_or_else(|| SetupError::UnknownSettlement(name.clone()))?;
                    serviced.push(id);
                }
                (serviced, Position::new(spec.x, spec.y))
            };
            registry.add(Broker {
                name: spec.name.clone(),
                position,
                serviced,
            });
        }
        world.brokers = registry;

        for (index, spec) in self.merchants.iter().enumerate() {
            world.merchants.push(Merchant::new(
                index,
                Position::new(spec.x, spec.y),
                &self.agents,
            ));
        }

        world.refresh_price_caches();
        Ok(world)
    }

    pub fn days(&self, override_days: Option<u64>) -> u64 {
        override_days.unwrap_or(self.days)
    }

    /// Small hand-laid map for training runs: four producer villages and
    /// five consumer towns around a guild broker, one merchant.
    pub fn training_run() -> Self {
        let village = |name: &str, x: f64, y: f64, item: &str, sovereign: Option<&str>| {
            SettlementSpec {
                name: name.to_string(),
                x,
                y,
                producer: true,
                population: 600,
                min_population: 100,
                max_population: 1200,
                grow_population: false,
                dynamic_storage: false,
                sovereign: sovereign.map(|s| s.to_string()),
                trades: vec![TradeSpec {
                    item: item.to_string(),
                    production: None,
                    stock: None,
                    max_stock: None,
                }],
            }
        };
        let town = |name: &str, x: f64, y: f64, items: &[&str]| SettlementSpec {
            name: name.to_string(),
            x,
            y,
            producer: false,
            population: 1500,
            min_population: 200,
            max_population: 3000,
            grow_population: false,
            dynamic_storage: false,
            sovereign: None,
            trades: items
                .iter()
                .map(|item| TradeSpec {
                    item: item.to_string(),
                    production: None,
                    stock: None,
                    max_stock: None,
                })
                .collect(),
        };
        Self {
            name: "training_run".to_string(),
            description: Some("Nine-settlement training map".to_string()),
            seed: 7,
            days: default_days(),
            snapshot_interval_days: default_snapshot_interval_days(),
            economy: EconomyParams::default(),
            agents: AgentParams::default(),
            broker_params: BrokerParams::default(),
            items: None,
            settlements: vec![
                town("Aldern", 0.0, 0.0, &["wheat", "wood", "iron", "cotton"]),
                town("Port Vel", 60.0, 10.0, &["wheat", "coal", "cotton"]),
                town("Carth", -50.0, 35.0, &["wood", "iron", "coal"]),
                town("Mirefall", 20.0, -55.0, &["wheat", "wood", "coal"]),
                town("Sunmere", -25.0, -30.0, &["wheat", "iron", "cotton"]),
                village("Wheatfield", 15.0, 25.0, "wheat", Some("Aldern")),
                village("Timberline", -30.0, 15.0, "wood", Some("Aldern")),
                village("Ironhollow", 45.0, -20.0, "iron", Some("Port Vel")),
                village("Cotton Row", -10.0, 50.0, "cotton", None),
            ],
            brokers: vec![BrokerSpec {
                name: "Training Guild".to_string(),
                x: 5.0,
                y: 5.0,
                // the training guild serves the whole map
                serviced: [
                    "Aldern",
                    "Port Vel",
                    "Carth",
                    "Mirefall",
                    "Sunmere",
                    "Wheatfield",
                    "Timberline",
                    "Ironhollow",
                    "Cotton Row",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }],
            merchants: vec![MerchantSpec { x: 0.0, y: 0.0 }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_run_builds() {
        let scenario = Scenario::training_run();
        let world = scenario.build_world().unwrap();
        assert_eq!(world.settlements().len(), 9);
        assert_eq!(world.merchants().len(), 1);
        assert_eq!(world.brokers().brokers().len(), 1);
        let wheatfield = world.settlement_by_name("Wheatfield").unwrap();
        assert!(wheatfield.is_producer());
        assert!(wheatfield.sovereign().is_some());
        for line in wheatfield.lines() {
            assert!(line.stock > 0);
            assert!(line.daily_production >= 10);
        }
    }

    #[test]
    fn a_broker_without_a_listed_cluster_gets_one_assigned() {
        let mut scenario = Scenario::training_run();
        scenario.brokers[0].serviced = Vec::new();
        let world = scenario.build_world().unwrap();
        let broker = &world.brokers().brokers()[0];
        let names: Vec<&str> = broker
            .serviced
            .iter()
            .map(|id| world.settlement(*id).name())
            .collect();
        assert_eq!(names, ["Aldern", "Wheatfield", "Timberline", "Sunmere"]);
        // the broker relocates to the cluster centroid
        assert!((broker.position.x + 10.0).abs() < 1e-9);
        assert!((broker.position.y - 2.5).abs() < 1e-9);
    }

    #[test]
    fn yaml_round_trip() {
        let scenario = Scenario::training_run();
        let encoded = serde_yaml::to_string(&scenario).unwrap();
        let decoded: Scenario = serde_yaml::from_str(&encoded).unwrap();
        assert_eq!(decoded.name, scenario.name);
        assert_eq!(decoded.seed, scenario.seed);
        assert_eq!(decoded.settlements.len(), scenario.settlements.len());
    }

    #[test]
    fn unknown_item_fails_setup() {
        let mut scenario = Scenario::training_run();
        scenario.settlements[0].trades[0].item = "unobtainium".to_string();
        let err = scenario.build_world().unwrap_err();
        assert!(err.to_string().contains("unobtainium"));
    }

    #[test]
    fn unknown_sovereign_fails_setup() {
        let mut scenario = Scenario::training_run();
        scenario.settlements[5].sovereign = Some("Atlantis".to_string());
        let err = scenario.build_world().unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn world_build_is_deterministic() {
        let scenario = Scenario::training_run();
        let a = scenario.build_world().unwrap();
        let b = scenario.build_world().unwrap();
        for (sa, sb) in a.settlements().iter().zip(b.settlements()) {
            for (la, lb) in sa.lines().iter().zip(sb.lines()) {
                assert_eq!(la.stock, lb.stock);
                assert_eq!(la.daily_production, lb.daily_production);
            }
        }
    }
}
