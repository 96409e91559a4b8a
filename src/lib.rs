pub mod agent;
pub mod broker;
pub mod contracts;
pub mod engine;
pub mod events;
pub mod items;
pub mod journal;
pub mod market;
pub mod nav;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use agent::{AgentParams, EpisodeOutcome, Merchant, MerchantState};
pub use engine::{Calendar, DayReport, Engine, EngineBuilder, EngineSettings, System};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{SettlementId, SetupError, World};
