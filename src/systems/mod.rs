mod agents;
mod contracts;
mod events;
mod market;

pub use agents::AgentSystem;
pub use contracts::ContractSystem;
pub use events::EventSystem;
pub use market::MarketSystem;
