//! Specialist agents and the orchestrator.

pub mod classifier;
pub mod information_agent;
pub mod orchestrator;
pub mod rescue_agent;
pub mod resource_agent;
pub mod specialist;

pub use information_agent::InformationAgent;
pub use orchestrator::Orchestrator;
pub use rescue_agent::RescueAgent;
pub use resource_agent::{ContactLookup, ResourceAgent};
pub use specialist::Specialist;
