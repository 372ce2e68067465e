//! Advancing a markdown build plan one checklist item at a time
pub mod agent;
pub mod checklist;
pub mod tracker;

pub use agent::ImplementationAgent;
pub use tracker::{MilestoneOutcome, MilestoneTracker};
