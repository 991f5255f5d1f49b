//! Run orchestrator.
//!
//! A run picks one uncached catalog asset of the requested tier, stages it,
//! sweeps the staging folder into the distribution channel, then derives an
//! excerpt from a staged video and posts it to the public feed. What happens
//! to staged files afterwards depends on the excerpt and publish outcomes.

mod config;
mod runner;
mod types;

pub use config::{OrchestratorConfig, EXCERPT_SUBDIR};
pub use runner::Orchestrator;
pub use types::{OrchestratorError, RunReport, RunStatus};
