// src/lib.rs
pub mod bridge;
pub mod chain;
pub mod config;
pub mod error;
pub mod orchestration;
pub mod results;
pub mod swap;
pub mod types;

pub use error::{BridgeError, BridgeResult};
pub use orchestration::Orchestrator;
pub use swap::SwapWorkflow;
pub use types::{RunnerConfig, SwapOutcome};
