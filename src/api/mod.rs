//! Webhook Lambda handler, orchestration, and delegation

pub mod gateway;
pub mod handler;
pub mod helpers;
pub mod orchestrator;
pub mod parsing;

// Re-export the main handler for convenience
pub use handler::handler;
pub use orchestrator::Orchestrator;
