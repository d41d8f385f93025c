//! Worker Lambda handler and lock-guarded photo processing

pub mod deliver;
pub mod handler;
pub mod processor;

// Re-export the main handler for convenience
pub use handler::handler;
pub use processor::{Admission, Processor};
