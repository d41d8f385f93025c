//! Vision description and speech conversion collaborators

pub mod speech;
pub mod vision;

// Re-export main types for convenience
pub use speech::SpeechClient;
pub use vision::VisionClient;
