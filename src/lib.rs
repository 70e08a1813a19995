// kpstat Library - Public API

// Re-export error types
pub mod error;
pub use error::{KpError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use core::config::SamplerConfig;
pub use core::telemetry::{Sampler, SamplerRuntime, Snapshot};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
