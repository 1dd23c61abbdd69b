//! # warden-core
//!
//! Configuration shared by Warden tools: loading `warden.yaml`, resolving key
//! material from the environment or disk, and building token issuers and
//! verifiers from it.

// Configuration types and key-source resolution
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{
    ConfigError, DefaultsConfig, InlineKeys, SigningConfig, Strategy, ValidationConfig,
    WardenConfig, parse_duration,
};
