//! Strata Core
//!
//! Pooled storage engine for entities and their components:
//! - Block pools with stable addresses and deferred slot reuse
//! - Per-world component registry and shared archetype descriptors
//! - Generation-checked entity handles
//! - Bundle, builder and batch creation
//! - Multi-value (chained) components and handle-list iteration

pub mod config;
pub mod ecs;
pub mod pool;

pub use config::{ConfigError, StoreConfig};
pub use ecs::{Component, Entity, StoreError, World};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
