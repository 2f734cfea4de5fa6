//! Store configuration

use crate::ecs::MAX_COMPONENTS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time knobs for a [`World`](crate::ecs::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of distinct component types the store will hand out ids for.
    pub component_capacity: usize,
    /// Slots per block in every component pool.
    pub component_block_size: usize,
    /// Slots per block in the entity record pool.
    pub entity_block_size: usize,
    /// Free slots a component pool holds back before recycling them.
    pub component_reuse_threshold: usize,
    /// Free slots the entity pool holds back before recycling them.
    pub entity_reuse_threshold: usize,
}

impl StoreConfig {
    pub const DEFAULT_COMPONENT_CAPACITY: usize = 64;
    pub const DEFAULT_BLOCK_SIZE: usize = 8192;
    pub const DEFAULT_ENTITY_REUSE_THRESHOLD: usize = 1024;

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.component_capacity == 0 || self.component_capacity > MAX_COMPONENTS {
            return Err(ConfigError::ComponentCapacity {
                requested: self.component_capacity,
                max: MAX_COMPONENTS,
            });
        }
        check_block_size("component", self.component_block_size)?;
        check_block_size("entity", self.entity_block_size)
    }
}

/// Slot indices inside a block are `u32`.
const MAX_BLOCK_SIZE: usize = u32::MAX as usize;

fn check_block_size(pool: &'static str, size: usize) -> Result<(), ConfigError> {
    if size == 0 {
        return Err(ConfigError::ZeroBlockSize { pool });
    }
    if size > MAX_BLOCK_SIZE {
        return Err(ConfigError::BlockSizeTooLarge {
            pool,
            requested: size,
            max: MAX_BLOCK_SIZE,
        });
    }
    Ok(())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            component_capacity: Self::DEFAULT_COMPONENT_CAPACITY,
            component_block_size: Self::DEFAULT_BLOCK_SIZE,
            entity_block_size: Self::DEFAULT_BLOCK_SIZE,
            component_reuse_threshold: 0,
            entity_reuse_threshold: Self::DEFAULT_ENTITY_REUSE_THRESHOLD,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("component capacity {requested} is outside 1..={max}")]
    ComponentCapacity { requested: usize, max: usize },

    #[error("{pool} pool block size must be non-zero")]
    ZeroBlockSize { pool: &'static str },

    #[error("{pool} pool block size {requested} exceeds {max}")]
    BlockSizeTooLarge {
        pool: &'static str,
        requested: usize,
        max: usize,
    },

    #[error("invalid store configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
