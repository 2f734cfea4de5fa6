use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by [`World`](crate::ecs::World) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Every component id this store can issue is taken. Ids are never
    /// reclaimed, so the only remedy is a store with a larger capacity.
    #[error("cannot register component '{component}': all {capacity} component ids are in use")]
    CapacityExceeded {
        component: &'static str,
        capacity: usize,
    },

    #[error("prebuilt component '{component}' belongs to a different store")]
    ForeignHandle { component: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
