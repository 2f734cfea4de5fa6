//! Entity Component System core types.
//!
//! Entities are generation-checked handles into a pooled record table.
//! Each record lists the storage slots of its components in the dense order
//! given by the archetype descriptor shared by every entity with the same
//! component set. Component values live in one block pool per type and never
//! move once stored.

mod archetype;
mod batch;
mod builder;
mod bundle;
mod chain;
mod component;
mod entity;
mod error;
mod macros;
mod query;
mod storage;
mod world;

pub use archetype::{
    Archetype, ArchetypeIdx, ArchetypeRegistry, ComponentMask, DenseIndex, MaskIter,
    MAX_COMPONENTS,
};
pub use builder::{EntityBuilder, Prebuilt};
pub use bundle::Bundle;
pub use chain::{Link, Links};
pub use component::{Component, ComponentId, ComponentRegistry};
pub use entity::{Entity, Generation, WorldId};
pub(crate) use entity::EntityRecord;
pub use error::StoreError;
pub use query::Query;
pub use world::World;
