//! Entity handle with generational index
//!
//! Entities are small copyable handles into the World's record pool.
//! The generation counter prevents use-after-free bugs.

use crate::ecs::{ArchetypeIdx, ArchetypeRegistry, ComponentId, ComponentMask};
use crate::pool::SlotHandle;
use std::sync::atomic::{AtomicU32, Ordering};

pub type Generation = u32;

/// Identity of the [`World`](crate::ecs::World) that issued a handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WorldId(u32);

impl WorldId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Entity handle (generation-checked)
///
/// - Slot: position of the entity record in the world's record pool
/// - Generation: incremented every time that slot's entity is destroyed
///
/// Example:
/// ```ignore
/// let entity = world.create();
/// world.destroy(entity);
/// assert!(!world.valid(entity)); // generation mismatch
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    world: WorldId,
    slot: SlotHandle,
    generation: Generation,
}

impl Entity {
    pub(crate) const fn new(world: WorldId, slot: SlotHandle, generation: Generation) -> Self {
        Self {
            world,
            slot,
            generation,
        }
    }

    #[inline]
    pub fn world(&self) -> WorldId {
        self.world
    }

    #[inline]
    pub fn slot(&self) -> SlotHandle {
        self.slot
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Per-entity bookkeeping owned by the world.
///
/// `components` holds one slot handle per set bit of `mask`, ordered by the
/// dense indices of the connected archetype.
pub(crate) struct EntityRecord {
    pub mask: ComponentMask,
    pub archetype: ArchetypeIdx,
    pub components: Vec<SlotHandle>,
}

impl EntityRecord {
    pub fn new(mask: ComponentMask, archetype: ArchetypeIdx, components: Vec<SlotHandle>) -> Self {
        debug_assert_eq!(components.len(), mask.count());
        Self {
            mask,
            archetype,
            components,
        }
    }

    /// Slot of component `id` within its storage, if present.
    #[inline]
    pub fn slot_of(&self, archetypes: &ArchetypeRegistry, id: ComponentId) -> Option<SlotHandle> {
        if !self.mask.contains(id) {
            return None;
        }
        let dense = archetypes.get(self.archetype).dense_index(id)?;
        Some(self.components[dense])
    }

    /// Add freshly stored components to this record.
    ///
    /// `staged` must be sorted by id, free of duplicates and disjoint from
    /// the current mask. Handles are inserted in ascending id order, so each
    /// one lands on the dense index the new descriptor assigns it.
    pub fn attach(
        &mut self,
        archetypes: &mut ArchetypeRegistry,
        staged: &[(ComponentId, SlotHandle)],
    ) -> Transition {
        if staged.is_empty() {
            return Transition::default();
        }
        let released = archetypes.disconnect(self);
        for &(id, _) in staged {
            debug_assert!(!self.mask.contains(id));
            self.mask.insert(id);
        }
        let created = archetypes.connect(self);

        let archetype = archetypes.get(self.archetype);
        self.components.reserve(staged.len());
        for &(id, slot) in staged {
            let dense = archetype
                .dense_index(id)
                .expect("descriptor lacks a component present in its mask");
            self.components.insert(dense, slot);
        }
        debug_assert_eq!(self.components.len(), self.mask.count());
        Transition { created, released }
    }

    /// Take component `id` out of this record and return its slot.
    pub fn detach(
        &mut self,
        archetypes: &mut ArchetypeRegistry,
        id: ComponentId,
    ) -> Option<(SlotHandle, Transition)> {
        if !self.mask.contains(id) {
            return None;
        }
        let dense = archetypes.get(self.archetype).dense_index(id)?;
        let slot = self.components.remove(dense);
        let released = archetypes.disconnect(self);
        self.mask.remove(id);
        let created = archetypes.connect(self);
        Some((slot, Transition { created, released }))
    }
}

/// Descriptor churn caused by one mask change.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Transition {
    pub created: bool,
    pub released: bool,
}

/// Generation and liveness of one entity slot.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct SlotState {
    pub generation: Generation,
    pub alive: bool,
}
