// chain.rs - Components holding several values per entity
//
// The entity's dense slot points at the head link. Each link stores the slot
// of the next value of the same type, so the whole chain lives in one pool.

use crate::ecs::storage::ComponentStorage;
use crate::ecs::{Component, ComponentId, Entity, StoreError, World};
use crate::pool::{Pool, SlotHandle};
use std::any::Any;

/// One value of a chained component.
#[derive(Debug)]
pub struct Link<T> {
    value: T,
    next: Option<SlotHandle>,
}

impl<T> Link<T> {
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Storage slot of the next value, `None` at the tail.
    #[inline]
    pub fn next(&self) -> Option<SlotHandle> {
        self.next
    }
}

/// Pool of links for one chained component type.
pub(crate) struct Chain<T> {
    links: Pool<Link<T>>,
}

impl<T> Chain<T> {
    fn new(block_size: usize, reuse_threshold: usize) -> Self {
        Self {
            links: Pool::new(block_size, reuse_threshold),
        }
    }

    /// Store `values` as a chain and return the head slot.
    ///
    /// Links are placed tail first so each one already knows its successor.
    fn build(&mut self, values: Vec<T>) -> Option<SlotHandle> {
        let mut next = None;
        for value in values.into_iter().rev() {
            next = Some(self.links.add(Link { value, next }));
        }
        next
    }
}

impl<T: 'static> ComponentStorage for Chain<T> {
    unsafe fn destroy_slot(&mut self, head: SlotHandle) {
        let mut cursor = Some(head);
        while let Some(slot) = cursor {
            // SAFETY: every link reachable from a live head is live.
            unsafe {
                cursor = self.links.get(slot).next;
                self.links.destroy(slot);
            }
        }
    }

    fn live(&self) -> usize {
        self.links.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Walks one entity's chain from head to tail.
pub struct Links<'w, T> {
    links: Option<&'w Pool<Link<T>>>,
    cursor: Option<SlotHandle>,
}

impl<'w, T> Iterator for Links<'w, T> {
    type Item = &'w Link<T>;

    fn next(&mut self) -> Option<&'w Link<T>> {
        let slot = self.cursor?;
        let links = self.links?;
        // SAFETY: the world is borrowed for 'w, so the chain cannot change.
        let link = unsafe { links.get(slot) };
        self.cursor = link.next;
        Some(link)
    }
}

impl World {
    fn chain_id<T: Component>(&mut self) -> Result<ComponentId, StoreError> {
        let id = self.registry.id_of::<Link<T>>(T::NAME)?;
        let (block_size, reuse) = (
            self.storages.block_size(),
            self.storages.reuse_threshold(),
        );
        self.storages
            .ensure(id, || Chain::<T>::new(block_size, reuse));
        Ok(id)
    }

    /// Attach several `T` values to `entity` in one step.
    ///
    /// Returns `Ok(false)` and drops `values` if the entity already holds a
    /// `T` chain or `values` is empty.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn add_many<T: Component>(
        &mut self,
        entity: Entity,
        values: impl IntoIterator<Item = T>,
    ) -> Result<bool, StoreError> {
        let id = self.chain_id::<T>()?;
        if self.record(entity).mask.contains(id) {
            return Ok(false);
        }
        let values: Vec<T> = values.into_iter().collect();
        let Some(head) = self.storages.get_mut::<Chain<T>>(id).build(values) else {
            return Ok(false);
        };
        self.attach_staged(entity, vec![(id, head)]);
        Ok(true)
    }

    /// Whether `entity` holds a `T` chain. Stale handles hold nothing.
    pub fn has_many<T: Component>(&self, entity: Entity) -> bool {
        match self.registry.lookup::<Link<T>>() {
            Some(id) => self.valid(entity) && self.record(entity).mask.contains(id),
            None => false,
        }
    }

    /// Links of `entity`'s `T` chain, head first. Empty if it has none.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn links<T: Component>(&self, entity: Entity) -> Links<'_, T> {
        let record = self.record(entity);
        let Some(id) = self.registry.lookup::<Link<T>>() else {
            return Links {
                links: None,
                cursor: None,
            };
        };
        Links {
            links: Some(&self.storages.get::<Chain<T>>(id).links),
            cursor: record.slot_of(&self.archetypes, id),
        }
    }

    /// Values of `entity`'s `T` chain, head first.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn values<T: Component>(&self, entity: Entity) -> impl Iterator<Item = &T> + '_ {
        self.links::<T>(entity).map(Link::value)
    }

    /// Visit every value of `entity`'s `T` chain mutably, head first.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn for_each_value_mut<T: Component>(&mut self, entity: Entity, mut f: impl FnMut(&mut T)) {
        let Some(id) = self.registry.lookup::<Link<T>>() else {
            return;
        };
        let mut cursor = self.record(entity).slot_of(&self.archetypes, id);
        let links = &mut self.storages.get_mut::<Chain<T>>(id).links;
        while let Some(slot) = cursor {
            // SAFETY: every link reachable from a live head is live.
            let link = unsafe { links.get_mut(slot) };
            f(&mut link.value);
            cursor = link.next;
        }
    }

    /// Detach `entity`'s `T` chain and destroy every value in it.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn remove_many<T: Component>(&mut self, entity: Entity) -> bool {
        self.assert_valid(entity);
        match self.registry.lookup::<Link<T>>() {
            Some(id) => self.remove_id(entity, id),
            None => false,
        }
    }

    /// Number of live `T` values held in chains.
    pub fn live_values<T: Component>(&self) -> usize {
        self.registry
            .lookup::<Link<T>>()
            .map_or(0, |id| self.storages.live(id))
    }
}
