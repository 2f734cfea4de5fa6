// storage.rs - Per-component-type pools behind one type-erased table
//
// Slot `i` of the table holds the storage for component id `i`. Storages are
// created the first time a type is registered with the owning world.

use crate::ecs::{Component, ComponentId, ComponentRegistry, StoreError};
use crate::pool::{Pool, SlotHandle};
use std::any::Any;

/// Type-erased view of a component storage.
///
/// Lets the world tear down components knowing only their id, which is all
/// an entity's mask tells it.
pub(crate) trait ComponentStorage: Any {
    /// Destroy the value (or value chain) rooted at `slot`.
    ///
    /// # Safety
    /// `slot` must refer to a live value in this storage.
    unsafe fn destroy_slot(&mut self, slot: SlotHandle);

    /// Number of live values.
    fn live(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ComponentStorage for Pool<T> {
    unsafe fn destroy_slot(&mut self, slot: SlotHandle) {
        // SAFETY: forwarded to the caller.
        unsafe { self.destroy(slot) }
    }

    fn live(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All component storages of one world, indexed by component id.
pub struct Storages {
    tables: Vec<Option<Box<dyn ComponentStorage>>>,
    block_size: usize,
    reuse_threshold: usize,
}

impl Storages {
    pub(crate) fn new(capacity: usize, block_size: usize, reuse_threshold: usize) -> Self {
        Self {
            tables: (0..capacity).map(|_| None).collect(),
            block_size,
            reuse_threshold,
        }
    }

    /// Register `T` and make sure its pool exists.
    pub(crate) fn register<T: Component>(
        &mut self,
        registry: &mut ComponentRegistry,
    ) -> Result<ComponentId, StoreError> {
        let id = registry.id_of::<T>(T::NAME)?;
        let (block_size, reuse) = (self.block_size, self.reuse_threshold);
        self.ensure(id, || Pool::<T>::new(block_size, reuse));
        Ok(id)
    }

    /// Install the storage for `id` unless one is already there.
    pub(crate) fn ensure<S: ComponentStorage>(&mut self, id: ComponentId, make: impl FnOnce() -> S) {
        let entry = &mut self.tables[id as usize];
        if entry.is_none() {
            *entry = Some(Box::new(make()));
        }
    }

    #[inline]
    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub(crate) fn reuse_threshold(&self) -> usize {
        self.reuse_threshold
    }

    #[inline]
    pub(crate) fn get<S: ComponentStorage>(&self, id: ComponentId) -> &S {
        self.tables[id as usize]
            .as_ref()
            .and_then(|s| s.as_any().downcast_ref::<S>())
            .expect("component id is bound to a different storage type")
    }

    #[inline]
    pub(crate) fn get_mut<S: ComponentStorage>(&mut self, id: ComponentId) -> &mut S {
        self.tables[id as usize]
            .as_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<S>())
            .expect("component id is bound to a different storage type")
    }

    #[inline]
    pub(crate) fn pool<T: 'static>(&self, id: ComponentId) -> &Pool<T> {
        self.get::<Pool<T>>(id)
    }

    #[inline]
    pub(crate) fn pool_mut<T: 'static>(&mut self, id: ComponentId) -> &mut Pool<T> {
        self.get_mut::<Pool<T>>(id)
    }

    /// Raw pointer to the pool for `id`, reached without borrowing the other
    /// entries of the table. Used to hand out disjoint `&mut` into several
    /// pools at once.
    ///
    /// # Safety
    /// `this` must be valid for the duration of the call and no live
    /// reference may alias entry `id`.
    pub(crate) unsafe fn pool_ptr<T: 'static>(this: *mut Self, id: ComponentId) -> *mut Pool<T> {
        // SAFETY: `this` is valid per the caller; only entry `id` is touched.
        unsafe {
            let entry = &mut *(*this).tables.as_mut_ptr().add(id as usize);
            entry
                .as_mut()
                .and_then(|s| s.as_any_mut().downcast_mut::<Pool<T>>())
                .expect("component id is bound to a different storage type")
                as *mut Pool<T>
        }
    }

    /// # Safety
    /// `slot` must be live in the storage for `id`.
    #[inline]
    pub(crate) unsafe fn destroy(&mut self, id: ComponentId, slot: SlotHandle) {
        if let Some(storage) = self.tables[id as usize].as_mut() {
            // SAFETY: forwarded to the caller.
            unsafe { storage.destroy_slot(slot) };
        }
    }

    /// Live values stored under `id`, zero if the storage was never created.
    pub(crate) fn live(&self, id: ComponentId) -> usize {
        self.tables[id as usize].as_ref().map_or(0, |s| s.live())
    }
}
