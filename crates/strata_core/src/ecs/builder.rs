use crate::ecs::storage::Storages;
use crate::ecs::{Component, ComponentId, ComponentRegistry, StoreError, WorldId};
use crate::pool::SlotHandle;
use std::fmt;
use std::marker::PhantomData;

/// A component value already placed in a world's storage but not yet
/// attached to any entity.
///
/// Produced by [`World::instantiate`](crate::ecs::World::instantiate). Hand it
/// to [`World::attach`](crate::ecs::World::attach), an
/// [`EntityBuilder`], or [`World::discard`](crate::ecs::World::discard);
/// dropping it leaks the stored value until the world is dropped.
#[must_use = "a prebuilt component stays in storage until attached or discarded"]
pub struct Prebuilt<T: Component> {
    pub(crate) world: WorldId,
    pub(crate) id: ComponentId,
    pub(crate) slot: SlotHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Prebuilt<T> {
    pub(crate) fn new(world: WorldId, id: ComponentId, slot: SlotHandle) -> Self {
        Self {
            world,
            id,
            slot,
            _marker: PhantomData,
        }
    }

    /// World whose storage holds the value.
    #[inline]
    pub fn world(&self) -> WorldId {
        self.world
    }
}

impl<T: Component> fmt::Debug for Prebuilt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prebuilt")
            .field("component", &T::NAME)
            .field("world", &self.world)
            .field("slot", &self.slot)
            .finish()
    }
}

/// One queued builder entry, type-erased.
pub(crate) trait PendingComponent {
    fn name(&self) -> &'static str;

    /// Resolve the component id, registering the type if needed.
    fn prepare(
        &self,
        world: WorldId,
        storages: &mut Storages,
        registry: &mut ComponentRegistry,
    ) -> Result<ComponentId, StoreError>;

    /// Place the value in storage and return its slot.
    fn store(self: Box<Self>, storages: &mut Storages, id: ComponentId) -> SlotHandle;

    /// Throw the entry away, freeing any storage it already occupies in `world`.
    fn discard(self: Box<Self>, world: WorldId, storages: &mut Storages);
}

struct PendingValue<T>(T);

impl<T: Component> PendingComponent for PendingValue<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn prepare(
        &self,
        _world: WorldId,
        storages: &mut Storages,
        registry: &mut ComponentRegistry,
    ) -> Result<ComponentId, StoreError> {
        storages.register::<T>(registry)
    }

    fn store(self: Box<Self>, storages: &mut Storages, id: ComponentId) -> SlotHandle {
        storages.pool_mut::<T>(id).add(self.0)
    }

    fn discard(self: Box<Self>, _world: WorldId, _storages: &mut Storages) {}
}

struct PendingPrebuilt<T: Component>(Prebuilt<T>);

impl<T: Component> PendingComponent for PendingPrebuilt<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn prepare(
        &self,
        world: WorldId,
        _storages: &mut Storages,
        _registry: &mut ComponentRegistry,
    ) -> Result<ComponentId, StoreError> {
        if self.0.world != world {
            return Err(StoreError::ForeignHandle { component: T::NAME });
        }
        Ok(self.0.id)
    }

    fn store(self: Box<Self>, _storages: &mut Storages, _id: ComponentId) -> SlotHandle {
        self.0.slot
    }

    fn discard(self: Box<Self>, world: WorldId, storages: &mut Storages) {
        if self.0.world == world {
            // SAFETY: a prebuilt of this world owns a live, unattached slot.
            unsafe { storages.destroy(self.0.id, self.0.slot) };
        }
    }
}

/// Collects components of mixed origin for [`World::spawn`](crate::ecs::World::spawn).
///
/// ```ignore
/// let player = world.spawn(
///     EntityBuilder::new()
///         .with(Position { x: 0.0, y: 0.0 })
///         .with_prebuilt(shared_sprite),
/// )?;
/// ```
#[derive(Default)]
pub struct EntityBuilder {
    pub(crate) entries: Vec<Box<dyn PendingComponent>>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Queue a component by value.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.entries.push(Box::new(PendingValue(value)));
        self
    }

    /// Queue a component that was instantiated ahead of time.
    pub fn with_prebuilt<T: Component>(mut self, prebuilt: Prebuilt<T>) -> Self {
        self.entries.push(Box::new(PendingPrebuilt(prebuilt)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EntityBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.name()))
            .finish()
    }
}
