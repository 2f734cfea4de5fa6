// world.rs - Entity store: records, generations and component attachment

use crate::config::StoreConfig;
use crate::ecs::builder::{EntityBuilder, Prebuilt};
use crate::ecs::bundle::{keep_plan, Bundle};
use crate::ecs::entity::{EntityRecord, SlotState, Transition};
use crate::ecs::storage::Storages;
use crate::ecs::{
    ArchetypeRegistry, Component, ComponentId, ComponentMask, ComponentRegistry, Entity,
    StoreError, WorldId,
};
use crate::pool::{Pool, SlotHandle};
use strata_metrics::Counter;

/// The entity store.
///
/// Owns every entity record, every component value and the descriptors
/// shared between them. Handles issued by one world are never valid in
/// another.
pub struct World {
    id: WorldId,
    config: StoreConfig,
    pub(crate) registry: ComponentRegistry,
    pub(crate) archetypes: ArchetypeRegistry,
    pub(crate) entities: Pool<EntityRecord>,
    pub(crate) slots: Vec<SlotState>,
    pub(crate) storages: Storages,
    pub(crate) counters: Counter,
}

impl World {
    /// Create an empty world with the default configuration.
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Create an empty world after validating `config`.
    pub fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        let id = WorldId::next();
        tracing::debug!(
            world = ?id,
            component_capacity = config.component_capacity,
            entity_block_size = config.entity_block_size,
            component_block_size = config.component_block_size,
            "world created"
        );
        Self {
            id,
            registry: ComponentRegistry::new(config.component_capacity),
            archetypes: ArchetypeRegistry::new(config.component_capacity),
            entities: Pool::new(config.entity_block_size, config.entity_reuse_threshold),
            slots: Vec::new(),
            storages: Storages::new(
                config.component_capacity,
                config.component_block_size,
                config.component_reuse_threshold,
            ),
            counters: Counter::new(),
            config,
        }
    }

    #[inline]
    pub fn id(&self) -> WorldId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Event counters. Always zero unless built with the `metrics` feature.
    #[inline]
    pub fn metrics(&self) -> &Counter {
        &self.counters
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Create an entity with no components.
    pub fn create(&mut self) -> Entity {
        let (archetype, created) = self.archetypes.acquire(ComponentMask::EMPTY);
        self.note(Transition {
            created,
            released: false,
        });
        self.insert_record(EntityRecord::new(ComponentMask::EMPTY, archetype, Vec::new()))
    }

    /// Create an entity carrying every component of `bundle`.
    ///
    /// If the tuple repeats a type, the first value is kept and the others
    /// are dropped.
    pub fn create_with<B: Bundle>(&mut self, bundle: B) -> Result<Entity, StoreError> {
        let ids = B::register(&mut self.storages, &mut self.registry)?;
        let entity = self.create();
        self.stage_bundle(entity, bundle, &ids);
        Ok(entity)
    }

    /// Create an entity from a builder.
    ///
    /// Prebuilt entries must come from this world. On error nothing is
    /// created and every entry is released.
    pub fn spawn(&mut self, builder: EntityBuilder) -> Result<Entity, StoreError> {
        let mut ids = Vec::with_capacity(builder.entries.len());
        let mut failure = None;
        for entry in &builder.entries {
            match entry.prepare(self.id, &mut self.storages, &mut self.registry) {
                Ok(id) => ids.push(id),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if let Some(err) = failure {
            for entry in builder.entries {
                entry.discard(self.id, &mut self.storages);
            }
            return Err(err);
        }

        let entity = self.create();
        let keep = keep_plan(&ids, ComponentMask::EMPTY);
        let mut staged = Vec::with_capacity(ids.len());
        for ((entry, &id), kept) in builder.entries.into_iter().zip(&ids).zip(keep) {
            if kept {
                staged.push((id, entry.store(&mut self.storages, id)));
            } else {
                entry.discard(self.id, &mut self.storages);
            }
        }
        self.attach_staged(entity, staged);
        Ok(entity)
    }

    /// Destroy `entity` and every component it carries.
    ///
    /// Returns `false` without doing anything if the handle is not valid, so
    /// destroying twice is harmless.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        // SAFETY: a valid handle points at a live record.
        let record = unsafe { self.entities.get(entity.slot()) };
        for (id, &slot) in record.mask.iter().zip(&record.components) {
            // SAFETY: every handle in a live record is live in its storage.
            unsafe { self.storages.destroy(id, slot) };
        }
        let released = self.archetypes.disconnect(record);
        // SAFETY: as above; the record is not touched again.
        unsafe { self.entities.destroy(entity.slot()) };

        let flat = self.entities.flat_index(entity.slot());
        let state = &mut self.slots[flat];
        state.alive = false;
        state.generation = state.generation.wrapping_add(1);

        self.counters.increment("entities_destroyed", 1);
        self.note(Transition {
            created: false,
            released,
        });
        true
    }

    /// Whether `entity` refers to a live entity of this world.
    #[inline]
    pub fn valid(&self, entity: Entity) -> bool {
        entity.world() == self.id
            && self
                .slots
                .get(self.entities.flat_index(entity.slot()))
                .is_some_and(|s| s.alive && s.generation == entity.generation())
    }

    /// Destroy every live entity.
    pub fn clear(&mut self) {
        for flat in 0..self.slots.len() {
            let state = self.slots[flat];
            if state.alive {
                let slot = self.entities.slot_at(flat);
                self.destroy(Entity::new(self.id, slot, state.generation));
            }
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Whether `entity` carries a `T`. Stale handles carry nothing.
    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match self.registry.lookup::<T>() {
            Some(id) => self.valid(entity) && self.record(entity).mask.contains(id),
            None => false,
        }
    }

    /// Attach `value` to `entity`.
    ///
    /// Returns `Ok(false)` and drops `value` if the entity already has a `T`.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> Result<bool, StoreError> {
        let id = self.storages.register::<T>(&mut self.registry)?;
        if self.record(entity).mask.contains(id) {
            return Ok(false);
        }
        let slot = self.storages.pool_mut::<T>(id).add(value);
        self.attach_staged(entity, vec![(id, slot)]);
        Ok(true)
    }

    /// Attach every component of `bundle` that `entity` does not carry yet.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn add_bundle<B: Bundle>(&mut self, entity: Entity, bundle: B) -> Result<(), StoreError> {
        let ids = B::register(&mut self.storages, &mut self.registry)?;
        self.stage_bundle(entity, bundle, &ids);
        Ok(())
    }

    /// Construct a component in storage without attaching it to anything.
    pub fn instantiate<T: Component>(&mut self, value: T) -> Result<Prebuilt<T>, StoreError> {
        let id = self.storages.register::<T>(&mut self.registry)?;
        let slot = self.storages.pool_mut::<T>(id).add(value);
        Ok(Prebuilt::new(self.id, id, slot))
    }

    /// Attach a value built by [`instantiate`](Self::instantiate).
    ///
    /// If `entity` already has a `T`, the prebuilt value is destroyed and
    /// `Ok(false)` is returned.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn attach<T: Component>(
        &mut self,
        entity: Entity,
        prebuilt: Prebuilt<T>,
    ) -> Result<bool, StoreError> {
        if prebuilt.world != self.id {
            return Err(StoreError::ForeignHandle { component: T::NAME });
        }
        if self.record(entity).mask.contains(prebuilt.id) {
            self.discard(prebuilt)?;
            return Ok(false);
        }
        self.attach_staged(entity, vec![(prebuilt.id, prebuilt.slot)]);
        Ok(true)
    }

    /// Destroy a prebuilt value that will not be attached.
    pub fn discard<T: Component>(&mut self, prebuilt: Prebuilt<T>) -> Result<(), StoreError> {
        if prebuilt.world != self.id {
            return Err(StoreError::ForeignHandle { component: T::NAME });
        }
        // SAFETY: an unattached prebuilt of this world owns a live slot.
        unsafe { self.storages.destroy(prebuilt.id, prebuilt.slot) };
        Ok(())
    }

    /// Detach and destroy `entity`'s `T`. Returns `false` if it had none.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        self.assert_valid(entity);
        match self.registry.lookup::<T>() {
            Some(id) => self.remove_id(entity, id),
            None => false,
        }
    }

    pub(crate) fn remove_id(&mut self, entity: Entity, id: ComponentId) -> bool {
        // SAFETY: callers check validity first.
        let record = unsafe { self.entities.get_mut(entity.slot()) };
        let Some((slot, transition)) = record.detach(&mut self.archetypes, id) else {
            return false;
        };
        // SAFETY: the slot was held by a live record until just now.
        unsafe { self.storages.destroy(id, slot) };
        self.note(transition);
        true
    }

    /// Borrow `entity`'s `T`.
    ///
    /// # Panics
    /// If `entity` is not valid or has no `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        let (id, slot) = self.locate::<T>(entity);
        // SAFETY: the slot comes from a live record.
        unsafe { self.storages.pool::<T>(id).get(slot) }
    }

    /// Mutably borrow `entity`'s `T`.
    ///
    /// # Panics
    /// If `entity` is not valid or has no `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        let (id, slot) = self.locate::<T>(entity);
        // SAFETY: the slot comes from a live record.
        unsafe { self.storages.pool_mut::<T>(id).get_mut(slot) }
    }

    /// Borrow `entity`'s `T`, or `None` if the handle is stale or the
    /// component is absent.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let (id, slot) = self.find::<T>(entity)?;
        // SAFETY: the slot comes from a live record.
        Some(unsafe { self.storages.pool::<T>(id).get(slot) })
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let (id, slot) = self.find::<T>(entity)?;
        // SAFETY: the slot comes from a live record.
        Some(unsafe { self.storages.pool_mut::<T>(id).get_mut(slot) })
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Number of live entities.
    #[inline]
    pub fn live_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of live `T` values, attached or prebuilt.
    pub fn live_components<T: Component>(&self) -> usize {
        self.registry
            .lookup::<T>()
            .map_or(0, |id| self.storages.live(id))
    }

    /// Number of live archetype descriptors.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Entities currently sharing the descriptor for `mask`.
    pub fn archetype_refcount(&self, mask: ComponentMask) -> u32 {
        self.archetypes.find(mask).map_or(0, |a| a.refcount())
    }

    /// Id assigned to `T`, if it has been used with this world.
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.lookup::<T>()
    }

    /// Component set of `entity`.
    ///
    /// # Panics
    /// If `entity` is not valid.
    pub fn mask_of(&self, entity: Entity) -> ComponentMask {
        self.record(entity).mask
    }

    /// Blocks allocated by the entity record pool.
    pub fn entity_blocks(&self) -> usize {
        self.entities.block_count()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    #[inline]
    pub(crate) fn assert_valid(&self, entity: Entity) {
        assert!(
            self.valid(entity),
            "entity handle {entity:?} is stale or belongs to another world"
        );
    }

    #[inline]
    pub(crate) fn record(&self, entity: Entity) -> &EntityRecord {
        self.assert_valid(entity);
        // SAFETY: validity checked above.
        unsafe { self.entities.get(entity.slot()) }
    }

    fn find<T: 'static>(&self, entity: Entity) -> Option<(ComponentId, SlotHandle)> {
        let id = self.registry.lookup::<T>()?;
        if !self.valid(entity) {
            return None;
        }
        // SAFETY: validity checked above.
        let record = unsafe { self.entities.get(entity.slot()) };
        Some((id, record.slot_of(&self.archetypes, id)?))
    }

    pub(crate) fn locate<T: Component>(&self, entity: Entity) -> (ComponentId, SlotHandle) {
        self.assert_valid(entity);
        self.find::<T>(entity)
            .unwrap_or_else(|| panic!("entity {entity:?} has no '{}' component", T::NAME))
    }

    pub(crate) fn insert_record(&mut self, record: EntityRecord) -> Entity {
        let slot = self.entities.add(record);
        let flat = self.entities.flat_index(slot);
        if self.slots.len() <= flat {
            self.slots.resize(flat + 1, SlotState::default());
        }
        let state = &mut self.slots[flat];
        state.alive = true;
        self.counters.increment("entities_created", 1);
        Entity::new(self.id, slot, state.generation)
    }

    /// Move the kept elements of `bundle` into storage and attach them.
    fn stage_bundle<B: Bundle>(&mut self, entity: Entity, bundle: B, ids: &[ComponentId]) {
        let keep = keep_plan(ids, self.record(entity).mask);
        let mut staged = Vec::with_capacity(ids.len());
        bundle.stage(&mut self.storages, ids, &keep, &mut staged);
        self.attach_staged(entity, staged);
    }

    /// Link already stored components into `entity`'s record.
    pub(crate) fn attach_staged(
        &mut self,
        entity: Entity,
        mut staged: Vec<(ComponentId, SlotHandle)>,
    ) {
        self.assert_valid(entity);
        staged.sort_unstable_by_key(|&(id, _)| id);
        // SAFETY: validity checked above.
        let record = unsafe { self.entities.get_mut(entity.slot()) };
        let transition = record.attach(&mut self.archetypes, &staged);
        self.note(transition);
    }

    #[inline]
    pub(crate) fn note(&mut self, transition: Transition) {
        if transition.created {
            self.counters.increment("archetypes_created", 1);
        }
        if transition.released {
            self.counters.increment("archetypes_released", 1);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Gravity(f32);

    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    define_component!(Position);
    define_component!(Velocity);
    define_component!(Gravity);
    define_component!(Tracked);

    #[test]
    fn add_modify_get_then_destroy_leaves_nothing_behind() {
        let mut world = World::new();
        let e = world.create();
        assert!(world.add(e, Position::default()).unwrap());
        world.get_mut::<Position>(e).x = 3.0;
        assert_eq!(world.get::<Position>(e).x, 3.0);

        assert!(world.destroy(e));
        assert_eq!(world.live_entities(), 0);
        assert_eq!(world.live_components::<Position>(), 0);
    }

    #[test]
    fn bundle_creation_is_order_independent() {
        let mut world = World::new();
        let a = world
            .create_with((Position::default(), Gravity(9.8), Velocity::default()))
            .unwrap();
        let b = world
            .create_with((Velocity::default(), Position::default(), Gravity(1.0)))
            .unwrap();

        for e in [a, b] {
            assert!(world.has::<Position>(e));
            assert!(world.has::<Gravity>(e));
            assert!(world.has::<Velocity>(e));
        }
        assert_eq!(world.mask_of(a), world.mask_of(b));
        assert_eq!(world.archetype_refcount(world.mask_of(a)), 2);
        assert_eq!(world.get::<Gravity>(b).0, 1.0);

        for e in [a, b] {
            assert!(world.remove::<Position>(e));
            assert!(world.remove::<Gravity>(e));
            assert!(world.remove::<Velocity>(e));
            assert!(!world.has::<Position>(e));
            assert!(!world.has::<Gravity>(e));
            assert!(!world.has::<Velocity>(e));
        }
        assert_eq!(world.live_components::<Position>(), 0);
        assert_eq!(world.live_components::<Gravity>(), 0);
        assert_eq!(world.live_components::<Velocity>(), 0);
    }

    #[test]
    fn has_reflects_add_remove_history() {
        let mut world = World::new();
        let e = world.create();
        let steps: [(bool, u8); 9] = [
            (true, 0),
            (true, 1),
            (false, 0),
            (true, 2),
            (true, 0),
            (false, 1),
            (false, 1),
            (false, 2),
            (true, 1),
        ];
        let mut expected = [false; 3];
        for (add, which) in steps {
            match (add, which) {
                (true, 0) => {
                    world.add(e, Position::default()).unwrap();
                }
                (true, 1) => {
                    world.add(e, Velocity::default()).unwrap();
                }
                (true, _) => {
                    world.add(e, Gravity(0.0)).unwrap();
                }
                (false, 0) => {
                    world.remove::<Position>(e);
                }
                (false, 1) => {
                    world.remove::<Velocity>(e);
                }
                (false, _) => {
                    world.remove::<Gravity>(e);
                }
            }
            expected[which as usize] = add;
            assert_eq!(world.has::<Position>(e), expected[0]);
            assert_eq!(world.has::<Velocity>(e), expected[1]);
            assert_eq!(world.has::<Gravity>(e), expected[2]);
            assert_eq!(world.mask_of(e).count(), expected.iter().filter(|&&b| b).count());
        }
    }

    #[test]
    fn values_survive_archetype_transitions() {
        let mut world = World::new();
        let e = world.create();
        world.add(e, Velocity { x: 1.0, y: 2.0 }).unwrap();
        world.add(e, Position { x: 3.0, y: 4.0 }).unwrap();
        world.add(e, Gravity(5.0)).unwrap();
        world.remove::<Position>(e);
        world.add(e, Position { x: 6.0, y: 7.0 }).unwrap();

        assert_eq!(*world.get::<Velocity>(e), Velocity { x: 1.0, y: 2.0 });
        assert_eq!(*world.get::<Position>(e), Position { x: 6.0, y: 7.0 });
        assert_eq!(world.get::<Gravity>(e).0, 5.0);
    }

    #[test]
    fn archetype_count_tracks_distinct_live_masks() {
        let mut world = World::new();
        let a = world.create_with((Position::default(),)).unwrap();
        let b = world.create_with((Position::default(),)).unwrap();
        let d = world.create_with((Position::default(),)).unwrap();
        let c = world
            .create_with((Position::default(), Velocity::default()))
            .unwrap();
        assert_eq!(world.archetype_count(), 2);

        world.destroy(c);
        assert_eq!(world.archetype_count(), 1);

        // {P,V} for a, {P} for b and d.
        world.add(a, Velocity::default()).unwrap();
        assert_eq!(world.archetype_count(), 2);
        // {P,V}, {P} for d, {} for b.
        world.remove::<Position>(b);
        assert_eq!(world.archetype_count(), 3);
        // Last {P} holder goes: {P,V} and {} remain.
        world.destroy(d);
        assert_eq!(world.archetype_count(), 2);

        world.destroy(a);
        world.destroy(b);
        assert_eq!(world.archetype_count(), 0);
    }

    #[test]
    fn empty_entities_share_the_empty_descriptor() {
        let mut world = World::new();
        let a = world.create();
        let b = world.create();
        assert_eq!(world.archetype_refcount(ComponentMask::EMPTY), 2);
        world.destroy(a);
        assert_eq!(world.archetype_refcount(ComponentMask::EMPTY), 1);
        world.destroy(b);
        assert_eq!(world.archetype_count(), 0);
    }

    #[test]
    fn stale_handle_is_invalid_after_slot_reuse() {
        let config = StoreConfig {
            entity_reuse_threshold: 0,
            ..StoreConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        let h1 = world.create();
        assert!(world.destroy(h1));
        let h2 = world.create();

        assert_eq!(h1.slot(), h2.slot());
        assert!(!world.valid(h1));
        assert!(world.valid(h2));
        assert!(!world.has::<Position>(h1));
        assert!(world.try_get::<Position>(h1).is_none());
    }

    #[test]
    fn destroy_twice_is_a_no_op() {
        let mut world = World::new();
        let e = world.create();
        assert!(world.destroy(e));
        assert!(!world.destroy(e));
        assert_eq!(world.live_entities(), 0);
    }

    #[test]
    fn handles_do_not_cross_worlds() {
        let mut a = World::new();
        let mut b = World::new();
        let ea = a.create();
        let _eb = b.create();
        assert!(a.valid(ea));
        assert!(!b.valid(ea));
        assert!(!b.destroy(ea));
        assert!(a.valid(ea));
    }

    #[test]
    fn duplicate_add_drops_the_new_value() {
        let drops = Rc::new(Cell::new(0));
        let mut world = World::new();
        let e = world.create();
        assert!(world.add(e, Tracked(drops.clone())).unwrap());
        assert!(!world.add(e, Tracked(drops.clone())).unwrap());
        assert_eq!(drops.get(), 1);
        assert_eq!(world.live_components::<Tracked>(), 1);

        world.destroy(e);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn duplicate_prebuilt_attach_does_not_leak() {
        let mut world = World::new();
        let e = world.create();
        let first = world.instantiate(Position { x: 1.0, y: 1.0 }).unwrap();
        let second = world.instantiate(Position { x: 2.0, y: 2.0 }).unwrap();
        assert_eq!(world.live_components::<Position>(), 2);

        assert!(world.attach(e, first).unwrap());
        assert!(!world.attach(e, second).unwrap());
        assert_eq!(world.live_components::<Position>(), 1);
        assert_eq!(world.get::<Position>(e).x, 1.0);
    }

    #[test]
    fn duplicate_types_in_a_bundle_keep_the_first() {
        let drops = Rc::new(Cell::new(0));
        let mut world = World::new();
        let e = world
            .create_with((Gravity(1.0), Tracked(drops.clone()), Gravity(2.0), Tracked(drops.clone())))
            .unwrap();
        assert_eq!(world.get::<Gravity>(e).0, 1.0);
        assert_eq!(world.live_components::<Gravity>(), 1);
        assert_eq!(world.live_components::<Tracked>(), 1);
        assert_eq!(drops.get(), 1);

        world.add_bundle(e, (Gravity(3.0), Velocity { x: 1.0, y: 0.0 })).unwrap();
        assert_eq!(world.get::<Gravity>(e).0, 1.0);
        assert!(world.has::<Velocity>(e));
        assert_eq!(world.live_components::<Gravity>(), 1);
    }

    #[test]
    fn prebuilt_from_another_world_is_rejected() {
        let mut a = World::new();
        let mut b = World::new();
        let e = b.create();
        let prebuilt = a.instantiate(Gravity(1.0)).unwrap();
        assert!(matches!(
            b.attach(e, prebuilt),
            Err(StoreError::ForeignHandle { component: "Gravity" })
        ));
        assert!(!b.has::<Gravity>(e));
    }

    #[test]
    fn spawn_mixes_values_and_prebuilt() {
        let mut world = World::new();
        let gravity = world.instantiate(Gravity(9.8)).unwrap();
        let e = world
            .spawn(
                EntityBuilder::new()
                    .with(Position { x: 1.0, y: 2.0 })
                    .with_prebuilt(gravity)
                    .with(Position { x: 9.0, y: 9.0 }),
            )
            .unwrap();
        assert_eq!(world.get::<Position>(e).x, 1.0);
        assert_eq!(world.get::<Gravity>(e).0, 9.8);
        assert_eq!(world.live_components::<Position>(), 1);
    }

    #[test]
    fn spawn_macro_builds_the_entity() {
        let mut world = World::new();
        let e = crate::spawn!(world, Position { x: 1.0, y: 0.0 }, Velocity { x: 0.0, y: 1.0 })
            .unwrap();
        assert!(world.has::<Position>(e));
        assert!(world.has::<Velocity>(e));
    }

    #[test]
    fn failed_spawn_releases_prebuilt_entries() {
        let mut world = World::new();
        let mut other = World::new();
        let local = world.instantiate(Gravity(1.0)).unwrap();
        let foreign = other.instantiate(Position::default()).unwrap();
        let result = world.spawn(
            EntityBuilder::new()
                .with_prebuilt(local)
                .with_prebuilt(foreign),
        );
        assert!(result.is_err());
        assert_eq!(world.live_entities(), 0);
        assert_eq!(world.live_components::<Gravity>(), 0);
    }

    #[test]
    fn capacity_exhaustion_is_a_distinct_error() {
        let config = StoreConfig {
            component_capacity: 2,
            ..StoreConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        let e = world.create();
        world.add(e, Position::default()).unwrap();
        world.add(e, Velocity::default()).unwrap();
        let err = world.add(e, Gravity(0.0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::CapacityExceeded { component: "Gravity", capacity: 2 }
        ));
        assert!(world.create_with((Gravity(0.0),)).is_err());
        // Known types keep working.
        assert!(world.remove::<Position>(e));
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = StoreConfig {
            entity_block_size: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(World::with_config(config), Err(StoreError::Config(_))));
    }

    #[test]
    #[should_panic(expected = "has no 'Velocity' component")]
    fn get_of_absent_component_panics() {
        let mut world = World::new();
        let e = world.create_with((Position::default(),)).unwrap();
        world.add(e, Gravity(0.0)).unwrap();
        let _ = world.get::<Velocity>(e);
    }

    #[test]
    #[should_panic(expected = "stale")]
    fn get_through_stale_handle_panics() {
        let mut world = World::new();
        let e = world.create_with((Position::default(),)).unwrap();
        world.destroy(e);
        let _ = world.get::<Position>(e);
    }

    #[test]
    fn dropping_the_world_drops_every_component() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut world = World::new();
            for _ in 0..10 {
                world.create_with((Tracked(drops.clone()),)).unwrap();
            }
            let e = world.create();
            world.add(e, Tracked(drops.clone())).unwrap();
        }
        assert_eq!(drops.get(), 11);
    }

    #[test]
    fn clear_empties_the_world() {
        let mut world = World::new();
        let handles: Vec<_> = (0..100)
            .map(|i| world.create_with((Gravity(i as f32),)).unwrap())
            .collect();
        world.clear();
        assert_eq!(world.live_entities(), 0);
        assert_eq!(world.live_components::<Gravity>(), 0);
        assert_eq!(world.archetype_count(), 0);
        assert!(handles.iter().all(|&h| !world.valid(h)));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn counters_follow_lifecycle_events() {
        let mut world = World::new();
        let e = world.create_with((Position::default(),)).unwrap();
        world.destroy(e);
        assert_eq!(world.metrics().get("entities_created"), 1);
        assert_eq!(world.metrics().get("entities_destroyed"), 1);
        assert_eq!(world.metrics().get("archetypes_created"), 2);
        assert_eq!(world.metrics().get("archetypes_released"), 2);
    }
}
