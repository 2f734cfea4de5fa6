// query.rs - Visiting the entities of a handle list that carry a component set

use crate::ecs::storage::Storages;
use crate::ecs::{Component, ComponentId, ComponentMask, ComponentRegistry, Entity, World};
use crate::pool::{Pool, SlotHandle};

/// A tuple of component types fetched mutably together.
///
/// Implemented for tuples of one to six [`Component`] types.
pub trait Query: 'static {
    /// What the callback receives for one entity.
    type Item<'a>;

    #[doc(hidden)]
    type Pools: Copy;

    /// Ids of the requested types in tuple order, `None` if any of them was
    /// never registered.
    #[doc(hidden)]
    fn component_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>>;

    /// # Safety
    /// `storages` must be valid and `ids` must come from `component_ids`
    /// against the same world.
    #[doc(hidden)]
    unsafe fn pools(storages: *mut Storages, ids: &[ComponentId]) -> Self::Pools;

    /// # Safety
    /// `slots` must be live in `pools`, in tuple order, and no other
    /// reference to those values may exist for `'a`.
    #[doc(hidden)]
    unsafe fn fetch<'a>(pools: Self::Pools, slots: &[SlotHandle]) -> Self::Item<'a>;
}

macro_rules! impl_query {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item<'a> = ($(&'a mut $T,)+);
            type Pools = ($(*mut Pool<$T>,)+);

            fn component_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>> {
                Some(vec![$(registry.lookup::<$T>()?),+])
            }

            unsafe fn pools(storages: *mut Storages, ids: &[ComponentId]) -> Self::Pools {
                // SAFETY: forwarded to the caller; ids are distinct.
                unsafe { ($(Storages::pool_ptr::<$T>(storages, ids[$idx]),)+) }
            }

            unsafe fn fetch<'a>(pools: Self::Pools, slots: &[SlotHandle]) -> Self::Item<'a> {
                // SAFETY: forwarded to the caller.
                unsafe { ($(&mut *(*pools.$idx).slot_ptr(slots[$idx]),)+) }
            }
        }
    };
}

impl_query!(A 0);
impl_query!(A 0, B 1);
impl_query!(A 0, B 1, C 2);
impl_query!(A 0, B 1, C 2, D 3);
impl_query!(A 0, B 1, C 2, D 3, E 4);
impl_query!(A 0, B 1, C 2, D 3, E 4, F 5);

impl World {
    /// Call `f` once for every handle in `handles` that is valid and carries
    /// every component of `Q`, in the order the handles are given.
    ///
    /// ```ignore
    /// world.iterate::<(Position, Velocity), _>(
    ///     &handles,
    ///     |_, (pos, vel): (&mut Position, &mut Velocity)| {
    ///         pos.x += vel.x;
    ///     },
    /// );
    /// ```
    ///
    /// # Panics
    /// If `Q` names the same component type twice.
    pub fn iterate<'h, Q, F>(
        &mut self,
        handles: impl IntoIterator<Item = &'h Entity>,
        mut f: F,
    )
    where
        Q: Query,
        F: for<'a> FnMut(Entity, Q::Item<'a>),
    {
        let Some(ids) = Q::component_ids(&self.registry) else {
            return;
        };
        let required: ComponentMask = ids.iter().copied().collect();
        assert_eq!(
            required.count(),
            ids.len(),
            "query names the same component type twice"
        );

        // SAFETY: the ids are distinct, so each pool is reached once.
        let pools = unsafe { Q::pools(&mut self.storages, &ids) };
        let mut slots = Vec::with_capacity(ids.len());
        for &entity in handles {
            if !self.valid(entity) {
                continue;
            }
            // SAFETY: validity checked above.
            let record = unsafe { self.entities.get(entity.slot()) };
            if record.mask.bits() & required.bits() != required.bits() {
                continue;
            }
            let archetype = self.archetypes.get(record.archetype);
            slots.clear();
            slots.extend(ids.iter().map(|&id| {
                let dense = archetype
                    .dense_index(id)
                    .expect("descriptor lacks a component present in its mask");
                record.components[dense]
            }));
            // SAFETY: the slots belong to a live record and the item cannot
            // outlive this call, so no two items are alive at once.
            f(entity, unsafe { Q::fetch(pools, &slots) });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::define_component;
    use crate::ecs::{Entity, World};

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Position(f32);

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Velocity(f32);

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Frozen;

    define_component!(Position);
    define_component!(Velocity);
    define_component!(Frozen);

    #[test]
    fn only_matching_live_entities_are_visited() {
        let mut world = World::new();
        let moving = world.create_with((Position(0.0), Velocity(2.0))).unwrap();
        let still = world.create_with((Position(5.0),)).unwrap();
        let gone = world.create_with((Position(0.0), Velocity(1.0))).unwrap();
        world.destroy(gone);

        let mut seen = Vec::new();
        world.iterate::<(Position, Velocity), _>(
            &[moving, still, gone],
            |e, (pos, vel): (&mut Position, &mut Velocity)| {
                pos.0 += vel.0;
                seen.push(e);
            },
        );

        assert_eq!(seen, vec![moving]);
        assert_eq!(world.get::<Position>(moving).0, 2.0);
        assert_eq!(world.get::<Position>(still).0, 5.0);
    }

    #[test]
    fn handles_are_visited_in_the_given_order() {
        let mut world = World::new();
        let handles: Vec<Entity> = (0..4)
            .map(|i| world.create_with((Position(i as f32),)).unwrap())
            .collect();
        let reversed: Vec<Entity> = handles.iter().rev().copied().collect();

        let mut order = Vec::new();
        world.iterate::<(Position,), _>(&reversed, |_, (pos,): (&mut Position,)| {
            order.push(pos.0)
        });
        assert_eq!(order, vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn unregistered_type_matches_nothing() {
        let mut world = World::new();
        let e = world.create_with((Position(1.0),)).unwrap();
        let mut calls = 0;
        world.iterate::<(Position, Frozen), _>(
            &[e],
            |_, _: (&mut Position, &mut Frozen)| calls += 1,
        );
        assert_eq!(calls, 0);
    }

    #[test]
    #[should_panic(expected = "same component type twice")]
    fn repeated_type_is_refused() {
        let mut world = World::new();
        let e = world.create_with((Position(1.0),)).unwrap();
        world.iterate::<(Position, Position), _>(
            &[e],
            |_, _: (&mut Position, &mut Position)| {},
        );
    }
}
