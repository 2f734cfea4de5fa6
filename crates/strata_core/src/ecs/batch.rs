// batch.rs - Creating many identically shaped entities at once

use crate::ecs::bundle::{keep_plan, Bundle};
use crate::ecs::entity::{EntityRecord, Transition};
use crate::ecs::{ComponentMask, Entity, StoreError, World};
use crate::pool::SlotHandle;

impl World {
    /// Create `n` entities, each carrying the bundle returned by `make`.
    ///
    /// The descriptor for the bundle's component set is resolved once and
    /// shared by every new entity. `on_created` runs right after each entity
    /// exists, in creation order. The resulting entities are
    /// indistinguishable from ones made by [`create_with`](Self::create_with).
    ///
    /// ```ignore
    /// let mut handles = Vec::with_capacity(1024);
    /// world.create_batch(
    ///     1024,
    ///     || (Position::default(), Velocity { x: 1.0, y: 1.0 }),
    ///     |e| handles.push(e),
    /// )?;
    /// ```
    pub fn create_batch<B, M, F>(
        &mut self,
        n: usize,
        mut make: M,
        mut on_created: F,
    ) -> Result<(), StoreError>
    where
        B: Bundle,
        M: FnMut() -> B,
        F: FnMut(Entity),
    {
        let ids = B::register(&mut self.storages, &mut self.registry)?;
        if n == 0 {
            return Ok(());
        }

        let keep = keep_plan(&ids, ComponentMask::EMPTY);
        let mask: ComponentMask = ids
            .iter()
            .zip(&keep)
            .filter(|(_, &kept)| kept)
            .map(|(&id, _)| id)
            .collect();

        let width = mask.count();
        let mut shared = None;
        let mut staged = Vec::with_capacity(ids.len());
        for _ in 0..n {
            staged.clear();
            make().stage(&mut self.storages, &ids, &keep, &mut staged);

            // References are taken only once a record is about to hold them.
            let archetype = match shared {
                Some(idx) => {
                    self.archetypes.retain(idx);
                    idx
                }
                None => {
                    let (idx, created) = self.archetypes.acquire(mask);
                    self.note(Transition {
                        created,
                        released: false,
                    });
                    shared = Some(idx);
                    idx
                }
            };
            let descriptor = self.archetypes.get(archetype);
            let mut components = vec![SlotHandle::default(); width];
            for &(id, slot) in &staged {
                let dense = descriptor
                    .dense_index(id)
                    .expect("descriptor lacks a component present in its mask");
                components[dense] = slot;
            }
            let entity = self.insert_record(EntityRecord::new(mask, archetype, components));
            on_created(entity);
        }

        self.counters.increment("batches", 1);
        tracing::trace!(count = n, ?mask, "batch created");
        Ok(())
    }
}
