//! Component bundles for adding several components in one step

use crate::ecs::storage::Storages;
use crate::ecs::{Component, ComponentId, ComponentMask, ComponentRegistry, StoreError};
use crate::pool::SlotHandle;

/// A tuple of components that can be attached to an entity at once.
///
/// Implemented for tuples of one to eight [`Component`] types. When a tuple
/// names the same type twice, or names a type the entity already carries,
/// the extra values are dropped and the existing component wins.
pub trait Bundle: 'static {
    /// Register every element type and return their ids in tuple order.
    #[doc(hidden)]
    fn register(
        storages: &mut Storages,
        registry: &mut ComponentRegistry,
    ) -> Result<Vec<ComponentId>, StoreError>;

    /// Move the kept elements into their pools and record where they went.
    /// Elements whose `keep` flag is unset are dropped.
    #[doc(hidden)]
    fn stage(
        self,
        storages: &mut Storages,
        ids: &[ComponentId],
        keep: &[bool],
        out: &mut Vec<(ComponentId, SlotHandle)>,
    );
}

/// Decide which elements of a bundle survive against `existing`.
///
/// An element is kept if its id is absent from `existing` and does not
/// repeat an earlier element.
pub(crate) fn keep_plan(ids: &[ComponentId], existing: ComponentMask) -> Vec<bool> {
    let mut seen = existing;
    ids.iter()
        .map(|&id| {
            if seen.contains(id) {
                false
            } else {
                seen.insert(id);
                true
            }
        })
        .collect()
}

macro_rules! impl_bundle {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            fn register(
                storages: &mut Storages,
                registry: &mut ComponentRegistry,
            ) -> Result<Vec<ComponentId>, StoreError> {
                Ok(vec![$(storages.register::<$T>(registry)?),+])
            }

            fn stage(
                self,
                storages: &mut Storages,
                ids: &[ComponentId],
                keep: &[bool],
                out: &mut Vec<(ComponentId, SlotHandle)>,
            ) {
                $(
                    if keep[$idx] {
                        let slot = storages.pool_mut::<$T>(ids[$idx]).add(self.$idx);
                        out.push((ids[$idx], slot));
                    }
                )+
            }
        }
    };
}

impl_bundle!(A 0);
impl_bundle!(A 0, B 1);
impl_bundle!(A 0, B 1, C 2);
impl_bundle!(A 0, B 1, C 2, D 3);
impl_bundle!(A 0, B 1, C 2, D 3, E 4);
impl_bundle!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_bundle!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_bundle!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
