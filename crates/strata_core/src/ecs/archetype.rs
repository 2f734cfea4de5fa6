// archetype.rs - Shared layout descriptors keyed by component mask
//
// Every entity carrying exactly the same component set points at one
// descriptor. The descriptor tells where each present component sits in the
// entity's dense handle list. Descriptors are interned in a table owned by
// the registry and reference counted by the entities connected to them.

use crate::ecs::{ComponentId, EntityRecord};
use std::collections::HashMap;
use std::fmt;

/// Hard ceiling on component ids, fixed by the width of [`ComponentMask`].
pub const MAX_COMPONENTS: usize = 128;

/// Position of a component inside an entity's dense handle list.
pub type DenseIndex = u8;

const ABSENT: DenseIndex = DenseIndex::MAX;

/// Set of component ids, one bit per id.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u128);

impl ComponentMask {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn bits(self) -> u128 {
        self.0
    }

    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        self.0 |= 1u128 << id;
    }

    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        self.0 &= !(1u128 << id);
    }

    #[inline]
    pub const fn contains(self, id: ComponentId) -> bool {
        self.0 & (1u128 << id) != 0
    }

    /// Number of ids in the set.
    #[inline]
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set ids below `id`, i.e. where `id` lands in dense order.
    #[inline]
    pub const fn rank(self, id: ComponentId) -> usize {
        let below = (1u128 << id) - 1;
        (self.0 & below).count_ones() as usize
    }

    /// Ids in ascending order.
    pub fn iter(self) -> MaskIter {
        MaskIter(self.0)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for id in iter {
            mask.insert(id);
        }
        mask
    }
}

pub struct MaskIter(u128);

impl Iterator for MaskIter {
    type Item = ComponentId;

    #[inline]
    fn next(&mut self) -> Option<ComponentId> {
        if self.0 == 0 {
            return None;
        }
        let id = self.0.trailing_zeros() as ComponentId;
        self.0 &= self.0 - 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for MaskIter {}

/// Index of a descriptor in the [`ArchetypeRegistry`] table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ArchetypeIdx(u32);

/// Layout descriptor shared by all entities with the same mask.
#[derive(Debug)]
pub struct Archetype {
    mask: ComponentMask,
    dense: Box<[DenseIndex]>,
    refcount: u32,
}

impl Archetype {
    /// Build the dense table with one ascending scan over `capacity` ids.
    fn new(mask: ComponentMask, capacity: usize) -> Self {
        let mut dense = vec![ABSENT; capacity].into_boxed_slice();
        let mut next: DenseIndex = 0;
        for (id, slot) in dense.iter_mut().enumerate() {
            if mask.contains(id as ComponentId) {
                *slot = next;
                next += 1;
            }
        }
        Self {
            mask,
            dense,
            refcount: 0,
        }
    }

    #[inline]
    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Dense position of `id`, or `None` if the archetype lacks it.
    #[inline]
    pub fn dense_index(&self, id: ComponentId) -> Option<usize> {
        match self.dense.get(id as usize) {
            Some(&ABSENT) | None => None,
            Some(&d) => Some(d as usize),
        }
    }

    /// Number of live entities connected to this descriptor.
    #[inline]
    pub fn refcount(&self) -> u32 {
        self.refcount
    }
}

/// Interned table of archetype descriptors.
pub struct ArchetypeRegistry {
    capacity: usize,
    slots: Vec<Option<Archetype>>,
    free: Vec<u32>,
    by_mask: HashMap<ComponentMask, ArchetypeIdx>,
}

impl ArchetypeRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            by_mask: HashMap::new(),
        }
    }

    /// Attach `record` to the descriptor for its current mask.
    ///
    /// Returns `true` if the descriptor had to be created.
    pub(crate) fn connect(&mut self, record: &mut EntityRecord) -> bool {
        let (idx, created) = self.acquire(record.mask);
        record.archetype = idx;
        created
    }

    /// Drop `record`'s reference to its descriptor. Must run before the
    /// record's mask changes.
    ///
    /// Returns `true` if this released the last reference.
    pub(crate) fn disconnect(&mut self, record: &EntityRecord) -> bool {
        self.release(record.archetype)
    }

    /// Look up or create the descriptor for `mask` and take one reference.
    pub fn acquire(&mut self, mask: ComponentMask) -> (ArchetypeIdx, bool) {
        if let Some(&idx) = self.by_mask.get(&mask) {
            self.retain(idx);
            return (idx, false);
        }

        let mut archetype = Archetype::new(mask, self.capacity);
        archetype.refcount = 1;
        let idx = match self.free.pop() {
            Some(i) => {
                self.slots[i as usize] = Some(archetype);
                ArchetypeIdx(i)
            }
            None => {
                self.slots.push(Some(archetype));
                ArchetypeIdx((self.slots.len() - 1) as u32)
            }
        };
        self.by_mask.insert(mask, idx);
        tracing::trace!(?mask, "archetype descriptor created");
        (idx, true)
    }

    /// Take one more reference to a live descriptor.
    #[inline]
    pub fn retain(&mut self, idx: ArchetypeIdx) {
        self.slot_mut(idx).refcount += 1;
    }

    /// Give back one reference; erases the descriptor when none remain.
    pub fn release(&mut self, idx: ArchetypeIdx) -> bool {
        let archetype = self.slot_mut(idx);
        archetype.refcount -= 1;
        if archetype.refcount > 0 {
            return false;
        }
        let mask = archetype.mask;
        self.slots[idx.0 as usize] = None;
        self.free.push(idx.0);
        self.by_mask.remove(&mask);
        tracing::trace!(?mask, "archetype descriptor released");
        true
    }

    #[inline]
    pub fn get(&self, idx: ArchetypeIdx) -> &Archetype {
        self.slots[idx.0 as usize]
            .as_ref()
            .expect("archetype index refers to a released descriptor")
    }

    #[inline]
    fn slot_mut(&mut self, idx: ArchetypeIdx) -> &mut Archetype {
        self.slots[idx.0 as usize]
            .as_mut()
            .expect("archetype index refers to a released descriptor")
    }

    /// Descriptor for `mask`, if any live entity carries it.
    pub fn find(&self, mask: ComponentMask) -> Option<&Archetype> {
        self.by_mask.get(&mask).map(|&idx| self.get(idx))
    }

    /// Number of live descriptors.
    pub fn len(&self) -> usize {
        self.by_mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mask.is_empty()
    }
}
