use crate::pool::block::Block;
use std::collections::VecDeque;

/// Address of a value inside a [`Pool`]: (block, index within block).
///
/// A handle keeps pointing at the same memory for as long as the value it
/// was issued for lives. Once that value is destroyed the handle may be
/// handed out again for an unrelated value; pools do not version handles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle {
    pub block: u32,
    pub index: u32,
}

impl SlotHandle {
    pub const fn new(block: u32, index: u32) -> Self {
        Self { block, index }
    }
}

/// Block-allocated store for values of one type.
///
/// Growth appends whole blocks and never relocates a stored value. Freed
/// slots go to a FIFO queue and are reused once more than `reuse_threshold`
/// of them are waiting, which keeps a single hot slot from being recycled
/// over and over.
///
/// The pool only keeps allocation bookkeeping; it does not know which slots
/// are live. Owners must `destroy` every value they added before dropping
/// the pool, otherwise those values are leaked (never double-dropped).
pub struct Pool<T> {
    block_size: usize,
    reuse_threshold: usize,
    blocks: Vec<Block<T>>,
    free: VecDeque<SlotHandle>,
    live: usize,
}

impl<T> Pool<T> {
    /// Create a pool with one block of `block_size` slots already allocated.
    pub fn new(block_size: usize, reuse_threshold: usize) -> Self {
        assert!(block_size > 0, "pool block size must be non-zero");
        assert!(
            block_size <= u32::MAX as usize,
            "pool block size {block_size} does not fit a slot index"
        );
        Self {
            block_size,
            reuse_threshold,
            blocks: vec![Block::with_capacity(block_size)],
            free: VecDeque::new(),
            live: 0,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn reuse_threshold(&self) -> usize {
        self.reuse_threshold
    }

    /// Number of blocks allocated so far.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of values currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Flatten a handle into a dense integer id.
    ///
    /// This and [`Pool::slot_at`] are the only places that know how a
    /// (block, index) pair maps onto a single integer.
    #[inline]
    pub fn flat_index(&self, slot: SlotHandle) -> usize {
        slot.block as usize * self.block_size + slot.index as usize
    }

    /// Inverse of [`Pool::flat_index`].
    #[inline]
    pub fn slot_at(&self, flat: usize) -> SlotHandle {
        SlotHandle::new(
            (flat / self.block_size) as u32,
            (flat % self.block_size) as u32,
        )
    }

    /// Move `value` into a slot and return its handle.
    pub fn add(&mut self, value: T) -> SlotHandle {
        let slot = self.next_slot();
        self.blocks[slot.block as usize].write_at(slot.index as usize, value);
        self.live += 1;
        slot
    }

    fn next_slot(&mut self) -> SlotHandle {
        if self.free.len() > self.reuse_threshold {
            if let Some(slot) = self.free.pop_front() {
                return slot;
            }
        }

        let last = self.blocks.len() - 1;
        if let Some(index) = self.blocks[last].alloc_one() {
            return SlotHandle::new(last as u32, index as u32);
        }

        let mut block = Block::with_capacity(self.block_size);
        let index = block.alloc_one().unwrap_or(0);
        self.blocks.push(block);
        tracing::trace!(
            blocks = self.blocks.len(),
            block_size = self.block_size,
            "pool grew by one block"
        );
        SlotHandle::new((self.blocks.len() - 1) as u32, index as u32)
    }

    /// # Safety
    /// `slot` must have been returned by [`Pool::add`] on this pool and not
    /// destroyed since.
    #[inline]
    pub unsafe fn get(&self, slot: SlotHandle) -> &T {
        // SAFETY: forwarded to the caller.
        unsafe { self.blocks[slot.block as usize].get(slot.index as usize) }
    }

    /// # Safety
    /// Same contract as [`Pool::get`].
    #[inline]
    pub unsafe fn get_mut(&mut self, slot: SlotHandle) -> &mut T {
        // SAFETY: forwarded to the caller.
        unsafe { self.blocks[slot.block as usize].get_mut(slot.index as usize) }
    }

    /// Raw pointer to a slot. Used where several slots of different pools
    /// must be borrowed mutably at once.
    #[inline]
    pub(crate) fn slot_ptr(&mut self, slot: SlotHandle) -> *mut T {
        self.blocks[slot.block as usize].slot_ptr(slot.index as usize)
    }

    /// Drop the value in `slot` and queue the slot for reuse.
    ///
    /// # Safety
    /// Same contract as [`Pool::get`]; the handle must not be used again
    /// until the pool hands it out anew.
    pub unsafe fn destroy(&mut self, slot: SlotHandle) {
        // SAFETY: forwarded to the caller.
        unsafe { self.blocks[slot.block as usize].drop_at(slot.index as usize) };
        self.live -= 1;
        self.free.push_back(slot);
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        if self.live > 0 {
            tracing::warn!(
                live = self.live,
                ty = std::any::type_name::<T>(),
                "pool dropped while still holding values; they are leaked"
            );
        }
    }
}
