use std::mem::MaybeUninit;

/// Fixed-capacity run of uninitialised slots.
///
/// The buffer is allocated once and never resized, so the address of every
/// slot stays put for the lifetime of the block. `len` is the high-water mark
/// of slots ever handed out, not the number of live values.
pub(crate) struct Block<T> {
    buf: Box<[MaybeUninit<T>]>,
    len: usize,
}

impl<T> Block<T> {
    pub fn with_capacity(slots: usize) -> Self {
        let buf: Box<[MaybeUninit<T>]> = std::iter::repeat_with(MaybeUninit::uninit)
            .take(slots)
            .collect();
        Self { buf, len: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Hand out the next never-used slot, if any remain.
    #[inline]
    pub fn alloc_one(&mut self) -> Option<usize> {
        if self.len < self.capacity() {
            let idx = self.len;
            self.len += 1;
            Some(idx)
        } else {
            None
        }
    }

    #[inline]
    pub fn write_at(&mut self, idx: usize, value: T) {
        debug_assert!(idx < self.len);
        self.buf[idx].write(value);
    }

    /// # Safety
    /// Slot `idx` must hold a live value.
    #[inline]
    pub unsafe fn get(&self, idx: usize) -> &T {
        // SAFETY: forwarded to the caller.
        unsafe { self.buf[idx].assume_init_ref() }
    }

    /// # Safety
    /// Slot `idx` must hold a live value.
    #[inline]
    pub unsafe fn get_mut(&mut self, idx: usize) -> &mut T {
        // SAFETY: forwarded to the caller.
        unsafe { self.buf[idx].assume_init_mut() }
    }

    /// Raw pointer to a slot; never dereferenced here.
    #[inline]
    pub fn slot_ptr(&mut self, idx: usize) -> *mut T {
        self.buf[idx].as_mut_ptr()
    }

    /// # Safety
    /// Slot `idx` must hold a live value; it is uninitialised afterwards.
    #[inline]
    pub unsafe fn drop_at(&mut self, idx: usize) {
        // SAFETY: forwarded to the caller.
        unsafe { self.buf[idx].assume_init_drop() };
    }
}
