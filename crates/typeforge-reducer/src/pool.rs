// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded free list for short-lived bookkeeping records.

/// Records that can be returned to a [`SlotPool`].
///
/// `recycle` must drop every reference the record holds into caller data and
/// leave it indistinguishable from a freshly constructed default, while
/// keeping any heap capacity it owns.
pub trait Recycle {
    /// Clears the record in place.
    fn recycle(&mut self);
}

/// Default number of records a pool retains.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Snapshot of a pool's allocation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// `take` calls served from the free list.
    pub reused: u64,
    /// `take` calls that constructed a new record.
    pub allocated: u64,
    /// Records currently waiting on the free list.
    pub available: usize,
}

/// Bounded free-list allocator.
///
/// `take` hands out a cleared record (reused when one is available),
/// `release` clears it and keeps it for the next `take` unless the pool is
/// already full. Clearing happens inside the pool: borrowers never have to.
#[derive(Debug)]
pub struct SlotPool<T> {
    free: Vec<T>,
    capacity: usize,
    reused: u64,
    allocated: u64,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }
}

impl<T> SlotPool<T> {
    /// Creates a pool that retains at most `capacity` released records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            reused: 0,
            allocated: 0,
        }
    }

    /// Maximum number of retained records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently waiting on the free list.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// How many `take` calls were served from the free list.
    #[must_use]
    pub fn reused(&self) -> u64 {
        self.reused
    }

    /// How many `take` calls had to construct a new record.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// All counters at once.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            reused: self.reused,
            allocated: self.allocated,
            available: self.free.len(),
        }
    }
}

impl<T: Recycle + Default> SlotPool<T> {
    /// Takes a cleared record from the pool.
    pub fn take(&mut self) -> T {
        if let Some(slot) = self.free.pop() {
            self.reused += 1;
            slot
        } else {
            self.allocated += 1;
            T::default()
        }
    }

    /// Returns a record to the pool.
    ///
    /// The record is cleared first; it is dropped instead of retained when
    /// the pool is at capacity.
    pub fn release(&mut self, mut slot: T) {
        slot.recycle();
        if self.free.len() < self.capacity {
            self.free.push(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Scratch {
        items: Vec<u32>,
    }

    impl Recycle for Scratch {
        fn recycle(&mut self) {
            self.items.clear();
        }
    }

    #[test]
    fn released_records_come_back_cleared() {
        let mut pool: SlotPool<Scratch> = SlotPool::with_capacity(4);
        let mut s = pool.take();
        s.items.extend([1, 2, 3]);
        let cap = s.items.capacity();
        pool.release(s);

        let s = pool.take();
        assert!(s.items.is_empty());
        assert_eq!(s.items.capacity(), cap);
        assert_eq!(pool.reused(), 1);
        assert_eq!(pool.allocated(), 1);
    }

    #[test]
    fn pool_is_bounded() {
        let mut pool: SlotPool<Scratch> = SlotPool::with_capacity(2);
        let slots: Vec<Scratch> = (0..5).map(|_| pool.take()).collect();
        for s in slots {
            pool.release(s);
        }
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.allocated(), 5);
    }
}
