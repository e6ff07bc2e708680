use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use common::ObjectCache;

use super::DLList;

/// Process-shareable pool of [`DLList`]s.
///
/// Labeling passes acquire a list, fill it, and release it when done. The
/// node and builder caches of a released list survive, so a steady stream of
/// frames stops allocating after warm-up. Acquire and release may happen on
/// any thread; a single list is used by one pass at a time.
#[derive(Debug, Default)]
pub struct ListPool {
    cache: ObjectCache<DLList>,
    live: AtomicUsize,
}

impl ListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `max_cached` idle lists. Extra released lists are dropped.
    pub fn with_capacity_limit(max_cached: usize) -> Self {
        Self {
            cache: ObjectCache::with_limit(max_cached),
            live: AtomicUsize::new(0),
        }
    }

    /// Takes an idle list, or creates a new one.
    pub fn acquire(&self) -> DLList {
        self.live.fetch_add(1, Ordering::Relaxed);
        self.cache.acquire_with(DLList::new)
    }

    /// Clears `list` and returns it to the pool.
    ///
    /// A list that was not acquired here is still cached but leaves the live
    /// count at zero.
    pub fn release(&self, mut list: DLList) {
        list.clear();
        if self
            .live
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_err()
        {
            log::warn!("released a list that was not acquired from this pool");
        }
        if !self.cache.release(list) {
            log::trace!(
                "list pool is full ({} idle), dropping released list",
                self.cache.max_cached()
            );
        }
    }

    /// Acquires a list that goes back to the pool when the guard drops.
    pub fn checkout(&self) -> PooledList<'_> {
        PooledList {
            pool: self,
            list: Some(self.acquire()),
        }
    }

    /// Idle lists waiting for reuse.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Lists acquired and not yet released.
    pub fn live_lists(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// A [`DLList`] borrowed from a [`ListPool`].
pub struct PooledList<'a> {
    pool: &'a ListPool,
    list: Option<DLList>,
}

impl Deref for PooledList<'_> {
    type Target = DLList;

    fn deref(&self) -> &DLList {
        self.list.as_ref().expect("pooled list already released")
    }
}

impl DerefMut for PooledList<'_> {
    fn deref_mut(&mut self) -> &mut DLList {
        self.list.as_mut().expect("pooled list already released")
    }
}

impl Drop for PooledList<'_> {
    fn drop(&mut self) {
        if let Some(list) = self.list.take() {
            self.pool.release(list);
        }
    }
}
