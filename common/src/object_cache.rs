use parking_lot::Mutex;

/// A mutex-protected free-list of reusable objects.
///
/// `acquire` pops a cached object or builds a fresh one, `release` pushes it
/// back. With a non-zero `max_cached`, objects released into a full cache are
/// dropped instead. The lock is only held for the push or pop itself.
#[derive(Debug)]
pub struct ObjectCache<T> {
    cache: Mutex<Vec<T>>,
    max_cached: usize,
}

impl<T> Default for ObjectCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObjectCache<T> {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// Creates a cache that keeps at most `max_cached` objects (0 = unbounded).
    pub fn with_limit(max_cached: usize) -> Self {
        Self {
            cache: Mutex::new(Vec::new()),
            max_cached,
        }
    }

    /// Pops a cached object, or creates one with `create`.
    pub fn acquire_with(&self, create: impl FnOnce() -> T) -> T {
        let cached = self.cache.lock().pop();
        cached.unwrap_or_else(create)
    }

    /// Returns an object to the cache. Returns `false` if the cache was full
    /// and the object was dropped.
    pub fn release(&self, obj: T) -> bool {
        let mut cache = self.cache.lock();
        if self.max_cached > 0 && cache.len() >= self.max_cached {
            return false;
        }
        cache.push(obj);
        true
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn max_cached(&self) -> usize {
        self.max_cached
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl<T: Default> ObjectCache<T> {
    pub fn acquire(&self) -> T {
        self.acquire_with(T::default)
    }
}
