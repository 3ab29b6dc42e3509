//! Get-or-compute-once cache for expensive expansions.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// Slot for one key; `None` until a computation succeeds
type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Concurrent memoizing map.
///
/// Each key owns a slot guarded by its own mutex. The first caller for a
/// missing key computes the value while holding that slot's lock; callers
/// for the same key wait on the lock and then read the stored value, so the
/// computation runs at most once per key. Callers for other keys are not
/// blocked. Failed computations leave the slot empty and the next caller
/// retries. Entries are never evicted.
pub struct MemoizingCache<K, V> {
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> MemoizingCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Return the cached value for `key`, computing it with `compute` if absent
    ///
    /// # Errors
    ///
    /// Returns the error from `compute`; nothing is cached in that case.
    pub fn get_or_try_compute<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        // Clone the slot out so the map shard is not locked while computing
        let slot: Slot<V> = Arc::clone(&*self.slots.entry(key).or_default());

        let mut value = slot.lock();
        if let Some(cached) = value.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let computed = Arc::new(compute()?);
        *value = Some(Arc::clone(&computed));
        Ok(computed)
    }

    /// Cached value for `key`, without computing it
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = self.slots.get(key).map(|slot| Arc::clone(&*slot))?;
        let value = slot.lock();
        value.clone()
    }

    /// Number of keys with a computed value
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoizingCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_computes_once_per_key() {
        let cache: MemoizingCache<String, usize> = MemoizingCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_compute("01:AB".to_string(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(2)
                })
                .unwrap();
            assert_eq!(*value, 2);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache: MemoizingCache<&str, usize> = MemoizingCache::new();

        let result = cache.get_or_try_compute("01:AB", || Err::<usize, _>("unavailable"));
        assert_eq!(result.unwrap_err(), "unavailable");
        assert!(cache.get(&"01:AB").is_none());

        let value = cache.get_or_try_compute("01:AB", || Ok::<_, &str>(7)).unwrap();
        assert_eq!(*value, 7);
        assert_eq!(cache.get(&"01:AB").as_deref(), Some(&7));
    }

    #[test]
    fn test_concurrent_callers_share_one_computation() {
        let cache: Arc<MemoizingCache<String, Vec<String>>> = Arc::new(MemoizingCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_compute("01:AB".to_string(), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok::<_, String>(vec!["01:01".to_string(), "01:02".to_string()])
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<Vec<String>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }
}
