//! Read-through cache of decoded chunks.
//!
//! Each key is either ready (a decoded value in an LRU) or loading (a shared
//! handle to the one load running for it). The map lock is only held to look
//! up or install those markers; the loader itself runs on tokio's blocking
//! pool, so loads of different keys proceed in parallel and concurrent loads
//! of the same key collapse into one.

mod stats;

pub use stats::CacheStats;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;

use crate::error::{RegionError, RegionResult};
use crate::nbt::Chunk;
use crate::region::ChunkPos;

type LoadResult<V> = RegionResult<Arc<V>>;
type PendingLoad<V> = Shared<BoxFuture<'static, LoadResult<V>>>;

/// A key is in at most one of the two maps.
struct Slots<K, V> {
    ready: LruCache<K, Arc<V>>,
    loading: HashMap<K, PendingLoad<V>>,
}

/// Concurrency-safe map from key to decoded value with at most one load in
/// flight per key.
///
/// Failed loads are never stored: the key goes back to empty and the next
/// caller starts a fresh load. When a capacity is set, the least recently
/// used ready value is dropped to make room; in-flight loads do not count
/// against it. Must be used from within a tokio runtime.
pub struct ChunkCache<K = ChunkPos, V = Chunk> {
    slots: Arc<Mutex<Slots<K, V>>>,
    stats: Arc<CacheStats>,
}

impl<K, V> ChunkCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// A cache that keeps every ready value until it is evicted by hand.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// A cache holding at most `capacity` ready values. Zero means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        let ready = match NonZeroUsize::new(capacity) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            slots: Arc::new(Mutex::new(Slots {
                ready,
                loading: HashMap::new(),
            })),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Return the cached value for `key`, joining an in-flight load if there
    /// is one, or running `loader` otherwise.
    ///
    /// Dropping the returned future only detaches this caller; the load keeps
    /// running and still fills the cache for everyone else.
    pub async fn get_or_load<F>(&self, key: K, loader: F) -> RegionResult<Arc<V>>
    where
        F: FnOnce() -> RegionResult<V> + Send + 'static,
    {
        let pending = {
            let mut slots = self.lock();
            if let Some(value) = slots.ready.get(&key) {
                self.stats.record_hit();
                return Ok(Arc::clone(value));
            }
            match slots.loading.get(&key) {
                Some(pending) => {
                    self.stats.record_join();
                    pending.clone()
                }
                None => {
                    self.stats.record_miss();
                    // Installed before the guard drops, so the loader cannot
                    // publish its result ahead of its own marker.
                    let pending = self.spawn_load(key.clone(), loader);
                    slots.loading.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn spawn_load<F>(&self, key: K, loader: F) -> PendingLoad<V>
    where
        F: FnOnce() -> RegionResult<V> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let stats = Arc::clone(&self.stats);

        let handle = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = match panic::catch_unwind(AssertUnwindSafe(loader)) {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(RegionError::LoaderPanicked),
            };
            stats.record_load(start.elapsed(), result.is_ok());

            let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.loading.remove(&key);
            match &result {
                Ok(value) => {
                    if let Some((dropped, _)) = slots.ready.push(key.clone(), Arc::clone(value)) {
                        if dropped != key {
                            log::debug!("Cache full, dropped {:?}", dropped);
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Load for {:?} failed, leaving it uncached: {}", key, e);
                }
            }
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    log::error!("Chunk load task did not complete: {}", e);
                    Err(RegionError::LoaderPanicked)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// The decoded value for `key`, if one is ready. Counts as a use.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.lock().ready.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().ready.contains(key)
    }

    pub fn is_loading(&self, key: &K) -> bool {
        self.lock().loading.contains_key(key)
    }

    /// Drop a ready value. In-flight loads are left alone.
    pub fn evict(&self, key: &K) -> bool {
        self.lock().ready.pop(key).is_some()
    }

    /// Number of ready values.
    pub fn len(&self) -> usize {
        self.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of ready values, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        let cap = self.lock().ready.cap().get();
        (cap != usize::MAX).then_some(cap)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn lock(&self) -> MutexGuard<'_, Slots<K, V>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for ChunkCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Condvar;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Blocks loaders until the test opens it.
    #[derive(Clone, Default)]
    struct Gate(Arc<(Mutex<bool>, Condvar)>);

    impl Gate {
        fn wait(&self) {
            let (open, cvar) = &*self.0;
            let mut open = open.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
        }

        fn open(&self) {
            let (open, cvar) = &*self.0;
            *open.lock().unwrap() = true;
            cvar.notify_all();
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_loads_once_then_hits() {
        let cache: ChunkCache<ChunkPos, u32> = ChunkCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let pos = ChunkPos::new(1, 2);

        for _ in 0..3 {
            let calls = calls.clone();
            let value = cache
                .get_or_load(pos, move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(*value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits.load(Ordering::Relaxed), 2);
        assert_eq!(cache.stats().misses.load(Ordering::Relaxed), 1);
        assert!(cache.contains(&pos));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_key_loads_once() {
        const CALLERS: usize = 16;
        let cache: Arc<ChunkCache<ChunkPos, String>> = Arc::new(ChunkCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Gate::default();
        let pos = ChunkPos::new(-5, 9);

        let mut tasks = Vec::new();
        for _ in 0..CALLERS {
            let cache = cache.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_load(pos, move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.wait();
                        Ok("decoded".to_string())
                    })
                    .await
            }));
        }

        wait_for(|| cache.stats().joined.load(Ordering::SeqCst) == CALLERS - 1).await;
        assert!(cache.is_loading(&pos));
        gate.open();

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(*results[0], "decoded");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_load_in_parallel() {
        const KEYS: i32 = 8;
        let cache: Arc<ChunkCache<ChunkPos, i32>> = Arc::new(ChunkCache::new());
        let start = Instant::now();

        let mut tasks = Vec::new();
        for x in 0..KEYS {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_load(ChunkPos::new(x, 0), move || {
                        std::thread::sleep(Duration::from_millis(200));
                        Ok::<_, RegionError>(x)
                    })
                    .await
            }));
        }
        for (x, task) in tasks.into_iter().enumerate() {
            assert_eq!(*task.await.unwrap().unwrap(), x as i32);
        }

        // Serialized loading would take KEYS * 200ms.
        assert!(start.elapsed() < Duration::from_millis(800), "{:?}", start.elapsed());
        assert_eq!(cache.len(), KEYS as usize);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_is_not_cached() {
        let cache: ChunkCache<ChunkPos, u8> = ChunkCache::new();
        let pos = ChunkPos::new(0, 0);

        let err = cache
            .get_or_load(pos, || {
                Err(RegionError::ShortRead { offset: 8192, expected: 5, got: 0 })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegionError::ShortRead { .. }));
        assert!(!cache.contains(&pos));
        assert!(!cache.is_loading(&pos));

        let value = cache.get_or_load(pos, || Ok(7)).await.unwrap();
        assert_eq!(*value, 7);
        assert_eq!(cache.stats().failed_loads.load(Ordering::Relaxed), 1);
        assert_eq!(cache.stats().loads.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_share_one_failure() {
        const CALLERS: usize = 8;
        let cache: Arc<ChunkCache<ChunkPos, u8>> = Arc::new(ChunkCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Gate::default();
        let pos = ChunkPos::new(3, 3);

        let mut tasks = Vec::new();
        for _ in 0..CALLERS {
            let cache = cache.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_load(pos, move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.wait();
                        Err(RegionError::UnsupportedCompression(9))
                    })
                    .await
            }));
        }

        wait_for(|| cache.stats().joined.load(Ordering::SeqCst) == CALLERS - 1).await;
        gate.open();

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert!(matches!(err, RegionError::UnsupportedCompression(9)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_abandoned_caller_does_not_cancel_load() {
        let cache: ChunkCache<ChunkPos, u64> = ChunkCache::new();
        let gate = Gate::default();
        let pos = ChunkPos::new(10, -10);

        let loader_gate = gate.clone();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            cache.get_or_load(pos, move || {
                loader_gate.wait();
                Ok(99)
            }),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(cache.is_loading(&pos));

        gate.open();
        wait_for(|| cache.contains(&pos)).await;

        let value = cache
            .get_or_load(pos, || panic!("value should already be cached"))
            .await
            .unwrap();
        assert_eq!(*value, 99);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_loader_panic_is_not_cached() {
        let cache: ChunkCache<ChunkPos, u8> = ChunkCache::new();
        let pos = ChunkPos::new(1, 1);

        let err = cache
            .get_or_load(pos, || panic!("decoder exploded"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegionError::LoaderPanicked));

        assert_eq!(*cache.get_or_load(pos, || Ok(1)).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_evict_only_ready_values() {
        let cache: ChunkCache<ChunkPos, u8> = ChunkCache::new();
        let gate = Gate::default();
        let ready = ChunkPos::new(0, 1);
        let loading = ChunkPos::new(0, 2);

        cache.get_or_load(ready, || Ok(1)).await.unwrap();
        assert_eq!(cache.get(&ready).as_deref(), Some(&1));

        let loader_gate = gate.clone();
        let _ = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_load(loading, move || {
                loader_gate.wait();
                Ok(2)
            }),
        )
        .await;

        assert!(!cache.evict(&loading));
        assert!(cache.evict(&ready));
        assert!(cache.get(&ready).is_none());

        gate.open();
        wait_for(|| cache.contains(&loading)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_capacity_drops_least_recently_used() {
        let cache: ChunkCache<ChunkPos, i32> = ChunkCache::with_capacity(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let load = |x: i32| {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RegionError>(x)
            }
        };
        let (a, b, c) = (ChunkPos::new(0, 0), ChunkPos::new(1, 0), ChunkPos::new(2, 0));

        cache.get_or_load(a, load(0)).await.unwrap();
        cache.get_or_load(b, load(1)).await.unwrap();
        // Touch `a` so `b` becomes the oldest.
        assert_eq!(*cache.get_or_load(a, load(0)).await.unwrap(), 0);
        cache.get_or_load(c, load(2)).await.unwrap();

        assert_eq!(cache.capacity(), Some(2));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert_eq!(*cache.get_or_load(b, load(1)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(!cache.contains(&a));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_default_is_unbounded() {
        let cache: ChunkCache<ChunkPos, u8> = ChunkCache::new();
        assert_eq!(cache.capacity(), None);
        assert_eq!(ChunkCache::<ChunkPos, u8>::with_capacity(5).capacity(), Some(5));
    }
}
