use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters describing how a [`ChunkCache`](super::ChunkCache) is being used.
#[derive(Debug)]
pub struct CacheStats {
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
    /// Callers that attached to a load already in flight.
    pub joined: AtomicUsize,

    pub loads: AtomicUsize,
    pub failed_loads: AtomicUsize,
    pub total_load_time_us: AtomicU64,
    pub max_load_time_us: AtomicU64,

    pub start_time: Instant,
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            joined: AtomicUsize::new(0),
            loads: AtomicUsize::new(0),
            failed_loads: AtomicUsize::new(0),
            total_load_time_us: AtomicU64::new(0),
            max_load_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self) {
        self.joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self, duration: Duration, ok: bool) {
        if ok {
            self.loads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_loads.fetch_add(1, Ordering::Relaxed);
        }
        let us = duration.as_micros() as u64;
        self.total_load_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_load_time_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed) + self.joined.load(Ordering::Relaxed);
        if total > 0 { (hits as f64 / total as f64) * 100.0 } else { 0.0 }
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.elapsed();
        let loads = self.loads.load(Ordering::Relaxed);
        let failed = self.failed_loads.load(Ordering::Relaxed);
        let attempts = loads + failed;
        let load_total = self.total_load_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let load_max = self.max_load_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let load_avg = if attempts > 0 { load_total / attempts as f64 } else { 0.0 };

        format!(
            "Chunk Cache Report\n\
             ==================\n\
             Session Duration: {:.2?}\n\n\
             [Loads]\n\
             Decoded: {}\n\
             Failed: {}\n\
             Total Time: {:.2} ms\n\
             Avg Time: {:.2} ms/chunk\n\
             Max Time: {:.2} ms\n\n\
             [Lookups]\n\
             Hits: {}\n\
             Misses: {}\n\
             Joined In-Flight: {}\n\
             Hit Rate: {:.1}%\n",
            uptime,
            loads,
            failed,
            load_total,
            load_avg,
            load_max,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.joined.load(Ordering::Relaxed),
            self.hit_rate(),
        )
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}
