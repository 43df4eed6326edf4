//! Worker-thread pool configuration (the `set_num_threads` knob).

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

static POOL: Lazy<RwLock<Arc<ThreadPool>>> = Lazy::new(|| RwLock::new(Arc::new(default_pool())));

fn default_pool() -> ThreadPool {
    ThreadPoolBuilder::new().build().expect("default rayon thread pool")
}

/// Configures the worker-thread count backing the two parallel scans (OI
/// checking and blocker detection). With `num_threads == 1` the algorithms
/// are bit-identical to a single-threaded run: iteration order over indices
/// is preserved and every task writes to a disjoint pre-sized slot.
pub fn set_num_threads(num_threads: usize) {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .expect("rayon thread pool with requested worker count");
    *POOL.write() = Arc::new(pool);
}

/// Runs `f` inside the configured pool.
pub(crate) fn run<R: Send>(f: impl FnOnce() -> R + Send) -> R {
    let pool = POOL.read().clone();
    pool.install(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_threaded_pool_runs_work() {
        set_num_threads(1);
        let sum: i32 = run(|| (0..100).sum());
        assert_eq!(sum, 4950);
        *POOL.write() = Arc::new(default_pool());
    }
}
