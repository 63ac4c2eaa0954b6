//! Parallelism configuration and thread pool helpers.
//!
//! Kernels never own a thread pool. The caller passes an optional
//! [`rayon::ThreadPool`] handle per call; `None` means run serially.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, components may use `rayon` parallel iterators, which run
/// on whatever pool is installed around them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Parallel only when a pool with more than one thread is supplied.
    #[inline]
    pub fn from_pool(pool: Option<&ThreadPool>) -> Self {
        match pool {
            Some(pool) if pool.current_num_threads() > 1 => Parallelism::Parallel,
            _ => Parallelism::Sequential,
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    #[inline]
    pub fn maybe_par_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().for_each(f);
        } else {
            iter.into_iter().for_each(f);
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Build the pool handle for a thread count.
///
/// - `0` = all available cores
/// - `1` = no pool (serial)
/// - `n > 1` = exactly `n` threads
pub fn build_thread_pool(n_threads: usize) -> Result<Option<ThreadPool>, ThreadPoolBuildError> {
    if n_threads == 1 {
        return Ok(None);
    }
    ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .map(Some)
}

/// Run a closure inside `pool` when it allows parallelism, inline otherwise.
///
/// The closure receives the [`Parallelism`] it may use.
#[inline]
pub fn run_in_pool<T: Send>(pool: Option<&ThreadPool>, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    match pool {
        Some(pool) if Parallelism::from_pool(Some(pool)).is_parallel() => {
            pool.install(|| f(Parallelism::Parallel))
        }
        _ => f(Parallelism::Sequential),
    }
}
