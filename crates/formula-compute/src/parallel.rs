//! Worker threads for row evaluation.
//!
//! Rows run on a pool owned by this crate, never on Rayon's global pool, so evaluation does not
//! compete with whatever else the host schedules there.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::sync::OnceLock;

/// Overrides the worker count for this crate only. `RAYON_NUM_THREADS` is consulted after it.
const THREADS_VAR: &str = "FORMULA_COMPUTE_THREADS";

fn thread_count(var: impl Fn(&str) -> Option<String>) -> NonZeroUsize {
    [THREADS_VAR, "RAYON_NUM_THREADS"]
        .into_iter()
        .find_map(|name| var(name)?.trim().parse::<NonZeroUsize>().ok())
        .or_else(|| std::thread::available_parallelism().ok())
        .unwrap_or(NonZeroUsize::MIN)
}

fn start_pool(threads: NonZeroUsize) -> Option<ThreadPool> {
    let build = |n: usize| {
        ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("formula-compute-{i}"))
            .build()
    };
    match build(threads.get()) {
        Ok(pool) => Some(pool),
        Err(err) if threads.get() > 1 => {
            log::warn!("could not start {threads} row workers ({err}); retrying with one");
            build(1)
                .map_err(|err| {
                    log::warn!("row worker pool unavailable ({err}); evaluating serially")
                })
                .ok()
        }
        Err(err) => {
            log::warn!("row worker pool unavailable ({err}); evaluating serially");
            None
        }
    }
}

/// The crate-local pool, started on first use. `None` when no worker thread could be started.
pub(crate) fn row_pool() -> Option<&'static ThreadPool> {
    static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| start_pool(thread_count(|name| std::env::var(name).ok()))).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(pairs: &[(&str, &str)]) -> usize {
        thread_count(|name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
        .get()
    }

    #[test]
    fn crate_variable_wins_over_rayon_variable() {
        assert_eq!(count(&[(THREADS_VAR, "3"), ("RAYON_NUM_THREADS", "8")]), 3);
        assert_eq!(count(&[(THREADS_VAR, "0"), ("RAYON_NUM_THREADS", "8")]), 8);
        assert_eq!(count(&[("RAYON_NUM_THREADS", " 2 ")]), 2);
    }

    #[test]
    fn unset_or_invalid_counts_use_available_parallelism() {
        let available = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        assert_eq!(count(&[]), available);
        assert_eq!(count(&[(THREADS_VAR, "many")]), available);
    }

    #[test]
    fn single_worker_pool_starts() {
        let pool = start_pool(NonZeroUsize::MIN).unwrap();
        assert_eq!(pool.current_num_threads(), 1);
    }
}
