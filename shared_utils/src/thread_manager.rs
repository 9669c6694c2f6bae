//! Thread budgeting for workloads that fan out to external processes.
//!
//! CPU cores are a fixed budget split between parallel tasks (width) and the
//! threads each child process may use (depth):
//! `parallel_tasks * child_threads <= available cores`.

use std::sync::OnceLock;

static OPTIMAL_TASKS: OnceLock<usize> = OnceLock::new();

/// Thread allocation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAllocation {
    /// Number of jobs running at the same time.
    pub parallel_tasks: usize,
    /// Threads each child process is expected to use.
    pub child_threads: usize,
}

/// Cores minus a reserve for the OS and the terminal (20%, 1..=2 cores).
fn available_cores(total_cores: usize) -> usize {
    let reserved = ((total_cores as f64 * 0.2).ceil() as usize).clamp(1, 2);
    total_cores.saturating_sub(reserved).max(1)
}

/// Texture tools are short-lived children that each use a couple of
/// threads, so width gets the budget, capped at 8.
pub fn balanced_config_for(total_cores: usize) -> ThreadAllocation {
    let child_threads = 2;
    let parallel_tasks = (available_cores(total_cores) / child_threads).clamp(1, 8);
    ThreadAllocation {
        parallel_tasks,
        child_threads,
    }
}

pub fn get_balanced_thread_config() -> ThreadAllocation {
    balanced_config_for(num_cpus::get())
}

/// Cached default worker count for external tool batches.
pub fn get_optimal_threads() -> usize {
    *OPTIMAL_TASKS.get_or_init(|| get_balanced_thread_config().parallel_tasks)
}

/// `requested == 0` means "pick for me".
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested == 0 {
        get_optimal_threads()
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_external_tool_allocation_on_ten_cores() {
        let alloc = balanced_config_for(10);
        assert_eq!(alloc, ThreadAllocation { parallel_tasks: 4, child_threads: 2 });
    }

    #[test]
    fn test_single_core_still_gets_one_worker() {
        let alloc = balanced_config_for(1);
        assert_eq!(alloc.parallel_tasks, 1);
    }

    #[test]
    fn test_resolve_worker_count() {
        assert_eq!(resolve_worker_count(6), 6);
        assert!(resolve_worker_count(0) >= 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_allocation_fits_budget(cores in 1usize..256) {
            let alloc = balanced_config_for(cores);
            prop_assert!(alloc.parallel_tasks >= 1);
            prop_assert!(alloc.parallel_tasks <= 8);
            prop_assert!(alloc.parallel_tasks * alloc.child_threads <= cores.max(2));
        }
    }
}
