//! Sliding-window rate budgets, keyed by (origin, resource) (§3, §4.2).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Duration;
use harbor_core::{Origin, Timestamp};

/// One (origin, resource) sliding window: the timestamps of acquisitions
/// still inside the window, oldest first.
struct Window {
    limit: u32,
    window: Duration,
    hits: VecDeque<Timestamp>,
}

impl Window {
    fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: VecDeque::new(),
        }
    }

    /// Drop hits that have aged out of the window, then try to record a
    /// new one. Returns whether the acquisition was allowed.
    fn acquire(&mut self, now: Timestamp) -> bool {
        while let Some(oldest) = self.hits.front() {
            if oldest.is_older_than(self.window, now) {
                self.hits.pop_front();
            } else {
                break;
            }
        }

        if self.hits.len() >= self.limit as usize {
            return false;
        }

        self.hits.push_back(now);
        true
    }
}

/// Tracks sliding-window rate budgets for every (origin, resource) pair
/// the Policy Kernel has seen. The kernel is the single point where
/// budgets are decremented (§4.2): callers go through
/// [`GrantStore::acquire_budget`](crate::store::GrantStore::acquire_budget),
/// never this type directly.
pub struct RateBudgets {
    default_limit: u32,
    default_window: Duration,
    windows: Mutex<HashMap<(Origin, String), Window>>,
}

impl RateBudgets {
    /// Create a budget tracker with a default limit and window applied to
    /// every (origin, resource) pair the first time it is seen.
    #[must_use]
    pub fn new(default_limit: u32, default_window: Duration) -> Self {
        Self {
            default_limit,
            default_window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to consume one unit of budget for `(origin, resource)`.
    /// Returns `true` if under the limit (and records the hit), `false`
    /// if the budget is exhausted.
    pub fn acquire(&self, origin: &Origin, resource: &str) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let key = (origin.clone(), resource.to_string());
        let entry = windows
            .entry(key)
            .or_insert_with(|| Window::new(self.default_limit, self.default_window));
        entry.acquire(Timestamp::now())
    }

    /// Number of hits currently counted in the window for `(origin,
    /// resource)`, for diagnostics and tests.
    #[must_use]
    pub fn current_count(&self, origin: &Origin, resource: &str) -> usize {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows
            .get(&(origin.clone(), resource.to_string()))
            .map_or(0, |w| w.hits.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("https://x.test").unwrap()
    }

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let budgets = RateBudgets::new(2, Duration::seconds(60));
        assert!(budgets.acquire(&origin(), "read_file"));
        assert!(budgets.acquire(&origin(), "read_file"));
        assert!(!budgets.acquire(&origin(), "read_file"));
    }

    #[test]
    fn budgets_are_independent_per_resource() {
        let budgets = RateBudgets::new(1, Duration::seconds(60));
        assert!(budgets.acquire(&origin(), "read_file"));
        assert!(budgets.acquire(&origin(), "write_file"));
    }

    #[test]
    fn budgets_are_independent_per_origin() {
        let budgets = RateBudgets::new(1, Duration::seconds(60));
        let other = Origin::new("https://y.test").unwrap();
        assert!(budgets.acquire(&origin(), "read_file"));
        assert!(budgets.acquire(&other, "read_file"));
    }

    #[test]
    fn expired_hits_free_up_the_window() {
        let budgets = RateBudgets::new(1, Duration::seconds(0));
        assert!(budgets.acquire(&origin(), "read_file"));
        // A zero-length window means every prior hit is immediately stale.
        assert!(budgets.acquire(&origin(), "read_file"));
    }
}
