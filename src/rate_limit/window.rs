//! Sliding window request counter.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use telegram_api_client::rate_limit::{ScopeLimit, SlidingWindow};
//!
//! let mut window = SlidingWindow::new(ScopeLimit::new(Duration::from_secs(1), 2));
//!
//! assert!(window.try_acquire().is_admitted());
//! assert!(window.try_acquire().is_admitted());
//! assert!(!window.try_acquire().is_admitted());
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::rate_limit::{Admission, ScopeLimit};

/// A sliding window rate limiter.
///
/// Tracks request timestamps within a sliding window and enforces a maximum
/// number of requests within that window. Timestamps are kept oldest first.
#[derive(Debug)]
pub struct SlidingWindow {
    /// Request timestamps, oldest first
    requests: VecDeque<Instant>,
    limit: ScopeLimit,
}

impl SlidingWindow {
    /// Create a new, empty sliding window.
    pub fn new(limit: ScopeLimit) -> Self {
        Self {
            requests: VecDeque::with_capacity(limit.max_count() as usize),
            limit,
        }
    }

    /// Try to admit a request now.
    pub fn try_acquire(&mut self) -> Admission {
        self.try_acquire_at(Instant::now())
    }

    /// Try to admit a request at `now`.
    ///
    /// `now` must not be earlier than any previously recorded timestamp.
    pub fn try_acquire_at(&mut self, now: Instant) -> Admission {
        self.purge(now);

        if (self.requests.len() as u32) < self.limit.max_count() {
            self.requests.push_back(now);
            Admission::Admitted
        } else {
            // The oldest request leaving the window frees the next slot.
            let wait = self
                .requests
                .front()
                .map(|oldest| (*oldest + self.limit.window()).saturating_duration_since(now))
                .unwrap_or_default();
            Admission::Deny { wait }
        }
    }

    /// Get the number of remaining permits.
    pub fn remaining(&self) -> u32 {
        self.remaining_at(Instant::now())
    }

    /// Get the number of remaining permits at `now`.
    pub fn remaining_at(&self, now: Instant) -> u32 {
        self.limit.max_count().saturating_sub(self.live_count(now) as u32)
    }

    /// Check if the window has no active requests.
    pub fn is_empty(&self) -> bool {
        self.live_count(Instant::now()) == 0
    }

    /// The limit this window enforces.
    pub fn limit(&self) -> ScopeLimit {
        self.limit
    }

    /// Change the limit. Recorded timestamps are kept.
    pub fn set_limit(&mut self, limit: ScopeLimit) {
        self.limit = limit;
    }

    fn is_live(&self, ts: Instant, now: Instant) -> bool {
        now.saturating_duration_since(ts) < self.limit.window()
    }

    fn live_count(&self, now: Instant) -> usize {
        self.requests.iter().filter(|ts| self.is_live(**ts, now)).count()
    }

    /// Remove requests that are outside the window.
    fn purge(&mut self, now: Instant) {
        let window = self.limit.window();
        while let Some(oldest) = self.requests.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(window_ms: u64, max_count: u32) -> ScopeLimit {
        ScopeLimit::new(Duration::from_millis(window_ms), max_count)
    }

    #[test]
    fn test_sliding_window_allows_within_limit() {
        let mut window = SlidingWindow::new(limit(1000, 3));
        let now = Instant::now();

        assert!(window.try_acquire_at(now).is_admitted());
        assert!(window.try_acquire_at(now).is_admitted());
        assert!(window.try_acquire_at(now).is_admitted());
        assert!(!window.try_acquire_at(now).is_admitted());
    }

    #[test]
    fn test_deny_wait_points_at_oldest_expiry() {
        let mut window = SlidingWindow::new(limit(100, 2));
        let start = Instant::now();

        window.try_acquire_at(start);
        window.try_acquire_at(start + Duration::from_millis(30));

        let denied = window.try_acquire_at(start + Duration::from_millis(40));
        assert_eq!(
            denied,
            Admission::Deny {
                wait: Duration::from_millis(60)
            }
        );
    }

    #[test]
    fn test_admits_again_once_oldest_expires() {
        let mut window = SlidingWindow::new(limit(100, 1));
        let start = Instant::now();

        assert!(window.try_acquire_at(start).is_admitted());
        let Admission::Deny { wait } = window.try_acquire_at(start + Duration::from_millis(50))
        else {
            panic!("second request in the window must be denied");
        };
        assert!(wait > Duration::ZERO);

        let later = start + Duration::from_millis(50) + wait;
        assert!(window.try_acquire_at(later).is_admitted());
    }

    #[test]
    fn test_remaining() {
        let mut window = SlidingWindow::new(limit(1000, 3));
        let now = Instant::now();

        assert_eq!(window.remaining_at(now), 3);
        window.try_acquire_at(now);
        assert_eq!(window.remaining_at(now), 2);
        window.try_acquire_at(now);
        assert_eq!(window.remaining_at(now), 1);
        assert_eq!(window.remaining_at(now + Duration::from_secs(1)), 3);
    }

    #[test]
    fn test_set_limit_keeps_history() {
        let mut window = SlidingWindow::new(limit(1000, 1));
        let now = Instant::now();

        window.try_acquire_at(now);
        assert!(!window.try_acquire_at(now).is_admitted());

        window.set_limit(limit(1000, 2));
        assert!(window.try_acquire_at(now).is_admitted());
        assert!(!window.try_acquire_at(now).is_admitted());
    }
}
