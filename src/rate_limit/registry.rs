//! Concurrent table of per-scope sliding windows.
//!
//! Each [`ScopeKey`] owns its own [`SlidingWindow`] behind its own mutex, so
//! admissions against different keys never wait on each other. Admissions
//! hold the shared table lock while they lock a key's window; only creating
//! a window or dropping windows takes the table lock exclusively.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use telegram_api_client::rate_limit::{LimiterRegistry, Scope, ScopeKey, ScopeLimit};
//!
//! let registry = LimiterRegistry::new();
//! let scope = Scope::new(
//!     "chat:42".parse::<ScopeKey>().unwrap(),
//!     ScopeLimit::new(Duration::from_millis(100), 1),
//! );
//!
//! assert!(registry.check_and_admit(&scope).is_admitted());
//! assert!(!registry.check_and_admit(&scope).is_admitted());
//!
//! registry.reset_all();
//! assert!(registry.check_and_admit(&scope).is_admitted());
//! ```

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use crate::rate_limit::{Admission, Scope, ScopeKey, SlidingWindow};

/// Owner of all rate limit state for one bot.
///
/// Windows are created lazily on the first admission check for a key and
/// live until [`reset_all`](Self::reset_all), [`reset_scope`](Self::reset_scope)
/// or [`cleanup`](Self::cleanup) drops them. Share one registry between
/// handlers with an `Arc` to make them count against the same limits.
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    windows: RwLock<HashMap<ScopeKey, Mutex<SlidingWindow>>>,
}

impl LimiterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a scope and record the request if it fits.
    ///
    /// Purging, counting and recording happen under the scope's mutex, so
    /// concurrent callers never over-admit a scope. The window stays in the
    /// table for the whole check, so [`cleanup`](Self::cleanup) cannot drop
    /// it halfway. If the scope was previously seen with a different limit,
    /// the new limit applies.
    pub fn check_and_admit(&self, scope: &Scope) -> Admission {
        {
            let windows = self.windows.read();
            if let Some(window) = windows.get(&scope.key) {
                return admit(&mut window.lock(), scope);
            }
        }

        let mut windows = self.windows.write();
        let window = windows
            .entry(scope.key.clone())
            .or_insert_with(|| Mutex::new(SlidingWindow::new(scope.limit)));
        admit(window.get_mut(), scope)
    }

    /// Get the remaining permits for a scope without consuming one.
    pub fn remaining(&self, scope: &Scope) -> u32 {
        match self.windows.read().get(&scope.key) {
            Some(window) => window.lock().remaining(),
            None => scope.limit.max_count(),
        }
    }

    /// Clear the state of every scope. Idempotent.
    pub fn reset_all(&self) {
        self.windows.write().clear();
    }

    /// Clear the state of one scope.
    ///
    /// Returns `true` if the scope was being tracked.
    pub fn reset_scope(&self, key: &ScopeKey) -> bool {
        self.windows.write().remove(key).is_some()
    }

    /// Drop windows that have no requests left inside their window.
    pub fn cleanup(&self) {
        self.windows
            .write()
            .retain(|_, window| !window.get_mut().is_empty());
    }

    /// Get the number of scopes being tracked.
    pub fn tracked_scopes(&self) -> usize {
        self.windows.read().len()
    }
}

fn admit(window: &mut SlidingWindow, scope: &Scope) -> Admission {
    if window.limit() != scope.limit {
        window.set_limit(scope.limit);
    }
    window.try_acquire()
}
