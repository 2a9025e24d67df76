//! Random jitter sources for retry backoff.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Trait for providing backoff jitter.
///
/// Implementations must be safe to share between concurrent retry loops.
/// Inject [`SeededJitter`] or [`NoJitter`] to make retry timing reproducible.
pub trait JitterSource: Send + Sync {
    /// Return a duration uniformly distributed in `[0, max]`.
    fn jitter(&self, max: Duration) -> Duration;
}

/// Jitter drawn from the thread-local random generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn jitter(&self, max: Duration) -> Duration {
        sample(&mut rand::thread_rng(), max)
    }
}

/// Deterministic jitter from a seeded generator.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    /// Create a jitter source that yields the same sequence for the same seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn jitter(&self, max: Duration) -> Duration {
        sample(&mut *self.rng.lock(), max)
    }
}

/// No jitter at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn jitter(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, max: Duration) -> Duration {
    let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if max_nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..=max_nanos))
}
