//! # Exponential Backoff
//!
//! Provides the delay sequence used between locate attempts.
//!
//! Each delay is the previous one times `multiplier`, capped at `max`.
//! An optional jitter ratio shortens every delay by a random fraction of itself,
//! so many pods restarting together do not hit the API server in lockstep.
//!
//! ## Usage
//!
//! ```rust
//! use kube_property_sources::backoff::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::new(Duration::from_millis(100), 2.0, Duration::from_millis(500));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(100));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(200));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(400));
//! assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
//! ```

use rand::Rng;
use std::time::Duration;

/// Exponential backoff calculator
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// First delay, also the value restored by `reset`
    initial: Duration,
    /// Growth factor, at least 1.0
    multiplier: f64,
    /// Upper bound for any delay
    max: Duration,
    /// Delay returned by the next call (before jitter)
    current: Duration,
    /// Fraction of each delay that may be removed at random, in `[0, 1]`
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create a backoff without jitter
    ///
    /// A multiplier below 1.0 is treated as 1.0 (constant delay).
    #[must_use]
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            initial,
            multiplier: multiplier.max(1.0),
            max,
            current: initial.min(max),
            jitter: 0.0,
        }
    }

    /// Enable jitter; the ratio is clamped to `[0, 1]`
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let base = self.current;
        self.current = Duration::try_from_secs_f64(base.as_secs_f64() * self.multiplier)
            .ok()
            .map_or(self.max, |next| next.min(self.max));

        if self.jitter > 0.0 && !base.is_zero() {
            let cut = rand::thread_rng().gen_range(0.0..=self.jitter);
            base.mul_f64(1.0 - cut)
        } else {
            base
        }
    }

    /// Reset the backoff to the initial delay
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}
