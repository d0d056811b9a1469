//! Consecutive-failure circuit breaker for the renderer session
//!
//! One process-wide counter tracks retry-exhausted operations in a row. Any
//! success resets it. When it reaches the threshold the caller recycles its
//! renderer session, sleeps the cooldown and starts counting again.
//!
//! Per-category health is tracked alongside for reporting.

use dashmap::DashMap;
use log::{debug, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Health counters for a single category
#[derive(Debug, Clone, Default)]
pub struct CategoryHealth {
    /// Operations that succeeded
    pub total_successes: u32,
    /// Operations that failed after every attempt
    pub total_exhausted: u32,
    /// Last time an operation for this category succeeded
    pub last_success: Option<Instant>,
}

/// Circuit breaker shared by every worker lane
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    trips: AtomicU32,
    threshold: u32,
    cooldown: Duration,
    categories: DashMap<String, CategoryHealth>,
}

impl CircuitBreaker {
    /// Create a breaker that trips after `threshold` exhausted operations in a row
    #[must_use]
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            trips: AtomicU32::new(0),
            threshold: threshold.max(1),
            cooldown,
            categories: DashMap::new(),
        }
    }

    /// Record a successful operation; resets the consecutive counter
    pub fn record_success(&self, category_id: &str) {
        let previous = self.consecutive_failures.swap(0, Ordering::AcqRel);
        if previous > 0 {
            debug!("Circuit counter reset after {previous} consecutive failures ({category_id})");
        }
        let mut health = self.categories.entry(category_id.to_string()).or_default();
        health.total_successes += 1;
        health.last_success = Some(Instant::now());
    }

    /// Record a retry-exhausted operation.
    ///
    /// Returns `true` when this failure reached the threshold. The counter
    /// is reset in the same step so exactly one caller observes the trip.
    pub fn record_exhausted(&self, category_id: &str) -> bool {
        self.categories
            .entry(category_id.to_string())
            .or_default()
            .total_exhausted += 1;

        let threshold = self.threshold;
        let tripped = self
            .consecutive_failures
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                let next = n + 1;
                Some(if next >= threshold { 0 } else { next })
            })
            .map(|prev| prev + 1 >= threshold)
            .unwrap_or(false);

        if tripped {
            let trips = self.trips.fetch_add(1, Ordering::AcqRel) + 1;
            warn!(
                "Circuit breaker tripped after {threshold} consecutive exhausted operations (trip #{trips}, last category {category_id})"
            );
        } else {
            debug!(
                "Exhausted operation for {category_id}: {}/{threshold} consecutive",
                self.consecutive_failures()
            );
        }
        tripped
    }

    /// Reset the counter after a recycle triggered outside the breaker
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Number of times the threshold was reached
    #[must_use]
    pub fn trips(&self) -> u32 {
        self.trips.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    #[must_use]
    pub fn health(&self, category_id: &str) -> Option<CategoryHealth> {
        self.categories.get(category_id).map(|h| h.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_once_per_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::ZERO);
        let trips: Vec<bool> = (0..7).map(|_| breaker.record_exhausted("c")).collect();
        assert_eq!(trips, [false, false, true, false, false, true, false]);
        assert_eq!(breaker.trips(), 2);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[test]
    fn success_resets_streak() {
        let breaker = CircuitBreaker::new(2, Duration::ZERO);
        assert!(!breaker.record_exhausted("a"));
        breaker.record_success("b");
        assert!(!breaker.record_exhausted("a"));
        assert!(breaker.record_exhausted("a"));

        let health = breaker.health("a").unwrap();
        assert_eq!(health.total_exhausted, 3);
        assert_eq!(health.total_successes, 0);
        assert!(breaker.health("b").unwrap().last_success.is_some());
    }
}
