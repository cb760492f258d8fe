//! Per-user cooldown gate and global in-flight cap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Accepts at most one request per user per cooldown window, and bounds how
/// many requests are processed concurrently across all users. The per-user
/// check and timestamp update happen under one lock so that two simultaneous
/// duplicate events cannot both be accepted.
pub struct RateLimiter {
    cooldown: Duration,
    last_seen: Mutex<HashMap<i64, Instant>>,
    max_concurrent: usize,
    in_flight: AtomicUsize,
}

/// RAII slot from [`RateLimiter::begin_request`]; releases the global
/// in-flight slot on drop.
pub struct InFlightGuard<'a> {
    limiter: &'a RateLimiter,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.limiter.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RateLimiter {
    pub fn new(cooldown: Duration, max_concurrent: usize) -> Self {
        Self {
            cooldown,
            last_seen: Mutex::new(HashMap::new()),
            max_concurrent,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Reserves one global in-flight slot, or returns None when the system is
    /// already processing `max_concurrent` requests.
    pub fn begin_request(&self) -> Option<InFlightGuard<'_>> {
        let mut current = self.in_flight.load(Ordering::SeqCst);
        loop {
            if current >= self.max_concurrent {
                return None;
            }
            match self.in_flight.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Some(InFlightGuard { limiter: self }),
                Err(observed) => current = observed,
            }
        }
    }

    /// Number of requests currently holding an in-flight slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns true and records now iff the user's last accepted request is at
    /// least one cooldown in the past. Denial leaves state unchanged.
    pub fn allow(&self, user_id: i64) -> bool {
        self.allow_at(user_id, Instant::now())
    }

    fn allow_at(&self, user_id: i64, now: Instant) -> bool {
        let mut last_seen = self.last_seen.lock().expect("rate limiter lock poisoned");
        match last_seen.get(&user_id) {
            Some(last) if now.duration_since(*last) < self.cooldown => false,
            _ => {
                last_seen.insert(user_id, now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: first request accepted, second within cooldown denied, accepted again after.**
    #[test]
    fn test_cooldown_window() {
        let limiter = RateLimiter::new(Duration::from_secs(3), 10);
        let t0 = Instant::now();

        assert!(limiter.allow_at(1, t0));
        assert!(!limiter.allow_at(1, t0 + Duration::from_secs(1)));
        assert!(!limiter.allow_at(1, t0 + Duration::from_millis(2999)));
        assert!(limiter.allow_at(1, t0 + Duration::from_secs(3)));
    }

    /// **Test: denial does not reset the window (no side effect on denial).**
    #[test]
    fn test_denial_leaves_state_unchanged() {
        let limiter = RateLimiter::new(Duration::from_secs(3), 10);
        let t0 = Instant::now();

        assert!(limiter.allow_at(1, t0));
        assert!(!limiter.allow_at(1, t0 + Duration::from_secs(2)));
        // Window still measured from t0, not from the denied attempt.
        assert!(limiter.allow_at(1, t0 + Duration::from_secs(3)));
    }

    /// **Test: limits are independent per user.**
    #[test]
    fn test_users_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(3), 10);
        let t0 = Instant::now();

        assert!(limiter.allow_at(1, t0));
        assert!(limiter.allow_at(2, t0));
        assert!(!limiter.allow_at(1, t0 + Duration::from_secs(1)));
        assert!(!limiter.allow_at(2, t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_cooldown_always_allows() {
        let limiter = RateLimiter::new(Duration::ZERO, 10);
        let t0 = Instant::now();
        assert!(limiter.allow_at(7, t0));
        assert!(limiter.allow_at(7, t0));
    }

    /// **Test: begin_request refuses the request over the cap; dropping a guard frees its slot.**
    #[test]
    fn test_global_in_flight_cap() {
        let limiter = RateLimiter::new(Duration::from_secs(3), 2);

        let first = limiter.begin_request().unwrap();
        let second = limiter.begin_request().unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert!(limiter.begin_request().is_none());

        drop(second);
        assert_eq!(limiter.in_flight(), 1);
        assert!(limiter.begin_request().is_some());

        drop(first);
    }
}
