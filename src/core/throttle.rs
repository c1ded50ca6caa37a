// src/core/throttle.rs
//
// Minimum-interval gate between outbound requests. One gate per client;
// the crawler's worker pool shares one through `SharedThrottle`.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    /// `rate` requests per second. A non-positive or non-finite rate means no throttling.
    pub fn per_second(rate: f64) -> Self {
        let min_interval = if rate.is_finite() && rate > 0.0 {
            Duration::from_secs_f64(1.0 / rate)
        } else {
            Duration::ZERO
        };
        Self::with_interval(min_interval)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self { min_interval, last_call: None }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a call made right now would have to wait.
    pub fn remaining(&self) -> Duration {
        match self.last_call {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the interval since the previous call has passed, then
    /// stamp this call. Returns the time spent sleeping.
    pub fn wait(&mut self) -> Duration {
        let pause = self.remaining();
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        self.last_call = Some(Instant::now());
        pause
    }
}

/// A `Throttle` behind a mutex. Waiting holds the lock, so concurrent
/// callers are admitted one interval apart.
#[derive(Clone, Debug)]
pub struct SharedThrottle {
    inner: Arc<Mutex<Throttle>>,
}

impl SharedThrottle {
    pub fn new(throttle: Throttle) -> Self {
        Self { inner: Arc::new(Mutex::new(throttle)) }
    }

    pub fn wait(&self) -> Duration {
        // a panicked holder cannot leave the timestamp half-written
        let mut gate = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        gate.wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_does_not_wait() {
        let mut t = Throttle::per_second(1.0);
        assert_eq!(t.wait(), Duration::ZERO);
        assert!(t.remaining() > Duration::from_millis(900));
    }

    #[test]
    fn zero_rate_disables_gate() {
        let mut t = Throttle::per_second(0.0);
        t.wait();
        assert_eq!(t.wait(), Duration::ZERO);
        assert_eq!(t.min_interval(), Duration::ZERO);
    }

    #[test]
    fn rate_maps_to_interval() {
        assert_eq!(Throttle::per_second(4.0).min_interval(), Duration::from_millis(250));
        assert_eq!(Throttle::per_second(0.1).min_interval(), Duration::from_secs(10));
    }
}
