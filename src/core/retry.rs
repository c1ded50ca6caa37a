// src/core/retry.rs
//
// Bounded retry with exponential backoff. Only transient failures are
// retried; the last error is handed back once attempts run out.

use std::thread;
use std::time::Duration;

use crate::error::FetchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub fn none() -> Self {
        Self { max_attempts: 1, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Pause after the failed attempt `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_delay.checked_mul(factor).unwrap_or(self.max_delay).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts are used up.
    /// `op` receives the 0-based attempt number.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Result<T, FetchError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let pause = self.delay_for(attempt);
                    logw!("{label}: attempt {}/{attempts} failed ({e}); retrying in {pause:?}", attempt + 1);
                    thread::sleep(pause);
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        loge!("{label}: giving up after {attempts} attempts: {e}");
                    } else {
                        logd!("{label}: permanent failure: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(350));
        assert_eq!(p.delay_for(40), Duration::from_millis(350));
    }

    #[test]
    fn transient_errors_are_retried_until_success() {
        let mut seen = Vec::new();
        let out = fast(3).run("test", |attempt| {
            seen.push(attempt);
            if attempt < 2 {
                Err(FetchError::Timeout { url: s!("http://x") })
            } else {
                Ok(42)
            }
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn last_error_surfaces_after_exhaustion() {
        let mut calls = 0;
        let out: Result<(), _> = fast(3).run("test", |_| {
            calls += 1;
            Err(FetchError::Status { status: 503, url: s!("http://x") })
        });
        assert_eq!(calls, 3);
        assert!(matches!(out, Err(FetchError::Status { status: 503, .. })));
    }

    #[test]
    fn permanent_errors_stop_immediately() {
        let mut calls = 0;
        let out: Result<(), _> = fast(5).run("test", |_| {
            calls += 1;
            Err(FetchError::Status { status: 404, url: s!("http://x") })
        });
        assert_eq!(calls, 1);
        assert!(out.is_err());
    }
}
