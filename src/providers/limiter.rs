use crate::error::{RateError, RateResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Sliding-window request throttle. Requests older than the window are
/// forgotten; once `max_requests` remain inside it, further attempts fail
/// fast without any network I/O.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// One request per rolling hour limit of `max_requests`.
    pub fn per_hour(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(3600))
    }

    pub fn try_acquire(&self) -> RateResult<()> {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();

        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) > self.window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.max_requests {
            debug!(
                limit = self.max_requests,
                in_window = requests.len(),
                "Rate limit tripped"
            );
            return Err(RateError::RateLimitExceeded {
                limit: self.max_requests,
            });
        }

        requests.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_trips_after_max_requests() {
        let limiter = RateLimiter::per_hour(2);

        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());

        let err = limiter.try_acquire().unwrap_err();
        assert!(matches!(err, RateError::RateLimitExceeded { limit: 2 }));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.try_acquire().is_ok());
    }
}
