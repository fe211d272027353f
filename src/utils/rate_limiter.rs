use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Duration, Instant};

use crate::models::error::PredictError;

/// Bounds concurrent OpenF1 requests and keeps a minimum spacing between
/// request starts. The public API throttles bursts, so the whole weekend
/// load goes through one limiter.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_delay_ms: u64) -> Self {
        RateLimiter {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits for a free slot and for the spacing window to pass.
    /// The slot is released when the returned guard is dropped.
    pub async fn acquire(&self) -> Result<RateLimitGuard, PredictError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PredictError::LimiterClosed)?;

        let mut last_request = self.last_request.lock().await;
        if let Some(wait_time) = last_request
            .map(|last| last.elapsed())
            .filter(|elapsed| *elapsed < self.min_delay)
            .map(|elapsed| self.min_delay - elapsed)
        {
            tracing::debug!("Rate limiting: waiting {:?}", wait_time);
            sleep(wait_time).await;
        }
        *last_request = Some(Instant::now());
        drop(last_request);

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_holds_a_permit_until_dropped() {
        let limiter = RateLimiter::new(2, 0);
        let guard = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available_permits(), 1);
        drop(guard);
        assert_eq!(limiter.available_permits(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_requests_are_spaced() {
        let limiter = RateLimiter::new(4, 200);
        let start = Instant::now();
        let _first = limiter.acquire().await.unwrap();
        let _second = limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
