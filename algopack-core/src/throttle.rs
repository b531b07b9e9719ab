use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide pacing of outbound requests.
///
/// Keeps an "earliest next request" watermark behind a mutex; every fetch
/// waits the watermark out before hitting the wire, then advances it by the
/// minimum spacing. Sharing one limiter `Arc` across all clients serializes
/// pacing across every concurrent pagination run in the process.
///
/// Authorized sessions are not subject to the public-endpoint spacing and
/// skip the wait.
#[derive(Debug)]
pub struct RateLimiter {
    next_at: Mutex<Instant>,
    spacing: Duration,
}

impl RateLimiter {
    /// Default minimum spacing between unauthorized requests.
    pub const DEFAULT_SPACING: Duration = Duration::from_millis(100);

    /// A limiter with the given minimum spacing.
    #[must_use]
    pub fn new(spacing: Duration) -> Self {
        Self {
            next_at: Mutex::new(Instant::now()),
            spacing,
        }
    }

    /// Wait until a request is allowed, then advance the watermark.
    ///
    /// The mutex is held across the sleep so concurrent pagination runs queue
    /// up rather than racing the watermark.
    pub async fn acquire(&self, authorized: bool) {
        let mut next_at = self.next_at.lock().await;
        if !authorized {
            let now = Instant::now();
            if *next_at > now {
                tokio::time::sleep_until(*next_at).await;
            }
        }
        *next_at = Instant::now() + self.spacing;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPACING)
    }
}

#[cfg(test)]
mod tests {
    use super::RateLimiter;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn back_to_back_acquires_are_spaced_apart() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        limiter.acquire(false).await;
        limiter.acquire(false).await;
        limiter.acquire(false).await;

        // First call passes immediately, the next two wait out the watermark.
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn authorized_calls_skip_the_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        limiter.acquire(true).await;
        limiter.acquire(true).await;
        limiter.acquire(true).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn watermark_is_shared_across_callers() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let started = tokio::time::Instant::now();

        let a = Arc::clone(&limiter);
        let b = Arc::clone(&limiter);
        let (_, _) = tokio::join!(
            async move { a.acquire(false).await },
            async move { b.acquire(false).await },
        );

        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
