//! Pacing for calls to rate limited providers.

use std::{future::Future, time::Duration};

use tokio::{sync::Mutex, time::Instant};

/// Default pause between two consecutive synthesis calls
pub const DEFAULT_SYNTHESIS_INTERVAL: Duration = Duration::from_millis(1000);

pub trait RateLimiter {
    /// Resolves once the next call is allowed to go out
    fn acquire(&self) -> impl Future<Output = ()> + Send;
}

/// No pacing at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    async fn acquire(&self) {}
}

/// Spaces calls at least `interval` apart.
///
/// The first call goes out immediately.
#[derive(Debug)]
pub struct FixedInterval {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHESIS_INTERVAL)
    }
}

impl RateLimiter for FixedInterval {
    async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!(wait = ?(ready_at - Instant::now()), "Waiting for rate limit");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
