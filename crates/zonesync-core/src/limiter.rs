// # Rate Limiter
//
// One limiter is shared by every store call of a reconciler, across all
// zones. Each acquisition reserves the next free slot on an evenly spaced
// schedule (one slot every `1s / rate`) and sleeps until that slot, so no
// burst can exceed the configured rate.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Process-wide store API rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    per_second: u32,
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `per_second` acquisitions per second
    ///
    /// A rate of zero is treated as one call per second.
    pub fn new(per_second: u32) -> Self {
        let per_second = per_second.max(1);
        Self {
            per_second,
            interval: Duration::from_secs(1) / per_second,
            next_slot: Mutex::new(None),
        }
    }

    pub fn per_second(&self) -> u32 {
        self.per_second
    }

    /// Wait for one token
    ///
    /// Returns [`Error::Cancelled`] as soon as `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let slot = self.reserve();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(slot) => Ok(()),
        }
    }

    /// Take one token, then drive `call` unless `cancel` fires first
    ///
    /// Every store call of the reconciler goes through here.
    pub async fn call<F, T>(&self, cancel: &CancellationToken, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.acquire(cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            outcome = call => outcome,
        }
    }

    fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match *next {
            Some(reserved) if reserved > now => reserved,
            _ => now,
        };
        *next = Some(slot + self.interval);
        slot
    }
}
