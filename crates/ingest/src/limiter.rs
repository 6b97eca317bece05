//! Token bucket gating outbound RPC calls.
//!
//! The bucket is kept as a "theoretical arrival time": the instant at which
//! the bucket would be full again if nobody took a token from now on. Taking
//! a token pushes it one emission interval forward. A caller may proceed as
//! soon as that instant is no more than `burst - 1` intervals in the future.
//! Slots are reserved under a short lock and waited for outside of it.
use crate::error::Cancelled;
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;


/// Proof that a rate limited call may go out now.
#[must_use]
#[derive(Debug)]
pub struct Permit(());


#[derive(Debug)]
pub struct RateLimiter {
    bucket: Option<Bucket>,
}


#[derive(Debug)]
struct Bucket {
    interval: Duration,
    tolerance: Duration,
    arrival: Mutex<Option<Instant>>,
}


impl RateLimiter {
    /// Admits at most `per_second` calls per second on average and
    /// at most `burst` calls back to back.
    pub fn new(per_second: NonZeroU32, burst: NonZeroU32) -> Self {
        let interval = Duration::from_secs(1) / per_second.get();
        Self {
            bucket: Some(Bucket {
                interval,
                tolerance: interval * (burst.get() - 1),
                arrival: Mutex::new(None),
            })
        }
    }

    /// Limiter that never waits.
    pub fn unbounded() -> Self {
        Self { bucket: None }
    }

    pub fn is_unbounded(&self) -> bool {
        self.bucket.is_none()
    }

    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Permit, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled)
        }

        let Some(bucket) = &self.bucket else {
            return Ok(Permit(()))
        };

        let ready_at = bucket.reserve(Instant::now());

        if ready_at > Instant::now() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = tokio::time::sleep_until(ready_at) => {}
            }
        }

        Ok(Permit(()))
    }
}


impl Bucket {
    fn reserve(&self, now: Instant) -> Instant {
        let mut arrival = self.arrival.lock();
        let tat = match *arrival {
            Some(tat) if tat > now => tat,
            _ => now
        };
        let ready_at = tat.checked_sub(self.tolerance).map_or(now, |t| t.max(now));
        *arrival = Some(tat + self.interval);
        ready_at
    }
}
