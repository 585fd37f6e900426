//! Shared outbound request gate.
//!
//! The limiter enforces two independent constraints: a minimum delay since the
//! previous request completed and a cap on requests in flight. Both thresholds
//! are read from the [`SettingsStore`] on every acquisition, so changes apply
//! to the next decision without rebuilding the limiter.

use crate::error::{NetError, Result};
use scout_core::SettingsStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct LimiterState {
    in_flight: usize,
    last_completed: Option<Instant>,
}

enum Admission {
    Granted,
    WaitForSlot,
    WaitFor(Duration),
}

/// Paces outbound requests and caps how many are in flight.
#[derive(Debug)]
pub struct RateLimiter {
    settings: SettingsStore,
    state: Mutex<LimiterState>,
    released: Notify,
}

impl RateLimiter {
    /// Create a limiter reading its thresholds from `settings`.
    #[must_use]
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            settings,
            state: Mutex::new(LimiterState::default()),
            released: Notify::new(),
        }
    }

    /// Wait until a request may be issued, then occupy one slot.
    ///
    /// The slot is released when the returned [`RatePermit`] is dropped.
    ///
    /// # Errors
    /// Returns [`NetError::Cancelled`] if `cancel` fires while waiting.
    pub async fn acquire(self: &Arc<Self>, cancel: &CancellationToken) -> Result<RatePermit> {
        loop {
            if cancel.is_cancelled() {
                return Err(NetError::Cancelled);
            }

            // Register for release notifications before inspecting state so a
            // release between the check and the wait is not missed.
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_admit() {
                Admission::Granted => {
                    return Ok(RatePermit {
                        limiter: Arc::clone(self),
                    })
                }
                Admission::WaitForSlot => {
                    tracing::debug!("Request slots exhausted, waiting for release");
                    tokio::select! {
                        () = cancel.cancelled() => return Err(NetError::Cancelled),
                        () = &mut notified => {}
                    }
                }
                Admission::WaitFor(wait) => {
                    tracing::debug!("Throttling request for {:.2}s", wait.as_secs_f64());
                    tokio::select! {
                        () = cancel.cancelled() => return Err(NetError::Cancelled),
                        () = tokio::time::sleep(wait) => {}
                        () = &mut notified => {}
                    }
                }
            }
        }
    }

    /// Number of acquired-but-not-released permits.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    fn try_admit(&self) -> Admission {
        let network = self.settings.network();
        let mut state = self.lock();

        if state.in_flight >= network.concurrency_cap() {
            return Admission::WaitForSlot;
        }

        if let Some(last) = state.last_completed {
            let ready_at = last + network.minimum_delay();
            let now = Instant::now();
            if ready_at > now {
                return Admission::WaitFor(ready_at - now);
            }
        }

        state.in_flight += 1;
        Admission::Granted
    }

    fn release(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.last_completed = Some(Instant::now());
        }
        self.released.notify_waiters();
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One occupied request slot; dropping it releases the slot exactly once.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct RatePermit {
    limiter: Arc<RateLimiter>,
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
