//! Rate-limited HTTP execution with bounded retry.

use crate::error::{NetError, Result};
use crate::limiter::RateLimiter;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use scout_core::SettingsStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff before retry number `attempt + 1`: `0.5s * 2^attempt`.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF.saturating_mul(1u32 << attempt.min(16))
}

/// Executes requests through the shared [`RateLimiter`], retrying transport
/// failures and HTTP 429 with exponential backoff.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    settings: SettingsStore,
}

impl Fetcher {
    /// Fetcher over a `reqwest` client configured from the current settings.
    ///
    /// # Errors
    /// Returns [`NetError::Client`] if the HTTP client cannot be built.
    pub fn new(settings: SettingsStore) -> Result<Self> {
        let transport = ReqwestTransport::new(&settings.network())?;
        Ok(Self::with_transport(Arc::new(transport), settings))
    }

    /// Fetcher over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, settings: SettingsStore) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.clone()));
        Self {
            transport,
            limiter,
            settings,
        }
    }

    /// The limiter every request of this fetcher passes through.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Issue `request`, returning the first 2xx/3xx response.
    ///
    /// Each attempt holds one limiter permit for the duration of the transport
    /// call only; backoff sleeps happen with no slot occupied.
    ///
    /// # Errors
    /// - [`NetError::Cancelled`] as soon as `cancel` fires
    /// - [`NetError::Status`] for any other status, without retry
    /// - [`NetError::Transport`] or [`NetError::RateLimited`] once retries run out
    pub async fn fetch(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let retry_limit = self.settings.network().retry_limit;
        let mut attempt: u32 = 0;

        loop {
            let outcome = {
                let _permit = self.limiter.acquire(cancel).await?;
                tracing::debug!(
                    method = request.method.as_str(),
                    url = %request.url,
                    attempt,
                    "Sending request"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(NetError::Cancelled),
                    result = self.transport.send(request) => result,
                }
            };

            let error = match outcome {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if response.status == 429 => NetError::RateLimited {
                    url: request.url.clone(),
                    attempts: attempt + 1,
                },
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "Request rejected");
                    return Err(NetError::Status {
                        status: response.status,
                        url: request.url.clone(),
                    });
                }
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= retry_limit {
                tracing::warn!(url = %request.url, attempts = attempt + 1, "Request failed: {error}");
                return Err(error);
            }

            let delay = backoff_delay(attempt);
            tracing::warn!(
                url = %request.url,
                attempt,
                "Retrying in {:.1}s after: {error}",
                delay.as_secs_f64()
            );
            tokio::select! {
                () = cancel.cancelled() => return Err(NetError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// GET `url`.
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse> {
        self.fetch(&HttpRequest::get(url), cancel).await
    }

    /// HEAD `url`.
    pub async fn head(&self, url: &str, cancel: &CancellationToken) -> Result<HttpResponse> {
        self.fetch(&HttpRequest::head(url), cancel).await
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// # Errors
    /// Returns [`NetError::Decoding`] when the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.get(url, cancel).await?;
        response.json().inspect_err(|e| {
            tracing::warn!(url = %url, "Decoding error: {e}");
        })
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}
