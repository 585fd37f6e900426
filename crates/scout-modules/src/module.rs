//! The module contract and the context every module run receives.

use async_trait::async_trait;
use scout_cache::Cache;
use scout_core::{AppConfig, Entity, ModuleResult, ScoutError, ValidationError};
use scout_net::{Fetcher, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Broad grouping used for listing modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleCategory {
    /// DNS, registration and certificate data
    Domain,
    /// Web server and archive data
    Web,
    /// IP address metadata
    Ip,
    /// Mail infrastructure
    Email,
    /// Online handles
    Username,
    /// Vulnerability databases
    Vulnerability,
}

impl ModuleCategory {
    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::Web => "Web",
            Self::Ip => "IP",
            Self::Email => "Email",
            Self::Username => "Username",
            Self::Vulnerability => "Vulnerability",
        }
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One pluggable data-source integration.
#[async_trait]
pub trait OsintModule: Send + Sync {
    /// Stable identifier, also the cache-key prefix.
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Listing category.
    fn category(&self) -> ModuleCategory;

    /// Whether the backing source is free to use.
    fn is_free_tier(&self) -> bool {
        true
    }

    /// Whether this module can run against `entity`. Pure and total.
    fn supports(&self, entity: &Entity) -> bool;

    /// Produce a result for `entity`.
    ///
    /// Malformed upstream payloads are reported as [`ScoutError::Decoding`],
    /// never as a panic.
    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError>;
}

/// Reject an entity the module does not support.
pub fn ensure_supported(module: &dyn OsintModule, entity: &Entity) -> Result<(), ScoutError> {
    if module.supports(entity) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedKind {
            module: module.id().to_string(),
            kind: entity.kind().to_string(),
        }
        .into())
    }
}

/// Conventional cache key: module id and entity value.
#[must_use]
pub fn cache_key(module_id: &str, entity: &Entity) -> String {
    format!("{module_id}|{}", entity.value())
}

/// Everything a module run may use: network, cache, settings and the scan's
/// cancellation signal.
///
/// Log output goes through `tracing`; the scanner runs each module inside a
/// span carrying the module id and entity.
#[derive(Clone)]
pub struct ModuleContext {
    /// Shared rate-limited fetcher
    pub fetcher: Arc<Fetcher>,
    /// Shared response cache
    pub cache: Arc<Cache>,
    /// Settings snapshot taken when the scan started
    pub settings: AppConfig,
    /// Fires when the scan is cancelled
    pub cancel: CancellationToken,
}

impl ModuleContext {
    /// Bundle the shared handles for one scan.
    #[must_use]
    pub fn new(
        fetcher: Arc<Fetcher>,
        cache: Arc<Cache>,
        settings: AppConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            cache,
            settings,
            cancel,
        }
    }

    /// Issue `request` through the fetcher.
    pub async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, ScoutError> {
        Ok(self.fetcher.fetch(request, &self.cancel).await?)
    }

    /// GET `url`.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ScoutError> {
        Ok(self.fetcher.get(url, &self.cancel).await?)
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScoutError> {
        Ok(self.fetcher.get_json(url, &self.cancel).await?)
    }

    /// Sleep for `duration` unless the scan is cancelled first.
    ///
    /// # Errors
    /// Returns [`ScoutError::Cancelled`] if cancellation fires during the sleep.
    pub async fn pause(&self, duration: Duration) -> Result<(), ScoutError> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(ScoutError::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Cached result under `key` no older than `max_age`.
    ///
    /// Storage and decoding failures are logged and read as a miss.
    pub async fn cached(&self, key: &str, max_age: Duration) -> Option<ModuleResult> {
        if !self.settings.cache.enabled {
            return None;
        }
        match self.cache.fetch_json::<ModuleResult>(key, max_age).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key, "Cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    /// Store `result` under `key`; failures are logged and ignored.
    pub async fn remember(&self, key: &str, result: &ModuleResult) {
        if !self.settings.cache.enabled {
            return;
        }
        if let Err(e) = self.cache.store_json(key, result).await {
            tracing::warn!(key, "Cache write failed: {e}");
        }
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Build a URL with query parameters, percent-encoding the values.
pub(crate) fn url_with_params(base: &str, params: &[(&str, &str)]) -> Result<String, ScoutError> {
    url::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| ScoutError::Network(format!("invalid URL {base}: {e}")))
}
