//! Fans one entity out to every applicable module and collects the results.
//!
//! Each module runs in its own task. A module error or panic becomes a
//! degraded [`ModuleResult`] instead of failing the scan, and progress is
//! published on a `watch` channel after every completion.

use crate::error::{Result, ScanError};
use futures::FutureExt;
use scout_cache::Cache;
use scout_core::{Entity, EntityKind, EthicsPolicy, ModuleResult, ScoutError, SettingsStore};
use scout_modules::{ModuleContext, ModuleRegistry, OsintModule};
use scout_net::Fetcher;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Why a scan ended in [`ScanState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No registered module supports the target
    NoApplicableModules,
    /// The ethics gate rejected the target
    BlockedByPolicy(String),
    /// The raw input did not parse as a target
    InvalidTarget(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoApplicableModules => f.write_str("no applicable modules"),
            Self::BlockedByPolicy(reason) => write!(f, "blocked by ethics policy: {reason}"),
            Self::InvalidTarget(reason) => write!(f, "invalid target: {reason}"),
        }
    }
}

/// Scanner lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    /// Nothing running; also the state after a cancelled scan
    Idle,
    /// Modules are running; `progress` is the settled fraction in `[0, 1]`
    Running {
        /// Completed modules over applicable modules
        progress: f64,
    },
    /// The last scan settled with a full result set
    Completed,
    /// The last scan was rejected before any module ran
    Failed(FailureReason),
}

impl ScanState {
    /// Whether a scan is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Results of one completed scan, sorted by module name.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The scanned target
    pub entity: Entity,
    /// One result per applicable module that was not cancelled
    pub results: Vec<ModuleResult>,
}

/// What one module task settled with.
enum TaskOutcome {
    Finished(ModuleResult),
    Cancelled,
}

/// Clears the active scan when dropped, also when the scan future is dropped
/// mid-flight.
struct ActiveScan<'a> {
    scanner: &'a Scanner,
}

impl Drop for ActiveScan<'_> {
    fn drop(&mut self) {
        self.scanner.lock_active().take();
        self.scanner.state.send_if_modified(|state| {
            if state.is_running() {
                *state = ScanState::Idle;
                true
            } else {
                false
            }
        });
    }
}

/// Orchestrates scans over a [`ModuleRegistry`].
///
/// One scan runs at a time; [`Scanner::cancel`] stops it from any task.
pub struct Scanner {
    registry: Arc<ModuleRegistry>,
    fetcher: Arc<Fetcher>,
    cache: Arc<Cache>,
    settings: SettingsStore,
    state: watch::Sender<ScanState>,
    active: Mutex<Option<CancellationToken>>,
}

impl Scanner {
    /// Create an idle scanner over shared network and cache handles.
    #[must_use]
    pub fn new(
        registry: Arc<ModuleRegistry>,
        fetcher: Arc<Fetcher>,
        cache: Arc<Cache>,
        settings: SettingsStore,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            registry,
            fetcher,
            cache,
            settings,
            state,
            active: Mutex::new(None),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Receiver observing every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// The registry this scanner selects modules from.
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Cancel the running scan, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.lock_active().as_ref() {
            tracing::info!("Cancelling scan");
            token.cancel();
        }
    }

    /// Gate, parse and scan raw user input.
    ///
    /// With no `kind`, the kind is detected from the input.
    pub async fn scan_input(&self, raw: &str, kind: Option<EntityKind>) -> Result<ScanOutcome> {
        let (active, token) = self.begin()?;
        let policy = EthicsPolicy::new(self.settings.snapshot().ethics);

        if let Err(e) = policy.check_input(raw) {
            return Err(self.reject_by_policy(&e));
        }
        let parsed = match kind {
            Some(kind) => Entity::parse(raw, kind),
            None => Entity::detect(raw),
        };
        let entity = match parsed {
            Ok(entity) => entity,
            Err(e) => {
                self.fail(FailureReason::InvalidTarget(e.to_string()));
                return Err(e.into());
            }
        };

        let results = self.execute(&entity, token).await;
        drop(active);
        results.map(|results| ScanOutcome { entity, results })
    }

    /// Scan an already validated entity.
    pub async fn scan(&self, entity: &Entity) -> Result<ScanOutcome> {
        let (active, token) = self.begin()?;
        let results = self.execute(entity, token).await;
        drop(active);
        results.map(|results| ScanOutcome {
            entity: entity.clone(),
            results,
        })
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<(ActiveScan<'_>, CancellationToken)> {
        let mut active = self.lock_active();
        if active.is_some() {
            return Err(ScanError::AlreadyRunning);
        }
        let token = CancellationToken::new();
        *active = Some(token.clone());
        Ok((ActiveScan { scanner: self }, token))
    }

    fn fail(&self, reason: FailureReason) {
        tracing::warn!("Scan rejected: {reason}");
        self.state.send_replace(ScanState::Failed(reason));
    }

    fn reject_by_policy(&self, error: &ScoutError) -> ScanError {
        let reason = match error {
            ScoutError::BlockedByPolicy(reason) => reason.clone(),
            other => other.to_string(),
        };
        self.fail(FailureReason::BlockedByPolicy(reason.clone()));
        ScanError::BlockedByPolicy(reason)
    }

    async fn execute(&self, entity: &Entity, token: CancellationToken) -> Result<Vec<ModuleResult>> {
        let settings = self.settings.snapshot();

        if let Err(e) = EthicsPolicy::new(settings.ethics.clone()).check(entity) {
            return Err(self.reject_by_policy(&e));
        }

        let allow_paid = !settings.sources.free_sources_only;
        let modules = self.registry.applicable(entity, allow_paid);
        if modules.is_empty() {
            self.fail(FailureReason::NoApplicableModules);
            return Err(ScanError::NoApplicableModules {
                kind: entity.kind(),
                target: entity.value().to_string(),
            });
        }

        let total = modules.len();
        tracing::info!(entity = %entity, kind = %entity.kind(), modules = total, "Starting scan");
        self.state.send_replace(ScanState::Running { progress: 0.0 });

        let ctx = ModuleContext::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.cache),
            settings,
            token.clone(),
        );
        let mut tasks = JoinSet::new();
        for module in modules {
            let span = tracing::info_span!("module", id = module.id(), entity = %entity);
            tasks.spawn(run_module(module, entity.clone(), ctx.clone()).instrument(span));
        }

        let mut results = Vec::with_capacity(total);
        let mut settled = 0usize;
        loop {
            let joined = tokio::select! {
                biased;
                () = token.cancelled() => {
                    tasks.abort_all();
                    while tasks.join_next().await.is_some() {}
                    tracing::info!(entity = %entity, settled, "Scan cancelled");
                    self.state.send_replace(ScanState::Idle);
                    return Err(ScanError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else { break };

            match joined {
                Ok(TaskOutcome::Finished(result)) => results.push(result),
                Ok(TaskOutcome::Cancelled) => {}
                Err(e) => tracing::error!("Module task failed to join: {e}"),
            }
            settled += 1;
            self.state.send_replace(ScanState::Running {
                progress: fraction(settled, total),
            });
        }

        results.sort_by(|a, b| {
            a.module_name
                .cmp(&b.module_name)
                .then_with(|| a.module_id.cmp(&b.module_id))
        });
        let failures = results.iter().filter(|r| r.is_failure()).count();
        tracing::info!(
            entity = %entity,
            results = results.len(),
            failures,
            "Scan completed"
        );
        self.state.send_replace(ScanState::Completed);
        Ok(results)
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("registry", &self.registry)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn fraction(settled: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        settled as f64 / total as f64
    }
}

async fn run_module(module: Arc<dyn OsintModule>, entity: Entity, ctx: ModuleContext) -> TaskOutcome {
    let outcome = AssertUnwindSafe(module.run(&entity, &ctx))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(result)) => {
            tracing::debug!(artifacts = result.artifacts.len(), "Module finished");
            TaskOutcome::Finished(result)
        }
        Ok(Err(ScoutError::Cancelled)) => {
            tracing::debug!("Module cancelled");
            TaskOutcome::Cancelled
        }
        Ok(Err(e)) => {
            tracing::warn!("Module failed: {e}");
            TaskOutcome::Finished(ModuleResult::failed(module.id(), module.name(), &entity, &e))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Module panicked: {message}");
            let error = format!("panicked: {message}");
            TaskOutcome::Finished(ModuleResult::failed(module.id(), module.name(), &entity, &error))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
