use async_trait::async_trait;
use scout_cache::Cache;
use scout_core::{AppConfig, Artifact, Entity, EntityKind, ModuleResult, ScoutError, SettingsStore};
use scout_modules::{ModuleCategory, ModuleContext, ModuleRegistry, OsintModule};
use scout_net::{Fetcher, HttpRequest, HttpResponse, NetError, Transport};
use scout_scanner::{FailureReason, Report, ScanError, ScanState, Scanner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

/// Transport that only counts calls.
#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: 200,
            url: request.url.clone(),
            ..HttpResponse::default()
        })
    }
}

#[derive(Clone, Copy)]
enum Behaviour {
    /// Fetch once, then return `n` artifacts
    Artifacts(usize),
    Fail,
    Panic,
    /// Sleep until the scan is cancelled
    Hang,
    /// Report cancellation on its own
    Cancelled,
}

struct TestModule {
    id: &'static str,
    name: &'static str,
    kind: EntityKind,
    free: bool,
    behaviour: Behaviour,
}

impl TestModule {
    fn new(id: &'static str, name: &'static str, behaviour: Behaviour) -> Self {
        Self {
            id,
            name,
            kind: EntityKind::Domain,
            free: true,
            behaviour,
        }
    }

    fn paid(mut self) -> Self {
        self.free = false;
        self
    }
}

#[async_trait]
impl OsintModule for TestModule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "test module"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Domain
    }

    fn is_free_tier(&self) -> bool {
        self.free
    }

    fn supports(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        match self.behaviour {
            Behaviour::Artifacts(n) => {
                ctx.get(&format!("https://{}.test/{}", self.id, entity.value())).await?;
                let mut result = ModuleResult::new(self.id, self.name, entity)
                    .with_summary(format!("Found {n} items"));
                for i in 0..n {
                    result.push(Artifact::new("Item", i.to_string()));
                }
                Ok(result)
            }
            Behaviour::Fail => Err(ScoutError::Network("upstream returned 503".to_string())),
            Behaviour::Panic => panic!("module exploded"),
            Behaviour::Hang => {
                ctx.pause(Duration::from_secs(3600)).await?;
                Ok(ModuleResult::new(self.id, self.name, entity))
            }
            Behaviour::Cancelled => Err(ScoutError::Cancelled),
        }
    }
}

/// Module that waits for its gate to open before behaving like `inner`.
struct GatedModule {
    inner: TestModule,
    gate: Arc<Semaphore>,
}

impl GatedModule {
    fn new(inner: TestModule) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                inner,
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait]
impl OsintModule for GatedModule {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn description(&self) -> &'static str {
        self.inner.description()
    }

    fn category(&self) -> ModuleCategory {
        self.inner.category()
    }

    fn supports(&self, entity: &Entity) -> bool {
        self.inner.supports(entity)
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        let _open = self.gate.acquire().await.expect("gate stays open");
        self.inner.run(entity, ctx).await
    }
}

async fn build(modules: Vec<TestModule>, config: AppConfig) -> (Arc<Scanner>, Arc<CountingTransport>, SettingsStore) {
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register(module);
    }
    let settings = SettingsStore::new(config);
    let transport = Arc::new(CountingTransport::default());
    let fetcher = Fetcher::with_transport(transport.clone(), settings.clone());
    let cache = Cache::in_memory().await.expect("open in-memory cache");
    let scanner = Scanner::new(
        Arc::new(registry),
        Arc::new(fetcher),
        Arc::new(cache),
        settings.clone(),
    );
    (Arc::new(scanner), transport, settings)
}

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.network.minimum_delay_secs = 0.0;
    config
}

fn domain() -> Entity {
    Entity::parse("example.com", EntityKind::Domain).expect("valid domain")
}

#[tokio::test]
async fn test_failing_module_yields_degraded_result() {
    let (scanner, transport, _) = build(
        vec![
            TestModule::new("t.one", "One", Behaviour::Artifacts(2)),
            TestModule::new("t.broken", "Broken", Behaviour::Fail),
            TestModule::new("t.three", "Three", Behaviour::Artifacts(1)),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("scan completes");

    assert_eq!(outcome.results.len(), 3);
    let broken: Vec<&ModuleResult> = outcome.results.iter().filter(|r| r.is_failure()).collect();
    assert_eq!(broken.len(), 1);
    assert!(broken[0].artifacts.is_empty());
    assert!(broken[0].summary.contains("upstream returned 503"), "{}", broken[0].summary);
    assert_eq!(scanner.state(), ScanState::Completed);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_applicable_modules_fails_without_network() {
    let (scanner, transport, _) = build(
        vec![TestModule::new("t.one", "One", Behaviour::Artifacts(1))],
        fast_config(),
    )
    .await;
    let username = Entity::parse("octocat", EntityKind::Username).expect("username");

    let err = scanner.scan(&username).await.unwrap_err();

    assert!(matches!(err, ScanError::NoApplicableModules { kind: EntityKind::Username, .. }));
    assert_eq!(scanner.state(), ScanState::Failed(FailureReason::NoApplicableModules));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_results_sorted_by_module_name() {
    let (scanner, _, _) = build(
        vec![
            TestModule::new("t.z", "Zeta", Behaviour::Artifacts(0)),
            TestModule::new("t.a", "Alpha", Behaviour::Artifacts(0)),
            TestModule::new("t.m", "Mu", Behaviour::Fail),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("scan completes");
    let names: Vec<&str> = outcome.results.iter().map(|r| r.module_name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Mu", "Zeta"]);
}

#[tokio::test]
async fn test_panicking_module_is_contained() {
    let (scanner, _, _) = build(
        vec![
            TestModule::new("t.ok", "Ok", Behaviour::Artifacts(1)),
            TestModule::new("t.panic", "Panics", Behaviour::Panic),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("scan completes");

    assert_eq!(outcome.results.len(), 2);
    let panicked = outcome
        .results
        .iter()
        .find(|r| r.module_id == "t.panic")
        .expect("degraded result for panicking module");
    assert!(panicked.is_failure());
    assert!(panicked.summary.contains("module exploded"));
}

#[tokio::test]
async fn test_self_cancelled_module_is_dropped() {
    let (scanner, _, _) = build(
        vec![
            TestModule::new("t.ok", "Ok", Behaviour::Artifacts(1)),
            TestModule::new("t.gone", "Gone", Behaviour::Cancelled),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("scan completes");

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].module_id, "t.ok");
    assert_eq!(scanner.state(), ScanState::Completed);
}

#[tokio::test]
async fn test_cancel_settles_to_idle() {
    let (scanner, _, _) = build(
        vec![
            TestModule::new("t.hang", "Hangs", Behaviour::Hang),
            TestModule::new("t.ok", "Ok", Behaviour::Artifacts(1)),
        ],
        fast_config(),
    )
    .await;
    let mut states = scanner.subscribe();

    let running = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan(&domain()).await }
    });
    states
        .wait_for(ScanState::is_running)
        .await
        .expect("scanner publishes running");

    // A second scan is refused while the first is in flight.
    let second = scanner.scan(&domain()).await.unwrap_err();
    assert!(matches!(second, ScanError::AlreadyRunning));

    scanner.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("cancellation is prompt")
        .expect("scan task joins");

    assert!(matches!(outcome, Err(ScanError::Cancelled)));
    assert_eq!(scanner.state(), ScanState::Idle);

    // The scanner is usable again afterwards.
    scanner.cancel();
    assert_eq!(scanner.state(), ScanState::Idle);
}

#[tokio::test]
async fn test_paid_modules_follow_tier_setting() {
    let (scanner, _, settings) = build(
        vec![
            TestModule::new("t.free", "Free", Behaviour::Artifacts(1)),
            TestModule::new("t.paid", "Paid", Behaviour::Artifacts(1)).paid(),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("free-only scan");
    assert_eq!(outcome.results.len(), 1);

    settings.update(|config| config.sources.free_sources_only = false);
    let outcome = scanner.scan(&domain()).await.expect("scan with paid sources");
    assert_eq!(outcome.results.len(), 2);
}

#[tokio::test]
async fn test_scan_input_gates_and_parses() {
    let (scanner, transport, _) = build(
        vec![TestModule::new("t.one", "One", Behaviour::Artifacts(1))],
        fast_config(),
    )
    .await;

    let err = scanner.scan_input("123-45-6789", None).await.unwrap_err();
    assert!(matches!(err, ScanError::BlockedByPolicy(_)));
    assert!(matches!(scanner.state(), ScanState::Failed(FailureReason::BlockedByPolicy(_))));

    let err = scanner
        .scan_input("not a domain", Some(EntityKind::Domain))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Validation(_)));
    assert!(matches!(scanner.state(), ScanState::Failed(FailureReason::InvalidTarget(_))));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

    let outcome = scanner.scan_input("  Example.COM ", None).await.expect("detected domain");
    assert_eq!(outcome.entity.value(), "example.com");
    assert_eq!(outcome.results.len(), 1);
}

#[tokio::test]
async fn test_outcome_feeds_report() {
    let (scanner, _, _) = build(
        vec![
            TestModule::new("t.b", "Beta", Behaviour::Artifacts(1)),
            TestModule::new("t.a", "Alpha", Behaviour::Artifacts(2)),
        ],
        fast_config(),
    )
    .await;

    let outcome = scanner.scan(&domain()).await.expect("scan completes");
    let mut report = Report::new(outcome.entity.value());
    report.ingest(outcome.entity.value(), &outcome.results);

    let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    assert_eq!(report.section("t.a").map(|s| s.artifacts.len()), Some(2));
}

/// Open `gate` and wait until the scanner publishes `expected`.
async fn settle(states: &mut watch::Receiver<ScanState>, gate: &Semaphore, expected: ScanState) {
    gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|state| *state == expected))
        .await
        .expect("state published in time")
        .expect("scanner alive");
}

#[tokio::test]
async fn test_progress_counts_every_settled_module() {
    let (ok, ok_gate) = GatedModule::new(TestModule::new("t.ok", "Ok", Behaviour::Artifacts(1)));
    let (broken, broken_gate) = GatedModule::new(TestModule::new("t.broken", "Broken", Behaviour::Fail));
    let (gone, gone_gate) = GatedModule::new(TestModule::new("t.gone", "Gone", Behaviour::Cancelled));
    let (last, last_gate) = GatedModule::new(TestModule::new("t.last", "Last", Behaviour::Artifacts(2)));

    let mut registry = ModuleRegistry::new();
    registry.register(ok);
    registry.register(broken);
    registry.register(gone);
    registry.register(last);
    let settings = SettingsStore::new(fast_config());
    let fetcher = Fetcher::with_transport(Arc::new(CountingTransport::default()), settings.clone());
    let cache = Cache::in_memory().await.expect("open in-memory cache");
    let scanner = Arc::new(Scanner::new(
        Arc::new(registry),
        Arc::new(fetcher),
        Arc::new(cache),
        settings,
    ));
    let mut states = scanner.subscribe();

    let running = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan(&domain()).await }
    });
    states
        .wait_for(|state| *state == ScanState::Running { progress: 0.0 })
        .await
        .expect("scanner publishes running");

    settle(&mut states, &ok_gate, ScanState::Running { progress: 0.25 }).await;
    settle(&mut states, &broken_gate, ScanState::Running { progress: 0.5 }).await;
    // A module that reports its own cancellation still advances progress.
    settle(&mut states, &gone_gate, ScanState::Running { progress: 0.75 }).await;
    assert_eq!(scanner.state(), ScanState::Running { progress: 0.75 });
    settle(&mut states, &last_gate, ScanState::Completed).await;

    let outcome = running
        .await
        .expect("scan task joins")
        .expect("scan completes");
    let ids: Vec<&str> = outcome.results.iter().map(|r| r.module_id.as_str()).collect();
    assert_eq!(ids, vec!["t.broken", "t.last", "t.ok"]);
}
