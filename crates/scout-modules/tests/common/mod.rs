//! Shared fixtures for module tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scout_cache::Cache;
use scout_core::{AppConfig, ScoutError, SettingsStore};
use scout_modules::{DnsRecord, DnsResolver, ModuleContext, RecordType};
use scout_net::{Fetcher, HttpRequest, HttpResponse, Method, NetError, Transport};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Canned reply for requests whose URL contains a pattern.
#[derive(Clone)]
pub enum Reply {
    Ok {
        status: u16,
        body: String,
        headers: Vec<(String, String)>,
    },
    Fail,
}

impl Reply {
    pub fn body(body: impl Into<String>) -> Self {
        Self::Ok {
            status: 200,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Ok {
            status,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    pub fn headers(headers: &[(&str, &str)]) -> Self {
        Self::Ok {
            status: 200,
            body: String::new(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

/// Transport answering from a route table; unmatched URLs get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<(String, Reply)>>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// First matching route wins.
    pub fn route(self: &Arc<Self>, pattern: &str, reply: Reply) -> Arc<Self> {
        self.routes.lock().unwrap().push((pattern.to_string(), reply));
        Arc::clone(self)
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.method, request.url.clone()));

        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| request.url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::status(404));

        match reply {
            Reply::Ok {
                status,
                body,
                headers,
            } => Ok(HttpResponse {
                status,
                url: request.url.clone(),
                headers: headers
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect::<BTreeMap<_, _>>(),
                body: body.into_bytes(),
            }),
            Reply::Fail => Err(NetError::Transport("connection refused".to_string())),
        }
    }
}

/// Resolver answering from a fixed record table.
#[derive(Default)]
pub struct MockDnsResolver {
    records: Vec<(String, RecordType, DnsRecord)>,
    failing: Vec<String>,
    calls: Mutex<Vec<(String, RecordType)>>,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, host: &str, record_type: RecordType, data: &str) -> Self {
        self.records.push((
            host.to_string(),
            record_type,
            DnsRecord {
                name: format!("{host}."),
                record_type: record_type.code(),
                data: data.to_string(),
                ttl: Some(300),
            },
        ));
        self
    }

    /// Every lookup of `host` fails.
    pub fn failing(mut self, host: &str) -> Self {
        self.failing.push(host.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(
        &self,
        host: &str,
        record_type: RecordType,
        _ctx: &ModuleContext,
    ) -> Result<Vec<DnsRecord>, ScoutError> {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), record_type));
        if self.failing.iter().any(|h| h == host) {
            return Err(ScoutError::Network("SERVFAIL".to_string()));
        }
        Ok(self
            .records
            .iter()
            .filter(|(h, t, _)| h == host && *t == record_type)
            .map(|(_, _, record)| record.clone())
            .collect())
    }
}

/// Settings with no pacing and no retries so tests stay fast.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.network.minimum_delay_secs = 0.0;
    config.network.retry_limit = 0;
    config
}

/// Context over `transport` with an in-memory cache.
pub async fn context(transport: Arc<MockTransport>) -> ModuleContext {
    context_with(transport, test_config(), CancellationToken::new()).await
}

pub async fn context_with(
    transport: Arc<MockTransport>,
    config: AppConfig,
    cancel: CancellationToken,
) -> ModuleContext {
    let fetcher = Fetcher::with_transport(transport, SettingsStore::new(config.clone()));
    let cache = Cache::in_memory().await.expect("open in-memory cache");
    ModuleContext::new(Arc::new(fetcher), Arc::new(cache), config, cancel)
}
