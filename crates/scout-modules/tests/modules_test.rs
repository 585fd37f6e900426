mod common;

use common::{context, context_with, test_config, MockDnsResolver, MockTransport, Reply};
use scout_core::{Entity, EntityKind, ScoutError};
use scout_modules::sources::{
    CrtShModule, DnsRecordsModule, EmailPolicyModule, HttpHeadersModule, IpGeoModule, NvdModule,
    RdapModule, RobotsModule, UsernamePresenceModule, UsernameSite, WaybackModule,
};
use scout_modules::{OsintModule, RecordType};
use scout_net::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn domain(value: &str) -> Entity {
    Entity::parse(value, EntityKind::Domain).expect("valid domain")
}

#[tokio::test]
async fn test_dns_single_a_record() {
    let resolver = Arc::new(MockDnsResolver::new().record("example.com", RecordType::A, "93.184.216.34"));
    let module = DnsRecordsModule::with_resolver(resolver.clone());
    let ctx = context(MockTransport::new()).await;

    let result = module.run(&domain("example.com"), &ctx).await.expect("dns run");

    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.artifacts[0].value, "93.184.216.34");
    assert_eq!(result.artifacts[0].title, "A example.com.");
    assert!(result.summary.contains('1'), "summary: {}", result.summary);
    assert_eq!(resolver.calls(), 6);
}

#[tokio::test]
async fn test_dns_degraded_lookups_are_not_cached() {
    let resolver = Arc::new(MockDnsResolver::new().failing("example.com"));
    let module = DnsRecordsModule::with_resolver(resolver.clone());
    let ctx = context(MockTransport::new()).await;
    let entity = domain("example.com");

    let first = module.run(&entity, &ctx).await.expect("degraded run still succeeds");
    assert!(first.artifacts.is_empty());
    assert_eq!(first.summary, "No DNS records found");
    assert_eq!(
        first.raw.get("degraded_types").and_then(|v| v.as_array()).map(Vec::len),
        Some(6)
    );

    module.run(&entity, &ctx).await.expect("second run");
    assert_eq!(resolver.calls(), 12);
}

#[tokio::test]
async fn test_robots_rules() {
    let transport = MockTransport::new().route(
        "https://example.com/robots.txt",
        Reply::body("User-agent: *\nDisallow: /private\nAllow: /public\n"),
    );
    let ctx = context(transport).await;

    let result = RobotsModule.run(&domain("example.com"), &ctx).await.expect("robots run");

    assert_eq!(result.artifacts.len(), 3);
    assert!(result.summary.contains('3'), "summary: {}", result.summary);
    assert_eq!(result.source_links, vec!["https://example.com/robots.txt".to_string()]);
}

#[tokio::test]
async fn test_robots_falls_back_to_http() {
    let transport = MockTransport::new()
        .route("https://example.com/robots.txt", Reply::Fail)
        .route("http://example.com/robots.txt", Reply::body("Sitemap: /sitemap.xml\n"));
    let ctx = context(transport.clone()).await;

    let result = RobotsModule.run(&domain("example.com"), &ctx).await.expect("robots run");

    assert_eq!(result.artifacts[0].title, "Sitemap");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_robots_unavailable_is_network_error() {
    let ctx = context(MockTransport::new()).await;
    let err = RobotsModule.run(&domain("example.com"), &ctx).await.unwrap_err();
    assert!(matches!(err, ScoutError::Network(_)));
}

#[tokio::test]
async fn test_http_headers_fall_back_to_plain_http() {
    let transport = MockTransport::new()
        .route("https://example.com", Reply::Fail)
        .route(
            "http://example.com",
            Reply::headers(&[("server", "nginx"), ("x-frame-options", "DENY")]),
        );
    let ctx = context(transport.clone()).await;

    let result = HttpHeadersModule
        .run(&domain("example.com"), &ctx)
        .await
        .expect("headers run");

    let titles: Vec<&str> = result.artifacts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Server", "X-Frame-Options"]);
    assert_eq!(result.summary, "Status 200. Headers: 2");
    assert_eq!(
        transport.requests(),
        vec![
            (Method::Head, "https://example.com".to_string()),
            (Method::Head, "http://example.com".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_http_headers_keep_first_ten_by_name() {
    let names = [
        "x-b", "server", "age", "x-a", "via", "etag", "date", "vary", "link", "pragma", "expires",
        "allow",
    ];
    let headers: Vec<(&str, &str)> = names.iter().map(|name| (*name, "v")).collect();
    let transport = MockTransport::new().route("https://example.com", Reply::headers(&headers));
    let ctx = context(transport).await;

    let result = HttpHeadersModule
        .run(&domain("example.com"), &ctx)
        .await
        .expect("headers run");

    let titles: Vec<&str> = result.artifacts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Age", "Allow", "Date", "Etag", "Expires", "Link", "Pragma", "Server", "Vary", "Via"]
    );
    assert_eq!(result.summary, "Status 200. Headers: 10");
}

fn paced_sites() -> Vec<UsernameSite> {
    ["alpha", "beta", "gamma"]
        .iter()
        .map(|name| UsernameSite::new(*name, format!("https://{name}.test/{{user}}"), Method::Head))
        .collect()
}

#[tokio::test]
async fn test_username_probes_are_paced() {
    let transport = MockTransport::new()
        .route("alpha.test", Reply::status(200))
        .route("gamma.test", Reply::status(301));
    let mut config = test_config();
    config.cache.enabled = false;
    let ctx = context_with(transport.clone(), config, CancellationToken::new()).await;
    let module = UsernamePresenceModule::with_sites(paced_sites());
    let entity = Entity::parse("octocat", EntityKind::Username).expect("username");

    tokio::time::pause();
    let start = Instant::now();
    let result = module.run(&entity, &ctx).await.expect("presence run");

    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(transport.calls(), 3);
    let found: Vec<&str> = result.artifacts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(found, vec!["alpha", "gamma"]);
    assert_eq!(result.summary, "Found 2 profiles");
    assert_eq!(result.source_links[0], "https://alpha.test/octocat");
}

#[tokio::test]
async fn test_username_pacing_observes_cancellation() {
    let mut config = test_config();
    config.cache.enabled = false;
    let cancel = CancellationToken::new();
    let transport = MockTransport::new();
    let ctx = context_with(transport.clone(), config, cancel.clone()).await;
    let module = UsernamePresenceModule::with_sites(paced_sites());
    let entity = Entity::parse("octocat", EntityKind::Username).expect("username");

    tokio::time::pause();
    let start = Instant::now();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
    });

    let err = module.run(&entity, &ctx).await.unwrap_err();
    canceller.await.expect("canceller task");

    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_email_policy() {
    let resolver = Arc::new(
        MockDnsResolver::new()
            .record("example.com", RecordType::Txt, "\"google-site-verification=xyz\"")
            .record("example.com", RecordType::Txt, "\"v=spf1 include:_spf.example.com -all\"")
            .record("_dmarc.example.com", RecordType::Txt, "\"v=DMARC1; p=reject\"")
            .failing("default._domainkey.example.com"),
    );
    let module = EmailPolicyModule::with_resolver(resolver);
    let ctx = context(MockTransport::new()).await;
    let entity = Entity::parse("Alice@Example.com", EntityKind::Email).expect("email");

    let result = module.run(&entity, &ctx).await.expect("policy run");

    let pairs: Vec<(&str, &str)> = result
        .artifacts
        .iter()
        .map(|a| (a.title.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("SPF", "v=spf1 include:_spf.example.com -all"),
            ("DMARC", "v=DMARC1; p=reject"),
        ]
    );
    assert_eq!(result.summary, "Found mail policies: SPF, DMARC");
    assert_eq!(result.raw.get("degraded"), Some(&serde_json::Value::Bool(true)));
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let body = r#"[{"common_name": "example.com", "name_value": "www.example.com\nmail.example.com"}]"#;
    let transport = MockTransport::new().route("crt.sh", Reply::body(body));
    let ctx = context(transport.clone()).await;
    let entity = domain("example.com");

    let first = CrtShModule.run(&entity, &ctx).await.expect("first run");
    let second = CrtShModule.run(&entity, &ctx).await.expect("cached run");

    assert_eq!(transport.calls(), 1);
    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(second.summary, "Found 2 potential subdomains");
}

#[tokio::test]
async fn test_cache_disabled_always_fetches() {
    let transport = MockTransport::new().route("crt.sh", Reply::body("[]"));
    let mut config = test_config();
    config.cache.enabled = false;
    let ctx = context_with(transport.clone(), config, CancellationToken::new()).await;
    let entity = domain("example.com");

    CrtShModule.run(&entity, &ctx).await.expect("first run");
    CrtShModule.run(&entity, &ctx).await.expect("second run");

    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_malformed_payload_is_decoding_error() {
    let transport = MockTransport::new().route("crt.sh", Reply::body("<html>busy</html>"));
    let ctx = context(transport).await;

    let err = CrtShModule.run(&domain("example.com"), &ctx).await.unwrap_err();
    assert!(matches!(err, ScoutError::Decoding(_)));
}

#[tokio::test]
async fn test_unsupported_entity_is_rejected() {
    let transport = MockTransport::new();
    let ctx = context(transport.clone()).await;
    let ip = Entity::parse("8.8.8.8", EntityKind::Ip).expect("ip");

    let err = CrtShModule.run(&ip, &ctx).await.unwrap_err();
    assert!(matches!(err, ScoutError::Validation(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_ip_geolocation() {
    let transport = MockTransport::new().route(
        "ip-api.com/json/8.8.8.8",
        Reply::body(r#"{"status":"success","country":"United States","city":"Mountain View","as":"AS15169 Google LLC"}"#),
    );
    let ctx = context(transport).await;
    let ip = Entity::parse("8.8.8.8", EntityKind::Ip).expect("ip");

    let result = IpGeoModule.run(&ip, &ctx).await.expect("geo run");

    assert_eq!(result.artifacts.len(), 3);
    assert_eq!(result.summary, "Retrieved 3 IP metadata fields");
    assert!(result.artifacts.iter().any(|a| a.title == "City" && a.sensitive));
}

#[tokio::test]
async fn test_nvd_keyword_search() {
    let body = r#"{"vulnerabilities": [
        {"cve": {"id": "CVE-2020-0001", "descriptions": [{"lang": "en", "value": "first"}],
                 "metrics": {"cvssMetricV31": [{"cvssData": {"baseScore": 7.5, "baseSeverity": "HIGH"}}]}}},
        {"cve": {"id": "CVE-2020-0002", "descriptions": [{"lang": "en", "value": "second"}]}}
    ]}"#;
    let transport = MockTransport::new().route("services.nvd.nist.gov", Reply::body(body));
    let ctx = context(transport.clone()).await;
    let email = Entity::parse("admin@example.com", EntityKind::Email).expect("email");

    let result = NvdModule.run(&email, &ctx).await.expect("nvd run");

    assert_eq!(result.summary, "Found 2 NVD entries");
    assert_eq!(result.artifacts.len(), 3);
    assert_eq!(result.source_links.len(), 2);
    let (_, url) = &transport.requests()[0];
    assert!(url.contains("keywordSearch=admin%40example.com"), "url: {url}");
}

#[tokio::test]
async fn test_wayback_snapshots() {
    let body = r#"[["timestamp","original","statuscode"],
        ["20200101000000","http://example.com/","200"],
        ["20210101000000","https://example.com/about","200"],
        ["broken"]]"#;
    let transport = MockTransport::new().route("web.archive.org/cdx/search/cdx", Reply::body(body));
    let ctx = context(transport.clone()).await;

    let result = WaybackModule
        .run(&domain("example.com"), &ctx)
        .await
        .expect("wayback run");

    assert_eq!(result.summary, "Found 2 snapshots");
    assert_eq!(result.artifacts[0].title, "20200101000000");
    assert_eq!(result.artifacts[1].value, "https://example.com/about");
    assert_eq!(
        result.source_links,
        vec!["https://web.archive.org/web/*/example.com".to_string()]
    );
    let (method, url) = &transport.requests()[0];
    assert_eq!(*method, Method::Get);
    assert!(url.contains("url=example.com"), "url: {url}");
    assert!(url.contains("output=json"), "url: {url}");
    assert!(url.contains("limit=50"), "url: {url}");
}

#[tokio::test]
async fn test_rdap_registration_data() {
    let body = r#"{
        "handle": "EXAMPLE-COM",
        "events": [{"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"}],
        "nameservers": [{"ldhName": "A.IANA-SERVERS.NET"}],
        "entities": [
            {"roles": ["registrar"], "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar"]]]}
        ]
    }"#;
    let transport = MockTransport::new().route("rdap.org/domain/example.com", Reply::body(body));
    let ctx = context(transport.clone()).await;

    let result = RdapModule
        .run(&domain("example.com"), &ctx)
        .await
        .expect("rdap run");

    assert_eq!(result.summary, "Retrieved 3 registration records");
    assert_eq!(
        result.source_links,
        vec!["https://rdap.org/domain/example.com".to_string()]
    );
    assert_eq!(result.raw.get("handle"), Some(&serde_json::json!("EXAMPLE-COM")));
    assert!(result.artifacts.iter().any(|a| a.title == "Registrar" && a.value == "Example Registrar"));
    assert_eq!(
        transport.requests(),
        vec![(Method::Get, "https://rdap.org/domain/example.com".to_string())]
    );
}
