use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use folio::{
    email,
    environment::{ConfigProvider, Provider},
};
use folio_cache_contracts::CacheService;
use folio_testing::resend::{ResendTestServer, REJECTED_DOMAIN};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "re_test";
const ORIGIN: &str = "https://aarushgupta.dev";

#[tokio::test]
async fn submission_is_delivered() {
    // Arrange
    let (router, resend, _) = setup(API_KEY, &[]).await;

    // Act
    let (status, body) = post(&router, PEER, Some(ORIGIN), submission("ann@x.com")).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let emails = resend.outbox.emails().await;
    assert_eq!(emails.len(), 2);

    let notification = &emails[0];
    assert_eq!(notification.from, "Portfolio <noreply@yourdomain.com>");
    assert_eq!(notification.to, ["aarushgupta2018@gmail.com"]);
    assert_eq!(notification.subject, "[Portfolio Contact] Hi there");
    assert_eq!(notification.reply_to.as_deref(), Some("ann@x.com"));
    assert!(notification.html.contains("Interested in working together"));
    assert!(notification
        .text
        .as_deref()
        .unwrap()
        .contains("Interested in working together"));

    let acknowledgement = &emails[1];
    assert_eq!(acknowledgement.to, ["ann@x.com"]);
    assert_eq!(acknowledgement.reply_to, None);
}

#[tokio::test]
async fn rate_limit() {
    // Arrange
    let (router, resend, cache) = setup(API_KEY, &[]).await;
    let mut spam = submission("ann@x.com");
    spam["company"] = "Spam Inc".into();

    // Act
    for _ in 0..5 {
        let (status, body) = post(&router, PEER, Some(ORIGIN), spam.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "bot": true}));
    }
    let (status, body) = post(&router, PEER, Some(ORIGIN), submission("ann@x.com")).await;
    let (other_status, _) = post(&router, OTHER_PEER, Some(ORIGIN), spam).await;

    // Assert
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({"ok": false, "error": "Too many requests"}));
    assert_eq!(other_status, StatusCode::OK);
    assert!(resend.outbox.emails().await.is_empty());
    let expires_in = cache
        .expires_in(&format!("ratelimit:contact:{PEER}"))
        .unwrap();
    assert!(expires_in <= Duration::from_secs(600));
    assert!(expires_in > Duration::from_secs(590));
}

#[tokio::test]
async fn rate_limit_window_expires() {
    // Arrange
    let (router, resend, _) = setup(API_KEY, &[r#"contact.rate_limit.window = "1s""#]).await;
    let mut spam = submission("ann@x.com");
    spam["company"] = "Spam Inc".into();

    let mut statuses = Vec::new();
    for _ in 0..6 {
        statuses.push(post(&router, PEER, Some(ORIGIN), spam.clone()).await.0);
    }

    // Act
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let (status, body) = post(&router, PEER, Some(ORIGIN), submission("ann@x.com")).await;

    // Assert
    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    assert_eq!(resend.outbox.emails().await.len(), 2);
}

#[tokio::test]
async fn forbidden_origin() {
    let (router, resend, _) = setup(
        API_KEY,
        &[r#"contact.allowed_origins = ["https://aarushgupta.dev"]"#],
    )
    .await;

    for origin in [Some("https://evil.example"), None] {
        let (status, body) = post(&router, PEER, origin, submission("ann@x.com")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"ok": false, "error": "Forbidden origin"}));
    }
    assert!(resend.outbox.emails().await.is_empty());
}

#[tokio::test]
async fn invalid_submission() {
    // Arrange
    let (router, resend, _) = setup(API_KEY, &[]).await;
    let mut payload = submission("not-an-email");
    payload["name"] = "A".into();

    // Act
    let (status, body) = post(&router, PEER, Some(ORIGIN), payload).await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["formErrors"], json!([]));
    let field_errors = body["error"]["fieldErrors"].as_object().unwrap();
    assert_eq!(
        field_errors.keys().collect::<Vec<_>>(),
        ["email", "name"]
    );
    assert!(resend.outbox.emails().await.is_empty());
}

#[tokio::test]
async fn provider_rejects_api_key() {
    let (router, resend, _) = setup("re_other", &[]).await;

    let (status, body) = post(&router, PEER, Some(ORIGIN), submission("ann@x.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"ok": false, "error": "API key is invalid"}));
    assert!(resend.outbox.emails().await.is_empty());
}

#[tokio::test]
async fn acknowledgement_failure_is_ignored() {
    let (router, resend, _) = setup(API_KEY, &[]).await;
    let sender = format!("ann@{REJECTED_DOMAIN}");

    let (status, body) = post(&router, PEER, Some(ORIGIN), submission(&sender)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    let emails = resend.outbox.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].reply_to.as_deref(), Some(sender.as_str()));
}

#[tokio::test]
async fn api_key_missing() {
    let (router, resend, _) = setup(API_KEY, &[r#"email.api_key = """#]).await;

    let (status, body) = post(&router, PEER, Some(ORIGIN), submission("ann@x.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"ok": false, "error": "Email provider API key missing"})
    );
    assert!(resend.outbox.emails().await.is_empty());
}

#[tokio::test]
async fn health() {
    let (router, _, _) = setup(API_KEY, &[]).await;

    let response = router
        .oneshot(
            Request::get("/health")
                .extension(ConnectInfo(SocketAddr::new(PEER, 4242)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({"http": true, "cache": true})
    );
}

const PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
const OTHER_PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2));

async fn setup(api_key: &str, overrides: &[&str]) -> (Router, ResendTestServer, MemoryCache) {
    let resend = ResendTestServer::spawn(API_KEY).await.unwrap();

    let endpoint = format!(
        "email.endpoint = {:?}\nemail.api_key = {api_key:?}",
        resend.endpoint.as_str()
    );
    let overrides = std::iter::once(endpoint.as_str())
        .chain(overrides.iter().copied())
        .collect::<Vec<_>>();
    let config = folio_config::load_with_overrides(&[] as &[&str], &overrides).unwrap();

    let cache = MemoryCache::default();
    let email = email::build(&config.email).unwrap();
    let config_provider = ConfigProvider::new(&config).unwrap();
    let router = Provider::new(config_provider, Some(cache.clone()), email)
        .rest_server()
        .unwrap()
        .router();

    (router, resend, cache)
}

fn submission(email: &str) -> Value {
    json!({
        "name": "Ann",
        "email": email,
        "subject": "Hi there",
        "message": "Interested in working together",
        "budget": "",
        "company": "",
    })
}

async fn post(
    router: &Router,
    peer: IpAddr,
    origin: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut request = Request::post("/contact")
        .header("Content-Type", "application/json")
        .extension(ConnectInfo(SocketAddr::new(peer, 4242)));
    if let Some(origin) = origin {
        request = request.header("Origin", origin);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Counters kept in memory, expired entries are dropped on the next access.
#[derive(Debug, Clone, Default)]
struct MemoryCache(Arc<Mutex<HashMap<String, Counter>>>);

#[derive(Debug, Default)]
struct Counter {
    value: u64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl MemoryCache {
    fn expires_in(&self, key: &str) -> Option<Duration> {
        let entries = self.0.lock().unwrap();
        let expires_at = entries.get(key)?.expires_at?;
        Some(expires_at.saturating_duration_since(Instant::now()))
    }
}

impl CacheService for MemoryCache {
    async fn incr(&self, key: &str) -> anyhow::Result<u64> {
        let now = Instant::now();
        let mut entries = self.0.lock().unwrap();
        let counter = entries.entry(key.into()).or_default();
        if counter.is_expired(now) {
            *counter = Counter::default();
        }
        counter.value += 1;
        Ok(counter.value)
    }

    async fn pexpire(&self, key: &str, ttl: Duration) -> anyhow::Result<()> {
        let now = Instant::now();
        let mut entries = self.0.lock().unwrap();
        match entries.get_mut(key) {
            Some(counter) if !counter.is_expired(now) => counter.expires_at = Some(now + ttl),
            Some(_) => {
                entries.remove(key);
            }
            None => {}
        }
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
