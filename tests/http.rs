use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: u64,
    state: String,
    error: Option<String>,
    counts: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    date: String,
    classification: String,
    css_class: Option<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Stand-in for the booking backend with hit counters.
#[derive(Clone, Default)]
struct FakeBackend {
    window_failures_left: Arc<AtomicU32>,
    application_hits: Arc<AtomicU32>,
    window_hits: Arc<AtomicU32>,
}

impl FakeBackend {
    fn application_hits(&self) -> u32 {
        self.application_hits.load(Ordering::SeqCst)
    }

    fn window_hits(&self) -> u32 {
        self.window_hits.load(Ordering::SeqCst)
    }
}

async fn application_dates(State(backend): State<FakeBackend>) -> Json<Value> {
    backend.application_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"date": "2025-02-01", "count": 2},
        {"date": "2025-02-02", "count": 1},
        {"note": "no date field"}
    ]))
}

async fn windows(State(backend): State<FakeBackend>) -> (StatusCode, Json<Value>) {
    backend.window_hits.fetch_add(1, Ordering::SeqCst);
    let failing = backend
        .window_failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok();

    if failing {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "maintenance", "details": "try later"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!([
            {"id": 1, "game_date": "2025-02-02", "time_start": "18:00:00", "time_end": "23:00:00"},
            {"id": 2, "game_date": "2025-02-03", "time_start": "12:00:00", "time_end": null}
        ])),
    )
}

async fn spawn_backend(window_failures: u32) -> (String, FakeBackend) {
    let backend = FakeBackend::default();
    backend
        .window_failures_left
        .store(window_failures, Ordering::SeqCst);

    let app = Router::new()
        .route("/api/application-dates", get(application_dates))
        .route("/api/windows", get(windows))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), backend)
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(backend_url: &str) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_booking_calendar"))
        .env("PORT", port.to_string())
        .env("BOOKING_API_BASE", backend_url)
        .env("RETRY_BASE_DELAY_MS", "10")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn open_session(client: &Client, server: &TestServer) -> SessionResponse {
    let response = client
        .post(format!("{}/api/sessions", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn http_calendar_highlights_both_feeds() {
    let (backend_url, backend) = spawn_backend(0).await;
    let server = spawn_server(&backend_url).await;
    let client = Client::new();

    let session = open_session(&client, &server).await;
    assert_eq!(session.state, "UNINITIALIZED");

    let ready: SessionResponse = client
        .post(format!("{}/api/sessions/{}/init", server.base_url, session.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ready.state, "READY");
    let counts = ready.counts.expect("counts");
    assert_eq!(counts["application_dates"], 2);
    assert_eq!(counts["open_window_dates"], 2);
    assert_eq!(counts["both"], 1);
    assert_eq!(counts["skipped_records"], 1);

    let day: DayResponse = client
        .get(format!(
            "{}/api/sessions/{}/days/2025-02-02",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.date, "2025-02-02");
    assert_eq!(day.classification, "HAS_BOTH");
    assert_eq!(day.css_class.as_deref(), Some("has-both"));

    let view: Value = client
        .get(format!(
            "{}/api/sessions/{}/calendar?month=2025-02",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["month"], "2025-02");
    assert_eq!(view["days"].as_array().unwrap().len(), 28);
    assert_eq!(view["days"][0]["classification"], "HAS_APPLICATIONS");
    assert_eq!(view["days"][2]["classification"], "HAS_OPEN_WINDOW");
    assert_eq!(view["days"][3]["classification"], "NONE");
    assert_eq!(view["summary"]["has_both"], 1);

    let again = client
        .post(format!("{}/api/sessions/{}/init", server.base_url, session.id))
        .send()
        .await
        .unwrap();
    assert!(again.status().is_success());
    assert_eq!(backend.application_hits(), 1);
    assert_eq!(backend.window_hits(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_window_feed_recovers_after_retries() {
    let (backend_url, backend) = spawn_backend(2).await;
    let server = spawn_server(&backend_url).await;
    let client = Client::new();

    let session = open_session(&client, &server).await;
    let ready: SessionResponse = client
        .post(format!("{}/api/sessions/{}/init", server.base_url, session.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(ready.state, "READY");
    assert_eq!(backend.window_hits(), 3);
    assert_eq!(backend.application_hits(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_exhausted_feed_fails_session() {
    let (backend_url, backend) = spawn_backend(u32::MAX).await;
    let server = spawn_server(&backend_url).await;
    let client = Client::new();

    let session = open_session(&client, &server).await;
    let init_url = format!("{}/api/sessions/{}/init", server.base_url, session.id);

    let response = client.post(&init_url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("open windows"), "{message}");
    assert!(message.contains("maintenance: try later"), "{message}");
    assert_eq!(backend.window_hits(), 3);

    let status: SessionResponse = client
        .get(format!("{}/api/sessions/{}", server.base_url, session.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status.state, "FAILED");
    assert!(status.error.is_some());

    let day = client
        .get(format!(
            "{}/api/sessions/{}/days/2025-02-02",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(day.status(), reqwest::StatusCode::CONFLICT);

    let retry = client.post(&init_url).send().await.unwrap();
    assert_eq!(retry.status(), reqwest::StatusCode::BAD_GATEWAY);
    assert_eq!(backend.window_hits(), 3);

    let reset: SessionResponse = client
        .post(format!("{}/api/sessions/{}/reset", server.base_url, session.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset.id, session.id);
    assert_eq!(reset.state, "UNINITIALIZED");
}

#[tokio::test(flavor = "multi_thread")]
async fn http_rejects_unknown_sessions_and_bad_input() {
    let (backend_url, _backend) = spawn_backend(0).await;
    let server = spawn_server(&backend_url).await;
    let client = Client::new();

    let missing = client
        .get(format!("{}/api/sessions/999999", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let session = open_session(&client, &server).await;
    let pending = client
        .get(format!(
            "{}/api/sessions/{}/calendar?month=2025-02",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(pending.status(), reqwest::StatusCode::CONFLICT);

    client
        .post(format!("{}/api/sessions/{}/init", server.base_url, session.id))
        .send()
        .await
        .unwrap();

    let bad_date = client
        .get(format!(
            "{}/api/sessions/{}/days/tomorrow",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_date.status(), reqwest::StatusCode::BAD_REQUEST);

    let bad_month = client
        .get(format!(
            "{}/api/sessions/{}/calendar?month=2025-13",
            server.base_url, session.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_month.status(), reqwest::StatusCode::BAD_REQUEST);

    let session_url = format!("{}/api/sessions/{}", server.base_url, session.id);
    let deleted = client.delete(&session_url).send().await.unwrap();
    assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);
    let gone = client.delete(&session_url).send().await.unwrap();
    assert_eq!(gone.status(), reqwest::StatusCode::NOT_FOUND);
}
