//! Backend client against an in-process axum mock.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use common::{run_cybersim, stdout_json};
use cybersim::api::ApiClient;
use cybersim::deck::{AnswerValue, SimulationKind, load_builtin};
use cybersim::dashboard::Status;
use cybersim::emitter::ResultEmitter;
use cybersim::error::ApiError;
use cybersim::session::Session;

type Received = Arc<Mutex<Vec<Value>>>;

/// Trainee that has finished every simulation.
const GRADUATE: &str = "u-done";

fn completed_for(id: &str) -> Value {
    if id == GRADUATE {
        json!([
            "phishing",
            "password",
            "malware",
            "sql_injection",
            "ransomware",
            "social_engineering"
        ])
    } else {
        json!(["phishing", "malware"])
    }
}

async fn user(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "id": id,
        "name": "Asha",
        "email": "asha@example.com",
        "total_score": 180,
        "completed_simulations": completed_for(&id),
    }))
}

async fn create_user(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "u-new",
            "name": body["name"],
            "email": body["email"],
        })),
    )
}

async fn vulnerability(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "user_id": id,
        "overall_score": 90,
        "phishing_score": 100,
        "malware_score": 80,
    }))
}

async fn certificate(Path(_id): Path<String>) -> Json<Value> {
    Json(Value::Null)
}

async fn issue_certificate(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id != GRADUATE {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({
        "id": "c-1",
        "user_id": id,
        "issued_date": "2026-03-01T09:30:00Z",
        "certificate_number": "CYBER-48213",
    })))
}

async fn report(Path(_id): Path<String>) -> &'static [u8] {
    b"%PDF-1.4 report"
}

async fn simulations(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::OK
}

async fn chat(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let message = body["message"].as_str().unwrap_or_default();
    if message == "overload" {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(json!({ "response": format!("echo: {message}") })))
}

/// Serves the mock backend on an ephemeral port.
async fn spawn_backend() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(user))
        .route("/api/vulnerability-score/{id}", get(vulnerability))
        .route(
            "/api/certificate/{id}",
            get(certificate).post(issue_certificate),
        )
        .route("/api/report/{id}", get(report))
        .route("/api/simulations", post(simulations))
        .route("/api/chat", post(chat))
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

/// A base URL nothing listens on.
async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn finished_phishing() -> Session {
    let mut session = Session::new(load_builtin(SimulationKind::Phishing).unwrap());
    session.start().unwrap();
    for chosen in [true, false, true] {
        session.submit_answer(AnswerValue::Binary(chosen)).unwrap();
        session.advance().unwrap();
    }
    session
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn profile_and_breakdown() {
    let (url, _) = spawn_backend().await;
    let client = ApiClient::new(&url).unwrap();

    let profile = client.load_user_profile("u-1").await.unwrap();
    assert_eq!(profile.id, "u-1");
    assert_eq!(profile.completed_kinds(), [SimulationKind::Phishing, SimulationKind::Malware]);
    assert!(!profile.certificate_eligible());

    let breakdown = client.load_vulnerability_score("u-1").await.unwrap();
    assert_eq!(breakdown.score(SimulationKind::Malware), 80);
    assert_eq!(breakdown.score(SimulationKind::Ransomware), 0);
    assert_eq!(breakdown.status(), Status::Excellent);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_user_and_chat() {
    let (url, _) = spawn_backend().await;
    let client = ApiClient::new(&url).unwrap();

    let profile = client.create_user("Ravi", "ravi@example.com").await.unwrap();
    assert_eq!(profile.id, "u-new");
    assert_eq!(profile.total_score, 0);

    let reply = client.chat("s-1", "what is phishing?").await.unwrap();
    assert_eq!(reply, "echo: what is phishing?");
}

#[tokio::test(flavor = "multi_thread")]
async fn certificate_and_report() {
    let (url, _) = spawn_backend().await;
    let client = ApiClient::new(&url).unwrap();

    assert_eq!(client.load_certificate(GRADUATE).await.unwrap(), None);
    let cert = client.issue_certificate(GRADUATE).await.unwrap();
    assert_eq!(cert.certificate_number, "CYBER-48213");
    assert_eq!(cert.user_id, GRADUATE);

    let err = client.issue_certificate("u-1").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(400)), "{err}");

    let pdf = client.download_report("u-1").await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_user_is_an_http_status() {
    let (url, _) = spawn_backend().await;
    let client = ApiClient::new(&format!("{url}/nowhere")).unwrap();
    let err = client.load_user_profile("u-1").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(404)), "{err}");
    assert!(!err.is_transient());
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_transient() {
    let (url, _) = spawn_backend().await;
    let client = ApiClient::new(&url).unwrap();
    let err = client.chat("s-1", "overload").await.unwrap_err();
    assert!(matches!(err, ApiError::Transient(_)), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_is_transient() {
    let client = ApiClient::new(&dead_backend().await)
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let err = client.chat("s", "hi").await.unwrap_err();
    assert!(err.is_transient(), "{err}");
}

// ============================================================================
// Result emission
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn emitter_posts_the_outcome_once() {
    let (url, received) = spawn_backend().await;
    let emitter = ResultEmitter::new(Arc::new(ApiClient::new(&url).unwrap()), "u-1");
    let mut session = finished_phishing();

    let report = emitter.emit(&mut session, Duration::from_secs(42)).await.unwrap();
    assert!(report.persisted);
    assert_eq!(report.outcome.score_percent, 100);
    assert!(emitter.emit(&mut session, Duration::ZERO).await.is_err());

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["user_id"], "u-1");
    assert_eq!(received[0]["simulation_type"], "phishing");
    assert_eq!(received[0]["score"], 100);
    assert_eq!(received[0]["duration_seconds"], 42);
    assert_eq!(received[0]["answers"]["2"]["chosen"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn emitter_failure_keeps_the_outcome() {
    let client = ApiClient::new(&dead_backend().await)
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let emitter = ResultEmitter::new(Arc::new(client), "u-1");
    let mut session = finished_phishing();

    let report = emitter.emit(&mut session, Duration::ZERO).await.unwrap();
    assert!(!report.persisted);
    assert_eq!(report.outcome.score_percent, 100);
    assert!(report.warning.unwrap().starts_with("score not saved"));
}

// ============================================================================
// CLI against the backend
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn run_persists_when_a_backend_is_configured() {
    let (url, received) = spawn_backend().await;
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&[
            "run",
            "malware",
            "-a",
            "y,y,n,y",
            "--api-url",
            &url,
            "--user-id",
            "u-9",
            "--format",
            "json",
        ])
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["persisted"], true);
    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["user_id"], "u-9");
    assert_eq!(received[0]["simulation_type"], "malware");
}

#[tokio::test(flavor = "multi_thread")]
async fn run_warns_when_the_backend_is_down() {
    let url = dead_backend().await;
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&[
            "run", "phishing", "-a", "y,n,y", "--api-url", &url, "--user-id", "u-9", "--format",
            "json",
        ])
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let parsed = stdout_json(&output);
    assert_eq!(parsed["persisted"], false);
    assert_eq!(parsed["outcome"]["score_percent"], 100);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: score not saved"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_json() {
    let (url, _) = spawn_backend().await;
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&["dashboard", "--user-id", "u-1", "--api-url", &url, "--format", "json"])
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["profile"]["name"], "Asha");
    assert_eq!(parsed["scores"]["overall_score"], 90);
    assert_eq!(parsed["certificate_eligible"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_claims_certificate_and_saves_report() {
    let (url, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    let report_arg = path.to_string_lossy().into_owned();
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&[
            "dashboard",
            "--user-id",
            GRADUATE,
            "--api-url",
            &url,
            "--claim-certificate",
            "--report",
            &report_arg,
            "--format",
            "json",
        ])
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["certificate_eligible"], true);
    assert_eq!(parsed["certificate"]["certificate_number"], "CYBER-48213");
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 report");
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_refuses_early_certificate_claim() {
    let (url, _) = spawn_backend().await;
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&["dashboard", "--user-id", "u-1", "--api-url", &url, "--claim-certificate"])
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("4 simulation(s) left"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn register_prints_the_new_id() {
    let (url, _) = spawn_backend().await;
    let output = tokio::task::spawn_blocking(move || {
        run_cybersim(&[
            "register",
            "--name",
            "Ravi",
            "--email",
            "ravi@example.com",
            "--api-url",
            &url,
            "--format",
            "json",
        ])
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["id"], "u-new");
    assert_eq!(parsed["email"], "ravi@example.com");
}

#[test]
fn register_rejects_blank_name() {
    let output = run_cybersim(&[
        "register",
        "--name",
        " ",
        "--email",
        "a@example.com",
        "--api-url",
        "http://127.0.0.1:9",
    ]);
    assert_eq!(output.status.code(), Some(64));
}
