//! Smoke test integration tests against in-process mock services.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use cryoctl_core::config::SmokeConfig;
use cryoctl_core::types::GateType;
use cryoctl_smoke::{SmokeError, SmokeTest, wait_ready};

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind mock listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// Base URL on which nothing is listening.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn config(base_url: String) -> SmokeConfig {
    SmokeConfig {
        base_url,
        readiness_attempts: 3,
        readiness_interval_ms: 10,
        request_timeout_secs: 2,
        ..SmokeConfig::default()
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Cryo Quantum Enterprise API",
        "version": "1.0.0",
        "status": "fully_operational",
        "quantum_modules": true
    }))
}

async fn bell_state(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let gate = params.get("gate_type").cloned().unwrap_or_default();
    if gate != "CNOT" && gate != "CZ" {
        return Json(json!({
            "error": "Invalid gate_type",
            "message": "invalid gate",
            "success": false
        }));
    }
    Json(json!({
        "bell_state_type": gate,
        "concurrence": 0.87,
        "entanglement_strength": "partial",
        "success": true
    }))
}

fn healthy_service() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/entanglement/bell_state", get(bell_state))
}

#[tokio::test]
async fn healthy_service_passes_every_check() {
    // Given
    let base = serve(healthy_service()).await;
    let smoke = SmokeTest::from_config(&config(base)).expect("valid config");

    // When
    let report = smoke.run().await;

    // Then
    assert!(report.passed(), "report: {report:?}");
    let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["readiness", "root", "entanglement"]);
    assert_eq!(
        report.check("root").expect("root check").summary,
        "Root endpoint reachable (HTTP 200)"
    );
    assert_eq!(
        report.check("entanglement").expect("entanglement check").summary,
        "Entanglement working! Concurrence: 0.87"
    );
}

#[tokio::test]
async fn gate_type_is_sent_as_query_parameter() {
    let base = serve(healthy_service()).await;
    let smoke = SmokeTest::from_config(&config(base))
        .expect("valid config")
        .gate_type(GateType::Cz);

    let check = smoke.check_entanglement().await;

    assert!(check.passed);
    let detail = check.detail.expect("body detail");
    assert_eq!(detail["bell_state_type"], "CZ");
}

#[tokio::test]
async fn rejected_entanglement_fails_report() {
    let router = Router::new().route("/", get(root)).route(
        "/entanglement/bell_state",
        get(|| async { Json(json!({"message": "invalid gate", "success": false})) }),
    );
    let base = serve(router).await;
    let smoke = SmokeTest::from_config(&config(base)).expect("valid config");

    let report = smoke.run().await;

    assert!(!report.passed());
    assert_eq!(report.failed_count(), 1);
    assert!(report.check("root").expect("root").passed);
    assert_eq!(
        report.check("entanglement").expect("entanglement").summary,
        "Entanglement failed: invalid gate"
    );
    assert!(matches!(
        report.into_result(),
        Err(SmokeError::ChecksFailed { failed: 1, total: 3 })
    ));
}

#[tokio::test]
async fn non_json_entanglement_body_is_parse_failure() {
    let router = Router::new().route("/", get(root)).route(
        "/entanglement/bell_state",
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let base = serve(router).await;
    let smoke = SmokeTest::from_config(&config(base)).expect("valid config");

    let check = smoke.check_entanglement().await;

    assert!(!check.passed);
    assert_eq!(check.summary, "Failed to parse entanglement response");
    assert_eq!(
        check.detail,
        Some(Value::String("<html>bad gateway</html>".to_owned()))
    );
}

#[tokio::test]
async fn root_passes_on_any_http_status() {
    // No "/" route: axum answers 404
    let router = Router::new().route("/entanglement/bell_state", get(bell_state));
    let base = serve(router).await;
    let smoke = SmokeTest::from_config(&config(base)).expect("valid config");

    let check = smoke.check_root().await;

    assert!(check.passed);
    assert_eq!(check.summary, "Root endpoint reachable (HTTP 404)");
}

#[tokio::test]
async fn unreachable_service_fails_all_checks() {
    let base = closed_port().await;
    let smoke = SmokeTest::from_config(&config(base)).expect("valid config");

    let report = smoke.run().await;

    assert_eq!(report.failed_count(), 3);
    let readiness = report.check("readiness").expect("readiness check");
    assert!(readiness.summary.contains("not ready after 3 attempts"));
    let entanglement = report.check("entanglement").expect("entanglement check");
    assert!(
        entanglement
            .summary
            .starts_with("Entanglement request failed: "),
        "summary: {}",
        entanglement.summary
    );
}

#[tokio::test]
async fn readiness_waits_for_non_5xx_response() {
    let hits = Arc::new(AtomicU32::new(0));
    let router = Router::new()
        .route(
            "/",
            get(|State(hits): State<Arc<AtomicU32>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::OK
                }
            }),
        )
        .with_state(hits.clone());
    let base = serve(router).await;
    let smoke = SmokeTest::from_config(&SmokeConfig {
        readiness_attempts: 5,
        ..config(base)
    })
    .expect("valid config");

    let attempt = wait_ready(
        smoke.client(),
        &cryoctl_smoke::Readiness {
            path: "/".to_owned(),
            attempts: 5,
            interval: std::time::Duration::from_millis(10),
        },
    )
    .await
    .expect("service becomes ready");

    assert_eq!(attempt, 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn disabled_readiness_skips_probe_check() {
    let base = serve(healthy_service()).await;
    let smoke = SmokeTest::from_config(&SmokeConfig {
        readiness_attempts: 0,
        ..config(base)
    })
    .expect("valid config");

    let report = smoke.run().await;

    assert!(report.passed());
    assert!(report.check("readiness").is_none());
    assert_eq!(report.checks.len(), 2);
}
