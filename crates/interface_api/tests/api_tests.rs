//! HTTP tests against the router

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use interface_api::{config::ApiConfig, create_router, AppState};
use test_utils::{ContextFixtures, DocumentFixtures};

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Rejections raised before a handler runs have plain text bodies
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn state() -> AppState {
    AppState::new(ApiConfig::default())
}

fn venipuncture_body() -> Value {
    json!({ "bill": DocumentFixtures::venipuncture_and_duplicate_bill() })
}

async fn create(state: &AppState, body: Value) -> (StatusCode, Value) {
    send(create_router(state.clone()), Method::POST, "/api/v1/audits", Some(body)).await
}

// ============================================================================
// Health Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(create_router(state()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["version"].is_string());
    }
}

// ============================================================================
// Audit Creation Tests
// ============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_returns_preview_and_pricing() {
        let state = state();
        let (status, body) = create(&state, venipuncture_body()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["auditId"].is_string());
        assert!(body["expiresAt"].is_string());
        assert_eq!(body["preview"]["totalFindings"], 2);
        assert_eq!(body["preview"]["totalSavingsCents"], 6300);
        assert_eq!(body["pricing"]["quote"]["priceDollars"], 29);
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_with_insurance_context() {
        let body = json!({
            "bill": DocumentFixtures::balance_billed_er_bill(),
            "eob": DocumentFixtures::balance_billed_er_eob(),
            "insurance": ContextFixtures::standard_plan(),
        });
        let (status, body) = create(&state(), body).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["preview"]["totalSavingsCents"], 35000);
        assert_eq!(body["pricing"]["quote"]["priceDollars"], 35);
    }

    #[tokio::test]
    async fn test_no_documents_is_bad_request() {
        let state = state();
        let (status, body) = create(&state, json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let state = AppState::new(ApiConfig {
            max_body_bytes: 64,
            ..ApiConfig::default()
        });
        let (status, _) = send(
            create_router(state),
            Method::POST,
            "/api/v1/audits",
            Some(venipuncture_body()),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_document_in_wrong_slot_is_bad_request() {
        let body = json!({ "bill": DocumentFixtures::clean_office_visit_eob() });
        let (status, body) = create(&state(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("mismatch"));
    }
}

// ============================================================================
// Retrieval and Purge Tests
// ============================================================================

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_full_report() {
        let state = state();
        let (_, created) = create(&state, venipuncture_body()).await;
        let id = created["auditId"].as_str().unwrap();

        let app = create_router(state.clone());
        let request = Request::builder()
            .uri(format!("/api/v1/audits/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let report: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report["auditId"], created["auditId"]);
        assert_eq!(report["summary"]["potentialSavingsCents"], 6300);
        assert!(report["appealLetter"].as_str().unwrap().contains("$63.00"));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = state();
        let (_, created) = create(&state, venipuncture_body()).await;
        let uri = format!("/api/v1/audits/{}", created["auditId"].as_str().unwrap());

        let (status, _) = send(create_router(state.clone()), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(create_router(state.clone()), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(create_router(state), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expired_report_is_gone() {
        let state = AppState::new(ApiConfig {
            session_ttl_secs: 0,
            ..ApiConfig::default()
        });
        let (status, created) = create(&state, venipuncture_body()).await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/v1/audits/{}", created["auditId"].as_str().unwrap());
        let (status, _) = send(create_router(state.clone()), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let (status, _) = send(
            create_router(state()),
            Method::GET,
            "/api/v1/audits/not-an-id",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
