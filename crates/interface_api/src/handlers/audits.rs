//! Audit handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use core_kernel::AuditId;
use domain_report::AuditReport;

use crate::dto::audit::{CreateAuditRequest, CreateAuditResponse};
use crate::{error::ApiError, AppState};

/// Runs an audit and keeps the full report for later retrieval
pub async fn create_audit(
    State(state): State<AppState>,
    Json(request): Json<CreateAuditRequest>,
) -> Result<(StatusCode, Json<CreateAuditResponse>), ApiError> {
    request.validate()?;

    let context = request.insurance.unwrap_or_default();
    let now = Utc::now();
    let report = state
        .pipeline
        .run(request.bill.as_ref(), request.eob.as_ref(), &context, now)?;

    let audit_id = report.audit_id;
    let preview = report.preview();
    let pricing = report.pricing.clone();
    let expires_at = state.sessions.insert(audit_id, report, now).await;

    let response = CreateAuditResponse {
        audit_id,
        preview,
        pricing,
        expires_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Returns the full report until it expires
pub async fn get_audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditReport>, ApiError> {
    let id = parse_id(&id)?;
    state
        .sessions
        .get(&id, Utc::now())
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// Purges a report before it expires
pub async fn delete_audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.sessions.remove(&id).await {
        info!(audit_id = %id, "Audit purged");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

fn parse_id(raw: &str) -> Result<AuditId, ApiError> {
    AuditId::from_str(raw).map_err(|_| ApiError::NotFound(format!("Audit {} not found", raw)))
}

fn not_found(id: &AuditId) -> ApiError {
    ApiError::NotFound(format!("Audit {} not found", id))
}
