use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::domain::ClaimStatus;
use crate::error::AppError;
use crate::middleware::StaffActor;
use crate::services::reporter::ReportClaimInput;
use crate::services::store::DEFAULT_PAGE_SIZE;
use crate::utils::cursor;

#[derive(Debug, Deserialize)]
pub struct ReportClaimRequest {
    pub client_id: Uuid,
    pub amount: BigDecimal,
    pub invoice_id: Option<String>,
    pub destination_handle: Option<String>,
    pub reference_note: Option<String>,
}

pub async fn report_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<StaffActor>,
    Json(payload): Json<ReportClaimRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claim_id = state
        .reporter
        .report(ReportClaimInput {
            client_id: payload.client_id,
            amount: payload.amount,
            invoice_id: payload.invoice_id,
            destination_handle: payload.destination_handle,
            reference_note: payload.reference_note,
            created_by: Some(actor.0),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "claim_id": claim_id }))))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    pub external_ref: Option<String>,
}

pub async fn confirm_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<StaffActor>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ConfirmRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    state
        .confirmation
        .confirm(&actor.0, id, payload.external_ref)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct NotReceivedRequest {
    pub reason: String,
}

pub async fn mark_not_received(
    State(state): State<AppState>,
    Extension(actor): Extension<StaffActor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NotReceivedRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .confirmation
        .mark_not_received(&actor.0, id, &payload.reason)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let claim = state.store.get(id).await?;
    Ok(Json(claim))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated status filter; defaults to the open states.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

pub async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let statuses = match &query.status {
        Some(raw) => parse_status_filter(raw)?,
        None => ClaimStatus::OPEN.to_vec(),
    };

    let parsed_cursor = match &query.cursor {
        Some(raw) => Some(parse_cursor(raw)?),
        None => None,
    };

    let page = state
        .store
        .list_by_status(&statuses, query.limit.unwrap_or(DEFAULT_PAGE_SIZE), parsed_cursor)
        .await?;

    Ok(Json(page))
}

fn parse_cursor(raw: &str) -> Result<(chrono::DateTime<chrono::Utc>, Uuid), AppError> {
    cursor::decode(raw).map_err(AppError::Parse)
}

fn parse_status_filter(raw: &str) -> Result<Vec<ClaimStatus>, AppError> {
    let statuses: Result<Vec<ClaimStatus>, String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect();

    let statuses = statuses.map_err(AppError::Validation)?;
    if statuses.is_empty() {
        return Err(AppError::Validation(
            "status filter must name at least one status".to_string(),
        ));
    }

    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parses_comma_separated_values() {
        let statuses = parse_status_filter("pending, pending-confirmation").unwrap();
        assert_eq!(
            statuses,
            vec![ClaimStatus::Pending, ClaimStatus::PendingConfirmation]
        );
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        assert!(parse_status_filter("pending,bogus").is_err());
        assert!(parse_status_filter(" , ").is_err());
    }

    #[test]
    fn invalid_cursor_is_a_parse_error() {
        assert!(matches!(parse_cursor("!!junk!!"), Err(AppError::Parse(_))));

        let valid = cursor::encode(chrono::Utc::now(), Uuid::new_v4());
        assert!(parse_cursor(&valid).is_ok());
    }
}
