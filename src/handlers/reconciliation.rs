use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::error::AppError;
use crate::extract::parse_extract;

/// Imports a CSV bank extract and runs one reconciliation pass.
///
/// The body is the raw CSV. Row-level parse failures come back inside the
/// report; only an empty body is rejected outright.
pub async fn import_extract(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::Validation("extract body is empty".to_string()));
    }

    let parsed = parse_extract(&body);
    let report = state.matcher.run(parsed).await?;

    Ok(Json(report))
}
