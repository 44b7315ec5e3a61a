use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::Config;
use crate::error::AppError;

/// Authenticated staff identity, recorded as `confirmed_by` on transitions.
#[derive(Debug, Clone)]
pub struct StaffActor(pub String);

/// Bearer-token gate for every staff route. The optional `X-Staff-Actor`
/// header names the human behind the shared key.
pub async fn staff_auth(
    State(config): State<Config>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth)
            if auth == format!("Bearer {}", config.staff_api_key)
                || auth == config.staff_api_key =>
        {
            let actor = req
                .headers()
                .get("X-Staff-Actor")
                .and_then(|h| h.to_str().ok())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "staff".to_string());

            req.extensions_mut().insert(StaffActor(actor));
            Ok(next.run(req).await)
        }
        _ => Err(AppError::Auth("staff bearer token required".to_string())),
    }
}
