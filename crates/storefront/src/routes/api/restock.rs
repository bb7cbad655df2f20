//! Restock sign-up endpoint.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::restock::{self, RestockInput, RestockOutcome};
use crate::state::AppState;

/// Response body of a sign-up.
#[derive(Debug, Serialize)]
pub struct RestockResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Sign up for a restock notification.
///
/// `201` when a sign-up is created, `200` when an identical one is already
/// pending, `400` for a malformed email.
#[instrument(skip(state, input), fields(product_id = %input.product_id))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<RestockInput>,
) -> Result<impl IntoResponse> {
    if input.product_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing product".to_string()));
    }
    let request = input.into_request()?;

    let response = match restock::subscribe(state.cms(), &request).await? {
        RestockOutcome::Created => (
            StatusCode::CREATED,
            Json(RestockResponse {
                status: "created",
                message: "We will email you when it is back in stock.",
            }),
        ),
        RestockOutcome::AlreadySubscribed => (
            StatusCode::OK,
            Json(RestockResponse {
                status: "already_subscribed",
                message: "You are already on the list for this item.",
            }),
        ),
    };
    Ok(response)
}
