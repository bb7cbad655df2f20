//! Restock sign-ups.
//!
//! A sign-up is stored once per email and variant until the shop sends the
//! notification; repeats while one is pending are acknowledged without a
//! second document.

use std::future::Future;

use ra9ia_core::{Email, EmailError, ProductId};
use serde::Deserialize;

use crate::sanity::{RestockRequest, SanityClient, SanityError};

/// Where sign-ups are kept.
pub trait RestockStore {
    /// Whether an unsent notification exists for the same email and variant.
    fn has_pending(
        &self,
        request: &RestockRequest,
    ) -> impl Future<Output = Result<bool, SanityError>> + Send;

    /// Store a new sign-up.
    fn create(&self, request: &RestockRequest)
    -> impl Future<Output = Result<(), SanityError>> + Send;
}

impl RestockStore for SanityClient {
    async fn has_pending(&self, request: &RestockRequest) -> Result<bool, SanityError> {
        self.has_pending_restock(request).await
    }

    async fn create(&self, request: &RestockRequest) -> Result<(), SanityError> {
        self.create_restock_notification(request).await
    }
}

/// Request body of `POST /api/restock-notifications`.
#[derive(Debug, Clone, Deserialize)]
pub struct RestockInput {
    pub email: String,
    pub product_id: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl RestockInput {
    /// Validate the email and normalize blank variant fields to `None`.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] if the email is malformed.
    pub fn into_request(self) -> Result<RestockRequest, EmailError> {
        let email = Email::parse(&self.email)?;
        Ok(RestockRequest {
            email,
            product_id: ProductId::new(self.product_id.trim()),
            color: non_blank(self.color),
            size: non_blank(self.size),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of a sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockOutcome {
    Created,
    AlreadySubscribed,
}

/// Record `request` unless an identical pending sign-up exists.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub async fn subscribe<S: RestockStore>(
    store: &S,
    request: &RestockRequest,
) -> Result<RestockOutcome, SanityError> {
    if store.has_pending(request).await? {
        tracing::debug!(product_id = %request.product_id, "Restock sign-up already pending");
        return Ok(RestockOutcome::AlreadySubscribed);
    }

    store.create(request).await?;
    tracing::info!(product_id = %request.product_id, "Restock sign-up created");
    Ok(RestockOutcome::Created)
}
