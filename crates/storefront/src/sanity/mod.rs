//! Sanity content client.
//!
//! # Architecture
//!
//! - GROQ queries over the HTTP query API, executed with `reqwest`
//! - Sanity is the source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for settings and catalogue reads (5 minute TTL)
//! - The only write is restock sign-ups, which need `SANITY_TOKEN`
//!
//! # Example
//!
//! ```rust,ignore
//! use ra9ia_storefront::sanity::SanityClient;
//!
//! let client = SanityClient::new(&config.sanity);
//! let product = client.get_product_by_slug("abaya-noir").await?;
//! ```

mod cache;
mod client;
pub mod queries;
pub mod types;

pub use client::SanityClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to Sanity.
#[derive(Debug, Error)]
pub enum SanityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Sanity answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Sanity.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A mutation was attempted without a write token.
    #[error("SANITY_TOKEN is not configured")]
    MissingToken,

    /// The query URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Pull a readable message out of a Sanity error body.
///
/// Sanity uses both `{"error": {"description": ".."}}` and
/// `{"error": "..", "message": ".."}`; anything else is truncated raw text.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let described = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/description")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("error"))
            .and_then(serde_json::Value::as_str)
            .map(String::from)
    });
    described.unwrap_or_else(|| body.chars().take(200).collect())
}
