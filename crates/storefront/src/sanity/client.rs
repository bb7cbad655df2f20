//! Sanity HTTP API client implementation.
//!
//! Reads go through the GROQ query endpoint (optionally the API CDN) and are
//! cached with `moka` (5-minute TTL). Mutations go to the live API with the
//! write token.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::SanityConfig;
use crate::sanity::cache::{CacheKey, CacheValue};
use crate::sanity::types::{
    Collection, Listing, Partner, Product, RestockRequest, SiteSettings,
};
use crate::sanity::{SanityError, error_message, queries};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope of a query response.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Client for the Sanity HTTP API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct SanityClient {
    inner: Arc<SanityClientInner>,
}

struct SanityClientInner {
    client: reqwest::Client,
    query_url: String,
    mutate_url: String,
    token: Option<SecretString>,
    cache: moka::future::Cache<CacheKey, CacheValue>,
}

impl SanityClient {
    /// Create a new Sanity client.
    #[must_use]
    pub fn new(config: &SanityConfig) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(SanityClientInner {
                client: reqwest::Client::new(),
                query_url: config.query_url(),
                mutate_url: config.mutate_url(),
                token: config.token.clone(),
                cache,
            }),
        }
    }

    /// Whether restock sign-ups can be written.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.inner.token.is_some()
    }

    /// Execute a GROQ query.
    ///
    /// Each param is sent as `$name=<json>` per the query API.
    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, serde_json::Value)],
    ) -> Result<T, SanityError> {
        let mut url = url::Url::parse(&self.inner.query_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", groq);
            for (name, value) in params {
                pairs.append_pair(&format!("${name}"), &value.to_string());
            }
        }

        let response = self
            .inner
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SanityError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Sanity query returned non-success status"
            );
            return Err(SanityError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: QueryResponse<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Sanity query response"
            );
            SanityError::Parse(e)
        })?;

        Ok(parsed.result)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Get the site settings document, or defaults if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_site_settings(&self) -> Result<SiteSettings, SanityError> {
        if let Some(CacheValue::SiteSettings(settings)) =
            self.inner.cache.get(&CacheKey::SiteSettings).await
        {
            debug!("Cache hit for site settings");
            return Ok(*settings);
        }

        let settings = self
            .query::<Option<SiteSettings>>(queries::SITE_SETTINGS, &[])
            .await?
            .unwrap_or_default();

        self.inner
            .cache
            .insert(
                CacheKey::SiteSettings,
                CacheValue::SiteSettings(Box::new(settings.clone())),
            )
            .await;

        Ok(settings)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get every published product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, SanityError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self
            .query::<Listing<Product>>(queries::PRODUCTS, &[])
            .await?
            .into_inner();

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get up to eight featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_featured_products(&self) -> Result<Vec<Product>, SanityError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::FeaturedProducts).await
        {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products = self
            .query::<Listing<Product>>(queries::FEATURED_PRODUCTS, &[])
            .await?
            .into_inner();

        self.inner
            .cache
            .insert(
                CacheKey::FeaturedProducts,
                CacheValue::Products(products.clone()),
            )
            .await;

        Ok(products)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, SanityError> {
        let cache_key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .query::<Option<Product>>(
                queries::PRODUCT_BY_SLUG,
                &[("slug", serde_json::Value::from(slug))],
            )
            .await?
            .ok_or_else(|| SanityError::NotFound(format!("product {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get every collection, without products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(&self) -> Result<Vec<Collection>, SanityError> {
        if let Some(CacheValue::Collections(collections)) =
            self.inner.cache.get(&CacheKey::Collections).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let collections = self
            .query::<Listing<Collection>>(queries::COLLECTIONS, &[])
            .await?
            .into_inner();

        self.inner
            .cache
            .insert(
                CacheKey::Collections,
                CacheValue::Collections(collections.clone()),
            )
            .await;

        Ok(collections)
    }

    /// Get a collection and its products by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_collection_by_slug(&self, slug: &str) -> Result<Collection, SanityError> {
        let cache_key = CacheKey::Collection(slug.to_string());

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let collection: Collection = self
            .query::<Option<Collection>>(
                queries::COLLECTION_BY_SLUG,
                &[("slug", serde_json::Value::from(slug))],
            )
            .await?
            .ok_or_else(|| SanityError::NotFound(format!("collection {slug}")))?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    // =========================================================================
    // Partner Methods
    // =========================================================================

    /// Get every partner, without products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_partners(&self) -> Result<Vec<Partner>, SanityError> {
        if let Some(CacheValue::Partners(partners)) =
            self.inner.cache.get(&CacheKey::Partners).await
        {
            debug!("Cache hit for partners");
            return Ok(partners);
        }

        let partners = self
            .query::<Listing<Partner>>(queries::PARTNERS, &[])
            .await?
            .into_inner();

        self.inner
            .cache
            .insert(CacheKey::Partners, CacheValue::Partners(partners.clone()))
            .await;

        Ok(partners)
    }

    /// Get a partner and its products by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_partner_by_slug(&self, slug: &str) -> Result<Partner, SanityError> {
        let cache_key = CacheKey::Partner(slug.to_string());

        if let Some(CacheValue::Partner(partner)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for partner");
            return Ok(*partner);
        }

        let partner: Partner = self
            .query::<Option<Partner>>(
                queries::PARTNER_BY_SLUG,
                &[("slug", serde_json::Value::from(slug))],
            )
            .await?
            .ok_or_else(|| SanityError::NotFound(format!("partner {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Partner(Box::new(partner.clone())))
            .await;

        Ok(partner)
    }

    // =========================================================================
    // Restock Notifications
    // =========================================================================

    /// Whether an unsent notification already exists for this request.
    ///
    /// Never cached: a sign-up made a second ago must be visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn has_pending_restock(&self, request: &RestockRequest) -> Result<bool, SanityError> {
        let count: u64 = self
            .query(
                queries::PENDING_RESTOCK_COUNT,
                &[
                    ("email", serde_json::Value::from(request.email.as_str())),
                    (
                        "productId",
                        serde_json::Value::from(request.product_id.as_str()),
                    ),
                    ("color", serde_json::Value::from(request.color.clone())),
                    ("size", serde_json::Value::from(request.size.clone())),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    /// Create a `restockNotification` document.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::MissingToken`] without a write token, or an error
    /// if the API request fails.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn create_restock_notification(
        &self,
        request: &RestockRequest,
    ) -> Result<(), SanityError> {
        let token = self.inner.token.as_ref().ok_or(SanityError::MissingToken)?;

        let body = serde_json::json!({
            "mutations": [{
                "create": {
                    "_type": "restockNotification",
                    "email": request.email.as_str(),
                    "product": {
                        "_type": "reference",
                        "_ref": request.product_id.as_str(),
                    },
                    "color": request.color,
                    "size": request.size,
                    "notified": false,
                    "createdAt": Utc::now().to_rfc3339(),
                }
            }]
        });

        let response = self
            .inner
            .client
            .post(&self.inner.mutate_url)
            .bearer_auth(token.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SanityError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(())
    }
}
