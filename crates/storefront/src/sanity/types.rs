//! Document shapes returned by the GROQ projections in [`super::queries`].
//!
//! GROQ returns `null` for missing fields, so list and flag fields go through
//! [`null_as_default`] rather than relying on `#[serde(default)]` alone.

use ra9ia_core::{ContactSettings, Email, PartnerId, ProductId};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A document list that skips entries it can't read.
///
/// One half-edited draft (a product without a price, a dangling reference)
/// drops out of the list instead of failing the whole page. `null` reads as
/// an empty list.
#[derive(Debug, Clone, Default)]
pub struct Listing<T>(pub Vec<T>);

impl<T> Listing<T> {
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Listing<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
        let items = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping unreadable CMS document: {e}");
                    None
                }
            })
            .collect();
        Ok(Self(items))
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Listing::deserialize(deserializer).map(Listing::into_inner)
}

// =============================================================================
// Images
// =============================================================================

/// An image asset on the Sanity CDN.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

impl Image {
    /// CDN URL resized to `width` pixels, in the best format the browser accepts.
    #[must_use]
    pub fn sized(&self, width: u32) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}w={width}&auto=format", self.url)
    }
}

// =============================================================================
// Site Settings
// =============================================================================

/// Singleton `siteSettings` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

impl SiteSettings {
    /// Store-wide order destinations.
    #[must_use]
    pub fn contact(&self) -> ContactSettings {
        ContactSettings::new(self.telegram_username.clone(), self.whatsapp_number.clone())
    }
}

// =============================================================================
// Products
// =============================================================================

/// The partner a product belongs to, as embedded in product projections.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSummary {
    #[serde(rename = "_id")]
    pub id: PartnerId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

/// A product document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sizes: Vec<String>,
    /// Explicit stock switch set by the shop.
    #[serde(default)]
    pub in_stock: Option<bool>,
    /// Units left, when the shop tracks them.
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default)]
    pub partner: Option<PartnerSummary>,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

impl Product {
    /// Available unless the shop switched stock off or the count reached zero.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.in_stock != Some(false) && self.stock_quantity != Some(0)
    }

    /// Order destinations for this product: its own overrides, then its
    /// partner's, then `site`.
    #[must_use]
    pub fn contact(&self, site: &ContactSettings) -> ContactSettings {
        let own = ContactSettings::new(
            self.telegram_username.clone(),
            self.whatsapp_number.clone(),
        );
        let partner = self.partner.as_ref().map_or_else(ContactSettings::default, |p| {
            ContactSettings::new(p.telegram_username.clone(), p.whatsapp_number.clone())
        });
        own.or(&partner).or(site)
    }
}

// =============================================================================
// Collections
// =============================================================================

/// A curated collection of products.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub products: Vec<Product>,
}

// =============================================================================
// Partners
// =============================================================================

/// A partner brand selling through the marketplace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    #[serde(rename = "_id")]
    pub id: PartnerId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<Image>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub products: Vec<Product>,
}

impl Partner {
    /// Order destinations for the partner, falling back to `site`.
    #[must_use]
    pub fn contact(&self, site: &ContactSettings) -> ContactSettings {
        ContactSettings::new(self.telegram_username.clone(), self.whatsapp_number.clone()).or(site)
    }
}

// =============================================================================
// Restock Notifications
// =============================================================================

/// A restock sign-up to be written as a `restockNotification` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestockRequest {
    pub email: Email,
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}
