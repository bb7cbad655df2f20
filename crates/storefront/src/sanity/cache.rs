//! Cache types for Sanity reads.

use crate::sanity::types::{Collection, Partner, Product, SiteSettings};

/// Cache key for settings and catalogue documents.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    SiteSettings,
    Product(String),
    Products,
    FeaturedProducts,
    Collection(String),
    Collections,
    Partner(String),
    Partners,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    SiteSettings(Box<SiteSettings>),
    Product(Box<Product>),
    Products(Vec<Product>),
    Collection(Box<Collection>),
    Collections(Vec<Collection>),
    Partner(Box<Partner>),
    Partners(Vec<Partner>),
}
