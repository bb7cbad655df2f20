//! Application state shared across handlers.

use std::sync::Arc;

use ra9ia_core::{ContactSettings, CurrencyCode};

use crate::config::StorefrontConfig;
use crate::sanity::{SanityClient, SiteSettings};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the CMS client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cms: SanityClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let cms = SanityClient::new(&config.sanity);
        Self {
            inner: Arc::new(AppStateInner { config, cms }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Sanity client.
    #[must_use]
    pub fn cms(&self) -> &SanityClient {
        &self.inner.cms
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }

    /// Site settings, or defaults when the CMS is unreachable.
    pub async fn site(&self) -> Site {
        let settings = match self.cms().get_site_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to fetch site settings: {e}");
                SiteSettings::default()
            }
        };
        Site::resolve(&settings, self.config())
    }
}

/// Store-wide values every page needs, with environment fallbacks applied.
#[derive(Debug, Clone)]
pub struct Site {
    pub store_name: String,
    pub announcement: Option<String>,
    pub contact: ContactSettings,
}

impl Site {
    fn resolve(settings: &SiteSettings, config: &StorefrontConfig) -> Self {
        Self {
            store_name: settings
                .store_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| config.store_name.clone()),
            announcement: settings.announcement.clone(),
            contact: settings.contact().or(&config.contact),
        }
    }
}
