//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::routes::collections::CollectionView;
use crate::routes::products::ProductView;
use crate::state::{AppState, Site};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site: Site,
    pub featured_products: Vec<ProductView>,
    pub collections: Vec<CollectionView>,
}

/// Display the home page: featured products and collections.
///
/// Either list degrades to empty if the CMS request fails.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let (site, featured, collections) = tokio::join!(
        state.site(),
        state.cms().get_featured_products(),
        state.cms().get_collections(),
    );

    let featured_products = match featured {
        Ok(products) => products
            .iter()
            .map(|p| ProductView::new(p, state.currency()))
            .collect(),
        Err(e) => {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        }
    };

    let collections = match collections {
        Ok(collections) => collections.iter().map(CollectionView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch collections: {e}");
            Vec::new()
        }
    };

    HomeTemplate {
        site,
        featured_products,
        collections,
    }
}
