//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::sanity::Collection;
use crate::state::{AppState, Site};

pub use super::products::{ImageView, ProductView};

/// Collection display data for templates.
#[derive(Clone)]
pub struct CollectionView {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<ImageView>,
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        Self {
            slug: collection.slug.clone(),
            title: collection.title.clone(),
            description: collection
                .description
                .clone()
                .filter(|d| !d.trim().is_empty()),
            image: collection.image.as_ref().map(|img| ImageView {
                url: img.sized(1200),
                thumb_url: img.sized(480),
                alt: img.alt.clone().unwrap_or_else(|| collection.title.clone()),
            }),
        }
    }
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub site: Site,
    pub collections: Vec<CollectionView>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub site: Site,
    pub collection: CollectionView,
    pub products: Vec<ProductView>,
}

/// Display collection listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let collections = match state.cms().get_collections().await {
        Ok(collections) => collections.iter().map(CollectionView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch collections: {e}");
            Vec::new()
        }
    };

    CollectionsIndexTemplate {
        site: state.site().await,
        collections,
    }
}

/// Display collection detail page with products.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let collection = state
        .cms()
        .get_collection_by_slug(&slug)
        .await
        .map_err(AppError::from_lookup)?;

    let products = collection
        .products
        .iter()
        .map(|p| ProductView::new(p, state.currency()))
        .collect();

    Ok(CollectionShowTemplate {
        site: state.site().await,
        collection: CollectionView::from(&collection),
        products,
    }
    .into_response())
}
