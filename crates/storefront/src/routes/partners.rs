//! Partner marketplace route handlers.
//!
//! Partners are independent brands selling through the store. Their products
//! are ordered through the partner's own chat handles when they have them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::products::{ChannelView, ImageView, ProductView, channel_views};
use crate::sanity::Partner;
use crate::state::{AppState, Site};

/// Partner display data for templates.
#[derive(Clone)]
pub struct PartnerView {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub logo: Option<ImageView>,
}

impl From<&Partner> for PartnerView {
    fn from(partner: &Partner) -> Self {
        Self {
            slug: partner.slug.clone(),
            name: partner.name.clone(),
            description: partner.description.clone(),
            city: partner.city.clone(),
            logo: partner.logo.as_ref().map(|img| ImageView {
                url: img.sized(600),
                thumb_url: img.sized(240),
                alt: img.alt.clone().unwrap_or_else(|| partner.name.clone()),
            }),
        }
    }
}

/// Partner listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "partners/index.html")]
pub struct PartnersIndexTemplate {
    pub site: Site,
    pub partners: Vec<PartnerView>,
}

/// Partner page template.
#[derive(Template, WebTemplate)]
#[template(path = "partners/show.html")]
pub struct PartnerShowTemplate {
    pub site: Site,
    pub partner: PartnerView,
    pub products: Vec<ProductView>,
    /// Where this partner takes orders.
    pub channels: Vec<ChannelView>,
}

/// Display partner listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let partners = match state.cms().get_partners().await {
        Ok(partners) => partners.iter().map(PartnerView::from).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch partners: {e}");
            Vec::new()
        }
    };

    PartnersIndexTemplate {
        site: state.site().await,
        partners,
    }
}

/// Display a partner and its products.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let partner = state
        .cms()
        .get_partner_by_slug(&slug)
        .await
        .map_err(AppError::from_lookup)?;
    let site = state.site().await;

    let products = partner
        .products
        .iter()
        .map(|p| ProductView::new(p, state.currency()))
        .collect();

    Ok(PartnerShowTemplate {
        channels: channel_views(&partner.contact(&site.contact)),
        partner: PartnerView::from(&partner),
        products,
        site,
    }
    .into_response())
}
