//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use ra9ia_core::{CartLineItem, Channel, ContactSettings, CurrencyCode, Price};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::sanity::{Image, Product};
use crate::services::order::{self, OrderForm};
use crate::state::{AppState, Site};

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub thumb_url: String,
    pub alt: String,
}

impl ImageView {
    fn new(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.sized(1200),
            thumb_url: image.sized(480),
            alt: image
                .alt
                .clone()
                .unwrap_or_else(|| fallback_alt.to_string()),
        }
    }
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Formatted, e.g. `4500 DA`.
    pub price: String,
    /// Plain decimal posted back by the add-to-cart form.
    pub unit_price: String,
    pub compare_at_price: Option<String>,
    pub description: Option<String>,
    pub featured_image: Option<ImageView>,
    pub images: Vec<ImageView>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub available: bool,
    /// Shown when few units are left.
    pub stock_note: Option<String>,
    pub partner_name: Option<String>,
    pub partner_slug: Option<String>,
}

/// Below this many units the product page says how many are left.
const LOW_STOCK_THRESHOLD: u32 = 5;

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let images: Vec<ImageView> = product
            .images
            .iter()
            .map(|image| ImageView::new(image, &product.name))
            .collect();
        let stock_note = product
            .stock_quantity
            .filter(|left| product.is_available() && *left <= LOW_STOCK_THRESHOLD)
            .map(|left| format!("Only {left} left"));

        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: Price::new(product.price, currency).display(),
            unit_price: product.price.to_string(),
            compare_at_price: product
                .compare_at_price
                .filter(|compare| *compare > product.price)
                .map(|compare| Price::new(compare, currency).display()),
            description: product.description.clone(),
            featured_image: images.first().cloned(),
            images,
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            available: product.is_available(),
            stock_note,
            partner_name: product.partner.as_ref().map(|p| p.name.clone()),
            partner_slug: product.partner.as_ref().map(|p| p.slug.clone()),
        }
    }

    /// Image URL stored on the cart line.
    #[must_use]
    pub fn cart_image(&self) -> String {
        self.featured_image
            .as_ref()
            .map(|image| image.thumb_url.clone())
            .unwrap_or_default()
    }
}

/// Chat channel choice on order forms.
#[derive(Clone)]
pub struct ChannelView {
    pub value: &'static str,
    pub label: &'static str,
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        Self {
            value: channel.as_str(),
            label: channel.label(),
        }
    }
}

/// Channels the order form offers for `contact`.
#[must_use]
pub fn channel_views(contact: &ContactSettings) -> Vec<ChannelView> {
    contact.channels().into_iter().map(ChannelView::from).collect()
}

/// Values echoed back into an order form after a failed submission.
#[derive(Clone, Default)]
pub struct OrderFormValues {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub telegram: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub note: String,
}

impl From<&OrderForm> for OrderFormValues {
    fn from(form: &OrderForm) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: form.name.clone(),
            email: text(&form.email),
            phone: text(&form.phone),
            telegram: text(&form.telegram),
            street: text(&form.street),
            city: text(&form.city),
            region: text(&form.region),
            postal_code: text(&form.postal_code),
            country: text(&form.country),
            note: text(&form.note),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub site: Site,
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub site: Site,
    pub product: ProductView,
    pub channels: Vec<ChannelView>,
    pub values: OrderFormValues,
    pub alert: Option<String>,
    /// Sold-out products offer a restock sign-up only when the CMS accepts writes.
    pub restock_enabled: bool,
}

/// Buy-now form: one product variant ordered without the cart.
#[derive(Debug, Deserialize)]
pub struct BuyNowForm {
    #[serde(flatten)]
    pub order: OrderForm,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// Kept as text; values are strings once flattened.
    #[serde(default)]
    pub quantity: Option<String>,
}

impl BuyNowForm {
    fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let products = match state.cms().get_products().await {
        Ok(products) => products
            .iter()
            .map(|p| ProductView::new(p, state.currency()))
            .collect(),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            Vec::new()
        }
    };

    ProductsIndexTemplate {
        site: state.site().await,
        products,
    }
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let product = state
        .cms()
        .get_product_by_slug(&slug)
        .await
        .map_err(AppError::from_lookup)?;
    let site = state.site().await;

    add_breadcrumb("navigation", "Viewed product", &[("slug", &slug)]);

    let contact = product.contact(&site.contact);
    Ok(ProductShowTemplate {
        product: ProductView::new(&product, state.currency()),
        channels: channel_views(&contact),
        site,
        values: OrderFormValues::default(),
        alert: None,
        restock_enabled: state.cms().can_write(),
    }
    .into_response())
}

/// Order a single product variant straight from its page.
///
/// Success redirects to the chat app; problems re-render the page with an
/// alert and no redirect.
#[instrument(skip(state, form), fields(channel = %form.order.channel))]
pub async fn order(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<BuyNowForm>,
) -> Result<Response> {
    let product = state
        .cms()
        .get_product_by_slug(&slug)
        .await
        .map_err(AppError::from_lookup)?;
    let site = state.site().await;
    let contact = product.contact(&site.contact);

    let rerender = |site: Site, alert: &str| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            ProductShowTemplate {
                product: ProductView::new(&product, state.currency()),
                channels: channel_views(&contact),
                site,
                values: OrderFormValues::from(&form.order),
                alert: Some(alert.to_string()),
                restock_enabled: state.cms().can_write(),
            },
        )
            .into_response()
    };

    if let Some(problem) = form.order.problem() {
        return Ok(rerender(site, problem));
    }

    let view = ProductView::new(&product, state.currency());
    let item = CartLineItem::new(
        product.id.clone(),
        product.name.clone(),
        product.price,
        form.quantity(),
    )
    .with_color(form.color.clone())
    .with_size(form.size.clone())
    .with_image(Some(view.cart_image()))
    .with_slug(Some(product.slug.clone()));

    let message = order::build_message(
        &form.order,
        vec![item],
        &site.store_name,
        state.currency(),
        Utc::now(),
    );

    match order::hand_off(&message, &form.order.channel, &contact) {
        Ok(handoff) => Ok(Redirect::to(&handoff.url).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Buy-now handoff aborted");
            Ok(rerender(site, &e.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": "product-abaya-noir",
            "name": "Abaya Noir",
            "slug": "abaya-noir",
            "price": 4500,
            "compareAtPrice": 5200,
            "images": [{"url": "https://cdn.sanity.io/images/abc123/production/a.jpg"}],
            "colors": ["black"],
            "sizes": ["S", "M"],
            "stockQuantity": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_product_view_formats_prices() {
        let view = ProductView::new(&product(), CurrencyCode::DZD);
        assert_eq!(view.price, "4500 DA");
        assert_eq!(view.unit_price, "4500");
        assert_eq!(view.compare_at_price.as_deref(), Some("5200 DA"));
        assert_eq!(view.stock_note.as_deref(), Some("Only 2 left"));
        assert_eq!(view.featured_image.unwrap().alt, "Abaya Noir");
    }

    #[test]
    fn test_compare_at_price_hidden_when_not_higher() {
        let mut product = product();
        product.compare_at_price = Some(Decimal::from(4000));
        let view = ProductView::new(&product, CurrencyCode::DZD);
        assert!(view.compare_at_price.is_none());
    }

    #[test]
    fn test_channel_views_follow_contact() {
        let contact = ContactSettings::new(None, Some("0555 00 01 11".to_string()));
        let channels = channel_views(&contact);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels.first().unwrap().value, "whatsapp");
    }

    #[test]
    fn test_buy_now_quantity_defaults_to_one() {
        let form: BuyNowForm =
            parse_form("name=Amina&phone=0555&channel=telegram&quantity=0");
        assert_eq!(form.quantity(), 1);
        let form: BuyNowForm =
            parse_form("name=Amina&phone=0555&channel=telegram&quantity=3&size=M");
        assert_eq!(form.quantity(), 3);
        assert_eq!(form.size.as_deref(), Some("M"));
        assert_eq!(form.order.name, "Amina");
    }

    fn sold_out_page(restock_enabled: bool) -> String {
        let mut product = product();
        product.stock_quantity = Some(0);
        ProductShowTemplate {
            site: Site {
                store_name: "Ra9ia Collection".to_string(),
                announcement: None,
                contact: ContactSettings::default(),
            },
            product: ProductView::new(&product, CurrencyCode::DZD),
            channels: Vec::new(),
            values: OrderFormValues::default(),
            alert: None,
            restock_enabled,
        }
        .render()
        .unwrap()
    }

    #[test]
    fn test_restock_form_needs_script_and_write_access() {
        let page = sold_out_page(true);
        let at = page.find("data-restock").unwrap();
        let start = page[..at].rfind("<form").unwrap();
        let end = at + page[at..].find('>').unwrap();
        let form_tag = &page[start..end];
        assert!(!form_tag.contains("method="));
        assert!(!form_tag.contains("action="));
        assert!(page.contains(r#"data-restock="/api/restock-notifications""#));
        assert!(!page.contains("add-to-cart"));

        let page = sold_out_page(false);
        assert!(!page.contains("data-restock"));
        assert!(page.contains("Sold out"));
    }

    fn parse_form<T: serde::de::DeserializeOwned>(body: &str) -> T {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime
            .block_on(Form::<T>::from_request(request, &()))
            .unwrap()
            .0
    }
}
