//! Cart and checkout route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads;
//! without the `HX-Request` header they redirect back to the cart page so the
//! forms also work without JavaScript. The cart itself lives in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use ra9ia_core::{Cart, CartLineItem, CurrencyCode, LineKey, Price, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::routes::products::{ChannelView, OrderFormValues, channel_views};
use crate::services::CartStore;
use crate::services::order::{self, OrderForm};
use crate::state::{AppState, Site};

/// Event HTMX listens for to refresh the cart badge.
const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub slug: Option<String>,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        let money = |amount: Decimal| Price::new(amount, currency).display();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.to_string(),
                    slug: item.slug.clone(),
                    name: item.name.clone(),
                    color: item.color.clone(),
                    size: item.size.clone(),
                    quantity: item.quantity,
                    price: money(item.unit_price),
                    line_price: money(item.line_total()),
                    image: item.image.clone(),
                })
                .collect(),
            subtotal: money(cart.subtotal()),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
///
/// Name and price come from the product page as rendered; they are not
/// checked against the CMS.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl AddToCartForm {
    fn problem(&self) -> Option<&'static str> {
        if self.product_id.trim().is_empty() {
            Some("Missing product")
        } else if self.price.is_sign_negative() {
            Some("Invalid price")
        } else {
            None
        }
    }
}

/// Identifies one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl LineForm {
    fn key(&self) -> LineKey {
        LineKey::new(
            ProductId::new(self.product_id.as_str()),
            self.color.clone(),
            self.size.clone(),
        )
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: i64,
}

impl UpdateCartForm {
    fn key(&self) -> LineKey {
        LineKey::new(
            ProductId::new(self.product_id.as_str()),
            self.color.clone(),
            self.size.clone(),
        )
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub site: Site,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub site: Site,
    pub cart: CartView,
    pub channels: Vec<ChannelView>,
    pub values: OrderFormValues,
    pub alert: Option<String>,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Answer a cart mutation: the items fragment for HTMX, a redirect otherwise.
fn items_response(
    headers: &HeaderMap,
    store: &CartStore<Session>,
    currency: CurrencyCode,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::new(store.cart(), currency),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let store = CartStore::load(session).await;
    CartShowTemplate {
        site: state.site().await,
        cart: CartView::new(store.cart(), state.currency()),
    }
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an HTMX trigger so other cart widgets refresh.
#[instrument(skip(session, headers, form), fields(product_id = %form.product_id))]
pub async fn add(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    if let Some(problem) = form.problem() {
        return Err(AppError::BadRequest(problem.to_string()));
    }

    let item = CartLineItem::new(
        ProductId::new(form.product_id.as_str()),
        form.name,
        form.price,
        form.quantity.unwrap_or(1).max(1),
    )
    .with_color(form.color)
    .with_size(form.size)
    .with_image(form.image)
    .with_slug(form.slug);

    let mut store = CartStore::load(session).await;
    store.add_item(item).await?;

    add_breadcrumb("cart", "Added to cart", &[("product_id", &form.product_id)]);

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: store.item_count(),
        },
    )
        .into_response())
}

/// Update item quantity (HTMX). Zero or less removes the line.
#[instrument(skip(state, session, headers, form), fields(product_id = %form.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut store = CartStore::load(session).await;
    store.update_quantity(&form.key(), form.quantity).await?;
    Ok(items_response(&headers, &store, state.currency()))
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers, form), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let mut store = CartStore::load(session).await;
    store.remove_item(&form.key()).await?;
    Ok(items_response(&headers, &store, state.currency()))
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut store = CartStore::load(session).await;
    store.clear().await?;
    Ok(items_response(&headers, &store, state.currency()))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let store = CartStore::load(session).await;
    CartCountTemplate {
        count: store.item_count(),
    }
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let store = CartStore::load(session).await;
    if store.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let site = state.site().await;
    CheckoutTemplate {
        channels: channel_views(&site.contact),
        cart: CartView::new(store.cart(), state.currency()),
        values: OrderFormValues::default(),
        alert: None,
        site,
    }
    .into_response()
}

/// Compose the cart order and hand it off to the chosen chat app.
///
/// The cart is sent to the store-wide destination and kept afterwards: the
/// visitor may come back if the chat app never opened.
#[instrument(skip(state, session, form), fields(channel = %form.channel))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OrderForm>,
) -> Response {
    let store = CartStore::load(session).await;
    if store.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let site = state.site().await;
    let rerender = |site: Site, alert: &str| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutTemplate {
                channels: channel_views(&site.contact),
                cart: CartView::new(store.cart(), state.currency()),
                values: OrderFormValues::from(&form),
                alert: Some(alert.to_string()),
                site,
            },
        )
            .into_response()
    };

    if let Some(problem) = form.problem() {
        return rerender(site, problem);
    }

    let message = order::build_message(
        &form,
        store.cart().items().to_vec(),
        &site.store_name,
        state.currency(),
        Utc::now(),
    );

    match order::hand_off(&message, &form.channel, &site.contact) {
        Ok(handoff) => Redirect::to(&handoff.url).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Checkout handoff aborted");
            rerender(site, &e.to_string())
        }
    }
}
