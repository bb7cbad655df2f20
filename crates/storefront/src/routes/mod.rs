//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Catalogue
//! GET  /products               - Product listing
//! GET  /products/{slug}        - Product detail
//! POST /products/{slug}/order  - Buy now (redirects to the chat app)
//! GET  /collections            - Collection listing
//! GET  /collections/{slug}     - Collection detail
//! GET  /partners               - Partner listing
//! GET  /partners/{slug}        - Partner page
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Order form
//! POST /checkout               - Compose the order and redirect to the chat app
//!
//! # API
//! POST /api/restock-notifications - Restock sign-up (JSON)
//! ```

pub mod api;
pub mod cart;
pub mod collections;
pub mod home;
pub mod partners;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::filters;
use crate::middleware::{order_rate_limiter, restock_rate_limiter};
use crate::state::{AppState, Site};

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route(
            "/{slug}/order",
            post(products::order).layer(order_rate_limiter()),
        )
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{slug}", get(collections::show))
}

/// Create the partner routes router.
pub fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(partners::index))
        .route("/{slug}", get(partners::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/restock-notifications",
        post(api::restock::create).layer(restock_rate_limiter()),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .nest("/partners", partner_routes())
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(cart::checkout).merge(post(cart::place_order).layer(order_rate_limiter())),
        )
        .nest("/api", api_routes())
        .fallback(not_found)
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub site: Site,
}

/// Fallback for unknown paths.
pub async fn not_found(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            site: state.site().await,
        },
    )
}
