//! Ra9ia Collection storefront library.
//!
//! Server-rendered storefront (axum, askama, HTMX) reading its catalogue from
//! Sanity. There is no payment step: orders are composed into a text message
//! and handed to Telegram or WhatsApp.
//!
//! The binary in `main.rs` adds tracing and Sentry around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sanity;
pub mod services;
pub mod state;

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Directory static assets are served from, relative to the working directory.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are left to the caller so tests can run without a client.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(middleware::security_headers_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the CMS.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::config::tests::test_config;

    const CLIENT_IP: &str = "203.0.113.10";

    fn test_app(config: StorefrontConfig) -> Router {
        app(AppState::new(config))
    }

    fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn session_cookie(response: &Response<Body>) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const ADD_ABAYA: &str =
        "product_id=p1&name=Abaya+Noir&price=100&quantity=1&color=black&size=M&slug=abaya-noir";

    #[tokio::test]
    async fn test_health() {
        let response = test_app(test_config())
            .oneshot(get("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_repeated_add_merges_into_one_line() {
        let app = test_app(test_config());

        let response = app
            .clone()
            .oneshot(form_post("/cart/add", ADD_ABAYA, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(form_post("/cart/add", ADD_ABAYA, Some(&cookie)))
            .await
            .unwrap();
        assert!(body_text(response).await.contains(">2<"));

        let response = app.oneshot(get("/cart", Some(&cookie))).await.unwrap();
        let page = body_text(response).await;
        assert_eq!(page.matches("data-cart-line").count(), 1);
        assert!(page.contains("200 DA"));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let app = test_app(test_config());
        let response = app
            .clone()
            .oneshot(form_post("/cart/add", ADD_ABAYA, None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(form_post(
                "/cart/update",
                "product_id=p1&color=black&size=M&quantity=0",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert!(!body_text(response).await.contains("data-cart-line"));

        let response = app.oneshot(get("/cart/count", Some(&cookie))).await.unwrap();
        assert!(body_text(response).await.contains(">0<"));
    }

    #[tokio::test]
    async fn test_cart_with_huge_price_still_renders() {
        let app = test_app(test_config());
        let response = app
            .clone()
            .oneshot(form_post(
                "/cart/add",
                "product_id=p1&name=Abaya&price=79228162514264337593543950335&quantity=2",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);

        let response = app.oneshot(get("/cart", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("data-cart-line"));
    }

    #[tokio::test]
    async fn test_add_rejects_negative_price() {
        let response = test_app(test_config())
            .oneshot(form_post(
                "/cart/add",
                "product_id=p1&name=Abaya&price=-5&quantity=1",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_without_htmx_redirects_to_cart() {
        let request = Request::builder()
            .method("POST")
            .uri("/cart/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(ADD_ABAYA))
            .unwrap();
        let response = test_app(test_config()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_redirects() {
        let response = test_app(test_config())
            .oneshot(get("/checkout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_checkout_hands_off_to_whatsapp() {
        let app = test_app(test_config());
        let response = app
            .clone()
            .oneshot(form_post("/cart/add", ADD_ABAYA, None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = app
            .oneshot(form_post(
                "/checkout",
                "name=Amina&phone=0555123456&city=Oran&channel=whatsapp",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("https://wa.me/213555000111?text="));
        assert!(location.contains("Abaya%20Noir"));
    }

    #[tokio::test]
    async fn test_checkout_without_destination_shows_alert() {
        let mut config = test_config();
        config.contact.whatsapp_number = None;
        let app = test_app(config);

        let response = app
            .clone()
            .oneshot(form_post("/cart/add", ADD_ABAYA, None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = app
            .oneshot(form_post(
                "/checkout",
                "name=Amina&phone=0555123456&channel=whatsapp",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert!(body_text(response).await.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn test_restock_rejects_invalid_email() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/restock-notifications")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::from(r#"{"email":"nope","product_id":"p1"}"#))
            .unwrap();
        let response = test_app(test_config()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = test_app(test_config())
            .oneshot(get("/no-such-page", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("x-request-id").is_some());
    }
}
