//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::admin_auth_middleware;
use crate::server::routes::{admin, categories, chat, health_handler, manufacturers, products};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
}

/// Build the Axum application router
///
/// `admin_api_key` guards mutations and `/api/admin`; `allowed_origins`
/// empty means any origin.
pub fn build_app(
    deps: ServerDeps,
    admin_api_key: Option<SecretString>,
    allowed_origins: &[String],
) -> Router {
    let app_state = AppState { deps };

    if admin_api_key.is_none() {
        warn!("ADMIN_API_KEY not set, mutating and admin routes are open");
    }
    let admin_key = admin_api_key.map(Arc::new);

    let api = Router::new()
        // Manufacturers
        .route(
            "/manufacturers",
            get(manufacturers::list_manufacturers).post(manufacturers::create_manufacturer),
        )
        .route(
            "/manufacturers/:id",
            get(manufacturers::get_manufacturer)
                .put(manufacturers::update_manufacturer)
                .delete(manufacturers::delete_manufacturer),
        )
        // Categories
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/tree", get(categories::category_tree))
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // Products
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/products/:id/extractions",
            get(products::list_product_extractions),
        )
        .route("/products/:id/extract", post(products::extract_product))
        // Admin
        .route("/admin/overview", get(admin::overview))
        .route("/admin/search", get(admin::search))
        .route("/admin/conflicts", get(admin::conflicts))
        .route("/admin/scrape/:manufacturer", post(admin::scrape))
        .route("/admin/jobs/:id", get(admin::get_job))
        // Chat
        .route("/chat/search", post(chat::chat_search_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            admin_auth_middleware(admin_key.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}
