use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::{
    auth::{
        api as auth_api, authenticate, models::AuthenticatedIdentity, require_authenticated,
        AuthState,
    },
    catalog::{Brand, Catalog, Product, ProductType},
    middleware::request_logging,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub catalog: Arc<dyn Catalog>,
}

/// Create the API router.
///
/// Stage order for every request: logging → CORS → authenticator → route gate → handler.
pub fn create_router(state: AppState) -> Router {
    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/user", get(auth_api::current_user))
        .with_state(state.auth.clone());

    // Protected catalog routes
    let protected_routes = Router::new()
        .route("/api/products", get(list_products))
        .route_layer(middleware::from_fn(require_authenticated))
        .with_state(state.catalog.clone());

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/products/brands", get(list_brands))
        .route("/api/products/types", get(list_types))
        .route("/api/products/:id", get(get_product))
        .with_state(state.catalog);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(auth_router)
        .layer(middleware::from_fn_with_state(
            state.auth.authenticator,
            authenticate,
        ))
        .layer(cors_layer())
        .layer(middleware::from_fn(request_logging))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
        "details": { "customHealthCheck": "Up and running" },
    }))
}

async fn list_products(
    State(catalog): State<Arc<dyn Catalog>>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Json<Vec<Product>> {
    debug!("Listing products for {}", identity.username);
    Json(catalog.products())
}

async fn get_product(
    State(catalog): State<Arc<dyn Catalog>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    catalog
        .product(id)
        .map(Json)
        .ok_or(ApiError::ProductNotFound(id))
}

async fn list_brands(State(catalog): State<Arc<dyn Catalog>>) -> Json<Vec<Brand>> {
    Json(catalog.brands())
}

async fn list_types(State(catalog): State<Arc<dyn Catalog>>) -> Json<Vec<ProductType>> {
    Json(catalog.types())
}

// ===== Error Handling =====

#[derive(Serialize)]
struct ErrorResponse {
    status: u16,
    error: &'static str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    ProductNotFound(i64),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::ProductNotFound(id) => (
                StatusCode::NOT_FOUND,
                "Product doesn't exist",
                format!("Product with id {} not found", id),
            ),
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error,
            message,
        });

        (status, body).into_response()
    }
}
