use axum::{extract::State, routing::get, Json, Router};

use crate::{dto::HealthResponse, AppState};

mod analytics;
mod auth;
mod catalog;
mod reviews;
mod users;

/// Method and path of every route, as served by [`router`].
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("POST", "/api/auth/register"),
    ("POST", "/api/auth/login"),
    ("GET", "/api/auth/me"),
    ("GET", "/api/users"),
    ("GET", "/api/users/{id}"),
    ("PUT", "/api/users/{id}/roles"),
    ("PUT", "/api/users/{id}/status"),
    ("GET", "/api/categories"),
    ("POST", "/api/categories"),
    ("GET", "/api/categories/{id}"),
    ("PUT", "/api/categories/{id}"),
    ("DELETE", "/api/categories/{id}"),
    ("GET", "/api/criteria"),
    ("POST", "/api/criteria"),
    ("GET", "/api/criteria/{id}"),
    ("PUT", "/api/criteria/{id}"),
    ("DELETE", "/api/criteria/{id}"),
    ("GET", "/api/products"),
    ("POST", "/api/products"),
    ("GET", "/api/products/{id}"),
    ("PUT", "/api/products/{id}"),
    ("DELETE", "/api/products/{id}"),
    ("GET", "/api/reviews"),
    ("POST", "/api/reviews"),
    ("GET", "/api/reviews/{id}"),
    ("DELETE", "/api/reviews/{id}"),
    ("PUT", "/api/reviews/{id}/ratings"),
    ("PUT", "/api/reviews/{id}/status"),
    ("GET", "/api/analytics/kpis"),
    ("GET", "/api/analytics/top-products"),
    ("GET", "/api/analytics/categories"),
    ("GET", "/api/analytics/criteria"),
    ("GET", "/api/analytics/trend"),
];

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/categories", catalog::category_routes())
        .nest("/criteria", catalog::criterion_routes())
        .nest("/products", catalog::product_routes())
        .nest("/reviews", reviews::routes())
        .nest("/analytics", analytics::routes());
    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.db.ping().await.is_ok();
    Json(HealthResponse {
        ok: true,
        db_ok,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
