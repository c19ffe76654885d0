//! Review analytics backend: auth, catalog, reviews and aggregate reporting
//! exposed as a JSON REST surface.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub mod auth;
pub mod dto;
pub mod error;
pub mod rating;
pub mod routes;
pub mod seed;
pub mod service;

pub use auth::AuthConfig;
pub use error::{ApiError, ApiResult};
pub use routes::{router, ROUTES};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, auth: AuthConfig) -> Self {
        Self {
            db: Arc::new(db),
            auth: Arc::new(auth),
        }
    }
}
