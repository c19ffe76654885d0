#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use entity::role::RoleName;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use review_api::{
    auth::issue_token,
    router,
    service::users::{create_user, ensure_roles},
    AppState, AuthConfig,
};
use sea_orm::{Database, DatabaseConnection, TransactionTrait};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin_id: i32,
    pub admin_token: String,
    pub analyst_id: i32,
    pub analyst_token: String,
}

pub async fn migrated_sqlite() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    ensure_roles(&db).await.unwrap();
    db
}

impl TestApp {
    pub async fn new() -> Self {
        let db = migrated_sqlite().await;
        let config = AuthConfig::new(TEST_SECRET, 60);

        let txn = db.begin().await.unwrap();
        let admin = create_user(&txn, "Ada Admin", "admin@test.dev", PASSWORD, &[RoleName::Admin])
            .await
            .unwrap();
        let analyst = create_user(
            &txn,
            "Alan Analyst",
            "analyst@test.dev",
            PASSWORD,
            &[RoleName::Analyst],
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let admin_token = issue_token(admin.id, &[RoleName::Admin], &config).unwrap();
        let analyst_token = issue_token(analyst.id, &[RoleName::Analyst], &config).unwrap();
        let state = AppState::new(db, config);
        Self {
            router: router(state.clone()),
            state,
            admin_id: admin.id,
            admin_token,
            analyst_id: analyst.id,
            analyst_token,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn admin_get(&self, uri: &str) -> (StatusCode, Value) {
        self.get(uri, &self.admin_token).await
    }

    pub async fn admin_post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post(uri, &self.admin_token, body).await
    }

    pub async fn admin_put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.put(uri, &self.admin_token, body).await
    }

    pub async fn admin_delete(&self, uri: &str) -> (StatusCode, Value) {
        self.delete(uri, &self.admin_token).await
    }

    pub async fn create_category(&self, name: &str) -> i64 {
        let (status, body) = self
            .admin_post("/api/categories", json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_criterion(&self, name: &str, weight: f64, categories: &[i64]) -> i64 {
        let (status, body) = self
            .admin_post(
                "/api/criteria",
                json!({ "name": name, "weight": weight, "categoryIds": categories }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_product(&self, name: &str, brand: &str, category_id: i64) -> i64 {
        let (status, body) = self
            .admin_post(
                "/api/products",
                json!({ "name": name, "brand": brand, "categoryId": category_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// `ratings` pairs criterion ids with scores.
    pub async fn create_review(
        &self,
        product_id: i64,
        date: &str,
        ratings: &[(i64, i32)],
    ) -> Value {
        let ratings: Vec<Value> = ratings
            .iter()
            .map(|(criterion_id, rating)| json!({ "criterionId": criterion_id, "rating": rating }))
            .collect();
        let (status, body) = self
            .post(
                "/api/reviews",
                &self.analyst_token,
                json!({ "productId": product_id, "dateCreated": date, "ratings": ratings }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

/// Small catalog: one category, two criteria weighted 3 and 1, two products.
pub struct Catalog {
    pub category_id: i64,
    pub quality_id: i64,
    pub price_id: i64,
    pub kettle_id: i64,
    pub toaster_id: i64,
}

pub async fn kitchen_catalog(app: &TestApp) -> Catalog {
    let category_id = app.create_category("Kitchen").await;
    let quality_id = app.create_criterion("Quality", 3.0, &[category_id]).await;
    let price_id = app.create_criterion("Price", 1.0, &[category_id]).await;
    let kettle_id = app.create_product("Kettle", "Hearth", category_id).await;
    let toaster_id = app.create_product("Toaster", "Crumb", category_id).await;
    Catalog {
        category_id,
        quality_id,
        price_id,
        kettle_id,
        toaster_id,
    }
}

pub fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .map(|v| (v - expected).abs() < 1e-9)
        .unwrap_or(false)
}
