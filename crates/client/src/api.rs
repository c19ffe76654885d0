use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AuthResponse, CategoryStat, CreateReview, CriterionStat, Dashboard, ErrorBody, Kpis,
    LoginRequest, Page, Product, ProductScore, RegisterRequest, Review, ReviewFilter, TopOrder,
    TrendPoint, User,
};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{code}: {message} (HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("no API token; run `review-client login` and export REVIEW_API_TOKEN")]
    MissingToken,
}

impl ClientError {
    fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(err) => ClientError::Api {
                status,
                code: err.code,
                message: err.message,
            },
            Err(_) => ClientError::Api {
                status,
                code: "HTTP".into(),
                message: if body.trim().is_empty() {
                    "empty response".into()
                } else {
                    body.trim().to_string()
                },
            },
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        debug!(path, "GET");
        let request = self.authed(self.http.get(self.url(path)).query(query))?;
        Self::decode(request.send().await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        auth: bool,
    ) -> ClientResult<T> {
        debug!(path, "POST");
        let mut request = self.http.post(self.url(path)).json(body);
        if auth {
            request = self.authed(request)?;
        }
        Self::decode(request.send().await?).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        self.post("/api/auth/login", &LoginRequest { email, password }, false)
            .await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<AuthResponse> {
        self.post(
            "/api/auth/register",
            &RegisterRequest {
                name,
                email,
                password,
            },
            false,
        )
        .await
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.get("/api/auth/me", &[]).await
    }

    pub async fn kpis(&self) -> ClientResult<Kpis> {
        self.get("/api/analytics/kpis", &[]).await
    }

    pub async fn top_products(
        &self,
        limit: u64,
        order: TopOrder,
        category_id: Option<i32>,
    ) -> ClientResult<Vec<ProductScore>> {
        let mut query = vec![
            ("limit", limit.to_string()),
            ("order", order.as_str().to_string()),
        ];
        push_opt(&mut query, "categoryId", category_id);
        self.get("/api/analytics/top-products", &query).await
    }

    pub async fn category_stats(&self) -> ClientResult<Vec<CategoryStat>> {
        self.get("/api/analytics/categories", &[]).await
    }

    pub async fn criterion_stats(
        &self,
        category_id: Option<i32>,
    ) -> ClientResult<Vec<CriterionStat>> {
        let mut query = Vec::new();
        push_opt(&mut query, "categoryId", category_id);
        self.get("/api/analytics/criteria", &query).await
    }

    pub async fn trend(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ClientResult<Vec<TrendPoint>> {
        let mut query = Vec::new();
        push_opt(&mut query, "from", from);
        push_opt(&mut query, "to", to);
        self.get("/api/analytics/trend", &query).await
    }

    pub async fn products(
        &self,
        category_id: Option<i32>,
        q: Option<&str>,
    ) -> ClientResult<Vec<Product>> {
        let mut query = Vec::new();
        push_opt(&mut query, "categoryId", category_id);
        push_opt(&mut query, "q", q);
        self.get("/api/products", &query).await
    }

    pub async fn reviews(&self, filter: &ReviewFilter) -> ClientResult<Page<Review>> {
        debug!(path = "/api/reviews", "GET");
        let request = self.authed(self.http.get(self.url("/api/reviews")).query(filter))?;
        Self::decode(request.send().await?).await
    }

    pub async fn create_review(&self, body: &CreateReview) -> ClientResult<Review> {
        self.post("/api/reviews", body, true).await
    }

    /// Fetches every dashboard panel concurrently.
    pub async fn dashboard(&self, top: u64, category_id: Option<i32>) -> ClientResult<Dashboard> {
        let (kpis, best, worst, categories, criteria, trend) = tokio::try_join!(
            self.kpis(),
            self.top_products(top, TopOrder::Best, category_id),
            self.top_products(top, TopOrder::Worst, category_id),
            self.category_stats(),
            self.criterion_stats(category_id),
            self.trend(None, None),
        )?;
        Ok(Dashboard {
            kpis,
            best,
            worst,
            categories,
            criteria,
            trend,
        })
    }
}

fn push_opt<T: ToString>(
    query: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<T>,
) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}
