//! Wire types for the REST API. Field names follow the server's camelCase JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub criterion_id: i32,
    pub criterion_name: String,
    pub weight: f64,
    pub rating: i32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub date_created: DateTime<Utc>,
    pub integral_rating: Option<f64>,
    pub status: String,
    pub product_id: i32,
    pub product_name: String,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    pub criterion_id: i32,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub product_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    pub ratings: Vec<RatingInput>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_reviews: u64,
    pub active_reviews: u64,
    pub rejected_reviews: u64,
    pub rated_reviews: u64,
    pub average_rating: Option<f64>,
    pub total_products: u64,
    pub total_categories: u64,
    pub total_criteria: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductScore {
    pub product_id: i32,
    pub product_name: String,
    pub brand: String,
    pub category_name: String,
    pub review_count: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category_id: i32,
    pub category_name: String,
    pub review_count: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriterionStat {
    pub criterion_id: i32,
    pub criterion_name: String,
    pub weight: f64,
    pub rating_count: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    pub review_count: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopOrder {
    #[default]
    Best,
    Worst,
}

impl TopOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            TopOrder::Best => "best",
            TopOrder::Worst => "worst",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Everything the dashboard view and the export need, fetched in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub best: Vec<ProductScore>,
    pub worst: Vec<ProductScore>,
    pub categories: Vec<CategoryStat>,
    pub criteria: Vec<CriterionStat>,
    pub trend: Vec<TrendPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_page_parses_server_json() {
        let json = r#"{
            "items": [{
                "id": 7,
                "dateCreated": "2026-03-04T10:00:00Z",
                "integralRating": 3.75,
                "status": "ACTIVE",
                "productId": 2,
                "productName": "Kettle",
                "ratings": [
                    {"criterionId": 1, "criterionName": "Quality", "weight": 3.0, "rating": 4}
                ]
            }],
            "page": 1, "size": 20, "total": 1, "totalPages": 1
        }"#;
        let page: Page<Review> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].integral_rating, Some(3.75));
        assert_eq!(page.items[0].ratings[0].criterion_name, "Quality");
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn filter_omits_unset_fields() {
        let filter = ReviewFilter {
            product_id: Some(3),
            page: Some(2),
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, serde_json::json!({"productId": 3, "page": 2}));
    }

    #[test]
    fn create_review_uses_camel_case() {
        let body = CreateReview {
            product_id: 1,
            date_created: None,
            ratings: vec![RatingInput {
                criterion_id: 4,
                rating: 5,
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["productId"], 1);
        assert_eq!(value["ratings"][0]["criterionId"], 4);
        assert!(value.get("dateCreated").is_none());
    }
}
