mod common;

use axum::http::StatusCode;
use common::{approx, kitchen_catalog, TestApp};
use serde_json::json;

#[tokio::test]
async fn created_review_carries_weighted_integral_rating() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    // (4·3 + 2·1) / 4 = 3.5
    let review = app
        .create_review(
            catalog.kettle_id,
            "2024-03-05T12:00:00Z",
            &[(catalog.quality_id, 4), (catalog.price_id, 2)],
        )
        .await;
    assert!(approx(&review["integralRating"], 3.5), "{review}");
    assert_eq!(review["status"], "ACTIVE");
    assert_eq!(review["productName"], "Kettle");
    assert_eq!(review["ratings"].as_array().unwrap().len(), 2);
    assert_eq!(review["ratings"][0]["criterionName"], "Quality");
    assert_eq!(review["dateCreated"], "2024-03-05T12:00:00Z");
}

#[tokio::test]
async fn invalid_rating_sets_are_rejected() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let cases = [
        json!({ "productId": catalog.kettle_id, "ratings": [] }),
        json!({
            "productId": catalog.kettle_id,
            "ratings": [
                { "criterionId": catalog.price_id, "rating": 3 },
                { "criterionId": catalog.price_id, "rating": 4 }
            ]
        }),
        json!({
            "productId": catalog.kettle_id,
            "ratings": [{ "criterionId": 9999, "rating": 3 }]
        }),
        json!({
            "productId": 9999,
            "ratings": [{ "criterionId": catalog.price_id, "rating": 3 }]
        }),
    ];
    for payload in cases {
        let (status, body) = app
            .post("/api/reviews", &app.analyst_token, payload)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], "VALIDATION");
    }

    let (_, page) = app.get("/api/reviews", &app.analyst_token).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn rating_bounds_are_not_enforced_by_the_server() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let review = app
        .create_review(catalog.kettle_id, "2024-03-05T12:00:00Z", &[(catalog.price_id, 7)])
        .await;
    assert!(approx(&review["integralRating"], 7.0));
}

#[tokio::test]
async fn replacing_ratings_recomputes_the_score() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let review = app
        .create_review(catalog.kettle_id, "2024-03-05T12:00:00Z", &[(catalog.quality_id, 5)])
        .await;
    let uri = format!("/api/reviews/{}/ratings", review["id"]);

    // (1·3 + 5·1) / 4 = 2.0
    let (status, body) = app
        .put(
            &uri,
            &app.analyst_token,
            json!({ "ratings": [
                { "criterionId": catalog.quality_id, "rating": 1 },
                { "criterionId": catalog.price_id, "rating": 5 }
            ] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(approx(&body["integralRating"], 2.0), "{body}");
    assert_eq!(body["ratings"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .put(&uri, &app.analyst_token, json!({ "ratings": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            "/api/reviews/9999/ratings",
            &app.analyst_token,
            json!({ "ratings": [{ "criterionId": catalog.price_id, "rating": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_changes_and_deletes_need_admin() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let review = app
        .create_review(catalog.kettle_id, "2024-03-05T12:00:00Z", &[(catalog.price_id, 3)])
        .await;
    let id = review["id"].as_i64().unwrap();

    let (status, _) = app
        .put(
            &format!("/api/reviews/{id}/status"),
            &app.analyst_token,
            json!({ "status": "REJECTED" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .admin_put(&format!("/api/reviews/{id}/status"), json!({ "status": "REJECTED" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "REJECTED");

    let (status, _) = app
        .admin_put(&format!("/api/reviews/{id}/status"), json!({ "status": "PENDING" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .delete(&format!("/api/reviews/{id}"), &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.admin_delete(&format!("/api/reviews/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/api/reviews/{id}"), &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_pages_newest_first_with_filters() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let audio = app.create_category("Audio").await;
    let speaker = app.create_product("Speaker", "Boom", audio).await;

    for (product, date) in [
        (catalog.kettle_id, "2024-01-10T08:00:00Z"),
        (catalog.kettle_id, "2024-02-10T08:00:00Z"),
        (catalog.toaster_id, "2024-03-10T08:00:00Z"),
        (speaker, "2024-04-10T08:00:00Z"),
        (catalog.kettle_id, "2024-05-10T08:00:00Z"),
    ] {
        app.create_review(product, date, &[(catalog.price_id, 3)]).await;
    }

    let (status, page) = app
        .get("/api/reviews?page=1&size=2", &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 5);
    assert_eq!(page["totalPages"], 3);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["dateCreated"], "2024-05-10T08:00:00Z");
    assert_eq!(items[1]["dateCreated"], "2024-04-10T08:00:00Z");

    let (_, page) = app
        .get("/api/reviews?page=3&size=2", &app.analyst_token)
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (_, page) = app
        .get(
            &format!("/api/reviews?productId={}", catalog.kettle_id),
            &app.analyst_token,
        )
        .await;
    assert_eq!(page["total"], 3);

    let (_, page) = app
        .get(
            &format!("/api/reviews?categoryId={}", catalog.category_id),
            &app.analyst_token,
        )
        .await;
    assert_eq!(page["total"], 4);

    let (_, page) = app
        .get("/api/reviews?from=2024-02-10&to=2024-04-10", &app.analyst_token)
        .await;
    assert_eq!(page["total"], 3);

    let (status, _) = app
        .get("/api/reviews?from=2024-05-01&to=2024-01-01", &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_by_status() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    let first = app
        .create_review(catalog.kettle_id, "2024-01-10T08:00:00Z", &[(catalog.price_id, 3)])
        .await;
    app.create_review(catalog.kettle_id, "2024-01-11T08:00:00Z", &[(catalog.price_id, 4)])
        .await;
    app.admin_put(
        &format!("/api/reviews/{}/status", first["id"]),
        json!({ "status": "REJECTED" }),
    )
    .await;

    let (_, page) = app
        .get("/api/reviews?status=REJECTED", &app.analyst_token)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], first["id"]);

    let (status, _) = app
        .get("/api/reviews?status=bogus", &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_and_size_are_clamped() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    for day in 10..13 {
        let date = format!("2024-01-{day}T08:00:00Z");
        app.create_review(catalog.kettle_id, &date, &[(catalog.price_id, 3)])
            .await;
    }

    let (status, page) = app
        .get("/api/reviews?page=0&size=0", &app.analyst_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 1);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (status, page) = app.get("/api/reviews?size=1000", &app.analyst_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["size"], 100);
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn pages_past_the_end_are_empty() {
    let app = TestApp::new().await;
    let catalog = kitchen_catalog(&app).await;
    app.create_review(catalog.kettle_id, "2024-01-10T08:00:00Z", &[(catalog.price_id, 3)])
        .await;

    let (status, page) = app.get("/api/reviews?page=2", &app.analyst_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert!(page["items"].as_array().unwrap().is_empty());

    let (status, page) = app
        .get(
            "/api/reviews?page=18446744073709551615&size=100",
            &app.analyst_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], u64::MAX);
    assert_eq!(page["total"], 1);
    assert!(page["items"].as_array().unwrap().is_empty());
}
