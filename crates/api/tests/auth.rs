mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_creates_active_analyst_and_returns_token() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Grace",
                "email": " Grace@Example.com ",
                "password": "longenough"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["email"], "grace@example.com");
    assert_eq!(body["user"]["active"], true);
    assert_eq!(body["user"]["roles"], json!(["ANALYST"]));

    let token = body["token"].as_str().unwrap();
    let (status, me) = app.get("/api/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Grace");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Copy", "email": "ADMIN@test.dev", "password": "longenough" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;
    for payload in [
        json!({ "name": "", "email": "a@b.c", "password": "longenough" }),
        json!({ "name": "Bob", "email": "nope", "password": "longenough" }),
        json!({ "name": "Bob", "email": "bob@b.c", "password": "short" }),
    ] {
        let (status, body) = app
            .send(Method::POST, "/api/auth/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], "VALIDATION");
    }
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "analyst@test.dev", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["roles"], json!(["ANALYST"]));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "analyst@test.dev", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@test.dev", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_valid_token_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::GET, "/api/categories", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = app.get("/api/categories", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("review_session={}", app.analyst_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["email"], "analyst@test.dev");
}

#[tokio::test]
async fn analysts_cannot_reach_admin_routes() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/users", &app.analyst_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .post("/api/categories", &app.analyst_token, json!({ "name": "Nope" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_list_and_filter_users() {
    let app = TestApp::new().await;
    let (status, body) = app.admin_get("/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app.admin_get("/api/users?q=alan").await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "analyst@test.dev");

    let (status, body) = app.admin_get("/api/users/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn role_replacement_takes_effect_on_next_request() {
    let app = TestApp::new().await;
    let uri = format!("/api/users/{}/roles", app.analyst_id);

    let (status, _) = app.admin_put(&uri, json!({ "roles": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.admin_put(&uri, json!({ "roles": ["OWNER"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .admin_put(&uri, json!({ "roles": ["admin", "ANALYST"] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["roles"], json!(["ANALYST", "ADMIN"]));

    // Roles are reloaded per request, so the old token now carries admin rights.
    let (status, _) = app.get("/api/users", &app.analyst_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deactivated_users_lose_access() {
    let app = TestApp::new().await;
    let uri = format!("/api/users/{}/status", app.analyst_id);
    let (status, body) = app.admin_put(&uri, json!({ "active": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, _) = app.get("/api/auth/me", &app.analyst_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "analyst@test.dev", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Account disabled");

    let (status, _) = app.admin_put(&uri, json!({ "active": true })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/auth/me", &app.analyst_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let app = TestApp::new().await;
    let uri = format!("/api/users/{}/status", app.admin_id);
    let (status, body) = app.admin_put(&uri, json!({ "active": false })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn admin_cannot_drop_own_admin_role() {
    let app = TestApp::new().await;
    let uri = format!("/api/users/{}/roles", app.admin_id);
    let (status, body) = app.admin_put(&uri, json!({ "roles": ["ANALYST"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot remove your own admin role");

    let (status, body) = app.admin_get(&format!("/api/users/{}", app.admin_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["ADMIN"]));

    let (status, body) = app
        .admin_put(&uri, json!({ "roles": ["ADMIN", "ANALYST"] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn user_search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    let (status, body) = app.admin_get("/api/users?q=%25").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = app.admin_get("/api/users?q=_").await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["dbOk"], true);
}
