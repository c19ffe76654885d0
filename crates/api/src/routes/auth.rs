use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use entity::role::RoleName;

use crate::{
    auth::CurrentUser,
    dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto},
    error::{ApiJson, ApiResult},
    service::users,
    AppState,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = users::register(&state.db, &state.auth, input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(users::login(&state.db, &state.auth, input).await?))
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<UserDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(users::me(&state.db, &user).await?))
}
