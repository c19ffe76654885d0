use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use entity::role::RoleName;

use crate::{
    auth::CurrentUser,
    dto::{
        CreateReviewRequest, Page, ReplaceRatingsRequest, ReviewDto, ReviewQuery,
        ReviewStatusRequest,
    },
    error::{ApiJson, ApiPath, ApiQuery, ApiResult},
    service::reviews,
    AppState,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(fetch).delete(remove))
        .route("/{id}/ratings", put(replace_ratings))
        .route("/{id}/status", put(set_status))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> ApiResult<Json<Page<ReviewDto>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(reviews::list_reviews(&state.db, &query).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ReviewDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(reviews::get_review(&state.db, id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewDto>)> {
    user.require(RoleName::Analyst)?;
    let created = reviews::create_review(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn replace_ratings(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<ReplaceRatingsRequest>,
) -> ApiResult<Json<ReviewDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(reviews::replace_ratings(&state.db, id, input.ratings).await?))
}

async fn set_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<ReviewStatusRequest>,
) -> ApiResult<Json<ReviewDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(reviews::set_status(&state.db, id, input.status).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<StatusCode> {
    user.require(RoleName::Admin)?;
    reviews::delete_review(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
