use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use entity::role::RoleName;

use crate::{
    auth::CurrentUser,
    dto::{UpdateRolesRequest, UpdateUserStatusRequest, UserDto, UserQuery},
    error::{ApiJson, ApiPath, ApiQuery, ApiResult},
    service::users,
    AppState,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(fetch))
        .route("/{id}/roles", put(replace_roles))
        .route("/{id}/status", put(set_status))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Json<Vec<UserDto>>> {
    user.require(RoleName::Admin)?;
    Ok(Json(users::list_users(&state.db, query.q.as_deref()).await?))
}

async fn fetch(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<UserDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(users::get_user(&state.db, id).await?))
}

async fn replace_roles(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<UpdateRolesRequest>,
) -> ApiResult<Json<UserDto>> {
    user.require(RoleName::Admin)?;
    let dto = users::replace_roles(&state.db, &user, id, &input.roles).await?;
    Ok(Json(dto))
}

async fn set_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<UpdateUserStatusRequest>,
) -> ApiResult<Json<UserDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(users::set_active(&state.db, &user, id, input.active).await?))
}
