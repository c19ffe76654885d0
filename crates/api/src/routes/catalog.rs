use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use entity::role::RoleName;

use crate::{
    auth::CurrentUser,
    dto::{
        CategoryDto, CategoryRequest, CriterionDto, CriterionQuery, CriterionRequest, ProductDto,
        ProductQuery, ProductRequest,
    },
    error::{ApiJson, ApiPath, ApiQuery, ApiResult},
    service::catalog,
    AppState,
};

pub(super) fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub(super) fn criterion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_criteria).post(create_criterion))
        .route(
            "/{id}",
            get(get_criterion).put(update_criterion).delete(delete_criterion),
        )
}

pub(super) fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<CategoryDto>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::list_categories(&state.db).await?))
}

async fn get_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<CategoryDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::get_category(&state.db, id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryDto>)> {
    user.require(RoleName::Admin)?;
    let created = catalog::create_category(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<CategoryRequest>,
) -> ApiResult<Json<CategoryDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(catalog::update_category(&state.db, id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<StatusCode> {
    user.require(RoleName::Admin)?;
    catalog::delete_category(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_criteria(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<CriterionQuery>,
) -> ApiResult<Json<Vec<CriterionDto>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::list_criteria(&state.db, query.category_id).await?))
}

async fn get_criterion(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<CriterionDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::get_criterion(&state.db, id).await?))
}

async fn create_criterion(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CriterionRequest>,
) -> ApiResult<(StatusCode, Json<CriterionDto>)> {
    user.require(RoleName::Admin)?;
    let created = catalog::create_criterion(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_criterion(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<CriterionRequest>,
) -> ApiResult<Json<CriterionDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(catalog::update_criterion(&state.db, id, input).await?))
}

async fn delete_criterion(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<StatusCode> {
    user.require(RoleName::Admin)?;
    catalog::delete_criterion(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::list_products(&state.db, &query).await?))
}

async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ProductDto>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(catalog::get_product(&state.db, id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    user.require(RoleName::Admin)?;
    let created = catalog::create_product(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<ProductRequest>,
) -> ApiResult<Json<ProductDto>> {
    user.require(RoleName::Admin)?;
    Ok(Json(catalog::update_product(&state.db, id, input).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<StatusCode> {
    user.require(RoleName::Admin)?;
    catalog::delete_product(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
