use axum::{extract::State, routing::get, Json, Router};
use entity::role::RoleName;

use crate::{
    auth::CurrentUser,
    dto::{
        CategoryFilter, CategoryStat, CriterionStat, Kpis, ProductScore, TopProductsQuery,
        TrendPoint, TrendQuery,
    },
    error::{ApiQuery, ApiResult},
    service::analytics,
    AppState,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/kpis", get(kpis))
        .route("/top-products", get(top_products))
        .route("/categories", get(categories))
        .route("/criteria", get(criteria))
        .route("/trend", get(trend))
}

async fn kpis(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Kpis>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(analytics::kpis(&state.db).await?))
}

async fn top_products(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<TopProductsQuery>,
) -> ApiResult<Json<Vec<ProductScore>>> {
    user.require(RoleName::Analyst)?;
    let rows =
        analytics::top_products(&state.db, query.limit, query.order, query.category_id).await?;
    Ok(Json(rows))
}

async fn categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<CategoryStat>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(analytics::category_rollup(&state.db).await?))
}

async fn criteria(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<CategoryFilter>,
) -> ApiResult<Json<Vec<CriterionStat>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(analytics::criterion_averages(&state.db, query.category_id).await?))
}

async fn trend(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    user.require(RoleName::Analyst)?;
    Ok(Json(analytics::monthly_trend(&state.db, query.from, query.to).await?))
}
