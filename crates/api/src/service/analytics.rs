//! Aggregate reporting over reviews.
//!
//! All figures except the KPI status counts use ACTIVE reviews that carry an
//! integral rating. Grouped queries are built with the query builder so the
//! same SQL runs on Postgres and SQLite.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Months, NaiveDate, Utc};
use entity::{
    category, criterion, criterion_category, product, review, review::Status, review_rating,
};
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use tracing::instrument;

use super::{end_of_day, start_of_day, validate_range};
use crate::{
    dto::{CategoryStat, CriterionStat, Kpis, ProductScore, TopOrder, TrendPoint},
    error::{ApiError, ApiResult},
};

pub const DEFAULT_TOP_LIMIT: u64 = 5;
pub const MAX_TOP_LIMIT: u64 = 50;
pub const DEFAULT_TREND_MONTHS: u32 = 12;
pub const MAX_TREND_MONTHS: usize = 120;

fn scored_reviews() -> Select<review::Entity> {
    review::Entity::find()
        .filter(review::Column::Status.eq(Status::Active))
        .filter(review::Column::IntegralRating.is_not_null())
}

#[instrument(skip_all)]
pub async fn kpis(db: &DatabaseConnection) -> ApiResult<Kpis> {
    let total_reviews = review::Entity::find().count(db).await?;
    let active_reviews = review::Entity::find()
        .filter(review::Column::Status.eq(Status::Active))
        .count(db)
        .await?;
    let rejected_reviews = review::Entity::find()
        .filter(review::Column::Status.eq(Status::Rejected))
        .count(db)
        .await?;
    let rated_reviews = scored_reviews().count(db).await?;
    let average_rating = scored_reviews()
        .select_only()
        .column_as(Expr::cust("AVG(review.integral_rating)"), "average_rating")
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten();
    Ok(Kpis {
        total_reviews,
        active_reviews,
        rejected_reviews,
        rated_reviews,
        average_rating,
        total_products: product::Entity::find().count(db).await?,
        total_categories: category::Entity::find().count(db).await?,
        total_criteria: criterion::Entity::find().count(db).await?,
    })
}

#[derive(Debug, FromQueryResult)]
struct ProductScoreRow {
    product_id: i32,
    product_name: String,
    brand: String,
    category_name: String,
    review_count: i64,
    average_rating: Option<f64>,
}

pub(crate) fn clamp_limit(limit: Option<u64>) -> ApiResult<u64> {
    match limit {
        None => Ok(DEFAULT_TOP_LIMIT),
        Some(value) if (1..=MAX_TOP_LIMIT).contains(&value) => Ok(value),
        Some(_) => Err(ApiError::validation(format!(
            "limit must be between 1 and {}",
            MAX_TOP_LIMIT
        ))),
    }
}

/// Products ranked by mean integral rating. Ties go to the product with more
/// reviews, then the lower id.
#[instrument(skip(db))]
pub async fn top_products(
    db: &DatabaseConnection,
    limit: Option<u64>,
    order: TopOrder,
    category_id: Option<i32>,
) -> ApiResult<Vec<ProductScore>> {
    let limit = clamp_limit(limit)?;
    let direction = match order {
        TopOrder::Best => Order::Desc,
        TopOrder::Worst => Order::Asc,
    };
    let mut select = scored_reviews()
        .select_only()
        .column_as(product::Column::Id, "product_id")
        .column_as(product::Column::Name, "product_name")
        .column_as(product::Column::Brand, "brand")
        .column_as(category::Column::Name, "category_name")
        .column_as(Expr::cust("COUNT(review.id)"), "review_count")
        .column_as(Expr::cust("AVG(review.integral_rating)"), "average_rating")
        .inner_join(product::Entity)
        .join(JoinType::InnerJoin, product::Relation::Category.def());
    if let Some(category_id) = category_id {
        select = select.filter(product::Column::CategoryId.eq(category_id));
    }
    let rows = select
        .group_by(product::Column::Id)
        .group_by(product::Column::Name)
        .group_by(product::Column::Brand)
        .group_by(category::Column::Name)
        .order_by(Expr::cust("average_rating"), direction)
        .order_by(Expr::cust("review_count"), Order::Desc)
        .order_by(product::Column::Id, Order::Asc)
        .limit(limit)
        .into_model::<ProductScoreRow>()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| ProductScore {
            product_id: row.product_id,
            product_name: row.product_name,
            brand: row.brand,
            category_name: row.category_name,
            review_count: row.review_count.max(0) as u64,
            average_rating: row.average_rating.unwrap_or(0.0),
        })
        .collect())
}

#[derive(Debug, FromQueryResult)]
struct GroupRow {
    group_id: i32,
    review_count: i64,
    average_rating: Option<f64>,
}

/// Every category, including those without scored reviews.
#[instrument(skip_all)]
pub async fn category_rollup(db: &DatabaseConnection) -> ApiResult<Vec<CategoryStat>> {
    let rows = scored_reviews()
        .select_only()
        .column_as(product::Column::CategoryId, "group_id")
        .column_as(Expr::cust("COUNT(review.id)"), "review_count")
        .column_as(Expr::cust("AVG(review.integral_rating)"), "average_rating")
        .inner_join(product::Entity)
        .group_by(product::Column::CategoryId)
        .into_model::<GroupRow>()
        .all(db)
        .await?;
    let mut by_category: HashMap<i32, GroupRow> =
        rows.into_iter().map(|row| (row.group_id, row)).collect();
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(categories
        .into_iter()
        .map(|c| {
            let stats = by_category.remove(&c.id);
            CategoryStat {
                category_id: c.id,
                category_name: c.name,
                review_count: stats.as_ref().map_or(0, |s| s.review_count.max(0) as u64),
                average_rating: stats.and_then(|s| s.average_rating),
            }
        })
        .collect())
}

/// Mean rating per criterion. With a category, only that category's products
/// count, and the listed criteria are the ones linked to it plus any rated.
#[instrument(skip(db))]
pub async fn criterion_averages(
    db: &DatabaseConnection,
    category_id: Option<i32>,
) -> ApiResult<Vec<CriterionStat>> {
    let mut select = review_rating::Entity::find()
        .select_only()
        .column_as(review_rating::Column::CriterionId, "group_id")
        .column_as(Expr::cust("COUNT(review_rating.id)"), "review_count")
        .column_as(
            Expr::cust("CAST(AVG(review_rating.rating) AS DOUBLE PRECISION)"),
            "average_rating",
        )
        .inner_join(review::Entity)
        .filter(review::Column::Status.eq(Status::Active))
        .filter(review::Column::IntegralRating.is_not_null());
    if let Some(category_id) = category_id {
        select = select
            .join(JoinType::InnerJoin, review::Relation::Product.def())
            .filter(product::Column::CategoryId.eq(category_id));
    }
    let rows = select
        .group_by(review_rating::Column::CriterionId)
        .into_model::<GroupRow>()
        .all(db)
        .await?;
    let mut by_criterion: HashMap<i32, GroupRow> =
        rows.into_iter().map(|row| (row.group_id, row)).collect();

    let mut criteria = criterion::Entity::find().order_by_asc(criterion::Column::Name);
    if let Some(category_id) = category_id {
        let rated: Vec<i32> = by_criterion.keys().copied().collect();
        let linked: Vec<i32> = criterion_category::Entity::find()
            .select_only()
            .column(criterion_category::Column::CriterionId)
            .filter(criterion_category::Column::CategoryId.eq(category_id))
            .into_tuple::<i32>()
            .all(db)
            .await?;
        let wanted: Vec<i32> = rated.into_iter().chain(linked).collect();
        criteria = criteria.filter(criterion::Column::Id.is_in(wanted));
    }
    Ok(criteria
        .all(db)
        .await?
        .into_iter()
        .map(|c| {
            let stats = by_criterion.remove(&c.id);
            CriterionStat {
                criterion_id: c.id,
                criterion_name: c.name,
                weight: c.weight,
                rating_count: stats.as_ref().map_or(0, |s| s.review_count.max(0) as u64),
                average_rating: stats.and_then(|s| s.average_rating),
            }
        })
        .collect())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of each month touched by `from..=to`.
pub(crate) fn enumerate_months(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let end = first_of_month(to);
    let mut cursor = first_of_month(from);
    let mut months = Vec::new();
    while cursor <= end {
        months.push(cursor);
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    months
}

/// Number of calendar months touched by `from..=to`; zero when `from` is later.
pub(crate) fn month_span(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year() - from.year());
    let months = years * 12 + i64::from(to.month()) - i64::from(from.month()) + 1;
    months.max(0)
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Monthly review count and mean integral rating, with empty months present.
/// Defaults to the twelve months ending today.
#[instrument(skip(db))]
pub async fn monthly_trend(
    db: &DatabaseConnection,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ApiResult<Vec<TrendPoint>> {
    validate_range(from, to)?;
    let to = to.unwrap_or_else(|| Utc::now().date_naive());
    let from = match from {
        Some(from) => from,
        None => first_of_month(to)
            .checked_sub_months(Months::new(DEFAULT_TREND_MONTHS - 1))
            .unwrap_or(to),
    };
    validate_range(Some(from), Some(to))?;
    if month_span(from, to) > MAX_TREND_MONTHS as i64 {
        return Err(ApiError::validation(format!(
            "trend range is limited to {} months",
            MAX_TREND_MONTHS
        )));
    }
    let months = enumerate_months(from, to);
    let rows: Vec<(DateTimeWithTimeZone, Option<f64>)> = scored_reviews()
        .select_only()
        .column(review::Column::DateCreated)
        .column(review::Column::IntegralRating)
        .filter(review::Column::DateCreated.gte(start_of_day(from)))
        .filter(review::Column::DateCreated.lt(end_of_day(to)))
        .into_tuple()
        .all(db)
        .await?;

    let mut buckets: BTreeMap<NaiveDate, (u64, f64)> =
        months.into_iter().map(|m| (m, (0, 0.0))).collect();
    for (created, rating) in rows {
        let Some(rating) = rating else { continue };
        let month = first_of_month(created.with_timezone(&Utc).date_naive());
        if let Some((count, sum)) = buckets.get_mut(&month) {
            *count += 1;
            *sum += rating;
        }
    }
    Ok(buckets
        .into_iter()
        .map(|(month, (count, sum))| TrendPoint {
            month: month_key(month),
            review_count: count,
            average_rating: (count > 0).then(|| sum / count as f64),
        })
        .collect())
}
