//! Reviews and their per-criterion ratings.
//!
//! Every write that touches ratings recomputes the review's integral rating
//! inside the same transaction, so the stored score always matches the
//! stored ratings and current criterion weights.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use entity::{criterion, product, review, review::Status, review_rating};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::{debug, info, instrument};

use super::{end_of_day, start_of_day, validate_range};
use crate::{
    dto::{CreateReviewRequest, Page, RatingDto, RatingInput, ReviewDto, ReviewQuery},
    error::{ApiError, ApiResult},
    rating::integral_rating,
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

fn validate_ratings(ratings: &[RatingInput]) -> ApiResult<()> {
    if ratings.is_empty() {
        return Err(ApiError::validation("A review needs at least one rating"));
    }
    let mut seen = HashSet::new();
    for input in ratings {
        if !seen.insert(input.criterion_id) {
            return Err(ApiError::validation(format!(
                "Criterion {} is rated more than once",
                input.criterion_id
            )));
        }
    }
    Ok(())
}

/// Weights for the rated criteria. Unknown criteria are a validation error.
async fn criterion_weights<C: ConnectionTrait>(
    db: &C,
    ratings: &[RatingInput],
) -> ApiResult<HashMap<i32, f64>> {
    let ids: Vec<i32> = ratings.iter().map(|r| r.criterion_id).collect();
    let weights: HashMap<i32, f64> = criterion::Entity::find()
        .filter(criterion::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.weight))
        .collect();
    if let Some(missing) = ratings.iter().find(|r| !weights.contains_key(&r.criterion_id)) {
        return Err(ApiError::validation(format!(
            "Criterion {} does not exist",
            missing.criterion_id
        )));
    }
    Ok(weights)
}

fn score(ratings: &[RatingInput], weights: &HashMap<i32, f64>) -> f64 {
    integral_rating(
        ratings
            .iter()
            .filter_map(|r| weights.get(&r.criterion_id).map(|w| (r.rating, *w))),
    )
}

async fn insert_ratings<C: ConnectionTrait>(
    db: &C,
    review_id: i32,
    ratings: &[RatingInput],
) -> ApiResult<()> {
    let rows = ratings.iter().map(|r| review_rating::ActiveModel {
        review_id: Set(review_id),
        criterion_id: Set(r.criterion_id),
        rating: Set(r.rating),
        ..Default::default()
    });
    review_rating::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Recomputes and stores one review's integral rating from its stored ratings.
pub async fn recompute<C: ConnectionTrait>(db: &C, review_id: i32) -> ApiResult<f64> {
    let rows = review_rating::Entity::find()
        .filter(review_rating::Column::ReviewId.eq(review_id))
        .find_also_related(criterion::Entity)
        .all(db)
        .await?;
    let value = integral_rating(
        rows.iter()
            .filter_map(|(r, c)| c.as_ref().map(|c| (r.rating, c.weight))),
    );
    review::Entity::update_many()
        .col_expr(review::Column::IntegralRating, Expr::value(value))
        .filter(review::Column::Id.eq(review_id))
        .exec(db)
        .await?;
    Ok(value)
}

/// Re-scores every review holding a rating on `criterion_id`.
pub async fn recompute_for_criterion<C: ConnectionTrait>(
    db: &C,
    criterion_id: i32,
) -> ApiResult<u64> {
    let review_ids: Vec<i32> = review_rating::Entity::find()
        .select_only()
        .column(review_rating::Column::ReviewId)
        .filter(review_rating::Column::CriterionId.eq(criterion_id))
        .distinct()
        .into_tuple::<i32>()
        .all(db)
        .await?;
    for review_id in &review_ids {
        let value = recompute(db, *review_id).await?;
        debug!(review_id, integral_rating = value, "review rescored");
    }
    Ok(review_ids.len() as u64)
}

/// Deletes every review of a product with its ratings. Returns the review count.
pub async fn delete_for_product<C: ConnectionTrait>(db: &C, product_id: i32) -> ApiResult<u64> {
    let review_ids: Vec<i32> = review::Entity::find()
        .select_only()
        .column(review::Column::Id)
        .filter(review::Column::ProductId.eq(product_id))
        .into_tuple::<i32>()
        .all(db)
        .await?;
    if review_ids.is_empty() {
        return Ok(0);
    }
    review_rating::Entity::delete_many()
        .filter(review_rating::Column::ReviewId.is_in(review_ids.clone()))
        .exec(db)
        .await?;
    let result = review::Entity::delete_many()
        .filter(review::Column::Id.is_in(review_ids))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn to_dtos<C: ConnectionTrait>(
    db: &C,
    reviews: Vec<review::Model>,
) -> ApiResult<Vec<ReviewDto>> {
    if reviews.is_empty() {
        return Ok(Vec::new());
    }
    let review_ids: Vec<i32> = reviews.iter().map(|r| r.id).collect();
    let product_ids: Vec<i32> = reviews
        .iter()
        .map(|r| r.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let product_names: HashMap<i32, String> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let mut ratings: HashMap<i32, Vec<RatingDto>> = HashMap::new();
    let rows = review_rating::Entity::find()
        .filter(review_rating::Column::ReviewId.is_in(review_ids))
        .find_also_related(criterion::Entity)
        .order_by_asc(review_rating::Column::Id)
        .all(db)
        .await?;
    for (rating, criterion) in rows {
        let Some(criterion) = criterion else { continue };
        ratings.entry(rating.review_id).or_default().push(RatingDto {
            criterion_id: criterion.id,
            criterion_name: criterion.name,
            weight: criterion.weight,
            rating: rating.rating,
        });
    }
    Ok(reviews
        .into_iter()
        .map(|r| ReviewDto {
            id: r.id,
            date_created: r.date_created.with_timezone(&Utc),
            integral_rating: r.integral_rating,
            status: r.status,
            product_id: r.product_id,
            product_name: product_names.get(&r.product_id).cloned().unwrap_or_default(),
            ratings: ratings.remove(&r.id).unwrap_or_default(),
        })
        .collect())
}

async fn review_dto<C: ConnectionTrait>(db: &C, review_id: i32) -> ApiResult<ReviewDto> {
    let model = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    to_dtos(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Review"))
}

pub async fn get_review(db: &DatabaseConnection, review_id: i32) -> ApiResult<ReviewDto> {
    review_dto(db, review_id).await
}

/// Whether 1-based `page` starts inside `total` rows. Offsets that overflow are out of range.
pub(crate) fn page_in_range(page: u64, size: u64, total: u64) -> bool {
    page.checked_sub(1)
        .and_then(|p| p.checked_mul(size))
        .is_some_and(|offset| offset < total)
}

#[instrument(skip(db, query))]
pub async fn list_reviews(
    db: &DatabaseConnection,
    query: &ReviewQuery,
) -> ApiResult<Page<ReviewDto>> {
    validate_range(query.from, query.to)?;
    let page = query.page.unwrap_or(1).max(1);
    let size = query
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut select = review::Entity::find()
        .order_by_desc(review::Column::DateCreated)
        .order_by_desc(review::Column::Id);
    if let Some(product_id) = query.product_id {
        select = select.filter(review::Column::ProductId.eq(product_id));
    }
    if let Some(category_id) = query.category_id {
        select = select
            .inner_join(product::Entity)
            .filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(status) = query.status {
        select = select.filter(review::Column::Status.eq(status));
    }
    if let Some(from) = query.from {
        select = select.filter(review::Column::DateCreated.gte(start_of_day(from)));
    }
    if let Some(to) = query.to {
        select = select.filter(review::Column::DateCreated.lt(end_of_day(to)));
    }

    let paginator = select.paginate(db, size);
    let total = paginator.num_items().await?;
    let items = if page_in_range(page, size, total) {
        let models = paginator.fetch_page(page - 1).await?;
        to_dtos(db, models).await?
    } else {
        Vec::new()
    };
    Ok(Page::new(items, page, size, total))
}

#[instrument(skip_all, fields(product_id = input.product_id))]
pub async fn create_review(
    db: &DatabaseConnection,
    input: CreateReviewRequest,
) -> ApiResult<ReviewDto> {
    validate_ratings(&input.ratings)?;
    let txn = db.begin().await?;
    product::Entity::find_by_id(input.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::validation(format!("Product {} does not exist", input.product_id))
        })?;
    let weights = criterion_weights(&txn, &input.ratings).await?;
    let integral = score(&input.ratings, &weights);
    let created = review::ActiveModel {
        date_created: Set(input.date_created.unwrap_or_else(Utc::now).fixed_offset()),
        integral_rating: Set(Some(integral)),
        status: Set(Status::Active),
        product_id: Set(input.product_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_ratings(&txn, created.id, &input.ratings).await?;
    let dto = review_dto(&txn, created.id).await?;
    txn.commit().await?;
    info!(review_id = created.id, integral_rating = integral, "review created");
    Ok(dto)
}

#[instrument(skip(db, ratings))]
pub async fn replace_ratings(
    db: &DatabaseConnection,
    review_id: i32,
    ratings: Vec<RatingInput>,
) -> ApiResult<ReviewDto> {
    validate_ratings(&ratings)?;
    let txn = db.begin().await?;
    review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    criterion_weights(&txn, &ratings).await?;
    review_rating::Entity::delete_many()
        .filter(review_rating::Column::ReviewId.eq(review_id))
        .exec(&txn)
        .await?;
    insert_ratings(&txn, review_id, &ratings).await?;
    let integral = recompute(&txn, review_id).await?;
    let dto = review_dto(&txn, review_id).await?;
    txn.commit().await?;
    info!(review_id, integral_rating = integral, "review ratings replaced");
    Ok(dto)
}

#[instrument(skip(db))]
pub async fn set_status(
    db: &DatabaseConnection,
    review_id: i32,
    status: Status,
) -> ApiResult<ReviewDto> {
    let existing = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    let mut model: review::ActiveModel = existing.into();
    model.status = Set(status);
    model.update(db).await?;
    info!(review_id, status = status.as_str(), "review status changed");
    review_dto(db, review_id).await
}

#[instrument(skip(db))]
pub async fn delete_review(db: &DatabaseConnection, review_id: i32) -> ApiResult<()> {
    let txn = db.begin().await?;
    review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    review_rating::Entity::delete_many()
        .filter(review_rating::Column::ReviewId.eq(review_id))
        .exec(&txn)
        .await?;
    review::Entity::delete_by_id(review_id).exec(&txn).await?;
    txn.commit().await?;
    info!(review_id, "review deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(criterion_id: i32, rating: i32) -> RatingInput {
        RatingInput {
            criterion_id,
            rating,
        }
    }

    #[test]
    fn pages_past_the_end_are_out_of_range() {
        assert!(page_in_range(1, 20, 1));
        assert!(page_in_range(2, 20, 21));
        assert!(!page_in_range(2, 20, 20));
        assert!(!page_in_range(1, 20, 0));
        assert!(!page_in_range(0, 20, 100));
        assert!(!page_in_range(u64::MAX, MAX_PAGE_SIZE, u64::MAX));
    }

    #[test]
    fn empty_rating_list_is_rejected() {
        assert!(matches!(
            validate_ratings(&[]),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_criterion_is_rejected() {
        let err = validate_ratings(&[input(1, 4), input(2, 3), input(1, 5)]).unwrap_err();
        assert_eq!(err.to_string(), "Criterion 1 is rated more than once");
    }

    #[test]
    fn score_uses_criterion_weights() {
        let weights = HashMap::from([(1, 2.0), (2, 1.0)]);
        let value = score(&[input(1, 5), input(2, 2)], &weights);
        assert!((value - 4.0).abs() < 1e-9);
    }
}
