//! Categories, products and criteria.

use std::collections::{BTreeSet, HashMap};

use entity::{category, criterion, criterion_category, product, review_rating};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::{info, instrument};

use super::{
    contains_pattern, optional_text, required_text, reviews, validate_length, MAX_NAME_LEN,
};
use crate::{
    dto::{
        CategoryDto, CategoryRequest, CriterionDto, CriterionRequest, ProductDto, ProductQuery,
        ProductRequest,
    },
    error::{ApiError, ApiResult},
    rating::is_valid_weight,
};

const MAX_BRAND_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 4000;

fn category_dto(model: category::Model) -> CategoryDto {
    CategoryDto {
        id: model.id,
        name: model.name,
    }
}

pub async fn list_categories(db: &DatabaseConnection) -> ApiResult<Vec<CategoryDto>> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(category_dto).collect())
}

pub async fn get_category(db: &DatabaseConnection, id: i32) -> ApiResult<CategoryDto> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(category_dto)
        .ok_or_else(|| ApiError::not_found("Category"))
}

async fn ensure_category_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except: Option<i32>,
) -> ApiResult<()> {
    let mut select = category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(id) = except {
        select = select.filter(category::Column::Id.ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(ApiError::conflict(format!("Category {} already exists", name)));
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_category(
    db: &DatabaseConnection,
    input: CategoryRequest,
) -> ApiResult<CategoryDto> {
    let name = required_text("name", &input.name, MAX_NAME_LEN)?;
    ensure_category_name_free(db, &name, None).await?;
    let created = category::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(category_id = created.id, "category created");
    Ok(category_dto(created))
}

#[instrument(skip(db, input))]
pub async fn update_category(
    db: &DatabaseConnection,
    id: i32,
    input: CategoryRequest,
) -> ApiResult<CategoryDto> {
    let name = required_text("name", &input.name, MAX_NAME_LEN)?;
    let existing = category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;
    ensure_category_name_free(db, &name, Some(id)).await?;
    let mut model: category::ActiveModel = existing.into();
    model.name = Set(name);
    Ok(category_dto(model.update(db).await?))
}

#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, id: i32) -> ApiResult<()> {
    let txn = db.begin().await?;
    category::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;
    let products = product::Entity::find()
        .filter(product::Column::CategoryId.eq(id))
        .count(&txn)
        .await?;
    if products > 0 {
        return Err(ApiError::conflict(format!(
            "Category is used by {} product(s)",
            products
        )));
    }
    criterion_category::Entity::delete_many()
        .filter(criterion_category::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    category::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(category_id = id, "category deleted");
    Ok(())
}

fn product_dto(model: product::Model, category: Option<category::Model>) -> ProductDto {
    ProductDto {
        id: model.id,
        name: model.name,
        brand: model.brand,
        description: model.description,
        category_id: model.category_id,
        category_name: category.map(|c| c.name),
    }
}

pub async fn list_products(
    db: &DatabaseConnection,
    query: &ProductQuery,
) -> ApiResult<Vec<ProductDto>> {
    let mut select = product::Entity::find().order_by_asc(product::Column::Name);
    if let Some(category_id) = query.category_id {
        select = select.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(term) = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((product::Entity, product::Column::Name))))
                        .like(contains_pattern(term)),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((product::Entity, product::Column::Brand))))
                        .like(contains_pattern(term)),
                ),
        );
    }
    let rows = select.find_also_related(category::Entity).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(p, c)| product_dto(p, c))
        .collect())
}

pub async fn get_product(db: &DatabaseConnection, id: i32) -> ApiResult<ProductDto> {
    let (model, category) = product::Entity::find_by_id(id)
        .find_also_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(product_dto(model, category))
}

struct ProductFields {
    name: String,
    brand: String,
    description: Option<String>,
    category: category::Model,
}

async fn validate_product<C: ConnectionTrait>(
    db: &C,
    input: ProductRequest,
) -> ApiResult<ProductFields> {
    let name = required_text("name", &input.name, MAX_NAME_LEN)?;
    let brand = required_text("brand", &input.brand, MAX_BRAND_LEN)?;
    let description = optional_text(input.description);
    if let Some(text) = &description {
        validate_length("description", text, MAX_DESCRIPTION_LEN)?;
    }
    let category = category::Entity::find_by_id(input.category_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::validation(format!("Category {} does not exist", input.category_id))
        })?;
    Ok(ProductFields {
        name,
        brand,
        description,
        category,
    })
}

#[instrument(skip_all)]
pub async fn create_product(
    db: &DatabaseConnection,
    input: ProductRequest,
) -> ApiResult<ProductDto> {
    let fields = validate_product(db, input).await?;
    let created = product::ActiveModel {
        name: Set(fields.name),
        brand: Set(fields.brand),
        description: Set(fields.description),
        category_id: Set(fields.category.id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(product_id = created.id, "product created");
    Ok(product_dto(created, Some(fields.category)))
}

#[instrument(skip(db, input))]
pub async fn update_product(
    db: &DatabaseConnection,
    id: i32,
    input: ProductRequest,
) -> ApiResult<ProductDto> {
    let existing = product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    let fields = validate_product(db, input).await?;
    let mut model: product::ActiveModel = existing.into();
    model.name = Set(fields.name);
    model.brand = Set(fields.brand);
    model.description = Set(fields.description);
    model.category_id = Set(fields.category.id);
    let updated = model.update(db).await?;
    Ok(product_dto(updated, Some(fields.category)))
}

/// Removes the product together with its reviews and their ratings.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, id: i32) -> ApiResult<()> {
    let txn = db.begin().await?;
    product::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    let removed = reviews::delete_for_product(&txn, id).await?;
    product::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(product_id = id, reviews_removed = removed, "product deleted");
    Ok(())
}

async fn category_ids_for<C: ConnectionTrait>(
    db: &C,
    criterion_ids: &[i32],
) -> ApiResult<HashMap<i32, Vec<i32>>> {
    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    if criterion_ids.is_empty() {
        return Ok(map);
    }
    let links = criterion_category::Entity::find()
        .filter(criterion_category::Column::CriterionId.is_in(criterion_ids.to_vec()))
        .order_by_asc(criterion_category::Column::CategoryId)
        .all(db)
        .await?;
    for link in links {
        map.entry(link.criterion_id).or_default().push(link.category_id);
    }
    Ok(map)
}

fn criterion_dto(model: criterion::Model, category_ids: Vec<i32>) -> CriterionDto {
    CriterionDto {
        id: model.id,
        name: model.name,
        weight: model.weight,
        category_ids,
    }
}

pub async fn list_criteria(
    db: &DatabaseConnection,
    category_id: Option<i32>,
) -> ApiResult<Vec<CriterionDto>> {
    let mut select = criterion::Entity::find().order_by_asc(criterion::Column::Name);
    if let Some(category_id) = category_id {
        select = select
            .inner_join(criterion_category::Entity)
            .filter(criterion_category::Column::CategoryId.eq(category_id));
    }
    let rows = select.all(db).await?;
    let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
    let mut links = category_ids_for(db, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|c| {
            let categories = links.remove(&c.id).unwrap_or_default();
            criterion_dto(c, categories)
        })
        .collect())
}

async fn criterion_with_links<C: ConnectionTrait>(db: &C, id: i32) -> ApiResult<CriterionDto> {
    let model = criterion::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Criterion"))?;
    let mut links = category_ids_for(db, &[id]).await?;
    Ok(criterion_dto(model, links.remove(&id).unwrap_or_default()))
}

pub async fn get_criterion(db: &DatabaseConnection, id: i32) -> ApiResult<CriterionDto> {
    criterion_with_links(db, id).await
}

struct CriterionFields {
    name: String,
    weight: f64,
    category_ids: Vec<i32>,
}

async fn validate_criterion<C: ConnectionTrait>(
    db: &C,
    input: CriterionRequest,
    except: Option<i32>,
) -> ApiResult<CriterionFields> {
    let name = required_text("name", &input.name, MAX_NAME_LEN)?;
    if !is_valid_weight(input.weight) {
        return Err(ApiError::validation("weight must be a positive number"));
    }
    let category_ids: Vec<i32> = input
        .category_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !category_ids.is_empty() {
        let found = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids.clone()))
            .count(db)
            .await?;
        if found != category_ids.len() as u64 {
            return Err(ApiError::validation("One or more categories do not exist"));
        }
    }
    let mut clash = criterion::Entity::find().filter(criterion::Column::Name.eq(name.clone()));
    if let Some(id) = except {
        clash = clash.filter(criterion::Column::Id.ne(id));
    }
    if clash.one(db).await?.is_some() {
        return Err(ApiError::conflict(format!("Criterion {} already exists", name)));
    }
    Ok(CriterionFields {
        name,
        weight: input.weight,
        category_ids,
    })
}

async fn link_categories<C: ConnectionTrait>(
    db: &C,
    criterion_id: i32,
    category_ids: &[i32],
) -> ApiResult<()> {
    criterion_category::Entity::delete_many()
        .filter(criterion_category::Column::CriterionId.eq(criterion_id))
        .exec(db)
        .await?;
    if category_ids.is_empty() {
        return Ok(());
    }
    let rows = category_ids.iter().map(|category_id| criterion_category::ActiveModel {
        criterion_id: Set(criterion_id),
        category_id: Set(*category_id),
    });
    criterion_category::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_criterion(
    db: &DatabaseConnection,
    input: CriterionRequest,
) -> ApiResult<CriterionDto> {
    let txn = db.begin().await?;
    let fields = validate_criterion(&txn, input, None).await?;
    let created = criterion::ActiveModel {
        name: Set(fields.name),
        weight: Set(fields.weight),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    link_categories(&txn, created.id, &fields.category_ids).await?;
    txn.commit().await?;
    info!(criterion_id = created.id, "criterion created");
    Ok(criterion_dto(created, fields.category_ids))
}

/// Updates a criterion. A weight change re-scores every review rated on it.
#[instrument(skip(db, input))]
pub async fn update_criterion(
    db: &DatabaseConnection,
    id: i32,
    input: CriterionRequest,
) -> ApiResult<CriterionDto> {
    let txn = db.begin().await?;
    let existing = criterion::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Criterion"))?;
    let fields = validate_criterion(&txn, input, Some(id)).await?;
    let weight_changed = existing.weight != fields.weight;
    let mut model: criterion::ActiveModel = existing.into();
    model.name = Set(fields.name);
    model.weight = Set(fields.weight);
    let updated = model.update(&txn).await?;
    link_categories(&txn, id, &fields.category_ids).await?;
    if weight_changed {
        let rescored = reviews::recompute_for_criterion(&txn, id).await?;
        info!(criterion_id = id, rescored, "criterion weight changed");
    }
    txn.commit().await?;
    Ok(criterion_dto(updated, fields.category_ids))
}

#[instrument(skip(db))]
pub async fn delete_criterion(db: &DatabaseConnection, id: i32) -> ApiResult<()> {
    let txn = db.begin().await?;
    criterion::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Criterion"))?;
    let used = review_rating::Entity::find()
        .filter(review_rating::Column::CriterionId.eq(id))
        .count(&txn)
        .await?;
    if used > 0 {
        return Err(ApiError::conflict(format!(
            "Criterion is used by {} rating(s)",
            used
        )));
    }
    criterion_category::Entity::delete_many()
        .filter(criterion_category::Column::CriterionId.eq(id))
        .exec(&txn)
        .await?;
    criterion::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(criterion_id = id, "criterion deleted");
    Ok(())
}
