use std::collections::HashMap;

use entity::{role, role::RoleName, user, user_role};
use sea_orm::{
    sea_query::{Expr, Func, OnConflict},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, info_span, Instrument};

use super::{
    contains_pattern, normalize_email, required_text, MAX_NAME_LEN, MIN_PASSWORD_LEN,
};
use crate::{
    auth::{self, issue_token, AuthConfig, CurrentUser},
    dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto},
    error::{ApiError, ApiResult},
};

/// Seeds the static role rows. Safe to run on every startup.
pub async fn ensure_roles<C: ConnectionTrait>(db: &C) -> ApiResult<()> {
    let rows: Vec<role::ActiveModel> = [RoleName::Analyst, RoleName::Admin]
        .into_iter()
        .map(|name| role::ActiveModel {
            name: Set(name),
            ..Default::default()
        })
        .collect();
    role::Entity::insert_many(rows)
        .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn role_ids<C: ConnectionTrait>(db: &C) -> ApiResult<HashMap<RoleName, i32>> {
    let rows = role::Entity::find().all(db).await?;
    Ok(rows.into_iter().map(|r| (r.name, r.id)).collect())
}

async fn insert_roles<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    roles: &[RoleName],
) -> ApiResult<()> {
    let ids = role_ids(db).await?;
    let rows = roles
        .iter()
        .map(|name| {
            ids.get(name)
                .map(|role_id| user_role::ActiveModel {
                    user_id: Set(user_id),
                    role_id: Set(*role_id),
                })
                .ok_or_else(|| {
                    ApiError::internal(anyhow::anyhow!("role {} is not seeded", name.as_str()))
                })
        })
        .collect::<ApiResult<Vec<_>>>()?;
    if rows.is_empty() {
        return Ok(());
    }
    user_role::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub(crate) fn parse_roles(values: &[String]) -> ApiResult<Vec<RoleName>> {
    let mut roles = Vec::new();
    for value in values {
        let role = RoleName::parse(value)
            .ok_or_else(|| ApiError::validation(format!("Unknown role {}", value)))?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        return Err(ApiError::validation("At least one role is required"));
    }
    roles.sort();
    Ok(roles)
}

fn to_dto(model: user::Model, roles: Vec<RoleName>) -> UserDto {
    UserDto {
        id: model.id,
        name: model.name,
        email: model.email,
        active: model.active,
        roles,
    }
}

async fn user_with_roles<C: ConnectionTrait>(db: &C, user_id: i32) -> ApiResult<UserDto> {
    let model = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let roles = auth::load_roles(db, user_id).await?;
    Ok(to_dto(model, roles))
}

/// Inserts an active user holding `roles`. The caller supplies the transaction.
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    name: &str,
    email: &str,
    password: &str,
    roles: &[RoleName],
) -> ApiResult<user::Model> {
    let name = required_text("name", name, MAX_NAME_LEN)?;
    let email = normalize_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(db)
        .await?
        .is_some();
    if taken {
        return Err(ApiError::conflict("Email already registered"));
    }
    let created = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        password_hash: Set(auth::hash_password(password)?),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    insert_roles(db, created.id, roles).await?;
    Ok(created)
}

pub async fn register(
    db: &DatabaseConnection,
    config: &AuthConfig,
    input: RegisterRequest,
) -> ApiResult<AuthResponse> {
    let span = info_span!("users.register");
    async move {
        let txn = db.begin().await?;
        let created = create_user(
            &txn,
            &input.name,
            &input.email,
            &input.password,
            &[RoleName::Analyst],
        )
        .await?;
        txn.commit().await?;
        info!(user_id = created.id, "user registered");
        let user = to_dto(created, vec![RoleName::Analyst]);
        let token = issue_token(user.id, &user.roles, config).map_err(ApiError::internal)?;
        Ok(AuthResponse { token, user })
    }
    .instrument(span)
    .await
}

pub async fn login(
    db: &DatabaseConnection,
    config: &AuthConfig,
    input: LoginRequest,
) -> ApiResult<AuthResponse> {
    let email = input.email.trim().to_lowercase();
    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    let Some(account) = account else {
        return Err(ApiError::unauthenticated("Invalid credentials"));
    };
    if !auth::verify_password(&account.password_hash, &input.password) {
        return Err(ApiError::unauthenticated("Invalid credentials"));
    }
    if !account.active {
        return Err(ApiError::forbidden("Account disabled"));
    }
    let roles = auth::load_roles(db, account.id).await?;
    let token = issue_token(account.id, &roles, config).map_err(ApiError::internal)?;
    info!(user_id = account.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: to_dto(account, roles),
    })
}

pub async fn me(db: &DatabaseConnection, current: &CurrentUser) -> ApiResult<UserDto> {
    user_with_roles(db, current.user_id).await
}

pub async fn list_users(db: &DatabaseConnection, q: Option<&str>) -> ApiResult<Vec<UserDto>> {
    let mut select = user::Entity::find().order_by_asc(user::Column::Name);
    if let Some(term) = q.map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                        .like(contains_pattern(term)),
                )
                .add(Expr::col(user::Column::Email).like(contains_pattern(term))),
        );
    }
    let users = select.all(db).await?;
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let mut roles_by_user: HashMap<i32, Vec<RoleName>> = HashMap::new();
    if !ids.is_empty() {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::UserId.is_in(ids))
            .find_also_related(role::Entity)
            .all(db)
            .await?;
        for (link, role) in rows {
            if let Some(role) = role {
                roles_by_user.entry(link.user_id).or_default().push(role.name);
            }
        }
    }
    Ok(users
        .into_iter()
        .map(|u| {
            let mut roles = roles_by_user.remove(&u.id).unwrap_or_default();
            roles.sort();
            to_dto(u, roles)
        })
        .collect())
}

pub async fn get_user(db: &DatabaseConnection, user_id: i32) -> ApiResult<UserDto> {
    user_with_roles(db, user_id).await
}

pub async fn replace_roles(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    user_id: i32,
    values: &[String],
) -> ApiResult<UserDto> {
    let roles = parse_roles(values)?;
    if actor.user_id == user_id && !roles.contains(&RoleName::Admin) {
        return Err(ApiError::validation("You cannot remove your own admin role"));
    }
    let txn = db.begin().await?;
    user::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    insert_roles(&txn, user_id, &roles).await?;
    let dto = user_with_roles(&txn, user_id).await?;
    txn.commit().await?;
    info!(user_id, roles = ?roles, "user roles replaced");
    Ok(dto)
}

pub async fn set_active(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    user_id: i32,
    active: bool,
) -> ApiResult<UserDto> {
    if actor.user_id == user_id && !active {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }
    let existing = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let mut model: user::ActiveModel = existing.into();
    model.active = Set(active);
    model.update(db).await?;
    info!(user_id, active, "user status changed");
    user_with_roles(db, user_id).await
}

/// Creates the configured admin account when no user owns that email yet.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> ApiResult<bool> {
    let normalized = normalize_email(email)?;
    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(normalized))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }
    let txn = db.begin().await?;
    let created = create_user(&txn, name, email, password, &[RoleName::Admin]).await?;
    txn.commit().await?;
    info!(user_id = created.id, "bootstrap admin created");
    Ok(true)
}
