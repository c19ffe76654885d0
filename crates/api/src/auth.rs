use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use entity::{role, role::RoleName, user, user_role};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

pub const SESSION_COOKIE: &str = "review_session";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, session_ttl_minutes: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl_minutes,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i32,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Authenticated caller, reloaded from the database on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleName>,
}

impl CurrentUser {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.iter().any(|r| r.level() >= role.level())
    }

    pub fn require(&self, role: RoleName) -> ApiResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} role required",
                role.as_str()
            )))
        }
    }

    pub fn highest_role(&self) -> Option<RoleName> {
        self.roles.iter().copied().max_by_key(|r| r.level())
    }
}

pub fn issue_token(
    user_id: i32,
    roles: &[RoleName],
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: user_id,
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(
    token: &str,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::internal(anyhow::anyhow!("failed to hash password: {err}")))
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(text) = value.to_str() {
            if let Some(rest) = text.strip_prefix("Bearer ") {
                let token = rest.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

pub async fn load_roles<C: ConnectionTrait>(db: &C, user_id: i32) -> ApiResult<Vec<RoleName>> {
    let rows = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .find_also_related(role::Entity)
        .all(db)
        .await?;
    let mut roles: Vec<RoleName> = rows
        .into_iter()
        .filter_map(|(_, role)| role.map(|r| r.name))
        .collect();
    roles.sort();
    roles.dedup();
    Ok(roles)
}

/// Returns `None` for unknown or deactivated users.
pub async fn load_current_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> ApiResult<Option<CurrentUser>> {
    let Some(account) = user::Entity::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };
    if !account.active {
        return Ok(None);
    }
    let roles = load_roles(db, user_id).await?;
    Ok(Some(CurrentUser {
        user_id,
        name: account.name,
        email: account.email,
        roles,
    }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthenticated("missing credentials"))?;
        let claims = decode_token(&token, &state.auth)
            .map_err(|_| ApiError::unauthenticated("invalid or expired token"))?;
        load_current_user(state.db.as_ref(), claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthenticated("account unavailable"))
    }
}
