//! Database-facing operations. Handlers stay thin and call into these.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use sea_orm::sea_query::LikeExpr;

use crate::error::{ApiError, ApiResult};

pub mod analytics;
pub mod catalog;
pub mod reviews;
pub mod users;

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_EMAIL_LEN: usize = 320;
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn normalize_email(value: &str) -> ApiResult<String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }
    validate_length("email", &trimmed, MAX_EMAIL_LEN)?;
    Ok(trimmed)
}

/// Trims and rejects blank or overlong values.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    validate_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

pub(crate) fn validate_length(field: &str, value: &str, max: usize) -> ApiResult<()> {
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const LIKE_ESCAPE: char = '\\';

/// Case-folded `%term%` match where `%`, `_` and the escape character in `term` are literals.
pub(crate) fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(&term.to_lowercase()))).escape(LIKE_ESCAPE)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
        .fixed_offset()
}

/// Exclusive upper bound covering the whole of `date`.
pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<FixedOffset> {
    let next = date.succ_opt().unwrap_or(date);
    start_of_day(next)
}

pub(crate) fn validate_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ApiResult<()> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }
    }
    Ok(())
}
