use anyhow::anyhow;
use chrono::TimeZone;
use mongodb::bson::DateTime;
use mongodb::error::Result as MongoResult;

use super::{RepositoryError, Result as RepoResult};
use crate::entities::Date;

pub fn convert_repo_err<T, E>(result: Result<T, E>) -> RepoResult<T>
where E: Sync + Send + ::std::error::Error + 'static {
    result.map_err(|e| RepositoryError::Internal(anyhow!(e)))
}

/// `Ok(false)` on a duplicate key, the store's way of saying "already there".
pub fn try_unique_check<T>(result: MongoResult<T>) -> RepoResult<bool> {
    match match match result {
        Ok(_) => return Ok(true),
        Err(e) => (*e.kind.clone(), e),
    } {
        (
            ::mongodb::error::ErrorKind::Write(::mongodb::error::WriteFailure::WriteError(e)),
            src,
        ) => (e.code, src),
        (_, src) => return Err(RepositoryError::Internal(anyhow!(src))),
    } {
        (11000, _) => Ok(false),
        (_, src) => Err(RepositoryError::Internal(anyhow!(src))),
    }
}

pub fn convert_404_or<T>(option: Option<T>) -> RepoResult<T> {
    match option {
        Some(t) => Ok(t),
        None => Err(RepositoryError::NotFound),
    }
}

pub fn to_bson_date(date: Date) -> DateTime { DateTime::from_millis(date.timestamp_millis()) }

pub fn from_bson_date(date: DateTime) -> RepoResult<Date> {
    chrono::Utc
        .timestamp_millis_opt(date.timestamp_millis())
        .single()
        .ok_or_else(|| RepositoryError::Internal(anyhow!("timestamp out of range: {}", date)))
}

pub fn parse_id<T>(raw: &str) -> RepoResult<T>
where
    T: ::core::str::FromStr,
    T::Err: Sync + Send + ::std::error::Error + 'static,
{
    convert_repo_err(raw.parse())
}
