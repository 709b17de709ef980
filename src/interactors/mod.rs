pub mod group;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;

use crate::auth::Principal;
use crate::errors::{AppError, Result};
use crate::repositories::RepositoryError;

fn read_err(what: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(what),
        e => AppError::Read(e),
    }
}

fn write_err(what: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(what),
        e => AppError::Write(e),
    }
}

/// Trimmed `text`, or a validation error carrying `empty` when nothing is left.
fn non_empty<'a>(text: &'a str, empty: &str) -> Result<&'a str> {
    match text.trim() {
        "" => Err(AppError::Validation(empty.to_string())),
        t => Ok(t),
    }
}

fn name_or(p: &Principal, fallback: &str) -> String {
    match p.display_name.as_deref() {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => fallback.to_string(),
    }
}

fn case_insensitive(search: Option<&str>) -> Result<Option<::regex::Regex>> {
    let search = match search.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };

    // inline flag, so the pattern text carries it to the hosted store too
    ::regex::Regex::new(&format!("(?i){}", ::regex::escape(search)))
        .map(Some)
        .map_err(|e| AppError::Validation(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::auth::Principal;
    use crate::entities::User;
    use crate::repositories::{Repositories, UserRepository};
    use crate::storage::InMemoryObjectStorage;

    pub fn repos() -> Repositories { Repositories::in_memory() }

    pub fn storage() -> Arc<InMemoryObjectStorage> { Arc::new(InMemoryObjectStorage::new()) }

    pub async fn seed_user(repos: &Repositories, uid: &str, name: &str) -> Principal {
        let user = User {
            uid: uid.into(),
            display_name: name.into(),
            email: None,
            photo_url: None,
            bio: None,
            followers: HashSet::new(),
            following: HashSet::new(),
            badge: None,
            user_badge: None,
            created_at: Utc::now(),
        };
        repos.users.insert(user).await.unwrap();

        Principal::named(uid, name)
    }
}
