use core::fmt::Display;

use super::{or_dash, Response};
use crate::entities::User;
use crate::utils::joined_to_string;

pub fn resp_from_user(
    title: impl Display,
    User {
        uid,
        display_name,
        email,
        bio,
        followers,
        following,
        badge,
        user_badge,
        created_at,
        ..
    }: User,
) -> Response {
    let name = match display_name.is_empty() {
        true => "Anonymous".to_string(),
        false => display_name,
    };

    Response::notice(title, name)
        .field("id:", uid)
        .field("email:", or_dash(email.as_deref()))
        .field("bio:", or_dash(bio.as_deref()))
        .field("badge:", or_dash(badge.as_deref()))
        .field("user badge:", or_dash(user_badge.as_deref()))
        .field("followers:", followers.len())
        .field("following:", following.len())
        .field("joined:", joined_to_string(Some(&created_at)))
}

/// One line per user, for pickers and search results.
pub fn resp_from_users(title: impl Display, users: Vec<User>) -> Response {
    let description = match users.len() {
        0 => "no one here yet".to_string(),
        n => format!("{} found", n),
    };

    users
        .into_iter()
        .fold(Response::notice(title, description), |r, u| {
            let name = match u.display_name.is_empty() {
                true => "Anonymous".to_string(),
                false => u.display_name,
            };
            r.field(format!("{}:", u.uid), format!("{} ({} followers)", name, u.followers.len()))
        })
}
