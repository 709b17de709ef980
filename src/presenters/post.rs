use std::collections::HashMap;

use super::{or_dash, Response};
use crate::entities::{Date, Post, UserId};
use crate::sync::AuthorCard;
use crate::utils::date_to_string;

pub fn resp_from_post(
    post: Post,
    authors: &HashMap<UserId, AuthorCard>,
    viewer: Option<&UserId>,
    now: &Date,
) -> Response {
    let Post {
        id,
        uid,
        display_name,
        content,
        image_url,
        badge,
        user_badge,
        likes,
        comments,
        created_at,
        ..
    } = post;

    let author = match display_name.is_empty() {
        true => "Anonymous".to_string(),
        false => display_name,
    };
    let liked = match viewer.map(|v| likes.contains(v)) {
        Some(true) => format!("{} (you)", likes.len()),
        _ => likes.len().to_string(),
    };

    let head = Response::notice(
        format!("{} [{}] [{}]", author, user_badge, badge),
        content,
    )
    .field("id:", id)
    .field("author id:", uid)
    .field("posted:", date_to_string(Some(&created_at), now))
    .field("image:", or_dash(image_url.as_deref()))
    .field("likes:", liked)
    .field("comments:", comments.len());

    comments.into_iter().fold(head, |r, c| {
        // fresh profile data when it was fetched, the stored copy otherwise
        let name = match authors.get(&c.uid) {
            Some(card) => card.display_name.clone(),
            None if c.display_name.is_empty() => "Anonymous".to_string(),
            None => c.display_name,
        };

        r.field(
            format!("> {} ({}):", name, date_to_string(Some(&c.created_at), now)),
            c.content,
        )
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entities::{Comment, PostId};

    #[test]
    fn comment_names_prefer_fetched_profiles() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap();
        let comment = |uid: &str, name: &str| Comment {
            uid: uid.into(),
            display_name: name.into(),
            photo_url: None,
            content: "nice".into(),
            created_at: at,
        };
        let post = Post {
            id: PostId::new(),
            uid: "u2".into(),
            display_name: "Bob".into(),
            photo_url: None,
            content: "hello".into(),
            image_url: None,
            badge: "New Post".into(),
            user_badge: "New User".into(),
            likes: [UserId::from("u1")].into_iter().collect::<HashSet<_>>(),
            comments: vec![comment("u1", "old name"), comment("u3", "")],
            created_at: at,
        };
        let mut authors = HashMap::new();
        authors.insert(UserId::from("u1"), AuthorCard {
            display_name: "Alice".into(),
            photo_url: None,
        });

        let r = resp_from_post(post, &authors, Some(&"u1".into()), &now);

        assert_eq!(r.title, "Bob [New User] [New Post]");
        assert!(r.fields.contains(&("likes:".into(), "1 (you)".into())));
        assert!(r.fields.contains(&("> Alice (09:30):".into(), "nice".into())));
        assert!(r.fields.contains(&("> Anonymous (09:30):".into(), "nice".into())));
    }
}
