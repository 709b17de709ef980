use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;

use super::live::{LiveView, ViewState};
use crate::entities::{Post, UserId};
use crate::repositories::{RepositoryError, UserRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCard {
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// One point read per distinct comment author in `posts`.
///
/// Missing users and failed reads are left out; renderers fall back to the
/// fields stored on the comment itself.
pub async fn fetch_authors(
    users: &Arc<dyn UserRepository + Sync + Send>,
    posts: &[Post],
) -> HashMap<UserId, AuthorCard> {
    let ids: HashSet<&UserId> = posts
        .iter()
        .flat_map(|p| p.comments.iter().map(|c| &c.uid))
        .collect();

    let reads = ids.into_iter().map(|id| async move { (id, users.find(id).await) });

    join_all(reads)
        .await
        .into_iter()
        .filter_map(|(id, res)| match res {
            Ok(u) => {
                let display_name = match u.display_name.is_empty() {
                    true => "Anonymous".to_string(),
                    false => u.display_name,
                };
                Some((id.clone(), AuthorCard {
                    display_name,
                    photo_url: u.photo_url,
                }))
            },
            Err(RepositoryError::NotFound) => None,
            Err(e) => {
                tracing::error!("cannot fetch author `{}`: {}", id, e);
                None
            },
        })
        .collect()
}

/// A feed snapshot together with the authors fetched for it.
#[derive(Debug, Clone)]
pub struct Enriched {
    pub state: ViewState<Post>,
    pub authors: HashMap<UserId, AuthorCard>,
}

async fn enrich(
    state: ViewState<Post>,
    users: &Arc<dyn UserRepository + Sync + Send>,
) -> Enriched {
    let authors = fetch_authors(users, &state.items).await;

    Enriched { state, authors }
}

/// The first snapshot of `view`, enriched.
pub async fn settled_enriched(
    view: &mut LiveView<Post>,
    users: &Arc<dyn UserRepository + Sync + Send>,
) -> Enriched {
    let state = view.settled().await;
    enrich(state, users).await
}

/// Waits for the next snapshot of `view` and enriches it. `None` once the view is finished.
pub async fn next_enriched(
    view: &mut LiveView<Post>,
    users: &Arc<dyn UserRepository + Sync + Send>,
) -> Option<Enriched> {
    if !view.changed().await {
        return None;
    }

    let state = view.state().await;
    Some(enrich(state, users).await)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::entities::{Comment, PostId, User};
    use crate::repositories::mock::InMemoryRepository;
    use crate::repositories::{PostQuery, PostRepository};
    use crate::sync::ErrorPolicy;

    fn user(uid: &str, name: &str) -> User {
        User {
            uid: uid.into(),
            display_name: name.into(),
            email: None,
            photo_url: Some(format!("https://img/{}", uid)),
            bio: None,
            followers: HashSet::new(),
            following: HashSet::new(),
            badge: None,
            user_badge: None,
            created_at: Utc::now(),
        }
    }

    fn comment(uid: &str) -> Comment {
        Comment {
            uid: uid.into(),
            display_name: "stale".into(),
            photo_url: None,
            content: "hi".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn one_card_per_known_author() {
        let repo = InMemoryRepository::<User>::new();
        repo.insert(user("u1", "Alice")).await.unwrap();
        repo.insert(user("u2", "")).await.unwrap();
        let users: Arc<dyn UserRepository + Sync + Send> = Arc::new(repo);

        let post = Post {
            id: PostId::new(),
            uid: "u1".into(),
            display_name: "Alice".into(),
            photo_url: None,
            content: "post".into(),
            image_url: None,
            badge: "New Post".into(),
            user_badge: "New User".into(),
            likes: HashSet::new(),
            comments: vec![comment("u1"), comment("u2"), comment("u1"), comment("ghost")],
            created_at: Utc::now(),
        };

        let cards = fetch_authors(&users, &[post]).await;

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[&UserId::from("u1")].display_name, "Alice");
        assert_eq!(cards[&UserId::from("u2")].display_name, "Anonymous");
        assert!(!cards.contains_key(&UserId::from("ghost")));
    }

    #[tokio::test]
    async fn every_snapshot_gets_its_own_authors() {
        let repo = InMemoryRepository::<User>::new();
        repo.insert(user("u1", "Alice")).await.unwrap();
        let users: Arc<dyn UserRepository + Sync + Send> = Arc::new(repo);

        let posts = InMemoryRepository::<Post>::new();
        let post = Post {
            id: PostId::new(),
            uid: "u2".into(),
            display_name: "Bob".into(),
            photo_url: None,
            content: "post".into(),
            image_url: None,
            badge: "New Post".into(),
            user_badge: "New User".into(),
            likes: HashSet::new(),
            comments: vec![],
            created_at: Utc::now(),
        };
        posts.insert(post.clone()).await.unwrap();

        let sub = posts.subscribe(PostQuery::default()).await.unwrap();
        let mut view = LiveView::spawn(sub, ErrorPolicy::Silent);

        let first = settled_enriched(&mut view, &users).await;
        assert_eq!(first.state.items.len(), 1);
        assert!(first.authors.is_empty());

        posts.push_comment(post.id, comment("u1")).await.unwrap();

        let enriched = loop {
            let e = next_enriched(&mut view, &users).await.unwrap();
            if !e.state.items[0].comments.is_empty() {
                break e;
            }
        };
        assert_eq!(enriched.authors[&UserId::from("u1")].display_name, "Alice");
    }
}
