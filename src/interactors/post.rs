use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::notification::Notifier;
use super::{name_or, non_empty, read_err, write_err};
use crate::entities::{Comment, NotificationKind, Post, PostId};
use crate::errors::{AppError, Result};
use crate::repositories::{PostQuery, PostRepository, RepositoryError, UserRepository};
use crate::storage::{check_image, ObjectStorage};
use crate::sync::{ErrorPolicy, LiveView};
use crate::usecases::post::{comment, create, feed, get, like, ImageUpload};
use crate::utils::{AlsoChain, LetChain};

const DEFAULT_POST_BADGE: &str = "New Post";
const DEFAULT_USER_BADGE: &str = "New User";

pub struct PostCreateInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub storage: Arc<dyn ObjectStorage + Sync + Send>,
}

impl PostCreateInteractor {
    async fn upload(&self, owner: &str, image: ImageUpload) -> Result<String> {
        check_image(&image.mime, image.bytes.len())?;

        let key = format!("posts/{}/{}", owner, Uuid::new_v4());
        self.storage
            .upload(&key, image.bytes, &image.mime)
            .await
            .map_err(AppError::Storage)?;

        self.storage
            .download_url(&key)
            .await
            .map_err(AppError::Storage)
    }
}

#[async_trait]
impl create::Usecase for PostCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create::Input) -> Result<create::Output> {
        tracing::trace!("input - {:?}", data);

        let create::Input {
            actor,
            content,
            image,
        } = data;

        non_empty(&content, "Post cannot be empty")?;

        let (badge, user_badge) = match self.user_repository.find(&actor.uid).await {
            Ok(profile) => (profile.badge, profile.user_badge),
            Err(RepositoryError::NotFound) => (None, None),
            Err(e) => return Err(AppError::Read(e)),
        };

        let image_url = match image {
            Some(image) => Some(self.upload(&actor.uid.0, image).await?),
            None => None,
        };

        let post = Post {
            id: PostId::new(),
            uid: actor.uid.clone(),
            display_name: name_or(&actor, "Anonymous"),
            photo_url: actor.photo_url.clone(),
            content,
            image_url,
            badge: badge.unwrap_or_else(|| DEFAULT_POST_BADGE.to_string()),
            user_badge: user_badge.unwrap_or_else(|| DEFAULT_USER_BADGE.to_string()),
            likes: Default::default(),
            comments: vec![],
            created_at: Utc::now(),
        };

        self.post_repository
            .insert(post.clone())
            .await
            .map_err(write_err("post"))?;

        create::Output { post }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct PostGetInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
}
#[async_trait]
impl get::Usecase for PostGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { post_id } = data;

        self.post_repository
            .find(post_id)
            .await
            .map_err(read_err("post"))?
            .let_(|post| get::Output { post })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct PostFeedInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
}
#[async_trait]
impl feed::Usecase for PostFeedInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: feed::Input) -> Result<feed::Output> {
        tracing::trace!("input - {:?}", data);

        self.post_repository
            .subscribe(PostQuery::default())
            .await
            .map_err(|e| AppError::Subscription(e.to_string()))?
            .let_(|sub| LiveView::spawn(sub, ErrorPolicy::Silent))
            .let_(|view| feed::Output { view })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct PostLikeInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub notifier: Notifier,
}
#[async_trait]
impl like::Usecase for PostLikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: like::Input) -> Result<like::Output> {
        tracing::trace!("input - {:?}", data);

        let like::Input { actor, post_id } = data;

        let post = self
            .post_repository
            .find(post_id)
            .await
            .map_err(read_err("post"))?;

        let liked = !post.likes.contains(&actor.uid);
        match liked {
            true => {
                self.post_repository
                    .insert_liked(post_id, &actor.uid)
                    .await
                    .map_err(write_err("post"))?;

                self.notifier
                    .notify(&actor, &post.uid, NotificationKind::Like, Some(post_id), None)
                    .await;
            },
            false => {
                self.post_repository
                    .delete_liked(post_id, &actor.uid)
                    .await
                    .map_err(write_err("post"))?;
            },
        }

        like::Output { post_id, liked }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct PostCommentInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub notifier: Notifier,
}
#[async_trait]
impl comment::Usecase for PostCommentInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: comment::Input) -> Result<comment::Output> {
        tracing::trace!("input - {:?}", data);

        let comment::Input {
            actor,
            post_id,
            text,
        } = data;

        let text = non_empty(&text, "Comment cannot be empty")?.to_string();

        let post = self
            .post_repository
            .find(post_id)
            .await
            .map_err(read_err("post"))?;

        let comment = Comment {
            uid: actor.uid.clone(),
            display_name: name_or(&actor, "Anonymous"),
            photo_url: actor.photo_url.clone(),
            content: text.clone(),
            created_at: Utc::now(),
        };

        self.post_repository
            .push_comment(post_id, comment.clone())
            .await
            .map_err(write_err("post"))?;

        self.notifier
            .notify(
                &actor,
                &post.uid,
                NotificationKind::Comment,
                Some(post_id),
                Some(text),
            )
            .await;

        comment::Output { post_id, comment }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{repos, seed_user, storage};
    use super::*;
    use crate::auth::Principal;
    use crate::repositories::{NotificationQuery, Repositories};
    use crate::usecases::post::{
        comment::Usecase as _, create::Usecase as _, feed::Usecase as _, like::Usecase as _,
    };

    fn notifier(repos: &Repositories) -> Notifier {
        Notifier {
            notification_repository: repos.notifications.clone(),
        }
    }

    async fn create_post(repos: &Repositories, actor: &Principal, content: &str) -> Post {
        PostCreateInteractor {
            user_repository: repos.users.clone(),
            post_repository: repos.posts.clone(),
            storage: storage(),
        }
        .handle(create::Input {
            actor: actor.clone(),
            content: content.into(),
            image: None,
        })
        .await
        .unwrap()
        .post
    }

    #[tokio::test]
    async fn new_post_takes_profile_badges_or_defaults() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;

        let post = create_post(&repos, &u1, "hello world").await;
        assert_eq!(post.badge, "New Post");
        assert_eq!(post.user_badge, "New User");
        assert_eq!(post.display_name, "Alice");
        assert!(post.likes.is_empty() && post.comments.is_empty());

        let stranger = Principal::new("nobody");
        let post = create_post(&repos, &stranger, "hi").await;
        assert_eq!(post.display_name, "Anonymous");
    }

    #[tokio::test]
    async fn blank_post_and_bad_image_are_rejected() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let interactor = PostCreateInteractor {
            user_repository: repos.users.clone(),
            post_repository: repos.posts.clone(),
            storage: storage(),
        };

        let res = interactor
            .handle(create::Input {
                actor: u1.clone(),
                content: "   ".into(),
                image: None,
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let res = interactor
            .handle(create::Input {
                actor: u1.clone(),
                content: "look".into(),
                image: Some(ImageUpload {
                    mime: "text/plain".into(),
                    bytes: vec![0; 4],
                }),
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));
        assert!(repos.posts.finds(PostQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_lands_under_owner_prefix() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let store = storage();

        let post = PostCreateInteractor {
            user_repository: repos.users.clone(),
            post_repository: repos.posts.clone(),
            storage: store.clone(),
        }
        .handle(create::Input {
            actor: u1,
            content: "look".into(),
            image: Some(ImageUpload {
                mime: "image/png".into(),
                bytes: vec![1, 2, 3],
            }),
        })
        .await
        .unwrap()
        .post;

        let url = post.image_url.unwrap();
        let key = url.trim_start_matches("memory://");
        assert!(key.starts_with("posts/u1/"));
        assert_eq!(store.get(key).await.unwrap().0, "image/png");
    }

    #[tokio::test]
    async fn like_twice_restores_likes_and_notifies_once() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;
        let p1 = create_post(&repos, &u2, "mine").await;

        let interactor = PostLikeInteractor {
            post_repository: repos.posts.clone(),
            notifier: notifier(&repos),
        };
        let input = || like::Input {
            actor: u1.clone(),
            post_id: p1.id,
        };

        assert!(interactor.handle(input()).await.unwrap().liked);
        let liked = repos.posts.find(p1.id).await.unwrap();
        assert!(liked.likes.contains(&u1.uid));

        let notes = repos
            .notifications
            .finds(NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Like);
        assert_eq!(notes[0].user_id, u2.uid);
        assert_eq!(notes[0].from_user_id, u1.uid);
        assert_eq!(notes[0].post_id, Some(p1.id));

        assert!(!interactor.handle(input()).await.unwrap().liked);
        assert_eq!(repos.posts.find(p1.id).await.unwrap().likes, p1.likes);
        assert_eq!(
            repos
                .notifications
                .finds(NotificationQuery::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn liking_own_post_does_not_notify() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let p1 = create_post(&repos, &u1, "mine").await;

        PostLikeInteractor {
            post_repository: repos.posts.clone(),
            notifier: notifier(&repos),
        }
        .handle(like::Input {
            actor: u1,
            post_id: p1.id,
        })
        .await
        .unwrap();

        assert!(repos
            .notifications
            .finds(NotificationQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn comment_appends_trimmed_text() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;
        let p1 = create_post(&repos, &u2, "mine").await;

        let interactor = PostCommentInteractor {
            post_repository: repos.posts.clone(),
            notifier: notifier(&repos),
        };

        let res = interactor
            .handle(comment::Input {
                actor: u1.clone(),
                post_id: p1.id,
                text: "  \t ".into(),
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        interactor
            .handle(comment::Input {
                actor: u1.clone(),
                post_id: p1.id,
                text: "  nice one  ".into(),
            })
            .await
            .unwrap();

        let post = repos.posts.find(p1.id).await.unwrap();
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].content, "nice one");

        let notes = repos
            .notifications
            .finds(NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(notes[0].kind, NotificationKind::Comment);
        assert_eq!(notes[0].content.as_deref(), Some("nice one"));
    }

    #[tokio::test]
    async fn feed_is_newest_first() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        create_post(&repos, &u1, "older").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        create_post(&repos, &u1, "newer").await;

        let mut view = PostFeedInteractor {
            post_repository: repos.posts.clone(),
        }
        .handle(feed::Input { actor: u1 })
        .await
        .unwrap()
        .view;

        let contents: Vec<_> = view
            .settled()
            .await
            .items
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(contents, vec!["newer", "older"]);
    }
}
