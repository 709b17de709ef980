use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::BoxFuture;
use regex::Regex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::entities::{
    Comment, GroupChat, GroupId, GroupMessage, Message, MessageId, Notification, NotificationId,
    Post, PostId, User, UserId,
};

pub mod mock;
pub mod mongo;

pub type Result<T> = ::std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository {
    async fn insert(&self, item: User) -> Result<bool>;

    async fn find(&self, id: &UserId) -> Result<User>;
    async fn finds(&self, query: UserQuery) -> Result<Vec<User>>;

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User>;

    async fn insert_follower(&self, id: &UserId, follower: &UserId) -> Result<bool>;
    async fn delete_follower(&self, id: &UserId, follower: &UserId) -> Result<bool>;

    async fn insert_following(&self, id: &UserId, followee: &UserId) -> Result<bool>;
    async fn delete_following(&self, id: &UserId, followee: &UserId) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository {
    async fn insert(&self, item: Post) -> Result<bool>;

    async fn find(&self, id: PostId) -> Result<Post>;
    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>>;
    async fn subscribe(&self, query: PostQuery) -> Result<Subscription<Post>>;

    async fn insert_liked(&self, id: PostId, user_id: &UserId) -> Result<bool>;
    async fn delete_liked(&self, id: PostId, user_id: &UserId) -> Result<bool>;

    async fn push_comment(&self, id: PostId, comment: Comment) -> Result<()>;
}

#[async_trait]
pub trait MessageRepository {
    async fn insert(&self, item: Message) -> Result<bool>;

    async fn finds(&self, query: MessageQuery) -> Result<Vec<Message>>;
    async fn subscribe(&self, query: MessageQuery) -> Result<Subscription<Message>>;

    /// Sets `read` on every listed message as one batch. Returns the number changed.
    async fn update_read(&self, ids: Vec<MessageId>) -> Result<u64>;
}

#[async_trait]
pub trait GroupRepository {
    async fn insert(&self, item: GroupChat) -> Result<bool>;

    async fn find(&self, id: GroupId) -> Result<GroupChat>;
    async fn finds(&self, query: GroupQuery) -> Result<Vec<GroupChat>>;

    async fn insert_member(&self, id: GroupId, user_id: &UserId) -> Result<bool>;
    async fn insert_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool>;
    async fn delete_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool>;
}

#[async_trait]
pub trait GroupMessageRepository {
    async fn insert(&self, item: GroupMessage) -> Result<bool>;

    async fn finds(&self, query: GroupMessageQuery) -> Result<Vec<GroupMessage>>;
    async fn subscribe(&self, query: GroupMessageQuery) -> Result<Subscription<GroupMessage>>;

    /// Adds `user_id` to `read_by` of every message in the group. Returns the number changed.
    async fn insert_read_by(&self, group_id: GroupId, user_id: &UserId) -> Result<u64>;
}

#[async_trait]
pub trait NotificationRepository {
    async fn insert(&self, item: Notification) -> Result<bool>;

    async fn find(&self, id: NotificationId) -> Result<Notification>;
    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>>;
    async fn subscribe(&self, query: NotificationQuery) -> Result<Subscription<Notification>>;
    async fn count(&self, query: NotificationQuery) -> Result<u64>;

    async fn update_read(&self, id: NotificationId) -> Result<bool>;
}

/// Every backend the application talks to, as one bundle.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository + Sync + Send>,
    pub posts: Arc<dyn PostRepository + Sync + Send>,
    pub messages: Arc<dyn MessageRepository + Sync + Send>,
    pub groups: Arc<dyn GroupRepository + Sync + Send>,
    pub group_messages: Arc<dyn GroupMessageRepository + Sync + Send>,
    pub notifications: Arc<dyn NotificationRepository + Sync + Send>,
}

/// Ordering on `created_at`, the only field any collection is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub ids: Option<HashSet<UserId>>,
    pub except: Option<UserId>,
    pub name: Option<Regex>,
}

#[derive(Debug, Clone)]
pub struct PostQuery {
    pub order: Order,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            order: Order::Descending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub participant: Option<UserId>,
    pub sender: Option<UserId>,
    pub recipient: Option<UserId>,
    pub read: Option<bool>,
    pub order: Order,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            participant: None,
            sender: None,
            recipient: None,
            read: None,
            order: Order::Ascending,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupQuery {
    pub member: Option<UserId>,
    pub invited: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct GroupMessageQuery {
    pub group: GroupId,
    pub order: Order,
}

impl GroupMessageQuery {
    pub fn of(group: GroupId) -> Self {
        Self {
            group,
            order: Order::Ascending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub user_id: Option<UserId>,
    pub read: Option<bool>,
    pub order: Order,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            read: None,
            order: Order::Descending,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserMutation {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

impl UserMutation {
    pub fn apply(self, user: &mut User) {
        let UserMutation {
            display_name,
            email,
            photo_url,
            bio,
        } = self;

        if let Some(val) = display_name {
            user.display_name = val;
        }
        if let Some(val) = email {
            user.email = Some(val);
        }
        if let Some(val) = photo_url {
            user.photo_url = Some(val);
        }
        if let Some(val) = bio {
            user.bio = Some(val);
        }
    }
}

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    NoUnique { matched: u32 },
    Internal(anyhow::Error),
}

impl ::std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "cannot find object."),
            RepositoryError::NoUnique { matched } => write!(
                f,
                "expected unique object, found non-unique objects (matched: {})",
                matched
            ),
            RepositoryError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl ::std::error::Error for RepositoryError {}

pub type Snapshot<T> = Vec<T>;

/// Re-runs a query and yields its full result.
pub type Fetch<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Snapshot<T>>> + Sync + Send>;

/// A standing query. Every push carries the whole result set; dropping it unsubscribes.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Result<Snapshot<T>>>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    pub async fn next(&mut self) -> Option<Result<Snapshot<T>>> { self.rx.recv().await }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) { self.task.abort(); }
}

impl<T> ::std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Pushes an initial snapshot, then a fresh one after every change signal.
///
/// A failing fetch is pushed as an error and ends the subscription, as does a
/// closed change feed.
pub fn spawn_snapshots<T>(mut changes: watch::Receiver<u64>, fetch: Fetch<T>) -> Subscription<T>
where T: Send + 'static {
    let (tx, rx) = mpsc::channel(16);

    let task = tokio::spawn(async move {
        loop {
            changes.borrow_and_update();

            let snapshot = fetch().await;
            let failed = snapshot.is_err();
            if tx.send(snapshot).await.is_err() || failed {
                break;
            }

            if changes.changed().await.is_err() {
                let closed = RepositoryError::Internal(anyhow!("change feed closed"));
                let _ = tx.send(Err(closed)).await;
                break;
            }
        }

        tracing::trace!("subscription ended");
    });

    Subscription { rx, task }
}
