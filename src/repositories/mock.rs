use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use super::{
    GroupMessageQuery, GroupMessageRepository, GroupQuery, GroupRepository, MessageQuery,
    MessageRepository, NotificationQuery, NotificationRepository, PostQuery, PostRepository,
    Repositories, Result, Subscription, UserMutation, UserQuery, UserRepository,
};
use crate::entities::{
    Comment, GroupChat, GroupId, GroupMessage, Message, MessageId, Notification, NotificationId,
    Post, PostId, User, UserId,
};

mod helpers;

use helpers::{find_mut, find_ref, live, sort_by_created};

/// In-process stand-in for the hosted document store.
pub struct InMemoryRepository<T> {
    items: Arc<Mutex<Vec<T>>>,
    changes: watch::Sender<u64>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            items: Arc::new(Mutex::new(vec![])),
            changes,
        }
    }

    fn touch(&self) { self.changes.send_modify(|rev| *rev += 1); }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

impl Repositories {
    /// Every collection held in process. Nothing outlives the returned bundle.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::new()),
            posts: Arc::new(InMemoryRepository::<Post>::new()),
            messages: Arc::new(InMemoryRepository::<Message>::new()),
            groups: Arc::new(InMemoryRepository::<GroupChat>::new()),
            group_messages: Arc::new(InMemoryRepository::<GroupMessage>::new()),
            notifications: Arc::new(InMemoryRepository::<Notification>::new()),
        }
    }
}

fn insert_unique<T>(v: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) -> bool {
    if v.iter().any(|i| same(i, &item)) {
        return false;
    }

    v.push(item);
    true
}

fn select_users(v: &[User], q: &UserQuery) -> Vec<User> {
    v.iter()
        .filter(|u| q.ids.as_ref().map(|s| s.contains(&u.uid)).unwrap_or(true))
        .filter(|u| q.except.as_ref().map(|e| e != &u.uid).unwrap_or(true))
        .filter(|u| {
            q.name
                .as_ref()
                .map(|r| r.is_match(&u.display_name))
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}

fn select_posts(v: &[Post], q: &PostQuery) -> Vec<Post> {
    let mut res = v.to_vec();

    sort_by_created(&mut res, q.order, |p| p.created_at);
    res
}

fn select_messages(v: &[Message], q: &MessageQuery) -> Vec<Message> {
    let mut res: Vec<_> = v
        .iter()
        .filter(|m| {
            q.participant
                .as_ref()
                .map(|u| m.participants.contains(u))
                .unwrap_or(true)
        })
        .filter(|m| q.sender.as_ref().map(|u| u == &m.sender_id).unwrap_or(true))
        .filter(|m| q.recipient.as_ref().map(|u| u == &m.recipient_id).unwrap_or(true))
        .filter(|m| q.read.map(|r| r == m.read).unwrap_or(true))
        .cloned()
        .collect();

    sort_by_created(&mut res, q.order, |m| m.created_at);
    res
}

fn select_groups(v: &[GroupChat], q: &GroupQuery) -> Vec<GroupChat> {
    v.iter()
        .filter(|g| q.member.as_ref().map(|u| g.members.contains(u)).unwrap_or(true))
        .filter(|g| q.invited.as_ref().map(|u| g.invites.contains(u)).unwrap_or(true))
        .cloned()
        .collect()
}

fn select_group_messages(v: &[GroupMessage], q: &GroupMessageQuery) -> Vec<GroupMessage> {
    let mut res: Vec<_> = v.iter().filter(|m| m.group_id == q.group).cloned().collect();

    sort_by_created(&mut res, q.order, |m| m.created_at);
    res
}

fn notification_matches(n: &Notification, q: &NotificationQuery) -> bool {
    q.user_id.as_ref().map(|u| u == &n.user_id).unwrap_or(true)
        && q.read.map(|r| r == n.read).unwrap_or(true)
}

fn select_notifications(v: &[Notification], q: &NotificationQuery) -> Vec<Notification> {
    let mut res: Vec<_> = v
        .iter()
        .filter(|n| notification_matches(n, q))
        .cloned()
        .collect();

    sort_by_created(&mut res, q.order, |n| n.created_at);
    res
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.uid == b.uid);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn find(&self, id: &UserId) -> Result<User> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |v| &v.uid == id)?.clone())
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        Ok(select_users(&self.items.lock().await, &query))
    }

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |v| &v.uid == id)?;

        mutation.apply(item);
        let res = item.clone();

        drop(guard);
        self.touch();

        Ok(res)
    }

    async fn insert_follower(&self, id: &UserId, follower: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |u| &u.uid == id)?
            .followers
            .insert(follower.clone());

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn delete_follower(&self, id: &UserId, follower: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |u| &u.uid == id)?.followers.remove(follower);

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn insert_following(&self, id: &UserId, followee: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |u| &u.uid == id)?
            .following
            .insert(followee.clone());

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn delete_following(&self, id: &UserId, followee: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |u| &u.uid == id)?.following.remove(followee);

        drop(guard);
        self.touch();

        Ok(changed)
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn insert(&self, item: Post) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.id == b.id);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn find(&self, id: PostId) -> Result<Post> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>> {
        Ok(select_posts(&self.items.lock().await, &query))
    }

    async fn subscribe(&self, query: PostQuery) -> Result<Subscription<Post>> {
        Ok(live(&self.items, self.changes.subscribe(), query, select_posts))
    }

    async fn insert_liked(&self, id: PostId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |p| p.id == id)?.likes.insert(user_id.clone());

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn delete_liked(&self, id: PostId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |p| p.id == id)?.likes.remove(user_id);

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn push_comment(&self, id: PostId, comment: Comment) -> Result<()> {
        let mut guard = self.items.lock().await;
        find_mut(&mut guard, |p| p.id == id)?.comments.push(comment);

        drop(guard);
        self.touch();

        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryRepository<Message> {
    async fn insert(&self, item: Message) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.id == b.id);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn finds(&self, query: MessageQuery) -> Result<Vec<Message>> {
        Ok(select_messages(&self.items.lock().await, &query))
    }

    async fn subscribe(&self, query: MessageQuery) -> Result<Subscription<Message>> {
        Ok(live(&self.items, self.changes.subscribe(), query, select_messages))
    }

    async fn update_read(&self, ids: Vec<MessageId>) -> Result<u64> {
        let mut guard = self.items.lock().await;

        // whole batch under one lock
        let mut changed = 0;
        for m in guard.iter_mut().filter(|m| ids.contains(&m.id)) {
            if !m.read {
                m.read = true;
                changed += 1;
            }
        }

        drop(guard);
        if changed > 0 {
            self.touch();
        }

        Ok(changed)
    }
}

#[async_trait]
impl GroupRepository for InMemoryRepository<GroupChat> {
    async fn insert(&self, item: GroupChat) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.id == b.id);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn find(&self, id: GroupId) -> Result<GroupChat> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |g| g.id == id)?.clone())
    }

    async fn finds(&self, query: GroupQuery) -> Result<Vec<GroupChat>> {
        Ok(select_groups(&self.items.lock().await, &query))
    }

    async fn insert_member(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |g| g.id == id)?.members.insert(user_id.clone());

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn insert_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |g| g.id == id)?.invites.insert(user_id.clone());

        drop(guard);
        self.touch();

        Ok(changed)
    }

    async fn delete_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let changed = find_mut(&mut guard, |g| g.id == id)?.invites.remove(user_id);

        drop(guard);
        self.touch();

        Ok(changed)
    }
}

#[async_trait]
impl GroupMessageRepository for InMemoryRepository<GroupMessage> {
    async fn insert(&self, item: GroupMessage) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.id == b.id);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn finds(&self, query: GroupMessageQuery) -> Result<Vec<GroupMessage>> {
        Ok(select_group_messages(&self.items.lock().await, &query))
    }

    async fn subscribe(&self, query: GroupMessageQuery) -> Result<Subscription<GroupMessage>> {
        Ok(live(
            &self.items,
            self.changes.subscribe(),
            query,
            select_group_messages,
        ))
    }

    async fn insert_read_by(&self, group_id: GroupId, user_id: &UserId) -> Result<u64> {
        let mut guard = self.items.lock().await;

        let mut changed = 0;
        for m in guard.iter_mut().filter(|m| m.group_id == group_id) {
            if m.read_by.insert(user_id.clone()) {
                changed += 1;
            }
        }

        drop(guard);
        if changed > 0 {
            self.touch();
        }

        Ok(changed)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository<Notification> {
    async fn insert(&self, item: Notification) -> Result<bool> {
        let inserted = insert_unique(&mut *self.items.lock().await, item, |a, b| a.id == b.id);
        if inserted {
            self.touch();
        }

        Ok(inserted)
    }

    async fn find(&self, id: NotificationId) -> Result<Notification> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |n| n.id == id)?.clone())
    }

    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>> {
        Ok(select_notifications(&self.items.lock().await, &query))
    }

    async fn subscribe(&self, query: NotificationQuery) -> Result<Subscription<Notification>> {
        Ok(live(
            &self.items,
            self.changes.subscribe(),
            query,
            select_notifications,
        ))
    }

    async fn count(&self, query: NotificationQuery) -> Result<u64> {
        let guard = self.items.lock().await;

        Ok(guard.iter().filter(|n| notification_matches(n, &query)).count() as u64)
    }

    async fn update_read(&self, id: NotificationId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |n| n.id == id)?;
        let changed = !item.read;
        item.read = true;

        drop(guard);
        if changed {
            self.touch();
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::repositories::{Order, RepositoryError};

    fn post(author: &str, minutes_ago: i64) -> Post {
        Post {
            id: PostId::new(),
            uid: author.into(),
            display_name: author.to_string(),
            photo_url: None,
            content: format!("from {}", author),
            image_url: None,
            badge: "New Post".to_string(),
            user_badge: "New User".to_string(),
            likes: HashSet::new(),
            comments: vec![],
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn posts_come_newest_first() {
        let repo = InMemoryRepository::<Post>::new();
        let old = post("u1", 30);
        let new = post("u2", 1);

        assert!(repo.insert(old.clone()).await.unwrap());
        assert!(repo.insert(new.clone()).await.unwrap());
        assert!(!repo.insert(old.clone()).await.unwrap());

        let ids: Vec<_> = repo
            .finds(PostQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let ids: Vec<_> = repo
            .finds(PostQuery {
                order: Order::Ascending,
            })
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![old.id, new.id]);
    }

    #[tokio::test]
    async fn like_set_holds_each_user_once() {
        let repo = InMemoryRepository::<Post>::new();
        let p = post("u2", 0);
        repo.insert(p.clone()).await.unwrap();

        let u1 = UserId::from("u1");
        assert!(repo.insert_liked(p.id, &u1).await.unwrap());
        assert!(!repo.insert_liked(p.id, &u1).await.unwrap());
        assert_eq!(repo.find(p.id).await.unwrap().likes.len(), 1);

        assert!(repo.delete_liked(p.id, &u1).await.unwrap());
        assert!(repo.find(p.id).await.unwrap().likes.is_empty());
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let repo = InMemoryRepository::<Post>::new();

        assert!(matches!(
            repo.insert_liked(PostId::new(), &"u1".into()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn subscription_pushes_whole_result_after_each_write() {
        let repo = InMemoryRepository::<Post>::new();
        let mut sub = repo.subscribe(PostQuery::default()).await.unwrap();

        assert!(sub.next().await.unwrap().unwrap().is_empty());

        let p = post("u1", 0);
        repo.insert(p.clone()).await.unwrap();
        let snap = sub.next().await.unwrap().unwrap();
        assert_eq!(snap.len(), 1);

        repo.insert_liked(p.id, &"u2".into()).await.unwrap();
        let snap = sub.next().await.unwrap().unwrap();
        assert!(snap[0].likes.contains(&UserId::from("u2")));
    }

    #[tokio::test]
    async fn unread_count_follows_query() {
        let repo = InMemoryRepository::<Notification>::new();
        let like = |to: &str| Notification {
            id: NotificationId::new(),
            user_id: to.into(),
            kind: crate::entities::NotificationKind::Like,
            post_id: None,
            from_user_id: "u1".into(),
            from_display_name: "Alice".to_string(),
            from_photo_url: String::new(),
            content: None,
            read: false,
            created_at: Utc::now(),
        };
        let first = like("u2");
        repo.insert(first.clone()).await.unwrap();
        repo.insert(like("u2")).await.unwrap();
        repo.insert(like("u3")).await.unwrap();

        let unread_of_u2 = || NotificationQuery {
            user_id: Some("u2".into()),
            read: Some(false),
            ..Default::default()
        };
        assert_eq!(repo.count(unread_of_u2()).await.unwrap(), 2);

        repo.update_read(first.id).await.unwrap();
        assert_eq!(repo.count(unread_of_u2()).await.unwrap(), 1);
        assert_eq!(repo.count(NotificationQuery::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn batch_read_only_counts_changes() {
        let repo = InMemoryRepository::<Message>::new();
        let a = Message::between("u1".into(), "u2".into(), "a".into(), Utc::now());
        let b = Message::between("u1".into(), "u2".into(), "b".into(), Utc::now());
        repo.insert(a.clone()).await.unwrap();
        repo.insert(b.clone()).await.unwrap();

        assert_eq!(repo.update_read(vec![a.id, b.id]).await.unwrap(), 2);
        assert_eq!(repo.update_read(vec![a.id]).await.unwrap(), 0);

        let unread = repo
            .finds(MessageQuery {
                read: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(unread.is_empty());
    }
}
