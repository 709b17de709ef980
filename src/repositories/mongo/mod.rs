use std::convert::TryFrom;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{
    spawn_snapshots, Fetch, GroupMessageQuery, GroupMessageRepository, GroupQuery, GroupRepository,
    MessageQuery, MessageRepository, NotificationQuery, NotificationRepository, Order, PostQuery,
    PostRepository, RepositoryError, Result, Subscription, UserMutation, UserQuery, UserRepository,
};
use crate::entities::{
    Comment, GroupChat, GroupId, GroupMessage, Message, MessageId, Notification, NotificationId,
    Post, PostId, User, UserId,
};
use crate::utils::LetChain;

mod converters;
mod helpers;
mod models;
mod type_convert;

use converters::{convert_repo_err, try_unique_check};
use helpers::{
    find_many, get_one, initialize_coll, live, modify_set, spawn_change_feed,
    update_many_in_transaction, ModifyOpTy,
};
pub use models::{
    MongoGroupMessageModel, MongoGroupModel, MongoMessageModel, MongoNotificationModel,
    MongoPostModel, MongoUserModel,
};

/// One collection of the hosted store, plus its change feed.
pub struct MongoRepository<M> {
    client: Client,
    coll: Collection<M>,
    changes: watch::Receiver<u64>,
    feed: JoinHandle<()>,
}

impl<M> MongoRepository<M>
where M: Sync + Send
{
    pub async fn new_with(client: Client, db: &Database, name: &str) -> ::anyhow::Result<Self> {
        initialize_coll(name, db).await?;

        let coll = db.collection(name);
        let (changes, feed) = spawn_change_feed(&coll);

        Ok(Self {
            client,
            coll,
            changes,
            feed,
        })
    }
}

impl<M> Drop for MongoRepository<M> {
    fn drop(&mut self) { self.feed.abort(); }
}

async fn insert_model<M, T>(coll: &Collection<M>, item: T) -> Result<bool>
where
    M: ::serde::Serialize + From<T>,
{
    let model: M = item.into();

    coll.insert_one(model, None).await.let_(try_unique_check)
}

fn modify_err(id: impl ::core::fmt::Display) -> impl FnOnce(RepositoryError) -> RepositoryError {
    move |e| {
        tracing::debug!("set modification on `{}` failed", id);
        e
    }
}

#[async_trait]
impl UserRepository for MongoRepository<MongoUserModel> {
    async fn insert(&self, item: User) -> Result<bool> { insert_model(&self.coll, item).await }

    async fn find(&self, id: &UserId) -> Result<User> {
        get_one(&self.coll, &id.0).await?.let_(User::try_from)
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        find_many(&self.coll, query.into(), None).await
    }

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User> {
        let mutation_doc: Document = mutation.into();

        if !mutation_doc.is_empty() {
            let res = self
                .coll
                .update_one(doc! { "id": &id.0 }, doc! { "$set": mutation_doc }, None)
                .await
                .let_(convert_repo_err)?;

            if res.matched_count == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        self.find(id).await
    }

    async fn insert_follower(&self, id: &UserId, follower: &UserId) -> Result<bool> {
        modify_set("followers", &self.coll, &id.0, &follower.0, ModifyOpTy::Push)
            .await
            .map_err(modify_err(id))
    }

    async fn delete_follower(&self, id: &UserId, follower: &UserId) -> Result<bool> {
        modify_set("followers", &self.coll, &id.0, &follower.0, ModifyOpTy::Pull)
            .await
            .map_err(modify_err(id))
    }

    async fn insert_following(&self, id: &UserId, followee: &UserId) -> Result<bool> {
        modify_set("following", &self.coll, &id.0, &followee.0, ModifyOpTy::Push)
            .await
            .map_err(modify_err(id))
    }

    async fn delete_following(&self, id: &UserId, followee: &UserId) -> Result<bool> {
        modify_set("following", &self.coll, &id.0, &followee.0, ModifyOpTy::Pull)
            .await
            .map_err(modify_err(id))
    }
}

#[async_trait]
impl PostRepository for MongoRepository<MongoPostModel> {
    async fn insert(&self, item: Post) -> Result<bool> { insert_model(&self.coll, item).await }

    async fn find(&self, id: PostId) -> Result<Post> {
        get_one(&self.coll, id.to_string())
            .await?
            .let_(Post::try_from)
    }

    async fn finds(&self, PostQuery { order }: PostQuery) -> Result<Vec<Post>> {
        find_many(&self.coll, doc! {}, Some(order)).await
    }

    async fn subscribe(&self, PostQuery { order }: PostQuery) -> Result<Subscription<Post>> {
        Ok(live(&self.coll, self.changes.clone(), doc! {}, order))
    }

    async fn insert_liked(&self, id: PostId, user_id: &UserId) -> Result<bool> {
        modify_set("likes", &self.coll, id.to_string(), &user_id.0, ModifyOpTy::Push)
            .await
            .map_err(modify_err(id))
    }

    async fn delete_liked(&self, id: PostId, user_id: &UserId) -> Result<bool> {
        modify_set("likes", &self.coll, id.to_string(), &user_id.0, ModifyOpTy::Pull)
            .await
            .map_err(modify_err(id))
    }

    async fn push_comment(&self, id: PostId, comment: Comment) -> Result<()> {
        let model: models::MongoCommentModel = comment.into();
        let bson = ::mongodb::bson::to_bson(&model).let_(convert_repo_err)?;

        let res = self
            .coll
            .update_one(
                doc! { "id": id.to_string() },
                doc! { "$push": { "comments": bson } },
                None,
            )
            .await
            .let_(convert_repo_err)?;

        match res.matched_count {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl MessageRepository for MongoRepository<MongoMessageModel> {
    async fn insert(&self, item: Message) -> Result<bool> { insert_model(&self.coll, item).await }

    async fn finds(&self, query: MessageQuery) -> Result<Vec<Message>> {
        let order = query.order;
        find_many(&self.coll, query.into(), Some(order)).await
    }

    async fn subscribe(&self, query: MessageQuery) -> Result<Subscription<Message>> {
        let order = query.order;
        Ok(live(&self.coll, self.changes.clone(), query.into(), order))
    }

    async fn update_read(&self, ids: Vec<MessageId>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<_> = ids.iter().map(|i| i.to_string()).collect();
        update_many_in_transaction(
            &self.coll,
            &self.client,
            doc! { "id": { "$in": ids }, "read": false },
            doc! { "read": true },
        )
        .await
    }
}

#[async_trait]
impl GroupRepository for MongoRepository<MongoGroupModel> {
    async fn insert(&self, item: GroupChat) -> Result<bool> { insert_model(&self.coll, item).await }

    async fn find(&self, id: GroupId) -> Result<GroupChat> {
        get_one(&self.coll, id.to_string())
            .await?
            .let_(GroupChat::try_from)
    }

    async fn finds(&self, query: GroupQuery) -> Result<Vec<GroupChat>> {
        find_many(&self.coll, query.into(), Some(Order::Ascending)).await
    }

    async fn insert_member(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        modify_set("members", &self.coll, id.to_string(), &user_id.0, ModifyOpTy::Push).await
    }

    async fn insert_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        modify_set("invites", &self.coll, id.to_string(), &user_id.0, ModifyOpTy::Push).await
    }

    async fn delete_invite(&self, id: GroupId, user_id: &UserId) -> Result<bool> {
        modify_set("invites", &self.coll, id.to_string(), &user_id.0, ModifyOpTy::Pull).await
    }
}

#[async_trait]
impl GroupMessageRepository for MongoRepository<MongoGroupMessageModel> {
    async fn insert(&self, item: GroupMessage) -> Result<bool> {
        insert_model(&self.coll, item).await
    }

    async fn finds(&self, query: GroupMessageQuery) -> Result<Vec<GroupMessage>> {
        let order = query.order;
        find_many(&self.coll, query.into(), Some(order)).await
    }

    async fn subscribe(&self, query: GroupMessageQuery) -> Result<Subscription<GroupMessage>> {
        let order = query.order;
        Ok(live(&self.coll, self.changes.clone(), query.into(), order))
    }

    async fn insert_read_by(&self, group_id: GroupId, user_id: &UserId) -> Result<u64> {
        let res = self
            .coll
            .update_many(
                doc! { "group_id": group_id.to_string() },
                doc! { "$addToSet": { "read_by": &user_id.0 } },
                None,
            )
            .await
            .let_(convert_repo_err)?;

        Ok(res.modified_count)
    }
}

#[async_trait]
impl NotificationRepository for MongoRepository<MongoNotificationModel> {
    async fn insert(&self, item: Notification) -> Result<bool> {
        insert_model(&self.coll, item).await
    }

    async fn find(&self, id: NotificationId) -> Result<Notification> {
        get_one(&self.coll, id.to_string())
            .await?
            .let_(Notification::try_from)
    }

    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>> {
        let order = query.order;
        find_many(&self.coll, query.into(), Some(order)).await
    }

    async fn subscribe(&self, query: NotificationQuery) -> Result<Subscription<Notification>> {
        let order = query.order;
        Ok(live(&self.coll, self.changes.clone(), query.into(), order))
    }

    async fn count(&self, query: NotificationQuery) -> Result<u64> {
        self.coll
            .count_documents(Document::from(query), None)
            .await
            .let_(convert_repo_err)
    }

    async fn update_read(&self, id: NotificationId) -> Result<bool> {
        let res = self
            .coll
            .update_one(
                doc! { "id": id.to_string() },
                doc! { "$set": { "read": true } },
                None,
            )
            .await
            .let_(convert_repo_err)?;

        match res.matched_count {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(res.modified_count > 0),
        }
    }
}
