use std::convert::TryFrom;

use anyhow::anyhow;
use mongodb::bson::{doc, Document};

use super::converters::{from_bson_date, parse_id, to_bson_date};
use super::models::{
    MongoCommentModel, MongoGroupMessageModel, MongoGroupModel, MongoMessageModel,
    MongoNotificationModel, MongoPostModel, MongoUserModel,
};
use super::{
    GroupMessageQuery, GroupQuery, MessageQuery, NotificationQuery, Order, RepositoryError,
    UserMutation, UserQuery,
};
use crate::entities::{
    Comment, GroupChat, GroupMessage, Message, Notification, Post, PostId, User, UserId,
};

fn ids_to_strings<'a>(ids: impl IntoIterator<Item = &'a UserId>) -> Vec<String> {
    ids.into_iter().map(|u| u.0.clone()).collect()
}

fn strings_to_ids(raw: impl IntoIterator<Item = String>) -> std::collections::HashSet<UserId> {
    raw.into_iter().map(UserId).collect()
}

pub fn sort_doc(order: Order) -> Document {
    match order {
        Order::Ascending => doc! { "created_at": 1 },
        Order::Descending => doc! { "created_at": -1 },
    }
}

impl From<User> for MongoUserModel {
    fn from(u: User) -> Self {
        Self {
            id: u.uid.0,
            display_name: u.display_name,
            email: u.email,
            photo_url: u.photo_url,
            bio: u.bio,
            followers: u.followers.into_iter().map(|i| i.0).collect(),
            following: u.following.into_iter().map(|i| i.0).collect(),
            badge: u.badge,
            user_badge: u.user_badge,
            created_at: to_bson_date(u.created_at),
        }
    }
}
impl TryFrom<MongoUserModel> for User {
    type Error = RepositoryError;

    fn try_from(m: MongoUserModel) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: UserId(m.id),
            display_name: m.display_name,
            email: m.email,
            photo_url: m.photo_url,
            bio: m.bio,
            followers: strings_to_ids(m.followers),
            following: strings_to_ids(m.following),
            badge: m.badge,
            user_badge: m.user_badge,
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<Comment> for MongoCommentModel {
    fn from(c: Comment) -> Self {
        Self {
            uid: c.uid.0,
            display_name: c.display_name,
            photo_url: c.photo_url,
            content: c.content,
            created_at: to_bson_date(c.created_at),
        }
    }
}
impl TryFrom<MongoCommentModel> for Comment {
    type Error = RepositoryError;

    fn try_from(m: MongoCommentModel) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: UserId(m.uid),
            display_name: m.display_name,
            photo_url: m.photo_url,
            content: m.content,
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<Post> for MongoPostModel {
    fn from(p: Post) -> Self {
        Self {
            id: p.id.to_string(),
            uid: p.uid.0,
            display_name: p.display_name,
            photo_url: p.photo_url,
            content: p.content,
            image_url: p.image_url,
            badge: p.badge,
            user_badge: p.user_badge,
            likes: p.likes.into_iter().map(|i| i.0).collect(),
            comments: p.comments.into_iter().map(Into::into).collect(),
            created_at: to_bson_date(p.created_at),
        }
    }
}
impl TryFrom<MongoPostModel> for Post {
    type Error = RepositoryError;

    fn try_from(m: MongoPostModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&m.id)?,
            uid: UserId(m.uid),
            display_name: m.display_name,
            photo_url: m.photo_url,
            content: m.content,
            image_url: m.image_url,
            badge: m.badge,
            user_badge: m.user_badge,
            likes: strings_to_ids(m.likes),
            comments: m
                .comments
                .into_iter()
                .map(Comment::try_from)
                .collect::<Result<_, _>>()?,
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<Message> for MongoMessageModel {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.to_string(),
            text: m.text,
            sender_id: m.sender_id.0,
            recipient_id: m.recipient_id.0,
            participants: ids_to_strings(&m.participants),
            read: m.read,
            created_at: to_bson_date(m.created_at),
        }
    }
}
impl TryFrom<MongoMessageModel> for Message {
    type Error = RepositoryError;

    fn try_from(m: MongoMessageModel) -> Result<Self, Self::Error> {
        let participants = match <[String; 2]>::try_from(m.participants) {
            Ok([a, b]) => [UserId(a), UserId(b)],
            Err(v) => {
                return Err(RepositoryError::Internal(anyhow!(
                    "expected 2 participants, found {}",
                    v.len()
                )))
            },
        };

        Ok(Self {
            id: parse_id(&m.id)?,
            text: m.text,
            sender_id: UserId(m.sender_id),
            recipient_id: UserId(m.recipient_id),
            participants,
            read: m.read,
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<GroupChat> for MongoGroupModel {
    fn from(g: GroupChat) -> Self {
        Self {
            id: g.id.to_string(),
            name: g.name,
            members: g.members.into_iter().map(|i| i.0).collect(),
            admins: g.admins.into_iter().map(|i| i.0).collect(),
            invites: g.invites.into_iter().map(|i| i.0).collect(),
            created_at: to_bson_date(g.created_at),
        }
    }
}
impl TryFrom<MongoGroupModel> for GroupChat {
    type Error = RepositoryError;

    fn try_from(m: MongoGroupModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&m.id)?,
            name: m.name,
            members: strings_to_ids(m.members),
            admins: strings_to_ids(m.admins),
            invites: strings_to_ids(m.invites),
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<GroupMessage> for MongoGroupMessageModel {
    fn from(m: GroupMessage) -> Self {
        Self {
            id: m.id.to_string(),
            group_id: m.group_id.to_string(),
            text: m.text,
            sender_id: m.sender_id.0,
            sender_name: m.sender_name,
            read_by: m.read_by.into_iter().map(|i| i.0).collect(),
            created_at: to_bson_date(m.created_at),
        }
    }
}
impl TryFrom<MongoGroupMessageModel> for GroupMessage {
    type Error = RepositoryError;

    fn try_from(m: MongoGroupMessageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&m.id)?,
            group_id: parse_id(&m.group_id)?,
            text: m.text,
            sender_id: UserId(m.sender_id),
            sender_name: m.sender_name,
            read_by: strings_to_ids(m.read_by),
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<Notification> for MongoNotificationModel {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            user_id: n.user_id.0,
            kind: n.kind,
            post_id: n.post_id.map(|i| i.to_string()),
            from_user_id: n.from_user_id.0,
            from_display_name: n.from_display_name,
            from_photo_url: n.from_photo_url,
            content: n.content,
            read: n.read,
            created_at: to_bson_date(n.created_at),
        }
    }
}
impl TryFrom<MongoNotificationModel> for Notification {
    type Error = RepositoryError;

    fn try_from(m: MongoNotificationModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&m.id)?,
            user_id: UserId(m.user_id),
            kind: m.kind,
            post_id: m.post_id.as_deref().map(parse_id::<PostId>).transpose()?,
            from_user_id: UserId(m.from_user_id),
            from_display_name: m.from_display_name,
            from_photo_url: m.from_photo_url,
            content: m.content,
            read: m.read,
            created_at: from_bson_date(m.created_at)?,
        })
    }
}

impl From<UserQuery> for Document {
    fn from(UserQuery { ids, except, name }: UserQuery) -> Self {
        let mut query = doc! {};
        let mut id_q = doc! {};

        if let Some(set) = ids {
            id_q.insert("$in", ids_to_strings(&set));
        }
        if let Some(id) = except {
            id_q.insert("$ne", id.0);
        }
        if !id_q.is_empty() {
            query.insert("id", id_q);
        }

        if let Some(r) = name {
            query.insert("display_name", doc! { "$regex": r.as_str() });
        }

        query
    }
}

impl From<MessageQuery> for Document {
    fn from(
        MessageQuery {
            participant,
            sender,
            recipient,
            read,
            ..
        }: MessageQuery,
    ) -> Self {
        let mut query = doc! {};

        if let Some(u) = participant {
            query.insert("participants", u.0);
        }
        if let Some(u) = sender {
            query.insert("sender_id", u.0);
        }
        if let Some(u) = recipient {
            query.insert("recipient_id", u.0);
        }
        if let Some(r) = read {
            query.insert("read", r);
        }

        query
    }
}

impl From<GroupQuery> for Document {
    fn from(GroupQuery { member, invited }: GroupQuery) -> Self {
        let mut query = doc! {};

        if let Some(u) = member {
            query.insert("members", u.0);
        }
        if let Some(u) = invited {
            query.insert("invites", u.0);
        }

        query
    }
}

impl From<GroupMessageQuery> for Document {
    fn from(GroupMessageQuery { group, .. }: GroupMessageQuery) -> Self {
        doc! { "group_id": group.to_string() }
    }
}

impl From<NotificationQuery> for Document {
    fn from(NotificationQuery { user_id, read, .. }: NotificationQuery) -> Self {
        let mut query = doc! {};

        if let Some(u) = user_id {
            query.insert("user_id", u.0);
        }
        if let Some(r) = read {
            query.insert("read", r);
        }

        query
    }
}

impl From<UserMutation> for Document {
    fn from(
        UserMutation {
            display_name,
            email,
            photo_url,
            bio,
        }: UserMutation,
    ) -> Self {
        let mut mutation = doc! {};

        if let Some(val) = display_name {
            mutation.insert("display_name", val);
        }
        if let Some(val) = email {
            mutation.insert("email", val);
        }
        if let Some(val) = photo_url {
            mutation.insert("photo_url", val);
        }
        if let Some(val) = bio {
            mutation.insert("bio", val);
        }

        mutation
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entities::MessageId;

    #[test]
    fn message_model_keeps_exactly_two_participants() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = Message::between("u1".into(), "u2".into(), "hello".into(), at);

        let mut model = MongoMessageModel::from(msg.clone());
        assert_eq!(model.participants, vec!["u1".to_string(), "u2".to_string()]);
        assert_eq!(Message::try_from(model.clone()).unwrap(), msg);

        model.participants.push("u3".to_string());
        model.id = MessageId::new().to_string();
        assert!(Message::try_from(model).is_err());
    }

    #[test]
    fn queries_only_carry_given_filters() {
        let q: Document = MessageQuery {
            participant: Some("u1".into()),
            read: Some(false),
            ..Default::default()
        }
        .into();
        assert_eq!(q, doc! { "participants": "u1", "read": false });

        let q: Document = UserQuery::default().into();
        assert!(q.is_empty());

        assert_eq!(sort_doc(Order::Descending), doc! { "created_at": -1 });
    }
}
