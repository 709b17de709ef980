use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type Date = DateTime<Utc>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for UserId {
    fn from(s: String) -> Self { Self(s) }
}

macro_rules! uuid_id {
    ($($n:ident),* $(,)?) => {$(
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $n(pub Uuid);

        impl $n {
            pub fn new() -> Self { Self(Uuid::new_v4()) }
        }

        impl Default for $n {
            fn default() -> Self { Self::new() }
        }

        impl fmt::Display for $n {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
        }

        impl ::core::str::FromStr for $n {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
        }
    )*};
}

uuid_id!(PostId, MessageId, GroupId, GroupMessageId, NotificationId);

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub uid: UserId,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub followers: HashSet<UserId>,
    pub following: HashSet<UserId>,
    pub badge: Option<String>,
    pub user_badge: Option<String>,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub uid: UserId,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub badge: String,
    pub user_badge: String,
    pub likes: HashSet<UserId>,
    pub comments: Vec<Comment>,
    pub created_at: Date,
}

/// Embedded in [`Post`]; append only.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub uid: UserId,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub content: String,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    /// Always `[sender_id, recipient_id]`.
    pub participants: [UserId; 2],
    pub read: bool,
    pub created_at: Date,
}

impl Message {
    pub fn between(sender_id: UserId, recipient_id: UserId, text: String, created_at: Date) -> Self {
        Self {
            id: MessageId::new(),
            text,
            participants: [sender_id.clone(), recipient_id.clone()],
            sender_id,
            recipient_id,
            read: false,
            created_at,
        }
    }

    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.recipient_id == b)
            || (&self.sender_id == b && &self.recipient_id == a)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupChat {
    pub id: GroupId,
    pub name: String,
    pub members: HashSet<UserId>,
    pub admins: HashSet<UserId>,
    pub invites: HashSet<UserId>,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMessage {
    pub id: GroupMessageId,
    pub group_id: GroupId,
    pub text: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub read_by: HashSet<UserId>,
    pub created_at: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Comment => write!(f, "comment"),
            NotificationKind::Follow => write!(f, "follow"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub post_id: Option<PostId>,
    pub from_user_id: UserId,
    pub from_display_name: String,
    pub from_photo_url: String,
    pub content: Option<String>,
    pub read: bool,
    pub created_at: Date,
}
