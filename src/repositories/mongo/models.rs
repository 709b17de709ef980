use std::collections::HashSet;

use mongodb::bson::DateTime;

use crate::entities::NotificationKind;

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub followers: HashSet<String>,
    pub following: HashSet<String>,
    pub badge: Option<String>,
    pub user_badge: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoPostModel {
    pub id: String,
    pub uid: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub badge: String,
    pub user_badge: String,
    pub likes: HashSet<String>,
    pub comments: Vec<MongoCommentModel>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoCommentModel {
    pub uid: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub content: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoMessageModel {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub participants: Vec<String>,
    pub read: bool,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoGroupModel {
    pub id: String,
    pub name: String,
    pub members: HashSet<String>,
    pub admins: HashSet<String>,
    pub invites: HashSet<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoGroupMessageModel {
    pub id: String,
    pub group_id: String,
    pub text: String,
    pub sender_id: String,
    pub sender_name: String,
    pub read_by: HashSet<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoNotificationModel {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub post_id: Option<String>,
    pub from_user_id: String,
    pub from_display_name: String,
    pub from_photo_url: String,
    pub content: Option<String>,
    pub read: bool,
    pub created_at: DateTime,
}
