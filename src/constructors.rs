use std::sync::Arc;

use crate::auth::{RouteGuard, Session};
use crate::controllers::group::GroupController;
use crate::controllers::message::MessageController;
use crate::controllers::notification::NotificationController;
use crate::controllers::post::PostController;
use crate::controllers::user::UserController;
use crate::controllers::Console;
use crate::interactors::group::*;
use crate::interactors::message::*;
use crate::interactors::notification::*;
use crate::interactors::post::*;
use crate::interactors::user::*;
use crate::repositories::mongo::{
    MongoGroupMessageModel, MongoGroupModel, MongoMessageModel, MongoNotificationModel,
    MongoPostModel, MongoRepository, MongoUserModel,
};
use crate::repositories::Repositories;
use crate::storage::{InMemoryObjectStorage, ObjectStorage};
use crate::sync::{FailurePolicy, Issuer};

pub fn in_memory() -> Console {
    assemble(
        Repositories::in_memory(),
        Arc::new(InMemoryObjectStorage::new()),
        RouteGuard::default(),
    )
}

pub async fn mongo(
    uri_str: impl AsRef<str>,
    db_name: impl AsRef<str>,
    storage: Arc<dyn ObjectStorage + Sync + Send>,
    guard: RouteGuard,
) -> ::anyhow::Result<Console> {
    let c = ::mongodb::Client::with_uri_str(uri_str).await?;
    let db = c.database(db_name.as_ref());

    let repos = Repositories {
        users: Arc::new(MongoRepository::<MongoUserModel>::new_with(c.clone(), &db, "users").await?),
        posts: Arc::new(MongoRepository::<MongoPostModel>::new_with(c.clone(), &db, "posts").await?),
        messages: Arc::new(
            MongoRepository::<MongoMessageModel>::new_with(c.clone(), &db, "messages").await?,
        ),
        groups: Arc::new(
            MongoRepository::<MongoGroupModel>::new_with(c.clone(), &db, "groupChats").await?,
        ),
        group_messages: Arc::new(
            MongoRepository::<MongoGroupMessageModel>::new_with(c.clone(), &db, "groupMessages")
                .await?,
        ),
        notifications: Arc::new(
            MongoRepository::<MongoNotificationModel>::new_with(c, &db, "notifications").await?,
        ),
    };

    Ok(assemble(repos, storage, guard))
}

pub fn assemble(
    repos: Repositories,
    storage: Arc<dyn ObjectStorage + Sync + Send>,
    guard: RouteGuard,
) -> Console {
    let notifier = Notifier {
        notification_repository: repos.notifications.clone(),
    };

    let user = UserController {
        sign_in: Arc::new(UserSignInInteractor {
            user_repository: repos.users.clone(),
        }),
        get: Arc::new(UserGetInteractor {
            user_repository: repos.users.clone(),
        }),
        edit: Arc::new(UserEditInteractor {
            user_repository: repos.users.clone(),
        }),
        people: Arc::new(UserPeopleInteractor {
            user_repository: repos.users.clone(),
        }),
        follow: Arc::new(UserFollowInteractor {
            user_repository: repos.users.clone(),
            notifier: notifier.clone(),
        }),
        following: Arc::new(UserFollowingInteractor {
            user_repository: repos.users.clone(),
        }),
        follow_issuer: Issuer::new("follow", FailurePolicy::Notify),
    };

    let post = PostController {
        create: Arc::new(PostCreateInteractor {
            user_repository: repos.users.clone(),
            post_repository: repos.posts.clone(),
            storage,
        }),
        get: Arc::new(PostGetInteractor {
            post_repository: repos.posts.clone(),
        }),
        feed: Arc::new(PostFeedInteractor {
            post_repository: repos.posts.clone(),
        }),
        like: Arc::new(PostLikeInteractor {
            post_repository: repos.posts.clone(),
            notifier: notifier.clone(),
        }),
        comment: Arc::new(PostCommentInteractor {
            post_repository: repos.posts.clone(),
            notifier,
        }),
        users: repos.users.clone(),
        create_issuer: Issuer::new("create post", FailurePolicy::Notify),
        like_issuer: Issuer::new("like", FailurePolicy::Log),
        comment_issuer: Issuer::new("comment", FailurePolicy::Log),
    };

    let message = MessageController {
        send: Arc::new(MessageSendInteractor {
            message_repository: repos.messages.clone(),
        }),
        conversation: Arc::new(MessageConversationInteractor {
            message_repository: repos.messages.clone(),
        }),
        mark_read: Arc::new(MessageMarkReadInteractor {
            message_repository: repos.messages.clone(),
        }),
        send_issuer: Issuer::new("send message", FailurePolicy::Log),
    };

    let group = GroupController {
        create: Arc::new(GroupCreateInteractor {
            group_repository: repos.groups.clone(),
        }),
        gets: Arc::new(GroupGetsInteractor {
            group_repository: repos.groups.clone(),
        }),
        invite: Arc::new(GroupInviteInteractor {
            group_repository: repos.groups.clone(),
        }),
        accept: Arc::new(GroupAcceptInteractor {
            group_repository: repos.groups.clone(),
        }),
        send: Arc::new(GroupSendInteractor {
            group_repository: repos.groups.clone(),
            group_message_repository: repos.group_messages.clone(),
        }),
        room: Arc::new(GroupRoomInteractor {
            group_repository: repos.groups.clone(),
            group_message_repository: repos.group_messages.clone(),
        }),
        mark_read: Arc::new(GroupMarkReadInteractor {
            group_repository: repos.groups.clone(),
            group_message_repository: repos.group_messages.clone(),
        }),
        send_issuer: Issuer::new("send group message", FailurePolicy::Notify),
    };

    let notification = NotificationController {
        feed: Arc::new(NotificationFeedInteractor {
            notification_repository: repos.notifications.clone(),
        }),
        mark_read: Arc::new(NotificationMarkReadInteractor {
            notification_repository: repos.notifications.clone(),
        }),
        unread_count: Arc::new(NotificationUnreadCountInteractor {
            notification_repository: repos.notifications,
        }),
    };

    Console {
        user,
        post,
        message,
        group,
        notification,
        guard,
        session: Session::default(),
    }
}
