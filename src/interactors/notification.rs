use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{name_or, read_err, write_err};
use crate::auth::Principal;
use crate::entities::{Notification, NotificationId, NotificationKind, PostId, UserId};
use crate::errors::{AppError, Result};
use crate::repositories::{NotificationQuery, NotificationRepository};
use crate::sync::{ErrorPolicy, LiveView};
use crate::usecases::notification::{feed, mark_read, unread_count};
use crate::utils::{AlsoChain, LetChain};

/// Writes notifications on behalf of other operations.
#[derive(Clone)]
pub struct Notifier {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}

impl Notifier {
    /// Best effort: nothing is written when `actor` is `recipient`, and a failed
    /// write is logged rather than failing the caller.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.uid))]
    pub async fn notify(
        &self,
        actor: &Principal,
        recipient: &UserId,
        kind: NotificationKind,
        post_id: Option<PostId>,
        content: Option<String>,
    ) -> Option<NotificationId> {
        if &actor.uid == recipient {
            tracing::trace!("skipped, actor is recipient");
            return None;
        }

        let notification = Notification {
            id: NotificationId::new(),
            user_id: recipient.clone(),
            kind,
            post_id,
            from_user_id: actor.uid.clone(),
            from_display_name: name_or(actor, "Anonymous"),
            from_photo_url: actor.photo_url.clone().unwrap_or_default(),
            content,
            read: false,
            created_at: Utc::now(),
        };
        let id = notification.id;

        match self.notification_repository.insert(notification).await {
            Ok(_) => Some(id),
            Err(e) => {
                tracing::error!("cannot notify `{}`: {}", recipient, e);
                None
            },
        }
    }
}

pub struct NotificationFeedInteractor {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}
#[async_trait]
impl feed::Usecase for NotificationFeedInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: feed::Input) -> Result<feed::Output> {
        tracing::trace!("input - {:?}", data);

        let feed::Input { actor } = data;

        let query = NotificationQuery {
            user_id: Some(actor.uid),
            ..Default::default()
        };

        self.notification_repository
            .subscribe(query)
            .await
            .map_err(|e| AppError::Subscription(e.to_string()))?
            .let_(|sub| LiveView::spawn(sub, ErrorPolicy::Silent))
            .let_(|view| feed::Output { view })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct NotificationMarkReadInteractor {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}
#[async_trait]
impl mark_read::Usecase for NotificationMarkReadInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: mark_read::Input) -> Result<mark_read::Output> {
        tracing::trace!("input - {:?}", data);

        let mark_read::Input {
            actor,
            notification_id,
        } = data;

        let notification = self
            .notification_repository
            .find(notification_id)
            .await
            .map_err(read_err("notification"))?;

        if notification.user_id != actor.uid {
            return Err(AppError::Forbidden(
                "only the recipient can mark a notification read".to_string(),
            ));
        }

        self.notification_repository
            .update_read(notification_id)
            .await
            .map_err(write_err("notification"))?;

        mark_read::Output { notification_id }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct NotificationUnreadCountInteractor {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}
#[async_trait]
impl unread_count::Usecase for NotificationUnreadCountInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unread_count::Input) -> Result<unread_count::Output> {
        tracing::trace!("input - {:?}", data);

        let unread_count::Input { actor } = data;

        let query = NotificationQuery {
            user_id: Some(actor.uid),
            read: Some(false),
            ..Default::default()
        };

        self.notification_repository
            .count(query)
            .await
            .map_err(read_err("notifications"))?
            .let_(|count| unread_count::Output { count })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}
