use std::sync::Arc;

use chrono::Utc;
use smallvec::smallvec;

use super::Responses;
use crate::auth::Principal;
use crate::cmds::NotificationMod;
use crate::entities::NotificationId;
use crate::errors::Result;
use crate::presenters::notification::resp_from_notifications;
use crate::presenters::Response;
use crate::usecases::notification::{feed, mark_read, unread_count};
use crate::utils::LetChain;

pub struct NotificationController {
    pub feed: Arc<dyn feed::Usecase + Sync + Send>,
    pub mark_read: Arc<dyn mark_read::Usecase + Sync + Send>,
    pub unread_count: Arc<dyn unread_count::Usecase + Sync + Send>,
}

impl NotificationController {
    pub async fn handle(&self, actor: Principal, cmd: NotificationMod) -> Result<Responses> {
        match cmd {
            NotificationMod::List => {
                let mut view = self.feed.handle(feed::Input { actor }).await?.view;
                let state = view.settled().await;

                Ok(smallvec![resp_from_notifications(state, &Utc::now())])
            },

            NotificationMod::Read { notification_id } => self
                .mark_read
                .handle(mark_read::Input {
                    actor,
                    notification_id: NotificationId(notification_id),
                })
                .await?
                .let_(|mark_read::Output { notification_id }| {
                    Response::notice("marked read", notification_id)
                })
                .let_(|r| Ok(smallvec![r])),

            NotificationMod::Count => self
                .unread_count
                .handle(unread_count::Input { actor })
                .await?
                .let_(|unread_count::Output { count }| {
                    Response::notice("unread notifications", count)
                })
                .let_(|r| Ok(smallvec![r])),
        }
    }
}
