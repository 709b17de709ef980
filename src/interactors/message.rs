use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{non_empty, read_err, write_err};
use crate::entities::Message;
use crate::errors::{AppError, Result};
use crate::repositories::{MessageQuery, MessageRepository};
use crate::sync::{ErrorPolicy, LiveView};
use crate::usecases::message::{conversation, mark_read, send};
use crate::utils::{AlsoChain, LetChain};

pub struct MessageSendInteractor {
    pub message_repository: Arc<dyn MessageRepository + Sync + Send>,
}
#[async_trait]
impl send::Usecase for MessageSendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: send::Input) -> Result<send::Output> {
        tracing::trace!("input - {:?}", data);

        let send::Input {
            actor,
            recipient,
            text,
        } = data;

        // checked trimmed, stored as typed
        non_empty(&text, "Message cannot be empty")?;

        let message = Message::between(actor.uid, recipient, text, Utc::now());

        self.message_repository
            .insert(message.clone())
            .await
            .map_err(write_err("message"))?;

        send::Output { message }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct MessageConversationInteractor {
    pub message_repository: Arc<dyn MessageRepository + Sync + Send>,
}
#[async_trait]
impl conversation::Usecase for MessageConversationInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: conversation::Input) -> Result<conversation::Output> {
        tracing::trace!("input - {:?}", data);

        let conversation::Input { actor, peer } = data;

        let query = MessageQuery {
            participant: Some(actor.uid.clone()),
            ..Default::default()
        };

        let (me, other) = (actor.uid, peer.clone());
        self.message_repository
            .subscribe(query)
            .await
            .map_err(|e| AppError::Subscription(e.to_string()))?
            .let_(|sub| {
                LiveView::spawn_filtered(sub, ErrorPolicy::Silent, move |m: &Message| {
                    m.is_between(&me, &other)
                })
            })
            .let_(|view| conversation::Output { peer, view })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct MessageMarkReadInteractor {
    pub message_repository: Arc<dyn MessageRepository + Sync + Send>,
}
#[async_trait]
impl mark_read::Usecase for MessageMarkReadInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: mark_read::Input) -> Result<mark_read::Output> {
        tracing::trace!("input - {:?}", data);

        let mark_read::Input { actor, peer } = data;

        let query = MessageQuery {
            sender: Some(peer),
            recipient: Some(actor.uid),
            read: Some(false),
            ..Default::default()
        };

        let ids = self
            .message_repository
            .finds(query)
            .await
            .map_err(read_err("messages"))?
            .into_iter()
            .map(|m| m.id)
            .collect::<Vec<_>>();

        if ids.is_empty() {
            return Ok(mark_read::Output { marked: 0 });
        }

        self.message_repository
            .update_read(ids)
            .await
            .map_err(write_err("messages"))?
            .let_(|marked| mark_read::Output { marked })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{repos, seed_user};
    use super::*;
    use crate::auth::Principal;
    use crate::entities::UserId;
    use crate::repositories::Repositories;
    use crate::usecases::message::{
        conversation::Usecase as _, mark_read::Usecase as _, send::Usecase as _,
    };

    async fn send(repos: &Repositories, from: &Principal, to: &str, text: &str) -> Message {
        MessageSendInteractor {
            message_repository: repos.messages.clone(),
        }
        .handle(send::Input {
            actor: from.clone(),
            recipient: to.into(),
            text: text.into(),
        })
        .await
        .unwrap()
        .message
    }

    #[tokio::test]
    async fn sent_message_is_unread_between_two() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;

        let m = send(&repos, &u1, "u2", "hello").await;

        assert_eq!(m.sender_id, UserId::from("u1"));
        assert_eq!(m.recipient_id, UserId::from("u2"));
        assert_eq!(m.participants, [UserId::from("u1"), UserId::from("u2")]);
        assert!(!m.read);
        assert_eq!(m.text, "hello");
    }

    #[tokio::test]
    async fn blank_message_is_rejected_and_text_kept_as_typed() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let interactor = MessageSendInteractor {
            message_repository: repos.messages.clone(),
        };

        let res = interactor
            .handle(send::Input {
                actor: u1.clone(),
                recipient: "u2".into(),
                text: " \n ".into(),
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let m = send(&repos, &u1, "u2", "  spaced  ").await;
        assert_eq!(m.text, "  spaced  ");
    }

    #[tokio::test]
    async fn conversation_only_holds_the_pair_in_order() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;

        send(&repos, &u1, "u2", "one").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        send(&repos, &u1, "u3", "elsewhere").await;
        send(&repos, &u2, "u1", "two").await;

        let mut view = MessageConversationInteractor {
            message_repository: repos.messages.clone(),
        }
        .handle(conversation::Input {
            actor: u1,
            peer: u2.uid,
        })
        .await
        .unwrap()
        .view;

        let texts: Vec<_> = view
            .settled()
            .await
            .items
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn mark_read_only_touches_incoming_from_peer() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;
        let u3 = seed_user(&repos, "u3", "Carol").await;

        send(&repos, &u2, "u1", "a").await;
        send(&repos, &u2, "u1", "b").await;
        send(&repos, &u3, "u1", "c").await;
        send(&repos, &u1, "u2", "d").await;

        let interactor = MessageMarkReadInteractor {
            message_repository: repos.messages.clone(),
        };
        let input = || mark_read::Input {
            actor: u1.clone(),
            peer: u2.uid.clone(),
        };

        assert_eq!(interactor.handle(input()).await.unwrap().marked, 2);
        assert_eq!(interactor.handle(input()).await.unwrap().marked, 0);

        let unread = repos
            .messages
            .finds(MessageQuery {
                read: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        let texts: Vec<_> = unread.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["c", "d"]);
    }
}
