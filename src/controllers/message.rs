use std::sync::Arc;

use chrono::Utc;
use smallvec::smallvec;

use super::{issued, Responses};
use crate::auth::Principal;
use crate::cmds::MessageMod;
use crate::errors::Result;
use crate::presenters::chat::resp_from_conversation;
use crate::presenters::Response;
use crate::sync::Issuer;
use crate::usecases::message::{conversation, mark_read, send};
use crate::utils::LetChain;

pub struct MessageController {
    pub send: Arc<dyn send::Usecase + Sync + Send>,
    pub conversation: Arc<dyn conversation::Usecase + Sync + Send>,
    pub mark_read: Arc<dyn mark_read::Usecase + Sync + Send>,

    pub send_issuer: Issuer,
}

impl MessageController {
    pub async fn handle(&self, actor: Principal, cmd: MessageMod) -> Result<Responses> {
        match cmd {
            MessageMod::Send { user_id, text } => {
                let input = send::Input {
                    actor,
                    recipient: user_id.into(),
                    text,
                };

                self.send_issuer
                    .issue(self.send.handle(input))
                    .await
                    .let_(|o| {
                        issued("message", o, |send::Output { message }| {
                            Response::notice("sent", message.text).field("to:", message.recipient_id)
                        })
                    })
                    .let_(Ok)
            },

            MessageMod::Show { user_id } => {
                let me = actor.uid.clone();
                let conversation::Output { peer, mut view } = self
                    .conversation
                    .handle(conversation::Input {
                        actor,
                        peer: user_id.into(),
                    })
                    .await?;
                let state = view.settled().await;

                Ok(smallvec![resp_from_conversation(&me, &peer, state, &Utc::now())])
            },

            MessageMod::Read { user_id } => self
                .mark_read
                .handle(mark_read::Input {
                    actor,
                    peer: user_id.into(),
                })
                .await?
                .let_(|mark_read::Output { marked }| {
                    Response::notice("marked read", format!("{} messages", marked))
                })
                .let_(|r| Ok(smallvec![r])),
        }
    }
}
