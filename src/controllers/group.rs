use std::sync::Arc;

use chrono::Utc;
use smallvec::smallvec;

use super::{issued, Responses};
use crate::auth::Principal;
use crate::cmds::GroupMod;
use crate::entities::GroupId;
use crate::errors::Result;
use crate::presenters::chat::{resp_from_group, resp_from_group_room};
use crate::presenters::Response;
use crate::sync::Issuer;
use crate::usecases::group::{accept, create, gets, invite, mark_read, room, send};
use crate::utils::LetChain;

pub struct GroupController {
    pub create: Arc<dyn create::Usecase + Sync + Send>,
    pub gets: Arc<dyn gets::Usecase + Sync + Send>,
    pub invite: Arc<dyn invite::Usecase + Sync + Send>,
    pub accept: Arc<dyn accept::Usecase + Sync + Send>,
    pub send: Arc<dyn send::Usecase + Sync + Send>,
    pub room: Arc<dyn room::Usecase + Sync + Send>,
    pub mark_read: Arc<dyn mark_read::Usecase + Sync + Send>,

    pub send_issuer: Issuer,
}

impl GroupController {
    pub async fn handle(&self, actor: Principal, cmd: GroupMod) -> Result<Responses> {
        match cmd {
            GroupMod::Create { name, members } => self
                .create
                .handle(create::Input {
                    actor,
                    name,
                    members: members.into_iter().map(Into::into).collect(),
                })
                .await?
                .let_(|create::Output { group }| resp_from_group("group created", group))
                .let_(|r| Ok(smallvec![r])),

            GroupMod::List => {
                let gets::Output { joined, invited } =
                    self.gets.handle(gets::Input { actor }).await?;

                if joined.is_empty() && invited.is_empty() {
                    return Ok(smallvec![Response::notice("groups", "none yet")]);
                }

                joined
                    .into_iter()
                    .map(|g| resp_from_group("joined", g))
                    .chain(invited.into_iter().map(|g| resp_from_group("invited", g)))
                    .collect::<Responses>()
                    .let_(Ok)
            },

            GroupMod::Invite { group_id, user_id } => self
                .invite
                .handle(invite::Input {
                    actor,
                    group_id: GroupId(group_id),
                    invitee: user_id.into(),
                })
                .await?
                .let_(|invite::Output { group_id, invitee }| {
                    Response::notice("invited", invitee).field("group:", group_id)
                })
                .let_(|r| Ok(smallvec![r])),

            GroupMod::Accept { group_id } => self
                .accept
                .handle(accept::Input {
                    actor,
                    group_id: GroupId(group_id),
                })
                .await?
                .let_(|accept::Output { group }| resp_from_group("joined", group))
                .let_(|r| Ok(smallvec![r])),

            GroupMod::Send { group_id, text } => {
                let input = send::Input {
                    actor,
                    group_id: GroupId(group_id),
                    text,
                };

                self.send_issuer
                    .issue(self.send.handle(input))
                    .await
                    .let_(|o| {
                        issued("group message", o, |send::Output { message }| {
                            Response::notice("sent", message.text).field("group:", message.group_id)
                        })
                    })
                    .let_(Ok)
            },

            GroupMod::Show { group_id } => {
                let me = actor.uid.clone();
                let mut view = self
                    .room
                    .handle(room::Input {
                        actor,
                        group_id: GroupId(group_id),
                    })
                    .await?
                    .view;
                let state = view.settled().await;

                Ok(smallvec![resp_from_group_room(&me, state, &Utc::now())])
            },

            GroupMod::Read { group_id } => self
                .mark_read
                .handle(mark_read::Input {
                    actor,
                    group_id: GroupId(group_id),
                })
                .await?
                .let_(|mark_read::Output { marked }| {
                    Response::notice("marked read", format!("{} messages", marked))
                })
                .let_(|r| Ok(smallvec![r])),
        }
    }
}
