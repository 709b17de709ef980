use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{name_or, non_empty, read_err, write_err};
use crate::auth::Principal;
use crate::entities::{GroupChat, GroupId, GroupMessage, GroupMessageId};
use crate::errors::{AppError, Result};
use crate::repositories::{
    GroupMessageQuery, GroupMessageRepository, GroupQuery, GroupRepository, RepositoryError,
};
use crate::sync::{ErrorPolicy, LiveView};
use crate::usecases::group::{accept, create, gets, invite, mark_read, room, send};
use crate::utils::{AlsoChain, LetChain};

const GROUP_NOT_FOUND: &str = "Group not found";
const MESSAGES_FAILED: &str = "Failed to load messages";

fn ensure_member(group: &GroupChat, actor: &Principal) -> Result<()> {
    match group.members.contains(&actor.uid) {
        true => Ok(()),
        false => Err(AppError::Forbidden(format!(
            "not a member of `{}`",
            group.name
        ))),
    }
}

async fn find_group(
    repo: &Arc<dyn GroupRepository + Sync + Send>,
    id: GroupId,
) -> Result<GroupChat> {
    repo.find(id).await.map_err(read_err("group"))
}

pub struct GroupCreateInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
}
#[async_trait]
impl create::Usecase for GroupCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create::Input) -> Result<create::Output> {
        tracing::trace!("input - {:?}", data);

        let create::Input {
            actor,
            name,
            members,
        } = data;

        let name = non_empty(&name, "Group name cannot be empty")?.to_string();

        let mut members: HashSet<_> = members.into_iter().collect();
        members.insert(actor.uid.clone());

        let group = GroupChat {
            id: GroupId::new(),
            name,
            members,
            admins: [actor.uid].into_iter().collect(),
            invites: HashSet::new(),
            created_at: Utc::now(),
        };

        self.group_repository
            .insert(group.clone())
            .await
            .map_err(write_err("group"))?;

        create::Output { group }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupGetsInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
}
#[async_trait]
impl gets::Usecase for GroupGetsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: gets::Input) -> Result<gets::Output> {
        tracing::trace!("input - {:?}", data);

        let gets::Input { actor } = data;

        let joined = self
            .group_repository
            .finds(GroupQuery {
                member: Some(actor.uid.clone()),
                ..Default::default()
            })
            .await
            .map_err(read_err("groups"))?;

        let invited = self
            .group_repository
            .finds(GroupQuery {
                invited: Some(actor.uid),
                ..Default::default()
            })
            .await
            .map_err(read_err("groups"))?;

        gets::Output { joined, invited }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupInviteInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
}
#[async_trait]
impl invite::Usecase for GroupInviteInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: invite::Input) -> Result<invite::Output> {
        tracing::trace!("input - {:?}", data);

        let invite::Input {
            actor,
            group_id,
            invitee,
        } = data;

        let group = find_group(&self.group_repository, group_id).await?;

        if !group.admins.contains(&actor.uid) {
            return Err(AppError::Forbidden(
                "only admins can invite to a group".to_string(),
            ));
        }
        if group.members.contains(&invitee) {
            return Err(AppError::Validation(format!(
                "`{}` is already a member",
                invitee
            )));
        }

        self.group_repository
            .insert_invite(group_id, &invitee)
            .await
            .map_err(write_err("group"))?;

        invite::Output { group_id, invitee }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupAcceptInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
}
#[async_trait]
impl accept::Usecase for GroupAcceptInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: accept::Input) -> Result<accept::Output> {
        tracing::trace!("input - {:?}", data);

        let accept::Input { actor, group_id } = data;

        let group = find_group(&self.group_repository, group_id).await?;

        if !group.invites.contains(&actor.uid) {
            return Err(AppError::Forbidden("no pending invite".to_string()));
        }

        self.group_repository
            .insert_member(group_id, &actor.uid)
            .await
            .map_err(write_err("group"))?;
        self.group_repository
            .delete_invite(group_id, &actor.uid)
            .await
            .map_err(write_err("group"))?;

        find_group(&self.group_repository, group_id)
            .await?
            .let_(|group| accept::Output { group })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupSendInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
    pub group_message_repository: Arc<dyn GroupMessageRepository + Sync + Send>,
}
#[async_trait]
impl send::Usecase for GroupSendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: send::Input) -> Result<send::Output> {
        tracing::trace!("input - {:?}", data);

        let send::Input {
            actor,
            group_id,
            text,
        } = data;

        // checked trimmed, stored as typed
        non_empty(&text, "Message cannot be empty")?;

        let group = find_group(&self.group_repository, group_id).await?;
        ensure_member(&group, &actor)?;

        let message = GroupMessage {
            id: GroupMessageId::new(),
            group_id,
            text,
            sender_id: actor.uid.clone(),
            sender_name: name_or(&actor, "User"),
            read_by: [actor.uid].into_iter().collect(),
            created_at: Utc::now(),
        };

        self.group_message_repository
            .insert(message.clone())
            .await
            .map_err(write_err("message"))?;

        send::Output { message }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupRoomInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
    pub group_message_repository: Arc<dyn GroupMessageRepository + Sync + Send>,
}
#[async_trait]
impl room::Usecase for GroupRoomInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: room::Input) -> Result<room::Output> {
        tracing::trace!("input - {:?}", data);

        let room::Input { actor, group_id } = data;

        let view = match self.group_repository.find(group_id).await {
            Ok(group) => {
                ensure_member(&group, &actor)?;

                match self
                    .group_message_repository
                    .subscribe(GroupMessageQuery::of(group_id))
                    .await
                {
                    Ok(sub) => LiveView::spawn(sub, ErrorPolicy::Surface(MESSAGES_FAILED)),
                    Err(e) => {
                        tracing::error!("cannot subscribe to `{}`: {}", group_id, e);
                        LiveView::failed(MESSAGES_FAILED)
                    },
                }
            },
            Err(RepositoryError::NotFound) => LiveView::failed(GROUP_NOT_FOUND),
            Err(e) => {
                tracing::error!("cannot load group `{}`: {}", group_id, e);
                LiveView::failed(MESSAGES_FAILED)
            },
        };

        room::Output { group_id, view }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct GroupMarkReadInteractor {
    pub group_repository: Arc<dyn GroupRepository + Sync + Send>,
    pub group_message_repository: Arc<dyn GroupMessageRepository + Sync + Send>,
}
#[async_trait]
impl mark_read::Usecase for GroupMarkReadInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: mark_read::Input) -> Result<mark_read::Output> {
        tracing::trace!("input - {:?}", data);

        let mark_read::Input { actor, group_id } = data;

        let group = find_group(&self.group_repository, group_id).await?;
        ensure_member(&group, &actor)?;

        self.group_message_repository
            .insert_read_by(group_id, &actor.uid)
            .await
            .map_err(write_err("messages"))?
            .let_(|marked| mark_read::Output { marked })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}
