use std::sync::Arc;

use smallvec::smallvec;

use super::{issued, Responses};
use crate::auth::Principal;
use crate::cmds::UserMod;
use crate::errors::Result;
use crate::presenters::user::{resp_from_user, resp_from_users};
use crate::presenters::Response;
use crate::sync::Issuer;
use crate::usecases::user::{edit, follow, following, get, people, sign_in};
use crate::utils::LetChain;

pub struct UserController {
    pub sign_in: Arc<dyn sign_in::Usecase + Sync + Send>,
    pub get: Arc<dyn get::Usecase + Sync + Send>,
    pub edit: Arc<dyn edit::Usecase + Sync + Send>,
    pub people: Arc<dyn people::Usecase + Sync + Send>,
    pub follow: Arc<dyn follow::Usecase + Sync + Send>,
    pub following: Arc<dyn following::Usecase + Sync + Send>,

    pub follow_issuer: Issuer,
}

impl UserController {
    pub async fn sign_in(&self, principal: Principal) -> Result<Response> {
        let sign_in::Output { user, created } =
            self.sign_in.handle(sign_in::Input { principal }).await?;

        let title = match created {
            true => "welcome",
            false => "welcome back",
        };
        Ok(resp_from_user(title, user))
    }

    pub async fn handle(&self, actor: Principal, cmd: UserMod) -> Result<Responses> {
        match cmd {
            UserMod::Get { user_id } => self
                .get
                .handle(get::Input {
                    user_id: user_id.map(Into::into).unwrap_or(actor.uid),
                })
                .await?
                .let_(|get::Output { user }| resp_from_user("profile", user))
                .let_(|r| Ok(smallvec![r])),

            UserMod::People { search } => self
                .people
                .handle(people::Input { actor, search })
                .await?
                .let_(|people::Output { users }| resp_from_users("people", users))
                .let_(|r| Ok(smallvec![r])),

            UserMod::Following { search } => self
                .following
                .handle(following::Input { actor, search })
                .await?
                .let_(|following::Output { users }| resp_from_users("following", users))
                .let_(|r| Ok(smallvec![r])),

            UserMod::Edit { mutation } => self
                .edit
                .handle(edit::Input {
                    user_id: actor.uid.clone(),
                    actor,
                    mutation,
                })
                .await?
                .let_(|edit::Output { user }| resp_from_user("profile updated", user))
                .let_(|r| Ok(smallvec![r])),

            UserMod::Follow { user_id } => {
                let input = follow::Input {
                    actor,
                    target: user_id.into(),
                };

                self.follow_issuer
                    .issue(self.follow.handle(input))
                    .await
                    .let_(|o| {
                        issued("follow", o, |follow::Output { target, following }| {
                            match following {
                                true => Response::notice("followed", target),
                                false => Response::notice("unfollowed", target),
                            }
                        })
                    })
                    .let_(Ok)
            },
        }
    }
}
