pub mod group;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;

use smallvec::{smallvec, SmallVec};

use crate::auth::{Access, Principal, RouteGuard, Session};
use crate::cmds::{Cmd, LoginCmd, OpenCmd, RootMod};
use crate::errors::{AppError, Result};
use crate::presenters::Response;
use crate::sync::Outcome;
use crate::utils::LetChain;

pub type Responses = SmallVec<[Response; 4]>;

fn issued<T>(what: &str, outcome: Outcome<T>, present: impl FnOnce(T) -> Response) -> Responses {
    match outcome {
        Outcome::Done(t) => smallvec![present(t)],
        Outcome::Busy => smallvec![Response::notice(what, "still in progress")],
        Outcome::Failed(Some(notice)) => smallvec![Response::notice("error", notice)],
        Outcome::Failed(None) => smallvec![Response::notice(what, "not applied")],
    }
}

/// Line-oriented driver over every operation, with one session.
pub struct Console {
    pub user: user::UserController,
    pub post: post::PostController,
    pub message: message::MessageController,
    pub group: group::GroupController,
    pub notification: notification::NotificationController,

    pub guard: RouteGuard,
    pub session: Session,
}

impl Console {
    /// `None` for a blank line.
    pub async fn execute(&mut self, line: &str) -> Option<Responses> {
        let cmd = match Self::parse_str(line)? {
            Ok(o) => o,
            Err(e) => return Some(smallvec![Response::notice("usage", e)]),
        };

        let res = self.handle_cmd(cmd).await.unwrap_or_else(|e| {
            tracing::warn!("command failed: {}", e);
            smallvec![Response::notice("error", e.notice())]
        });

        Some(res)
    }

    fn parse_str(raw: &str) -> Option<::core::result::Result<Cmd, String>> {
        use clap::Parser;

        let splitted = match ::shell_words::split(raw) {
            Ok(v) => v,
            Err(e) => return Some(Err(e.to_string())),
        };

        if splitted.is_empty() {
            return None;
        }

        Cmd::try_parse_from(splitted)
            .map_err(|e| e.to_string())
            .let_(Some)
    }

    fn authorize_cmd(&self) -> Result<Principal> { self.session.require().map(Clone::clone) }

    async fn handle_cmd(&mut self, Cmd { cmd }: Cmd) -> Result<Responses> {
        match cmd {
            RootMod::Login(LoginCmd {
                user_id,
                name,
                photo,
                email,
            }) => {
                let principal = Principal {
                    uid: user_id.into(),
                    display_name: name,
                    photo_url: photo,
                    email,
                };

                let resp = self.user.sign_in(principal.clone()).await?;
                self.session.sign_in(principal);

                Ok(smallvec![resp])
            },

            RootMod::Logout => match self.session.sign_out() {
                Some(p) => Ok(smallvec![Response::notice("signed out", p.uid)]),
                None => Err(AppError::Unauthenticated),
            },

            RootMod::Whoami => {
                let p = self.authorize_cmd()?;
                let name = p.display_name.clone().unwrap_or_default();

                Ok(smallvec![Response::notice("signed in", p.uid).field("name:", name)])
            },

            RootMod::Open(OpenCmd { path }) => match self.guard.check(&path, &self.session) {
                Access::Allow => Ok(smallvec![Response::notice("open", path)]),
                Access::Redirect(to) => {
                    Ok(smallvec![Response::notice("redirect", to).field("from:", path)])
                },
            },

            RootMod::User { cmd } => self.user.handle(self.authorize_cmd()?, cmd).await,
            RootMod::Post { cmd } => self.post.handle(self.authorize_cmd()?, cmd).await,
            RootMod::Message { cmd } => self.message.handle(self.authorize_cmd()?, cmd).await,
            RootMod::Group { cmd } => self.group.handle(self.authorize_cmd()?, cmd).await,
            RootMod::Notification { cmd } => {
                self.notification.handle(self.authorize_cmd()?, cmd).await
            },
        }
    }
}
