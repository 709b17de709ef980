use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::usecases::user::ProfileEdit;

pub mod parser;

use parser::*;

/// feedlink console.
#[derive(Debug, Clone, Parser)]
#[command(name = "feedlink", no_binary_name = true, disable_version_flag = true)]
pub struct Cmd {
    #[command(subcommand)]
    pub cmd: RootMod,
}

#[derive(Debug, Clone, Subcommand)]
pub enum RootMod {
    /// sign in as the given user.
    Login(LoginCmd),

    /// sign out.
    Logout,

    /// show the signed-in user.
    Whoami,

    /// check whether a page may be shown.
    Open(OpenCmd),

    /// about users and profiles.
    #[command(short_flag = 'U')]
    User {
        #[command(subcommand)]
        cmd: UserMod,
    },

    /// about posts.
    #[command(short_flag = 'P')]
    Post {
        #[command(subcommand)]
        cmd: PostMod,
    },

    /// about direct messages.
    #[command(short_flag = 'M')]
    Message {
        #[command(subcommand)]
        cmd: MessageMod,
    },

    /// about group chats.
    #[command(short_flag = 'G')]
    Group {
        #[command(subcommand)]
        cmd: GroupMod,
    },

    /// about notifications.
    #[command(short_flag = 'N')]
    Notification {
        #[command(subcommand)]
        cmd: NotificationMod,
    },
}

#[derive(Debug, Clone, Args)]
pub struct LoginCmd {
    /// str
    #[arg(value_name = "USER_ID")]
    pub user_id: String,

    #[arg(short = 'n', long)]
    pub name: Option<String>,

    #[arg(short = 'p', long)]
    pub photo: Option<String>,

    #[arg(short = 'e', long)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct OpenCmd {
    #[arg(value_name = "PATH")]
    pub path: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserMod {
    /// show a profile; the signed-in user's when no id is given.
    #[command(short_flag = 'g')]
    Get {
        #[arg(value_name = "USER_ID")]
        user_id: Option<String>,
    },

    /// list everyone else, optionally filtered by name.
    #[command(short_flag = 'q')]
    People {
        #[arg(value_name = "SEARCH")]
        search: Option<String>,
    },

    /// follow, or unfollow when already following.
    #[command(short_flag = 'f')]
    Follow {
        #[arg(value_name = "USER_ID")]
        user_id: String,
    },

    /// list followed users, optionally filtered by name.
    #[command(short_flag = 'l')]
    Following {
        #[arg(value_name = "SEARCH")]
        search: Option<String>,
    },

    /// edit the signed-in user's profile.
    #[command(short_flag = 'e')]
    Edit {
        /// json
        ///
        /// schema: {
        ///   display_name?: str,
        ///   bio?: str,
        ///   photo_url?: str,
        /// }
        #[arg(value_name = "MUTATION", default_value = "{}", value_parser = parse_profile_edit)]
        mutation: ProfileEdit,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PostMod {
    /// publish a post.
    #[command(short_flag = 'c')]
    Create {
        #[arg(value_name = "CONTENT")]
        content: String,

        /// path of an image to attach
        #[arg(short = 'i', long)]
        image: Option<PathBuf>,

        /// type of the image; guessed from its extension when omitted
        #[arg(short = 'm', long, requires = "image")]
        mime: Option<String>,
    },

    /// show one post.
    #[command(short_flag = 'g')]
    Get {
        #[arg(value_name = "POST_ID")]
        post_id: Uuid,
    },

    /// show the feed, newest first.
    #[command(short_flag = 'q')]
    Feed,

    /// like, or unlike when already liked.
    #[command(short_flag = 'l')]
    Like {
        #[arg(value_name = "POST_ID")]
        post_id: Uuid,
    },

    /// comment on a post.
    #[command(short_flag = 'r')]
    Comment {
        #[arg(value_name = "POST_ID")]
        post_id: Uuid,

        #[arg(value_name = "TEXT")]
        text: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum MessageMod {
    #[command(short_flag = 's')]
    Send {
        #[arg(value_name = "USER_ID")]
        user_id: String,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// show the conversation with a user.
    #[command(short_flag = 'g')]
    Show {
        #[arg(value_name = "USER_ID")]
        user_id: String,
    },

    /// mark everything a user sent you as read.
    #[command(short_flag = 'r')]
    Read {
        #[arg(value_name = "USER_ID")]
        user_id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum GroupMod {
    #[command(short_flag = 'c')]
    Create {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "MEMBERS")]
        members: Vec<String>,
    },

    /// list joined groups and pending invites.
    #[command(short_flag = 'q')]
    List,

    #[command(short_flag = 'i')]
    Invite {
        #[arg(value_name = "GROUP_ID")]
        group_id: Uuid,

        #[arg(value_name = "USER_ID")]
        user_id: String,
    },

    #[command(short_flag = 'a')]
    Accept {
        #[arg(value_name = "GROUP_ID")]
        group_id: Uuid,
    },

    #[command(short_flag = 's')]
    Send {
        #[arg(value_name = "GROUP_ID")]
        group_id: Uuid,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    #[command(short_flag = 'g')]
    Show {
        #[arg(value_name = "GROUP_ID")]
        group_id: Uuid,
    },

    #[command(short_flag = 'r')]
    Read {
        #[arg(value_name = "GROUP_ID")]
        group_id: Uuid,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum NotificationMod {
    #[command(short_flag = 'q')]
    List,

    #[command(short_flag = 'r')]
    Read {
        #[arg(value_name = "NOTIFICATION_ID")]
        notification_id: Uuid,
    },

    #[command(short_flag = 'n')]
    Count,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definition_is_consistent() { Cmd::command().debug_assert(); }

    #[test]
    fn parses_nested_commands() {
        let Cmd { cmd } = Cmd::try_parse_from(["message", "send", "u2", "hello there"]).unwrap();
        match cmd {
            RootMod::Message {
                cmd: MessageMod::Send { user_id, text },
            } => {
                assert_eq!(user_id, "u2");
                assert_eq!(text, "hello there");
            },
            other => panic!("unexpected: {:?}", other),
        }

        let Cmd { cmd } =
            Cmd::try_parse_from(["user", "edit", r#"{"bio":"hi"}"#]).unwrap();
        match cmd {
            RootMod::User {
                cmd: UserMod::Edit { mutation },
            } => assert_eq!(mutation.bio.as_deref(), Some("hi")),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(Cmd::try_parse_from(["post", "like", "not-a-uuid"]).is_err());
    }
}
