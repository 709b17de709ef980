use super::Response;
use crate::entities::{Date, GroupChat, GroupMessage, Message, UserId};
use crate::sync::ViewState;
use crate::utils::date_to_string;

fn state_line<T>(state: &ViewState<T>) -> String {
    match (&state.error, state.items.len()) {
        (Some(e), _) => e.clone(),
        (None, 0) => "no messages yet".to_string(),
        (None, n) => format!("{} messages", n),
    }
}

pub fn resp_from_conversation(
    me: &UserId,
    peer: &UserId,
    state: ViewState<Message>,
    now: &Date,
) -> Response {
    let head = Response::notice(format!("conversation with {}", peer), state_line(&state));

    state.items.into_iter().fold(head, |r, m| {
        let who = match &m.sender_id == me {
            true => "you".to_string(),
            false => m.sender_id.to_string(),
        };
        let seen = match (m.read, &m.sender_id == me) {
            (true, true) => " (seen)",
            _ => "",
        };

        r.field(
            format!("[{}] {}{}:", date_to_string(Some(&m.created_at), now), who, seen),
            m.text,
        )
    })
}

pub fn resp_from_group(title: impl core::fmt::Display, group: GroupChat) -> Response {
    let mut members: Vec<_> = group.members.iter().map(|u| u.0.as_str()).collect();
    members.sort_unstable();

    Response::notice(title, &group.name)
        .field("id:", group.id)
        .field("members:", format!("{} ({})", members.len(), members.join(", ")))
        .field("admins:", group.admins.len())
        .field("pending invites:", group.invites.len())
}

pub fn resp_from_group_room(
    me: &UserId,
    state: ViewState<GroupMessage>,
    now: &Date,
) -> Response {
    let head = Response::notice("group messages", state_line(&state));

    state.items.into_iter().fold(head, |r, m| {
        let unread = match m.read_by.contains(me) {
            true => "",
            false => " *",
        };

        r.field(
            format!(
                "[{}] {}{}:",
                date_to_string(Some(&m.created_at), now),
                m.sender_name,
                unread
            ),
            m.text,
        )
    })
}
