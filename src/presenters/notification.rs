use super::Response;
use crate::entities::{Date, Notification, NotificationKind};
use crate::sync::ViewState;
use crate::utils::date_to_string;

pub fn describe(n: &Notification) -> String {
    match n.kind {
        NotificationKind::Like => format!("{} liked your post", n.from_display_name),
        NotificationKind::Comment => format!(
            "{} commented: {}",
            n.from_display_name,
            n.content.as_deref().unwrap_or_default()
        ),
        NotificationKind::Follow => format!("{} started following you", n.from_display_name),
    }
}

pub fn resp_from_notifications(state: ViewState<Notification>, now: &Date) -> Response {
    let unread = state.items.iter().filter(|n| !n.read).count();
    let description = match &state.error {
        Some(e) => e.clone(),
        None => format!("{} unread", unread),
    };

    state
        .items
        .into_iter()
        .fold(Response::notice("notifications", description), |r, n| {
            let mark = match n.read {
                true => ' ',
                false => '*',
            };

            r.field(
                format!("{} {} ({}):", mark, n.id, date_to_string(Some(&n.created_at), now)),
                describe(&n),
            )
        })
}
