usecase! {
    feed : {
        pub actor: auth::Principal,
    } => {
        pub view: sync::LiveView<entities::Notification>,
    }
}

usecase! {
    mark_read : {
        pub actor: auth::Principal,
        pub notification_id: entities::NotificationId,
    } => {
        pub notification_id: entities::NotificationId,
    }
}

usecase! {
    unread_count : {
        pub actor: auth::Principal,
    } => {
        pub count: u64,
    }
}
