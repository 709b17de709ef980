usecase! {
    send : {
        pub actor: auth::Principal,
        pub recipient: entities::UserId,
        pub text: String,
    } => {
        pub message: entities::Message,
    }
}

usecase! {
    conversation : {
        pub actor: auth::Principal,
        pub peer: entities::UserId,
    } => {
        pub peer: entities::UserId,
        pub view: sync::LiveView<entities::Message>,
    }
}

usecase! {
    mark_read : {
        pub actor: auth::Principal,
        pub peer: entities::UserId,
    } => {
        pub marked: u64,
    }
}
