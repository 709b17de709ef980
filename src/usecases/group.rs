usecase! {
    create : {
        pub actor: auth::Principal,
        pub name: String,
        pub members: Vec<entities::UserId>,
    } => {
        pub group: entities::GroupChat,
    }
}

usecase! {
    gets : {
        pub actor: auth::Principal,
    } => {
        pub joined: Vec<entities::GroupChat>,
        pub invited: Vec<entities::GroupChat>,
    }
}

usecase! {
    invite : {
        pub actor: auth::Principal,
        pub group_id: entities::GroupId,
        pub invitee: entities::UserId,
    } => {
        pub group_id: entities::GroupId,
        pub invitee: entities::UserId,
    }
}

usecase! {
    accept : {
        pub actor: auth::Principal,
        pub group_id: entities::GroupId,
    } => {
        pub group: entities::GroupChat,
    }
}

usecase! {
    send : {
        pub actor: auth::Principal,
        pub group_id: entities::GroupId,
        pub text: String,
    } => {
        pub message: entities::GroupMessage,
    }
}

usecase! {
    room : {
        pub actor: auth::Principal,
        pub group_id: entities::GroupId,
    } => {
        pub group_id: entities::GroupId,
        pub view: sync::LiveView<entities::GroupMessage>,
    }
}

usecase! {
    mark_read : {
        pub actor: auth::Principal,
        pub group_id: entities::GroupId,
    } => {
        pub marked: u64,
    }
}
