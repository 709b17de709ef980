usecase! {
    sign_in : {
        pub principal: auth::Principal,
    } => {
        pub user: entities::User,
        pub created: bool,
    }
}

usecase! {
    get : {
        pub user_id: entities::UserId,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    edit : {
        pub actor: auth::Principal,
        pub user_id: entities::UserId,
        pub mutation: super::ProfileEdit,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    people : {
        pub actor: auth::Principal,
        pub search: Option<String>,
    } => {
        pub users: Vec<entities::User>,
    }
}

usecase! {
    follow : {
        pub actor: auth::Principal,
        pub target: entities::UserId,
    } => {
        pub target: entities::UserId,
        pub following: bool,
    }
}

usecase! {
    following : {
        pub actor: auth::Principal,
        pub search: Option<String>,
    } => {
        pub users: Vec<entities::User>,
    }
}

/// Fields a user may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}
