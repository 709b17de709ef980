usecase! {
    create : {
        pub actor: auth::Principal,
        pub content: String,
        pub image: Option<super::ImageUpload>,
    } => {
        pub post: entities::Post,
    }
}

usecase! {
    get : {
        pub post_id: entities::PostId,
    } => {
        pub post: entities::Post,
    }
}

usecase! {
    feed : {
        pub actor: auth::Principal,
    } => {
        pub view: sync::LiveView<entities::Post>,
    }
}

usecase! {
    like : {
        pub actor: auth::Principal,
        pub post_id: entities::PostId,
    } => {
        pub post_id: entities::PostId,
        pub liked: bool,
    }
}

usecase! {
    comment : {
        pub actor: auth::Principal,
        pub post_id: entities::PostId,
        pub text: String,
    } => {
        pub post_id: entities::PostId,
        pub comment: entities::Comment,
    }
}

/// An image picked for a new post.
pub struct ImageUpload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ::core::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}
