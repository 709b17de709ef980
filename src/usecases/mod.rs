macro_rules! usecase {
    ($n:ident : { $( $i:tt )* } => { $( $o:tt )* }) => {
        pub mod $n {
            #[allow(unused_imports)]
            use crate::{auth, entities, repositories, sync};

            #[::async_trait::async_trait]
            pub trait Usecase {
                async fn handle(&self, data: Input) -> crate::errors::Result<Output>;
            }

            #[derive(Debug)]
            pub struct Input { $( $i )* }

            #[derive(Debug)]
            pub struct Output { $( $o )* }
        }
    };
}

pub mod group;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;
