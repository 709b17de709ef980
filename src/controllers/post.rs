use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use smallvec::smallvec;

use super::{issued, Responses};
use crate::auth::Principal;
use crate::cmds::parser::guess_mime;
use crate::cmds::PostMod;
use crate::entities::PostId;
use crate::errors::{AppError, Result};
use crate::presenters::post::resp_from_post;
use crate::presenters::Response;
use crate::repositories::UserRepository;
use crate::sync::{fetch_authors, settled_enriched, Enriched, Issuer};
use crate::usecases::post::{comment, create, feed, get, like, ImageUpload};
use crate::utils::LetChain;

pub struct PostController {
    pub create: Arc<dyn create::Usecase + Sync + Send>,
    pub get: Arc<dyn get::Usecase + Sync + Send>,
    pub feed: Arc<dyn feed::Usecase + Sync + Send>,
    pub like: Arc<dyn like::Usecase + Sync + Send>,
    pub comment: Arc<dyn comment::Usecase + Sync + Send>,

    /// Point reads for comment author enrichment.
    pub users: Arc<dyn UserRepository + Sync + Send>,

    pub create_issuer: Issuer,
    pub like_issuer: Issuer,
    pub comment_issuer: Issuer,
}

async fn read_image(path: &Path, mime: Option<String>) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Storage(anyhow::anyhow!("cannot read `{}`: {}", path.display(), e)))?;

    Ok(ImageUpload {
        mime: mime.unwrap_or_else(|| guess_mime(path).to_string()),
        bytes,
    })
}

impl PostController {
    pub async fn handle(&self, actor: Principal, cmd: PostMod) -> Result<Responses> {
        let now = Utc::now();

        match cmd {
            PostMod::Create {
                content,
                image,
                mime,
            } => {
                let image = match image {
                    Some(path) => Some(read_image(&path, mime).await?),
                    None => None,
                };
                let input = create::Input {
                    actor,
                    content,
                    image,
                };

                self.create_issuer
                    .issue(self.create.handle(input))
                    .await
                    .let_(|o| {
                        issued("post", o, |create::Output { post }| {
                            Response::notice("Post published successfully", post.id)
                        })
                    })
                    .let_(Ok)
            },

            PostMod::Get { post_id } => {
                let get::Output { post } = self
                    .get
                    .handle(get::Input {
                        post_id: PostId(post_id),
                    })
                    .await?;
                let authors = fetch_authors(&self.users, core::slice::from_ref(&post)).await;

                Ok(smallvec![resp_from_post(post, &authors, Some(&actor.uid), &now)])
            },

            PostMod::Feed => {
                let viewer = actor.uid.clone();
                let mut view = self.feed.handle(feed::Input { actor }).await?.view;
                let Enriched { state, authors } = settled_enriched(&mut view, &self.users).await;

                if state.items.is_empty() {
                    return Ok(smallvec![Response::notice("feed", "No posts yet")]);
                }

                state
                    .items
                    .into_iter()
                    .map(|p| resp_from_post(p, &authors, Some(&viewer), &now))
                    .collect::<Responses>()
                    .let_(Ok)
            },

            PostMod::Like { post_id } => {
                let input = like::Input {
                    actor,
                    post_id: PostId(post_id),
                };

                self.like_issuer
                    .issue(self.like.handle(input))
                    .await
                    .let_(|o| {
                        issued("like", o, |like::Output { post_id, liked }| match liked {
                            true => Response::notice("liked", post_id),
                            false => Response::notice("unliked", post_id),
                        })
                    })
                    .let_(Ok)
            },

            PostMod::Comment { post_id, text } => {
                let input = comment::Input {
                    actor,
                    post_id: PostId(post_id),
                    text,
                };

                self.comment_issuer
                    .issue(self.comment.handle(input))
                    .await
                    .let_(|o| {
                        issued("comment", o, |comment::Output { post_id, comment }| {
                            Response::notice("commented", comment.content).field("post:", post_id)
                        })
                    })
                    .let_(Ok)
            },
        }
    }
}
