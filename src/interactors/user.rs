use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::notification::Notifier;
use super::{case_insensitive, read_err, write_err};
use crate::entities::{NotificationKind, User};
use crate::errors::{AppError, Result};
use crate::repositories::{UserMutation, UserQuery, UserRepository};
use crate::usecases::user::{edit, follow, following, get, people, sign_in};
use crate::utils::{AlsoChain, LetChain};

pub struct UserSignInInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl sign_in::Usecase for UserSignInInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: sign_in::Input) -> Result<sign_in::Output> {
        tracing::trace!("input - {:?}", data);

        let sign_in::Input { principal } = data;

        let new_user = User {
            uid: principal.uid.clone(),
            display_name: principal.display_name.clone().unwrap_or_default(),
            email: principal.email.clone(),
            photo_url: principal.photo_url.clone(),
            bio: None,
            followers: HashSet::new(),
            following: HashSet::new(),
            badge: None,
            user_badge: None,
            created_at: Utc::now(),
        };

        let created = self
            .user_repository
            .insert(new_user.clone())
            .await
            .map_err(write_err("user"))?;

        // existing profile: refresh the provider fields, keep everything else
        let user = match created {
            true => new_user,
            false => {
                let mutation = UserMutation {
                    display_name: principal.display_name,
                    email: principal.email,
                    photo_url: principal.photo_url,
                    bio: None,
                };
                self.user_repository
                    .update(&principal.uid, mutation)
                    .await
                    .map_err(write_err("user"))?
            },
        };

        sign_in::Output { user, created }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserGetInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl get::Usecase for UserGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { user_id } = data;

        self.user_repository
            .find(&user_id)
            .await
            .map_err(read_err("user"))?
            .let_(|user| get::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserEditInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl edit::Usecase for UserEditInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: edit::Input) -> Result<edit::Output> {
        tracing::trace!("input - {:?}", data);

        let edit::Input {
            actor,
            user_id,
            mutation,
        } = data;

        if actor.uid != user_id {
            return Err(AppError::Forbidden(
                "profiles can only be edited by their owner".to_string(),
            ));
        }

        let mutation = UserMutation {
            display_name: mutation.display_name.map(|s| s.trim().to_string()),
            email: None,
            photo_url: mutation.photo_url,
            bio: mutation.bio,
        };
        if let Some("") = mutation.display_name.as_deref() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }

        self.user_repository
            .update(&user_id, mutation)
            .await
            .map_err(write_err("user"))?
            .let_(|user| edit::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserPeopleInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl people::Usecase for UserPeopleInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: people::Input) -> Result<people::Output> {
        tracing::trace!("input - {:?}", data);

        let people::Input { actor, search } = data;

        let query = UserQuery {
            except: Some(actor.uid),
            name: case_insensitive(search.as_deref())?,
            ..Default::default()
        };

        self.user_repository
            .finds(query)
            .await
            .map_err(read_err("users"))?
            .let_(|users| people::Output { users })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserFollowInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub notifier: Notifier,
}
#[async_trait]
impl follow::Usecase for UserFollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: follow::Input) -> Result<follow::Output> {
        tracing::trace!("input - {:?}", data);

        let follow::Input { actor, target } = data;

        if actor.uid == target {
            return Err(AppError::Validation("You can't follow yourself".to_string()));
        }

        let target_user = self
            .user_repository
            .find(&target)
            .await
            .map_err(read_err("user"))?;

        let following = !target_user.followers.contains(&actor.uid);
        match following {
            true => {
                self.user_repository
                    .insert_follower(&target, &actor.uid)
                    .await
                    .map_err(write_err("user"))?;
                self.user_repository
                    .insert_following(&actor.uid, &target)
                    .await
                    .map_err(write_err("user"))?;

                self.notifier
                    .notify(&actor, &target, NotificationKind::Follow, None, None)
                    .await;
            },
            false => {
                self.user_repository
                    .delete_follower(&target, &actor.uid)
                    .await
                    .map_err(write_err("user"))?;
                self.user_repository
                    .delete_following(&actor.uid, &target)
                    .await
                    .map_err(write_err("user"))?;
            },
        }

        follow::Output { target, following }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserFollowingInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl following::Usecase for UserFollowingInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: following::Input) -> Result<following::Output> {
        tracing::trace!("input - {:?}", data);

        let following::Input { actor, search } = data;

        let me = self
            .user_repository
            .find(&actor.uid)
            .await
            .map_err(read_err("user"))?;

        if me.following.is_empty() {
            return Ok(following::Output { users: vec![] });
        }

        let query = UserQuery {
            ids: Some(me.following),
            name: case_insensitive(search.as_deref())?,
            ..Default::default()
        };

        self.user_repository
            .finds(query)
            .await
            .map_err(read_err("users"))?
            .let_(|users| following::Output { users })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{repos, seed_user};
    use super::*;
    use crate::auth::Principal;
    use crate::entities::UserId;
    use crate::repositories::{NotificationQuery, Repositories};
    use crate::usecases::user::{
        edit::Usecase as _, follow::Usecase as _, following::Usecase as _, people::Usecase as _,
        sign_in::Usecase as _, ProfileEdit,
    };

    fn follow_interactor(repos: &Repositories) -> UserFollowInteractor {
        UserFollowInteractor {
            user_repository: repos.users.clone(),
            notifier: Notifier {
                notification_repository: repos.notifications.clone(),
            },
        }
    }

    #[tokio::test]
    async fn sign_in_keeps_social_state() {
        let repos = repos();
        let interactor = UserSignInInteractor {
            user_repository: repos.users.clone(),
        };

        let out = interactor
            .handle(sign_in::Input {
                principal: Principal::named("u1", "Alice"),
            })
            .await
            .unwrap();
        assert!(out.created);

        repos
            .users
            .insert_follower(&"u1".into(), &"u2".into())
            .await
            .unwrap();

        let out = interactor
            .handle(sign_in::Input {
                principal: Principal::named("u1", "Alice B."),
            })
            .await
            .unwrap();
        assert!(!out.created);
        assert_eq!(out.user.display_name, "Alice B.");
        assert!(out.user.followers.contains(&UserId::from("u2")));
    }

    #[tokio::test]
    async fn follow_toggles_both_sides_and_notifies_once() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;
        let interactor = follow_interactor(&repos);

        let out = interactor
            .handle(follow::Input {
                actor: u1.clone(),
                target: u2.uid.clone(),
            })
            .await
            .unwrap();
        assert!(out.following);
        assert!(repos.users.find(&u2.uid).await.unwrap().followers.contains(&u1.uid));
        assert!(repos.users.find(&u1.uid).await.unwrap().following.contains(&u2.uid));

        let out = interactor
            .handle(follow::Input {
                actor: u1.clone(),
                target: u2.uid.clone(),
            })
            .await
            .unwrap();
        assert!(!out.following);
        assert!(repos.users.find(&u2.uid).await.unwrap().followers.is_empty());
        assert!(repos.users.find(&u1.uid).await.unwrap().following.is_empty());

        let notes = repos
            .notifications
            .finds(NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Follow);
        assert_eq!(notes[0].user_id, u2.uid);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;

        let res = follow_interactor(&repos)
            .handle(follow::Input {
                actor: u1.clone(),
                target: u1.uid.clone(),
            })
            .await;

        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn only_own_profile_is_editable() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        let u2 = seed_user(&repos, "u2", "Bob").await;
        let interactor = UserEditInteractor {
            user_repository: repos.users.clone(),
        };
        let bio = || ProfileEdit {
            bio: Some("hello".into()),
            ..Default::default()
        };

        let res = interactor
            .handle(edit::Input {
                actor: u1.clone(),
                user_id: u2.uid.clone(),
                mutation: bio(),
            })
            .await;
        assert!(matches!(res, Err(AppError::Forbidden(_))));

        let out = interactor
            .handle(edit::Input {
                actor: u1.clone(),
                user_id: u1.uid.clone(),
                mutation: bio(),
            })
            .await
            .unwrap();
        assert_eq!(out.user.bio.as_deref(), Some("hello"));
        assert_eq!(out.user.display_name, "Alice");
    }

    #[tokio::test]
    async fn people_and_following_search() {
        let repos = repos();
        let u1 = seed_user(&repos, "u1", "Alice").await;
        seed_user(&repos, "u2", "Bob").await;
        seed_user(&repos, "u3", "bobby").await;

        let people = UserPeopleInteractor {
            user_repository: repos.users.clone(),
        };
        let all = people
            .handle(people::Input {
                actor: u1.clone(),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(all.users.len(), 2);

        let bobs = people
            .handle(people::Input {
                actor: u1.clone(),
                search: Some("BOB".into()),
            })
            .await
            .unwrap();
        assert_eq!(bobs.users.len(), 2);

        let following = UserFollowingInteractor {
            user_repository: repos.users.clone(),
        };
        let none = following
            .handle(following::Input {
                actor: u1.clone(),
                search: None,
            })
            .await
            .unwrap();
        assert!(none.users.is_empty());

        follow_interactor(&repos)
            .handle(follow::Input {
                actor: u1.clone(),
                target: "u3".into(),
            })
            .await
            .unwrap();
        let found = following
            .handle(following::Input {
                actor: u1,
                search: Some("bob".into()),
            })
            .await
            .unwrap();
        let ids: Vec<_> = found.users.into_iter().map(|u| u.uid.0).collect();
        assert_eq!(ids, vec!["u3"]);
    }
}
