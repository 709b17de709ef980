use lazy_static::lazy_static;
use regex::Regex;

use crate::entities::UserId;
use crate::errors::{AppError, Result};

/// The signed-in identity handed over by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId(uid.into()),
            display_name: None,
            photo_url: None,
            email: None,
        }
    }

    pub fn named(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::new(uid)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    principal: Option<Principal>,
}

impl Session {
    pub fn sign_in(&mut self, principal: Principal) { self.principal = Some(principal); }

    pub fn sign_out(&mut self) -> Option<Principal> { self.principal.take() }

    pub fn current(&self) -> Option<&Principal> { self.principal.as_ref() }

    pub fn require(&self) -> Result<&Principal> {
        self.principal.as_ref().ok_or(AppError::Unauthenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

lazy_static! {
    static ref PROTECTED: Regex =
        Regex::new(r"^/(feed|create-post|messages|people|notifications|profile|posts|settings)(/|$)")
            .unwrap();
}

fn is_asset(path: &str) -> bool {
    ["/_next/", "/api/", "/static/"]
        .iter()
        .any(|p| path.starts_with(p))
        || path.contains('.')
}

/// Decides whether `path` may be shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard {
    pub maintenance: bool,
}

impl RouteGuard {
    pub fn check(&self, path: &str, session: &Session) -> Access {
        if self.maintenance && path != "/" && !is_asset(path) {
            return Access::Redirect("/");
        }

        if PROTECTED.is_match(path) && session.current().is_none() {
            return Access::Redirect("/login");
        }

        Access::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_pages_need_a_session() {
        let guard = RouteGuard::default();
        let mut session = Session::default();

        assert_eq!(guard.check("/feed", &session), Access::Redirect("/login"));
        assert_eq!(guard.check("/messages/u2", &session), Access::Redirect("/login"));
        assert_eq!(guard.check("/login", &session), Access::Allow);
        assert_eq!(guard.check("/feedback", &session), Access::Allow);

        session.sign_in(Principal::new("u1"));
        assert_eq!(guard.check("/feed", &session), Access::Allow);
        assert_eq!(guard.check("/profile/u2", &session), Access::Allow);
    }

    #[test]
    fn maintenance_sends_everything_home() {
        let guard = RouteGuard { maintenance: true };
        let mut session = Session::default();
        session.sign_in(Principal::new("u1"));

        assert_eq!(guard.check("/feed", &session), Access::Redirect("/"));
        assert_eq!(guard.check("/", &session), Access::Allow);
        assert_eq!(guard.check("/static/logo.png", &session), Access::Allow);
        assert_eq!(guard.check("/favicon.ico", &session), Access::Allow);
    }

    #[test]
    fn require_fails_without_principal() {
        let mut session = Session::default();
        assert!(matches!(session.require(), Err(AppError::Unauthenticated)));

        session.sign_in(Principal::named("u1", "Alice"));
        assert_eq!(session.require().unwrap().uid, UserId::from("u1"));
        assert!(session.sign_out().is_some());
        assert!(session.current().is_none());
    }
}
