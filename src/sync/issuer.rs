use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::Result;

/// What happens to a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Log,
    Notify,
}

#[derive(Debug, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// Refused because a previous call is still outstanding.
    Busy,
    /// Carries the notice text under [`FailurePolicy::Notify`].
    Failed(Option<String>),
}

impl<T> Outcome<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(t) => Some(t),
            _ => None,
        }
    }
}

/// Fire-and-forget mutations behind a pending flag.
///
/// No prediction is applied locally; the next snapshot of whatever live view
/// shows the target carries the change. No retry.
#[derive(Debug)]
pub struct Issuer {
    label: &'static str,
    policy: FailurePolicy,
    pending: AtomicBool,
}

struct Pending<'a>(&'a AtomicBool);

impl Drop for Pending<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

impl Issuer {
    pub fn new(label: &'static str, policy: FailurePolicy) -> Self {
        Self {
            label,
            policy,
            pending: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool { self.pending.load(Ordering::Acquire) }

    #[tracing::instrument(skip(self, mutation), fields(label = self.label))]
    pub async fn issue<T, F>(&self, mutation: F) -> Outcome<T>
    where F: Future<Output = Result<T>> {
        if self.pending.swap(true, Ordering::AcqRel) {
            tracing::debug!("refused, still pending");
            return Outcome::Busy;
        }
        let _pending = Pending(&self.pending);

        match mutation.await {
            Ok(t) => Outcome::Done(t),
            Err(e) => match self.policy {
                FailurePolicy::Log => {
                    tracing::error!("{} failed: {}", self.label, e);
                    Outcome::Failed(None)
                },
                FailurePolicy::Notify => {
                    tracing::warn!("{} failed: {}", self.label, e);
                    Outcome::Failed(Some(e.notice()))
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::errors::AppError;

    #[tokio::test]
    async fn second_issue_while_pending_is_refused() {
        let issuer = Issuer::new("like", FailurePolicy::Log);
        let (tx, rx) = oneshot::channel::<()>();

        let first = issuer.issue(async move {
            rx.await.ok();
            Ok(1)
        });
        let second = async {
            tokio::task::yield_now().await;
            assert!(issuer.is_pending());
            let refused = issuer.issue(async { Ok(2) }).await;
            tx.send(()).ok();
            refused
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, Outcome::Done(1));
        assert_eq!(second, Outcome::Busy);
        assert!(!issuer.is_pending());
    }

    #[tokio::test]
    async fn failures_follow_policy() {
        let logged = Issuer::new("follow", FailurePolicy::Log);
        let out: Outcome<()> = logged
            .issue(async { Err(AppError::Validation("nope".into())) })
            .await;
        assert_eq!(out, Outcome::Failed(None));

        let notified = Issuer::new("post", FailurePolicy::Notify);
        let out: Outcome<()> = notified
            .issue(async { Err(AppError::Validation("Post cannot be empty".into())) })
            .await;
        assert_eq!(out, Outcome::Failed(Some("Post cannot be empty".into())));
        assert!(!notified.is_pending());
    }
}
