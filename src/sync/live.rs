use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::repositories::Subscription;

/// What a view does when its subscription fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log and stop updating; the last snapshot stays in place.
    Silent,
    /// Log, stop updating and expose the given text through [`ViewState::error`].
    Surface(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            items: vec![],
            loading: true,
            error: None,
        }
    }
}

type Keep<T> = Box<dyn Fn(&T) -> bool + Sync + Send>;

/// Local mirror of a standing query.
///
/// Every pushed snapshot replaces `items` wholesale. Dropping the view drops
/// the subscription with it.
pub struct LiveView<T> {
    state: Arc<RwLock<ViewState<T>>>,
    revision: watch::Receiver<u64>,
    task: Option<JoinHandle<()>>,
}

impl<T> LiveView<T>
where T: Clone + Sync + Send + 'static
{
    pub fn spawn(sub: Subscription<T>, policy: ErrorPolicy) -> Self {
        Self::spawn_filtered(sub, policy, |_| true)
    }

    /// Like [`LiveView::spawn`], keeping only the items `keep` accepts from each snapshot.
    pub fn spawn_filtered(
        mut sub: Subscription<T>,
        policy: ErrorPolicy,
        keep: impl Fn(&T) -> bool + Sync + Send + 'static,
    ) -> Self {
        let keep: Keep<T> = Box::new(keep);
        let state = Arc::new(RwLock::new(ViewState::default()));
        let (tx, revision) = watch::channel(0);

        let shared = state.clone();
        let task = tokio::spawn(async move {
            while let Some(pushed) = sub.next().await {
                let stop = {
                    let mut s = shared.write().await;
                    s.loading = false;

                    match pushed {
                        Ok(items) => {
                            s.items = items.into_iter().filter(|i| keep(i)).collect();
                            false
                        },
                        Err(e) => {
                            tracing::error!("live query failed: {}", e);
                            if let ErrorPolicy::Surface(text) = policy {
                                s.error = Some(text.to_string());
                            }
                            true
                        },
                    }
                };

                tx.send_modify(|rev| *rev += 1);

                if stop {
                    break;
                }
            }
        });

        Self {
            state,
            revision,
            task: Some(task),
        }
    }

    /// A view that never loads, carrying `error` from the start.
    pub fn failed(error: impl Into<String>) -> Self {
        let state = ViewState {
            items: vec![],
            loading: false,
            error: Some(error.into()),
        };
        let (_, revision) = watch::channel(0);

        Self {
            state: Arc::new(RwLock::new(state)),
            revision,
            task: None,
        }
    }

    pub async fn state(&self) -> ViewState<T> { self.state.read().await.clone() }

    pub async fn items(&self) -> Vec<T> { self.state.read().await.items.clone() }

    /// Waits for the next applied snapshot (or failure). `false` once the view is finished.
    pub async fn changed(&mut self) -> bool { self.revision.changed().await.is_ok() }

    /// Waits until the view holds its first snapshot, then returns the state.
    pub async fn settled(&mut self) -> ViewState<T> {
        loop {
            {
                let s = self.state.read().await;
                if !s.loading {
                    return s.clone();
                }
            }

            if !self.changed().await {
                return self.state().await;
            }
        }
    }
}

impl<T> Drop for LiveView<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> ::std::fmt::Debug for LiveView<T> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.debug_struct("LiveView")
            .field("revision", &*self.revision.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use futures::FutureExt;

    use super::*;
    use crate::entities::{Message, UserId};
    use crate::repositories::mock::InMemoryRepository;
    use crate::repositories::{
        spawn_snapshots, Fetch, MessageQuery, MessageRepository, RepositoryError,
    };

    fn msg(from: &str, to: &str, text: &str) -> Message {
        Message::between(from.into(), to.into(), text.into(), Utc::now())
    }

    #[tokio::test]
    async fn replaces_items_on_every_snapshot() {
        let repo = InMemoryRepository::<Message>::new();
        repo.insert(msg("u1", "u2", "first")).await.unwrap();

        let sub = repo.subscribe(MessageQuery::default()).await.unwrap();
        let mut view = LiveView::spawn(sub, ErrorPolicy::Silent);

        let s = view.settled().await;
        assert_eq!(s.items.len(), 1);
        assert!(s.error.is_none());

        repo.insert(msg("u2", "u1", "second")).await.unwrap();
        while view.items().await.len() < 2 {
            assert!(view.changed().await);
        }

        let texts: Vec<_> = view.items().await.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn filter_applies_to_each_snapshot() {
        let repo = InMemoryRepository::<Message>::new();
        repo.insert(msg("u1", "u2", "to u2")).await.unwrap();
        repo.insert(msg("u1", "u3", "to u3")).await.unwrap();

        let query = MessageQuery {
            participant: Some("u1".into()),
            ..Default::default()
        };
        let sub = repo.subscribe(query).await.unwrap();
        let (a, b): (UserId, UserId) = ("u1".into(), "u3".into());
        let mut view = LiveView::spawn_filtered(sub, ErrorPolicy::Silent, move |m: &Message| {
            m.is_between(&a, &b)
        });

        let s = view.settled().await;
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].text, "to u3");
    }

    /// First fetch yields `[1, 2]`, every later one fails.
    fn fails_after_first(calls: Arc<AtomicUsize>) -> Fetch<u32> {
        Arc::new(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Ok(vec![1, 2]),
                    _ => Err(RepositoryError::Internal(anyhow!("connection reset"))),
                }
            }
            .boxed()
        })
    }

    /// Runs a view until its subscription fails, then pokes the feed again.
    async fn run_until_failure(policy: ErrorPolicy) -> (ViewState<u32>, usize) {
        let (tx, rx) = watch::channel(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let sub = spawn_snapshots(rx, fails_after_first(calls.clone()));
        let mut view = LiveView::spawn(sub, policy);

        assert_eq!(view.settled().await.items, vec![1, 2]);

        tx.send_modify(|rev| *rev += 1);
        while view.changed().await {}
        let failed = view.state().await;

        tx.send_modify(|rev| *rev += 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(view.state().await, failed);

        (failed, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn silent_failure_keeps_last_snapshot() {
        let (state, calls) = run_until_failure(ErrorPolicy::Silent).await;

        assert_eq!(state.items, vec![1, 2]);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn surfaced_failure_sets_error_text() {
        let policy = ErrorPolicy::Surface("Failed to load messages");
        let (state, calls) = run_until_failure(policy).await;

        assert_eq!(state.items, vec![1, 2]);
        assert_eq!(state.error.as_deref(), Some("Failed to load messages"));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn failed_view_surfaces_its_error() {
        let mut view = LiveView::<Message>::failed("Group not found");
        let s = view.settled().await;

        assert!(!s.loading);
        assert_eq!(s.error.as_deref(), Some("Group not found"));
        assert!(!tokio::time::timeout(Duration::from_millis(50), view.changed())
            .await
            .unwrap_or(false));
    }
}
