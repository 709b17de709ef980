use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{watch, Mutex};

use super::super::{spawn_snapshots, Fetch, Order, RepositoryError, Result as RepoResult, Subscription};
use crate::entities::Date;

pub fn find_mut<T, P>(v: &mut [T], preficate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let mut res = v.iter_mut().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn find_ref<T, P>(v: &[T], preficate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let mut res = v.iter().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

/// Stable, so equal timestamps keep insertion order.
pub fn sort_by_created<T>(v: &mut [T], order: Order, created: impl Fn(&T) -> Date) {
    match order {
        Order::Ascending => v.sort_by_key(|i| created(i)),
        Order::Descending => v.sort_by(|a, b| created(b).cmp(&created(a))),
    }
}

/// Standing query over a shared vector: `select` is re-run after every change.
pub fn live<T, Q>(
    items: &Arc<Mutex<Vec<T>>>,
    changes: watch::Receiver<u64>,
    query: Q,
    select: fn(&[T], &Q) -> Vec<T>,
) -> Subscription<T>
where
    T: Sync + Send + 'static,
    Q: Clone + Sync + Send + 'static,
{
    let items = items.clone();
    let fetch: Fetch<T> = Arc::new(move || {
        let items = items.clone();
        let query = query.clone();
        async move { Ok(select(&items.lock().await, &query)) }.boxed()
    });

    spawn_snapshots(changes, fetch)
}
