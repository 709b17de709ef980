use std::convert::TryFrom;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, TryStreamExt};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::{
    Acknowledgment, FindOptions, ReadConcern, TransactionOptions, WriteConcern,
};
use mongodb::{Client, ClientSession, Collection, Database};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::converters::{convert_404_or, convert_repo_err};
use super::type_convert::sort_doc;
use super::{spawn_snapshots, Fetch, Order, RepositoryError, Result as RepoResult, Subscription};
use crate::utils::LetChain;

pub async fn initialize_coll(coll_name: impl Into<Bson>, db: &Database) -> MongoResult<()> {
    db.run_command(
        doc! {
            "createIndexes": coll_name.into(),
            "indexes": [{
                "name": "unique_id",
                "key": {
                    "id": 1
                },
                "unique": true
            }],
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub async fn make_session(c: &Client) -> MongoResult<ClientSession> {
    let mut s = c
        .start_session(None)
        .instrument(tracing::trace_span!("start_session"))
        .await?;

    let ta_opt = TransactionOptions::builder()
        .read_concern(ReadConcern::snapshot())
        .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
        .build();
    s.start_transaction(ta_opt)
        .instrument(tracing::trace_span!("start_transaction"))
        .await?;

    Ok(s)
}

pub async fn process_transaction(s: &mut ClientSession) -> MongoResult<()> {
    loop {
        let r = s
            .commit_transaction()
            .instrument(tracing::trace_span!("commit_transaction"))
            .await;
        if let Err(ref e) = r {
            if e.contains_label(::mongodb::error::UNKNOWN_TRANSACTION_COMMIT_RESULT) {
                continue;
            }
        }

        break r;
    }
}

/// Applies `filter -> $set: set` to every matching document inside one transaction,
/// retried as a whole on transient failures.
pub async fn update_many_in_transaction<T>(
    coll: &Collection<T>,
    client: &Client,
    filter: Document,
    set: Document,
) -> RepoResult<u64> {
    async fn transaction<T>(
        coll: &Collection<T>,
        client: &Client,
        filter: &Document,
        set: &Document,
    ) -> MongoResult<u64> {
        let mut session = make_session(client).await?;

        let res = coll
            .update_many_with_session(
                filter.clone(),
                doc! { "$set": set.clone() },
                None,
                &mut session,
            )
            .instrument(tracing::trace_span!("update_many_with_session"))
            .await?;

        process_transaction(&mut session).await?;
        Ok(res.modified_count)
    }

    loop {
        let r = transaction(coll, client, &filter, &set).await;
        if let Err(ref e) = r {
            if e.contains_label(::mongodb::error::TRANSIENT_TRANSACTION_ERROR) {
                continue;
            }
        }

        break r.let_(convert_repo_err);
    }
}

pub async fn get_one<T>(coll: &Collection<T>, id: impl Into<Bson>) -> RepoResult<T>
where T: Sync + Send + Unpin + ::serde::de::DeserializeOwned {
    let res = coll
        .find_one(doc! { "id": id.into() }, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)?;

    Ok(res)
}

pub async fn find_many<M, T>(
    coll: &Collection<M>,
    filter: Document,
    order: Option<Order>,
) -> RepoResult<Vec<T>>
where
    M: Sync + Send + Unpin + ::serde::de::DeserializeOwned,
    T: TryFrom<M, Error = RepositoryError>,
{
    let opts = order.map(|o| FindOptions::builder().sort(sort_doc(o)).build());

    coll.find(filter, opts)
        .instrument(tracing::trace_span!("find"))
        .await
        .let_(convert_repo_err)?
        .try_collect::<Vec<_>>()
        .await
        .let_(convert_repo_err)?
        .into_iter()
        .map(T::try_from)
        .collect()
}

#[derive(Clone, Copy)]
pub enum ModifyOpTy {
    Push,
    Pull,
}

/// `$addToSet` / `$pull` on one array field. `Ok(false)` when the set was already in shape.
pub async fn modify_set<T>(
    name: impl AsRef<str>,
    coll: &Collection<T>,
    id: impl Into<Bson>,
    target: impl Into<Bson>,
    ty: ModifyOpTy,
) -> RepoResult<bool> {
    let operation = match ty {
        ModifyOpTy::Push => "$addToSet",
        ModifyOpTy::Pull => "$pull",
    };

    let res = coll
        .update_one(
            doc! { "id": id.into() },
            doc! { operation: { name.as_ref(): target.into() } },
            None,
        )
        .instrument(tracing::trace_span!("update_one"))
        .await
        .let_(convert_repo_err)?;

    if res.matched_count == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(res.modified_count > 0)
}

/// Bumps the returned counter on every change-stream event of `coll`.
///
/// The sender is dropped when the stream fails, which ends every live query on it.
pub fn spawn_change_feed<T>(coll: &Collection<T>) -> (watch::Receiver<u64>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(0);
    let coll = coll.clone_with_type::<Document>();

    let handle = tokio::spawn(async move {
        let mut stream = match coll.watch(None, None).await {
            Ok(s) => s,
            Err(e) => return tracing::error!("cannot open change stream on `{}`: {}", coll.name(), e),
        };

        while let Some(event) = stream.next().await {
            match event {
                Ok(_) => tx.send_modify(|rev| *rev += 1),
                Err(e) => {
                    tracing::error!("change stream on `{}` failed: {}", coll.name(), e);
                    break;
                },
            }
        }
    });

    (rx, handle)
}

pub fn live<M, T>(
    coll: &Collection<M>,
    changes: watch::Receiver<u64>,
    filter: Document,
    order: Order,
) -> Subscription<T>
where
    M: Sync + Send + Unpin + ::serde::de::DeserializeOwned + 'static,
    T: TryFrom<M, Error = RepositoryError> + Send + 'static,
{
    let coll = coll.clone();
    let fetch: Fetch<T> = Arc::new(move || {
        let coll = coll.clone();
        let filter = filter.clone();
        async move { find_many(&coll, filter, Some(order)).await }.boxed()
    });

    spawn_snapshots(changes, fetch)
}
