use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use lab_sync_core::collection::LiveCollection;
use lab_sync_core::record::model::Record;

use crate::backend::TableClient;
use crate::subscription::Subscriptions;

/// An always-current mirror of one backend table, opened when a view mounts
/// and closed when it unmounts.
///
/// Opening subscribes to the change feed first and then performs the initial
/// fetch, so nothing slips between the two; the idempotent-by-id reconciler
/// absorbs any overlap. A fetch failure is logged and degrades to an empty
/// collection — the view renders "no records" rather than crashing.
///
/// The collection itself lives inside the apply task and is published to
/// observers as immutable snapshots over a `watch` channel, so there is no
/// shared setter for a stale in-flight continuation to misfire against.
pub struct LiveView<R> {
    snapshot: watch::Receiver<Vec<R>>,
    apply: JoinHandle<()>,
}

impl<R: Record> LiveView<R> {
    pub async fn open(client: TableClient<R>, subscriptions: &Subscriptions) -> Self {
        let mut subscription = subscriptions.subscribe(R::TABLE);

        let initial = match client.fetch_all().await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(table = R::TABLE, error = %err, "initial fetch failed, starting empty");
                Vec::new()
            }
        };
        let mut collection = LiveCollection::from_fetch(initial);
        let (publish, snapshot) = watch::channel(collection.records().to_vec());

        let apply = tokio::spawn(async move {
            loop {
                match subscription.recv().await {
                    Ok(event) => {
                        match event.op.decode::<R>() {
                            Ok(change) => {
                                collection.apply(change);
                                if publish.send(collection.records().to_vec()).is_err() {
                                    break;
                                }
                            }
                            // A malformed event must not poison the view.
                            Err(err) => {
                                tracing::warn!(table = R::TABLE, error = %err, "skipping undecodable change event");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Gap repair is the hosted backend's concern; we
                        // stay eventually consistent on what still arrives.
                        tracing::warn!(table = R::TABLE, missed, "change events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self { snapshot, apply }
    }

    /// Current records, newest first.
    pub fn records(&self) -> Vec<R> {
        self.snapshot.borrow().clone()
    }

    /// A rendering layer's handle: observe snapshots without knowing about
    /// network timing or change events.
    pub fn watch(&self) -> watch::Receiver<Vec<R>> {
        self.snapshot.clone()
    }

    /// Wait for the next snapshot. Returns `false` once the view is closed.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }

    /// Stop applying change events and release the table subscription.
    /// Waits for the apply task to wind down, so once this returns no
    /// further snapshot can be published for this view — an in-flight poll
    /// that outlives the abort call finishes before we do.
    pub async fn close(&mut self) {
        self.apply.abort();
        // Cancellation surfaces as a JoinError; nothing to do with it.
        let _ = (&mut self.apply).await;
    }
}

impl<R> Drop for LiveView<R> {
    fn drop(&mut self) {
        self.apply.abort();
    }
}
