//! Bridge actor carrying metrics snapshots out of the actor system.
//!
//! The runner is not an actor; it asks the metrics aggregator to publish
//! and receives the broadcast `MetricsReport` here, forwarded over an mpsc
//! channel.

use acton_reactive::prelude::*;
use tokio::sync::mpsc;

use carpark_kernel::messages::MetricsReport;
use carpark_kernel::MetricsSnapshot;

/// State for the snapshot bridge actor.
#[derive(Default, Clone)]
pub struct SnapshotBridgeState {
    /// Channel sender for forwarding snapshots
    pub tx: Option<mpsc::Sender<MetricsSnapshot>>,
}

impl std::fmt::Debug for SnapshotBridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBridgeState")
            .field("has_tx", &self.tx.is_some())
            .finish()
    }
}

/// Actor that receives `MetricsReport` broadcasts and forwards the
/// snapshot to a channel for the harness to receive.
pub struct SnapshotBridge {
    tx: mpsc::Sender<MetricsSnapshot>,
}

impl SnapshotBridge {
    pub fn new(tx: mpsc::Sender<MetricsSnapshot>) -> Self {
        Self { tx }
    }

    /// Spawn the bridge in the runtime.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<SnapshotBridgeState>("SnapshotBridge".to_string());

        actor.model.tx = Some(self.tx);

        // Subscribe to the broadcast BEFORE starting
        actor.handle().subscribe::<MetricsReport>().await;

        actor.act_on::<MetricsReport>(|actor, context| {
            let snapshot = context.message().snapshot.clone();
            let tx = actor.model.tx.clone();

            Reply::pending(async move {
                if let Some(tx) = tx {
                    // Ignore send errors - receiver may have been dropped
                    let _ = tx.send(snapshot).await;
                }
            })
        });

        actor.start().await
    }
}
