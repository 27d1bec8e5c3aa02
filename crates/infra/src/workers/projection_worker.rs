use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use echoledger_core::AssetId;
use echoledger_events::{AssetScoped, EventBus, Subscription};

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request shutdown and wait for the worker thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Thread that feeds bus messages into an idempotent handler.
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Subscribe to `bus` and spawn the worker thread.
    ///
    /// The subscription is taken before this returns, so no message published
    /// afterwards is missed. With `asset_id` set, other assets' messages are
    /// skipped.
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: B,
        asset_id: Option<AssetId>,
        mut handler: H,
    ) -> io::Result<WorkerHandle>
    where
        M: AssetScoped + Send + 'static,
        B: EventBus<M> + Send + Sync + 'static,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, asset_id, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    asset_id: Option<AssetId>,
    handler: &mut H,
) where
    M: AssetScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(100);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => {
                if asset_id.is_some_and(|a| msg.asset_id() != a) {
                    continue;
                }
                if let Err(err) = handler(msg) {
                    warn!(worker = name, error = ?err, "projection worker handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(worker = name, "projection worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc::channel;

    use echoledger_events::{EventEnvelope, InMemoryEventBus};
    use uuid::Uuid;

    fn envelope(asset_id: AssetId, seq: u64) -> EventEnvelope<u64> {
        EventEnvelope::new(Uuid::now_v7(), asset_id, "test", seq, seq)
    }

    #[test]
    fn delivers_only_the_pinned_asset() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<u64>>> = Arc::new(InMemoryEventBus::new());
        let (seen_tx, seen_rx) = channel();
        let (mine, other) = (AssetId::new(), AssetId::new());

        let handle = ProjectionWorker::spawn("test-worker", bus.clone(), Some(mine), move |env: EventEnvelope<u64>| {
            seen_tx.send(*env.payload()).map_err(|e| e.to_string())
        })
        .unwrap();

        bus.publish(envelope(other, 1)).unwrap();
        bus.publish(envelope(mine, 7)).unwrap();

        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
        assert!(seen_rx.recv_timeout(Duration::from_millis(200)).is_err());
        handle.shutdown();
    }
}
