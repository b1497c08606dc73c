use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{DeferredCall, Scheduler, TimerId};

/// Spawns one sleeping task per deferred call and reports firings on a channel.
///
/// Must be used from inside a tokio runtime. The receiver returned by
/// [`TokioScheduler::new`] belongs to whoever owns the components, so firings
/// are applied on the same task as every other mutation.
pub struct TokioScheduler {
    next_id: AtomicU64,
    fired_tx: mpsc::UnboundedSender<TimerId>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                next_id: AtomicU64::new(1),
                fired_tx,
            },
            fired_rx,
        )
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration) -> DeferredCall {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        let token_clone = token.clone();
        let fired_tx = self.fired_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the runtime loop already shut down.
                    let _ = fired_tx.send(id);
                }
                _ = token_clone.cancelled() => {}
            }
        });

        DeferredCall::new(id, token)
    }
}
