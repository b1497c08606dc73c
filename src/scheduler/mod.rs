//! Cancellable deferred calls.
//!
//! Components never sleep. They ask a [`Scheduler`] for a [`DeferredCall`],
//! remember its [`TimerId`], and react when the owner of the scheduler hands
//! that id back through their `on_timer` entry point. Ids that no longer
//! match the component's pending call are stale and must be ignored.

mod manual;
mod tokio_scheduler;

pub use manual::ManualScheduler;
pub use tokio_scheduler::TokioScheduler;

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Handle to one scheduled firing.
#[derive(Debug)]
pub struct DeferredCall {
    id: TimerId,
    token: CancellationToken,
}

impl DeferredCall {
    pub(crate) fn new(id: TimerId, token: CancellationToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration) -> DeferredCall;
}
