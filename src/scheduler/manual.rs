use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{DeferredCall, Scheduler, TimerId};

struct Pending {
    due: Duration,
    id: TimerId,
    token: CancellationToken,
}

struct ManualState {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

/// Virtual-clock scheduler. Time only moves when [`ManualScheduler::advance`]
/// is called, which makes timeout and auto-advance behaviour reproducible.
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                next_id: 1,
                pending: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Calls that are neither cancelled nor fired yet.
    pub fn pending_count(&self) -> usize {
        self.lock()
            .pending
            .iter()
            .filter(|p| !p.token.is_cancelled())
            .count()
    }

    /// Moves the clock forward by `by`, handing every call that comes due to
    /// `on_fire` in due order. Calls scheduled from inside `on_fire` fire in
    /// the same advance when they fall due before the new time.
    pub fn advance<F>(&self, by: Duration, mut on_fire: F)
    where
        F: FnMut(TimerId),
    {
        let deadline = self.now() + by;
        loop {
            let next = {
                let mut state = self.lock();
                state.pending.retain(|p| !p.token.is_cancelled());
                let candidate = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= deadline)
                    .min_by_key(|(_, p)| (p.due, p.id))
                    .map(|(index, _)| index);
                candidate.map(|index| {
                    let fired = state.pending.remove(index);
                    state.now = fired.due;
                    fired.id
                })
            };
            match next {
                Some(id) => on_fire(id),
                None => break,
            }
        }
        self.lock().now = deadline;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration) -> DeferredCall {
        let mut state = self.lock();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let token = CancellationToken::new();
        let due = state.now + delay;
        state.pending.push(Pending {
            due,
            id,
            token: token.clone(),
        });
        DeferredCall::new(id, token)
    }
}
