//! Synchronous observer lists used for every notification the core raises.
//!
//! Callbacks run on the emitting thread, in registration order, before
//! `emit` returns. A callback may unsubscribe itself or any other callback
//! while an emission is in flight; an unsubscribed callback is never invoked
//! again, even later in the same emission.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, TryLockError,
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E) + Send>;

struct Subscriber<E> {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    callback: Arc<Mutex<Callback<E>>>,
}

struct ChannelInner<E> {
    next_id: u64,
    subscribers: Vec<Subscriber<E>>,
}

/// Cloneable handle to a list of callbacks for one event type.
pub struct EventChannel<E> {
    inner: Arc<Mutex<ChannelInner<E>>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventChannel<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelInner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let mut guard = self.lock();
        let id = SubscriptionId(guard.next_id);
        guard.next_id += 1;
        guard.subscribers.push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(Mutex::new(Box::new(callback))),
        });
        id
    }

    /// Returns `false` when `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self.lock();
        match guard.subscribers.iter().position(|s| s.id == id) {
            Some(index) => {
                let removed = guard.subscribers.remove(index);
                removed.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn emit(&self, event: &E) {
        // Snapshot so callbacks can (un)subscribe without deadlocking on the list.
        let snapshot: Vec<(Arc<AtomicBool>, Arc<Mutex<Callback<E>>>)> = self
            .lock()
            .subscribers
            .iter()
            .map(|s| (Arc::clone(&s.active), Arc::clone(&s.callback)))
            .collect();

        for (active, callback) in snapshot {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            match callback.try_lock() {
                Ok(mut cb) => (*cb)(event),
                Err(TryLockError::Poisoned(poisoned)) => {
                    let mut cb = poisoned.into_inner();
                    (*cb)(event)
                }
                // Re-entrant emission reached a callback that is still running.
                Err(TryLockError::WouldBlock) => {
                    log_warn!("skipping re-entrant delivery to a busy event callback");
                }
            }
        }
    }
}
