use std::{sync::Arc, time::Duration};

use crate::events::EventChannel;
use crate::scheduler::{DeferredCall, Scheduler, TimerId};

use super::capability::ArCapability;
use super::state::{
    Availability, SessionAttempt, SessionSnapshot, SessionState, SessionStateChanged,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound for one attempt, covering both the availability check and
    /// the reference-library load.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingAvailability,
    LoadingLibrary,
}

/// Brings the AR capability to a usable state, one attempt at a time.
pub struct SessionStateMachine {
    capability: Box<dyn ArCapability>,
    scheduler: Arc<dyn Scheduler>,
    config: SessionConfig,
    state: SessionState,
    phase: Phase,
    attempt: Option<SessionAttempt>,
    poll: Option<DeferredCall>,
    timeout: Option<DeferredCall>,
    tracking_enabled: bool,
    state_changed: EventChannel<SessionStateChanged>,
}

impl SessionStateMachine {
    pub fn new(
        capability: Box<dyn ArCapability>,
        scheduler: Arc<dyn Scheduler>,
        config: SessionConfig,
    ) -> Self {
        Self {
            capability,
            scheduler,
            config,
            state: SessionState::Initializing,
            phase: Phase::Idle,
            attempt: None,
            poll: None,
            timeout: None,
            tracking_enabled: true,
            state_changed: EventChannel::new(),
        }
    }

    pub fn state_changed(&self) -> &EventChannel<SessionStateChanged> {
        &self.state_changed
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt(&self) -> Option<&SessionAttempt> {
        self.attempt.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            attempt: self.attempt.clone(),
            tracking_enabled: self.tracking_enabled,
        }
    }

    /// Starts a new attempt. Any attempt still in flight is abandoned.
    pub fn initialize(&mut self) {
        self.cancel_pending();

        let attempt = SessionAttempt::begin();
        log_info!(
            "AR session attempt {} started (timeout {:?})",
            attempt.id,
            self.config.timeout
        );
        self.attempt = Some(attempt);
        self.set_state(SessionState::Initializing);

        self.phase = Phase::AwaitingAvailability;
        self.timeout = Some(self.scheduler.schedule(self.config.timeout));
        self.evaluate();
    }

    pub fn restart(&mut self) {
        log_info!("restarting AR session from {}", self.state.as_str());
        self.cancel_pending();
        self.phase = Phase::Idle;
        self.capability.reset();
        self.initialize();
    }

    /// Forwarded straight to the capability; the session state is untouched.
    pub fn toggle_tracking(&mut self, enabled: bool) {
        self.tracking_enabled = enabled;
        self.capability.set_tracking_enabled(enabled);
        log_debug!("image tracking {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Returns `true` when `id` belonged to this machine.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.poll.as_ref().map(DeferredCall::id) == Some(id) {
            self.poll = None;
            self.evaluate();
            return true;
        }

        if self.timeout.as_ref().map(DeferredCall::id) == Some(id) {
            self.timeout = None;
            if self.phase != Phase::Idle {
                log_warn!(
                    "AR session did not become ready within {:?}",
                    self.config.timeout
                );
                self.finish(SessionState::Failed);
            }
            return true;
        }

        false
    }

    fn evaluate(&mut self) {
        match self.phase {
            Phase::Idle => {}
            Phase::AwaitingAvailability => match self.capability.availability() {
                Availability::NotDetermined => self.schedule_poll(),
                Availability::Unsupported => {
                    log_warn!("AR is not supported on this device");
                    self.finish(SessionState::Unsupported);
                }
                Availability::Determined => {
                    if self.capability.needs_reference_library() {
                        log_debug!("loading reference image library");
                        self.capability.begin_reference_library_load();
                        self.phase = Phase::LoadingLibrary;
                        self.evaluate();
                    } else {
                        self.finish(SessionState::Ready);
                    }
                }
            },
            Phase::LoadingLibrary => {
                if self.capability.reference_library_loaded() {
                    self.finish(SessionState::Ready);
                } else {
                    self.schedule_poll();
                }
            }
        }
    }

    fn schedule_poll(&mut self) {
        if let Some(previous) = self.poll.take() {
            previous.cancel();
        }
        self.poll = Some(self.scheduler.schedule(self.config.poll_interval));
    }

    fn finish(&mut self, state: SessionState) {
        self.cancel_pending();
        self.phase = Phase::Idle;
        self.set_state(state);
    }

    fn cancel_pending(&mut self) {
        for call in [self.poll.take(), self.timeout.take()].into_iter().flatten() {
            call.cancel();
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        log_info!("AR session state -> {}", state.as_str());
        self.state_changed.emit(&SessionStateChanged {
            state,
            attempt_id: self.attempt.as_ref().map(|a| a.id.clone()),
        });
    }
}
