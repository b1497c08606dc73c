use std::sync::Arc;

use serde::Serialize;

use crate::events::EventChannel;
use crate::models::InstructionStep;
use crate::scheduler::{DeferredCall, Scheduler, TimerId};

use super::content::ContentSource;
use super::presenter::StepPresenter;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepChanged {
    pub device_id: String,
    pub step_index: usize,
    pub step: InstructionStep,
}

/// `current` is 1-based for display; a zero-step sequence reports `0 / 0`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressChanged {
    pub device_id: String,
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationCursor {
    pub device_id: String,
    /// `None` until the first step is entered.
    pub position: Option<usize>,
}

impl NavigationCursor {
    /// The position with `-1` standing for "not started".
    pub fn step_index(&self) -> i64 {
        self.position.map(|p| p as i64).unwrap_or(-1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Walks the ordered steps of the current device.
pub struct InstructionWalker {
    content: Arc<dyn ContentSource>,
    presenter: Box<dyn StepPresenter>,
    scheduler: Arc<dyn Scheduler>,
    cursor: Option<NavigationCursor>,
    steps: Arc<[InstructionStep]>,
    auto_advance: Option<DeferredCall>,
    step_changed: EventChannel<StepChanged>,
    progress_changed: EventChannel<ProgressChanged>,
}

impl InstructionWalker {
    pub fn new(
        content: Arc<dyn ContentSource>,
        presenter: Box<dyn StepPresenter>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            content,
            presenter,
            scheduler,
            cursor: None,
            steps: Arc::from(Vec::new()),
            auto_advance: None,
            step_changed: EventChannel::new(),
            progress_changed: EventChannel::new(),
        }
    }

    pub fn step_changed(&self) -> &EventChannel<StepChanged> {
        &self.step_changed
    }

    pub fn progress_changed(&self) -> &EventChannel<ProgressChanged> {
        &self.progress_changed
    }

    pub fn cursor(&self) -> Option<&NavigationCursor> {
        self.cursor.as_ref()
    }

    pub fn current_device(&self) -> Option<&str> {
        self.cursor.as_ref().map(|c| c.device_id.as_str())
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> Option<&InstructionStep> {
        let position = self.cursor.as_ref()?.position?;
        self.steps.get(position)
    }

    pub fn progress(&self) -> Option<Progress> {
        let cursor = self.cursor.as_ref()?;
        Some(Progress {
            current: cursor.position.map(|p| p + 1).unwrap_or(0),
            total: self.steps.len(),
        })
    }

    pub fn has_pending_auto_advance(&self) -> bool {
        self.auto_advance.is_some()
    }

    /// Starts the walkthrough for `device_id` unless that device is already
    /// mid-walkthrough, in which case a transient re-detection changes nothing.
    pub fn on_device_recognized(&mut self, device_id: &str) {
        if let Some(cursor) = &self.cursor {
            if cursor.device_id == device_id && cursor.position.is_some() {
                log_debug!("{} re-recognized mid-walkthrough; keeping step", device_id);
                return;
            }
        }

        self.cancel_auto_advance();
        self.deactivate_current();

        self.steps = self.content.steps(device_id);
        self.cursor = Some(NavigationCursor {
            device_id: device_id.to_string(),
            position: None,
        });
        log_info!(
            "walkthrough bound to {} ({} steps)",
            device_id,
            self.steps.len()
        );

        if self.steps.is_empty() {
            log_warn!("no instruction content for {}", device_id);
            self.progress_changed.emit(&ProgressChanged {
                device_id: device_id.to_string(),
                current: 0,
                total: 0,
            });
            return;
        }

        self.next_step();
    }

    pub fn next_step(&mut self) {
        let Some(target) = self.target(Direction::Forward) else {
            return;
        };
        self.move_to(target, Direction::Forward);
    }

    pub fn previous_step(&mut self) {
        let Some(target) = self.target(Direction::Backward) else {
            return;
        };
        self.move_to(target, Direction::Backward);
    }

    /// Returns `true` when `id` was this walker's pending auto-advance.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.auto_advance.as_ref().map(DeferredCall::id) != Some(id) {
            return false;
        }
        self.auto_advance = None;
        log_debug!("auto-advancing");
        self.next_step();
        true
    }

    /// Drops the current device binding, e.g. when the session restarts.
    pub fn unbind(&mut self) {
        self.cancel_auto_advance();
        self.deactivate_current();
        self.cursor = None;
        self.steps = Arc::from(Vec::new());
    }

    /// Where a move would land, or `None` when it would be a no-op: no device
    /// bound, nothing to walk, or already at that end of the sequence.
    fn target(&self, direction: Direction) -> Option<usize> {
        let cursor = self.cursor.as_ref()?;
        let last = self.steps.len().checked_sub(1)?;
        match (direction, cursor.position) {
            (Direction::Forward, None) => Some(0),
            (Direction::Forward, Some(p)) if p < last => Some(p + 1),
            (Direction::Backward, Some(p)) if p > 0 => Some(p - 1),
            _ => None,
        }
    }

    fn move_to(&mut self, index: usize, direction: Direction) {
        self.cancel_auto_advance();
        self.deactivate_current();

        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        cursor.position = Some(index);
        let device_id = cursor.device_id.clone();
        let step = self.steps[index].clone();
        let total = self.steps.len();

        self.presenter.activate(&device_id, &step);
        if let Some(voice_over) = &step.voice_over_ref {
            self.presenter.play_voice_over(&device_id, &step, voice_over);
        }

        log_info!(
            "[{}] step {}/{}: {}",
            device_id,
            index + 1,
            total,
            step.title
        );

        let auto_advance_delay = step.auto_advance_delay;
        self.step_changed.emit(&StepChanged {
            device_id: device_id.clone(),
            step_index: index,
            step,
        });
        self.progress_changed.emit(&ProgressChanged {
            device_id,
            current: index + 1,
            total,
        });

        // Going back never re-arms; the user asked to stay on the earlier step.
        if direction == Direction::Forward && !auto_advance_delay.is_zero() {
            self.auto_advance = Some(self.scheduler.schedule(auto_advance_delay));
        }
    }

    fn deactivate_current(&mut self) {
        let Some(cursor) = &self.cursor else {
            return;
        };
        if let Some(step) = cursor.position.and_then(|p| self.steps.get(p)) {
            self.presenter.deactivate(&cursor.device_id, step);
        }
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(call) = self.auto_advance.take() {
            call.cancel();
        }
    }
}
