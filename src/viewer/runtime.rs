use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::ObservationBatch;
use crate::scheduler::{Scheduler, TimerId, TokioScheduler};

use super::controller::{ViewerController, ViewerSnapshot};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug)]
pub enum ViewerCommand {
    MarkersChanged(ObservationBatch),
    NextStep,
    PreviousStep,
    Voice(String),
    Help,
    RestartSession,
    ToggleTracking(bool),
    SetLanguage(String),
    SetVoiceCommandsEnabled(bool),
    Snapshot(oneshot::Sender<ViewerSnapshot>),
}

/// Owns the timer channel until the controller is handed over. Build the
/// controller with [`ViewerRuntime::scheduler`], subscribe to its events,
/// then [`spawn`](ViewerRuntime::spawn) it.
pub struct ViewerRuntime {
    scheduler: Arc<TokioScheduler>,
    fired_rx: mpsc::UnboundedReceiver<TimerId>,
}

impl ViewerRuntime {
    pub fn new() -> Self {
        let (scheduler, fired_rx) = TokioScheduler::new();
        Self {
            scheduler: Arc::new(scheduler),
            fired_rx,
        }
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.scheduler.clone()
    }

    /// Starts the session and moves the controller into its own task.
    pub fn spawn(self, controller: ViewerController) -> ViewerHandle {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(viewer_loop(
            controller,
            commands_rx,
            self.fired_rx,
            cancel_token.clone(),
        ));

        ViewerHandle {
            commands,
            cancel_token,
            task: Some(task),
        }
    }
}

impl Default for ViewerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ViewerHandle {
    commands: mpsc::UnboundedSender<ViewerCommand>,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ViewerHandle {
    pub fn send(&self, command: ViewerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("viewer loop is not running"))
    }

    /// A sender other tasks (tracker feed, voice input) can own.
    pub fn sender(&self) -> mpsc::UnboundedSender<ViewerCommand> {
        self.commands.clone()
    }

    pub async fn snapshot(&self) -> Result<ViewerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(ViewerCommand::Snapshot(tx))?;
        rx.await.context("viewer loop dropped snapshot request")
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();

        if let Some(task) = self.task.take() {
            task.await.context("viewer loop task failed to join")
        } else {
            Ok(())
        }
    }
}

async fn viewer_loop(
    mut controller: ViewerController,
    mut commands: mpsc::UnboundedReceiver<ViewerCommand>,
    mut fired: mpsc::UnboundedReceiver<TimerId>,
    cancel_token: CancellationToken,
) {
    controller.start();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("viewer loop shutting down");
                break;
            }
            Some(id) = fired.recv() => {
                if !controller.on_timer(id) {
                    log_debug!("ignoring stale timer {}", id);
                }
            }
            command = commands.recv() => match command {
                Some(command) => apply(&mut controller, command),
                None => {
                    log_info!("all viewer handles dropped; stopping");
                    break;
                }
            }
        }
    }
}

fn apply(controller: &mut ViewerController, command: ViewerCommand) {
    match command {
        ViewerCommand::MarkersChanged(batch) => controller.on_markers_changed(&batch),
        ViewerCommand::NextStep => controller.next_step(),
        ViewerCommand::PreviousStep => controller.previous_step(),
        ViewerCommand::Voice(text) => {
            controller.on_voice_command(&text);
        }
        ViewerCommand::Help => controller.request_help(),
        ViewerCommand::RestartSession => controller.restart_session(),
        ViewerCommand::ToggleTracking(enabled) => controller.toggle_tracking(enabled),
        ViewerCommand::SetLanguage(language) => {
            controller.set_language(&language);
        }
        ViewerCommand::SetVoiceCommandsEnabled(enabled) => {
            controller.set_voice_commands_enabled(enabled)
        }
        ViewerCommand::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }
    }
}
