use std::sync::Arc;

use serde::Serialize;

use crate::events::EventChannel;
use crate::instructions::{
    ContentSource, InstructionWalker, Progress, ProgressChanged, StepChanged, StepPresenter,
};
use crate::localization::{LanguageChanged, LanguageManager};
use crate::models::{InstructionStep, ObservationBatch};
use crate::recognition::{
    ActiveAnchor, DeviceRecognitionCoordinator, DeviceRecognized, DeviceRegistry,
};
use crate::scheduler::{Scheduler, TimerId};
use crate::session::{
    ArCapability, SessionConfig, SessionSnapshot, SessionState, SessionStateChanged,
    SessionStateMachine,
};
use crate::voice::{SpeechRecognized, VoiceCommand, VoiceCommandAdapter};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequested {
    pub device_id: Option<String>,
    pub step: Option<InstructionStep>,
}

/// Every notification stream a UI layer can listen to. Cloning shares the
/// underlying subscriber lists.
#[derive(Clone)]
pub struct ViewerEvents {
    pub session_state_changed: EventChannel<SessionStateChanged>,
    pub device_recognized: EventChannel<DeviceRecognized>,
    pub step_changed: EventChannel<StepChanged>,
    pub progress_changed: EventChannel<ProgressChanged>,
    pub speech_recognized: EventChannel<SpeechRecognized>,
    pub help_requested: EventChannel<HelpRequested>,
    pub language_changed: EventChannel<LanguageChanged>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSnapshot {
    pub session: SessionSnapshot,
    pub status_message: Option<String>,
    pub device_id: Option<String>,
    pub progress: Option<Progress>,
    pub current_step: Option<InstructionStep>,
    pub anchors: Vec<ActiveAnchor>,
    pub language: String,
}

/// Collaborators handed to [`ViewerController::new`].
pub struct ViewerDeps {
    pub capability: Box<dyn ArCapability>,
    pub registry: Arc<DeviceRegistry>,
    pub content: Arc<dyn ContentSource>,
    pub presenter: Box<dyn StepPresenter>,
    pub scheduler: Arc<dyn Scheduler>,
    pub session: SessionConfig,
    pub language: LanguageManager,
    pub voice_commands_enabled: bool,
}

/// Owns the session, recognition and walkthrough components and routes
/// input between them. UI buttons and voice commands reach navigation
/// through the same `next_step` / `previous_step` calls.
pub struct ViewerController {
    session: SessionStateMachine,
    coordinator: DeviceRecognitionCoordinator,
    walker: InstructionWalker,
    voice: VoiceCommandAdapter,
    language: LanguageManager,
    help_requested: EventChannel<HelpRequested>,
}

impl ViewerController {
    pub fn new(deps: ViewerDeps) -> Self {
        Self {
            session: SessionStateMachine::new(
                deps.capability,
                Arc::clone(&deps.scheduler),
                deps.session,
            ),
            coordinator: DeviceRecognitionCoordinator::new(deps.registry),
            walker: InstructionWalker::new(deps.content, deps.presenter, deps.scheduler),
            voice: VoiceCommandAdapter::new(deps.voice_commands_enabled),
            language: deps.language,
            help_requested: EventChannel::new(),
        }
    }

    pub fn events(&self) -> ViewerEvents {
        ViewerEvents {
            session_state_changed: self.session.state_changed().clone(),
            device_recognized: self.coordinator.device_recognized().clone(),
            step_changed: self.walker.step_changed().clone(),
            progress_changed: self.walker.progress_changed().clone(),
            speech_recognized: self.voice.speech_recognized().clone(),
            help_requested: self.help_requested.clone(),
            language_changed: self.language.language_changed().clone(),
        }
    }

    pub fn start(&mut self) {
        self.session.initialize();
    }

    /// Tracking restarts from scratch, so anchors and the walkthrough go too.
    pub fn restart_session(&mut self) {
        self.walker.unbind();
        self.coordinator.clear();
        self.session.restart();
    }

    pub fn toggle_tracking(&mut self, enabled: bool) {
        self.session.toggle_tracking(enabled);
    }

    /// Tracker input is dropped until the session is ready.
    pub fn on_markers_changed(&mut self, batch: &ObservationBatch) {
        if self.session.state() != SessionState::Ready {
            if !batch.is_empty() {
                log_debug!(
                    "dropping tracker batch while session is {}",
                    self.session.state().as_str()
                );
            }
            return;
        }

        for recognized in self.coordinator.apply(batch) {
            self.walker.on_device_recognized(&recognized.device_id);
        }
    }

    pub fn next_step(&mut self) {
        self.walker.next_step();
    }

    pub fn previous_step(&mut self) {
        self.walker.previous_step();
    }

    pub fn request_help(&mut self) {
        let event = HelpRequested {
            device_id: self.walker.current_device().map(str::to_string),
            step: self.walker.current_step().cloned(),
        };
        log_info!("help requested for {:?}", event.device_id);
        self.help_requested.emit(&event);
    }

    pub fn on_voice_command(&mut self, text: &str) -> Option<VoiceCommand> {
        let command = self.voice.interpret(text)?;
        match command {
            VoiceCommand::Next => self.next_step(),
            VoiceCommand::Previous => self.previous_step(),
            VoiceCommand::Help => self.request_help(),
        }
        Some(command)
    }

    pub fn set_voice_commands_enabled(&mut self, enabled: bool) {
        self.voice.set_enabled(enabled);
    }

    pub fn set_language(&mut self, language: &str) -> bool {
        self.language.set_language(language)
    }

    /// Routes a scheduler firing to whichever component owns it.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        self.session.on_timer(id) || self.walker.on_timer(id)
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn current_step(&self) -> Option<&InstructionStep> {
        self.walker.current_step()
    }

    pub fn walker(&self) -> &InstructionWalker {
        &self.walker
    }

    pub fn coordinator(&self) -> &DeviceRecognitionCoordinator {
        &self.coordinator
    }

    pub fn status_message(&self) -> Option<String> {
        self.session
            .state()
            .status_key()
            .map(|key| self.language.translate(key))
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            session: self.session.snapshot(),
            status_message: self.status_message(),
            device_id: self.walker.current_device().map(str::to_string),
            progress: self.walker.progress(),
            current_step: self.walker.current_step().cloned(),
            anchors: self.coordinator.anchors().cloned().collect(),
            language: self.language.current_language().to_string(),
        }
    }
}
