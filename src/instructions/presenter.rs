use log::{debug, info};

use crate::models::InstructionStep;

/// Where step visuals are toggled and voice-over playback is requested.
/// Calls are fire-and-forget; nothing is reported back to the walker.
pub trait StepPresenter: Send {
    fn activate(&mut self, device_id: &str, step: &InstructionStep);

    fn deactivate(&mut self, device_id: &str, step: &InstructionStep);

    fn play_voice_over(&mut self, device_id: &str, step: &InstructionStep, voice_over_ref: &str);
}

/// Presenter for headless runs: every request becomes a log line.
#[derive(Debug, Default)]
pub struct LoggingPresenter;

impl StepPresenter for LoggingPresenter {
    fn activate(&mut self, device_id: &str, step: &InstructionStep) {
        if let Some(visuals) = &step.visual_elements_ref {
            debug!("[{device_id}] show visuals '{visuals}' for step {}", step.step_id);
        }
    }

    fn deactivate(&mut self, device_id: &str, step: &InstructionStep) {
        if let Some(visuals) = &step.visual_elements_ref {
            debug!("[{device_id}] hide visuals '{visuals}' for step {}", step.step_id);
        }
    }

    fn play_voice_over(&mut self, device_id: &str, step: &InstructionStep, voice_over_ref: &str) {
        info!("[{device_id}] voice-over '{voice_over_ref}' for step {}", step.step_id);
    }
}
