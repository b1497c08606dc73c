use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    pub step_id: String,
    pub title: String,
    pub description: String,
    pub voice_over_ref: Option<String>,
    pub visual_elements_ref: Option<String>,
    /// Zero means the step only advances on user input.
    pub auto_advance_delay: Duration,
}

impl InstructionStep {
    pub fn new(step_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            title: title.into(),
            description: String::new(),
            voice_over_ref: None,
            visual_elements_ref: None,
            auto_advance_delay: Duration::ZERO,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_voice_over(mut self, voice_over_ref: impl Into<String>) -> Self {
        self.voice_over_ref = Some(voice_over_ref.into());
        self
    }

    pub fn with_visual_elements(mut self, visual_elements_ref: impl Into<String>) -> Self {
        self.visual_elements_ref = Some(visual_elements_ref.into());
        self
    }

    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    pub fn auto_advances(&self) -> bool {
        !self.auto_advance_delay.is_zero()
    }
}
