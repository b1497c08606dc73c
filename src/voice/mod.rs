//! Maps recognized speech onto navigation commands.

use serde::Serialize;

use crate::events::EventChannel;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

const NEXT_KEYWORDS: &[&str] = &["next", "continue", "forward"];
const PREVIOUS_KEYWORDS: &[&str] = &["back", "previous", "return"];
const HELP_KEYWORDS: &[&str] = &["help", "assistance", "explain"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VoiceCommand {
    Next,
    Previous,
    Help,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognized {
    pub text: String,
    pub command: Option<VoiceCommand>,
}

pub struct VoiceCommandAdapter {
    enabled: bool,
    speech_recognized: EventChannel<SpeechRecognized>,
}

impl VoiceCommandAdapter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            speech_recognized: EventChannel::new(),
        }
    }

    pub fn speech_recognized(&self) -> &EventChannel<SpeechRecognized> {
        &self.speech_recognized
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the command to run, if any. Disabled adapters ignore input
    /// entirely and raise no event.
    pub fn interpret(&self, text: &str) -> Option<VoiceCommand> {
        if !self.enabled {
            log_debug!("voice commands disabled; ignoring '{}'", text);
            return None;
        }
        let command = parse_command(text);
        log_debug!("speech '{}' -> {:?}", text, command);
        self.speech_recognized.emit(&SpeechRecognized {
            text: text.to_string(),
            command,
        });
        command
    }
}

/// Case-insensitive keyword match; navigation wins over help when both occur.
pub fn parse_command(text: &str) -> Option<VoiceCommand> {
    let lowered = text.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if contains_any(NEXT_KEYWORDS) {
        Some(VoiceCommand::Next)
    } else if contains_any(PREVIOUS_KEYWORDS) {
        Some(VoiceCommand::Previous)
    } else if contains_any(HELP_KEYWORDS) {
        Some(VoiceCommand::Help)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn maps_keywords_case_insensitively() {
        assert_eq!(parse_command("NEXT please"), Some(VoiceCommand::Next));
        assert_eq!(parse_command("let's continue"), Some(VoiceCommand::Next));
        assert_eq!(parse_command("go back"), Some(VoiceCommand::Previous));
        assert_eq!(parse_command("Return"), Some(VoiceCommand::Previous));
        assert_eq!(parse_command("can you explain"), Some(VoiceCommand::Help));
        assert_eq!(parse_command("what time is it"), None);
    }

    #[test]
    fn next_keywords_take_priority() {
        assert_eq!(parse_command("help me go forward"), Some(VoiceCommand::Next));
    }

    #[test]
    fn emits_every_utterance_when_enabled() {
        let adapter = VoiceCommandAdapter::new(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        adapter
            .speech_recognized()
            .subscribe(move |e| seen_clone.lock().unwrap().push(e.clone()));

        adapter.interpret("next");
        adapter.interpret("hello");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].command, Some(VoiceCommand::Next));
        assert_eq!(seen[1].command, None);
    }

    #[test]
    fn disabled_adapter_ignores_input() {
        let mut adapter = VoiceCommandAdapter::new(false);
        assert_eq!(adapter.interpret("next"), None);

        adapter.set_enabled(true);
        assert_eq!(adapter.interpret("next"), Some(VoiceCommand::Next));
    }
}
