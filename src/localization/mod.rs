//! UI string table with per-language fallback.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::events::EventChannel;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const BASE_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageChanged {
    pub language: String,
}

/// `key -> language -> text`. Lookups fall back to English, then to the key.
pub struct LanguageManager {
    languages: Vec<String>,
    table: HashMap<String, HashMap<String, String>>,
    current: String,
    language_changed: EventChannel<LanguageChanged>,
}

impl LanguageManager {
    pub fn new(languages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut languages: Vec<String> = languages.into_iter().map(Into::into).collect();
        if !languages.iter().any(|l| l == BASE_LANGUAGE) {
            languages.insert(0, BASE_LANGUAGE.to_string());
        }
        Self {
            languages,
            table: HashMap::new(),
            current: BASE_LANGUAGE.to_string(),
            language_changed: EventChannel::new(),
        }
    }

    /// Loads `{"key": {"English": "...", "Spanish": "..."}}`.
    pub fn load_table(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read translations from {}", path.display()))?;
        let table: HashMap<String, HashMap<String, String>> = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid translations in {}", path.display()))?;
        for (key, texts) in table {
            for (language, text) in texts {
                self.insert(&key, &language, text);
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, key: &str, language: &str, text: impl Into<String>) {
        if !self.languages.iter().any(|l| l == language) {
            log_warn!("translation for unsupported language '{}' ignored", language);
            return;
        }
        self.table
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), text.into());
    }

    pub fn language_changed(&self) -> &EventChannel<LanguageChanged> {
        &self.language_changed
    }

    pub fn current_language(&self) -> &str {
        &self.current
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Returns `false` for languages this manager does not know.
    pub fn set_language(&mut self, language: &str) -> bool {
        if !self.languages.iter().any(|l| l == language) {
            log_warn!("unknown language '{}'", language);
            return false;
        }
        self.current = language.to_string();
        log_info!("language set to {}", language);
        self.language_changed.emit(&LanguageChanged {
            language: language.to_string(),
        });
        true
    }

    pub fn translate(&self, key: &str) -> String {
        let texts = self.table.get(key);
        texts
            .and_then(|t| t.get(&self.current))
            .or_else(|| texts.and_then(|t| t.get(BASE_LANGUAGE)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
