use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::InstructionStep;

use super::content::ContentSource;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

const BASE_LANGUAGE: &str = "English";

/// On-disk document for one device: `<content dir>/<device_id>.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceData {
    pub device_id: String,
    pub device_name: String,
    pub manufacturer: String,
    pub model_number: String,
    pub steps: Vec<StepData>,
    /// Keyed by lower-case language name.
    pub translations: HashMap<String, TranslationData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepData {
    pub step_id: String,
    pub title: String,
    pub description: String,
    pub voice_over_file: Option<String>,
    pub visual_elements: Option<String>,
    /// Seconds; zero or negative means manual advance.
    pub auto_advance_delay: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationData {
    pub device_name: String,
    pub steps: Vec<TranslatedStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatedStep {
    pub title: String,
    pub description: String,
}

impl StepData {
    fn to_step(&self) -> InstructionStep {
        // Out-of-range values (negative, NaN, too large) mean manual advance.
        let delay = Duration::try_from_secs_f64(self.auto_advance_delay).unwrap_or(Duration::ZERO);
        InstructionStep {
            step_id: self.step_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            voice_over_ref: self.voice_over_file.clone().filter(|v| !v.is_empty()),
            visual_elements_ref: self.visual_elements.clone().filter(|v| !v.is_empty()),
            auto_advance_delay: delay,
        }
    }
}

impl DeviceData {
    pub fn instruction_steps(&self) -> Vec<InstructionStep> {
        self.steps.iter().map(StepData::to_step).collect()
    }

    /// The translated text for `step_id`, falling back to the original text
    /// when the language is English, has no translation, or the translation
    /// is shorter than the step list. Unknown steps yield an empty string.
    fn localized<F>(&self, step_id: &str, language: &str, pick: F) -> String
    where
        F: Fn(&StepData, Option<&TranslatedStep>) -> String,
    {
        let Some(index) = self.steps.iter().position(|s| s.step_id == step_id) else {
            return String::new();
        };
        let step = &self.steps[index];
        if language.eq_ignore_ascii_case(BASE_LANGUAGE) {
            return pick(step, None);
        }
        let translated = self
            .translations
            .get(&language.to_lowercase())
            .and_then(|t| t.steps.get(index));
        pick(step, translated)
    }

    pub fn localized_title(&self, step_id: &str, language: &str) -> String {
        self.localized(step_id, language, |step, translated| {
            translated
                .map(|t| t.title.clone())
                .unwrap_or_else(|| step.title.clone())
        })
    }

    pub fn localized_description(&self, step_id: &str, language: &str) -> String {
        self.localized(step_id, language, |step, translated| {
            translated
                .map(|t| t.description.clone())
                .unwrap_or_else(|| step.description.clone())
        })
    }
}

struct CachedDevice {
    data: Arc<DeviceData>,
    steps: Arc<[InstructionStep]>,
}

/// Reads device documents from a directory and caches them per device.
/// Documents that fail to load are not cached, so a later call retries.
pub struct DeviceDataLoader {
    root: PathBuf,
    cache: Mutex<HashMap<String, CachedDevice>>,
}

impl DeviceDataLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedDevice>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, device_id: &str) -> PathBuf {
        self.root.join(format!("{device_id}.json"))
    }

    fn read(&self, device_id: &str) -> Result<DeviceData> {
        let path = self.path_for(device_id);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read device data from {}", path.display()))?;
        let data: DeviceData = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid device data in {}", path.display()))?;
        Ok(data)
    }

    fn cached(&self, device_id: &str) -> Result<(Arc<DeviceData>, Arc<[InstructionStep]>)> {
        if let Some(entry) = self.lock().get(device_id) {
            return Ok((Arc::clone(&entry.data), Arc::clone(&entry.steps)));
        }

        let data = Arc::new(self.read(device_id)?);
        let steps: Arc<[InstructionStep]> = data.instruction_steps().into();
        log_debug!("loaded {} steps for {}", steps.len(), device_id);

        self.lock().insert(
            device_id.to_string(),
            CachedDevice {
                data: Arc::clone(&data),
                steps: Arc::clone(&steps),
            },
        );
        Ok((data, steps))
    }

    pub fn load_device_data(&self, device_id: &str) -> Result<Arc<DeviceData>> {
        self.cached(device_id).map(|(data, _)| data)
    }

    pub fn localized_title(&self, device_id: &str, step_id: &str, language: &str) -> String {
        self.load_device_data(device_id)
            .map(|data| data.localized_title(step_id, language))
            .unwrap_or_default()
    }

    pub fn localized_description(&self, device_id: &str, step_id: &str, language: &str) -> String {
        self.load_device_data(device_id)
            .map(|data| data.localized_description(step_id, language))
            .unwrap_or_default()
    }

    /// Drops cached documents, e.g. after fresh content was written to disk.
    pub fn invalidate(&self, device_id: Option<&str>) {
        let mut cache = self.lock();
        match device_id {
            Some(id) => {
                cache.remove(id);
            }
            None => cache.clear(),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.lock().len()
    }
}

impl ContentSource for DeviceDataLoader {
    fn steps(&self, device_id: &str) -> Arc<[InstructionStep]> {
        match self.cached(device_id) {
            Ok((_, steps)) => steps,
            Err(err) => {
                log_error!("Failed to load device data for {}: {:#}", device_id, err);
                Arc::from(Vec::new())
            }
        }
    }
}
