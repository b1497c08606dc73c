use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::session::SessionConfig;

pub const MIN_UI_SCALE: f32 = 0.5;
pub const MAX_UI_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub check_for_updates_on_startup: bool,
    pub analytics_enabled: bool,
    pub voice_commands_enabled: bool,
    pub ui_scale: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_language: "English".into(),
            supported_languages: ["English", "Spanish", "French", "German", "Chinese"]
                .into_iter()
                .map(String::from)
                .collect(),
            check_for_updates_on_startup: true,
            analytics_enabled: true,
            voice_commands_enabled: true,
            ui_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ArSettings {
    pub initialization_timeout_secs: f64,
    pub poll_interval_ms: u64,
    /// Simulated reference-library load time used by the console runtime.
    pub reference_library_load_ms: u64,
}

impl Default for ArSettings {
    fn default() -> Self {
        Self {
            initialization_timeout_secs: 10.0,
            poll_interval_ms: 100,
            reference_library_load_ms: 500,
        }
    }
}

impl ArSettings {
    pub fn session_config(&self) -> SessionConfig {
        let timeout = Duration::try_from_secs_f64(self.initialization_timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or_else(|| SessionConfig::default().timeout);
        SessionConfig {
            timeout,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    app_settings: AppSettings,
    ar_settings: ArSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn app(&self) -> AppSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .app_settings
            .clone()
    }

    pub fn ar(&self) -> ArSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ar_settings
            .clone()
    }

    /// Returns `Ok(false)` without saving when the language is not supported.
    pub fn set_language(&self, language: &str) -> Result<bool> {
        self.update(|settings| {
            if !settings
                .app_settings
                .supported_languages
                .iter()
                .any(|l| l == language)
            {
                return false;
            }
            settings.app_settings.default_language = language.to_string();
            true
        })
    }

    pub fn set_analytics_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|settings| {
            settings.app_settings.analytics_enabled = enabled;
            true
        })
        .map(|_| ())
    }

    pub fn set_voice_commands_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|settings| {
            settings.app_settings.voice_commands_enabled = enabled;
            true
        })
        .map(|_| ())
    }

    /// Clamped to `MIN_UI_SCALE..=MAX_UI_SCALE`; returns the stored value.
    pub fn set_ui_scale(&self, scale: f32) -> Result<f32> {
        let clamped = if scale.is_nan() {
            1.0
        } else {
            scale.clamp(MIN_UI_SCALE, MAX_UI_SCALE)
        };
        self.update(|settings| {
            settings.app_settings.ui_scale = clamped;
            true
        })?;
        Ok(clamped)
    }

    fn update<F>(&self, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut UserSettings) -> bool,
    {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if !apply(&mut *guard) {
            return Ok(false);
        }
        self.persist(&*guard)?;
        Ok(true)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SettingsStore) {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn defaults_when_file_missing() {
        let (_dir, store) = store();
        assert_eq!(store.app(), AppSettings::default());
        assert_eq!(store.ar().session_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn only_supported_languages_are_saved() {
        let (dir, store) = store();
        assert!(!store.set_language("Klingon").unwrap());
        assert!(!dir.path().join("settings.json").exists());

        assert!(store.set_language("French").unwrap());
        assert_eq!(store.app().default_language, "French");

        let reopened = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(reopened.app().default_language, "French");
    }

    #[test]
    fn ui_scale_is_clamped() {
        let (_dir, store) = store();
        assert_eq!(store.set_ui_scale(3.0).unwrap(), MAX_UI_SCALE);
        assert_eq!(store.set_ui_scale(0.1).unwrap(), MIN_UI_SCALE);
        assert_eq!(store.set_ui_scale(1.25).unwrap(), 1.25);
        assert_eq!(store.app().ui_scale, 1.25);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"appSettings": {"voiceCommandsEnabled": false}, "arSettings": {"initializationTimeoutSecs": 2.5}}"#,
        )
        .unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert!(!store.app().voice_commands_enabled);
        assert_eq!(store.app().default_language, "English");
        assert_eq!(
            store.ar().session_config().timeout,
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn out_of_range_timeout_uses_default() {
        for secs in [1e20, -3.0, 0.0, f64::NAN, f64::INFINITY] {
            let ar = ArSettings {
                initialization_timeout_secs: secs,
                ..ArSettings::default()
            };
            assert_eq!(ar.session_config().timeout, Duration::from_secs(10));
        }
    }

    #[test]
    fn huge_timeout_in_file_does_not_break_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"arSettings": {"initializationTimeoutSecs": 1e20}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.ar().session_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn reload_picks_up_external_changes() {
        let (dir, store) = store();
        store.set_analytics_enabled(false).unwrap();

        let other = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        other.set_voice_commands_enabled(false).unwrap();

        store.reload().unwrap();
        assert!(!store.app().voice_commands_enabled);
        assert!(!store.app().analytics_enabled);
    }
}
