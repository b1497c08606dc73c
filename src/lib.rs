pub mod events;
pub mod instructions;
pub mod localization;
pub mod models;
pub mod recognition;
pub mod scheduler;
pub mod session;
pub mod settings;
mod utils;
pub mod viewer;
pub mod voice;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use instructions::{DeviceDataLoader, LoggingPresenter};
use localization::LanguageManager;
use recognition::DeviceRegistry;
use session::{Availability, LibraryLoad, SimulatedCapability};
use settings::SettingsStore;
use viewer::{
    console::{self, ConsoleAction},
    ViewerCommand, ViewerController, ViewerDeps, ViewerEvents, ViewerHandle, ViewerRuntime,
};

const DATA_DIR_ENV: &str = "ARMANUAL_DATA_DIR";

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("ARManual starting up...");

    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
    let app_settings = settings.app();
    let ar_settings = settings.ar();

    let registry = load_registry(&data_dir.join("registry.json"))?;
    info!("device registry has {} markers", registry.len());

    let content = Arc::new(DeviceDataLoader::new(data_dir.join("devices")));

    let mut language = LanguageManager::new(app_settings.supported_languages.iter().cloned());
    let translations = data_dir.join("translations.json");
    if translations.exists() {
        if let Err(err) = language.load_table(&translations) {
            warn!("continuing without UI translations: {err:?}");
        }
    }
    language.set_language(&app_settings.default_language);

    let library = match ar_settings.reference_library_load_ms {
        0 => LibraryLoad::NotNeeded,
        ms => LibraryLoad::After(Duration::from_millis(ms)),
    };
    let capability = SimulatedCapability::new(Availability::Determined, library);

    let runtime = ViewerRuntime::new();
    let controller = ViewerController::new(ViewerDeps {
        capability: Box::new(capability),
        registry: Arc::new(registry),
        content: content.clone(),
        presenter: Box::new(LoggingPresenter),
        scheduler: runtime.scheduler(),
        session: ar_settings.session_config(),
        language,
        voice_commands_enabled: app_settings.voice_commands_enabled,
    });
    log_notifications(&controller.events(), content, Arc::clone(&settings));

    let handle = runtime.spawn(controller);
    let result = console_loop(&handle, &settings).await;

    handle.shutdown().await?;
    info!("ARManual stopped");
    result
}

fn load_registry(path: &Path) -> Result<DeviceRegistry> {
    if path.exists() {
        DeviceRegistry::load(path)
    } else {
        warn!("no device registry at {}; no markers will resolve", path.display());
        Ok(DeviceRegistry::default())
    }
}

fn log_notifications(
    events: &ViewerEvents,
    content: Arc<DeviceDataLoader>,
    settings: Arc<SettingsStore>,
) {
    events.session_state_changed.subscribe(|event| {
        info!("[session] {}", event.state.as_str());
        if event.state.retry_offered() {
            info!("[session] type :restart to try again");
        }
    });
    events
        .device_recognized
        .subscribe(|event| info!("[recognized] {}", event.device_id));
    events.step_changed.subscribe(move |event| {
        let language = settings.app().default_language;
        let title = content.localized_title(&event.device_id, &event.step.step_id, &language);
        let title = if title.is_empty() { &event.step.title } else { &title };
        info!("[step] {} #{}: {}", event.device_id, event.step_index + 1, title);
    });
    events.progress_changed.subscribe(|event| {
        info!("[progress] {} {}/{}", event.device_id, event.current, event.total)
    });
    events.speech_recognized.subscribe(|event| match event.command {
        Some(command) => info!("[voice] '{}' -> {:?}", event.text, command),
        None => info!("[voice] '{}' (no command)", event.text),
    });
    events.help_requested.subscribe(|event| match &event.step {
        Some(step) => info!("[help] {}: {}", step.title, step.description),
        None => info!("[help] point the camera at a device to begin"),
    });
    events
        .language_changed
        .subscribe(|event| info!("[language] {}", event.language));
}

async fn console_loop(handle: &ViewerHandle, settings: &SettingsStore) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let action = match console::parse_line(&line) {
            Ok(action) => action,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        match action {
            ConsoleAction::Viewer(command) => handle.send(command)?,
            ConsoleAction::SetLanguage(language) => match settings.set_language(&language) {
                Ok(true) => handle.send(ViewerCommand::SetLanguage(language))?,
                Ok(false) => warn!("'{language}' is not a supported language"),
                Err(err) => error!("failed to save language: {err:?}"),
            },
            ConsoleAction::SetVoiceCommandsEnabled(enabled) => {
                if let Err(err) = settings.set_voice_commands_enabled(enabled) {
                    error!("failed to save voice setting: {err:?}");
                }
                handle.send(ViewerCommand::SetVoiceCommandsEnabled(enabled))?;
            }
            ConsoleAction::Status => {
                let snapshot = handle.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            ConsoleAction::Quit => break,
            ConsoleAction::Nothing => {}
        }
    }

    Ok(())
}
