use std::{
    fs,
    sync::{Arc, Mutex},
    time::Duration,
};

use armanual_lib::{
    instructions::{DeviceDataLoader, LoggingPresenter, StepPresenter},
    localization::LanguageManager,
    models::{InstructionStep, MarkerObservation, ObservationBatch, Pose, TrackingQuality},
    recognition::DeviceRegistry,
    scheduler::ManualScheduler,
    session::{Availability, LibraryLoad, SessionConfig, SessionState, SimulatedCapability},
    viewer::{ViewerController, ViewerDeps},
};
use tempfile::TempDir;

const REGISTRY: &str = r#"[
    {"markerId": "img_drill01", "deviceId": "drill01", "contentHandle": "drill01_overlay"},
    {"markerId": "img_kettle", "deviceId": "kettle", "contentHandle": "kettle_overlay"}
]"#;

const DRILL: &str = r#"{
    "deviceId": "drill01",
    "deviceName": "Cordless Drill",
    "steps": [
        {"stepId": "s0", "title": "Insert battery", "voiceOverFile": "vo_s0"},
        {"stepId": "s1", "title": "Attach bit"},
        {"stepId": "s2", "title": "Drill"}
    ]
}"#;

#[derive(Default)]
struct VoiceLog(Arc<Mutex<Vec<String>>>);

impl StepPresenter for VoiceLog {
    fn activate(&mut self, _device_id: &str, _step: &InstructionStep) {}

    fn deactivate(&mut self, _device_id: &str, _step: &InstructionStep) {}

    fn play_voice_over(&mut self, _device_id: &str, _step: &InstructionStep, voice_over_ref: &str) {
        self.0.lock().unwrap().push(voice_over_ref.to_string());
    }
}

struct Viewer {
    _dir: TempDir,
    scheduler: Arc<ManualScheduler>,
    capability: SimulatedCapability,
    controller: ViewerController,
    events: Arc<Mutex<Vec<String>>>,
}

impl Viewer {
    fn new(capability: SimulatedCapability, presenter: Box<dyn StepPresenter>) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("registry.json"), REGISTRY).unwrap();
        fs::create_dir_all(dir.path().join("devices")).unwrap();
        fs::write(dir.path().join("devices").join("drill01.json"), DRILL).unwrap();

        let scheduler = Arc::new(ManualScheduler::new());
        let controller = ViewerController::new(ViewerDeps {
            capability: Box::new(capability.clone()),
            registry: Arc::new(DeviceRegistry::load(&dir.path().join("registry.json")).unwrap()),
            content: Arc::new(DeviceDataLoader::new(dir.path().join("devices"))),
            presenter,
            scheduler: scheduler.clone(),
            session: SessionConfig {
                timeout: Duration::from_secs(10),
                poll_interval: Duration::from_millis(100),
            },
            language: LanguageManager::new(["English"]),
            voice_commands_enabled: true,
        });

        let events = Arc::new(Mutex::new(Vec::new()));
        let channels = controller.events();
        let log = Arc::clone(&events);
        channels
            .device_recognized
            .subscribe(move |e| log.lock().unwrap().push(format!("recognized {}", e.device_id)));
        let log = Arc::clone(&events);
        channels.step_changed.subscribe(move |e| {
            log.lock()
                .unwrap()
                .push(format!("step {} {}", e.step_index, e.step.step_id))
        });
        let log = Arc::clone(&events);
        channels.progress_changed.subscribe(move |e| {
            log.lock()
                .unwrap()
                .push(format!("progress {} {}/{}", e.device_id, e.current, e.total))
        });

        Self {
            _dir: dir,
            scheduler,
            capability,
            controller,
            events,
        }
    }

    fn ready() -> Self {
        let mut viewer = Self::new(
            SimulatedCapability::new(Availability::Determined, LibraryLoad::NotNeeded),
            Box::new(LoggingPresenter),
        );
        viewer.controller.start();
        assert_eq!(viewer.controller.session_state(), SessionState::Ready);
        viewer
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn advance(&mut self, by: Duration) {
        let controller = &mut self.controller;
        self.scheduler.advance(by, |id| {
            controller.on_timer(id);
        });
    }

    fn observe(&mut self, batch: ObservationBatch) {
        self.controller.on_markers_changed(&batch);
    }
}

fn seen(marker: &str) -> MarkerObservation {
    MarkerObservation::new(marker, Pose::at(0.0, 0.0, -0.4), TrackingQuality::Tracking)
}

#[test]
fn drill_walkthrough_end_to_end() {
    let mut viewer = Viewer::ready();

    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    assert_eq!(
        viewer.take(),
        vec!["recognized drill01", "step 0 s0", "progress drill01 1/3"]
    );

    viewer.controller.next_step();
    viewer.controller.next_step();
    assert_eq!(
        viewer.take(),
        vec![
            "step 1 s1",
            "progress drill01 2/3",
            "step 2 s2",
            "progress drill01 3/3"
        ]
    );

    viewer.controller.next_step();
    assert!(viewer.take().is_empty());
    assert_eq!(
        viewer.controller.walker().cursor().unwrap().step_index(),
        2
    );
}

#[test]
fn re_recognition_keeps_position() {
    let mut viewer = Viewer::ready();
    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    viewer.controller.next_step();
    viewer.take();

    viewer.observe(ObservationBatch::updated(seen("img_drill01")));
    viewer.observe(ObservationBatch::updated(MarkerObservation::new(
        "img_drill01",
        Pose::IDENTITY,
        TrackingQuality::Limited,
    )));

    assert!(viewer.take().is_empty());
    assert!(!viewer.controller.coordinator().is_visible("drill01"));
    assert_eq!(viewer.controller.current_step().unwrap().step_id, "s1");
}

#[test]
fn marker_loss_and_return_restarts_walkthrough_only_for_new_device() {
    let mut viewer = Viewer::ready();
    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    viewer.controller.next_step();
    viewer.take();

    viewer.observe(ObservationBatch::removed(seen("img_drill01")));
    assert!(viewer.controller.coordinator().anchor("drill01").is_none());

    // Same device again: anchor comes back, recognition fires, cursor stays.
    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    assert_eq!(viewer.take(), vec!["recognized drill01"]);
    assert_eq!(viewer.controller.current_step().unwrap().step_id, "s1");

    // A device without content binds an empty walkthrough.
    viewer.observe(ObservationBatch::added(seen("img_kettle")));
    assert_eq!(
        viewer.take(),
        vec!["recognized kettle", "progress kettle 0/0"]
    );
    viewer.controller.next_step();
    assert!(viewer.take().is_empty());
}

#[test]
fn unmapped_markers_are_ignored() {
    let mut viewer = Viewer::ready();
    viewer.observe(ObservationBatch::added(seen("img_unknown")));
    assert!(viewer.take().is_empty());
    assert!(viewer.controller.coordinator().anchors().next().is_none());
}

#[test]
fn recognition_waits_for_reference_library() {
    let capability = SimulatedCapability::new(Availability::Determined, LibraryLoad::Manual);
    let mut viewer = Viewer::new(capability, Box::new(LoggingPresenter));
    viewer.controller.start();

    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    assert!(viewer.take().is_empty());
    assert_eq!(viewer.controller.session_state(), SessionState::Initializing);

    viewer.capability.complete_library_load();
    viewer.advance(Duration::from_millis(100));
    assert_eq!(viewer.controller.session_state(), SessionState::Ready);

    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    assert_eq!(
        viewer.take(),
        vec!["recognized drill01", "step 0 s0", "progress drill01 1/3"]
    );
}

#[test]
fn voice_over_is_requested_for_steps_that_have_one() {
    let voice = VoiceLog::default();
    let played = Arc::clone(&voice.0);
    let mut viewer = Viewer::new(
        SimulatedCapability::new(Availability::Determined, LibraryLoad::NotNeeded),
        Box::new(voice),
    );
    viewer.controller.start();

    viewer.observe(ObservationBatch::added(seen("img_drill01")));
    viewer.controller.on_voice_command("next");
    viewer.controller.on_voice_command("go back");

    assert_eq!(*played.lock().unwrap(), vec!["vo_s0", "vo_s0"]);
}
