use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::events::EventChannel;
use crate::models::{MarkerObservation, ObservationBatch, Pose, TrackingQuality};

use super::registry::DeviceRegistry;

// Runs every tracker tick; keep quiet unless debugging recognition.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAnchor {
    pub device_id: String,
    pub content_handle: String,
    pub pose: Pose,
    /// True only while the marker is fully tracked. Limited tracking hides the
    /// overlay but keeps the binding.
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecognized {
    pub device_id: String,
}

/// Binds tracked markers to devices, one anchor per device.
pub struct DeviceRecognitionCoordinator {
    registry: Arc<DeviceRegistry>,
    anchors: BTreeMap<String, ActiveAnchor>,
    device_recognized: EventChannel<DeviceRecognized>,
}

impl DeviceRecognitionCoordinator {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            anchors: BTreeMap::new(),
            device_recognized: EventChannel::new(),
        }
    }

    pub fn device_recognized(&self) -> &EventChannel<DeviceRecognized> {
        &self.device_recognized
    }

    /// Applies one tick: added, then updated, then removed. Recognition
    /// events are raised after every anchor mutation of the tick and are
    /// also returned in the order they occurred.
    pub fn apply(&mut self, batch: &ObservationBatch) -> Vec<DeviceRecognized> {
        let mut recognized = Vec::new();

        for observation in batch.added.iter().chain(batch.updated.iter()) {
            if let Some(event) = self.observe(observation) {
                recognized.push(event);
            }
        }

        for observation in &batch.removed {
            self.forget(observation);
        }

        for event in &recognized {
            log_info!("device recognized: {}", event.device_id);
            self.device_recognized.emit(event);
        }

        recognized
    }

    fn observe(&mut self, observation: &MarkerObservation) -> Option<DeviceRecognized> {
        let Some(mapping) = self.registry.resolve(&observation.marker_id) else {
            log_debug!("ignoring unmapped marker '{}'", observation.marker_id);
            return None;
        };

        let visible = observation.tracking_quality == TrackingQuality::Tracking;
        let mut recognized = None;

        let anchor = self
            .anchors
            .entry(mapping.device_id.clone())
            .or_insert_with(|| {
                recognized = Some(DeviceRecognized {
                    device_id: mapping.device_id.clone(),
                });
                ActiveAnchor {
                    device_id: mapping.device_id.clone(),
                    content_handle: mapping.content_handle.clone(),
                    pose: observation.pose,
                    visible,
                }
            });

        anchor.pose = observation.pose;
        anchor.visible = visible;

        log_debug!(
            "anchor {} quality={} visible={}",
            anchor.device_id,
            observation.tracking_quality.as_str(),
            anchor.visible
        );

        recognized
    }

    fn forget(&mut self, observation: &MarkerObservation) {
        let Some(mapping) = self.registry.resolve(&observation.marker_id) else {
            return;
        };
        if self.anchors.remove(&mapping.device_id).is_some() {
            log_info!("anchor removed for {}", mapping.device_id);
        }
    }

    pub fn anchor(&self, device_id: &str) -> Option<&ActiveAnchor> {
        self.anchors.get(device_id)
    }

    /// Anchors ordered by device id.
    pub fn anchors(&self) -> impl Iterator<Item = &ActiveAnchor> {
        self.anchors.values()
    }

    pub fn is_visible(&self, device_id: &str) -> bool {
        self.anchors
            .get(device_id)
            .map(|anchor| anchor.visible)
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::DeviceMapping;
    use std::sync::Mutex;

    fn coordinator() -> DeviceRecognitionCoordinator {
        let registry = DeviceRegistry::from_mappings([
            DeviceMapping::new("img_drill01", "drill01", "drill01"),
            DeviceMapping::new("img_router", "router7", "router7"),
        ]);
        DeviceRecognitionCoordinator::new(Arc::new(registry))
    }

    fn seen(marker: &str, quality: TrackingQuality) -> MarkerObservation {
        MarkerObservation::new(marker, Pose::at(1.0, 2.0, 3.0), quality)
    }

    fn record(coordinator: &DeviceRecognitionCoordinator) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        coordinator
            .device_recognized()
            .subscribe(move |event| log_clone.lock().unwrap().push(event.device_id.clone()));
        log
    }

    #[test]
    fn recognizes_once_per_tracking_session() {
        let mut coordinator = coordinator();
        let log = record(&coordinator);

        coordinator.apply(&ObservationBatch::added(seen("img_drill01", TrackingQuality::Tracking)));
        for _ in 0..5 {
            let out = coordinator
                .apply(&ObservationBatch::updated(seen("img_drill01", TrackingQuality::Tracking)));
            assert!(out.is_empty());
        }

        assert_eq!(*log.lock().unwrap(), vec!["drill01"]);
    }

    #[test]
    fn removal_ends_the_tracking_session() {
        let mut coordinator = coordinator();
        let log = record(&coordinator);

        coordinator.apply(&ObservationBatch::added(seen("img_drill01", TrackingQuality::Tracking)));
        coordinator.apply(&ObservationBatch::removed(seen("img_drill01", TrackingQuality::None)));
        assert!(coordinator.anchor("drill01").is_none());

        coordinator.apply(&ObservationBatch::added(seen("img_drill01", TrackingQuality::Tracking)));
        assert_eq!(*log.lock().unwrap(), vec!["drill01", "drill01"]);
    }

    #[test]
    fn unmapped_markers_are_ignored() {
        let mut coordinator = coordinator();
        let log = record(&coordinator);

        let out = coordinator.apply(&ObservationBatch {
            added: vec![seen("cereal_box", TrackingQuality::Tracking)],
            updated: vec![seen("cereal_box", TrackingQuality::Tracking)],
            removed: vec![seen("cereal_box", TrackingQuality::None)],
        });

        assert!(out.is_empty());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(coordinator.anchors().count(), 0);
    }

    #[test]
    fn limited_tracking_hides_but_keeps_anchor() {
        let mut coordinator = coordinator();
        coordinator.apply(&ObservationBatch::added(seen("img_drill01", TrackingQuality::Tracking)));
        assert!(coordinator.is_visible("drill01"));

        let moved = MarkerObservation::new("img_drill01", Pose::at(4.0, 5.0, 6.0), TrackingQuality::Limited);
        coordinator.apply(&ObservationBatch::updated(moved));

        let anchor = coordinator.anchor("drill01").unwrap();
        assert!(!anchor.visible);
        assert_eq!(anchor.pose, Pose::at(4.0, 5.0, 6.0));

        coordinator.apply(&ObservationBatch::updated(seen("img_drill01", TrackingQuality::Tracking)));
        assert!(coordinator.is_visible("drill01"));
    }

    #[test]
    fn first_observation_with_limited_quality_still_recognizes() {
        let mut coordinator = coordinator();
        let out =
            coordinator.apply(&ObservationBatch::added(seen("img_router", TrackingQuality::Limited)));

        assert_eq!(out.len(), 1);
        assert!(!coordinator.is_visible("router7"));
        assert!(coordinator.anchor("router7").is_some());
    }

    #[test]
    fn events_fire_after_all_mutations_in_occurrence_order() {
        let mut coordinator = coordinator();
        let anchors_seen = Arc::new(Mutex::new(Vec::new()));
        let anchors_clone = Arc::clone(&anchors_seen);
        coordinator.device_recognized().subscribe(move |event| {
            anchors_clone.lock().unwrap().push(event.device_id.clone());
        });

        let out = coordinator.apply(&ObservationBatch {
            added: vec![seen("img_router", TrackingQuality::Tracking)],
            updated: vec![seen("img_drill01", TrackingQuality::Tracking)],
            removed: vec![],
        });

        let ids: Vec<_> = out.into_iter().map(|e| e.device_id).collect();
        assert_eq!(ids, vec!["router7", "drill01"]);
        assert_eq!(*anchors_seen.lock().unwrap(), vec!["router7", "drill01"]);
        assert_eq!(coordinator.anchors().count(), 2);
    }

    #[test]
    fn removed_is_processed_after_added_within_a_tick() {
        let mut coordinator = coordinator();
        coordinator.apply(&ObservationBatch {
            added: vec![seen("img_drill01", TrackingQuality::Tracking)],
            updated: vec![],
            removed: vec![seen("img_drill01", TrackingQuality::None)],
        });

        assert!(coordinator.anchor("drill01").is_none());
    }
}
