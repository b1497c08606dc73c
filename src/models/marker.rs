use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackingQuality {
    None,
    Limited,
    Tracking,
}

impl Default for TrackingQuality {
    fn default() -> Self {
        TrackingQuality::None
    }
}

impl TrackingQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingQuality::None => "none",
            TrackingQuality::Limited => "limited",
            TrackingQuality::Tracking => "tracking",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(TrackingQuality::None),
            "limited" => Some(TrackingQuality::Limited),
            "tracking" => Some(TrackingQuality::Tracking),
            _ => None,
        }
    }
}

/// World-space position plus orientation quaternion `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::IDENTITY
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarkerObservation {
    pub marker_id: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub tracking_quality: TrackingQuality,
}

impl MarkerObservation {
    pub fn new(marker_id: impl Into<String>, pose: Pose, tracking_quality: TrackingQuality) -> Self {
        Self {
            marker_id: marker_id.into(),
            pose,
            tracking_quality,
        }
    }
}

/// Everything the tracker reported during one update tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBatch {
    #[serde(default)]
    pub added: Vec<MarkerObservation>,
    #[serde(default)]
    pub updated: Vec<MarkerObservation>,
    #[serde(default)]
    pub removed: Vec<MarkerObservation>,
}

impl ObservationBatch {
    pub fn added(observation: MarkerObservation) -> Self {
        Self {
            added: vec![observation],
            ..Self::default()
        }
    }

    pub fn updated(observation: MarkerObservation) -> Self {
        Self {
            updated: vec![observation],
            ..Self::default()
        }
    }

    pub fn removed(observation: MarkerObservation) -> Self {
        Self {
            removed: vec![observation],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}
