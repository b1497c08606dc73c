use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMapping {
    pub marker_id: String,
    pub device_id: String,
    /// Opaque reference to the overlay/instruction bundle for the device.
    pub content_handle: String,
}

impl DeviceMapping {
    pub fn new(
        marker_id: impl Into<String>,
        device_id: impl Into<String>,
        content_handle: impl Into<String>,
    ) -> Self {
        Self {
            marker_id: marker_id.into(),
            device_id: device_id.into(),
            content_handle: content_handle.into(),
        }
    }
}

/// Immutable marker → device lookup, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    by_marker: HashMap<String, DeviceMapping>,
}

impl DeviceRegistry {
    /// Later entries replace earlier ones that share a `marker_id`.
    pub fn from_mappings(mappings: impl IntoIterator<Item = DeviceMapping>) -> Self {
        let mut by_marker = HashMap::new();
        for mapping in mappings {
            let marker_id = mapping.marker_id.clone();
            if let Some(previous) = by_marker.insert(marker_id, mapping) {
                log_warn!(
                    "duplicate marker '{}' in device registry; '{}' replaced by a later entry",
                    previous.marker_id,
                    previous.device_id
                );
            }
        }
        Self { by_marker }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read device registry from {}", path.display()))?;
        let mappings: Vec<DeviceMapping> = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid device registry in {}", path.display()))?;
        Ok(Self::from_mappings(mappings))
    }

    pub fn resolve(&self, marker_id: &str) -> Option<&DeviceMapping> {
        self.by_marker.get(marker_id)
    }

    pub fn len(&self) -> usize {
        self.by_marker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_marker.is_empty()
    }
}
