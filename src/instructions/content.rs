use std::{collections::HashMap, sync::Arc};

use crate::models::InstructionStep;

/// Ordered steps per device. Implementations own any caching.
pub trait ContentSource: Send + Sync {
    /// Missing content is an empty sequence, never an error.
    fn steps(&self, device_id: &str) -> Arc<[InstructionStep]>;
}

/// Fixed in-memory content, mostly for wiring tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    devices: HashMap<String, Arc<[InstructionStep]>>,
}

impl StaticContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(
        mut self,
        device_id: impl Into<String>,
        steps: impl IntoIterator<Item = InstructionStep>,
    ) -> Self {
        self.devices
            .insert(device_id.into(), steps.into_iter().collect::<Vec<_>>().into());
        self
    }
}

impl ContentSource for StaticContent {
    fn steps(&self, device_id: &str) -> Arc<[InstructionStep]> {
        self.devices
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }
}
