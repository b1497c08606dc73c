pub mod coordinator;
pub mod registry;

pub use coordinator::{ActiveAnchor, DeviceRecognitionCoordinator, DeviceRecognized};
pub use registry::{DeviceMapping, DeviceRegistry};
