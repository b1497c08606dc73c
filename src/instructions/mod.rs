pub mod content;
pub mod loader;
pub mod presenter;
pub mod walker;

pub use content::{ContentSource, StaticContent};
pub use loader::{DeviceData, DeviceDataLoader};
pub use presenter::{LoggingPresenter, StepPresenter};
pub use walker::{InstructionWalker, NavigationCursor, Progress, ProgressChanged, StepChanged};
