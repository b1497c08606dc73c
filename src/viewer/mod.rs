pub mod console;
pub mod controller;
pub mod runtime;

pub use controller::{HelpRequested, ViewerController, ViewerDeps, ViewerEvents, ViewerSnapshot};
pub use runtime::{ViewerCommand, ViewerHandle, ViewerRuntime};
