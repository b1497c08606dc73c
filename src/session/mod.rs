pub mod capability;
pub mod machine;
pub mod state;

pub use capability::{ArCapability, LibraryLoad, SimulatedCapability};
pub use machine::{SessionConfig, SessionStateMachine};
pub use state::{Availability, SessionAttempt, SessionSnapshot, SessionState, SessionStateChanged};
