use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use super::state::Availability;

/// The slice of the AR runtime the session machine drives.
pub trait ArCapability: Send {
    fn availability(&self) -> Availability;

    /// Whether a reference-image library must be loaded before tracking works.
    fn needs_reference_library(&self) -> bool;

    fn begin_reference_library_load(&mut self);

    fn reference_library_loaded(&self) -> bool;

    fn reset(&mut self);

    fn set_tracking_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryLoad {
    /// No reference library is required.
    NotNeeded,
    /// Completes only when [`SimulatedCapability::complete_library_load`] is called.
    Manual,
    /// Completes on its own once this much wall time has passed.
    After(Duration),
}

#[derive(Debug)]
struct SimState {
    availability: Availability,
    library: LibraryLoad,
    load_started: Option<Instant>,
    load_completed: bool,
    tracking_enabled: bool,
    reset_count: u32,
}

/// Scriptable stand-in for the AR runtime, used by the console binary and tests.
///
/// Clones share state, so a test can keep a handle after moving one clone
/// into the session machine.
#[derive(Debug, Clone)]
pub struct SimulatedCapability {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedCapability {
    pub fn new(availability: Availability, library: LibraryLoad) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                availability,
                library,
                load_started: None,
                load_completed: false,
                tracking_enabled: true,
                reset_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_availability(&self, availability: Availability) {
        self.lock().availability = availability;
    }

    pub fn complete_library_load(&self) {
        self.lock().load_completed = true;
    }

    pub fn library_load_started(&self) -> bool {
        self.lock().load_started.is_some()
    }

    pub fn tracking_enabled(&self) -> bool {
        self.lock().tracking_enabled
    }

    pub fn reset_count(&self) -> u32 {
        self.lock().reset_count
    }
}

impl ArCapability for SimulatedCapability {
    fn availability(&self) -> Availability {
        self.lock().availability
    }

    fn needs_reference_library(&self) -> bool {
        !matches!(self.lock().library, LibraryLoad::NotNeeded)
    }

    fn begin_reference_library_load(&mut self) {
        let mut state = self.lock();
        state.load_started = Some(Instant::now());
        state.load_completed = false;
    }

    fn reference_library_loaded(&self) -> bool {
        let state = self.lock();
        match (state.library, state.load_started) {
            (LibraryLoad::NotNeeded, _) => true,
            (_, None) => false,
            (LibraryLoad::Manual, Some(_)) => state.load_completed,
            (LibraryLoad::After(duration), Some(started)) => {
                state.load_completed || started.elapsed() >= duration
            }
        }
    }

    fn reset(&mut self) {
        let mut state = self.lock();
        state.reset_count += 1;
        state.load_started = None;
        state.load_completed = false;
    }

    fn set_tracking_enabled(&mut self, enabled: bool) {
        self.lock().tracking_enabled = enabled;
    }
}
