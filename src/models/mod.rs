mod marker;
mod step;

pub use marker::{MarkerObservation, ObservationBatch, Pose, TrackingQuality};
pub use step::InstructionStep;
