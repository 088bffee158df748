pub mod integrator;

pub use integrator::{DragOutcome, MomentumStep, MotionState, MovementIntegrator};
