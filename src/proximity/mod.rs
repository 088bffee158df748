pub mod resolver;

pub use resolver::{ClickDecision, ClickGate, NearbyPoi, ProximityResolver};
