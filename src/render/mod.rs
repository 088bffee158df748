pub mod projection;
pub mod starfield;

pub use projection::{
    boundary_ring, hit_test, project_all, project_poi, BoundaryRing, GhostStyle, Placement,
    Viewport,
};
pub use starfield::{StarPlacement, Starfield};
