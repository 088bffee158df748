pub mod topology;

pub use topology::{
    clamp_to_circle, euclidean_distance, slide_along_boundary, toroidal_distance, world_to_screen,
    wrap, wrapped_delta, Topology,
};
