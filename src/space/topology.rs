use serde::{Deserialize, Serialize};

use crate::Vec2;

/// Relative tolerance for treating a position as lying on the boundary circle.
const BOUNDARY_EPSILON: f32 = 1e-4;

/// Shape of the navigable world.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Edges wrap around: `[0, width) x [0, height)`.
    Toroidal { width: f32, height: f32 },
    /// Plane centred on the origin, navigation limited to a disc of `radius`.
    Bounded { radius: f32 },
}

impl Topology {
    pub fn is_toroidal(&self) -> bool {
        matches!(self, Topology::Toroidal { .. })
    }

    /// Displacement from `from` to `to`, taking the short way across seams.
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        match *self {
            Topology::Toroidal { width, height } => [
                wrapped_delta(from[0], to[0], width),
                wrapped_delta(from[1], to[1], height),
            ],
            Topology::Bounded { .. } => [to[0] - from[0], to[1] - from[1]],
        }
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        match *self {
            Topology::Toroidal { width, height } => toroidal_distance(a, b, width, height),
            Topology::Bounded { .. } => euclidean_distance(a, b),
        }
    }

    /// Brings an arbitrary position back into the valid region.
    pub fn constrain(&self, pos: Vec2) -> Vec2 {
        match *self {
            Topology::Toroidal { width, height } => {
                [wrap(pos[0], 0.0, width), wrap(pos[1], 0.0, height)]
            }
            Topology::Bounded { radius } => {
                if !pos[0].is_finite() || !pos[1].is_finite() {
                    return [0.0, 0.0];
                }
                clamp_to_circle(pos, radius)
            }
        }
    }

    /// Moves `pos` by `delta`, wrapping or sliding along the boundary wall.
    pub fn apply_move(&self, pos: Vec2, delta: Vec2) -> Vec2 {
        match *self {
            Topology::Toroidal { .. } => self.constrain([pos[0] + delta[0], pos[1] + delta[1]]),
            Topology::Bounded { radius } => slide_along_boundary(pos, delta, radius),
        }
    }

    /// Position used when nothing has been persisted yet.
    pub fn default_position(&self) -> Vec2 {
        match *self {
            Topology::Toroidal { width, height } => [width.max(0.0) / 2.0, height.max(0.0) / 2.0],
            Topology::Bounded { .. } => [0.0, 0.0],
        }
    }

    /// World span along each axis.
    pub fn extent(&self) -> Vec2 {
        match *self {
            Topology::Toroidal { width, height } => [width, height],
            Topology::Bounded { radius } => [radius * 2.0, radius * 2.0],
        }
    }
}

/// Normalises `value` into `[min, max)`.
///
/// Degenerate ranges (`max <= min`) and non-finite values yield `min`.
pub fn wrap(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if !(range > 0.0) || !value.is_finite() {
        return min;
    }
    let wrapped = min + (value - min).rem_euclid(range);
    // rem_euclid can round up to exactly `range` for tiny negative inputs
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

/// Shortest signed displacement from `a` to `b` on a circle of circumference `size`.
///
/// The result lies in `(-size / 2, size / 2]`. A non-positive `size` means the
/// axis does not wrap and the plain difference is returned.
pub fn wrapped_delta(a: f32, b: f32, size: f32) -> f32 {
    let d = b - a;
    if !(size > 0.0) {
        return d;
    }
    let folded = d.rem_euclid(size);
    if folded > size / 2.0 {
        folded - size
    } else {
        folded
    }
}

pub fn toroidal_distance(a: Vec2, b: Vec2, width: f32, height: f32) -> f32 {
    let dx = wrapped_delta(a[0], b[0], width);
    let dy = wrapped_delta(a[1], b[1], height);
    (dx * dx + dy * dy).sqrt()
}

pub fn euclidean_distance(a: Vec2, b: Vec2) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Egocentric projection: the viewer always lands on `screen_center`.
pub fn world_to_screen(
    world: Vec2,
    viewer: Vec2,
    screen_center: Vec2,
    scale: f32,
    topology: &Topology,
) -> Vec2 {
    let d = topology.delta(viewer, world);
    [screen_center[0] + d[0] * scale, screen_center[1] + d[1] * scale]
}

/// Projects `pos` onto the circle of `radius` around the origin if it lies outside.
pub fn clamp_to_circle(pos: Vec2, radius: f32) -> Vec2 {
    if !(radius > 0.0) {
        return [0.0, 0.0];
    }
    let dist = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    if dist <= radius {
        return pos;
    }
    let k = radius / dist;
    [pos[0] * k, pos[1] * k]
}

/// Edge-sliding clamp for a move of `delta` starting at `pos`.
///
/// From the interior the move stops at the wall along the attempted direction.
/// From the wall only the tangential part of `delta` is kept, then re-clamped.
pub fn slide_along_boundary(pos: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    if !(radius > 0.0) {
        return [0.0, 0.0];
    }
    let candidate = [pos[0] + delta[0], pos[1] + delta[1]];
    let candidate_dist = (candidate[0] * candidate[0] + candidate[1] * candidate[1]).sqrt();
    if candidate_dist <= radius {
        return candidate;
    }

    let dist = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    if radius - dist > BOUNDARY_EPSILON * radius {
        return clamp_to_circle(candidate, radius);
    }

    let angle = pos[1].atan2(pos[0]);
    let tangent = [-angle.sin(), angle.cos()];
    let along = delta[0] * tangent[0] + delta[1] * tangent[1];
    let slid = [pos[0] + tangent[0] * along, pos[1] + tangent[1] * along];
    clamp_to_circle(slid, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn wrap_stays_in_range_and_is_periodic() {
        for &v in &[-12_345.5_f32, -5000.0, -0.25, 0.0, 4999.9, 5000.0, 7321.0, 1e6] {
            let w = wrap(v, 0.0, 5000.0);
            assert!((0.0..5000.0).contains(&w), "wrap({v}) = {w}");
            for k in -3..=3 {
                let shifted = wrap(v + k as f32 * 5000.0, 0.0, 5000.0);
                let diff = wrapped_delta(w, shifted, 5000.0).abs();
                assert!(diff < 0.1, "periodicity broke for {v} k={k}");
            }
        }
        assert_approx_eq!(wrap(-1.0, 10.0, 20.0), 19.0);
    }

    #[test]
    fn wrap_degenerate_range_returns_min() {
        assert_eq!(wrap(42.0, 5.0, 5.0), 5.0);
        assert_eq!(wrap(42.0, 5.0, 1.0), 5.0);
        assert_eq!(wrap(f32::NAN, 0.0, 10.0), 0.0);
    }

    #[test]
    fn wrapped_delta_takes_short_way() {
        assert_approx_eq!(wrapped_delta(2500.0, 4999.0, 5000.0), 2499.0);
        assert_approx_eq!(wrapped_delta(10.0, 4990.0, 5000.0), -20.0);
        assert_approx_eq!(wrapped_delta(4990.0, 10.0, 5000.0), 20.0);
        for &(a, b) in &[(0.0_f32, 4000.0_f32), (100.0, -9000.0), (4999.0, 1.0), (7.0, 7.0)] {
            let d = wrapped_delta(a, b, 5000.0);
            assert!(d.abs() <= 2500.0);
            let landed = wrap(a + d, 0.0, 5000.0);
            assert!(wrapped_delta(landed, wrap(b, 0.0, 5000.0), 5000.0).abs() < 1e-2);
        }
    }

    #[test]
    fn toroidal_distance_is_symmetric_and_not_longer_than_plain() {
        let pairs = [
            ([10.0, 10.0], [4990.0, 4990.0]),
            ([2500.0, 100.0], [2600.0, 4900.0]),
            ([0.0, 0.0], [1000.0, 1000.0]),
        ];
        for (a, b) in pairs {
            let d_ab = toroidal_distance(a, b, 5000.0, 5000.0);
            let d_ba = toroidal_distance(b, a, 5000.0, 5000.0);
            assert_approx_eq!(d_ab, d_ba, 1e-3);
            assert!(d_ab <= euclidean_distance(a, b) + 1e-3);
        }
        let seam = toroidal_distance([10.0, 10.0], [4990.0, 4990.0], 5000.0, 5000.0);
        assert_approx_eq!(seam, (800.0_f32).sqrt(), 1e-3);
    }

    #[test]
    fn viewer_projects_to_screen_center() {
        let topo = Topology::Toroidal { width: 1000.0, height: 1000.0 };
        let s = world_to_screen([30.0, 40.0], [30.0, 40.0], [200.0, 150.0], 2.0, &topo);
        assert_eq!(s, [200.0, 150.0]);
        let across = world_to_screen([990.0, 40.0], [10.0, 40.0], [200.0, 150.0], 2.0, &topo);
        assert_approx_eq!(across[0], 160.0, 1e-3);
    }

    #[test]
    fn clamp_projects_along_same_angle() {
        let p = clamp_to_circle([150.0, 200.0], 200.0);
        assert_approx_eq!(euclidean_distance([0.0, 0.0], p), 200.0, 1e-3);
        assert_approx_eq!(p[1].atan2(p[0]), 200.0_f32.atan2(150.0), 1e-5);
        assert_eq!(clamp_to_circle([3.0, 4.0], 200.0), [3.0, 4.0]);
        assert_eq!(clamp_to_circle([3.0, 4.0], 0.0), [0.0, 0.0]);
    }

    #[test]
    fn slide_keeps_tangential_motion_on_wall() {
        // On the wall at angle 0, pushing outward and up: only the upward part survives.
        let moved = slide_along_boundary([200.0, 0.0], [50.0, 30.0], 200.0);
        assert!(moved[1] > 0.0);
        assert!(euclidean_distance([0.0, 0.0], moved) <= 200.0 + 1e-3);

        // Straight outward push on the wall goes nowhere.
        let stuck = slide_along_boundary([200.0, 0.0], [50.0, 0.0], 200.0);
        assert_approx_eq!(stuck[0], 200.0, 1e-3);
        assert_approx_eq!(stuck[1], 0.0, 1e-3);
    }

    #[test]
    fn slide_from_interior_reaches_wall() {
        let moved = slide_along_boundary([150.0, 0.0], [100.0, 0.0], 200.0);
        assert_approx_eq!(moved[0], 200.0, 1e-3);
        assert_approx_eq!(moved[1], 0.0, 1e-3);
    }

    #[test]
    fn bounded_topology_never_leaves_disc() {
        let topo = Topology::Bounded { radius: 200.0 };
        let mut pos = topo.default_position();
        for step in 0..200 {
            let angle = step as f32 * 0.37;
            pos = topo.apply_move(pos, [angle.cos() * 35.0, angle.sin() * 35.0]);
            assert!(euclidean_distance([0.0, 0.0], pos) <= 200.0 + 1e-2);
        }
        assert_eq!(topo.constrain([f32::NAN, 1.0]), [0.0, 0.0]);
    }
}
