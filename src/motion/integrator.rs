use log::debug;

use crate::config::MotionConfig;
use crate::space::{wrap, Topology};
use crate::Vec2;

/// Position, velocity and heading of the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    pub position: Vec2,
    /// World units per second, smoothed over recent drag samples.
    pub velocity: Vec2,
    /// Degrees in `[0, 360)`, 0 pointing up the screen, clockwise.
    pub facing_deg: f32,
    pub dragging: bool,
    pub coasting: bool,
    pub momentum_elapsed: f32,
    /// Screen pixels travelled by the current or last gesture.
    pub travel_px: f32,
    /// Set when the last gesture moved further than a tap; the click the host
    /// delivers after such a release belongs to the pan.
    pub pan_released: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragOutcome {
    pub position: Vec2,
    pub coasting: bool,
    pub panned: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MomentumStep {
    /// Still moving after this step.
    Coasting,
    /// Came to rest during this step.
    Settled,
    /// Nothing to do.
    Idle,
}

/// Turns drag gestures into viewer movement.
///
/// Dragging the map to the right moves the viewer to the left.
#[derive(Clone, Debug)]
pub struct MovementIntegrator {
    topology: Topology,
    config: MotionConfig,
    state: MotionState,
}

impl MovementIntegrator {
    pub fn new(topology: Topology, config: MotionConfig, start: Vec2) -> Self {
        MovementIntegrator {
            topology,
            config,
            state: MotionState {
                position: topology.constrain(start),
                velocity: [0.0, 0.0],
                facing_deg: 0.0,
                dragging: false,
                coasting: false,
                momentum_elapsed: 0.0,
                travel_px: 0.0,
                pan_released: false,
            },
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    pub fn facing_deg(&self) -> f32 {
        self.state.facing_deg
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn is_coasting(&self) -> bool {
        self.state.coasting
    }

    pub fn pan_released(&self) -> bool {
        self.state.pan_released
    }

    /// Forgets that the last gesture was a pan.
    pub fn clear_pan_release(&mut self) {
        self.state.pan_released = false;
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn begin_drag(&mut self) {
        self.state.dragging = true;
        self.state.coasting = false;
        self.state.velocity = [0.0, 0.0];
        self.state.momentum_elapsed = 0.0;
        self.state.travel_px = 0.0;
        self.state.pan_released = false;
    }

    /// Applies one drag update of `screen_delta` pixels that took `dt` seconds.
    pub fn drag(&mut self, screen_delta: Vec2, dt: f32, scale: f32) -> Vec2 {
        if !self.state.dragging {
            debug!("drag update outside of a gesture ignored");
            return self.state.position;
        }
        let [dx, dy] = screen_delta;
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return self.state.position;
        }

        let magnitude = (dx * dx + dy * dy).sqrt();
        self.state.travel_px += magnitude;

        let scale = if scale > 0.0 && scale.is_finite() { scale } else { 1.0 };
        let world_delta = [-dx / scale, -dy / scale];
        self.state.position = self.topology.apply_move(self.state.position, world_delta);

        if magnitude > self.config.movement_threshold_px {
            let heading = (-dy).atan2(-dx).to_degrees() + self.config.facing_offset_deg;
            self.state.facing_deg = wrap(heading, 0.0, 360.0);
        }

        if dt > 0.0 {
            let alpha = self.config.velocity_smoothing;
            let v = &mut self.state.velocity;
            v[0] = v[0] * (1.0 - alpha) + world_delta[0] / dt * alpha;
            v[1] = v[1] * (1.0 - alpha) + world_delta[1] / dt * alpha;
        }

        self.state.position
    }

    pub fn end_drag(&mut self) -> DragOutcome {
        if self.state.dragging {
            self.state.pan_released = self.state.travel_px > self.config.movement_threshold_px;
        }
        self.state.dragging = false;
        self.state.momentum_elapsed = 0.0;
        self.state.coasting =
            self.config.momentum && self.speed() >= self.config.momentum_min_speed;
        if !self.state.coasting {
            self.state.velocity = [0.0, 0.0];
        }
        DragOutcome {
            position: self.state.position,
            coasting: self.state.coasting,
            panned: self.state.pan_released,
        }
    }

    /// Advances post-release coasting by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> MomentumStep {
        if !self.state.coasting {
            return MomentumStep::Idle;
        }
        if !(dt > 0.0) {
            return MomentumStep::Coasting;
        }

        let v = self.state.velocity;
        self.state.position = self
            .topology
            .apply_move(self.state.position, [v[0] * dt, v[1] * dt]);
        let decay = (-self.config.momentum_friction * dt).exp();
        self.state.velocity = [v[0] * decay, v[1] * decay];
        self.state.momentum_elapsed += dt;

        if self.state.momentum_elapsed >= self.config.momentum_max_secs
            || self.speed() < self.config.momentum_min_speed
        {
            self.state.coasting = false;
            self.state.velocity = [0.0, 0.0];
            MomentumStep::Settled
        } else {
            MomentumStep::Coasting
        }
    }

    /// Jumps to `pos`, cancelling any motion.
    pub fn teleport(&mut self, pos: Vec2) {
        self.state.position = self.topology.constrain(pos);
        self.state.velocity = [0.0, 0.0];
        self.state.coasting = false;
        self.state.momentum_elapsed = 0.0;
    }

    fn speed(&self) -> f32 {
        let [vx, vy] = self.state.velocity;
        (vx * vx + vy * vy).sqrt()
    }
}
