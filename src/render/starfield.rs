use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::StarfieldConfig;
use crate::render::projection::Viewport;
use crate::space::{wrap, Topology};
use crate::Vec2;

#[derive(Clone, Copy, Debug)]
struct Star {
    /// Normalised viewport position in `[0, 1)`.
    uv: Vec2,
    layer: usize,
    size: f32,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct StarPlacement {
    pub screen: Vec2,
    pub layer: usize,
    pub size: f32,
}

/// Background stars in parallax layers.
///
/// Each layer scrolls at its depth factor times the map speed and tiles the
/// viewport, so the field never runs out while panning. Scrolling is driven by
/// the viewer's shortest-path movement, which keeps the sky continuous when
/// the viewer crosses a wrap seam.
#[derive(Clone, Debug)]
pub struct Starfield {
    depths: Vec<f32>,
    stars: Vec<Star>,
    /// Per-layer scroll as a fraction of the viewport, in `[0, 1)`.
    offsets: Vec<Vec2>,
    anchor: Option<Vec2>,
}

impl Starfield {
    pub fn generate(config: &StarfieldConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut stars = Vec::with_capacity(config.layer_depths.len() * config.stars_per_layer);
        for (layer, &depth) in config.layer_depths.iter().enumerate() {
            for _ in 0..config.stars_per_layer {
                stars.push(Star {
                    uv: [rng.gen::<f32>(), rng.gen::<f32>()],
                    layer,
                    // nearer layers get bigger stars
                    size: 0.5 + depth * rng.gen_range(1.0_f32..2.5),
                });
            }
        }
        Starfield {
            depths: config.layer_depths.clone(),
            stars,
            offsets: vec![[0.0, 0.0]; config.layer_depths.len()],
            anchor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Scrolls the layers by the viewer's movement since the previous call.
    /// The first call only records where the viewer is.
    pub fn follow(&mut self, viewer: Vec2, viewport: &Viewport, scale: f32, topology: &Topology) {
        let Some(prev) = self.anchor.replace(viewer) else {
            return;
        };
        if viewport.is_degenerate() {
            return;
        }
        let [dx, dy] = topology.delta(prev, viewer);
        for (offset, depth) in self.offsets.iter_mut().zip(&self.depths) {
            offset[0] = wrap(offset[0] - dx * scale * depth / viewport.width, 0.0, 1.0);
            offset[1] = wrap(offset[1] - dy * scale * depth / viewport.height, 0.0, 1.0);
        }
    }

    pub fn project(&self, viewport: &Viewport) -> Vec<StarPlacement> {
        if viewport.is_degenerate() {
            return Vec::new();
        }
        let (w, h) = (viewport.width, viewport.height);
        self.stars
            .iter()
            .map(|star| {
                let offset = self.offsets[star.layer];
                StarPlacement {
                    screen: [
                        wrap(star.uv[0] + offset[0], 0.0, 1.0) * w,
                        wrap(star.uv[1] + offset[1], 0.0, 1.0) * h,
                    ],
                    layer: star.layer,
                    size: star.size,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::wrapped_delta;
    use assert_approx_eq::assert_approx_eq;

    const TORUS: Topology = Topology::Toroidal {
        width: 5000.0,
        height: 5000.0,
    };

    fn largest_jump(before: &[StarPlacement], after: &[StarPlacement], vp: &Viewport) -> f32 {
        before
            .iter()
            .zip(after)
            .map(|(b, a)| {
                let dx = wrapped_delta(b.screen[0], a.screen[0], vp.width);
                let dy = wrapped_delta(b.screen[1], a.screen[1], vp.height);
                (dx * dx + dy * dy).sqrt()
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn same_seed_same_sky() {
        let config = StarfieldConfig::default();
        let vp = Viewport::new(640.0, 480.0);
        let a = Starfield::generate(&config).project(&vp);
        let b = Starfield::generate(&config).project(&vp);
        assert_eq!(a, b);
        assert_eq!(a.len(), 180);
    }

    #[test]
    fn deeper_layers_move_slower() {
        let config = StarfieldConfig {
            seed: 1,
            stars_per_layer: 4,
            layer_depths: vec![0.25, 1.0],
        };
        let mut field = Starfield::generate(&config);
        let vp = Viewport::new(800.0, 600.0);
        field.follow([100.0, 0.0], &vp, 1.0, &TORUS);
        let before = field.project(&vp);
        field.follow([140.0, 0.0], &vp, 1.0, &TORUS);
        let after = field.project(&vp);
        for (b, a) in before.iter().zip(&after) {
            let moved = wrapped_delta(b.screen[0], a.screen[0], vp.width);
            let expected = -40.0 * config.layer_depths[b.layer];
            assert_approx_eq!(moved, expected, 1e-2);
            assert!(a.screen[0] >= 0.0 && a.screen[0] < vp.width);
        }
    }

    #[test]
    fn crossing_the_seam_does_not_jump() {
        let mut field = Starfield::generate(&StarfieldConfig::default());
        let vp = Viewport::new(800.0, 600.0);
        field.follow([4999.9, 2500.0], &vp, 0.6, &TORUS);
        let before = field.project(&vp);
        field.follow([0.0, 2500.0], &vp, 0.6, &TORUS);
        let after = field.project(&vp);
        assert!(largest_jump(&before, &after, &vp) < 0.1);

        // Stepping back restores the sky exactly.
        field.follow([4999.9, 2500.0], &vp, 0.6, &TORUS);
        assert!(largest_jump(&before, &field.project(&vp), &vp) < 1e-2);
    }

    #[test]
    fn nothing_drawn_before_layout() {
        let mut field = Starfield::generate(&StarfieldConfig::default());
        let empty = Viewport::new(0.0, 0.0);
        field.follow([0.0, 0.0], &empty, 1.0, &TORUS);
        field.follow([10.0, 0.0], &empty, 1.0, &TORUS);
        assert!(field.project(&empty).is_empty());
    }
}
