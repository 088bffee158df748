use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::space::{world_to_screen, Topology};
use crate::{PointOfInterest, Vec2};

/// Upper bound on world repeats drawn along one axis when zoomed far out.
const MAX_TILE_REPEATS: i32 = 64;

/// Size of the hosting container in screen pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    /// True before first layout or when collapsed.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    pub fn center(&self) -> Vec2 {
        if self.is_degenerate() {
            return [0.0, 0.0];
        }
        [self.width / 2.0, self.height / 2.0]
    }

    /// Pixels per world unit so that `span` world units fill the shorter side.
    pub fn scale_for(&self, span: f32) -> f32 {
        if self.is_degenerate() || !(span > 0.0) {
            return 1.0;
        }
        self.width.min(self.height) / span
    }

    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p[0] >= -margin
            && p[0] <= self.width + margin
            && p[1] >= -margin
            && p[1] <= self.height + margin
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GhostStyle {
    pub margin: f32,
    pub opacity: f32,
}

/// One draw position for a POI.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    /// Index into the catalogue; shared by the primary and every ghost.
    pub poi_index: usize,
    pub screen: Vec2,
    pub ghost: bool,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BoundaryRing {
    pub center: Vec2,
    pub radius: f32,
}

/// Screen positions for one POI: the primary copy plus any wrap duplicates
/// that land inside the viewport margin.
///
/// Usually only neighbouring tiles can reach the margin, but when the world is
/// smaller on screen than the viewport every repeat that fits is drawn.
pub fn project_poi(
    poi_index: usize,
    poi: &PointOfInterest,
    viewer: Vec2,
    viewport: &Viewport,
    scale: f32,
    topology: &Topology,
    style: &GhostStyle,
) -> Vec<Placement> {
    let mut placements = Vec::new();
    if viewport.is_degenerate() {
        return placements;
    }

    let primary = world_to_screen(poi.pos, viewer, viewport.center(), scale, topology);
    if viewport.contains_with_margin(primary, style.margin) {
        placements.push(Placement {
            poi_index,
            screen: primary,
            ghost: false,
            opacity: 1.0,
        });
    }

    let Topology::Toroidal { width, height } = *topology else {
        return placements;
    };
    let (tile_w, tile_h) = (width * scale, height * scale);
    if !(tile_w > 0.0 && tile_h > 0.0) || !tile_w.is_finite() || !tile_h.is_finite() {
        return placements;
    }

    let xs = tile_range(primary[0], viewport.width, tile_w, style.margin);
    let ys = tile_range(primary[1], viewport.height, tile_h, style.margin);
    for j in ys {
        for i in xs.clone() {
            if i == 0 && j == 0 {
                continue;
            }
            let candidate = [primary[0] + i as f32 * tile_w, primary[1] + j as f32 * tile_h];
            if viewport.contains_with_margin(candidate, style.margin) {
                placements.push(Placement {
                    poi_index,
                    screen: candidate,
                    ghost: true,
                    opacity: style.opacity,
                });
            }
        }
    }
    placements
}

/// Tile offsets `k` for which `p + k * tile` can land in `[-margin, size + margin]`.
fn tile_range(p: f32, size: f32, tile: f32, margin: f32) -> std::ops::RangeInclusive<i32> {
    let lo = ((-margin - p) / tile).ceil().max(-MAX_TILE_REPEATS as f32) as i32;
    let hi = ((size + margin - p) / tile).floor().min(MAX_TILE_REPEATS as f32) as i32;
    lo..=hi
}

pub fn project_all(
    catalog: &Catalog,
    viewer: Vec2,
    viewport: &Viewport,
    scale: f32,
    topology: &Topology,
    style: &GhostStyle,
) -> Vec<Placement> {
    catalog
        .iter()
        .enumerate()
        .flat_map(|(idx, poi)| project_poi(idx, poi, viewer, viewport, scale, topology, style))
        .collect()
}

/// Catalogue index of the placement nearest to `point` within `radius` pixels.
pub fn hit_test(placements: &[Placement], point: Vec2, radius: f32) -> Option<usize> {
    placements
        .iter()
        .map(|p| {
            let dx = p.screen[0] - point[0];
            let dy = p.screen[1] - point[1];
            (p.poi_index, (dx * dx + dy * dy).sqrt())
        })
        .filter(|&(_, d)| d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

/// The bounded world's edge in screen space; hidden for wrapping worlds and
/// before the viewport has a size.
pub fn boundary_ring(
    viewer: Vec2,
    viewport: &Viewport,
    scale: f32,
    topology: &Topology,
) -> Option<BoundaryRing> {
    let Topology::Bounded { radius } = *topology else {
        return None;
    };
    if viewport.is_degenerate() {
        return None;
    }
    Some(BoundaryRing {
        center: world_to_screen([0.0, 0.0], viewer, viewport.center(), scale, topology),
        radius: radius * scale,
    })
}
