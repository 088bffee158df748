use serde::Serialize;

use crate::catalog::Catalog;
use crate::space::Topology;
use crate::{PointOfInterest, Vec2};

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct NearbyPoi {
    /// Index into the catalogue.
    pub index: usize,
    pub distance: f32,
}

/// Range checks between the viewer and points of interest.
#[derive(Clone, Copy, Debug)]
pub struct ProximityResolver {
    pub threshold: f32,
    pub topology: Topology,
}

impl ProximityResolver {
    pub fn new(topology: Topology, threshold: f32) -> Self {
        ProximityResolver {
            threshold,
            topology,
        }
    }

    pub fn distance(&self, from: Vec2, poi: &PointOfInterest) -> f32 {
        self.topology.distance(from, poi.pos)
    }

    pub fn is_in_range(&self, from: Vec2, poi: &PointOfInterest) -> bool {
        self.distance(from, poi) <= self.threshold
    }

    /// Every POI within range, in catalogue order.
    pub fn nearby(&self, catalog: &Catalog, from: Vec2) -> Vec<NearbyPoi> {
        catalog
            .iter()
            .enumerate()
            .filter_map(|(index, poi)| {
                let distance = self.distance(from, poi);
                (distance <= self.threshold).then_some(NearbyPoi { index, distance })
            })
            .collect()
    }

    /// The single closest in-range POI; ties go to the earlier catalogue entry.
    pub fn closest(&self, catalog: &Catalog, from: Vec2) -> Option<NearbyPoi> {
        Self::closest_of(&self.nearby(catalog, from))
    }

    pub fn closest_of(nearby: &[NearbyPoi]) -> Option<NearbyPoi> {
        nearby.iter().copied().fold(None, |best, candidate| match best {
            Some(b) if b.distance <= candidate.distance => Some(b),
            _ => Some(candidate),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickDecision {
    Accepted,
    IgnoredDragging,
    IgnoredOutOfRange,
}

impl ClickDecision {
    pub fn is_accepted(self) -> bool {
        self == ClickDecision::Accepted
    }
}

/// Separates a deliberate tap from the release of a pan gesture.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClickGate;

impl ClickGate {
    pub fn resolve(in_range: bool, dragging: bool) -> ClickDecision {
        if dragging {
            ClickDecision::IgnoredDragging
        } else if !in_range {
            ClickDecision::IgnoredOutOfRange
        } else {
            ClickDecision::Accepted
        }
    }
}
