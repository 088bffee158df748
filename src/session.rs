//! Event-driven controller for one galaxy map screen.
//!
//! The host forwards pointer, timer and resize events; the session owns the
//! viewer state and answers with a [`Frame`] describing what to draw.

use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::MapConfig;
use crate::data::{load_position, save_position, KeyValueStore};
use crate::motion::{DragOutcome, MomentumStep, MovementIntegrator};
use crate::proximity::{ClickDecision, ClickGate, NearbyPoi, ProximityResolver};
use crate::render::{
    boundary_ring, hit_test, project_all, BoundaryRing, GhostStyle, Placement, StarPlacement,
    Starfield, Viewport,
};
use crate::{PointOfInterest, Vec2};

/// Invoked with `(poi_id, poi)` when a click passes the range and drag checks.
pub type ClickHandler = Box<dyn FnMut(&str, &PointOfInterest)>;

/// Everything needed to draw one frame.
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub position: Vec2,
    pub facing_deg: f32,
    pub scale: f32,
    pub placements: Vec<Placement>,
    pub nearby: Vec<NearbyPoi>,
    pub closest: Option<NearbyPoi>,
    pub boundary: Option<BoundaryRing>,
    pub stars: Vec<StarPlacement>,
}

pub struct MapSession<S: KeyValueStore> {
    config: MapConfig,
    catalog: Catalog,
    store: S,
    viewport: Viewport,
    scale: f32,
    motion: MovementIntegrator,
    proximity: ProximityResolver,
    nearby: Vec<NearbyPoi>,
    starfield: Starfield,
    since_save: f32,
    on_click: Option<ClickHandler>,
}

impl<S: KeyValueStore> MapSession<S> {
    /// Restores the last saved position, or starts from the world default.
    ///
    /// A config that fails validation is replaced by the defaults so the map
    /// still comes up.
    pub fn mount(mut config: MapConfig, catalog: Catalog, store: S, viewport: Viewport) -> Self {
        if let Err(err) = config.validate() {
            warn!("Rejected map config, using defaults: {err}");
            config = MapConfig::default();
        }
        let topology = config.topology;
        let start = match load_position(&store, &config.storage_key) {
            Some(saved) => saved,
            None => {
                info!("No saved position, starting at world default");
                topology.default_position()
            }
        };
        let motion = MovementIntegrator::new(topology, config.motion.clone(), start);
        let proximity = ProximityResolver::new(topology, config.interaction_threshold);
        let starfield = Starfield::generate(&config.starfield);
        let scale = viewport.scale_for(config.render.visible_span);

        let mut session = MapSession {
            config,
            catalog,
            store,
            viewport,
            scale,
            motion,
            proximity,
            nearby: Vec::new(),
            starfield,
            since_save: 0.0,
            on_click: None,
        };
        session.on_moved();
        info!(
            "Mounted galaxy map with {} points of interest at {:?}",
            session.catalog.len(),
            session.position()
        );
        session
    }

    pub fn set_click_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&str, &PointOfInterest) + 'static,
    {
        self.on_click = Some(Box::new(handler));
    }

    pub fn position(&self) -> Vec2 {
        self.motion.position()
    }

    pub fn facing_deg(&self) -> f32 {
        self.motion.facing_deg()
    }

    pub fn is_dragging(&self) -> bool {
        self.motion.is_dragging()
    }

    pub fn nearby(&self) -> &[NearbyPoi] {
        &self.nearby
    }

    pub fn closest(&self) -> Option<NearbyPoi> {
        ProximityResolver::closest_of(&self.nearby)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scale = viewport.scale_for(self.config.render.visible_span);
        debug!(
            "Viewport resized to {}x{}, scale {}",
            viewport.width, viewport.height, self.scale
        );
    }

    pub fn pointer_down(&mut self) {
        self.motion.begin_drag();
    }

    /// `delta` is in screen pixels since the previous move; `dt` in seconds.
    pub fn pointer_move(&mut self, delta: Vec2, dt: f32) {
        self.motion.drag(delta, dt, self.scale);
        self.on_moved();
    }

    /// Ends the gesture and saves right away, whatever the save timer says.
    pub fn pointer_up(&mut self) -> DragOutcome {
        let outcome = self.motion.end_drag();
        self.on_moved();
        self.persist();
        outcome
    }

    /// Advances coasting and the periodic save timer by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        match self.motion.step(dt) {
            MomentumStep::Coasting => self.on_moved(),
            MomentumStep::Settled => {
                self.on_moved();
                self.persist();
            }
            MomentumStep::Idle => {}
        }

        if dt > 0.0 {
            self.since_save += dt;
        }
        if self.since_save >= self.config.save_interval_secs {
            self.persist();
        }
    }

    /// Gates a click on a POI. The first click after a pan is swallowed: hosts
    /// deliver it on release and it belongs to the gesture.
    pub fn click(&mut self, poi_index: usize) -> ClickDecision {
        let Some(poi) = self.catalog.pois.get(poi_index) else {
            debug!("Click on unknown POI index {poi_index} ignored");
            return ClickDecision::IgnoredOutOfRange;
        };
        let in_range = self.proximity.is_in_range(self.motion.position(), poi);
        let dragging = self.motion.is_dragging() || self.motion.pan_released();
        let decision = ClickGate::resolve(in_range, dragging);
        self.motion.clear_pan_release();
        if decision.is_accepted() {
            if let Some(handler) = self.on_click.as_mut() {
                handler(&poi.id, poi);
            }
        } else {
            debug!("Click on {} ignored: {decision:?}", poi.id);
        }
        decision
    }

    pub fn click_id(&mut self, id: &str) -> ClickDecision {
        match self.catalog.index_of_id(id) {
            Some(idx) => self.click(idx),
            None => {
                debug!("Click on unknown POI {id:?} ignored");
                ClickDecision::IgnoredOutOfRange
            }
        }
    }

    /// Resolves a tap at `point` to whichever copy of a POI is under it.
    /// Returns `None` when the tap hit nothing.
    pub fn click_at(&mut self, point: Vec2) -> Option<ClickDecision> {
        let placements = self.placements();
        let idx = hit_test(&placements, point, self.config.render.hit_radius_px)?;
        Some(self.click(idx))
    }

    pub fn placements(&self) -> Vec<Placement> {
        let style = GhostStyle {
            margin: self.config.render.ghost_margin_px,
            opacity: self.config.render.ghost_opacity,
        };
        project_all(
            &self.catalog,
            self.motion.position(),
            &self.viewport,
            self.scale,
            self.motion.topology(),
            &style,
        )
    }

    pub fn frame(&self) -> Frame {
        let position = self.motion.position();
        Frame {
            position,
            facing_deg: self.motion.facing_deg(),
            scale: self.scale,
            placements: self.placements(),
            nearby: self.nearby.clone(),
            closest: self.closest(),
            boundary: boundary_ring(position, &self.viewport, self.scale, self.motion.topology()),
            stars: self.starfield.project(&self.viewport),
        }
    }

    /// Saves the final position and hands the store back.
    pub fn unmount(mut self) -> S {
        self.persist();
        self.store
    }

    /// Keeps everything derived from the viewer position in step with it.
    fn on_moved(&mut self) {
        let position = self.motion.position();
        self.nearby = self.proximity.nearby(&self.catalog, position);
        self.starfield
            .follow(position, &self.viewport, self.scale, self.motion.topology());
    }

    fn persist(&mut self) {
        self.since_save = 0.0;
        let pos = self.motion.position();
        if let Err(err) = save_position(&mut self.store, &self.config.storage_key, pos) {
            warn!("Failed to save position {pos:?}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use crate::space::Topology;
    use crate::PoiKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn small_world() -> (MapConfig, Catalog) {
        let mut config = MapConfig::default();
        config.topology = Topology::Toroidal {
            width: 1000.0,
            height: 1000.0,
        };
        config.interaction_threshold = 50.0;
        config.render.visible_span = 500.0;
        let catalog = Catalog::new(vec![
            PointOfInterest::new("dock", "Dock", [520.0, 500.0], PoiKind::Station),
            PointOfInterest::new("rock", "Rock", [800.0, 500.0], PoiKind::Asteroid),
        ]);
        (config, catalog)
    }

    fn recorder(session: &mut MapSession<MemoryStore>) -> Rc<RefCell<Vec<String>>> {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        session.set_click_handler(move |id, _poi| sink.borrow_mut().push(id.to_owned()));
        clicks
    }

    #[test]
    fn mounts_at_world_center_without_saved_state() {
        let (config, catalog) = small_world();
        let session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        assert_eq!(session.position(), [500.0, 500.0]);
        assert_eq!(session.scale(), 1.0);
        assert_eq!(session.nearby().len(), 1);
        assert_eq!(session.closest().map(|n| n.index), Some(0));
    }

    #[test]
    fn click_only_fires_in_range_and_not_mid_drag() {
        let (config, catalog) = small_world();
        let mut session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        let clicks = recorder(&mut session);

        assert_eq!(session.click_id("rock"), ClickDecision::IgnoredOutOfRange);
        session.pointer_down();
        assert_eq!(session.click_id("dock"), ClickDecision::IgnoredDragging);
        session.pointer_up();
        assert_eq!(session.click_id("dock"), ClickDecision::Accepted);
        assert_eq!(session.click_id("nowhere"), ClickDecision::IgnoredOutOfRange);
        assert_eq!(*clicks.borrow(), vec!["dock".to_string()]);
    }

    #[test]
    fn first_click_after_pan_is_swallowed() {
        let (config, catalog) = small_world();
        let mut session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        let clicks = recorder(&mut session);

        session.pointer_down();
        session.pointer_move([30.0, 0.0], 0.016);
        session.pointer_move([-30.0, 0.0], 0.016);
        session.pointer_up();
        assert_eq!(session.click_id("dock"), ClickDecision::IgnoredDragging);
        assert_eq!(session.click_id("dock"), ClickDecision::Accepted);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let (mut config, catalog) = small_world();
        config.save_interval_secs = 0.0;
        let session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        assert_eq!(session.config().save_interval_secs, 5.0);
        assert_eq!(session.position(), [2500.0, 2500.0]);
    }

    #[test]
    fn click_at_screen_resolves_poi() {
        let (config, catalog) = small_world();
        let mut session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        let clicks = recorder(&mut session);
        // dock is 20 world units right of the viewer at scale 1
        assert_eq!(session.click_at([272.0, 250.0]), Some(ClickDecision::Accepted));
        assert_eq!(session.click_at([10.0, 10.0]), None);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn release_persists_and_remount_restores() {
        let (config, catalog) = small_world();
        let mut session = MapSession::mount(
            config.clone(),
            catalog.clone(),
            MemoryStore::new(),
            Viewport::new(500.0, 500.0),
        );
        session.pointer_down();
        session.pointer_move([100.0, 0.0], 0.0);
        session.pointer_up();
        assert_eq!(load_position(session.store(), &config.storage_key), Some([400.0, 500.0]));

        let store = session.unmount();
        let again = MapSession::mount(config, catalog, store, Viewport::new(500.0, 500.0));
        assert_eq!(again.position(), [400.0, 500.0]);
    }

    #[test]
    fn periodic_save_fires_on_interval() {
        let (mut config, catalog) = small_world();
        config.save_interval_secs = 1.0;
        config.motion.momentum = false;
        let key = config.storage_key.clone();
        let mut session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(500.0, 500.0));
        session.pointer_down();
        session.pointer_move([-30.0, 0.0], 0.016);
        session.tick(0.5);
        assert_eq!(load_position(session.store(), &key), None);
        session.tick(0.6);
        assert_eq!(load_position(session.store(), &key), Some([530.0, 500.0]));
    }

    #[test]
    fn resize_rederives_scale() {
        let (config, catalog) = small_world();
        let mut session = MapSession::mount(config, catalog, MemoryStore::new(), Viewport::new(0.0, 0.0));
        assert_eq!(session.scale(), 1.0);
        assert!(session.frame().placements.is_empty());
        session.resize(Viewport::new(1000.0, 2000.0));
        assert_eq!(session.scale(), 2.0);
        assert!(!session.frame().placements.is_empty());
    }
}
