use galaxy_map_engine::catalog::default_catalog;
use galaxy_map_engine::config::MapConfig;
use galaxy_map_engine::data::{read_bundle_from_file, MapBundle};
use galaxy_map_engine::motion::MovementIntegrator;
use galaxy_map_engine::proximity::ProximityResolver;
use galaxy_map_engine::render::{boundary_ring, project_all, BoundaryRing, GhostStyle, Viewport};
use galaxy_map_engine::Vec2;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Points at a bundle produced by `build_bundle`; the built-in sample map is used otherwise.
const BUNDLE_PATH_ENV: &str = "GALAXY_MAP_BUNDLE";

static BUNDLE: Lazy<MapBundle> = Lazy::new(|| {
    if let Ok(path) = std::env::var(BUNDLE_PATH_ENV) {
        match read_bundle_from_file(&path) {
            Ok(bundle) => {
                info!("Loaded map bundle from {path} ({} POIs)", bundle.catalog.len());
                return bundle;
            }
            Err(err) => warn!("Could not load map bundle {path}: {err}; using sample map"),
        }
    }
    MapBundle {
        config: MapConfig::defaults().clone(),
        catalog: default_catalog().clone(),
    }
});

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineRequest {
    Frame {
        viewer: Vec2,
        viewport: Viewport,
    },
    Distance {
        from: Vec2,
        to: Vec2,
    },
    Drag {
        position: Vec2,
        /// Screen-pixel pointer deltas, applied in order.
        deltas: Vec<Vec2>,
        viewport: Viewport,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineResponse {
    Frame {
        placements: Vec<PlacementResult>,
        nearby: Vec<NearbyResult>,
        closest: Option<String>,
        boundary: Option<BoundaryRing>,
    },
    Distance {
        distance: f32,
    },
    Drag {
        position: Vec2,
        facing_deg: f32,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct PlacementResult {
    id: String,
    screen: Vec2,
    ghost: bool,
    opacity: f32,
}

#[derive(Debug, Serialize)]
struct NearbyResult {
    id: String,
    name: String,
    distance: f32,
}

async fn handler(event: LambdaEvent<EngineRequest>) -> Result<EngineResponse, Error> {
    let bundle = &*BUNDLE;
    let config = &bundle.config;
    let catalog = &bundle.catalog;
    let topology = config.topology;
    match event.payload {
        EngineRequest::Frame { viewer, viewport } => {
            if !viewer[0].is_finite() || !viewer[1].is_finite() {
                return Ok(EngineResponse::Error {
                    message: format!("Viewer position must be finite, got {viewer:?}"),
                });
            }
            let viewer = topology.constrain(viewer);
            let scale = viewport.scale_for(config.render.visible_span);
            let style = GhostStyle {
                margin: config.render.ghost_margin_px,
                opacity: config.render.ghost_opacity,
            };
            let placements = project_all(catalog, viewer, &viewport, scale, &topology, &style)
                .into_iter()
                .map(|p| PlacementResult {
                    id: catalog.pois[p.poi_index].id.clone(),
                    screen: p.screen,
                    ghost: p.ghost,
                    opacity: p.opacity,
                })
                .collect();
            let resolver = ProximityResolver::new(topology, config.interaction_threshold);
            let nearby = resolver.nearby(catalog, viewer);
            let closest = ProximityResolver::closest_of(&nearby)
                .map(|n| catalog.pois[n.index].id.clone());
            let nearby = nearby
                .into_iter()
                .map(|n| {
                    let poi = &catalog.pois[n.index];
                    NearbyResult {
                        id: poi.id.clone(),
                        name: poi.name.clone(),
                        distance: n.distance,
                    }
                })
                .collect();
            Ok(EngineResponse::Frame {
                placements,
                nearby,
                closest,
                boundary: boundary_ring(viewer, &viewport, scale, &topology),
            })
        }
        EngineRequest::Distance { from, to } => Ok(EngineResponse::Distance {
            distance: topology.distance(from, to),
        }),
        EngineRequest::Drag {
            position,
            deltas,
            viewport,
        } => {
            let scale = viewport.scale_for(config.render.visible_span);
            let mut motion = MovementIntegrator::new(topology, config.motion.clone(), position);
            motion.begin_drag();
            for delta in deltas {
                motion.drag(delta, 0.0, scale);
            }
            motion.end_drag();
            Ok(EngineResponse::Drag {
                position: motion.position(),
                facing_deg: motion.facing_deg(),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let func = service_fn(handler);
    lambda_runtime::run(func).await
}
