use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::space::Topology;

/// Edge length of the default square toroidal world, in world units.
pub const DEFAULT_WORLD_SIZE: f32 = 5000.0;

/// Key under which the last known position is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "galaxy_map.position";

static DEFAULT_CONFIG: Lazy<MapConfig> = Lazy::new(MapConfig::default);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Drag and momentum tuning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Screen-pixel delta magnitude below which the facing angle is held.
    pub movement_threshold_px: f32,
    /// Added to the travel direction so the ship art points forward.
    pub facing_offset_deg: f32,
    pub momentum: bool,
    /// Weight of the newest sample in the velocity estimate, in `(0, 1]`.
    pub velocity_smoothing: f32,
    /// Exponential decay rate of coasting velocity, per second.
    pub momentum_friction: f32,
    pub momentum_max_secs: f32,
    /// World units per second below which coasting stops.
    pub momentum_min_speed: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        MotionConfig {
            movement_threshold_px: 2.0,
            facing_offset_deg: 90.0,
            momentum: true,
            velocity_smoothing: 0.3,
            momentum_friction: 4.0,
            momentum_max_secs: 2.0,
            momentum_min_speed: 5.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// World units spanned by the shorter viewport side.
    pub visible_span: f32,
    /// Band around the viewport, in pixels, where wrap duplicates are drawn.
    pub ghost_margin_px: f32,
    pub ghost_opacity: f32,
    /// Pointer hit radius around a POI placement, in pixels.
    pub hit_radius_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            visible_span: 1000.0,
            ghost_margin_px: 80.0,
            ghost_opacity: 0.5,
            hit_radius_px: 32.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarfieldConfig {
    pub seed: u64,
    pub stars_per_layer: usize,
    /// Parallax factor per layer; 1.0 scrolls with the map, smaller is farther away.
    pub layer_depths: Vec<f32>,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        StarfieldConfig {
            seed: 0x5eed_57a2,
            stars_per_layer: 60,
            layer_depths: vec![0.2, 0.5, 0.8],
        }
    }
}

/// Tunables for one map screen.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub topology: Topology,
    /// Maximum world distance at which a POI counts as nearby and is clickable.
    pub interaction_threshold: f32,
    /// Seconds between opportunistic position saves.
    pub save_interval_secs: f32,
    pub storage_key: String,
    pub motion: MotionConfig,
    pub render: RenderConfig,
    pub starfield: StarfieldConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            topology: Topology::Toroidal {
                width: DEFAULT_WORLD_SIZE,
                height: DEFAULT_WORLD_SIZE,
            },
            interaction_threshold: 150.0,
            save_interval_secs: 5.0,
            storage_key: DEFAULT_STORAGE_KEY.into(),
            motion: MotionConfig::default(),
            render: RenderConfig::default(),
            starfield: StarfieldConfig::default(),
        }
    }
}

impl MapConfig {
    /// Shared default instance.
    pub fn defaults() -> &'static MapConfig {
        &DEFAULT_CONFIG
    }

    pub fn from_json_str(json: &str) -> Result<MapConfig, ConfigError> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MapConfig, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.topology {
            Topology::Toroidal { width, height } => {
                if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
                    return Err(invalid(format!(
                        "toroidal world must have positive size, got {width}x{height}"
                    )));
                }
            }
            Topology::Bounded { radius } => {
                if !(radius > 0.0) || !radius.is_finite() {
                    return Err(invalid(format!(
                        "bounded world must have a positive radius, got {radius}"
                    )));
                }
            }
        }
        if !(self.interaction_threshold >= 0.0) {
            return Err(invalid("interaction_threshold must be non-negative".into()));
        }
        if !(self.save_interval_secs > 0.0) {
            return Err(invalid("save_interval_secs must be positive".into()));
        }
        if self.storage_key.is_empty() {
            return Err(invalid("storage_key must not be empty".into()));
        }
        let smoothing = self.motion.velocity_smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(invalid(format!(
                "velocity_smoothing must be in (0, 1], got {smoothing}"
            )));
        }
        if !(self.render.visible_span > 0.0) {
            return Err(invalid("visible_span must be positive".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
