pub mod catalog;
pub mod config;
pub mod data;
pub mod motion;
pub mod proximity;
pub mod render;
pub mod session;
pub mod space;

use serde::{Deserialize, Serialize};

/// 2D coordinate, either world units or screen pixels depending on context.
pub type Vec2 = [f32; 2];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PoiKind {
    Planet,
    Station,
    Nebula,
    Asteroid,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    /// Position in world units
    pub pos: Vec2,
    pub kind: PoiKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub discovered: bool,
}

impl PointOfInterest {
    pub fn new(id: &str, name: &str, pos: Vec2, kind: PoiKind) -> Self {
        PointOfInterest {
            id: id.into(),
            name: name.into(),
            pos,
            kind,
            description: String::new(),
            image: None,
            level: None,
            discovered: false,
        }
    }
}
