use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PoiKind, PointOfInterest};

static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    let mut home = PointOfInterest::new("home", "Home Planet", [2500.0, 2500.0], PoiKind::Planet);
    home.description = "Where your pet was hatched.".into();
    home.level = Some(1);
    home.discovered = true;

    let mut depot = PointOfInterest::new("depot", "Orbital Depot", [2900.0, 2300.0], PoiKind::Station);
    depot.description = "Snacks, toys and fuel.".into();
    depot.level = Some(2);

    let mut veil = PointOfInterest::new("veil", "Violet Veil", [4850.0, 150.0], PoiKind::Nebula);
    veil.description = "A glowing cloud right on the edge of the map.".into();
    veil.level = Some(4);

    let mut belt = PointOfInterest::new("belt", "Pebble Belt", [600.0, 4200.0], PoiKind::Asteroid);
    belt.description = "Rocks worth chewing on.".into();
    belt.level = Some(3);

    let mut frost = PointOfInterest::new("frost", "Frostbite", [1200.0, 900.0], PoiKind::Planet);
    frost.description = "Cold, quiet and full of fish.".into();
    frost.image = Some("planets/frost.png".into());
    frost.level = Some(5);

    Catalog::new(vec![home, depot, veil, belt, frost])
});

/// Built-in sample catalogue laid out on the default 5000x5000 world.
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate point of interest id {0}")]
    DuplicateId(String),
}

/// Ordered, read-only list of points of interest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pub pois: Vec<PointOfInterest>,
    #[serde(skip)]
    id_index: HashMap<String, usize>,
}

impl Catalog {
    /// The id index keeps the first occurrence of each id.
    /// Use [`Catalog::try_new`] to reject duplicates instead.
    pub fn new(pois: Vec<PointOfInterest>) -> Self {
        let mut catalog = Catalog {
            pois,
            id_index: HashMap::new(),
        };
        catalog.rebuild_indices();
        catalog
    }

    pub fn try_new(pois: Vec<PointOfInterest>) -> Result<Self, CatalogError> {
        let catalog = Self::new(pois);
        catalog.check_unique_ids()?;
        Ok(catalog)
    }

    pub fn check_unique_ids(&self) -> Result<(), CatalogError> {
        if self.id_index.len() == self.pois.len() {
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(self.pois.len());
        for poi in &self.pois {
            if !seen.insert(poi.id.as_str()) {
                return Err(CatalogError::DuplicateId(poi.id.clone()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&PointOfInterest> {
        self.index_of_id(id).map(|idx| &self.pois[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointOfInterest> {
        self.pois.iter()
    }

    pub fn rebuild_indices(&mut self) {
        let mut index = HashMap::with_capacity(self.pois.len());
        for (idx, poi) in self.pois.iter().enumerate() {
            index.entry(poi.id.clone()).or_insert(idx);
        }
        self.id_index = index;
    }
}
