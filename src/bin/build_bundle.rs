use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use galaxy_map_engine::catalog::Catalog;
use galaxy_map_engine::config::MapConfig;
use galaxy_map_engine::data::{write_bundle_to_file, MapBundle};
use galaxy_map_engine::PointOfInterest;
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BundleMetadata {
    config_source: Option<String>,
    catalog_source: String,
    points_of_interest: usize,
    wraps: bool,
    generated_at_epoch: u64,
}

/// Usage: `build_bundle <catalog.json> [config.json] [output_dir]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let catalog_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: build_bundle <catalog.json> [config.json] [output_dir]"))?;
    let config_path = args.next().map(PathBuf::from);
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));

    let config = match &config_path {
        Some(path) => MapConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            warn!("No config given, bundling default map settings");
            MapConfig::default()
        }
    };

    let catalog_json = fs::read_to_string(&catalog_path)
        .with_context(|| format!("failed to read catalog {}", catalog_path.display()))?;
    let pois: Vec<PointOfInterest> =
        serde_json::from_str(&catalog_json).context("failed to parse catalog JSON")?;
    let catalog = Catalog::try_new(pois).context("catalog is not usable")?;
    check_positions(&config, &catalog);

    fs::create_dir_all(&output_dir).context("failed to create bundle output directory")?;
    let bundle_path = output_dir.join("galaxy_map.bin");
    let bundle = MapBundle { config, catalog };
    write_bundle_to_file(&bundle, &bundle_path)
        .with_context(|| format!("failed to write bundle to {}", bundle_path.display()))?;

    let metadata = BundleMetadata {
        config_source: config_path.map(|p| p.display().to_string()),
        catalog_source: catalog_path.display().to_string(),
        points_of_interest: bundle.catalog.len(),
        wraps: bundle.config.topology.is_toroidal(),
        generated_at_epoch: current_epoch_seconds(),
    };
    let metadata_path = output_dir.join("galaxy_map.meta.json");
    fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)
        .with_context(|| format!("failed to write metadata to {}", metadata_path.display()))?;

    info!(
        "Wrote bundle to {} ({} points of interest)",
        bundle_path.display(),
        metadata.points_of_interest
    );
    Ok(())
}

/// POIs outside the navigable region can never be reached; warn but keep them.
fn check_positions(config: &MapConfig, catalog: &Catalog) {
    for poi in catalog.iter() {
        if config.topology.constrain(poi.pos) != poi.pos {
            warn!("{} at {:?} lies outside the world", poi.id, poi.pos);
        }
    }
}

fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
