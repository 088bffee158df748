use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bincode::ErrorKind;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::MapConfig;
use crate::Vec2;

/// Compression level used when encoding map bundles.
const BUNDLE_COMPRESSION_LEVEL: i32 = 19;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] Box<ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Compression error: {0}")]
    Compression(#[source] std::io::Error),
    #[error("Invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Minimal string key-value storage, as offered by browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DataError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), DataError>;
    fn remove(&mut self, key: &str) -> Result<(), DataError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DataError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DataError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DataError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per entry inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, DataError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(FileStore {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DataError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(DataError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DataError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DataError> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DataError> {
        match fs::remove_file(self.path_for(key)?) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Persisted layout of the last known position.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedPosition {
    pub x: f32,
    pub y: f32,
}

pub fn save_position<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    pos: Vec2,
) -> Result<(), DataError> {
    let json = serde_json::to_string(&SavedPosition {
        x: pos[0],
        y: pos[1],
    })?;
    store.set(key, &json)
}

/// Reads the saved position; anything unusable is reported and treated as absent.
pub fn load_position<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Vec2> {
    let text = match store.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            warn!("Could not read saved position {key:?}: {err}");
            return None;
        }
    };
    match serde_json::from_str::<SavedPosition>(&text) {
        Ok(SavedPosition { x, y }) if x.is_finite() && y.is_finite() => Some([x, y]),
        Ok(saved) => {
            warn!("Ignoring non-finite saved position {saved:?}");
            None
        }
        Err(err) => {
            warn!("Ignoring malformed saved position {key:?}: {err}");
            None
        }
    }
}

/// Configuration and catalogue shipped together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapBundle {
    pub config: MapConfig,
    pub catalog: Catalog,
}

pub fn serialize_bundle(bundle: &MapBundle) -> Result<Vec<u8>, DataError> {
    let encoded = bincode::serialize(bundle)?;
    let mut cursor = Cursor::new(encoded);
    zstd::stream::encode_all(&mut cursor, BUNDLE_COMPRESSION_LEVEL).map_err(DataError::Compression)
}

pub fn deserialize_bundle(bytes: &[u8]) -> Result<MapBundle, DataError> {
    let mut cursor = Cursor::new(bytes);
    let decoded = zstd::stream::decode_all(&mut cursor).map_err(DataError::Compression)?;
    let mut bundle: MapBundle = bincode::deserialize(&decoded)?;
    bundle.catalog.rebuild_indices();
    Ok(bundle)
}

pub fn write_bundle_to_file<P: AsRef<Path>>(bundle: &MapBundle, path: P) -> Result<(), DataError> {
    let bytes = serialize_bundle(bundle)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_bundle_from_file<P: AsRef<Path>>(path: P) -> Result<MapBundle, DataError> {
    let bytes = fs::read(path)?;
    deserialize_bundle(&bytes)
}
