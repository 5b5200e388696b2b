use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `<dataset_root>/<rec_id>/meta.json`
fn metadata_path(dataset_root: &Path, rec_id: &str) -> PathBuf {
    dataset_root.join(rec_id).join("meta.json")
}

/// Read the metadata the recorder left behind.
///
/// Anything other than a readable JSON object yields an empty document.
pub fn read_metadata(dataset_root: &Path, rec_id: &str) -> Map<String, Value> {
    let path = metadata_path(dataset_root, rec_id);

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No metadata at {}", path.display());
            return Map::new();
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(meta)) => meta,
        Ok(_) => {
            warn!("Metadata in {} is not a JSON object", path.display());
            Map::new()
        }
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            Map::new()
        }
    }
}
