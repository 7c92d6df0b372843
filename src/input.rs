//! Loading feature collections from disk or stdin.

use anyhow::Context;
use feature_types::FeatureCollection;
use std::io::Read;
use std::path::Path;

/// Read a GeoJSON FeatureCollection from `path`, or from stdin when `path` is "-".
pub fn read_collection(path: &Path) -> anyhow::Result<FeatureCollection> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read feature collection from stdin")?;
        return parse_collection(&buf).context("Failed to parse feature collection from stdin");
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let collection: FeatureCollection = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse feature collection from {}", path.display()))?;
    tracing::debug!(
        "Loaded {} features from {}",
        collection.features.len(),
        path.display()
    );
    Ok(collection)
}

pub fn parse_collection(json: &str) -> anyhow::Result<FeatureCollection> {
    Ok(serde_json::from_str(json)?)
}
