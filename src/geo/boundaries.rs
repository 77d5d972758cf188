use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// The state boundary GeoJSON, loaded once and held for the lifetime of the
/// process. Regions are indexed by their `properties.st_nm` value.
#[derive(Debug, Clone)]
pub struct GeoBoundaries {
    document: Value,
    region_names: BTreeSet<String>,
}

impl GeoBoundaries {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading boundary file: {}", path.display()))?;
        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing boundary GeoJSON: {}", path.display()))?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self> {
        let features = document
            .get("features")
            .and_then(Value::as_array)
            .context("boundary document has no features array")?;
        let mut region_names = BTreeSet::new();
        for feature in features {
            if let Some(name) = feature.pointer("/properties/st_nm").and_then(Value::as_str) {
                region_names.insert(name.to_string());
            }
        }
        anyhow::ensure!(
            !region_names.is_empty(),
            "boundary document has no features with properties.st_nm"
        );
        Ok(Self {
            document,
            region_names,
        })
    }

    pub fn contains_region(&self, name: &str) -> bool {
        self.region_names.contains(name)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.region_names.iter().map(String::as_str)
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_document() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"st_nm": "Bihar"}, "geometry": null},
                {"type": "Feature", "properties": {"st_nm": "Goa"}, "geometry": null},
            ]
        })
    }

    #[test]
    fn indexes_region_names() {
        let boundaries = GeoBoundaries::from_value(sample_document()).unwrap();
        assert!(boundaries.contains_region("Bihar"));
        assert!(boundaries.contains_region("Goa"));
        assert!(!boundaries.contains_region("bihar"));
        assert_eq!(boundaries.region_names().count(), 2);
    }

    #[test]
    fn rejects_documents_without_features() {
        assert!(GeoBoundaries::from_value(json!({"type": "FeatureCollection"})).is_err());
        assert!(GeoBoundaries::from_value(json!({"features": []})).is_err());
    }
}
