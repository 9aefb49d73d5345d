use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use creative_core::error::{DiversityError, DiversityResult};
use creative_core::types::{CreativeDimensionValue, Dimension};
use tracing::info;

/// Immutable collection of creative values grouped by dimension.
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    by_dimension: BTreeMap<Dimension, Vec<CreativeDimensionValue>>,
    index: HashMap<String, (Dimension, usize)>,
}

impl PresetCatalog {
    /// Build a catalog, preserving input order within each dimension.
    /// Duplicate ids are rejected.
    pub fn from_values(
        values: impl IntoIterator<Item = CreativeDimensionValue>,
    ) -> DiversityResult<Self> {
        let mut by_dimension: BTreeMap<Dimension, Vec<CreativeDimensionValue>> = BTreeMap::new();
        let mut index = HashMap::new();

        for value in values {
            if value.id.trim().is_empty() {
                return Err(DiversityError::Catalog(format!(
                    "value '{}' has an empty id",
                    value.name
                )));
            }
            let slot = by_dimension.entry(value.dimension).or_default();
            if index
                .insert(value.id.clone(), (value.dimension, slot.len()))
                .is_some()
            {
                return Err(DiversityError::Catalog(format!(
                    "duplicate value id '{}'",
                    value.id
                )));
            }
            slot.push(value);
        }

        Ok(Self {
            by_dimension,
            index,
        })
    }

    /// Parse a JSON array of values.
    pub fn from_json_str(json: &str) -> DiversityResult<Self> {
        let values: Vec<CreativeDimensionValue> = serde_json::from_str(json)?;
        Self::from_values(values)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> DiversityResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            values = catalog.len(),
            dimensions = catalog.by_dimension.len(),
            "loaded preset catalog"
        );
        Ok(catalog)
    }

    /// All values of a dimension in catalog order (empty if none).
    pub fn values(&self, dimension: Dimension) -> &[CreativeDimensionValue] {
        self.by_dimension
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, id: &str) -> Option<&CreativeDimensionValue> {
        let (dimension, pos) = self.index.get(id)?;
        self.by_dimension.get(dimension)?.get(*pos)
    }

    /// Display name for an id, falling back to the id itself.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|v| v.name.as_str()).unwrap_or(id)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.by_dimension.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
