use crate::error::InferenceError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Class names of the building-defect dataset, in output-index order.
pub const DEFAULT_LABELS: [&str; 7] = [
    "algae",
    "major_crack",
    "minor_crack",
    "normal",
    "peeling",
    "spalling",
    "stain",
];

/// Mapping from output-tensor indices to class names.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRegistry {
    by_index: BTreeMap<usize, String>,
}

impl LabelRegistry {
    pub fn from_mapping(name_to_index: HashMap<String, usize>) -> Result<Self, InferenceError> {
        let mut by_index: BTreeMap<usize, String> = BTreeMap::new();

        for (name, index) in &name_to_index {
            if let Some(existing) = by_index.get(index) {
                // Order the pair so the message does not depend on hash order.
                let (first, second) = if existing < name {
                    (existing.clone(), name.clone())
                } else {
                    (name.clone(), existing.clone())
                };
                return Err(InferenceError::DuplicateLabelIndex {
                    index: *index,
                    first,
                    second,
                });
            }
            by_index.insert(*index, name.clone());
        }

        Ok(Self { by_index })
    }

    pub fn default_registry() -> Self {
        let by_index = DEFAULT_LABELS
            .iter()
            .enumerate()
            .map(|(index, name)| (index, name.to_string()))
            .collect();

        Self { by_index }
    }

    /// Reads a JSON object of `{"class_name": index}` pairs.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::LabelMap(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, InferenceError> {
        let mapping: HashMap<String, usize> =
            serde_json::from_str(contents).map_err(|e| InferenceError::LabelMap(e.to_string()))?;
        Self::from_mapping(mapping)
    }

    pub fn name_for(&self, index: usize) -> Result<&str, InferenceError> {
        self.by_index
            .get(&index)
            .map(String::as_str)
            .ok_or(InferenceError::LabelNotFound(index))
    }

    #[cfg(test)]
    pub fn index_for(&self, name: &str) -> Option<usize> {
        self.iter()
            .find(|(_, label)| *label == name)
            .map(|(index, _)| index)
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.by_index
            .iter()
            .map(|(index, name)| (*index, name.as_str()))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.by_index.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }
}
