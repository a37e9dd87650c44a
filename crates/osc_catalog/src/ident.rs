use std::collections::BTreeMap;

use osc_records::slugify;

use crate::error::CatalogError;
use crate::node::Category;

/// Tracks which label claimed each node id, per namespace.
#[derive(Debug, Default)]
pub struct IdRegistry {
    claimed: BTreeMap<Category, BTreeMap<String, String>>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the node id for `label` and claims it; a second claim of the
    /// same id in one namespace is an [`CatalogError::IdentifierCollision`].
    pub fn claim(&mut self, category: Category, label: &str) -> Result<String, CatalogError> {
        let id = slugify(label);
        if id.is_empty() {
            return Err(CatalogError::EmptyIdentifier {
                namespace: category.dir_name(),
                label: label.to_string(),
            });
        }
        let namespace = self.claimed.entry(category).or_default();
        if let Some(first) = namespace.get(&id) {
            return Err(CatalogError::IdentifierCollision {
                namespace: category.dir_name(),
                id,
                first: first.clone(),
                second: label.to_string(),
            });
        }
        namespace.insert(id.clone(), label.to_string());
        Ok(id)
    }

    pub fn contains(&self, category: Category, id: &str) -> bool {
        self.claimed
            .get(&category)
            .map(|ids| ids.contains_key(id))
            .unwrap_or(false)
    }
}

/// Every pair of labels in `labels` that maps to the same id, as `(id, first, second)`.
pub fn find_collisions<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<(String, String, String)> {
    let mut seen: BTreeMap<String, &'a str> = BTreeMap::new();
    let mut out = Vec::new();
    for label in labels {
        let id = slugify(label);
        match seen.get(&id) {
            Some(first) => out.push((id, first.to_string(), label.to_string())),
            None => {
                seen.insert(id, label);
            }
        }
    }
    out
}
