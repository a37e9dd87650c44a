//! Flat vocabulary listings (`themes.json`, `variables.json`, `eo-missions.json`).

use serde::{Deserialize, Serialize};

use crate::assemble::Catalog;
use crate::link::Rel;
use crate::node::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Entries of a vocabulary category in id order.
pub fn vocabulary_entries(catalog: &Catalog, category: Category) -> Vec<VocabularyEntry> {
    catalog
        .entries(category)
        .map(|file| VocabularyEntry {
            id: file.id().to_string(),
            name: file.node.display_name().to_string(),
            description: file.node.description.clone(),
            link: file.node.first_link(Rel::Via).map(|link| link.href.clone()),
        })
        .collect()
}
