//! Reference resolution.
//!
//! Theme, variable and mission names are declared identifiers and are looked
//! up verbatim. Project references hold a human name and are resolved
//! through [`slugify`], the same function that produced the project id.

use std::collections::BTreeMap;

use osc_records::{slugify, Records};

use crate::diagnostics::{Diagnostic, RefKind};

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    themes: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
    missions: BTreeMap<String, String>,
    projects: BTreeMap<String, String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &Records) -> Self {
        let mut vocab = Vocabulary::new();
        for theme in &records.themes {
            vocab.declare(RefKind::Theme, &theme.name, &slugify(&theme.name));
        }
        for variable in &records.variables {
            vocab.declare(RefKind::Variable, &variable.name, &slugify(&variable.name));
        }
        for mission in &records.eo_missions {
            vocab.declare(RefKind::Mission, &mission.name, &slugify(&mission.name));
        }
        for project in &records.projects {
            vocab.declare(RefKind::Project, &project.id, &slugify(&project.id));
        }
        vocab
    }

    /// Registers `name` as resolving to node `id`. Project names are keyed by slug.
    pub fn declare(&mut self, kind: RefKind, name: &str, id: &str) {
        let key = match kind {
            RefKind::Project => slugify(name),
            _ => name.to_string(),
        };
        self.map_mut(kind).entry(key).or_insert_with(|| id.to_string());
    }

    /// Node id `reference` resolves to, if declared.
    pub fn resolve(&self, kind: RefKind, reference: &str) -> Option<&str> {
        let found = match kind {
            RefKind::Project => self.projects.get(&slugify(reference)),
            _ => self.map(kind).get(reference),
        };
        found.map(String::as_str)
    }

    pub fn is_declared(&self, kind: RefKind, reference: &str) -> bool {
        self.resolve(kind, reference).is_some()
    }

    /// Declared names of `kind`, sorted.
    pub fn names(&self, kind: RefKind) -> impl Iterator<Item = &str> {
        self.map(kind).keys().map(String::as_str)
    }

    /// Resolves each reference, pushing a diagnostic for every miss.
    /// Returns the resolved node ids in reference order.
    pub fn resolve_all<'r>(
        &self,
        source: &str,
        kind: RefKind,
        references: impl IntoIterator<Item = &'r String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<String> {
        let mut ids = Vec::new();
        for reference in references {
            match self.resolve(kind, reference) {
                Some(id) => ids.push(id.to_string()),
                None => diagnostics.push(Diagnostic::unresolved(source, kind, reference)),
            }
        }
        ids
    }

    fn map(&self, kind: RefKind) -> &BTreeMap<String, String> {
        match kind {
            RefKind::Project => &self.projects,
            RefKind::Theme => &self.themes,
            RefKind::Variable => &self.variables,
            RefKind::Mission => &self.missions,
        }
    }

    fn map_mut(&mut self, kind: RefKind) -> &mut BTreeMap<String, String> {
        match kind {
            RefKind::Project => &mut self.projects,
            RefKind::Theme => &mut self.themes,
            RefKind::Variable => &mut self.variables,
            RefKind::Mission => &mut self.missions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_resolve_through_slugs() {
        let mut vocab = Vocabulary::new();
        vocab.declare(RefKind::Project, "cci-sea-level", "cci-sea-level");
        assert_eq!(
            vocab.resolve(RefKind::Project, "CCI Sea Level"),
            Some("cci-sea-level")
        );
        assert_eq!(vocab.resolve(RefKind::Project, "Nonexistent"), None);
    }

    #[test]
    fn vocabulary_names_resolve_verbatim() {
        let mut vocab = Vocabulary::new();
        vocab.declare(RefKind::Theme, "Ocean", "ocean");
        assert_eq!(vocab.resolve(RefKind::Theme, "Ocean"), Some("ocean"));
        assert_eq!(vocab.resolve(RefKind::Theme, "ocean"), None);
    }

    #[test]
    fn resolve_all_collects_misses() {
        let mut vocab = Vocabulary::new();
        vocab.declare(RefKind::Variable, "sea-level", "sea-level");
        let refs = vec!["sea-level".to_string(), "salinity".to_string()];
        let mut diags = Vec::new();
        let ids = vocab.resolve_all("products/p", RefKind::Variable, &refs, &mut diags);
        assert_eq!(ids, vec!["sea-level"]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].to_string(), "products/p: missing variable 'salinity'");
    }
}
