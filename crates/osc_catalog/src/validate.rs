//! Reference and structure checks for a record set or an assembled tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use osc_records::{slugify, Records};

use crate::diagnostics::{Diagnostic, RefKind};
use crate::error::CatalogError;
use crate::ident::find_collisions;
use crate::link::Rel;
use crate::node::{Category, DocType, NodeFile, NodeKind};
use crate::paths::normalize;
use crate::resolve::Vocabulary;

/// What a validated directory turned out to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// A `convert` output: one JSON file per record.
    Records,
    /// A `build` output rooted at `catalog.json`.
    Catalog,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Records => "records",
            ValidationMode::Catalog => "catalog",
        }
    }
}

/// Validates `dir` as an assembled catalog when it holds a root
/// `catalog.json`, otherwise as a record directory.
pub fn validate_path(dir: &Path) -> Result<(ValidationMode, Vec<Diagnostic>), CatalogError> {
    let root = dir.join(DocType::Catalog.file_name());
    if root.is_file() {
        Ok((ValidationMode::Catalog, validate_catalog(&root)?))
    } else {
        let records = Records::load(dir)?;
        Ok((ValidationMode::Records, validate_records(&records)))
    }
}

fn source_label(category: Category, id: &str) -> String {
    format!("{}/{}", category.dir_name(), id)
}

/// Duplicate identifiers and unresolved references in a record set.
pub fn validate_records(records: &Records) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let namespaces: [(Category, Vec<&str>); 5] = [
        (Category::Themes, records.themes.iter().map(|t| t.name.as_str()).collect()),
        (Category::Variables, records.variables.iter().map(|v| v.name.as_str()).collect()),
        (Category::EoMissions, records.eo_missions.iter().map(|m| m.name.as_str()).collect()),
        (Category::Projects, records.projects.iter().map(|p| p.id.as_str()).collect()),
        (Category::Products, records.products.iter().map(|p| p.id.as_str()).collect()),
    ];
    for (category, labels) in namespaces {
        for (id, first, second) in find_collisions(labels) {
            diagnostics.push(Diagnostic::DuplicateIdentifier {
                namespace: category.dir_name().to_string(),
                id,
                first,
                second,
            });
        }
    }

    let vocab = Vocabulary::from_records(records);
    for project in &records.projects {
        let source = source_label(Category::Projects, &slugify(&project.id));
        vocab.resolve_all(&source, RefKind::Theme, &project.themes, &mut diagnostics);
    }
    for variable in &records.variables {
        let source = source_label(Category::Variables, &slugify(&variable.name));
        vocab.resolve_all(&source, RefKind::Theme, &variable.themes, &mut diagnostics);
    }
    for product in &records.products {
        let source = source_label(Category::Products, &slugify(&product.id));
        if !vocab.is_declared(RefKind::Project, &product.project) {
            diagnostics.push(Diagnostic::unresolved(
                source.clone(),
                RefKind::Project,
                &product.project,
            ));
        }
        vocab.resolve_all(&source, RefKind::Theme, &product.themes, &mut diagnostics);
        vocab.resolve_all(&source, RefKind::Variable, &product.variables, &mut diagnostics);
        vocab.resolve_all(&source, RefKind::Mission, &product.eo_missions, &mut diagnostics);
    }

    diagnostics.sort();
    info!(diagnostics = diagnostics.len(), "validated records");
    diagnostics
}

/// Maps the hrefs of a catalog tree back to files below its root directory.
/// A published tree carries absolute hrefs below the directory of the
/// root's `self` URL.
struct TreeHrefs {
    base_dir: PathBuf,
    publish_base: Option<String>,
}

impl TreeHrefs {
    fn for_root(root: &NodeFile) -> Self {
        let base_dir = root
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let publish_base = root
            .node
            .first_link(Rel::SelfRef)
            .and_then(|link| Url::parse(&link.href).ok())
            .and_then(|url| url.join("./").ok())
            .map(|url| url.to_string());
        TreeHrefs {
            base_dir,
            publish_base,
        }
    }

    fn local(&self, file: &NodeFile, href: &str) -> Option<PathBuf> {
        if let Some(path) = file.resolve_href(href) {
            return Some(path);
        }
        let rest = href.strip_prefix(self.publish_base.as_deref()?)?;
        Some(normalize(&self.base_dir.join(rest)))
    }

    fn targets(&self, file: &NodeFile, rel: Rel) -> Vec<PathBuf> {
        file.node
            .links(rel)
            .filter_map(|link| self.local(file, &link.href))
            .collect()
    }
}

/// Loads every node reachable from `root_file` through `child` links that
/// stay inside the tree.
fn load_tree(root_file: &Path) -> Result<(BTreeMap<PathBuf, NodeFile>, TreeHrefs), CatalogError> {
    let root = NodeFile::load(&normalize(root_file))?;
    let hrefs = TreeHrefs::for_root(&root);
    let mut nodes = BTreeMap::new();
    let mut pending = hrefs.targets(&root, Rel::Child);
    let mut seen = BTreeSet::from([root.path.clone()]);
    nodes.insert(root.path.clone(), root);
    while let Some(path) = pending.pop() {
        if !seen.insert(path.clone()) {
            continue;
        }
        let file = NodeFile::load(&path)?;
        pending.extend(hrefs.targets(&file, Rel::Child));
        nodes.insert(path, file);
    }
    debug!(
        nodes = nodes.len(),
        published = hrefs.publish_base.is_some(),
        "loaded catalog tree"
    );
    Ok((nodes, hrefs))
}

fn ref_kind(kind: NodeKind) -> Option<RefKind> {
    match kind {
        NodeKind::Theme => Some(RefKind::Theme),
        NodeKind::Variable => Some(RefKind::Variable),
        NodeKind::Mission => Some(RefKind::Mission),
        NodeKind::Project => Some(RefKind::Project),
        NodeKind::Product => None,
    }
}

/// Unresolved references, duplicate ids and parent/child asymmetry in an
/// assembled catalog.
pub fn validate_catalog(root_file: &Path) -> Result<Vec<Diagnostic>, CatalogError> {
    let (nodes, hrefs) = load_tree(root_file)?;
    let mut diagnostics = Vec::new();

    let mut vocab = Vocabulary::new();
    let mut first_seen: BTreeMap<(NodeKind, String), String> = BTreeMap::new();
    for file in nodes.values() {
        let Some(kind) = file.node.osc_type else {
            continue;
        };
        let label = file.node.display_name().to_string();
        match first_seen.get(&(kind, file.id().to_string())) {
            Some(first) => diagnostics.push(Diagnostic::DuplicateIdentifier {
                namespace: kind.category().dir_name().to_string(),
                id: file.id().to_string(),
                first: first.clone(),
                second: label.clone(),
            }),
            None => {
                first_seen.insert((kind, file.id().to_string()), label.clone());
            }
        }
        if let Some(ref_kind) = ref_kind(kind) {
            let name = match ref_kind {
                RefKind::Project => file.id(),
                _ => label.as_str(),
            };
            vocab.declare(ref_kind, name, file.id());
        }
    }

    for file in nodes.values() {
        let Some(kind) = file.node.osc_type else {
            continue;
        };
        let source = source_label(kind.category(), file.id());
        let node = &file.node;
        if let Some(project) = &node.osc_project {
            if !vocab.is_declared(RefKind::Project, project) {
                diagnostics.push(Diagnostic::unresolved(source.clone(), RefKind::Project, project));
            }
        }
        vocab.resolve_all(&source, RefKind::Theme, &node.osc_themes, &mut diagnostics);
        vocab.resolve_all(&source, RefKind::Variable, &node.osc_variables, &mut diagnostics);
        vocab.resolve_all(&source, RefKind::Mission, &node.osc_missions, &mut diagnostics);
    }

    for (path, file) in &nodes {
        for child_path in hrefs.targets(file, Rel::Child) {
            let Some(child) = nodes.get(&child_path) else {
                continue;
            };
            let back = hrefs
                .targets(child, Rel::Parent)
                .iter()
                .filter(|target| *target == path)
                .count();
            if back != 1 {
                diagnostics.push(Diagnostic::AsymmetricLink {
                    from: file.id().to_string(),
                    to: child.id().to_string(),
                    parent_links: back,
                });
            }
        }
    }

    diagnostics.sort();
    info!(
        nodes = nodes.len(),
        diagnostics = diagnostics.len(),
        "validated catalog"
    );
    Ok(diagnostics)
}
