//! Builds the linked node graph from a record set.
//!
//! Layout below `out_dir`:
//!
//! ```text
//! catalog.json
//! <category>/catalog.json
//! themes|variables|eo-missions/<id>/catalog.json
//! projects|products/<id>/collection.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use osc_records::{
    bbox_or_globe, EoMission, Product, Project, Records, Released, Theme, Variable,
    WHOLE_GLOBE_BBOX,
};

use crate::diagnostics::{Diagnostic, RefKind};
use crate::error::CatalogError;
use crate::ident::IdRegistry;
use crate::keywords::{apply_keywords, derive_keywords};
use crate::link::{media_type_for, Asset, LinkAttrs, Rel};
use crate::node::{Category, DocType, Extent, Node, NodeFile, OSC_EXTENSION, SCIENTIFIC_EXTENSION};
use crate::paths::{is_external, normalize};
use crate::resolve::Vocabulary;

pub const DEFAULT_LICENSE: &str = "proprietary";
pub const THUMBNAIL_ASSET: &str = "thumbnail";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleOptions {
    pub catalog_id: String,
    pub title: String,
    pub description: String,
    /// Write node files as indented JSON.
    pub pretty: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        AssembleOptions {
            catalog_id: "osc".to_string(),
            title: "Open Science Catalog".to_string(),
            description: "A catalog of publicly available geoscience products, datasets and resources developed in the frame of scientific research Projects funded by ESA EO".to_string(),
            pretty: true,
        }
    }
}

/// One source record, seen as the catalog node it becomes.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry<'r> {
    Theme(&'r Theme),
    Variable(&'r Variable),
    Mission(&'r EoMission),
    Project(&'r Project),
    Product(&'r Product),
}

impl<'r> CatalogEntry<'r> {
    pub fn category(&self) -> Category {
        match self {
            CatalogEntry::Theme(_) => Category::Themes,
            CatalogEntry::Variable(_) => Category::Variables,
            CatalogEntry::Mission(_) => Category::EoMissions,
            CatalogEntry::Project(_) => Category::Projects,
            CatalogEntry::Product(_) => Category::Products,
        }
    }

    /// Name the node id is derived from.
    pub fn label(&self) -> &'r str {
        match self {
            CatalogEntry::Theme(t) => &t.name,
            CatalogEntry::Variable(v) => &v.name,
            CatalogEntry::Mission(m) => &m.name,
            CatalogEntry::Project(p) => &p.id,
            CatalogEntry::Product(p) => &p.id,
        }
    }

    /// Creates the node for this record with its type, attributes and external links.
    pub fn to_node(&self, id: &str) -> Node {
        let category = self.category();
        let mut node = match self {
            CatalogEntry::Theme(theme) => {
                let mut node = Node::new(DocType::Catalog, id, theme.description.clone());
                node.osc_name = Some(theme.name.clone());
                node.title = Some(theme.name.clone());
                if let Some(link) = &theme.link {
                    node.add_external_link(Rel::Via, link.clone(), LinkAttrs::titled("Link"));
                }
                if let Some(image) = &theme.image {
                    let href = category_relative(image);
                    node.assets.insert(
                        THUMBNAIL_ASSET.to_string(),
                        Asset {
                            media_type: media_type_for(&href).map(str::to_string),
                            href,
                            title: Some(theme.name.clone()),
                            roles: vec![THUMBNAIL_ASSET.to_string()],
                        },
                    );
                }
                node
            }
            CatalogEntry::Variable(variable) => {
                let mut node = Node::new(DocType::Catalog, id, variable.description.clone());
                node.osc_name = Some(variable.name.clone());
                node.title = Some(variable.name.clone());
                node.osc_themes = variable.themes.clone();
                if let Some(link) = &variable.link {
                    node.add_external_link(Rel::Via, link.clone(), LinkAttrs::titled("Link"));
                }
                node
            }
            CatalogEntry::Mission(mission) => {
                let description = mission
                    .description
                    .clone()
                    .unwrap_or_else(|| mission.name.clone());
                let mut node = Node::new(DocType::Catalog, id, description);
                node.osc_name = Some(mission.name.clone());
                node.title = Some(mission.name.clone());
                if let Some(link) = &mission.link {
                    node.add_external_link(Rel::Via, link.clone(), LinkAttrs::titled("Link"));
                }
                node
            }
            CatalogEntry::Project(project) => {
                let mut node = Node::new(DocType::Collection, id, project.description.clone());
                node.title = Some(project.title.clone());
                node.osc_name = Some(project.name.clone());
                node.osc_status = Some(project.status);
                node.osc_themes = project.themes.clone();
                node.osc_consortium = project.consortium.clone();
                node.osc_technical_officer = Some(project.technical_officer.clone());
                node.license = Some(DEFAULT_LICENSE.to_string());
                node.extent = Some(Extent::new(
                    WHOLE_GLOBE_BBOX,
                    Some(project.start),
                    Some(project.end),
                ));
                node.add_external_link(
                    Rel::Via,
                    project.website.clone(),
                    LinkAttrs::titled("Website"),
                );
                if let Some(link) = &project.eo4society_link {
                    node.add_external_link(
                        Rel::Via,
                        link.clone(),
                        LinkAttrs::titled("EO4Society Link"),
                    );
                }
                node
            }
            CatalogEntry::Product(product) => {
                let mut node = Node::new(DocType::Collection, id, product.description.clone());
                node.title = Some(product.title.clone());
                node.osc_status = Some(product.status);
                node.osc_project = Some(product.project.clone());
                node.osc_themes = product.themes.clone();
                node.osc_variables = product.variables.clone();
                node.osc_missions = product.eo_missions.clone();
                node.osc_region = product.region.clone();
                node.version = product.version.clone();
                node.created = released_at(product.released);
                node.license = Some(DEFAULT_LICENSE.to_string());
                node.extent = Some(Extent::new(
                    bbox_or_globe(product.geometry.as_ref()),
                    product.start,
                    product.end,
                ));
                if let Some(doi) = &product.doi {
                    node.sci_doi = Some(doi.clone());
                    node.add_extension(SCIENTIFIC_EXTENSION);
                }
                if let Some(website) = &product.website {
                    node.add_external_link(Rel::Via, website.clone(), LinkAttrs::titled("Website"));
                }
                node.add_external_link(
                    Rel::Via,
                    product.access.clone(),
                    LinkAttrs::titled("Access"),
                );
                if let Some(documentation) = &product.documentation {
                    node.add_external_link(
                        Rel::Via,
                        documentation.clone(),
                        LinkAttrs::titled("Documentation"),
                    );
                }
                node
            }
        };
        node.osc_type = Some(category.kind());
        node.add_extension(OSC_EXTENSION);
        node.stac_extensions.sort();
        node
    }
}

fn released_at(released: Option<Released>) -> Option<DateTime<Utc>> {
    match released {
        Some(Released::Date(date)) => Some(osc_records::parse::start_of_day(date)),
        _ => None,
    }
}

/// Image paths in the data tree are relative to the category directory;
/// nodes live one level below it.
fn category_relative(href: &str) -> String {
    if is_external(href) {
        href.to_string()
    } else {
        format!("../{}", href.trim_start_matches("./"))
    }
}

/// Index of a node inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(usize);

/// In-memory arena of every node of one build, indexed by category + id and by path.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: Vec<NodeFile>,
    root: NodeIdx,
    containers: BTreeMap<Category, NodeIdx>,
    entries: BTreeMap<Category, BTreeMap<String, NodeIdx>>,
    by_path: BTreeMap<PathBuf, NodeIdx>,
}

impl Catalog {
    fn with_root(root: NodeFile) -> Self {
        let mut catalog = Catalog {
            nodes: Vec::new(),
            root: NodeIdx(0),
            containers: BTreeMap::new(),
            entries: BTreeMap::new(),
            by_path: BTreeMap::new(),
        };
        catalog.root = catalog.push(root);
        catalog
    }

    fn push(&mut self, file: NodeFile) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        self.by_path.insert(file.path.clone(), idx);
        self.nodes.push(file);
        idx
    }

    pub fn get(&self, idx: NodeIdx) -> &NodeFile {
        &self.nodes[idx.0]
    }

    pub fn get_mut(&mut self, idx: NodeIdx) -> &mut NodeFile {
        &mut self.nodes[idx.0]
    }

    pub fn root(&self) -> &NodeFile {
        self.get(self.root)
    }

    pub fn root_mut(&mut self) -> &mut NodeFile {
        let root = self.root;
        self.get_mut(root)
    }

    pub fn root_path(&self) -> &Path {
        &self.root().path
    }

    pub fn container(&self, category: Category) -> Option<&NodeFile> {
        self.containers.get(&category).map(|idx| self.get(*idx))
    }

    pub fn entry_idx(&self, category: Category, id: &str) -> Option<NodeIdx> {
        self.entries.get(&category)?.get(id).copied()
    }

    pub fn entry(&self, category: Category, id: &str) -> Option<&NodeFile> {
        self.entry_idx(category, id).map(|idx| self.get(idx))
    }

    /// Entries of one category in id order.
    pub fn entries(&self, category: Category) -> impl Iterator<Item = &NodeFile> {
        self.entries
            .get(&category)
            .into_iter()
            .flat_map(|ids| ids.values())
            .map(move |idx| self.get(*idx))
    }

    pub fn entry_count(&self, category: Category) -> usize {
        self.entries.get(&category).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn by_path(&self, path: &Path) -> Option<&NodeFile> {
        self.by_path.get(&normalize(path)).map(|idx| self.get(*idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeFile> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeFile> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds `child` under `parent` and the matching `parent` link back.
    pub fn link_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        let parent_path = self.get(parent).path.clone();
        let child_path = self.get(child).path.clone();
        let title = self.get(child).node.title.clone();
        self.get_mut(parent).add_link(
            Rel::Child,
            &child_path,
            LinkAttrs {
                title,
                media_type: None,
            },
        );
        self.get_mut(child)
            .add_link(Rel::Parent, &parent_path, LinkAttrs::default());
    }

    /// `related` links on both ends.
    pub fn link_related(&mut self, a: NodeIdx, b: NodeIdx) {
        let a_path = self.get(a).path.clone();
        let b_path = self.get(b).path.clone();
        let a_title = self.get(a).node.title.clone();
        let b_title = self.get(b).node.title.clone();
        self.get_mut(a).add_link(
            Rel::Related,
            &b_path,
            LinkAttrs {
                title: b_title,
                media_type: None,
            },
        );
        self.get_mut(b).add_link(
            Rel::Related,
            &a_path,
            LinkAttrs {
                title: a_title,
                media_type: None,
            },
        );
    }

    /// Persists every node. Returns the number of files written.
    pub fn save_all(&self) -> Result<usize, CatalogError> {
        for file in &self.nodes {
            file.save()?;
        }
        debug!(nodes = self.nodes.len(), "saved catalog");
        Ok(self.nodes.len())
    }

    fn add_node(&mut self, path: PathBuf, node: Node, pretty: bool) -> NodeIdx {
        let root_path = self.root_path().to_path_buf();
        let mut file = NodeFile::new(path, node);
        file.pretty = pretty;
        file.add_link(Rel::Root, &root_path, LinkAttrs::default());
        self.push(file)
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub catalog: Catalog,
    /// Unresolved references, in sorted order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds the full node graph for `records` below `out_dir`.
///
/// Nothing is written; call [`Catalog::save_all`] to persist. Unresolved
/// references become diagnostics; identifier collisions are fatal.
pub fn assemble(
    records: &Records,
    out_dir: &Path,
    options: &AssembleOptions,
) -> Result<Assembly, CatalogError> {
    let out_dir = normalize(out_dir);
    let mut registry = IdRegistry::new();
    let mut vocab = Vocabulary::new();
    let mut diagnostics = Vec::new();

    let mut root_node = Node::new(
        DocType::Catalog,
        options.catalog_id.clone(),
        options.description.clone(),
    );
    root_node.title = Some(options.title.clone());
    let mut root_file = NodeFile::new(out_dir.join(DocType::Catalog.file_name()), root_node);
    root_file.pretty = options.pretty;
    let root_path = root_file.path.clone();
    root_file.add_link(Rel::Root, &root_path, LinkAttrs::default());
    let mut catalog = Catalog::with_root(root_file);

    for category in Category::BUILD_ORDER {
        let mut node = Node::new(
            DocType::Catalog,
            category.dir_name(),
            format!("{} of the {}", category.title(), options.title),
        );
        node.title = Some(category.title().to_string());
        let path = out_dir
            .join(category.dir_name())
            .join(DocType::Catalog.file_name());
        let idx = catalog.add_node(path, node, options.pretty);
        catalog.containers.insert(category, idx);
        let root = catalog.root;
        catalog.link_child(root, idx);
    }

    for category in Category::BUILD_ORDER {
        let entries = claim_entries(records, category, &mut registry)?;
        let container = catalog.containers[&category];
        for (id, entry) in &entries {
            let node = entry.to_node(id);
            let path = out_dir
                .join(category.dir_name())
                .join(id)
                .join(category.entry_doc_type().file_name());
            let idx = catalog.add_node(path, node, options.pretty);
            catalog
                .entries
                .entry(category)
                .or_default()
                .insert(id.clone(), idx);
            catalog.link_child(container, idx);
            if let Some(kind) = ref_kind(category) {
                vocab.declare(kind, entry.label(), id);
            }
        }
        debug!(category = category.dir_name(), count = entries.len(), "created entries");
    }

    link_vocabulary(&mut catalog, records, &vocab, &mut diagnostics);
    link_products(&mut catalog, records, &vocab, &mut diagnostics);

    for file in catalog.nodes_mut() {
        let keywords = derive_keywords(&file.node);
        apply_keywords(&mut file.node, &keywords);
    }

    diagnostics.sort();
    for diagnostic in &diagnostics {
        debug!(rule = diagnostic.rule_id(), "{}", diagnostic);
    }
    info!(
        nodes = catalog.len(),
        diagnostics = diagnostics.len(),
        "assembled catalog"
    );
    Ok(Assembly {
        catalog,
        diagnostics,
    })
}

fn ref_kind(category: Category) -> Option<RefKind> {
    match category {
        Category::Projects => Some(RefKind::Project),
        Category::Themes => Some(RefKind::Theme),
        Category::Variables => Some(RefKind::Variable),
        Category::EoMissions => Some(RefKind::Mission),
        Category::Products => None,
    }
}

/// Claims an id for every record of `category`, then orders them by id.
fn claim_entries<'r>(
    records: &'r Records,
    category: Category,
    registry: &mut IdRegistry,
) -> Result<Vec<(String, CatalogEntry<'r>)>, CatalogError> {
    let entries: Vec<CatalogEntry<'r>> = match category {
        Category::Themes => records.themes.iter().map(CatalogEntry::Theme).collect(),
        Category::Variables => records.variables.iter().map(CatalogEntry::Variable).collect(),
        Category::EoMissions => records.eo_missions.iter().map(CatalogEntry::Mission).collect(),
        Category::Projects => records.projects.iter().map(CatalogEntry::Project).collect(),
        Category::Products => records.products.iter().map(CatalogEntry::Product).collect(),
    };
    let mut claimed = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = registry.claim(category, entry.label())?;
        claimed.push((id, entry));
    }
    claimed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(claimed)
}

fn source_label(category: Category, id: &str) -> String {
    format!("{}/{}", category.dir_name(), id)
}

/// Keeps the first occurrence of each id.
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// `related` links project↔theme and variable↔theme.
fn link_vocabulary(
    catalog: &mut Catalog,
    records: &Records,
    vocab: &Vocabulary,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for project in &records.projects {
        let id = osc_records::slugify(&project.id);
        let Some(idx) = catalog.entry_idx(Category::Projects, &id) else {
            continue;
        };
        let source = source_label(Category::Projects, &id);
        let themes = vocab.resolve_all(&source, RefKind::Theme, &project.themes, diagnostics);
        for theme_id in dedup_ids(themes) {
            if let Some(theme) = catalog.entry_idx(Category::Themes, &theme_id) {
                catalog.link_related(idx, theme);
            }
        }
    }

    for variable in &records.variables {
        let id = osc_records::slugify(&variable.name);
        let Some(idx) = catalog.entry_idx(Category::Variables, &id) else {
            continue;
        };
        let source = source_label(Category::Variables, &id);
        let themes = vocab.resolve_all(&source, RefKind::Theme, &variable.themes, diagnostics);
        for theme_id in dedup_ids(themes) {
            if let Some(theme) = catalog.entry_idx(Category::Themes, &theme_id) {
                catalog.link_related(idx, theme);
            }
        }
    }
}

/// `related` + `child` from the owning project and from every referenced
/// theme, variable and mission to each product.
fn link_products(
    catalog: &mut Catalog,
    records: &Records,
    vocab: &Vocabulary,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut products: Vec<&Product> = records.products.iter().collect();
    products.sort_by(|a, b| a.id.cmp(&b.id));

    for product in products {
        let id = osc_records::slugify(&product.id);
        let Some(idx) = catalog.entry_idx(Category::Products, &id) else {
            continue;
        };
        let source = source_label(Category::Products, &id);

        let mut targets: Vec<NodeIdx> = Vec::new();
        match vocab.resolve(RefKind::Project, &product.project) {
            Some(project_id) => {
                if let Some(project) = catalog.entry_idx(Category::Projects, project_id) {
                    targets.push(project);
                }
            }
            None => diagnostics.push(Diagnostic::unresolved(
                source.clone(),
                RefKind::Project,
                &product.project,
            )),
        }

        let references = [
            (RefKind::Theme, Category::Themes, &product.themes),
            (RefKind::Variable, Category::Variables, &product.variables),
            (RefKind::Mission, Category::EoMissions, &product.eo_missions),
        ];
        for (kind, category, names) in references {
            let ids = vocab.resolve_all(&source, kind, names.iter(), diagnostics);
            for target_id in dedup_ids(ids) {
                if let Some(target) = catalog.entry_idx(category, &target_id) {
                    targets.push(target);
                }
            }
        }

        for target in targets {
            catalog.link_related(target, idx);
            catalog.link_child(target, idx);
        }
    }
}
