//! File-backed catalog nodes.
//!
//! A [`Node`] is the STAC-shaped document; a [`NodeFile`] pairs it with the
//! path it lives at so relative hrefs can be resolved and written.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use osc_records::{Contact, Status};

use crate::error::CatalogError;
use crate::link::{media_type_for, Asset, Link, LinkAttrs, Rel, MEDIA_JSON};
use crate::paths::{is_external, normalize, relative_href};

pub const STAC_VERSION: &str = "1.0.0";
pub const OSC_EXTENSION: &str = "https://stac-extensions.github.io/osc/v1.0.0/schema.json";
pub const SCIENTIFIC_EXTENSION: &str =
    "https://stac-extensions.github.io/scientific/v1.0.0/schema.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    Catalog,
    Collection,
}

impl DocType {
    /// File name used for documents of this type.
    pub fn file_name(&self) -> &'static str {
        match self {
            DocType::Catalog => "catalog.json",
            DocType::Collection => "collection.json",
        }
    }
}

/// The `osc:type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Theme,
    Variable,
    Mission,
    Project,
    Product,
}

impl NodeKind {
    pub fn category(&self) -> Category {
        match self {
            NodeKind::Theme => Category::Themes,
            NodeKind::Variable => Category::Variables,
            NodeKind::Mission => Category::EoMissions,
            NodeKind::Project => Category::Projects,
            NodeKind::Product => Category::Products,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Theme => "theme",
            NodeKind::Variable => "variable",
            NodeKind::Mission => "mission",
            NodeKind::Project => "project",
            NodeKind::Product => "product",
        }
    }
}

/// Fixed top-level category containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Projects,
    Themes,
    Variables,
    EoMissions,
    Products,
}

impl Category {
    /// Population order: referenced categories come before products.
    pub const BUILD_ORDER: [Category; 5] = [
        Category::Projects,
        Category::Themes,
        Category::Variables,
        Category::EoMissions,
        Category::Products,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Projects => "projects",
            Category::Themes => "themes",
            Category::Variables => "variables",
            Category::EoMissions => "eo-missions",
            Category::Products => "products",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Projects => "Projects",
            Category::Themes => "Themes",
            Category::Variables => "Variables",
            Category::EoMissions => "EO Missions",
            Category::Products => "Products",
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Category::Projects => NodeKind::Project,
            Category::Themes => NodeKind::Theme,
            Category::Variables => NodeKind::Variable,
            Category::EoMissions => NodeKind::Mission,
            Category::Products => NodeKind::Product,
        }
    }

    /// Projects and products are collections; vocabulary entries are catalogs.
    pub fn entry_doc_type(&self) -> DocType {
        match self {
            Category::Projects | Category::Products => DocType::Collection,
            _ => DocType::Catalog,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

impl Extent {
    pub fn new(bbox: [f64; 4], start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Extent {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent {
                interval: vec![[start, end]],
            },
        }
    }

    /// First interval when both ends are present.
    pub fn closed_interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.temporal.interval.first() {
            Some([Some(start), Some(end)]) => Some((*start, *end)),
            _ => None,
        }
    }
}

/// One persisted catalog document. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub id: String,
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(rename = "osc:type", default, skip_serializing_if = "Option::is_none")]
    pub osc_type: Option<NodeKind>,
    #[serde(rename = "osc:name", default, skip_serializing_if = "Option::is_none")]
    pub osc_name: Option<String>,
    #[serde(rename = "osc:status", default, skip_serializing_if = "Option::is_none")]
    pub osc_status: Option<Status>,
    #[serde(rename = "osc:project", default, skip_serializing_if = "Option::is_none")]
    pub osc_project: Option<String>,
    #[serde(rename = "osc:themes", default, skip_serializing_if = "Vec::is_empty")]
    pub osc_themes: Vec<String>,
    #[serde(rename = "osc:variables", default, skip_serializing_if = "Vec::is_empty")]
    pub osc_variables: Vec<String>,
    #[serde(rename = "osc:missions", default, skip_serializing_if = "Vec::is_empty")]
    pub osc_missions: Vec<String>,
    #[serde(rename = "osc:region", default, skip_serializing_if = "Option::is_none")]
    pub osc_region: Option<String>,
    #[serde(rename = "osc:consortium", default, skip_serializing_if = "Vec::is_empty")]
    pub osc_consortium: Vec<String>,
    #[serde(
        rename = "osc:technical_officer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub osc_technical_officer: Option<Contact>,
    #[serde(rename = "sci:doi", default, skip_serializing_if = "Option::is_none")]
    pub sci_doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, Asset>,
    /// Keys this crate does not interpret, kept for passthrough.
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(doc_type: DocType, id: impl Into<String>, description: impl Into<String>) -> Self {
        Node {
            doc_type,
            id: id.into(),
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: Vec::new(),
            title: None,
            description: description.into(),
            osc_type: None,
            osc_name: None,
            osc_status: None,
            osc_project: None,
            osc_themes: Vec::new(),
            osc_variables: Vec::new(),
            osc_missions: Vec::new(),
            osc_region: None,
            osc_consortium: Vec::new(),
            osc_technical_officer: None,
            sci_doi: None,
            version: None,
            created: None,
            updated: None,
            keywords: Vec::new(),
            license: None,
            extent: None,
            links: Vec::new(),
            assets: BTreeMap::new(),
            additional: BTreeMap::new(),
        }
    }

    pub fn add_extension(&mut self, uri: &str) {
        if !self.stac_extensions.iter().any(|e| e == uri) {
            self.stac_extensions.push(uri.to_string());
        }
    }

    pub fn links(&self, rel: Rel) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.rel == rel)
    }

    pub fn first_link(&self, rel: Rel) -> Option<&Link> {
        self.links(rel).next()
    }

    /// First link of `rel` whose title is `title`.
    pub fn titled_link(&self, rel: Rel, title: &str) -> Option<&Link> {
        self.links(rel)
            .find(|link| link.title.as_deref() == Some(title))
    }

    pub fn add_external_link(&mut self, rel: Rel, href: impl Into<String>, attrs: LinkAttrs) {
        let href = href.into();
        let media_type = attrs
            .media_type
            .or_else(|| media_type_for(&href).map(str::to_string));
        self.links.push(Link {
            rel,
            href,
            media_type,
            title: attrs.title,
        });
    }

    /// Display name: `osc:name`, then title, then id.
    pub fn display_name(&self) -> &str {
        self.osc_name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.id)
    }
}

/// A node together with the file it is persisted at.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFile {
    pub path: PathBuf,
    pub node: Node,
    /// Layout the node was read with; `save` writes the same layout back.
    pub pretty: bool,
}

impl NodeFile {
    pub fn new(path: impl Into<PathBuf>, node: Node) -> Self {
        NodeFile {
            path: normalize(&path.into()),
            node,
            pretty: true,
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|err| CatalogError::fs(path, err))?;
        let node: Node =
            serde_json::from_str(&text).map_err(|err| CatalogError::MalformedNode {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Ok(NodeFile {
            path: normalize(path),
            node,
            pretty: text.trim_end().contains('\n'),
        })
    }

    pub fn save(&self) -> Result<(), CatalogError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|err| CatalogError::fs(dir, err))?;
            }
        }
        let mut text = if self.pretty {
            serde_json::to_string_pretty(&self.node)
        } else {
            serde_json::to_string(&self.node)
        }
        .map_err(|err| CatalogError::MalformedNode {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        text.push('\n');
        fs::write(&self.path, text).map_err(|err| CatalogError::fs(&self.path, err))?;
        debug!(path = %self.path.display(), "saved node");
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Appends a link to `target` with an href relative to this node. No dedup.
    pub fn add_link(&mut self, rel: Rel, target: &Path, attrs: LinkAttrs) {
        let href = relative_href(&self.path, target);
        let media_type = attrs.media_type.or_else(|| Some(MEDIA_JSON.to_string()));
        self.node.links.push(Link {
            rel,
            href,
            media_type,
            title: attrs.title,
        });
    }

    /// Local file a relative href points at; `None` for external hrefs.
    pub fn resolve_href(&self, href: &str) -> Option<PathBuf> {
        if is_external(href) {
            return None;
        }
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        Some(normalize(&dir.join(href)))
    }

    /// Local targets of every `rel` link, in link order.
    pub fn link_targets(&self, rel: Rel) -> Vec<PathBuf> {
        self.node
            .links(rel)
            .filter_map(|link| self.resolve_href(&link.href))
            .collect()
    }

    /// Re-reads every child from disk.
    pub fn children(&self) -> Result<Vec<NodeFile>, CatalogError> {
        self.link_targets(Rel::Child)
            .iter()
            .map(|path| NodeFile::load(path))
            .collect()
    }

    pub fn items(&self) -> Result<Vec<NodeFile>, CatalogError> {
        self.link_targets(Rel::Item)
            .iter()
            .map(|path| NodeFile::load(path))
            .collect()
    }

    /// First local `parent` link, re-read from disk.
    pub fn parent(&self) -> Result<Option<NodeFile>, CatalogError> {
        match self.link_targets(Rel::Parent).first() {
            Some(path) => NodeFile::load(path).map(Some),
            None => Ok(None),
        }
    }

    /// Child whose id is `id`.
    pub fn child_by_id(&self, id: &str) -> Result<Option<NodeFile>, CatalogError> {
        Ok(self.children()?.into_iter().find(|child| child.id() == id))
    }
}

/// Rewrites every relative link and asset href under `root_file` to an
/// absolute URL below `publish_root`, adds a `self` link and saves each
/// node. Returns the number of nodes rewritten.
pub fn make_absolute(root_file: &Path, publish_root: &Url) -> Result<usize, CatalogError> {
    let root_file = normalize(root_file);
    let base_dir = root_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let publish_root = directory_url(publish_root);

    let mut visited: BTreeSet<PathBuf> = BTreeSet::new();
    let mut pending = vec![root_file];
    while let Some(path) = pending.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }
        let mut file = NodeFile::load(&path)?;
        pending.extend(file.link_targets(Rel::Child));
        pending.extend(file.link_targets(Rel::Item));

        let relative = relative_href(&base_dir.join("index"), &path);
        let own_url = publish_root
            .join(relative.trim_start_matches("./"))
            .map_err(|err| CatalogError::fs(&path, err))?;

        for link in file.node.links.iter_mut() {
            if !is_external(&link.href) {
                link.href = absolute(&own_url, &link.href, &path)?;
            }
        }
        for asset in file.node.assets.values_mut() {
            if !is_external(&asset.href) {
                asset.href = absolute(&own_url, &asset.href, &path)?;
            }
        }
        file.node.links.retain(|link| link.rel != Rel::SelfRef);
        file.node.links.push(Link {
            rel: Rel::SelfRef,
            href: own_url.to_string(),
            media_type: Some(MEDIA_JSON.to_string()),
            title: None,
        });
        file.save()?;
    }
    debug!(nodes = visited.len(), "rewrote hrefs as absolute");
    Ok(visited.len())
}

fn absolute(base: &Url, href: &str, path: &Path) -> Result<String, CatalogError> {
    base.join(href)
        .map(|url| url.to_string())
        .map_err(|err| CatalogError::fs(path, err))
}

/// `url` with a trailing slash, so relative joins land below it.
pub fn directory_url(url: &Url) -> Url {
    if url.path().ends_with('/') {
        return url.clone();
    }
    let mut dir = url.clone();
    let path = format!("{}/", url.path());
    dir.set_path(&path);
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(path: &Path, id: &str) -> NodeFile {
        NodeFile::new(path, Node::new(DocType::Catalog, id, format!("{} node", id)))
    }

    #[test]
    fn load_rejects_non_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let err = NodeFile::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedNode { .. }));
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{"type":"Catalog","id":"x","stac_version":"1.0.0","description":"d","links":[],"custom:field":{"a":1}}"#,
        )
        .unwrap();
        let file = NodeFile::load(&path).unwrap();
        assert!(!file.pretty);
        assert_eq!(file.node.additional["custom:field"]["a"], 1);
        file.save().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"custom:field\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn children_and_parent_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root_path = dir.path().join("catalog.json");
        let child_path = dir.path().join("themes/ocean/catalog.json");
        let mut root = catalog(&root_path, "root");
        let mut child = catalog(&child_path, "ocean");
        root.add_link(Rel::Child, &child.path, LinkAttrs::default());
        child.add_link(Rel::Parent, &root.path, LinkAttrs::default());
        root.save().unwrap();
        child.save().unwrap();

        assert_eq!(root.node.links[0].href, "./themes/ocean/catalog.json");
        assert_eq!(child.node.links[0].href, "../../catalog.json");

        let children = root.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), "ocean");
        assert_eq!(children[0].parent().unwrap().unwrap().id(), "root");
        assert!(root.child_by_id("ocean").unwrap().is_some());
        assert!(root.child_by_id("land").unwrap().is_none());

        let mut updated = child.clone();
        updated.node.title = Some("Ocean".to_string());
        updated.save().unwrap();
        let reread = root.children().unwrap();
        assert_eq!(reread[0].node.title.as_deref(), Some("Ocean"));
    }

    #[test]
    fn external_links_are_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut root = catalog(&dir.path().join("catalog.json"), "root");
        root.node
            .add_external_link(Rel::Child, "https://example.org/c.json", LinkAttrs::default());
        assert!(root.link_targets(Rel::Child).is_empty());
        assert!(root.children().unwrap().is_empty());
    }

    #[test]
    fn make_absolute_visits_shared_nodes_once() {
        let dir = tempfile::tempdir().unwrap();
        let root_path = dir.path().join("catalog.json");
        let a_path = dir.path().join("a/catalog.json");
        let shared_path = dir.path().join("shared/collection.json");

        let mut root = catalog(&root_path, "root");
        let mut a = catalog(&a_path, "a");
        let mut shared = NodeFile::new(
            &shared_path,
            Node::new(DocType::Collection, "shared", "shared node"),
        );
        root.add_link(Rel::Child, &a_path, LinkAttrs::default());
        root.add_link(Rel::Child, &shared_path, LinkAttrs::default());
        a.add_link(Rel::Child, &shared_path, LinkAttrs::default());
        a.add_link(Rel::Parent, &root_path, LinkAttrs::default());
        shared.add_link(Rel::Parent, &root_path, LinkAttrs::default());
        shared.add_link(Rel::Parent, &a_path, LinkAttrs::default());
        shared.node.assets.insert(
            "iso-metadata".to_string(),
            Asset {
                href: "./iso.xml".to_string(),
                media_type: None,
                title: None,
                roles: vec!["metadata".to_string()],
            },
        );
        root.save().unwrap();
        a.save().unwrap();
        shared.save().unwrap();

        let publish = Url::parse("https://example.org/osc").unwrap();
        assert_eq!(make_absolute(&root_path, &publish).unwrap(), 3);

        let shared = NodeFile::load(&shared_path).unwrap();
        let selfs: Vec<_> = shared.node.links(Rel::SelfRef).collect();
        assert_eq!(selfs.len(), 1);
        assert_eq!(selfs[0].href, "https://example.org/osc/shared/collection.json");
        let parents: Vec<_> = shared.node.links(Rel::Parent).map(|l| l.href.clone()).collect();
        assert_eq!(
            parents,
            vec![
                "https://example.org/osc/catalog.json".to_string(),
                "https://example.org/osc/a/catalog.json".to_string(),
            ]
        );
        assert_eq!(
            shared.node.assets["iso-metadata"].href,
            "https://example.org/osc/shared/iso.xml"
        );
    }
}
