//! Summary statistics over an assembled [`Catalog`].
//!
//! One pass over the `projects` and `products` containers fills per-theme,
//! per-variable and per-mission accumulators; a shaping pass turns them
//! into [`GlobalMetrics`]. References to undeclared vocabulary are ignored
//! here (assembly already reported them).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use osc_records::{slugify, years_between};

use crate::assemble::{Catalog, THUMBNAIL_ASSET};
use crate::link::Rel;
use crate::node::{directory_url, Category, NodeFile};
use crate::paths::relative_href;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetrics {
    pub id: String,
    pub summary: GlobalSummary,
    pub themes: Vec<ThemeMetrics>,
    pub missions: Vec<MissionMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
    pub number_of_variables: usize,
    pub number_of_themes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeMetrics {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub website: Option<String>,
    pub summary: ThemeSummary,
    pub variables: Vec<VariableMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
    pub number_of_variables: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMetrics {
    pub name: String,
    pub description: String,
    pub summary: VariableSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionMetrics {
    pub name: String,
    pub summary: MissionSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSummary {
    pub years: Vec<i32>,
    pub number_of_products: usize,
    pub number_of_projects: usize,
    pub number_of_variables: usize,
}

#[derive(Default)]
struct Accumulator {
    products: BTreeSet<String>,
    projects: BTreeSet<String>,
    variables: BTreeSet<String>,
    years: BTreeSet<i32>,
}

impl Accumulator {
    fn years(&self) -> Vec<i32> {
        self.years.iter().copied().collect()
    }
}

/// Years covered by a node's first temporal interval; empty unless both ends are set.
fn node_years(file: &NodeFile) -> BTreeSet<i32> {
    file.node
        .extent
        .as_ref()
        .and_then(|extent| extent.closed_interval())
        .map(|(start, end)| years_between(&start, &end).collect())
        .unwrap_or_default()
}

/// Vocabulary accumulators keyed by declared (raw) name.
fn declared(catalog: &Catalog, category: Category) -> BTreeMap<String, Accumulator> {
    catalog
        .entries(category)
        .map(|file| (file.node.display_name().to_string(), Accumulator::default()))
        .collect()
}

/// Theme image href as seen from a document at the catalog root, absolute
/// below `publish_root` when one is given. External images pass through.
fn image_href(theme: &NodeFile, root_file: &Path, publish_root: Option<&Url>) -> Option<String> {
    let href = &theme.node.assets.get(THUMBNAIL_ASSET)?.href;
    let Some(path) = theme.resolve_href(href) else {
        return Some(href.clone());
    };
    let relative = relative_href(root_file, &path)
        .trim_start_matches("./")
        .to_string();
    match publish_root {
        Some(root) => Some(
            directory_url(root)
                .join(&relative)
                .map(|url| url.to_string())
                .unwrap_or(relative),
        ),
        None => Some(relative),
    }
}

/// Metrics for `catalog`; image hrefs are written for a document next to
/// the root catalog file.
pub fn build_metrics(id: &str, catalog: &Catalog, publish_root: Option<&Url>) -> GlobalMetrics {
    let mut themes = declared(catalog, Category::Themes);
    let mut variables = declared(catalog, Category::Variables);
    let mut missions = declared(catalog, Category::EoMissions);
    let mut global = Accumulator::default();

    for project in catalog.entries(Category::Projects) {
        global.projects.insert(project.id().to_string());
        for theme in &project.node.osc_themes {
            if let Some(acc) = themes.get_mut(theme) {
                acc.projects.insert(project.id().to_string());
            }
        }
    }

    for product in catalog.entries(Category::Products) {
        let product_id = product.id().to_string();
        let years = node_years(product);
        global.products.insert(product_id.clone());
        global.years.extend(years.iter().copied());

        let owner = product
            .node
            .osc_project
            .as_deref()
            .map(slugify)
            .filter(|project_id| catalog.entry(Category::Projects, project_id).is_some());
        let product_variables: Vec<&String> = product
            .node
            .osc_variables
            .iter()
            .filter(|name| variables.contains_key(*name))
            .collect();

        for theme in &product.node.osc_themes {
            if let Some(acc) = themes.get_mut(theme) {
                acc.products.insert(product_id.clone());
                acc.years.extend(years.iter().copied());
            }
        }
        for variable in &product_variables {
            if let Some(acc) = variables.get_mut(*variable) {
                acc.products.insert(product_id.clone());
                acc.years.extend(years.iter().copied());
            }
        }
        for mission in &product.node.osc_missions {
            if let Some(acc) = missions.get_mut(mission) {
                acc.products.insert(product_id.clone());
                acc.years.extend(years.iter().copied());
                acc.variables
                    .extend(product_variables.iter().map(|v| v.to_string()));
                if let Some(owner) = &owner {
                    acc.projects.insert(owner.clone());
                }
            }
        }
    }

    let theme_metrics = catalog
        .entries(Category::Themes)
        .map(|theme| {
            let name = theme.node.display_name().to_string();
            let variable_metrics: Vec<VariableMetrics> = catalog
                .entries(Category::Variables)
                .filter(|variable| variable.node.osc_themes.contains(&name))
                .map(|variable| {
                    let var_name = variable.node.display_name().to_string();
                    let acc = variables.get(&var_name);
                    VariableMetrics {
                        description: variable.node.description.clone(),
                        summary: VariableSummary {
                            years: acc.map(Accumulator::years).unwrap_or_default(),
                            number_of_products: acc.map(|a| a.products.len()).unwrap_or(0),
                        },
                        name: var_name,
                    }
                })
                .collect();
            let acc = themes.get(&name);
            ThemeMetrics {
                description: theme.node.description.clone(),
                image: image_href(theme, catalog.root_path(), publish_root),
                website: theme
                    .node
                    .first_link(Rel::Via)
                    .map(|link| link.href.clone()),
                summary: ThemeSummary {
                    years: acc.map(Accumulator::years).unwrap_or_default(),
                    number_of_products: acc.map(|a| a.products.len()).unwrap_or(0),
                    number_of_projects: acc.map(|a| a.projects.len()).unwrap_or(0),
                    number_of_variables: variable_metrics.len(),
                },
                variables: variable_metrics,
                name,
            }
        })
        .collect();

    let mission_metrics = catalog
        .entries(Category::EoMissions)
        .map(|mission| {
            let name = mission.node.display_name().to_string();
            let acc = missions.get(&name);
            MissionMetrics {
                summary: MissionSummary {
                    years: acc.map(Accumulator::years).unwrap_or_default(),
                    number_of_products: acc.map(|a| a.products.len()).unwrap_or(0),
                    number_of_projects: acc.map(|a| a.projects.len()).unwrap_or(0),
                    number_of_variables: acc.map(|a| a.variables.len()).unwrap_or(0),
                },
                name,
            }
        })
        .collect();

    GlobalMetrics {
        id: id.to_string(),
        summary: GlobalSummary {
            years: global.years(),
            number_of_products: global.products.len(),
            number_of_projects: global.projects.len(),
            number_of_variables: catalog.entry_count(Category::Variables),
            number_of_themes: catalog.entry_count(Category::Themes),
        },
        themes: theme_metrics,
        missions: mission_metrics,
    }
}
