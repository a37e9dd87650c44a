//! The `build` pipeline: records in, published catalog tree out.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

use osc_catalog::link::{MEDIA_JSON, MEDIA_XML};
use osc_catalog::paths::relative_href;
use osc_catalog::{
    assemble, build_metrics, directory_url, make_absolute, propagate_updated, vocabulary_entries,
    Asset, Catalog, Category, Diagnostic, FormatContext, LinkAttrs, MetadataFormatter, Rel,
};
use osc_iso::{build_codelists, Iso19139Formatter, CODELISTS_FILE, ISO_ASSET};
use osc_records::{slugify, Records};

use crate::config::OscConfig;

pub const METRICS_FILE: &str = "metrics.json";
pub const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub out_dir: PathBuf,
    pub nodes: usize,
    pub projects: usize,
    pub products: usize,
    pub themes: usize,
    pub variables: usize,
    pub eo_missions: usize,
    pub metadata_records: usize,
    pub images_copied: usize,
    pub updated: DateTime<Utc>,
    pub publish_root: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

fn write_text(path: &Path, text: &str) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| format!("create {}: {}", dir.display(), err))?;
    }
    fs::write(path, text).map_err(|err| format!("write {}: {}", path.display(), err))
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<(), String> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| format!("json encode {}: {}", path.display(), err))?;
    text.push('\n');
    write_text(path, &text)
}

/// Where `path` will be published: an absolute URL below `publish_root`,
/// or a path relative to the catalog root.
fn published_href(out_dir: &Path, path: &Path, publish_root: Option<&Url>) -> Result<String, String> {
    let relative = relative_href(&out_dir.join("index"), path);
    let relative = relative.trim_start_matches("./");
    match publish_root {
        Some(root) => directory_url(root)
            .join(relative)
            .map(|url| url.to_string())
            .map_err(|err| format!("{}: {}", path.display(), err)),
        None => Ok(relative.to_string()),
    }
}

/// Renders `formatter` output next to every project and product node it
/// applies to and links it as an asset. Returns the number of files written.
fn write_metadata(
    catalog: &mut Catalog,
    formatter: &dyn MetadataFormatter,
    asset_key: &str,
    publish_root: Option<&Url>,
    datestamp: DateTime<Utc>,
) -> Result<usize, String> {
    let out_dir = catalog
        .root_path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut written = 0;
    for category in [Category::Projects, Category::Products] {
        let ids: Vec<String> = catalog
            .entries(category)
            .filter(|file| formatter.applies_to(&file.node))
            .map(|file| file.id().to_string())
            .collect();
        for id in ids {
            let Some(idx) = catalog.entry_idx(category, &id) else {
                continue;
            };
            let file = catalog.get(idx);
            let parent = file
                .node
                .osc_project
                .as_deref()
                .map(slugify)
                .filter(|project| catalog.entry(Category::Projects, project).is_some());
            let self_href = published_href(&out_dir, &file.path, publish_root)?;
            let ctx = FormatContext {
                self_href: &self_href,
                parent_identifier: parent.as_deref(),
                datestamp,
            };
            let text = formatter.format(&file.node, &ctx)?;
            let target = file.path.with_file_name(formatter.file_name());
            write_text(&target, &text)?;

            let asset = Asset {
                href: format!("./{}", formatter.file_name()),
                media_type: Some(formatter.media_type().to_string()),
                title: Some("ISO 19139 metadata".to_string()),
                roles: vec!["metadata".to_string()],
            };
            catalog
                .get_mut(idx)
                .node
                .assets
                .insert(asset_key.to_string(), asset);
            written += 1;
        }
    }
    debug!(records = written, "wrote metadata records");
    Ok(written)
}

/// Copies `<data>/<category>/images/**` into the same place below `out_dir`.
fn copy_images(data_dir: &Path, out_dir: &Path) -> Result<usize, String> {
    let mut copied = 0;
    for category in Category::BUILD_ORDER {
        let source = data_dir.join(category.dir_name()).join(IMAGES_DIR);
        if !source.is_dir() {
            continue;
        }
        let target = out_dir.join(category.dir_name()).join(IMAGES_DIR);
        for entry in WalkDir::new(&source).sort_by_file_name() {
            let entry = entry.map_err(|err| format!("walk {}: {}", source.display(), err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(|err| format!("{}: {}", entry.path().display(), err))?;
            let dest = target.join(relative);
            if let Some(dir) = dest.parent() {
                fs::create_dir_all(dir)
                    .map_err(|err| format!("create {}: {}", dir.display(), err))?;
            }
            fs::copy(entry.path(), &dest)
                .map_err(|err| format!("copy {}: {}", entry.path().display(), err))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Loads the converted records in `data_dir` and writes the full catalog to `out_dir`.
pub fn build_catalog(
    data_dir: &Path,
    out_dir: &Path,
    config: &OscConfig,
) -> Result<BuildSummary, String> {
    let publish_root = config.publish_root()?;
    let pretty = config.build.pretty_print;
    let records = Records::load(data_dir).map_err(|err| err.to_string())?;

    let assembly =
        assemble(&records, out_dir, &config.assemble_options()).map_err(|err| err.to_string())?;
    let mut catalog = assembly.catalog;
    let root_path = catalog.root_path().to_path_buf();
    let out_dir = root_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let metrics_path = out_dir.join(METRICS_FILE);
    let codelists_path = out_dir.join(CODELISTS_FILE);
    let root = catalog.root_mut();
    root.add_link(
        Rel::Alternate,
        &metrics_path,
        LinkAttrs::titled("Metrics").with_media_type(MEDIA_JSON),
    );
    root.add_link(
        Rel::Alternate,
        &codelists_path,
        LinkAttrs::titled("Codelists").with_media_type(MEDIA_XML),
    );

    let metadata_records = if config.build.add_iso {
        let datestamp = Utc::now().trunc_subsecs(0);
        write_metadata(
            &mut catalog,
            &Iso19139Formatter::new(),
            ISO_ASSET,
            publish_root.as_ref(),
            datestamp,
        )?
    } else {
        0
    };

    catalog.save_all().map_err(|err| err.to_string())?;

    let metrics = build_metrics(&config.catalog.id, &catalog, publish_root.as_ref());
    write_json(&metrics_path, &metrics, pretty)?;
    let codelists = build_codelists(
        &config.codelist_info(),
        &records.themes,
        &records.variables,
        &records.eo_missions,
    );
    write_text(&codelists_path, &codelists)?;
    for category in [Category::Themes, Category::Variables, Category::EoMissions] {
        let path = out_dir.join(format!("{}.json", category.dir_name()));
        write_json(&path, &vocabulary_entries(&catalog, category), pretty)?;
    }

    let images_copied = copy_images(data_dir, &out_dir)?;
    let updated = propagate_updated(&root_path).map_err(|err| err.to_string())?;
    if let Some(root) = &publish_root {
        let rewritten = make_absolute(&root_path, root).map_err(|err| err.to_string())?;
        debug!(nodes = rewritten, root = %root, "published with absolute hrefs");
    }

    info!(
        out_dir = %out_dir.display(),
        nodes = catalog.len(),
        diagnostics = assembly.diagnostics.len(),
        "built catalog"
    );
    Ok(BuildSummary {
        nodes: catalog.len(),
        projects: catalog.entry_count(Category::Projects),
        products: catalog.entry_count(Category::Products),
        themes: catalog.entry_count(Category::Themes),
        variables: catalog.entry_count(Category::Variables),
        eo_missions: catalog.entry_count(Category::EoMissions),
        out_dir,
        metadata_records,
        images_copied,
        updated,
        publish_root: publish_root.map(|url| url.to_string()),
        diagnostics: assembly.diagnostics,
    })
}
