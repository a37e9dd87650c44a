//! The converted data directory: one pretty JSON record per file.
//!
//! ```text
//! <data>/themes/<slug>.json
//! <data>/variables/<slug>.json
//! <data>/eo-missions/<slug>.json
//! <data>/projects/<id>.json
//! <data>/products/<id>.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::RecordError;
use crate::ident::slugify;
use crate::types::{EoMission, Product, Project, Theme, Variable};

/// A record type with its own directory in the data tree.
pub trait Record: Serialize + DeserializeOwned {
    const DIR: &'static str;

    /// Label that names the record in messages (the raw name or id).
    fn label(&self) -> &str;

    fn file_stem(&self) -> String {
        slugify(self.label())
    }
}

impl Record for Theme {
    const DIR: &'static str = "themes";
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for Variable {
    const DIR: &'static str = "variables";
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for EoMission {
    const DIR: &'static str = "eo-missions";
    fn label(&self) -> &str {
        &self.name
    }
}

impl Record for Project {
    const DIR: &'static str = "projects";
    fn label(&self) -> &str {
        &self.id
    }
}

impl Record for Product {
    const DIR: &'static str = "products";
    fn label(&self) -> &str {
        &self.id
    }
}

/// The complete record set of one data directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    pub themes: Vec<Theme>,
    pub variables: Vec<Variable>,
    pub eo_missions: Vec<EoMission>,
    pub projects: Vec<Project>,
    pub products: Vec<Product>,
}

impl Records {
    /// Loads every category of `data_dir`; each category directory must exist.
    pub fn load(data_dir: &Path) -> Result<Self, RecordError> {
        let records = Records {
            themes: load_dir(data_dir)?,
            variables: load_dir(data_dir)?,
            eo_missions: load_dir(data_dir)?,
            projects: load_dir(data_dir)?,
            products: load_dir(data_dir)?,
        };
        info!(
            data_dir = %data_dir.display(),
            themes = records.themes.len(),
            variables = records.variables.len(),
            eo_missions = records.eo_missions.len(),
            projects = records.projects.len(),
            products = records.products.len(),
            "loaded records"
        );
        Ok(records)
    }

    /// Writes every record; two records of one category with the same file stem are rejected.
    pub fn store(&self, data_dir: &Path) -> Result<Vec<PathBuf>, RecordError> {
        let mut written = Vec::new();
        written.extend(store_dir(data_dir, &self.themes)?);
        written.extend(store_dir(data_dir, &self.variables)?);
        written.extend(store_dir(data_dir, &self.eo_missions)?);
        written.extend(store_dir(data_dir, &self.projects)?);
        written.extend(store_dir(data_dir, &self.products)?);
        Ok(written)
    }
}

/// Loads `<data_dir>/<T::DIR>/*.json` in file-name order.
pub fn load_dir<T: Record>(data_dir: &Path) -> Result<Vec<T>, RecordError> {
    let dir = data_dir.join(T::DIR);
    let entries = fs::read_dir(&dir).map_err(|err| RecordError::io(&dir, err))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| RecordError::io(&dir, err))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).map_err(|err| RecordError::io(&path, err))?;
        let record: T =
            serde_json::from_str(&text).map_err(|err| RecordError::MalformedDocument {
                path: path.clone(),
                message: err.to_string(),
            })?;
        out.push(record);
    }
    debug!(dir = %dir.display(), count = out.len(), "loaded record directory");
    Ok(out)
}

pub fn store_dir<T: Record>(data_dir: &Path, records: &[T]) -> Result<Vec<PathBuf>, RecordError> {
    let dir = data_dir.join(T::DIR);
    fs::create_dir_all(&dir).map_err(|err| RecordError::io(&dir, err))?;

    let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
    for record in records {
        let stem = record.file_stem();
        if let Some(first) = claimed.insert(stem.clone(), record.label()) {
            return Err(RecordError::DuplicateIdentifier {
                category: T::DIR,
                id: stem,
                first: first.to_string(),
                second: record.label().to_string(),
            });
        }
    }

    let mut written = Vec::with_capacity(records.len());
    for record in records {
        let path = dir.join(format!("{}.json", record.file_stem()));
        let mut text = serde_json::to_string_pretty(record)
            .map_err(|err| RecordError::MalformedDocument {
                path: path.clone(),
                message: err.to_string(),
            })?;
        text.push('\n');
        fs::write(&path, text).map_err(|err| RecordError::io(&path, err))?;
        written.push(path);
    }
    Ok(written)
}
