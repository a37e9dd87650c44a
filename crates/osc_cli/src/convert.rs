use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use osc_catalog::find_collisions;
use osc_records::{
    read_eo_missions, read_products, read_projects, read_themes, read_variables, EoMission,
    Product, Project, Record, RecordError, Records, Theme, Variable,
};

#[derive(Debug, Clone)]
pub struct ConvertInput {
    pub themes: PathBuf,
    pub variables: PathBuf,
    pub eo_missions: PathBuf,
    pub projects: PathBuf,
    pub products: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub out_dir: PathBuf,
    pub themes: usize,
    pub variables: usize,
    pub eo_missions: usize,
    pub projects: usize,
    pub products: usize,
    pub files_written: usize,
    pub stale_removed: usize,
}

fn read_table<T, F>(path: &Path, read: F) -> Result<Vec<T>, String>
where
    F: FnOnce(&str, File) -> Result<Vec<T>, RecordError>,
{
    let file = File::open(path).map_err(|err| format!("open {}: {}", path.display(), err))?;
    let rows = read(&path.display().to_string(), file).map_err(|err| err.to_string())?;
    debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

fn check_unique<T: Record>(records: &[T]) -> Result<(), String> {
    match find_collisions(records.iter().map(|record| record.label())).into_iter().next() {
        Some((id, first, second)) => Err(RecordError::DuplicateIdentifier {
            category: T::DIR,
            id,
            first,
            second,
        }
        .to_string()),
        None => Ok(()),
    }
}

/// Removes record files left over from a previous run so the directory
/// mirrors the current tables exactly. Only `*.json` directly inside the
/// five record directories is touched.
fn remove_stale<T: Record>(out_dir: &Path) -> Result<usize, String> {
    let dir = out_dir.join(T::DIR);
    if !dir.is_dir() {
        return Ok(0);
    }
    let entries = fs::read_dir(&dir).map_err(|err| format!("read {}: {}", dir.display(), err))?;
    let mut removed = 0;
    for entry in entries {
        let path = entry
            .map_err(|err| format!("read {}: {}", dir.display(), err))?
            .path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            fs::remove_file(&path).map_err(|err| format!("remove {}: {}", path.display(), err))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Reads the five source tables and writes one JSON record per row below `out_dir`.
///
/// All tables are parsed and checked for duplicate ids before anything is
/// written, so a malformed row leaves the output directory untouched.
pub fn convert(input: &ConvertInput) -> Result<ConvertSummary, String> {
    let records = Records {
        themes: read_table(&input.themes, read_themes)?,
        variables: read_table(&input.variables, read_variables)?,
        eo_missions: read_table(&input.eo_missions, read_eo_missions)?,
        projects: read_table(&input.projects, read_projects)?,
        products: read_table(&input.products, read_products)?,
    };

    check_unique(&records.themes)?;
    check_unique(&records.variables)?;
    check_unique(&records.eo_missions)?;
    check_unique(&records.projects)?;
    check_unique(&records.products)?;

    let stale_removed = remove_stale::<Theme>(&input.out_dir)?
        + remove_stale::<Variable>(&input.out_dir)?
        + remove_stale::<EoMission>(&input.out_dir)?
        + remove_stale::<Project>(&input.out_dir)?
        + remove_stale::<Product>(&input.out_dir)?;

    let written = records
        .store(&input.out_dir)
        .map_err(|err| err.to_string())?;
    info!(
        out_dir = %input.out_dir.display(),
        files = written.len(),
        "converted tables"
    );

    Ok(ConvertSummary {
        out_dir: input.out_dir.clone(),
        themes: records.themes.len(),
        variables: records.variables.len(),
        eo_missions: records.eo_missions.len(),
        projects: records.projects.len(),
        products: records.products.len(),
        files_written: written.len(),
        stale_removed,
    })
}
