use std::path::{Path, PathBuf};

use serde::Serialize;

use osc_catalog::{validate_path, Diagnostic};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub dir: PathBuf,
    pub mode: &'static str,
    pub issues: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validates a converted data directory or an assembled catalog.
pub fn validate_dir(dir: &Path) -> Result<ValidationReport, String> {
    if !dir.is_dir() {
        return Err(format!("{}: not a directory", dir.display()));
    }
    let (mode, issues) = validate_path(dir).map_err(|err| err.to_string())?;
    Ok(ValidationReport {
        dir: dir.to_path_buf(),
        mode: mode.as_str(),
        issues,
    })
}
