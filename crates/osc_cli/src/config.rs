use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use osc_catalog::AssembleOptions;
use osc_iso::CodelistInfo;

pub const CONFIG_FILE: &str = "osc.toml";
pub const CONFIG_ENV: &str = "OSC_CONFIG";

/// `osc.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub catalog: CatalogSection,
    pub build: BuildSection,
    pub codelists: CodelistSection,
    pub validate: ValidateSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Publish root; when set, every href is rewritten to an absolute URL below it.
    pub root_href: Option<String>,
    pub pretty_print: bool,
    pub add_iso: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodelistSection {
    pub version: String,
    pub version_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateSection {
    /// Exit non-zero when validation reports anything.
    pub strict: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        let options = AssembleOptions::default();
        CatalogSection {
            id: options.catalog_id,
            title: options.title,
            description: options.description,
        }
    }
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            root_href: None,
            pretty_print: true,
            add_iso: true,
        }
    }
}

impl Default for CodelistSection {
    fn default() -> Self {
        let info = CodelistInfo::default();
        CodelistSection {
            version: info.version,
            version_date: info.version_date,
        }
    }
}

/// Build flags given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub root_href: Option<String>,
    pub no_iso: bool,
    pub compact: bool,
}

impl OscConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("read {}: {}", path.display(), err))?;
        let config: OscConfig =
            toml::from_str(&raw).map_err(|err| format!("parse {}: {}", path.display(), err))?;
        config
            .check()
            .map_err(|err| format!("{}: {}", path.display(), err))?;
        Ok(config)
    }

    /// Explicit `--config`, then `$OSC_CONFIG`, then `./osc.toml` if present,
    /// else defaults. Returns the config and the file it came from.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), String> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
                _ => {
                    let local = PathBuf::from(CONFIG_FILE);
                    local.is_file().then_some(local)
                }
            },
        };
        match path {
            Some(path) => Ok((OscConfig::from_file(&path)?, Some(path))),
            None => Ok((OscConfig::default(), None)),
        }
    }

    /// Applies command-line build flags on top of the file values.
    pub fn from_file_and_cli(
        explicit: Option<&Path>,
        overrides: &BuildOverrides,
    ) -> Result<(Self, Option<PathBuf>), String> {
        let (mut config, source) = OscConfig::resolve(explicit)?;
        if let Some(root_href) = &overrides.root_href {
            config.build.root_href = Some(root_href.clone());
        }
        if overrides.no_iso {
            config.build.add_iso = false;
        }
        if overrides.compact {
            config.build.pretty_print = false;
        }
        config.check()?;
        Ok((config, source))
    }

    fn check(&self) -> Result<(), String> {
        if self.catalog.id.trim().is_empty() {
            return Err("catalog.id must not be empty".to_string());
        }
        NaiveDate::parse_from_str(&self.codelists.version_date, "%Y-%m-%d").map_err(|err| {
            format!(
                "codelists.version_date '{}' is not YYYY-MM-DD: {}",
                self.codelists.version_date, err
            )
        })?;
        self.publish_root()?;
        Ok(())
    }

    /// Parsed `build.root_href`; an empty value means relative hrefs.
    pub fn publish_root(&self) -> Result<Option<Url>, String> {
        match self.build.root_href.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(href) => Url::parse(href)
                .map(Some)
                .map_err(|err| format!("build.root_href '{}': {}", href, err)),
        }
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            catalog_id: self.catalog.id.clone(),
            title: self.catalog.title.clone(),
            description: self.catalog.description.clone(),
            pretty: self.build.pretty_print,
        }
    }

    pub fn codelist_info(&self) -> CodelistInfo {
        CodelistInfo {
            version: self.codelists.version.clone(),
            version_date: self.codelists.version_date.clone(),
            ..CodelistInfo::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: OscConfig = toml::from_str("[build]\nadd_iso = false\n").unwrap();
        assert!(!config.build.add_iso);
        assert!(config.build.pretty_print);
        assert_eq!(config.catalog.id, "osc");
        assert_eq!(config.codelists.version, "1.0.0");
        assert_eq!(config.codelists.version_date, "2022-02-05");
        assert!(!config.validate.strict);
    }

    #[test]
    fn cli_flags_override_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "[catalog]\nid = \"my-osc\"\n\n[build]\nroot_href = \"https://a.example.org/\"\n",
        )
        .unwrap();
        let overrides = BuildOverrides {
            root_href: Some("https://b.example.org/cat".to_string()),
            no_iso: true,
            compact: true,
        };
        let (config, source) = OscConfig::from_file_and_cli(Some(&path), &overrides).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(config.catalog.id, "my-osc");
        assert!(!config.build.add_iso);
        assert!(!config.build.pretty_print);
        assert_eq!(
            config.publish_root().unwrap().unwrap().as_str(),
            "https://b.example.org/cat"
        );
    }

    #[test]
    fn empty_root_href_means_relative() {
        let config: OscConfig = toml::from_str("[build]\nroot_href = \"\"\n").unwrap();
        assert_eq!(config.publish_root().unwrap(), None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[codelists]\nversion_date = \"05.02.2022\"\n").unwrap();
        let err = OscConfig::from_file(&path).unwrap_err();
        assert!(err.contains("codelists.version_date"), "{}", err);

        std::fs::write(&path, "[build]\nroot_href = \"not a url\"\n").unwrap();
        assert!(OscConfig::from_file(&path).is_err());
    }
}
