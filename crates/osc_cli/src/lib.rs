//! Pipelines behind the `osc` binary.

pub mod build;
pub mod config;
pub mod convert;
pub mod validate;

// Re-export main types for convenience
pub use build::{build_catalog, BuildSummary, IMAGES_DIR, METRICS_FILE};
pub use config::{BuildOverrides, OscConfig, CONFIG_ENV, CONFIG_FILE};
pub use convert::{convert, ConvertInput, ConvertSummary};
pub use validate::{validate_dir, ValidationReport};
