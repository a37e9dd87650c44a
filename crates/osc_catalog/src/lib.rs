pub mod assemble;
pub mod codelist;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod ident;
pub mod keywords;
pub mod link;
pub mod metrics;
pub mod node;
pub mod paths;
pub mod resolve;
pub mod timestamps;
pub mod validate;

// Re-export main types for convenience
pub use assemble::{assemble, AssembleOptions, Assembly, Catalog, CatalogEntry, NodeIdx};
pub use codelist::{vocabulary_entries, VocabularyEntry};
pub use diagnostics::{Diagnostic, RefKind};
pub use error::CatalogError;
pub use format::{FormatContext, MetadataFormatter};
pub use ident::{find_collisions, IdRegistry};
pub use keywords::{apply_keywords, derive_keywords, Keyword};
pub use link::{Asset, Link, LinkAttrs, Rel};
pub use metrics::{build_metrics, GlobalMetrics};
pub use node::{directory_url, make_absolute, Category, DocType, Extent, Node, NodeFile, NodeKind};
pub use resolve::Vocabulary;
pub use timestamps::propagate_updated;
pub use validate::{validate_catalog, validate_path, validate_records, ValidationMode};
