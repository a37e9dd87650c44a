//! XML renderings of catalog content: ISO 19139 metadata records for
//! projects and products, and the gmx codelist catalogue.

pub mod codelist;
pub mod iso;
mod xml;

// Re-export main types for convenience
pub use codelist::{build_codelists, CodelistInfo, CODELISTS_FILE};
pub use iso::{progress_code, Iso19139Formatter, ISO_ASSET, ISO_FILE};
pub use xml::XML_DECLARATION;
