//! Extension point for serializing nodes into external metadata formats.

use chrono::{DateTime, Utc};

use crate::node::Node;

/// What a formatter needs beyond the node itself.
#[derive(Debug, Clone)]
pub struct FormatContext<'a> {
    /// Href of the node's own document, as it will be published.
    pub self_href: &'a str,
    /// Identifier of the hierarchical parent, if any.
    pub parent_identifier: Option<&'a str>,
    /// Metadata record timestamp.
    pub datestamp: DateTime<Utc>,
}

pub trait MetadataFormatter {
    /// File name the output is written under, next to the node document.
    fn file_name(&self) -> &'static str;

    /// Media type of the output.
    fn media_type(&self) -> &'static str;

    /// Whether the node is one this format describes.
    fn applies_to(&self, node: &Node) -> bool;

    fn format(&self, node: &Node, ctx: &FormatContext<'_>) -> Result<String, String>;
}
