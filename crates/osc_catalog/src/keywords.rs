use std::fmt;

use crate::node::Node;

/// A searchable `<prefix>:<name>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    Theme(String),
    Variable(String),
    Mission(String),
    Region(String),
    Project(String),
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Theme(name) => write!(f, "theme:{}", name),
            Keyword::Variable(name) => write!(f, "variable:{}", name),
            Keyword::Mission(name) => write!(f, "mission:{}", name),
            Keyword::Region(name) => write!(f, "region:{}", name),
            Keyword::Project(name) => write!(f, "project:{}", name),
        }
    }
}

/// Keywords implied by the node's `osc:*` cross-reference properties.
pub fn derive_keywords(node: &Node) -> Vec<Keyword> {
    let mut out = Vec::new();
    out.extend(node.osc_themes.iter().cloned().map(Keyword::Theme));
    out.extend(node.osc_variables.iter().cloned().map(Keyword::Variable));
    out.extend(node.osc_missions.iter().cloned().map(Keyword::Mission));
    out.extend(node.osc_region.iter().cloned().map(Keyword::Region));
    out.extend(node.osc_project.iter().cloned().map(Keyword::Project));
    out
}

/// Appends keywords not already present, keeping insertion order.
/// Returns how many were added.
pub fn apply_keywords(node: &mut Node, keywords: &[Keyword]) -> usize {
    let mut added = 0;
    for keyword in keywords {
        let tag = keyword.to_string();
        if !node.keywords.contains(&tag) {
            node.keywords.push(tag);
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocType;

    fn product_node() -> Node {
        let mut node = Node::new(DocType::Collection, "prod-a", "a product");
        node.osc_themes = vec!["Ocean".to_string()];
        node.osc_variables = vec!["sea-level".to_string()];
        node.osc_missions = vec!["Jason-3".to_string()];
        node.osc_region = Some("Global".to_string());
        node.osc_project = Some("proj-a".to_string());
        node
    }

    #[test]
    fn derives_prefixed_keywords() {
        let tags: Vec<String> = derive_keywords(&product_node())
            .iter()
            .map(Keyword::to_string)
            .collect();
        assert_eq!(
            tags,
            vec![
                "theme:Ocean",
                "variable:sea-level",
                "mission:Jason-3",
                "region:Global",
                "project:proj-a"
            ]
        );
    }

    #[test]
    fn applying_twice_adds_nothing() {
        let mut node = product_node();
        node.keywords.push("custom".to_string());
        let keywords = derive_keywords(&node);
        assert_eq!(apply_keywords(&mut node, &keywords), 5);
        assert_eq!(apply_keywords(&mut node, &keywords), 0);
        assert_eq!(node.keywords.len(), 6);
        assert_eq!(node.keywords[0], "custom");
    }
}
