use std::fmt;

use serde::Serialize;

/// What kind of vocabulary entry a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Project,
    Theme,
    Variable,
    Mission,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Project => "project",
            RefKind::Theme => "theme",
            RefKind::Variable => "variable",
            RefKind::Mission => "mission",
        }
    }
}

/// A non-fatal finding collected during assembly or validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// `source` (e.g. `products/prod-a`) names a `target` that is not declared.
    UnresolvedReference {
        source: String,
        target: RefKind,
        reference: String,
    },
    DuplicateIdentifier {
        namespace: String,
        id: String,
        first: String,
        second: String,
    },
    /// A `child` link from `from` to `to` without exactly one `parent` link back.
    AsymmetricLink {
        from: String,
        to: String,
        parent_links: usize,
    },
}

impl Diagnostic {
    pub fn unresolved(source: impl Into<String>, target: RefKind, reference: &str) -> Self {
        Diagnostic::UnresolvedReference {
            source: source.into(),
            target,
            reference: reference.to_string(),
        }
    }

    pub fn rule_id(&self) -> &'static str {
        match self {
            Diagnostic::UnresolvedReference { .. } => "unresolved-reference",
            Diagnostic::DuplicateIdentifier { .. } => "duplicate-identifier",
            Diagnostic::AsymmetricLink { .. } => "asymmetric-link",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedReference {
                source,
                target,
                reference,
            } => write!(f, "{}: missing {} '{}'", source, target.as_str(), reference),
            Diagnostic::DuplicateIdentifier {
                namespace,
                id,
                first,
                second,
            } => write!(
                f,
                "{}: '{}' and '{}' share id '{}'",
                namespace, first, second, id
            ),
            Diagnostic::AsymmetricLink {
                from,
                to,
                parent_links,
            } => write!(
                f,
                "{}: child {} has {} parent links back (expected 1)",
                from, to, parent_links
            ),
        }
    }
}
