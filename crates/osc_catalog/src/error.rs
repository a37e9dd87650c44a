use std::fmt;
use std::path::PathBuf;

use osc_records::RecordError;

#[derive(Debug)]
pub enum CatalogError {
    /// A node file exists but is not a valid catalog document.
    MalformedNode { path: PathBuf, message: String },
    Filesystem { path: PathBuf, message: String },
    /// Two records of one namespace map to the same node id.
    IdentifierCollision {
        namespace: &'static str,
        id: String,
        first: String,
        second: String,
    },
    /// A record name slugifies to the empty string.
    EmptyIdentifier {
        namespace: &'static str,
        label: String,
    },
    Record(RecordError),
}

impl CatalogError {
    pub(crate) fn fs(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        CatalogError::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MalformedNode { path, message } => {
                write!(f, "malformed node {}: {}", path.display(), message)
            }
            CatalogError::Filesystem { path, message } => {
                write!(f, "filesystem error at {}: {}", path.display(), message)
            }
            CatalogError::IdentifierCollision {
                namespace,
                id,
                first,
                second,
            } => write!(
                f,
                "identifier collision in {}: `{}` and `{}` both map to id `{}`",
                namespace, first, second, id
            ),
            CatalogError::EmptyIdentifier { namespace, label } => write!(
                f,
                "{} entry `{}` has no identifier characters",
                namespace, label
            ),
            CatalogError::Record(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<RecordError> for CatalogError {
    fn from(err: RecordError) -> Self {
        CatalogError::Record(err)
    }
}
