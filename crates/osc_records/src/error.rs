use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum RecordError {
    /// A source row is missing a required column or carries an unparseable value.
    MalformedInput {
        source: String,
        row: usize,
        column: Option<String>,
        message: String,
    },
    /// A converted record file is not a valid JSON record.
    MalformedDocument { path: PathBuf, message: String },
    /// Two records of the same category slugify to the same file stem.
    DuplicateIdentifier {
        category: &'static str,
        id: String,
        first: String,
        second: String,
    },
    Io { path: PathBuf, message: String },
}

impl RecordError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        RecordError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::MalformedInput {
                source,
                row,
                column,
                message,
            } => match column {
                Some(column) => write!(
                    f,
                    "malformed input in {} row {}, column `{}`: {}",
                    source, row, column, message
                ),
                None => write!(f, "malformed input in {} row {}: {}", source, row, message),
            },
            RecordError::MalformedDocument { path, message } => {
                write!(f, "malformed record {}: {}", path.display(), message)
            }
            RecordError::DuplicateIdentifier {
                category,
                id,
                first,
                second,
            } => write!(
                f,
                "{} id `{}` is claimed by both `{}` and `{}`",
                category, id, first, second
            ),
            RecordError::Io { path, message } => {
                write!(f, "io error at {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for RecordError {}
