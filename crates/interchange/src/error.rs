use std::io;
use std::path::PathBuf;

/// Errors reading or writing record documents.
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    /// A record failed to convert in the codec.
    #[error(transparent)]
    Codec(#[from] recform_core::Error),

    /// JSON text could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML text could not be produced or parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading from or writing to a stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reading or writing a named file failed.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The top-level document value is not a list.
    #[error("document is a {shape}, expected a top-level list")]
    NotAList { shape: String },
}

impl InterchangeError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        InterchangeError::File {
            path: path.into(),
            source,
        }
    }

    /// True when a file read failed because the file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            InterchangeError::File { source, .. } | InterchangeError::Io(source) => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
