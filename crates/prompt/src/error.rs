use std::io;
use std::path::PathBuf;

use recform_interchange::InterchangeError;

/// Errors that abort an interactive session.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// A field type has no built-in prompt and no registered default or
    /// validator. Raised while building, before anything is asked.
    #[error("no way to handle prompting {type_name}")]
    Unhandled { type_name: String },

    /// A validator reported a non-retryable failure.
    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Input ended before a value was entered.
    #[error("input ended before '{0}' was answered")]
    Cancelled(String),

    /// The user cancelled a prompt that cannot be skipped.
    #[error("aborted while prompting for '{0}'")]
    Aborted(String),

    /// A terminal answered a choice with an index past the offered options.
    #[error("choice {index} is not among the {choices} options offered")]
    InvalidChoice { index: usize, choices: usize },

    /// An edit addressed a record the data file does not hold.
    #[error("{} holds {len} records, no index {index}", path.display())]
    NoSuchRecord { path: PathBuf, len: usize, index: usize },

    #[error(transparent)]
    Core(#[from] recform_core::Error),

    #[error(transparent)]
    Interchange(#[from] InterchangeError),

    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}
