use std::path::PathBuf;

/// Errors raised while loading or exporting task data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid task JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing required columns (found {found:?}); need task name, start date and end date")]
    MissingColumns { found: Vec<String> },

    #[error("JSON document has no task list (expected an array, or an object with `data` or `tasks`)")]
    NoTaskList,

    #[error("no valid tasks found ({skipped} records skipped)")]
    Empty { skipped: usize },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
