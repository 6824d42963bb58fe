use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two tabular sources a problem refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Events,
    Ratings,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Events => f.write_str("events"),
            SourceKind::Ratings => f.write_str("ratings"),
        }
    }
}

/// Fatal errors while loading the dataset. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Could not open the {kind} source {path:?}: {err}")]
    Io {
        kind: SourceKind,
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("Malformed {kind} CSV: {err}")]
    Csv {
        kind: SourceKind,
        #[source]
        err: csv::Error,
    },

    #[error("The {kind} source has no \"{column}\" column")]
    MissingColumn {
        kind: SourceKind,
        column: &'static str,
    },

    #[error("The events source has neither a \"genre\" column nor any genre label column")]
    MissingGenreColumns,

    #[error("Row {row} of the ratings source has release date \"{value}\", expected format {format}")]
    InvalidDate {
        row: usize,
        value: String,
        format: &'static str,
    },

    #[error("Row {row} of the {kind} source has an invalid {column} \"{value}\"")]
    InvalidNumber {
        kind: SourceKind,
        row: usize,
        column: String,
        value: String,
    },
}

/// Non-fatal issues found while loading. The offending row is skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadProblem {
    UnknownGenre {
        kind: SourceKind,
        row: usize,
        label: String,
    },
    RatingOutOfBounds {
        row: usize,
        rating: f64,
    },
}
