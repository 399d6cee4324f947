use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while loading, running or parsing PMU reports
#[derive(Error, Debug)]
pub enum Error {
    /// A required input file does not exist
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The delimited file has no column with the requested index name
    #[error("index column '{0}' not found in header")]
    MissingIndexColumn(String),

    /// A table cell could not be read as a number
    #[error("invalid value '{value}' in row '{row}', column '{column}'")]
    InvalidCell {
        row: String,
        column: String,
        value: String,
    },

    /// The benchmark executable is missing or could not be launched
    #[error("failed to execute {}: {source}", .path.display())]
    Execution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The benchmark executable ran but exited unsuccessfully
    #[error("{} exited with {status}", .path.display())]
    ExitStatus { path: PathBuf, status: ExitStatus },

    /// A recognized metric line whose value is not an integer
    #[error("malformed metric on line {line_number}: '{line}'")]
    MalformedMetric { line_number: usize, line: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
