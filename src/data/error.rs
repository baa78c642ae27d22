use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors – the source could not be turned into a RawTable
// ---------------------------------------------------------------------------

/// The source could not be read as CSV at all. No table is produced.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot open {origin}: {source}")]
    Open {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {origin}: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("{origin} has no header row")]
    NoHeader { origin: String },
}

// ---------------------------------------------------------------------------
// Dashboard errors – everything the pipeline can report to the user
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    /// A required numeric cell did not parse (or was negative).
    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// Average per transaction requested over zero transactions.
    #[error("no transactions match the current filters")]
    NoTransactions,
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
