use std::io::Read;
use std::path::Path;

use super::error::DataLoadError;

// ---------------------------------------------------------------------------
// RawTable – the CSV exactly as read, before any interpretation
// ---------------------------------------------------------------------------

/// Header names plus string records, one `Vec<String>` per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    /// Position of a column in the header, exact match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a CSV file from disk.
///
/// Layout: UTF-8, comma-delimited, first row is the header. Every column is
/// kept as text; typing happens in [`super::prepare`].
pub fn load_file(path: &Path) -> Result<RawTable, DataLoadError> {
    let origin = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Open {
        origin: origin.clone(),
        source,
    })?;
    load_reader(file, &origin)
}

/// Read CSV from any reader (an uploaded buffer, stdin, ...).
/// `origin` names the source in error messages.
pub fn load_reader<R: Read>(reader: R, origin: &str) -> Result<RawTable, DataLoadError> {
    let malformed = |source: csv::Error| DataLoadError::Malformed {
        origin: origin.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataLoadError::NoHeader {
            origin: origin.to_string(),
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(malformed)?;
        records.push(record.iter().map(|field| field.to_string()).collect());
    }

    log::debug!(
        "Read {} rows x {} columns from {origin}",
        records.len(),
        headers.len()
    );

    Ok(RawTable { headers, records })
}
