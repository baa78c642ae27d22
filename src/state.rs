use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::data::dashboard::{recompute, Dashboard};
use crate::data::error::{DashboardError, DataLoadError};
use crate::data::filter::{default_criteria, FilterCriteria};
use crate::data::loader;
use crate::data::model::{Dimension, SalesTable};
use crate::data::prepare::prepare;

// ---------------------------------------------------------------------------
// Source identity – decides whether the canonical table must be rebuilt
// ---------------------------------------------------------------------------

/// A file is considered unchanged while its path, length and modification
/// time all stay the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceKey {
    pub fn of(path: &Path) -> Result<Self, DataLoadError> {
        let meta = std::fs::metadata(path).map_err(|source| DataLoadError::Open {
            origin: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One user's dashboard session, independent of how it is rendered.
#[derive(Debug, Default)]
pub struct Session {
    /// Canonical table (None until a source loads successfully).
    table: Option<Arc<SalesTable>>,

    /// Identity of the source `table` was built from.
    source: Option<SourceKey>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Last load error, shown to the user.
    pub status_message: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> Option<&Arc<SalesTable>> {
        self.table.as_ref()
    }

    /// Load and prepare `path`, reusing the cached table when the file is
    /// unchanged.
    ///
    /// On failure the previous table and criteria stay in place and the
    /// error is also kept in `status_message`.
    pub fn load(&mut self, path: &Path) -> Result<Arc<SalesTable>, DashboardError> {
        match self.try_load(path) {
            Ok(table) => {
                self.status_message = None;
                Ok(table)
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    fn try_load(&mut self, path: &Path) -> Result<Arc<SalesTable>, DashboardError> {
        let key = SourceKey::of(path)?;
        if let (Some(cached), Some(table)) = (&self.source, &self.table) {
            if *cached == key {
                log::debug!("{} unchanged, reusing prepared table", path.display());
                return Ok(Arc::clone(table));
            }
        }

        let raw = loader::load_file(path)?;
        let table = prepare(&raw)?;
        log::info!(
            "Loaded {} rows with columns {:?}",
            table.len(),
            table.column_names
        );
        Ok(self.set_table(table, Some(key)))
    }

    /// Ingest a newly prepared table and reset criteria to "show everything".
    pub fn set_table(&mut self, table: SalesTable, source: Option<SourceKey>) -> Arc<SalesTable> {
        self.criteria = default_criteria(&table);
        let table = Arc::new(table);
        self.table = Some(Arc::clone(&table));
        self.source = source;
        table
    }

    /// Filter, aggregate and compute KPIs for the current criteria.
    pub fn recompute(&self) -> Option<Dashboard<'_>> {
        self.table
            .as_deref()
            .map(|table| recompute(table, &self.criteria))
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_value(&mut self, dim: Dimension, value: &str) {
        let selected = self
            .criteria
            .selection_mut(dim)
            .get_or_insert_with(BTreeSet::new);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Select every value of a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(all_vals) = self.table.as_ref().and_then(|t| t.unique_values.get(&dim)) {
            *self.criteria.selection_mut(dim) = Some(all_vals.clone());
        }
    }

    /// Deselect every value of a dimension (matches nothing).
    pub fn select_none(&mut self, dim: Dimension) {
        *self.criteria.selection_mut(dim) = Some(BTreeSet::new());
    }

    /// Back to the defaults for the loaded table.
    pub fn reset_criteria(&mut self) {
        self.criteria = match &self.table {
            Some(table) => default_criteria(table),
            None => FilterCriteria::default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "Invoice ID,City,Gender,Customer type,Product line,Unit price,Quantity,Tax 5%,Date,Time,Payment\n\
        1,A,Male,Member,Food,1.0,1,0.0,2023-01-02,09:00:00,Cash\n\
        2,A,Female,Normal,Food,1.0,2,0.0,2023-01-03,10:00:00,Cash\n\
        3,B,Male,Member,Food,1.0,3,0.0,2023-01-04,11:00:00,Cash\n";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn unchanged_source_is_not_rebuilt() {
        let file = write_csv(CSV);
        let mut session = Session::new();
        let first = session.load(file.path()).unwrap();
        let second = session.load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_reload_keeps_previous_table() {
        let file = write_csv(CSV);
        let mut session = Session::new();
        session.load(file.path()).unwrap();
        session.select_none(Dimension::Gender);

        let broken = write_csv("Invoice ID,City\n1,A\n");
        let err = session.load(broken.path()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { .. }));
        assert_eq!(session.table().map(|t| t.len()), Some(3));
        assert!(session.status_message.is_some());
        assert_eq!(session.criteria.genders, Some(BTreeSet::new()));
    }

    #[test]
    fn toggling_and_select_all() {
        let file = write_csv(CSV);
        let mut session = Session::new();
        session.load(file.path()).unwrap();

        session.toggle_value(Dimension::City, "B");
        let dash = session.recompute().unwrap();
        assert_eq!(dash.kpis.total_items_sold, 3);

        session.select_none(Dimension::City);
        assert!(session.recompute().unwrap().is_empty());

        session.select_all(Dimension::City);
        assert_eq!(session.recompute().unwrap().len(), 3);

        session.toggle_value(Dimension::City, "A");
        session.reset_criteria();
        assert_eq!(session.recompute().unwrap().len(), 3);
    }

    #[test]
    fn no_table_means_no_dashboard() {
        assert!(Session::new().recompute().is_none());
    }
}
