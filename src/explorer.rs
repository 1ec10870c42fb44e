use std::time::Instant;

use feruca::Collator;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::domain::DashError;
use crate::record::{DatasetId, Record, cell, columns_of};
use crate::source::{DataSource, fetch_records};
use crate::view::{SortOrder, SortState, TableRender, render};

/// Search term plus the column it is restricted to (`None`: all columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search_term: String,
    pub scope_column: Option<String>,
}

impl FilterQuery {
    pub fn matches(&self, record: &Record) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        match &self.scope_column {
            Some(column) => cell(record, column).to_lowercase().contains(&term),
            None => record.values().any(|v| v.to_lowercase().contains(&term)),
        }
    }
}

/// Identifies one `load`. Only the most recently issued ticket may replace
/// the explorer's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Holds one dataset and the filter/sort state of its table view.
///
/// Filtering and sorting are independent, last-applied-wins operations on
/// `current_data`: `filter` always starts from the full dataset, `sort`
/// reorders the dataset itself and shows all of it.
#[derive(Debug, Default)]
pub struct TableExplorer {
    dataset: Option<DatasetId>,
    current_data: Vec<Record>,
    columns: Vec<String>,
    rows: Vec<usize>, // Indices into current_data of the visible rows
    sort: SortState,
    query: FilterQuery,
    rendered: TableRender,
    generation: u64,
}

impl TableExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, source: &dyn DataSource, id: DatasetId) -> Result<(), DashError> {
        let ticket = self.begin_load();
        let result = fetch_records(source, &id).await;
        self.finish_load(ticket, id, result).map(|_| ())
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Applies the outcome of a fetch. Returns `Ok(false)` when a newer
    /// load has been issued since `ticket`, in which case nothing changes.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        id: DatasetId,
        result: Result<Vec<Record>, DashError>,
    ) -> Result<bool, DashError> {
        if !self.is_current(ticket) {
            warn!(
                "Discarding stale load of {id} ({:?}, current generation {})",
                ticket, self.generation
            );
            return Ok(false);
        }

        let records = result?;
        info!("Loaded {} records for {id}", records.len());

        self.columns = columns_of(&records);
        self.current_data = records;
        self.dataset = Some(id);
        self.sort = SortState::default();
        self.query = FilterQuery::default();
        self.rows = (0..self.current_data.len()).collect();
        self.rerender();
        Ok(true)
    }

    pub fn filter(&mut self, search_term: &str) {
        let start_time = Instant::now();
        self.query.search_term = search_term.to_string();

        let data = &self.current_data;
        let query = &self.query;
        self.rows = (0..data.len())
            .into_par_iter()
            .filter(|&idx| query.matches(&data[idx]))
            .collect();

        trace!(
            "Filter {:?} matched {}/{} rows in {}ms",
            self.query,
            self.rows.len(),
            data.len(),
            start_time.elapsed().as_millis()
        );
        self.rerender();
    }

    /// Restricts the search to `column`, or to all columns with `None`, and
    /// re-applies the current search term.
    pub fn set_scope(&mut self, column: Option<String>) {
        self.query.scope_column = column.filter(|c| self.columns.contains(c));
        let term = self.query.search_term.clone();
        self.filter(&term);
    }

    /// Advances the scope through "all columns" and then each column.
    pub fn cycle_scope(&mut self) {
        let next = match &self.query.scope_column {
            None => self.columns.first().cloned(),
            Some(current) => self
                .columns
                .iter()
                .position(|c| c == current)
                .and_then(|idx| self.columns.get(idx + 1))
                .cloned(),
        };
        self.set_scope(next);
    }

    /// Sorts `current_data` in place by `column`. Sorting the same column
    /// again reverses the order. Values compare with the Unicode collation
    /// algorithm (root locale), so accents and case are secondary to the
    /// base letters and numeric columns sort as text ("10" before "9").
    pub fn sort(&mut self, column: &str) {
        if self.sort.column.as_deref() == Some(column) {
            self.sort.order = self.sort.order.toggled();
        } else {
            self.sort = SortState {
                column: Some(column.to_string()),
                order: SortOrder::Ascending,
            };
        }
        debug!("Sorting by {column} {:?}", self.sort.order);

        let order = self.sort.order;
        let mut collator = Collator::default();
        self.current_data.sort_by(|a, b| {
            let ord = collator.collate(cell(a, column), cell(b, column));
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        self.rows = (0..self.current_data.len()).collect();
        self.rerender();
    }

    fn rerender(&mut self) {
        let visible: Vec<&Record> = self.rows.iter().map(|&i| &self.current_data[i]).collect();
        self.rendered = render(&visible, &self.sort);
    }

    pub fn rendered(&self) -> &TableRender {
        &self.rendered
    }

    pub fn visible_records(&self) -> Vec<&Record> {
        self.rows.iter().map(|&i| &self.current_data[i]).collect()
    }

    pub fn current_data(&self) -> &[Record] {
        &self.current_data
    }

    pub fn dataset(&self) -> Option<&DatasetId> {
        self.dataset.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }
}
