// Read-only query description shared by every backend
use serde_json::Value;

use crate::row::CREATED_TIME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Column equality predicate. A `Null` value matches rows where the column is
/// absent or null.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Filter / order / page query against a single table
///
/// Built by chaining:
///
/// ```rust
/// use datastore_layer::{Query, SortDirection};
/// use serde_json::json;
///
/// let query = Query::table("Prescription")
///     .filter_eq("PatientUUID", json!("p-1"))
///     .order_by("CREATEDTIME", SortDirection::Desc)
///     .paginate(2, 25);
/// assert_eq!(query.offset(), Some(25));
/// assert_eq!(query.limit(), Some(25));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Option<(String, SortDirection)>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
        }
    }

    /// Restrict the returned columns. An empty selection returns every column.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn filter_eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value,
        });
        self
    }

    /// Add an equality filter only when a value is present
    pub fn filter_eq_opt(self, column: impl Into<String>, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.filter_eq(column, value),
            None => self,
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// Newest rows first
    pub fn order_by_created_desc(self) -> Self {
        self.order_by(CREATED_TIME, SortDirection::Desc)
    }

    /// One-based page of `per_page` rows
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.offset = Some((page - 1).saturating_mul(per_page));
        self.limit = Some(per_page);
        self
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, SortDirection)> {
        self.order.as_ref().map(|(c, d)| (c.as_str(), *d))
    }

    /// Same table and filters, without projection, ordering or paging
    pub fn for_count(&self) -> Query {
        Query {
            table: self.table.clone(),
            columns: Vec::new(),
            filters: self.filters.clone(),
            order: None,
            offset: None,
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_page_starts_at_zero() {
        let query = Query::table("Patient").paginate(1, 50);
        assert_eq!(query.offset(), Some(0));
        assert_eq!(query.limit(), Some(50));
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let query = Query::table("Patient").paginate(0, 10);
        assert_eq!(query.offset(), Some(0));
    }

    #[test]
    fn optional_filter_is_skipped_when_absent() {
        let query = Query::table("Patient")
            .filter_eq_opt("UUID", None)
            .filter_eq_opt("Phonenumber", Some(json!("99")));
        assert_eq!(query.filters().len(), 1);
        assert_eq!(query.filters()[0].column, "Phonenumber");
    }

    #[test]
    fn count_query_drops_paging_and_order() {
        let query = Query::table("Patient")
            .select(&["Name"])
            .filter_eq("Gender", json!("F"))
            .order_by_created_desc()
            .paginate(3, 5);
        let count = query.for_count();
        assert!(count.columns().is_empty());
        assert_eq!(count.filters().len(), 1);
        assert_eq!(count.ordering(), None);
        assert_eq!(count.limit(), None);
        assert_eq!(count.offset(), None);
    }
}
