//! Query helpers used by the HTTP gateway.

use crate::connection::LakeConnection;
use crate::error::DbError;
use crate::value::duckdb_value_to_json;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 1000;

/// A validated `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: i64,
    offset: i64,
}

impl Pagination {
    /// Validates caller-supplied pagination, applying defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidPagination` if `limit` is outside `1..=1000`
    /// or `offset` is negative.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, DbError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(0);

        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(DbError::InvalidPagination(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if offset < 0 {
            return Err(DbError::InvalidPagination(format!(
                "offset must be greater than or equal to 0, got {offset}"
            )));
        }

        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Appends the pagination clause to a caller's query text, unchanged otherwise.
pub fn paginate(query: &str, page: Pagination) -> String {
    format!("{} LIMIT {} OFFSET {}", query, page.limit, page.offset)
}

/// Rows returned by a gateway query, alongside the text that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// Each row as an array of column values.
    pub rows: Vec<Vec<JsonValue>>,
    /// The exact statement that was executed.
    pub query: String,
}

impl QueryOutcome {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl LakeConnection {
    /// Executes `sql` as-is and collects every row.
    ///
    /// No validation or rewriting is applied; any statement the engine
    /// accepts is run.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` carrying the engine's message on any failure.
    pub fn execute_query(&self, sql: &str) -> Result<QueryOutcome, DbError> {
        let mut stmt = self.raw().prepare(sql)?;
        let mut rows = stmt.query([])?;
        let column_count = rows.as_ref().map_or(0, |stmt| stmt.column_count());

        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..column_count)
                .map(|i| row.get_ref(i).map(duckdb_value_to_json))
                .collect::<Result<Vec<_>, _>>()?;
            collected.push(values);
        }

        Ok(QueryOutcome {
            rows: collected,
            query: sql.to_string(),
        })
    }

    /// Runs a no-op statement to confirm the handle is usable.
    pub fn ping(&self) -> Result<(), DbError> {
        let one: i32 = self.raw().query_row("SELECT 1", [], |row| row.get(0))?;
        debug_assert_eq!(one, 1);
        Ok(())
    }

    /// Names of the tables visible in the active namespace.
    pub fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.raw().prepare("SHOW TABLES")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        let page = Pagination::new(None, None).expect("defaults are valid");
        assert_eq!(page, Pagination::default());
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(Pagination::new(Some(1), Some(0)).is_ok());
        assert!(Pagination::new(Some(1000), Some(123_456)).is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (limit, offset) in [(Some(0), None), (Some(1001), None), (None, Some(-1))] {
            let err = Pagination::new(limit, offset).expect_err("should be rejected");
            assert!(matches!(err, DbError::InvalidPagination(_)), "{err}");
        }
    }

    #[test]
    fn paginate_appends_clause_verbatim() {
        let page = Pagination::new(Some(25), Some(50)).unwrap();
        assert_eq!(
            paginate("SELECT * FROM currency", page),
            "SELECT * FROM currency LIMIT 25 OFFSET 50"
        );
        // The caller's text is never trimmed or inspected.
        assert_eq!(
            paginate("  select 1 ", Pagination::default()),
            "  select 1  LIMIT 100 OFFSET 0"
        );
    }
}
