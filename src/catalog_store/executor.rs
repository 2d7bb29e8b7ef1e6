use super::connection::ConnectionProvider;
use super::error::CatalogError;
use rusqlite::types::Value;
use rusqlite::ToSql;
use std::fmt;
use tracing::debug;

/// A single cell of a query result, typed the way SQLite types it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Integer(i) => Cell::Integer(i),
            Value::Real(r) => Cell::Real(r),
            Value::Text(s) => Cell::Text(s),
            Value::Blob(b) => Cell::Blob(b),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

/// Column names plus row tuples, the tabular shape handed to the
/// presentation layer.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Runs exactly one statement per call over a fresh connection from the
/// provider. The connection is released on every exit path, success or
/// failure, when it drops at the end of the call.
#[derive(Clone)]
pub struct StatementExecutor {
    provider: ConnectionProvider,
}

impl StatementExecutor {
    pub fn new(provider: ConnectionProvider) -> Self {
        StatementExecutor { provider }
    }

    /// Runs a read query and collects the full result set.
    pub fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<RowSet, CatalogError> {
        debug!("query: {}", sql);
        let conn = self.provider.open()?;
        let mut stmt = conn.prepare(sql).map_err(CatalogError::StatementFailed)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = columns.len();

        let mut rows = stmt.query(params).map_err(CatalogError::StatementFailed)?;
        let mut collected = Vec::new();
        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut cells = Vec::with_capacity(column_count);
                    for index in 0..column_count {
                        let value: Value = row
                            .get(index)
                            .map_err(CatalogError::StatementFailed)?;
                        cells.push(Cell::from(value));
                    }
                    collected.push(cells);
                }
                Ok(None) => break,
                Err(err) => return Err(CatalogError::StatementFailed(err)),
            }
        }

        Ok(RowSet {
            columns,
            rows: collected,
        })
    }

    /// Runs an INSERT/UPDATE/DELETE and returns the affected row count.
    pub fn mutate(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize, CatalogError> {
        debug!("mutate: {}", sql);
        let conn = self.provider.open()?;
        conn.execute(sql, params)
            .map_err(CatalogError::StatementFailed)
    }

    /// Existence probe: true when the query returns at least one row.
    pub fn exists(&self, sql: &str, params: &[&dyn ToSql]) -> Result<bool, CatalogError> {
        Ok(!self.query(sql, params)?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_executor() -> (StatementExecutor, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let provider = ConnectionProvider::new(temp_dir.path().join("test.db"));
        provider.initialize().unwrap();
        (StatementExecutor::new(provider), temp_dir)
    }

    #[test]
    fn query_returns_columns_and_rows() {
        let (executor, _temp_dir) = create_executor();
        executor
            .mutate(
                "INSERT INTO Song (song_id, name, genre) VALUES (?1, ?2, ?3)",
                &[&"SONG-TEST", &"Wonderwall", &"Rock"],
            )
            .unwrap();

        let row_set = executor
            .query("SELECT song_id, name, genre FROM Song", &[])
            .unwrap();
        assert_eq!(row_set.columns, vec!["song_id", "name", "genre"]);
        assert_eq!(row_set.len(), 1);
        assert_eq!(row_set.rows[0][1], Cell::Text("Wonderwall".to_string()));
    }

    #[test]
    fn query_on_empty_table_returns_empty_set_with_columns() {
        let (executor, _temp_dir) = create_executor();
        let row_set = executor.query("SELECT song_id FROM Song", &[]).unwrap();
        assert!(row_set.is_empty());
        assert_eq!(row_set.columns, vec!["song_id"]);
    }

    #[test]
    fn mutate_returns_affected_row_count() {
        let (executor, _temp_dir) = create_executor();
        executor
            .mutate(
                "INSERT INTO Song (song_id, name) VALUES (?1, ?2)",
                &[&"SONG-0001", &"One"],
            )
            .unwrap();
        executor
            .mutate(
                "INSERT INTO Song (song_id, name) VALUES (?1, ?2)",
                &[&"SONG-0002", &"Two"],
            )
            .unwrap();

        let affected = executor.mutate("DELETE FROM Song", &[]).unwrap();
        assert_eq!(affected, 2);
    }

    #[test]
    fn bad_statement_yields_statement_failed() {
        let (executor, _temp_dir) = create_executor();
        let result = executor.query("SELECT * FROM NoSuchTable", &[]);
        assert!(matches!(result, Err(CatalogError::StatementFailed(_))));
    }

    #[test]
    fn constraint_violation_yields_statement_failed() {
        let (executor, _temp_dir) = create_executor();
        executor
            .mutate(
                "INSERT INTO Song (song_id, name) VALUES (?1, ?2)",
                &[&"SONG-DUP", &"First"],
            )
            .unwrap();
        let result = executor.mutate(
            "INSERT INTO Song (song_id, name) VALUES (?1, ?2)",
            &[&"SONG-DUP", &"Second"],
        );
        assert!(matches!(result, Err(CatalogError::StatementFailed(_))));
    }

    #[test]
    fn exists_probe() {
        let (executor, _temp_dir) = create_executor();
        assert!(!executor
            .exists("SELECT song_id FROM Song WHERE song_id = ?1", &[&"SONG-X"])
            .unwrap());

        executor
            .mutate(
                "INSERT INTO Song (song_id, name) VALUES (?1, ?2)",
                &[&"SONG-X", &"X"],
            )
            .unwrap();
        assert!(executor
            .exists("SELECT song_id FROM Song WHERE song_id = ?1", &[&"SONG-X"])
            .unwrap());
    }
}
