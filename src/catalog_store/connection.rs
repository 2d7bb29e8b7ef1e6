use super::error::CatalogError;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::migrate_to_latest;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Hands out one fresh connection per statement. There is no pooling: a
/// connection lives for exactly one query or mutation and is released when
/// it goes out of scope, on every exit path.
///
/// Uniqueness and duplicate checks therefore rely entirely on SQLite's own
/// per-statement guarantees. Two processes probing the same id at the same
/// time can race; see the notes in DESIGN.md.
#[derive(Clone)]
pub struct ConnectionProvider {
    db_path: PathBuf,
}

impl ConnectionProvider {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        ConnectionProvider {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Creates the schema on a fresh database file, or validates and
    /// migrates an existing one. Called once at startup, before any
    /// operation runs.
    pub fn initialize(&self) -> Result<()> {
        let is_new_db = !self.db_path.exists();
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open catalog database at {:?}", self.db_path))?;

        if is_new_db {
            info!("Creating new catalog database at {:?}", self.db_path);
            CATALOG_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            debug!("Validating catalog database at {:?}", self.db_path);
            migrate_to_latest(&conn, CATALOG_VERSIONED_SCHEMAS)?;
        }
        Ok(())
    }

    pub fn open(&self) -> Result<Connection, CatalogError> {
        let conn = Connection::open(&self.db_path).map_err(CatalogError::ConnectionFailed)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(CatalogError::ConnectionFailed)?;
        Ok(conn)
    }

    /// Walks up from the working directory looking for an existing catalog
    /// database file, mirroring how the database is usually kept at the
    /// repository root during development.
    pub fn infer_path(file_name: &str) -> Option<PathBuf> {
        let mut current_dir = std::env::current_dir().ok()?;
        loop {
            let candidate = current_dir.join(file_name);
            if candidate.is_file() {
                return Some(candidate);
            }
            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }
        None
    }
}
