use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Offset added to `PRAGMA user_version` so a plain SQLite file created by
/// some other program is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 77000;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(self.schema, params![])?;
        for index in self.indices {
            conn.execute(index, params![])?;
        }
        Ok(())
    }

    pub fn exists(&self, conn: &Connection) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.name],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            params![],
        )?;
        Ok(())
    }

    /// Checks that every table of this schema version is present. Column
    /// level drift is caught by the statements that touch the columns.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            if !table.exists(conn)? {
                bail!("Database is missing table '{}'", table.name);
            }
        }
        Ok(())
    }
}

/// Reads the stored schema version, validates the matching schema and runs
/// any pending migrations, stamping the new version at the end.
pub fn migrate_to_latest(conn: &Connection, schemas: &'static [VersionedSchema]) -> Result<()> {
    let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;

    if db_version < 0 {
        bail!(
            "Database version {} was not written by this program",
            raw_version
        );
    }
    let db_version = db_version as usize;

    let known = schemas.iter().position(|s| s.version == db_version);
    let Some(index) = known else {
        bail!("Database version {} is too new", db_version);
    };
    schemas[index].validate(conn)?;

    let mut latest = db_version;
    for schema in schemas.iter().skip(index + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating database from version {} to {}", latest, schema.version);
            migration_fn(conn)?;
            latest = schema.version;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
        params![],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT_TABLE: Table = Table {
        name: "parent",
        schema: "CREATE TABLE parent (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
        indices: &["CREATE INDEX parent_name_index ON parent (name);"],
    };

    const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[PARENT_TABLE],
        migration: None,
    }];

    #[test]
    fn create_stamps_user_version() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS.last().unwrap().create(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION);
    }

    #[test]
    fn validate_passes_on_created_schema() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS.last().unwrap().create(&conn).unwrap();
        SCHEMAS.last().unwrap().validate(&conn).unwrap();
    }

    #[test]
    fn validate_fails_on_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SCHEMAS.last().unwrap().validate(&conn);
        assert!(result.unwrap_err().to_string().contains("parent"));
    }

    #[test]
    fn migrate_rejects_foreign_database() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA user_version = 3", []).unwrap();
        assert!(migrate_to_latest(&conn, SCHEMAS).is_err());
    }

    #[test]
    fn migrate_is_a_no_op_on_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS.last().unwrap().create(&conn).unwrap();
        migrate_to_latest(&conn, SCHEMAS).unwrap();
    }
}
