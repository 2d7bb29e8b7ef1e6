mod file_config;

pub use file_config::FileConfig;

use crate::catalog_store::ConnectionProvider;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "kiwi_catalog.db";

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

/// The resolved configuration, built once at startup and handed to the
/// connection provider. There is no ambient global carrying any of this.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present; when neither
    /// names a database, an existing file is searched for upwards from the
    /// working directory.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .or_else(|| ConnectionProvider::infer_path(DEFAULT_DB_FILE_NAME));
        let Some(db_path) = db_path else {
            bail!(
                "No database specified: pass a path, set db_path in the config file, \
                 or run inside a directory tree containing {}",
                DEFAULT_DB_FILE_NAME
            );
        };

        // A missing file is created on first open, but its directory must
        // already exist.
        if !db_path.exists() {
            let parent_exists = db_path
                .parent()
                .map(|p| p.as_os_str().is_empty() || p.is_dir())
                .unwrap_or(false);
            if !parent_exists {
                bail!("Directory for database {:?} does not exist", db_path);
            }
        }

        let log_filter = file
            .log_filter
            .or_else(|| cli.log_filter.clone())
            .unwrap_or_else(|| "info".to_string());

        Ok(AppConfig { db_path, log_filter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("catalog.db")),
            log_filter: Some("debug".to_string()),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, temp_dir.path().join("catalog.db"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let toml_db = temp_dir.path().join("from_toml.db");
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("from_cli.db")),
            log_filter: None,
        };
        let file = FileConfig {
            db_path: Some(toml_db.to_string_lossy().to_string()),
            log_filter: Some("trace".to_string()),
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.db_path, toml_db);
        assert_eq!(config.log_filter, "trace");
    }

    #[test]
    fn resolve_defaults_log_filter_to_info() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("catalog.db")),
            log_filter: None,
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn resolve_rejects_database_in_missing_directory() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/nonexistent/dir/catalog.db")),
            log_filter: None,
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn resolve_accepts_existing_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");
        std::fs::write(&db_path, b"").unwrap();

        let cli = CliConfig {
            db_path: Some(db_path.clone()),
            log_filter: None,
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, db_path);
    }
}
