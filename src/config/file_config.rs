use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub log_filter: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_path = \"/data/kiwi_catalog.db\"").unwrap();
        writeln!(file, "log_filter = \"debug\"").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path, Some("/data/kiwi_catalog.db".to_string()));
        assert_eq!(config.log_filter, Some("debug".to_string()));
    }

    #[test]
    fn missing_keys_default_to_none() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.db_path.is_none());
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(FileConfig::load("/nonexistent/kiwi.toml").is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_path = [not toml").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
    }
}
