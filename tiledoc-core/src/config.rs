//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct matching the tiledoc.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,

    /// Join wrapped prose lines of rendered pages into single lines
    #[serde(default = "default_true")]
    pub reflow_paragraphs: bool,

    #[serde(default = "default_true")]
    pub enable_toc: bool,

    #[serde(default = "default_true")]
    pub enable_header: bool,

    #[serde(default = "default_page_extension")]
    pub page_extension: String,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_page_extension() -> String {
    String::from("md")
}

fn default_header_output() -> PathBuf {
    PathBuf::from(crate::models::CANONICAL_HEADER)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub records: PathBuf,
    pub output: PathBuf,

    /// Header skeleton with an `@{hdrs}` span (None means use built-in)
    #[serde(default)]
    pub header_template: Option<PathBuf>,

    #[serde(default = "default_header_output")]
    pub header_output: PathBuf,
}

impl Config {
    /// Configuration for `records` and `output` with every option defaulted
    pub fn new(records: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                records: records.into(),
                output: output.into(),
                header_template: None,
                header_output: default_header_output(),
            },
            reflow_paragraphs: true,
            enable_toc: true,
            enable_header: true,
            page_extension: default_page_extension(),
            config_path: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ext = self.page_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "page_extension '{}' is not a file extension",
                self.page_extension
            )));
        }
        if self.paths.header_output.is_absolute() {
            return Err(ConfigError::Invalid(
                "paths.header_output must be relative to the output directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Page file extension without a leading dot
    pub fn page_extension(&self) -> &str {
        self.page_extension.trim_start_matches('.')
    }

    /// Get the records directory, resolved relative to config file
    pub fn records_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.records)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the header skeleton file (None means use built-in)
    pub fn header_template_path(&self) -> Option<PathBuf> {
        self.paths
            .header_template
            .as_ref()
            .map(|p| self.resolve_path(p))
    }

    /// Where the consolidated header is written
    pub fn header_output_path(&self) -> PathBuf {
        self.output_dir().join(&self.paths.header_output)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config: Config = serde_yaml::from_str("paths:\n  records: doc\n  output: man\n").unwrap();

        assert!(config.reflow_paragraphs);
        assert!(config.enable_toc);
        assert!(config.enable_header);
        assert_eq!(config.page_extension(), "md");
        assert_eq!(config.paths.header_output, PathBuf::from("libdill.h"));
        assert!(config.header_template_path().is_none());
    }

    #[test]
    fn test_paths_resolve_against_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiledoc.yml");
        fs::write(
            &path,
            "paths:\n  records: doc\n  output: out\n  header_template: doc/libdill.tile.h\nenable_toc: false\npage_extension: .txt\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.records_dir(), dir.path().join("doc"));
        assert_eq!(config.output_dir(), dir.path().join("out"));
        assert_eq!(
            config.header_template_path(),
            Some(dir.path().join("doc/libdill.tile.h"))
        );
        assert_eq!(config.header_output_path(), dir.path().join("out/libdill.h"));
        assert!(!config.enable_toc);
        assert_eq!(config.page_extension(), "txt");
    }

    #[test]
    fn test_missing_paths_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiledoc.yml");
        fs::write(&path, "enable_toc: false\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_invalid_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiledoc.yml");
        fs::write(&path, "paths:\n  records: a\n  output: b\npage_extension: \"\"\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new("records", "out");
        assert_eq!(config.records_dir(), PathBuf::from("records"));
        assert_eq!(config.header_output_path(), PathBuf::from("out/libdill.h"));
        assert!(config.reflow_paragraphs);
    }
}
