use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::error::{Result, ToolError};
use crate::lookup::catalog::{GOOGLE_BOOKS_URL, OPEN_LIBRARY_URL};

/// Run configuration, optionally loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the input workbooks and receiving the exports.
    pub output_dir: PathBuf,
    /// Workbook of books already owned, without extension.
    pub reference_file: String,
    /// Workbook of wanted books, without extension.
    pub observed_file: String,
    /// Externally maintained list checked by ISBN, without extension.
    pub external_reference_file: String,
    /// Pause between two requests of one worker.
    pub delay_seconds: f64,
    pub max_concurrency: usize,
    pub user_agent: String,
    pub metadata_base_url: String,
    pub editions_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("../Export"),
            reference_file: "Rqt_Livres_Actifs".to_string(),
            observed_file: "book_titles".to_string(),
            external_reference_file: "Rqt_Livres_Externes".to_string(),
            delay_seconds: 2.0,
            max_concurrency: 4,
            user_agent: format!("book-infos/{}", env!("CARGO_PKG_VERSION")),
            metadata_base_url: GOOGLE_BOOKS_URL.to_string(),
            editions_base_url: OPEN_LIBRARY_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Reads a TOML file; absent keys keep their default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ToolError::Config(e.to_string()))
    }

    /// Path of the workbook `name` inside the output directory.
    pub fn workbook_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.xlsx"))
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            max_concurrency: self.max_concurrency.max(1),
            delay: Duration::from_secs_f64(self.delay_seconds.max(0.0)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            output_dir = "/tmp/books"
            delay_seconds = 0.5
            "#,
        )
        .expect("valid TOML");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/books"));
        assert_eq!(config.batch_options().delay, Duration::from_millis(500));
        assert_eq!(config.reference_file, "Rqt_Livres_Actifs");
        assert_eq!(
            config.workbook_path("new_books"),
            PathBuf::from("/tmp/books/new_books.xlsx")
        );
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let error = Config::from_toml("max_concurrency = \"many\"").unwrap_err();
        assert!(matches!(error, ToolError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config = Config {
            max_concurrency: 0,
            ..Config::default()
        };
        assert_eq!(config.batch_options().max_concurrency, 1);
    }
}
