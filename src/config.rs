//! Settings for the command-line study tool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use crate::error::{Result, SrsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// SQLite file holding the known set and review state.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// How many of the most overdue items `next` offers.
    #[serde(default = "default_review_batch_size")]
    pub review_batch_size: usize,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Kanji list (JSON array of `{ "Kanji", "Frequency" }`). Without it the
    /// known set stands in for the catalogue.
    #[serde(default)]
    pub catalogue_path: Option<PathBuf>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("kanji_srs.sqlite3")
}

fn default_review_batch_size() -> usize {
    5
}

fn default_log_filter() -> String {
    "kanji_srs=info".to_string()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            review_batch_size: default_review_batch_size(),
            log_filter: default_log_filter(),
            catalogue_path: None,
        }
    }
}

impl StudyConfig {
    /// Loads the config from a JSON file. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SrsError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.review_batch_size == 0 {
            return Err(SrsError::Config(
                "review_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
