//! The kanji list studied from, sorted by frequency rank.
//!
//! Loaded from a JSON array of objects carrying at least `Kanji` and
//! `Frequency`. Rank 0 means "no rank" and sorts after every ranked entry.
//! Order matters: sync codes address kanji by their catalogue position.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KanjiEntry {
    #[serde(rename = "Kanji")]
    pub kanji: String,
    #[serde(rename = "Frequency", default)]
    pub frequency: u32,
}

#[derive(Clone, Debug, Default)]
pub struct Catalogue {
    kanji: Vec<String>,
}

impl Catalogue {
    pub fn from_entries(mut entries: Vec<KanjiEntry>) -> Self {
        // Stable sort keeps file order among equal ranks.
        entries.sort_by_key(|entry| match entry.frequency {
            0 => u32::MAX,
            rank => rank - 1,
        });
        Self {
            kanji: entries.into_iter().map(|entry| entry.kanji).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let entries: Vec<KanjiEntry> = serde_json::from_str(&contents)?;
        let catalogue = Self::from_entries(entries);
        info!(path = %path.display(), kanji = catalogue.len(), "catalogue loaded");
        Ok(catalogue)
    }

    pub fn items(&self) -> &[String] {
        &self.kanji
    }

    pub fn len(&self) -> usize {
        self.kanji.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kanji.is_empty()
    }
}
