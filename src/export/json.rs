//! JSON import/export of the study set.
//! A snapshot holds the known items plus a map from item to review state.
//! Older files listing items under `practiced` (and no `known`) still import.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SrsError};
use crate::models::{ReviewState, StudySet, Timestamp};

pub const SNAPSHOT_VERSION: &str = "3.0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known: Option<Vec<String>>,
    #[serde(default)]
    pub srs: BTreeMap<String, ReviewState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Catalogue size when the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practiced: Option<Vec<String>>,
}

impl StudySnapshot {
    pub fn from_study_set(study: &StudySet, total: Option<usize>, now: Timestamp) -> Self {
        Self {
            version: Some(SNAPSHOT_VERSION.to_string()),
            known: Some(study.known_items().to_vec()),
            srs: study
                .entries()
                .map(|(item, state)| (item.to_string(), *state))
                .collect(),
            timestamp: DateTime::from_timestamp_millis(now),
            total,
            practiced: None,
        }
    }

    /// Converts back into a study set. Review states for items that are not
    /// known are dropped; known items without one get a fresh entry.
    pub fn into_study_set(self, now: Timestamp) -> Result<StudySet> {
        let known = match (self.known, self.practiced) {
            (Some(known), _) => known,
            (None, Some(practiced)) => {
                info!(items = practiced.len(), "importing legacy practiced list");
                practiced
            }
            (None, None) => {
                return Err(SrsError::InvalidSnapshot(
                    "expected a `known` or `practiced` list".to_string(),
                ));
            }
        };

        let mut states: HashMap<String, ReviewState> = self.srs.into_iter().collect();
        for item in states.keys() {
            if !known.contains(item) {
                warn!(item = %item, "dropping review state for unknown item");
            }
        }
        states.retain(|item, _| known.contains(item));
        Ok(StudySet::from_parts(known, states, now))
    }
}

/// Writes the study set as pretty JSON to `path`.
pub fn export_json_to_path(
    study: &StudySet,
    total: Option<usize>,
    path: &Path,
    now: Timestamp,
) -> Result<()> {
    let snapshot = StudySnapshot::from_study_set(study, total, now);
    let json_string = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json_string)?;
    info!(path = %path.display(), known = study.known_count(), "exported study set");
    Ok(())
}

/// Reads a study set from a JSON snapshot.
pub fn import_json(path: &Path, now: Timestamp) -> Result<StudySet> {
    let contents = fs::read_to_string(path)?;
    let snapshot: StudySnapshot = serde_json::from_str(&contents)?;
    let study = snapshot.into_study_set(now)?;
    info!(path = %path.display(), known = study.known_count(), "imported study set");
    Ok(study)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quality;
    use tempfile::tempdir;

    const NOW: Timestamp = 1_700_000_000_000;

    fn create_test_study() -> StudySet {
        let mut study = StudySet::new();
        study.mark_known("水", NOW);
        study.rate("火", Quality::Hard, NOW);
        study.rate("火", Quality::Good, NOW + 1);
        study
    }

    #[test]
    fn test_export_and_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.json");
        let original = create_test_study();

        export_json_to_path(&original, Some(2136), &path, NOW).unwrap();
        let imported = import_json(&path, NOW + 500).unwrap();

        assert_eq!(imported.known_items(), original.known_items());
        for item in original.known_items() {
            assert_eq!(imported.state(item), original.state(item));
        }
    }

    #[test]
    fn test_export_uses_persisted_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.json");
        export_json_to_path(&create_test_study(), Some(2136), &path, NOW).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let fire = &value["srs"]["火"];
        assert_eq!(fire["interval"], 6);
        assert_eq!(fire["repetitions"], 2);
        assert_eq!(fire["lastReviewedAt"], NOW + 1);
        assert!(fire["easeFactor"].is_f64());
        assert_eq!(value["version"], "3.0");
        assert_eq!(value["total"], 2136);
        assert_eq!(value["known"][0], "水");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T"));
        assert!(value.get("practiced").is_none());
    }

    #[test]
    fn test_many_reviewed_states_survive_export_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.json");
        let ratings = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

        let mut study = StudySet::new();
        for n in 0..200usize {
            let item = format!("item-{n}");
            for step in 0..(n % 9 + 1) {
                let quality = ratings[(n * 7 + step * 3) % ratings.len()];
                study.rate(&item, quality, NOW + (step as i64) * 1_000);
            }
        }

        export_json_to_path(&study, None, &path, NOW).unwrap();
        let imported = import_json(&path, NOW).unwrap();

        assert_eq!(imported.known_count(), 200);
        for (item, state) in study.entries() {
            let back = imported.state(item).unwrap();
            assert_eq!(
                back.ease_factor.to_bits(),
                state.ease_factor.to_bits(),
                "{item}"
            );
            assert_eq!(back, state);
        }
    }

    #[test]
    fn test_import_legacy_practiced_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("v2.json");
        fs::write(&path, r#"{ "practiced": ["日", "月"] }"#).unwrap();

        let study = import_json(&path, NOW).unwrap();
        assert_eq!(study.known_items(), ["日".to_string(), "月".to_string()]);
        assert!(study.state("月").unwrap().is_new());
        assert_eq!(study.state("日").unwrap().next_review_at, NOW);
    }

    #[test]
    fn test_known_list_wins_over_practiced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.json");
        fs::write(&path, r#"{ "known": ["山"], "practiced": ["日", "月"] }"#).unwrap();

        let study = import_json(&path, NOW).unwrap();
        assert_eq!(study.known_items(), ["山".to_string()]);
    }

    #[test]
    fn test_import_without_item_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, r#"{ "version": "3.0", "srs": {} }"#).unwrap();

        assert!(matches!(
            import_json(&path, NOW),
            Err(SrsError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_import_drops_orphan_states_and_fills_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.json");
        let json_content = r#"{
  "known": ["金", "土"],
  "srs": {
    "金": {
      "easeFactor": 2.36,
      "interval": 6,
      "repetitions": 2,
      "nextReviewAt": 1700518400000,
      "lastReviewedAt": 1700000000000
    },
    "月": {
      "easeFactor": 2.5,
      "interval": 1,
      "repetitions": 1,
      "nextReviewAt": 1700086400000,
      "lastReviewedAt": 1700000000000
    }
  }
}"#;
        fs::write(&path, json_content).unwrap();

        let study = import_json(&path, NOW).unwrap();
        assert_eq!(study.known_count(), 2);
        assert_eq!(study.state("金").unwrap().ease_factor, 2.36);
        assert!(study.state("土").unwrap().is_new());
        assert!(!study.is_known("月"));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let dir = tempdir().unwrap();
        let result = import_json(&dir.path().join("missing.json"), NOW);
        assert!(matches!(result, Err(SrsError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let result = import_json(&path, NOW);
        assert!(matches!(result, Err(SrsError::Json(_))));
    }
}
