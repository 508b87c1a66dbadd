//! Compact sync codes: the known set as a base64 bit array over catalogue
//! positions. Bit `i % 8` of byte `i / 8` is set when the `i`-th catalogue
//! kanji is known. Review state is not carried; it only moves with JSON.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::error::{Result, SrsError};
use crate::models::{Catalogue, StudySet};

pub fn encode_sync_code(catalogue: &Catalogue, study: &StudySet) -> String {
    let mut bytes = vec![0u8; catalogue.len().div_ceil(8)];
    for (i, kanji) in catalogue.items().iter().enumerate() {
        if study.is_known(kanji) {
            bytes[i / 8] |= 1u8 << (i % 8);
        }
    }
    BASE64.encode(bytes)
}

/// Returns the catalogue kanji flagged in `code`, in catalogue order. Bits
/// past the end of the catalogue are ignored, and a short code leaves the
/// remaining kanji unflagged.
pub fn decode_sync_code(catalogue: &Catalogue, code: &str) -> Result<Vec<String>> {
    let bytes = BASE64
        .decode(code.trim())
        .map_err(|e| SrsError::InvalidSyncCode(e.to_string()))?;

    Ok(catalogue
        .items()
        .iter()
        .enumerate()
        .filter(|(i, _)| bytes.get(i / 8).is_some_and(|byte| byte & (1u8 << (i % 8)) != 0))
        .map(|(_, kanji)| kanji.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalogue::KanjiEntry;

    const NOW: i64 = 1_700_000_000_000;

    fn catalogue(kanji: &[&str]) -> Catalogue {
        Catalogue::from_entries(
            kanji
                .iter()
                .enumerate()
                .map(|(i, k)| KanjiEntry {
                    kanji: k.to_string(),
                    frequency: i as u32 + 1,
                })
                .collect(),
        )
    }

    #[test]
    fn test_encode_bit_layout() {
        let catalogue = catalogue(&["日", "一", "人", "大", "年", "二", "本", "中", "長"]);
        let mut study = StudySet::new();
        study.mark_known("日", NOW);
        study.mark_known("人", NOW);
        study.mark_known("長", NOW);

        // byte 0 = 0b0000_0101, byte 1 = 0b0000_0001
        assert_eq!(encode_sync_code(&catalogue, &study), "BQE=");
    }

    #[test]
    fn test_decode_restores_known_set() {
        let catalogue = catalogue(&["日", "一", "人", "大", "年", "二", "本", "中", "長"]);
        let mut study = StudySet::new();
        for kanji in ["一", "中", "長"] {
            study.mark_known(kanji, NOW);
        }

        let code = encode_sync_code(&catalogue, &study);
        let decoded = decode_sync_code(&catalogue, &format!("  {code}\n")).unwrap();
        assert_eq!(decoded, vec!["一", "中", "長"]);
    }

    #[test]
    fn test_decode_short_code() {
        let catalogue = catalogue(&["日", "一", "人", "大", "年", "二", "本", "中", "長"]);
        // one byte, all set: only the first eight kanji
        let decoded = decode_sync_code(&catalogue, "/w==").unwrap();
        assert_eq!(decoded.len(), 8);
        assert!(!decoded.contains(&"長".to_string()));
    }

    #[test]
    fn test_decode_invalid() {
        let catalogue = catalogue(&["日"]);
        assert!(matches!(
            decode_sync_code(&catalogue, "not base64!"),
            Err(SrsError::InvalidSyncCode(_))
        ));
    }

    #[test]
    fn test_empty_catalogue() {
        let catalogue = Catalogue::default();
        assert_eq!(encode_sync_code(&catalogue, &StudySet::new()), "");
        assert!(decode_sync_code(&catalogue, "").unwrap().is_empty());
    }
}
