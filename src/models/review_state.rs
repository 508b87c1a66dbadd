//! Per-item scheduling state.
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// SM-2 state for one learned item.
///
/// Serialized with camelCase keys so snapshots keep the
/// `easeFactor`/`interval`/`repetitions`/`nextReviewAt`/`lastReviewedAt` shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review_at: Timestamp,
    /// 0 means the item was never reviewed.
    pub last_reviewed_at: Timestamp,
}

impl ReviewState {
    pub fn is_new(&self) -> bool {
        self.last_reviewed_at == 0
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Renders a timestamp as local `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(ts: Timestamp) -> String {
    match chrono::DateTime::from_timestamp_millis(ts) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "invalid date".to_string(),
    }
}
