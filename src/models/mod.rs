pub mod catalogue;
pub mod due;
pub mod format;
pub mod review_session;
pub mod review_state;
pub mod sm2;
pub mod study_set;

pub use catalogue::{Catalogue, KanjiEntry};
pub use due::{due_count, is_due, select_due};
pub use format::format_interval;
pub use review_session::ReviewSession;
pub use review_state::{ReviewState, Timestamp, format_timestamp, now_millis};
pub use sm2::{Quality, calculate_next_review, create_entry, review};
pub use study_set::{StudySet, StudyStats};
