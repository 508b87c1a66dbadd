pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{Result, SrsError};
pub use models::{
    Quality, ReviewSession, ReviewState, StudySet, StudyStats, Timestamp, create_entry,
    format_interval, is_due, review, select_due,
};
