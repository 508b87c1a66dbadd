//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each item has an easiness factor (EF) that adjusts based on performance
//! - Quality below 3: repetitions reset and the item comes back tomorrow
//! - Quality 3 and above: interval grows 1 day → 6 days → interval * EF
//! - EF is adjusted after every review and never falls below 1.3
//!
//! Only four qualities are exposed to learners (Again=1, Hard=3, Good=4,
//! Easy=5). Quality 2 is left unused so the EF formula keeps the classic
//! 0-5 calibration.

use std::fmt;
use std::str::FromStr;

use super::{ReviewState, Timestamp};
use crate::error::SrsError;

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A rating button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Quality {
    Again = 1,
    Hard = 3,
    Good = 4,
    Easy = 5,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    pub fn score(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Again => "Again",
            Quality::Hard => "Hard",
            Quality::Good => "Good",
            Quality::Easy => "Easy",
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = SrsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Quality::Again),
            3 => Ok(Quality::Hard),
            4 => Ok(Quality::Good),
            5 => Ok(Quality::Easy),
            other => Err(SrsError::InvalidQuality(other)),
        }
    }
}

impl FromStr for Quality {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "again" => Ok(Quality::Again),
            "hard" => Ok(Quality::Hard),
            "good" => Ok(Quality::Good),
            "easy" => Ok(Quality::Easy),
            other => match other.parse::<u8>() {
                Ok(score) => Quality::try_from(score),
                Err(_) => Err(SrsError::UnknownRating(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fresh state for an item that just entered the known set.
pub fn create_entry(now: Timestamp) -> ReviewState {
    ReviewState {
        ease_factor: INITIAL_EASE_FACTOR,
        interval: 0,
        repetitions: 0,
        next_review_at: now,
        last_reviewed_at: 0,
    }
}

/// Calculates the next state for a review graded with `quality`.
///
/// Any score is accepted; the arithmetic is defined for all of them even
/// though callers only produce 1, 3, 4 and 5.
pub fn calculate_next_review(entry: &ReviewState, quality: u8, now: Timestamp) -> ReviewState {
    let (interval, repetitions) = if quality >= 3 {
        let interval = match entry.repetitions {
            0 => 1,
            1 => 6,
            _ => (f64::from(entry.interval) * entry.ease_factor).round() as u32,
        };
        (interval, entry.repetitions.saturating_add(1))
    } else {
        (1, 0)
    };

    let q = f64::from(quality);
    let ease_factor =
        (entry.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EASE_FACTOR);

    ReviewState {
        ease_factor,
        interval,
        repetitions,
        next_review_at: now.saturating_add(i64::from(interval) * DAY_MS),
        last_reviewed_at: now,
    }
}

pub fn review(entry: &ReviewState, quality: Quality, now: Timestamp) -> ReviewState {
    calculate_next_review(entry, quality.score(), now)
}
