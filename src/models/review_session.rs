//! Review session over the items that are due right now.
//! Items graded below 3 are repeated in the next round until every item passes.

use tracing::debug;

use super::sm2::Quality;
use super::{ReviewState, StudySet, Timestamp};

/// Undo record for one grading: the item's state before it, plus where the
/// session stood.
#[derive(Clone, Debug)]
struct Graded {
    item: String,
    idx: usize,
    /// `None` when the item was not known before grading.
    previous: Option<ReviewState>,
    passed_before: bool,
    round: Vec<usize>,
    round_index: usize,
    round_number: usize,
}

pub struct ReviewSession {
    items: Vec<String>,
    current_round: Vec<usize>,
    current_index: usize,
    passed: Vec<bool>,
    round_number: usize,
    history: Vec<Graded>,
}

impl ReviewSession {
    /// Creates a session from the due items, in queue order.
    pub fn new(items: Vec<String>) -> Self {
        let indices: Vec<usize> = (0..items.len()).collect();
        let passed = vec![false; items.len()];
        Self {
            items,
            current_round: indices,
            current_index: 0,
            passed,
            round_number: 1,
            history: Vec::new(),
        }
    }

    /// Builds the queue with `StudySet::due`.
    pub fn from_due<T: AsRef<str>>(study: &StudySet, catalogue: &[T], now: Timestamp) -> Self {
        let due = study
            .due(catalogue, now)
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .collect();
        Self::new(due)
    }

    pub fn current_item(&self) -> Option<&str> {
        self.current_round
            .get(self.current_index)
            .and_then(|&idx| self.items.get(idx))
            .map(String::as_str)
    }

    /// Grades the current item and moves on. Returns the new state.
    pub fn grade_current(
        &mut self,
        study: &mut StudySet,
        quality: Quality,
        now: Timestamp,
    ) -> Option<ReviewState> {
        let &idx = self.current_round.get(self.current_index)?;
        let item = self.items.get(idx)?.clone();

        let previous = study.state(&item).copied();
        let next = study.rate(&item, quality, now);
        debug!(item = %item, %quality, interval = next.interval, "graded");

        self.history.push(Graded {
            item,
            idx,
            previous,
            passed_before: self.passed[idx],
            round: self.current_round.clone(),
            round_index: self.current_index,
            round_number: self.round_number,
        });
        self.passed[idx] = quality.score() >= 3;
        self.next_item();
        Some(next)
    }

    /// Reverts the last grading and returns to that item, even when the
    /// grading closed a round. An item that was unknown before it was graded
    /// is unmarked again; otherwise its previous state is put back.
    pub fn undo(&mut self, study: &mut StudySet) -> Option<String> {
        let last = self.history.pop()?;
        match last.previous {
            Some(previous) => study.restore(&last.item, previous),
            None => {
                study.unmark(&last.item);
            }
        }
        self.passed[last.idx] = last.passed_before;
        self.current_round = last.round;
        self.current_index = last.round_index;
        self.round_number = last.round_number;
        Some(last.item)
    }

    pub fn next_item(&mut self) {
        if self.current_index + 1 < self.current_round.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the items that did not pass. When every
    /// item passed the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round
            .iter()
            .copied()
            .filter(|&idx| !self.passed[idx])
            .collect();

        if failed.is_empty() {
            self.current_index = self.current_round.len();
            return;
        }

        self.current_round = failed;
        self.current_index = 0;
        self.round_number += 1;
        debug!(round = self.round_number, items = self.current_round.len(), "next round");
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_round
            .iter()
            .filter(|&&idx| self.passed[idx])
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.reviewed_count()
    }

    pub fn round_number(&self) -> usize {
        self.round_number
    }

    pub fn is_completed(&self) -> bool {
        self.current_round.is_empty() || self.reviewed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} items", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Retry): {} items to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
