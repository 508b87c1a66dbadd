//! The learner's known items and their scheduling state.
//!
//! Items are identified by string keys (a kanji character, usually). Every
//! known item has exactly one `ReviewState`; unmarking an item discards it.

use std::collections::HashMap;

use super::due::{due_count, select_due};
use super::sm2::{Quality, create_entry, review};
use super::{ReviewState, Timestamp};

/// Summary numbers for a catalogue of items.
#[derive(Clone, Debug, PartialEq)]
pub struct StudyStats {
    pub total: usize,
    pub known: usize,
    pub unknown: usize,
    pub due: usize,
    pub percent_known: f64,
    /// `None` when nothing has been learned yet.
    pub average_ease: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct StudySet {
    /// Known items in the order they were marked.
    order: Vec<String>,
    states: HashMap<String, ReviewState>,
    last_marked: Option<String>,
}

impl StudySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a set from persisted data. Items without a state get a fresh
    /// entry; states for items not listed are dropped.
    pub fn from_parts(
        known: impl IntoIterator<Item = String>,
        mut states: HashMap<String, ReviewState>,
        now: Timestamp,
    ) -> Self {
        let mut set = Self::new();
        for item in known {
            if set.states.contains_key(&item) {
                continue;
            }
            let state = states.remove(&item).unwrap_or_else(|| create_entry(now));
            set.states.insert(item.clone(), state);
            set.order.push(item);
        }
        set
    }

    pub fn is_known(&self, item: &str) -> bool {
        self.states.contains_key(item)
    }

    pub fn state(&self, item: &str) -> Option<&ReviewState> {
        self.states.get(item)
    }

    pub fn known_count(&self) -> usize {
        self.order.len()
    }

    pub fn known_items(&self) -> &[String] {
        &self.order
    }

    /// Iterates known items with their state, in marking order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ReviewState)> {
        self.order
            .iter()
            .filter_map(|item| self.states.get(item).map(|state| (item.as_str(), state)))
    }

    /// Adds `item` with a fresh entry. Returns false if it was already known.
    pub fn mark_known(&mut self, item: &str, now: Timestamp) -> bool {
        if self.is_known(item) {
            return false;
        }
        self.states.insert(item.to_string(), create_entry(now));
        self.order.push(item.to_string());
        self.last_marked = Some(item.to_string());
        true
    }

    /// Removes `item` and its state. Returns the discarded state.
    pub fn unmark(&mut self, item: &str) -> Option<ReviewState> {
        let state = self.states.remove(item)?;
        self.order.retain(|known| known != item);
        self.last_marked = None;
        Some(state)
    }

    /// Returns whether the item is known afterwards.
    pub fn toggle_known(&mut self, item: &str, now: Timestamp) -> bool {
        if self.unmark(item).is_some() {
            false
        } else {
            self.mark_known(item, now)
        }
    }

    /// Reverts the most recent `mark_known`.
    pub fn undo_last_mark(&mut self) -> Option<String> {
        let item = self.last_marked.take()?;
        self.states.remove(&item);
        self.order.retain(|known| *known != item);
        Some(item)
    }

    /// The item `undo_last_mark` would revert.
    pub fn last_marked(&self) -> Option<&str> {
        self.last_marked.as_deref()
    }

    /// Restores the undo slot after loading, if `item` is still known.
    pub fn set_last_marked(&mut self, item: Option<String>) {
        self.last_marked = item.filter(|item| self.is_known(item));
    }

    /// Adds every item not yet known with a fresh entry. Existing states are
    /// kept and the undo slot is untouched. Returns the newly added items.
    pub fn merge_known<I, S>(&mut self, items: I, now: Timestamp) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        for item in items {
            let item = item.as_ref();
            if self.is_known(item) {
                continue;
            }
            self.states.insert(item.to_string(), create_entry(now));
            self.order.push(item.to_string());
            added.push(item.to_string());
        }
        added
    }

    /// Forgets every known item and its state.
    pub fn reset(&mut self) {
        self.order.clear();
        self.states.clear();
        self.last_marked = None;
    }

    /// Grades `item`, marking it known first if needed.
    pub fn rate(&mut self, item: &str, quality: Quality, now: Timestamp) -> ReviewState {
        if !self.is_known(item) {
            self.states.insert(item.to_string(), create_entry(now));
            self.order.push(item.to_string());
        }
        let entry = self.states.get(item).copied().unwrap_or_else(|| create_entry(now));
        let next = review(&entry, quality, now);
        self.states.insert(item.to_string(), next);
        next
    }

    /// Puts back a state captured earlier, e.g. to undo a rating.
    pub(crate) fn restore(&mut self, item: &str, state: ReviewState) {
        if !self.is_known(item) {
            self.order.push(item.to_string());
        }
        self.states.insert(item.to_string(), state);
    }

    /// The state each rating button would produce, for labelling.
    pub fn preview(&self, item: &str, now: Timestamp) -> [(Quality, ReviewState); 4] {
        let entry = self.states.get(item).copied().unwrap_or_else(|| create_entry(now));
        Quality::ALL.map(|quality| (quality, review(&entry, quality, now)))
    }

    pub fn due<'a, T: AsRef<str>>(&self, catalogue: &'a [T], now: Timestamp) -> Vec<&'a T> {
        select_due(
            catalogue,
            |item| self.is_known(item.as_ref()),
            |item| self.state(item.as_ref()),
            now,
        )
    }

    pub fn due_count<T: AsRef<str>>(&self, catalogue: &[T], now: Timestamp) -> usize {
        due_count(
            catalogue,
            |item| self.is_known(item.as_ref()),
            |item| self.state(item.as_ref()),
            now,
        )
    }

    /// Due items, longest since last review first (never reviewed before
    /// everything else), cut to `limit`.
    pub fn review_candidates<'a, T: AsRef<str>>(
        &self,
        catalogue: &'a [T],
        now: Timestamp,
        limit: usize,
    ) -> Vec<&'a T> {
        let mut due = self.due(catalogue, now);
        due.sort_by_key(|item| {
            let last = self
                .state(item.as_ref())
                .map_or(0, |state| state.last_reviewed_at);
            std::cmp::Reverse(now.saturating_sub(last))
        });
        due.truncate(limit);
        due
    }

    pub fn stats<T: AsRef<str>>(&self, catalogue: &[T], now: Timestamp) -> StudyStats {
        let total = catalogue.len();
        let known = catalogue
            .iter()
            .filter(|item| self.is_known(item.as_ref()))
            .count();
        let percent_known = if total > 0 {
            known as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let average_ease = if self.states.is_empty() {
            None
        } else {
            let sum: f64 = self.states.values().map(|state| state.ease_factor).sum();
            Some(sum / self.states.len() as f64)
        };

        StudyStats {
            total,
            known,
            unknown: total - known,
            due: self.due_count(catalogue, now),
            percent_known,
            average_ease,
        }
    }
}
