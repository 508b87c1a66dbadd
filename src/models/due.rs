//! Due checks and work-queue selection.
use super::{ReviewState, Timestamp};

/// An item with no scheduling history, or one that was never reviewed, is
/// always due.
pub fn is_due(entry: Option<&ReviewState>, now: Timestamp) -> bool {
    entry.is_none_or(|entry| entry.is_new() || entry.next_review_at <= now)
}

/// Filters `items` to the known ones whose review is due, keeping input order.
pub fn select_due<'a, 's, T, M, L>(
    items: &'a [T],
    is_member: M,
    lookup: L,
    now: Timestamp,
) -> Vec<&'a T>
where
    M: Fn(&T) -> bool,
    L: Fn(&T) -> Option<&'s ReviewState>,
{
    items
        .iter()
        .filter(|item| is_member(item) && is_due(lookup(item), now))
        .collect()
}

pub fn due_count<'s, T, M, L>(items: &[T], is_member: M, lookup: L, now: Timestamp) -> usize
where
    M: Fn(&T) -> bool,
    L: Fn(&T) -> Option<&'s ReviewState>,
{
    select_due(items, is_member, lookup, now).len()
}
