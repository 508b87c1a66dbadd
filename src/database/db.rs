//! Database operations for the study tool
//!
//! Handles SQLite initialization and persistence of the known set and the
//! SM-2 review state of every known item.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Result, params};
use tracing::{debug, info};

use crate::models::{ReviewState, StudySet, Timestamp};

/// Opens (or creates) the database at `path` and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Creates tables for known items and their review state.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Known items, rowid keeps marking order
    conn.execute(
        "CREATE TABLE IF NOT EXISTS known_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item TEXT NOT NULL UNIQUE
        )",
        (),
    )?;

    // SM-2 state, one row per known item
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_state (
            item TEXT PRIMARY KEY,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review_at INTEGER NOT NULL,
            last_reviewed_at INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (item) REFERENCES known_items(item) ON DELETE CASCADE
        )",
        (),
    )?;

    // Key/value app state (undo slot)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Stores which item the next undo would unmark, or clears it.
pub fn save_last_marked(conn: &Connection, item: Option<&str>) -> Result<()> {
    match item {
        Some(item) => conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES ('last_marked', ?1)",
            params![item],
        )?,
        None => conn.execute("DELETE FROM app_state WHERE key = 'last_marked'", ())?,
    };
    Ok(())
}

pub fn load_last_marked(conn: &Connection) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM app_state WHERE key = 'last_marked'",
        [],
        |row| row.get(0),
    )
    .optional()
}

/// Erases every known item, its review state and the undo slot.
pub fn reset_progress(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM review_state", ())?;
    tx.execute("DELETE FROM known_items", ())?;
    tx.execute("DELETE FROM app_state WHERE key = 'last_marked'", ())?;
    tx.commit()?;
    info!("progress reset");
    Ok(())
}

/// Adds `item` to the known set and stores its initial state.
///
/// Already known items are left untouched.
pub fn mark_known(conn: &Connection, item: &str, state: &ReviewState) -> Result<()> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO known_items (item) VALUES (?1)",
        params![item],
    )?;
    if inserted > 0 {
        save_state(conn, item, state)?;
        debug!(item, "marked known");
    }
    Ok(())
}

/// Removes `item` from the known set; its review state goes with it.
///
/// Returns whether anything was removed.
pub fn remove_item(conn: &Connection, item: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM known_items WHERE item = ?1", params![item])?;
    debug!(item, removed, "unmarked");
    Ok(removed > 0)
}

/// Inserts or replaces the review state of a known item.
pub fn save_state(conn: &Connection, item: &str, state: &ReviewState) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO review_state
         (item, ease_factor, interval_days, repetitions, next_review_at, last_reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            item,
            state.ease_factor,
            state.interval,
            state.repetitions,
            state.next_review_at,
            state.last_reviewed_at
        ],
    )?;
    Ok(())
}

pub fn load_state(conn: &Connection, item: &str) -> Result<Option<ReviewState>> {
    conn.query_row(
        "SELECT ease_factor, interval_days, repetitions, next_review_at, last_reviewed_at
         FROM review_state WHERE item = ?1",
        params![item],
        |row| {
            Ok(ReviewState {
                ease_factor: row.get(0)?,
                interval: row.get(1)?,
                repetitions: row.get(2)?,
                next_review_at: row.get(3)?,
                last_reviewed_at: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Known items in the order they were marked.
pub fn known_items(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT item FROM known_items ORDER BY id ASC")?;
    let items = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>>>()?;
    Ok(items)
}

/// Loads the whole known set with its review state.
///
/// Known items without a stored state get a fresh entry created at `now`.
pub fn load_study_set(conn: &Connection, now: Timestamp) -> Result<StudySet> {
    let known = known_items(conn)?;

    let mut stmt = conn.prepare(
        "SELECT item, ease_factor, interval_days, repetitions, next_review_at, last_reviewed_at
         FROM review_state",
    )?;
    let states = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ReviewState {
                    ease_factor: row.get(1)?,
                    interval: row.get(2)?,
                    repetitions: row.get(3)?,
                    next_review_at: row.get(4)?,
                    last_reviewed_at: row.get(5)?,
                },
            ))
        })?
        .collect::<Result<HashMap<_, _>>>()?;

    debug!(known = known.len(), states = states.len(), "loaded study set");
    let mut study = StudySet::from_parts(known, states, now);
    study.set_last_marked(load_last_marked(conn)?);
    Ok(study)
}

/// Replaces the stored known set, states and undo slot with `study`, in one
/// transaction.
pub fn replace_study_set(conn: &mut Connection, study: &StudySet) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM review_state", ())?;
    tx.execute("DELETE FROM known_items", ())?;
    for (item, state) in study.entries() {
        mark_known(&tx, item, state)?;
    }
    save_last_marked(&tx, study.last_marked())?;
    tx.commit()?;
    info!(known = study.known_count(), "study set replaced");
    Ok(())
}
