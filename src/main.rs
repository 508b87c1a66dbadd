use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kanji_srs::config::StudyConfig;
use kanji_srs::database::db;
use kanji_srs::export::json::{export_json_to_path, import_json};
use kanji_srs::export::sync_code::{decode_sync_code, encode_sync_code};
use kanji_srs::models::{Catalogue, format_timestamp, now_millis};
use kanji_srs::{
    Quality, Result, ReviewSession, SrsError, StudySet, Timestamp, format_interval,
};

#[derive(Parser)]
#[command(name = "kanji-srs", version, about = "Kanji flashcards with SM-2 scheduling")]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "kanji_srs.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress and review numbers
    Status,
    /// Mark an item as known and schedule it
    Mark { item: String },
    /// Remove an item and its schedule
    Unmark { item: String },
    /// Mark an unknown item, or unmark a known one
    Toggle { item: String },
    /// Unmark the item that was marked last
    Undo,
    /// Rate a review: again, hard, good or easy
    Rate { item: String, quality: String },
    /// List items due for review
    Due,
    /// Suggest what to review next
    Next,
    /// Review every due item, repeating failed ones until they pass
    Review,
    /// Show what each rating would schedule
    Preview { item: String },
    /// Write the study set to a JSON file
    Export { path: PathBuf },
    /// Replace the study set with a JSON file
    Import { path: PathBuf },
    /// Print the known set as a sync code
    SyncExport,
    /// Add the items of a sync code to the known set
    SyncImport { code: String },
    /// Forget all progress
    Reset {
        /// Skip the confirmation notice
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StudyConfig::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.config.exists() {
        debug!(path = %cli.config.display(), ?config, "config loaded");
    } else {
        debug!(path = %cli.config.display(), "no config file, using defaults");
    }

    let catalogue = config
        .catalogue_path
        .as_deref()
        .map(Catalogue::load)
        .transpose()?;
    let mut conn = db::init_database(&config.database_path)?;
    let now = now_millis();

    match cli.command {
        Commands::Status => status(&conn, catalogue.as_ref(), now),
        Commands::Mark { item } => mark(&conn, &item, now),
        Commands::Unmark { item } => unmark(&conn, &item, now),
        Commands::Toggle { item } => toggle(&conn, &item, now),
        Commands::Undo => undo(&conn, now),
        Commands::Rate { item, quality } => rate(&conn, &item, quality.parse()?, now),
        Commands::Due => due(&conn, catalogue.as_ref(), now),
        Commands::Next => next(&conn, catalogue.as_ref(), config.review_batch_size, now),
        Commands::Review => review(&conn, catalogue.as_ref(), io::stdin().lock(), now),
        Commands::Preview { item } => preview(&conn, &item, now),
        Commands::Export { path } => {
            let study = db::load_study_set(&conn, now)?;
            let total = catalogue.as_ref().map(Catalogue::len);
            export_json_to_path(&study, total, &path, now)?;
            println!("Exported {} items to {}", study.known_count(), path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let study = import_json(&path, now)?;
            db::replace_study_set(&mut conn, &study)?;
            println!("Imported {} items from {}", study.known_count(), path.display());
            Ok(())
        }
        Commands::SyncExport => {
            let catalogue = require_catalogue(catalogue.as_ref())?;
            let study = db::load_study_set(&conn, now)?;
            println!("{}", encode_sync_code(catalogue, &study));
            Ok(())
        }
        Commands::SyncImport { code } => {
            let catalogue = require_catalogue(catalogue.as_ref())?;
            sync_import(&conn, catalogue, &code, now)
        }
        Commands::Reset { yes } => {
            if !yes {
                println!("This erases every known item and its schedule. Re-run with --yes.");
                return Ok(());
            }
            db::reset_progress(&mut conn)?;
            println!("Progress reset");
            Ok(())
        }
    }
}

fn require_catalogue(catalogue: Option<&Catalogue>) -> Result<&Catalogue> {
    catalogue.ok_or_else(|| {
        SrsError::Config("sync codes need `catalogue_path` in the config file".to_string())
    })
}

/// The catalogue order, or the known set when no catalogue is configured.
fn item_list(catalogue: Option<&Catalogue>, study: &StudySet) -> Vec<String> {
    match catalogue {
        Some(catalogue) => catalogue.items().to_vec(),
        None => study.known_items().to_vec(),
    }
}

fn status(conn: &Connection, catalogue: Option<&Catalogue>, now: Timestamp) -> Result<()> {
    let study = db::load_study_set(conn, now)?;
    let stats = study.stats(&item_list(catalogue, &study), now);
    println!("Total:   {}", stats.total);
    println!("Known:   {} ({:.1}%)", stats.known, stats.percent_known);
    println!("Unknown: {}", stats.unknown);
    println!("Due:     {}", stats.due);
    match stats.average_ease {
        Some(ease) => println!("Average ease: {ease:.2}"),
        None => println!("Average ease: -"),
    }
    Ok(())
}

fn mark(conn: &Connection, item: &str, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    if !study.mark_known(item, now) {
        println!("{item} is already known");
        return Ok(());
    }
    if let Some(state) = study.state(item) {
        db::mark_known(conn, item, state)?;
    }
    db::save_last_marked(conn, study.last_marked())?;
    println!("{item} marked as known");
    Ok(())
}

fn unmark(conn: &Connection, item: &str, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    if study.unmark(item).is_none() {
        return Err(SrsError::UnknownItem(item.to_string()));
    }
    db::remove_item(conn, item)?;
    db::save_last_marked(conn, study.last_marked())?;
    println!("{item} removed");
    Ok(())
}

fn toggle(conn: &Connection, item: &str, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    if study.toggle_known(item, now) {
        if let Some(state) = study.state(item) {
            db::mark_known(conn, item, state)?;
        }
        println!("{item} marked as known");
    } else {
        db::remove_item(conn, item)?;
        println!("{item} removed");
    }
    db::save_last_marked(conn, study.last_marked())?;
    Ok(())
}

fn undo(conn: &Connection, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    match study.undo_last_mark() {
        Some(item) => {
            db::remove_item(conn, &item)?;
            db::save_last_marked(conn, None)?;
            println!("Undid marking {item}");
        }
        None => println!("Nothing to undo"),
    }
    Ok(())
}

fn rate(conn: &Connection, item: &str, quality: Quality, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    let was_known = study.is_known(item);
    let state = study.rate(item, quality, now);
    if !was_known {
        db::mark_known(conn, item, &state)?;
    }
    db::save_state(conn, item, &state)?;
    println!(
        "{item}: {quality} -> next review in {} ({})",
        format_interval(Some(&state)),
        format_timestamp(state.next_review_at)
    );
    Ok(())
}

fn due(conn: &Connection, catalogue: Option<&Catalogue>, now: Timestamp) -> Result<()> {
    let study = db::load_study_set(conn, now)?;
    let items = item_list(catalogue, &study);
    let due = study.due(&items, now);
    if due.is_empty() {
        println!("All caught up! No reviews due.");
        return Ok(());
    }
    println!("{} due:", due.len());
    for item in due {
        println!("  {item}  {}", format_interval(study.state(item)));
    }
    Ok(())
}

fn next(
    conn: &Connection,
    catalogue: Option<&Catalogue>,
    batch_size: usize,
    now: Timestamp,
) -> Result<()> {
    let study = db::load_study_set(conn, now)?;
    let items = item_list(catalogue, &study);
    let picks = study.review_candidates(&items, now, batch_size);
    if picks.is_empty() {
        println!("No reviews due right now");
        return Ok(());
    }
    for item in picks {
        let last = study
            .state(item)
            .filter(|state| !state.is_new())
            .map_or_else(|| "never".to_string(), |state| format_timestamp(state.last_reviewed_at));
        println!("  {item}  last reviewed: {last}");
    }
    Ok(())
}

/// Interactive session over the due items. Every grading and undo is written
/// to the database straight away, so quitting midway loses nothing.
fn review(
    conn: &Connection,
    catalogue: Option<&Catalogue>,
    input: impl BufRead,
    now: Timestamp,
) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    let items = item_list(catalogue, &study);
    let mut session = ReviewSession::from_due(&study, &items, now);
    if session.is_completed() {
        println!("All caught up! No reviews due.");
        return Ok(());
    }

    println!("{}", session.phase_message());
    let mut round = session.round_number();
    let mut lines = input.lines();

    while let Some(item) = session.current_item().map(str::to_string) {
        print!(
            "[{}/{}] {item}  again/hard/good/easy, u = undo, q = quit: ",
            session.reviewed_count(),
            session.total_count()
        );
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        match line?.trim() {
            "" => continue,
            "q" => break,
            "u" => match session.undo(&mut study) {
                Some(undone) => {
                    match study.state(&undone) {
                        Some(state) => db::save_state(conn, &undone, state)?,
                        None => {
                            db::remove_item(conn, &undone)?;
                        }
                    }
                    println!("Undid {undone}");
                }
                None => println!("Nothing to undo"),
            },
            answer => {
                let quality = match answer.parse::<Quality>() {
                    Ok(quality) => quality,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let was_known = study.is_known(&item);
                if let Some(state) = session.grade_current(&mut study, quality, now_millis()) {
                    if !was_known {
                        db::mark_known(conn, &item, &state)?;
                    }
                    db::save_state(conn, &item, &state)?;
                    println!("  next review in {}", format_interval(Some(&state)));
                }
            }
        }

        if session.round_number() != round && !session.is_completed() {
            round = session.round_number();
            println!("{}", session.phase_message());
        }
    }

    if session.is_completed() {
        println!("Session complete!");
    } else {
        println!("{} left for later", session.remaining_count());
    }
    Ok(())
}

fn preview(conn: &Connection, item: &str, now: Timestamp) -> Result<()> {
    let study = db::load_study_set(conn, now)?;
    println!("{item}  current: {}", format_interval(study.state(item)));
    for (quality, state) in study.preview(item, now) {
        println!("  {:>5}: {}", quality.label(), format_interval(Some(&state)));
    }
    Ok(())
}

fn sync_import(conn: &Connection, catalogue: &Catalogue, code: &str, now: Timestamp) -> Result<()> {
    let mut study = db::load_study_set(conn, now)?;
    let added = study.merge_known(decode_sync_code(catalogue, code)?, now);
    for item in &added {
        if let Some(state) = study.state(item) {
            db::mark_known(conn, item, state)?;
        }
    }
    println!("Synced: {} new, {} total", added.len(), study.known_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_srs::models::KanjiEntry;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::create_schema(&conn).unwrap();
        conn
    }

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
    fn test_toggle_persists_both_ways() {
        let conn = open();
        let now = now_millis();

        toggle(&conn, "木", now).unwrap();
        assert_eq!(db::known_items(&conn).unwrap(), vec!["木"]);
        assert_eq!(db::load_last_marked(&conn).unwrap().as_deref(), Some("木"));

        toggle(&conn, "木", now).unwrap();
        assert!(db::known_items(&conn).unwrap().is_empty());
        assert!(db::load_last_marked(&conn).unwrap().is_none());
    }

    #[test]
    fn test_undo_between_invocations() {
        let conn = open();
        let now = now_millis();
        mark(&conn, "木", now).unwrap();
        mark(&conn, "林", now).unwrap();

        undo(&conn, now).unwrap();
        assert_eq!(db::known_items(&conn).unwrap(), vec!["木"]);

        // only the latest mark is undoable
        undo(&conn, now).unwrap();
        assert_eq!(db::known_items(&conn).unwrap(), vec!["木"]);
    }

    #[test]
    fn test_review_saves_each_grading() {
        let conn = open();
        let now = now_millis();
        mark(&conn, "木", now).unwrap();
        mark(&conn, "林", now).unwrap();

        review(&conn, None, "good\n1\nq\n".as_bytes(), now).unwrap();

        let first = db::load_state(&conn, "木").unwrap().unwrap();
        assert_eq!(first.repetitions, 1);
        assert_eq!(first.interval, 1);
        let second = db::load_state(&conn, "林").unwrap().unwrap();
        assert_eq!(second.repetitions, 0);
        assert!(!second.is_new());
    }

    #[test]
    fn test_review_undo_is_written_back() {
        let conn = open();
        let now = now_millis();
        mark(&conn, "木", now).unwrap();
        mark(&conn, "林", now).unwrap();

        review(&conn, None, "easy\nu\nq\n".as_bytes(), now).unwrap();

        assert!(db::load_state(&conn, "木").unwrap().unwrap().is_new());
    }

    #[test]
    fn test_review_over_catalogue_skips_unknown_kanji() {
        let conn = open();
        let now = now_millis();
        let catalogue = catalogue(&["日", "一", "人"]);
        mark(&conn, "人", now).unwrap();

        review(&conn, Some(&catalogue), "good\n".as_bytes(), now).unwrap();

        assert_eq!(db::known_items(&conn).unwrap(), vec!["人"]);
        assert_eq!(db::load_state(&conn, "人").unwrap().unwrap().repetitions, 1);
    }

    #[test]
    fn test_sync_import_merges() {
        let conn = open();
        let now = now_millis();
        let catalogue = catalogue(&["日", "一", "人"]);
        let reviewed = kanji_srs::review(&kanji_srs::create_entry(now), Quality::Easy, now);
        db::mark_known(&conn, "一", &reviewed).unwrap();

        let mut study = StudySet::new();
        study.mark_known("日", now);
        study.mark_known("一", now);
        let code = encode_sync_code(&catalogue, &study);

        sync_import(&conn, &catalogue, &code, now).unwrap();
        assert_eq!(db::known_items(&conn).unwrap(), vec!["一", "日"]);
        assert_eq!(db::load_state(&conn, "一").unwrap().unwrap().repetitions, 1);
    }

    #[test]
    fn test_sync_commands_need_catalogue() {
        assert!(matches!(require_catalogue(None), Err(SrsError::Config(_))));
    }
}
