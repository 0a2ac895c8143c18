use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use config::Config;
use rusqlite::Connection;

const DEFAULT_DB_PATH: &str = "data/oed.sqlite";

/// Database path comes from the environment (OED_DB_PATH) with a local
/// default, so the load step can point at any store without code changes.
fn resolve_db_path() -> Result<String> {
    let settings = Config::builder()
        .set_default("db_path", DEFAULT_DB_PATH)?
        .add_source(config::Environment::with_prefix("OED"))
        .build()
        .context("Failed to load database settings")?;
    Ok(settings.get_string("db_path")?)
}

pub fn connect() -> Result<Connection> {
    let path = resolve_db_path()?;
    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open database {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS oxford_words (
            text            TEXT NOT NULL,
            snippet         TEXT,
            parts_of_speech TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_oxford_words_text ON oxford_words(text);
        ",
    )?;
    Ok(())
}

/// Bulk-import a converted CSV into oxford_words. The whole file goes in as
/// one transaction, so a failed import leaves the table untouched.
pub fn load_csv(conn: &Connection, csv_path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO oxford_words (text, snippet, parts_of_speech) VALUES (?1, ?2, ?3)",
        )?;
        for record in reader.records() {
            let record = record?;
            if record.len() != 3 {
                continue;
            }
            stmt.execute(rusqlite::params![&record[0], &record[1], &record[2]])?;
            count += 1;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Tests ──
