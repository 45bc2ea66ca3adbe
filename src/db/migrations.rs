use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;

const LEDGER_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Apply every pending `migrations/*.sql` file in filename order. Each file
/// runs at most once, tracked in `schema_migrations`.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(LEDGER_TABLE, [])
        .context("failed to create schema_migrations table")?;

    let dir = Path::new("migrations");
    if !dir.is_dir() {
        tracing::warn!("no migrations directory, leaving schema as-is");
        return Ok(());
    }

    let mut pending: Vec<_> = fs::read_dir(dir)
        .context("failed to read migrations directory")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    pending.sort();

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT name FROM schema_migrations")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names.collect::<Result<_, _>>()?
    };

    for path in pending {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if applied.contains(&name) {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration {name}"))?;
        conn.execute_batch(&sql)
            .with_context(|| format!("migration {name} failed"))?;
        conn.execute("INSERT INTO schema_migrations (name) VALUES (?1)", [&name])?;

        tracing::info!("applied migration {name}");
    }

    Ok(())
}
