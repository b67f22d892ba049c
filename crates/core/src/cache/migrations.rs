//! Schema migrations, tracked with SQLite's `user_version` pragma.
//!
//! Each migration runs in its own transaction together with the version
//! bump, so a failed migration leaves the schema at the previous version.

use tokio_rusqlite::Connection;

use super::Error;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version.
const MIGRATIONS: &[Migration] =
    &[Migration { version: 1, name: "generations", sql: include_str!("../../migrations/001_generations.sql") }];

/// Schema version after every migration has been applied.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Apply every migration newer than the database's `user_version`.
///
/// Returns the resulting schema version.
pub async fn run(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        let start: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        let mut current = start;

        for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.name, migration.version)))?;
            tx.pragma_update(None, "user_version", migration.version)?;
            tx.commit()?;

            tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
            current = migration.version;
        }

        Ok(current)
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_database_reaches_latest() {
        let conn = Connection::open_in_memory().await.unwrap();
        assert_eq!(run(&conn).await.unwrap(), latest_version());

        let tables: Vec<String> = conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["entries".to_string(), "generations".to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        assert_eq!(run(&conn).await.unwrap(), latest_version());

        let version: i64 = conn
            .call(|conn| conn.pragma_query_value(None, "user_version", |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(version, latest_version());
    }
}
