//! Per-adapter SQLite stores
//!
//! Serving opens a store read-only once and shares the pool. Loading builds
//! a fresh file beside the live one and renames it into place when done.

mod filter;

pub use filter::*;

use crate::error::{Error, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Open an existing store for concurrent readers
pub async fn open_read_only(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.is_file() {
        return Err(Error::StoreUnavailable(format!(
            "{} does not exist; run `musefed load` first",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    debug!("Opening read-only SQLite store at {:?}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| Error::StoreUnavailable(format!("{}: {}", db_path.display(), e)))?;

    Ok(pool)
}

/// A store being rebuilt from scratch
pub struct StoreBuilder {
    pool: SqlitePool,
    build_path: PathBuf,
    final_path: PathBuf,
}

impl StoreBuilder {
    /// Create an empty database next to `final_path` and apply `schema_sql`
    pub async fn create(final_path: &Path, schema_sql: &str) -> Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let build_path = sibling(final_path, ".building");
        remove_database_files(&build_path)?;

        let options = SqliteConnectOptions::new()
            .filename(&build_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Off);

        debug!("Building SQLite store at {:?}", build_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(schema_sql).execute(&pool).await?;

        Ok(Self {
            pool,
            build_path,
            final_path: final_path.to_path_buf(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the writer and atomically replace the live store
    pub async fn finish(self) -> Result<PathBuf> {
        sqlx::query("ANALYZE").execute(&self.pool).await?;
        self.pool.close().await;

        remove_database_files(&self.final_path)?;
        std::fs::rename(&self.build_path, &self.final_path)?;
        info!("Store ready at {:?}", self.final_path);
        Ok(self.final_path)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Drop a database file and any journal files left next to it
fn remove_database_files(db_path: &Path) -> Result<()> {
    for path in [
        db_path.to_path_buf(),
        sibling(db_path, "-wal"),
        sibling(db_path, "-shm"),
        sibling(db_path, "-journal"),
    ] {
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Group `(parent, child)` rows by parent, keeping row order inside each group
pub fn group_by_parent<K, V, I>(rows: I) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut groups: HashMap<K, Vec<V>> = HashMap::new();
    for (parent, child) in rows {
        groups.entry(parent).or_default().push(child);
    }
    groups
}

/// Term rows for a page of parents, grouped by parent in `position` order.
/// `table` must have `(<parent_col>, position, term)` columns.
pub async fn fetch_terms(
    pool: &SqlitePool,
    table: &str,
    parent_col: &str,
    ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT {parent}, term FROM {table} WHERE {parent} IN ({}) ORDER BY {parent}, position",
        placeholders(ids.len()),
        parent = parent_col,
        table = table,
    );
    let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    Ok(group_by_parent(query.fetch_all(pool).await?))
}

/// Insert a parent's terms in source order, skipping blanks. Returns rows written.
pub async fn insert_terms(
    conn: &mut SqliteConnection,
    table: &str,
    parent_col: &str,
    parent_id: i64,
    terms: &[String],
) -> Result<u64> {
    let sql = format!(
        "INSERT INTO {} ({}, position, term) VALUES (?, ?, ?)",
        table, parent_col
    );
    let mut written = 0;
    for term in terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        sqlx::query(&sql)
            .bind(parent_id)
            .bind(written as i64)
            .bind(term)
            .execute(&mut *conn)
            .await?;
        written += 1;
    }
    Ok(written)
}

/// Row count of one table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artworks (id INTEGER PRIMARY KEY, title TEXT);
CREATE TABLE IF NOT EXISTS artwork_terms (artwork_id INTEGER NOT NULL, term TEXT NOT NULL);
"#;

    #[tokio::test]
    async fn test_missing_store_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = open_read_only(&tmp.path().join("nope.sqlite"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_build_then_read_only() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("store.sqlite");

        let builder = StoreBuilder::create(&db_path, TEST_SCHEMA).await.unwrap();
        sqlx::query("INSERT INTO artworks (id, title) VALUES (1, 'Nighthawks')")
            .execute(builder.pool())
            .await
            .unwrap();
        assert!(!db_path.exists());
        builder.finish().await.unwrap();

        let pool = open_read_only(&db_path).await.unwrap();
        assert_eq!(count_rows(&pool, "artworks").await.unwrap(), 1);
        assert!(sqlx::query("INSERT INTO artworks (id) VALUES (2)")
            .execute(&pool)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_store() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("store.sqlite");

        for title in ["first", "second"] {
            let builder = StoreBuilder::create(&db_path, TEST_SCHEMA).await.unwrap();
            sqlx::query("INSERT INTO artworks (id, title) VALUES (1, ?)")
                .bind(title)
                .execute(builder.pool())
                .await
                .unwrap();
            builder.finish().await.unwrap();
        }

        let pool = open_read_only(&db_path).await.unwrap();
        let (title,): (String,) = sqlx::query_as("SELECT title FROM artworks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "second");
    }

    #[tokio::test]
    async fn test_terms_round_trip_in_position_order() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("store.sqlite");
        let schema = "CREATE TABLE styles (artwork_id INTEGER NOT NULL, position INTEGER NOT NULL, term TEXT NOT NULL);";

        let builder = StoreBuilder::create(&db_path, schema).await.unwrap();
        let mut tx = builder.pool().begin().await.unwrap();
        let terms = vec!["Baroque".to_string(), "  ".to_string(), "Dutch".to_string()];
        let written = insert_terms(&mut tx, "styles", "artwork_id", 7, &terms)
            .await
            .unwrap();
        insert_terms(&mut tx, "styles", "artwork_id", 3, &["Rococo".to_string()])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        builder.finish().await.unwrap();
        assert_eq!(written, 2);

        let pool = open_read_only(&db_path).await.unwrap();
        let grouped = fetch_terms(&pool, "styles", "artwork_id", &[3, 7, 9])
            .await
            .unwrap();
        assert_eq!(grouped[&7], vec!["Baroque", "Dutch"]);
        assert_eq!(grouped[&3], vec!["Rococo"]);
        assert!(!grouped.contains_key(&9));
        assert!(fetch_terms(&pool, "styles", "artwork_id", &[])
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_group_by_parent_keeps_order() {
        let rows = vec![(2, "b1"), (1, "a1"), (2, "b2"), (1, "a2")];
        let groups = group_by_parent(rows);
        assert_eq!(groups[&1], vec!["a1", "a2"]);
        assert_eq!(groups[&2], vec!["b1", "b2"]);
    }
}
