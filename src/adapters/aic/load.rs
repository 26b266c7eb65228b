//! Loader for the AIC dump: a directory of one JSON file per artwork

use super::schema::*;
use super::ADAPTER_ID;
use crate::adapters::{de, require_source};
use crate::error::{Error, Result};
use crate::etl::{files_with_extension, Fingerprint, LoadStats};
use crate::progress::LoadProgress;
use crate::store::{insert_terms, StoreBuilder};
use serde::Deserialize;
use sqlx::sqlite::SqliteConnection;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub(crate) struct AicRecord {
    pub id: i64,
    pub title: Option<String>,
    pub main_reference_number: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub artist_display: Option<String>,
    pub artist_title: Option<String>,
    #[serde(default)]
    pub artist_ids: Option<Vec<Option<i64>>>,
    #[serde(default, deserialize_with = "de::aligned_string_list")]
    pub artist_titles: Vec<Option<String>>,
    pub date_display: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub date_start: Option<i32>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub date_end: Option<i32>,
    pub medium_display: Option<String>,
    pub dimensions: Option<String>,
    pub place_of_origin: Option<String>,
    pub department_title: Option<String>,
    pub artwork_type_title: Option<String>,
    pub credit_line: Option<String>,
    pub provenance_text: Option<String>,
    pub exhibition_history: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub is_public_domain: bool,
    pub image_id: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub alt_image_ids: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub classification_titles: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub style_titles: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub subject_titles: Vec<String>,
}

/// Parse one file. API exports wrap the record as `{"data": {...}}`.
pub(crate) fn parse_record(bytes: &[u8]) -> std::result::Result<AicRecord, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
    if let Some(inner) = value
        .get_mut("data")
        .filter(|d| d.is_object())
        .map(serde_json::Value::take)
    {
        value = inner;
    }
    serde_json::from_value(value)
}

/// Rebuild the AIC store from `source`, a directory of JSON files or one file
pub async fn load_data_into_sqlite(
    source: &Path,
    db_path: &Path,
    batch_size: usize,
) -> Result<LoadStats> {
    let started = Instant::now();
    let source = require_source(source)?;
    let files = if source.is_dir() {
        files_with_extension(&source, "json")
    } else {
        vec![source.clone()]
    };
    if files.is_empty() {
        return Err(Error::SourceMissing(format!(
            "no JSON records under {}",
            source.display()
        )));
    }

    info!(adapter = ADAPTER_ID, files = files.len(), "Loading AIC artworks");

    let builder = StoreBuilder::create(db_path, SCHEMA_SQL).await?;
    let progress = LoadProgress::new(ADAPTER_ID, Some(files.len() as u64));
    let mut stats = LoadStats::new(ADAPTER_ID);
    let mut fingerprint = Fingerprint::new();

    for batch in files.chunks(batch_size.max(1)) {
        let mut tx = builder.pool().begin().await?;

        for path in batch {
            let name = path
                .strip_prefix(&source)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();

            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(file = %name, error = %e, "Skipping unreadable AIC record");
                    stats.skipped += 1;
                    continue;
                }
            };
            fingerprint.add(&name, &bytes);

            let record = match parse_record(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    debug!(file = %name, error = %e, "Skipping malformed AIC record");
                    stats.skipped += 1;
                    continue;
                }
            };

            match insert_record(&mut tx, &record).await? {
                Some(children) => {
                    stats.inserted += 1;
                    stats.child_rows += children;
                }
                None => {
                    debug!(file = %name, id = record.id, "Skipping duplicate AIC id");
                    stats.skipped += 1;
                }
            }
        }

        tx.commit().await?;
        stats.batches += 1;
        progress.advance(batch.len() as u64, stats.skipped);
    }

    builder.finish().await?;
    let stats = stats.complete(db_path, started, fingerprint);
    progress.finish(&stats.summary());
    Ok(stats)
}

/// Insert the root row and its children. `None` when the id was already loaded.
async fn insert_record(conn: &mut SqliteConnection, record: &AicRecord) -> Result<Option<u64>> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO artworks (
            id, title, main_reference_number, description, short_description,
            artist_display, artist_title, date_display, date_start, date_end,
            medium_display, dimensions, place_of_origin, department_title,
            artwork_type_title, credit_line, provenance_text, exhibition_history,
            is_public_domain, image_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(&record.title)
    .bind(&record.main_reference_number)
    .bind(&record.description)
    .bind(&record.short_description)
    .bind(&record.artist_display)
    .bind(&record.artist_title)
    .bind(&record.date_display)
    .bind(record.date_start)
    .bind(record.date_end)
    .bind(&record.medium_display)
    .bind(&record.dimensions)
    .bind(&record.place_of_origin)
    .bind(&record.department_title)
    .bind(&record.artwork_type_title)
    .bind(&record.credit_line)
    .bind(&record.provenance_text)
    .bind(&record.exhibition_history)
    .bind(record.is_public_domain)
    .bind(record.image_id.as_deref().map(str::trim).filter(|id| !id.is_empty()))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let mut children = 0;
    let mut position: i64 = 0;
    // `artist_ids` is parallel to the raw title list, blanks included
    for (index, name) in record.artist_titles.iter().enumerate() {
        let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let artist_id = record
            .artist_ids
            .as_ref()
            .and_then(|ids| ids.get(index).copied().flatten());
        sqlx::query(
            "INSERT INTO artwork_artists (artwork_id, position, artist_id, name) VALUES (?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(position)
        .bind(artist_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
        position += 1;
        children += 1;
    }

    for (table, terms) in [
        (CLASSIFICATION_TABLE, &record.classification_titles),
        (STYLE_TABLE, &record.style_titles),
        (SUBJECT_TABLE, &record.subject_titles),
        (ALT_IMAGE_TABLE, &record.alt_image_ids),
    ] {
        children += insert_terms(conn, table, "artwork_id", record.id, terms).await?;
    }

    Ok(Some(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_read_only;
    use tempfile::TempDir;

    #[test]
    fn test_parse_plain_and_wrapped_records() {
        let plain = br#"{"id": 27992, "title": "A Sunday on La Grande Jatte", "style_titles": null}"#;
        let record = parse_record(plain).unwrap();
        assert_eq!(record.id, 27992);
        assert!(record.style_titles.is_empty());

        let wrapped = br#"{"data": {"id": 28560, "title": "The Bedroom", "is_public_domain": true}}"#;
        let record = parse_record(wrapped).unwrap();
        assert_eq!(record.id, 28560);
        assert!(record.is_public_domain);
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        assert!(parse_record(br#"{"title": "No id"}"#).is_err());
        assert!(parse_record(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_artist_ids_stay_aligned_with_names() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("artworks");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(
            source.join("1.json"),
            br#"{"id": 1, "artist_titles": ["  ", "Second"], "artist_ids": [11, 22]}"#,
        )
        .unwrap();
        std::fs::write(
            source.join("2.json"),
            br#"{"id": 2, "artist_titles": ["First", null, "", "Fourth"], "artist_ids": [1, 2, null, 4]}"#,
        )
        .unwrap();
        std::fs::write(
            source.join("3.json"),
            br#"{"id": 3, "artist_titles": ["Only", "No id"], "artist_ids": [7]}"#,
        )
        .unwrap();
        let db_path = tmp.path().join("aic.sqlite");

        let stats = load_data_into_sqlite(&source, &db_path, 10).await.unwrap();
        assert_eq!(stats.inserted, 3);

        let pool = open_read_only(&db_path).await.unwrap();
        let rows: Vec<(i64, i64, String, Option<i64>)> = sqlx::query_as(
            "SELECT artwork_id, position, name, artist_id FROM artwork_artists ORDER BY artwork_id, position",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(
            rows,
            vec![
                (1, 0, "Second".to_string(), Some(22)),
                (2, 0, "First".to_string(), Some(1)),
                (2, 1, "Fourth".to_string(), Some(4)),
                (3, 0, "Only".to_string(), Some(7)),
                (3, 1, "No id".to_string(), None),
            ]
        );
    }
}
