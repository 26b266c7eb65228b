//! Loader for the CMA dump: one large JSON array
//!
//! The array is streamed element by element on a blocking thread. Parsed
//! batches cross a bounded channel to the async writer, so memory stays flat
//! however large the dump is.

use super::schema::*;
use super::{pick_image, ADAPTER_ID};
use crate::adapters::{de, require_source};
use crate::error::{Error, Result};
use crate::etl::{Fingerprint, LoadStats};
use crate::progress::LoadProgress;
use crate::store::{insert_terms, StoreBuilder};
use serde::de::{DeserializeSeed, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sqlx::sqlite::SqliteConnection;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Parsed batches buffered between the reader thread and the writer
const CHANNEL_DEPTH: usize = 4;

#[derive(Debug, Deserialize)]
pub(crate) struct ClevelandRecord {
    pub id: i64,
    pub accession_number: Option<String>,
    pub share_license_status: Option<String>,
    pub title: Option<String>,
    pub creation_date: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub creation_date_earliest: Option<i32>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub creation_date_latest: Option<i32>,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub technique: Option<String>,
    pub department: Option<String>,
    pub collection: Option<String>,
    pub measurements: Option<String>,
    pub description: Option<String>,
    pub tombstone: Option<String>,
    pub credit_line: Option<String>,
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub culture: Vec<String>,
    #[serde(default)]
    pub creators: Option<Vec<Creator>>,
    #[serde(default)]
    pub provenance: Option<Vec<ProvenanceEntry>>,
    #[serde(default)]
    pub exhibitions: Option<Exhibitions>,
    #[serde(default)]
    pub images: Option<Value>,
    #[serde(default)]
    pub alternate_images: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Creator {
    pub description: Option<String>,
    pub role: Option<String>,
    pub nationality: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub birth_year: Option<i32>,
    #[serde(default, deserialize_with = "de::lenient_year")]
    pub death_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProvenanceEntry {
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Exhibitions {
    #[serde(default)]
    pub current: Vec<Exhibition>,
    #[serde(default)]
    pub legacy: Vec<Exhibition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Exhibition {
    pub title: Option<String>,
}

impl ClevelandRecord {
    fn creators_display(&self) -> Option<String> {
        let joined = self
            .creators
            .iter()
            .flatten()
            .filter_map(|c| c.description.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        (!joined.is_empty()).then_some(joined)
    }

    fn provenance_terms(&self) -> Vec<String> {
        self.provenance
            .iter()
            .flatten()
            .filter_map(|p| {
                let description = p.description.as_deref()?.trim();
                Some(match p.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                    Some(date) => format!("{} ({})", description, date),
                    None => description.to_string(),
                })
            })
            .collect()
    }

    fn exhibition_terms(&self) -> Vec<String> {
        self.exhibitions
            .iter()
            .flat_map(|e| e.current.iter().chain(e.legacy.iter()))
            .filter_map(|e| e.title.clone())
            .collect()
    }

    fn alternate_image_urls(&self) -> Vec<String> {
        self.alternate_images
            .iter()
            .flatten()
            .filter_map(|images| pick_image(images).map(|picked| picked.primary))
            .collect()
    }
}

/// One array element after typed parsing
enum Parsed {
    Record(Box<ClevelandRecord>),
    Malformed(String),
}

/// Collects parsed elements and ships full batches to the writer
struct BatchSink {
    tx: mpsc::Sender<Vec<Parsed>>,
    batch: Vec<Parsed>,
    batch_size: usize,
}

impl BatchSink {
    fn push(&mut self, value: Value) -> std::result::Result<(), String> {
        let parsed = match serde_json::from_value::<ClevelandRecord>(value) {
            Ok(record) => Parsed::Record(Box::new(record)),
            Err(e) => Parsed::Malformed(e.to_string()),
        };
        self.batch.push(parsed);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::result::Result<(), String> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.batch);
        self.tx
            .blocking_send(batch)
            .map_err(|_| "writer stopped before the dump was fully read".to_string())
    }
}

/// Walks a top-level array, or the `data` array of a wrapping object
struct ArrayStream<'a> {
    sink: &'a mut BatchSink,
}

impl<'de> DeserializeSeed<'de> for ArrayStream<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ArrayStream<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of artworks or an object with a `data` array")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(value) = seq.next_element::<Value>()? {
            self.sink.push(value).map_err(A::Error::custom)?;
        }
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let sink = self.sink;
        let mut found = false;
        while let Some(key) = map.next_key::<String>()? {
            if key == "data" && !found {
                map.next_value_seed(ArrayStream { sink: &mut *sink })?;
                found = true;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        if found {
            Ok(())
        } else {
            Err(A::Error::custom("object has no `data` array"))
        }
    }
}

/// Reader half: runs on a blocking thread
fn stream_records(path: PathBuf, batch_size: usize, tx: mpsc::Sender<Vec<Parsed>>) -> Result<()> {
    let reader = BufReader::new(File::open(&path)?);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut sink = BatchSink {
        tx,
        batch: Vec::with_capacity(batch_size),
        batch_size,
    };

    ArrayStream { sink: &mut sink }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    sink.flush().map_err(Error::Other)
}

/// Rebuild the CMA store from the JSON array at `source`
pub async fn load_data_into_sqlite(
    source: &Path,
    db_path: &Path,
    batch_size: usize,
) -> Result<LoadStats> {
    let started = Instant::now();
    let source = require_source(source)?;
    if !source.is_file() {
        return Err(Error::SourceMissing(format!(
            "{} is not a JSON file",
            source.display()
        )));
    }

    info!(adapter = ADAPTER_ID, source = %source.display(), "Loading CMA artworks");

    let builder = StoreBuilder::create(db_path, SCHEMA_SQL).await?;
    let progress = LoadProgress::new(ADAPTER_ID, None);
    let mut stats = LoadStats::new(ADAPTER_ID);

    let batch_size = batch_size.max(1);
    let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);
    let reader_path = source.clone();
    let reader = tokio::task::spawn_blocking(move || stream_records(reader_path, batch_size, tx));

    while let Some(batch) = rx.recv().await {
        let mut tx = builder.pool().begin().await?;
        let size = batch.len() as u64;

        for parsed in batch {
            match parsed {
                Parsed::Record(record) => match insert_record(&mut tx, &record).await? {
                    Some(children) => {
                        stats.inserted += 1;
                        stats.child_rows += children;
                    }
                    None => {
                        debug!(id = record.id, "Skipping duplicate CMA id");
                        stats.skipped += 1;
                    }
                },
                Parsed::Malformed(reason) => {
                    debug!(%reason, "Skipping malformed CMA record");
                    stats.skipped += 1;
                }
            }
        }

        tx.commit().await?;
        stats.batches += 1;
        progress.advance(size, stats.skipped);
    }

    reader.await??;

    let mut fingerprint = Fingerprint::new();
    fingerprint.add_file(&source)?;

    builder.finish().await?;
    let stats = stats.complete(db_path, started, fingerprint);
    progress.finish(&stats.summary());
    Ok(stats)
}

async fn insert_record(
    conn: &mut SqliteConnection,
    record: &ClevelandRecord,
) -> Result<Option<u64>> {
    let images_json = record
        .images
        .as_ref()
        .filter(|images| !images.is_null())
        .map(Value::to_string);
    let has_image = record.images.as_ref().and_then(pick_image).is_some();

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO artworks (
            id, accession_number, title, creation_date, date_start, date_end,
            type, technique, department, collection, measurements, description,
            tombstone, credit_line, url, share_license_status, creators_display,
            images_json, has_image
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(&record.accession_number)
    .bind(&record.title)
    .bind(&record.creation_date)
    .bind(record.creation_date_earliest)
    .bind(record.creation_date_latest)
    .bind(&record.object_type)
    .bind(&record.technique)
    .bind(&record.department)
    .bind(&record.collection)
    .bind(&record.measurements)
    .bind(&record.description)
    .bind(&record.tombstone)
    .bind(&record.credit_line)
    .bind(&record.url)
    .bind(&record.share_license_status)
    .bind(record.creators_display())
    .bind(images_json)
    .bind(has_image)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let mut children = 0;
    for (position, creator) in record.creators.iter().flatten().enumerate() {
        let parsed = creator
            .description
            .as_deref()
            .map(crate::normalize::parse_creator_description)
            .unwrap_or_default();
        sqlx::query(
            r#"
            INSERT INTO artwork_creators
                (artwork_id, position, name, role, nationality, birth_year, death_year)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(position as i64)
        .bind(&parsed.name)
        .bind(&creator.role)
        .bind(creator.nationality.clone().or(parsed.nationality))
        .bind(creator.birth_year.or(parsed.birth_year))
        .bind(creator.death_year.or(parsed.death_year))
        .execute(&mut *conn)
        .await?;
        children += 1;
    }

    for (table, terms) in [
        (CULTURE_TABLE, record.culture.clone()),
        (PROVENANCE_TABLE, record.provenance_terms()),
        (EXHIBITION_TABLE, record.exhibition_terms()),
        (ALT_IMAGE_TABLE, record.alternate_image_urls()),
    ] {
        children += insert_terms(conn, table, "artwork_id", record.id, &terms).await?;
    }

    Ok(Some(children))
}
