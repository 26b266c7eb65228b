//! Loader for the NGA open-data dump: a directory of relational CSV files
//!
//! `objects.csv` is loaded first so child files can be checked against the
//! set of known object ids. Each file is read on a blocking thread and handed
//! to the writer in batches.

use super::schema::*;
use super::ADAPTER_ID;
use crate::adapters::require_source;
use crate::error::{Error, Result};
use crate::etl::{Fingerprint, LoadStats};
use crate::progress::LoadProgress;
use crate::store::StoreBuilder;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) const OBJECTS_FILE: &str = "objects.csv";
pub(crate) const IMAGES_FILE: &str = "published_images.csv";
pub(crate) const CONSTITUENTS_FILE: &str = "constituents.csv";
pub(crate) const LINKS_FILE: &str = "objects_constituents.csv";
pub(crate) const TERMS_FILE: &str = "objects_terms.csv";

const CHANNEL_DEPTH: usize = 4;

/// A parsed CSV row with its line number, or the reason it was rejected
type CsvBatch<T> = Vec<(i64, std::result::Result<T, String>)>;

/// What happened to one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Inserted,
    Duplicate,
    /// Child row pointing at an object that was never loaded
    Orphan,
    /// Row with nothing usable in its key text column
    Blank,
}

/// One CSV file mapped onto one table
#[async_trait]
trait CsvTable: DeserializeOwned + Send + Sync + 'static {
    const FILE: &'static str;
    /// Rows count as artworks rather than child rows
    const PARENT: bool = false;

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        line: i64,
        known: &HashSet<i64>,
    ) -> Result<Outcome>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectRow {
    pub objectid: i64,
    pub accessionnum: Option<String>,
    pub title: Option<String>,
    pub displaydate: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub beginyear: Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub endyear: Option<i32>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub inscription: Option<String>,
    pub attributioninverted: Option<String>,
    pub attribution: Option<String>,
    pub provenancetext: Option<String>,
    pub creditline: Option<String>,
    pub classification: Option<String>,
    pub subclassification: Option<String>,
    pub departmentabbr: Option<String>,
    pub wikidataid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageRow {
    pub uuid: String,
    pub depictstmsobjectid: i64,
    pub iiifurl: String,
    pub iiifthumburl: Option<String>,
    pub viewtype: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub sequence: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub width: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub height: Option<i64>,
    pub assistivetext: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConstituentRow {
    pub constituentid: i64,
    pub preferreddisplayname: Option<String>,
    pub forwarddisplayname: Option<String>,
    pub displaydate: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub beginyear: Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub endyear: Option<i32>,
    pub nationality: Option<String>,
    pub constituenttype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkRow {
    pub objectid: i64,
    pub constituentid: i64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub displayorder: Option<i64>,
    pub roletype: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TermRow {
    pub objectid: i64,
    pub termtype: String,
    pub term: String,
}

fn outcome(rows_affected: u64) -> Outcome {
    if rows_affected == 0 {
        Outcome::Duplicate
    } else {
        Outcome::Inserted
    }
}

#[async_trait]
impl CsvTable for ObjectRow {
    const FILE: &'static str = OBJECTS_FILE;
    const PARENT: bool = true;

    async fn insert(&self, conn: &mut SqliteConnection, _: i64, _: &HashSet<i64>) -> Result<Outcome> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO artworks (
                objectid, accessionnum, title, displaydate, beginyear, endyear, medium,
                dimensions, inscription, attributioninverted, attribution, provenancetext,
                creditline, classification, subclassification, departmentabbr, wikidataid
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.objectid)
        .bind(&self.accessionnum)
        .bind(&self.title)
        .bind(&self.displaydate)
        .bind(self.beginyear)
        .bind(self.endyear)
        .bind(&self.medium)
        .bind(&self.dimensions)
        .bind(&self.inscription)
        .bind(&self.attributioninverted)
        .bind(&self.attribution)
        .bind(&self.provenancetext)
        .bind(&self.creditline)
        .bind(&self.classification)
        .bind(&self.subclassification)
        .bind(&self.departmentabbr)
        .bind(&self.wikidataid)
        .execute(&mut *conn)
        .await?;
        Ok(outcome(result.rows_affected()))
    }
}

#[async_trait]
impl CsvTable for ImageRow {
    const FILE: &'static str = IMAGES_FILE;

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        _: i64,
        known: &HashSet<i64>,
    ) -> Result<Outcome> {
        if !known.contains(&self.depictstmsobjectid) {
            return Ok(Outcome::Orphan);
        }
        let iiifurl = self.iiifurl.trim().trim_end_matches('/');
        if iiifurl.is_empty() {
            return Ok(Outcome::Blank);
        }
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO published_images (
                uuid, depictstmsobjectid, iiifurl, iiifthumburl, viewtype, sequence,
                width, height, assistivetext
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.uuid)
        .bind(self.depictstmsobjectid)
        .bind(iiifurl)
        .bind(&self.iiifthumburl)
        .bind(&self.viewtype)
        .bind(self.sequence.unwrap_or(0))
        .bind(self.width)
        .bind(self.height)
        .bind(&self.assistivetext)
        .execute(&mut *conn)
        .await?;
        Ok(outcome(result.rows_affected()))
    }
}

#[async_trait]
impl CsvTable for ConstituentRow {
    const FILE: &'static str = CONSTITUENTS_FILE;

    async fn insert(&self, conn: &mut SqliteConnection, _: i64, _: &HashSet<i64>) -> Result<Outcome> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO constituents (
                constituentid, preferreddisplayname, forwarddisplayname, displaydate,
                beginyear, endyear, nationality, constituenttype
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.constituentid)
        .bind(&self.preferreddisplayname)
        .bind(&self.forwarddisplayname)
        .bind(&self.displaydate)
        .bind(self.beginyear)
        .bind(self.endyear)
        .bind(&self.nationality)
        .bind(&self.constituenttype)
        .execute(&mut *conn)
        .await?;
        Ok(outcome(result.rows_affected()))
    }
}

#[async_trait]
impl CsvTable for LinkRow {
    const FILE: &'static str = LINKS_FILE;

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        _: i64,
        known: &HashSet<i64>,
    ) -> Result<Outcome> {
        if !known.contains(&self.objectid) {
            return Ok(Outcome::Orphan);
        }
        sqlx::query(
            r#"
            INSERT INTO objects_constituents (objectid, constituentid, displayorder, roletype, role)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.objectid)
        .bind(self.constituentid)
        .bind(self.displayorder.unwrap_or(0))
        .bind(self.roletype.as_deref().map(str::to_lowercase))
        .bind(&self.role)
        .execute(&mut *conn)
        .await?;
        Ok(Outcome::Inserted)
    }
}

#[async_trait]
impl CsvTable for TermRow {
    const FILE: &'static str = TERMS_FILE;

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        line: i64,
        known: &HashSet<i64>,
    ) -> Result<Outcome> {
        if !known.contains(&self.objectid) {
            return Ok(Outcome::Orphan);
        }
        let term = self.term.trim();
        if term.is_empty() {
            return Ok(Outcome::Blank);
        }
        // The source line keeps terms in dump order within each object
        sqlx::query(
            "INSERT INTO objects_terms (objectid, position, termtype, term) VALUES (?, ?, ?, ?)",
        )
        .bind(self.objectid)
        .bind(line)
        .bind(self.termtype.trim())
        .bind(term)
        .execute(&mut *conn)
        .await?;
        Ok(Outcome::Inserted)
    }
}

/// Reader half: parses one CSV file on a blocking thread
fn read_csv<T: DeserializeOwned>(
    path: &Path,
    batch_size: usize,
    tx: mpsc::Sender<CsvBatch<T>>,
) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut batch: CsvBatch<T> = Vec::with_capacity(batch_size);

    loop {
        let parsed = match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => record
                .deserialize::<T>(Some(&headers))
                .map_err(|e| e.to_string()),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(e.to_string()),
        };
        let line = record.position().map(|p| p.line() as i64).unwrap_or_default();
        batch.push((line, parsed));

        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            if tx.blocking_send(full).is_err() {
                return Err(Error::Other("CSV writer stopped early".to_string()));
            }
        }
    }

    if !batch.is_empty() && tx.blocking_send(batch).is_err() {
        return Err(Error::Other("CSV writer stopped early".to_string()));
    }
    Ok(())
}

/// Stream one CSV file into its table, batch by batch
async fn load_table<T: CsvTable>(
    pool: &SqlitePool,
    path: PathBuf,
    batch_size: usize,
    known: &HashSet<i64>,
    progress: &LoadProgress,
    stats: &mut LoadStats,
) -> Result<()> {
    progress.phase(T::FILE);
    let (tx, mut rx) = mpsc::channel::<CsvBatch<T>>(CHANNEL_DEPTH);
    let reader = tokio::task::spawn_blocking(move || read_csv::<T>(&path, batch_size, tx));

    while let Some(batch) = rx.recv().await {
        let mut tx = pool.begin().await?;
        let size = batch.len() as u64;

        for (line, parsed) in batch {
            let row = match parsed {
                Ok(row) => row,
                Err(reason) => {
                    debug!(file = T::FILE, line, %reason, "Skipping malformed NGA row");
                    stats.skipped += 1;
                    continue;
                }
            };
            match row.insert(&mut tx, line, known).await? {
                Outcome::Inserted if T::PARENT => stats.inserted += 1,
                Outcome::Inserted => stats.child_rows += 1,
                skipped => {
                    debug!(file = T::FILE, line, ?skipped, "Skipping NGA row");
                    stats.skipped += 1;
                }
            }
        }

        tx.commit().await?;
        stats.batches += 1;
        progress.advance(size, stats.skipped);
    }

    reader.await?
}

async fn known_objects(pool: &SqlitePool) -> Result<HashSet<i64>> {
    let ids: Vec<(i64,)> = sqlx::query_as("SELECT objectid FROM artworks")
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

fn required_file(source: &Path, name: &str) -> Result<PathBuf> {
    let path = source.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::SourceMissing(path.display().to_string()))
    }
}

fn optional_file(source: &Path, name: &str) -> Option<PathBuf> {
    let path = source.join(name);
    if path.is_file() {
        Some(path)
    } else {
        warn!(adapter = ADAPTER_ID, file = name, "Optional NGA file missing, skipping");
        None
    }
}

/// Rebuild the NGA store from the CSV directory at `source`
pub async fn load_data_into_sqlite(
    source: &Path,
    db_path: &Path,
    batch_size: usize,
) -> Result<LoadStats> {
    let started = Instant::now();
    let source = require_source(source)?;
    if !source.is_dir() {
        return Err(Error::SourceMissing(format!(
            "{} is not a directory of CSV files",
            source.display()
        )));
    }

    let objects = required_file(&source, OBJECTS_FILE)?;
    let images = required_file(&source, IMAGES_FILE)?;
    let constituents = optional_file(&source, CONSTITUENTS_FILE);
    let links = optional_file(&source, LINKS_FILE);
    let terms = optional_file(&source, TERMS_FILE);

    info!(adapter = ADAPTER_ID, source = %source.display(), "Loading NGA objects");

    let mut fingerprint = Fingerprint::new();
    for path in [Some(&objects), Some(&images), constituents.as_ref(), links.as_ref(), terms.as_ref()]
        .into_iter()
        .flatten()
    {
        fingerprint.add_file(path)?;
    }

    let builder = StoreBuilder::create(db_path, SCHEMA_SQL).await?;
    let pool = builder.pool();
    let progress = LoadProgress::new(ADAPTER_ID, None);
    let mut stats = LoadStats::new(ADAPTER_ID);
    let batch_size = batch_size.max(1);

    let none = HashSet::new();
    load_table::<ObjectRow>(pool, objects, batch_size, &none, &progress, &mut stats).await?;

    let known = known_objects(pool).await?;
    debug!(objects = known.len(), "NGA objects loaded, attaching child files");

    load_table::<ImageRow>(pool, images, batch_size, &known, &progress, &mut stats).await?;
    if let Some(path) = constituents {
        load_table::<ConstituentRow>(pool, path, batch_size, &known, &progress, &mut stats).await?;
    }
    if let Some(path) = links {
        load_table::<LinkRow>(pool, path, batch_size, &known, &progress, &mut stats).await?;
    }
    if let Some(path) = terms {
        load_table::<TermRow>(pool, path, batch_size, &known, &progress, &mut stats).await?;
    }

    builder.finish().await?;
    let stats = stats.complete(db_path, started, fingerprint);
    progress.finish(&stats.summary());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all<T: DeserializeOwned>(csv_text: &str) -> (CsvBatch<T>, Result<()>) {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), csv_text).unwrap();
        let (tx, mut rx) = mpsc::channel(64);
        let outcome = read_csv::<T>(tmp.path(), 2, tx);
        let mut rows = Vec::new();
        while let Ok(batch) = rx.try_recv() {
            rows.extend(batch);
        }
        (rows, outcome)
    }

    #[test]
    fn test_objects_tolerate_bad_years_and_reject_bad_ids() {
        let (rows, outcome) = read_all::<ObjectRow>(
            "objectid,title,beginyear,endyear,attribution\n\
             1,Ginevra de' Benci,1474,c. 1478,Leonardo da Vinci\n\
             x,Broken,1500,1501,Nobody\n\
             3,\"Quoted, title\",,,\n",
        );
        outcome.unwrap();
        assert_eq!(rows.len(), 3);

        let first = rows[0].1.as_ref().unwrap();
        assert_eq!(first.beginyear, Some(1474));
        assert_eq!(first.endyear, None);
        assert!(rows[1].1.is_err());

        let third = rows[2].1.as_ref().unwrap();
        assert_eq!(third.title.as_deref(), Some("Quoted, title"));
        assert!(third.attribution.is_none());
        assert_eq!(rows[2].0, 4);
    }

    #[test]
    fn test_short_rows_are_malformed() {
        let (rows, outcome) = read_all::<TermRow>(
            "termid,objectid,termtype,term\n1,10,Style,Renaissance\n2,11\n",
        );
        outcome.unwrap();
        assert!(rows[0].1.is_ok());
        assert!(rows[1].1.is_err());
    }
}
