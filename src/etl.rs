//! Shared loader bookkeeping
//!
//! Adapters own their parsing and inserts. This module carries what every
//! load reports: counts, timing, and a fingerprint of the dump it read.

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use walkdir::WalkDir;

/// Outcome of one loader run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadStats {
    pub adapter_id: String,
    pub db_path: String,
    /// Root rows written
    pub inserted: u64,
    /// Source records that could not be read or had no usable id
    pub skipped: u64,
    /// Rows written to child tables
    pub child_rows: u64,
    pub batches: u64,
    pub elapsed_ms: u64,
    /// blake3 over every source file, in path order
    pub source_fingerprint: String,
    pub finished_at: String,
}

impl LoadStats {
    pub fn new(adapter_id: &str) -> Self {
        Self {
            adapter_id: adapter_id.to_string(),
            ..Default::default()
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Stamp timing and destination, then log the summary
    pub fn complete(mut self, db_path: &Path, started: Instant, fingerprint: Fingerprint) -> Self {
        self.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.db_path = db_path.display().to_string();
        self.source_fingerprint = fingerprint.finish();
        self.finished_at = Utc::now().to_rfc3339();

        info!(
            adapter = %self.adapter_id,
            inserted = self.inserted,
            skipped = self.skipped,
            child_rows = self.child_rows,
            elapsed_ms = self.elapsed_ms,
            "Load complete"
        );
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inserted, {} skipped in {:.1}s",
            self.inserted,
            self.skipped,
            self.elapsed().as_secs_f64()
        )
    }
}

/// Incremental content hash of a source dump
pub struct Fingerprint {
    hasher: blake3::Hasher,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    /// Mix in one named blob; the name keeps renamed files from colliding
    pub fn add(&mut self, name: &str, bytes: &[u8]) {
        self.hasher.update(name.as_bytes());
        self.hasher.update(&[0]);
        self.hasher.update(bytes);
    }

    /// Stream a whole file into the hash
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.hasher.update(name.as_bytes());
        self.hasher.update(&[0]);
        let mut file = File::open(path)?;
        std::io::copy(&mut file, &mut self.hasher)?;
        Ok(())
    }

    pub fn finish(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// Every file under `dir` with the given extension, sorted by path
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_files_with_extension_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("b.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("a.JSON"), "{}").unwrap();
        std::fs::write(tmp.path().join("nested").join("c.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let files = files_with_extension(tmp.path(), "json");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        assert!(!names.iter().any(|n| n.ends_with(".txt")));
    }

    #[test]
    fn test_fingerprint_is_content_sensitive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("objects.csv");

        std::fs::write(&path, "objectid\n1\n").unwrap();
        let mut first = Fingerprint::new();
        first.add_file(&path).unwrap();

        let mut again = Fingerprint::new();
        again.add_file(&path).unwrap();
        assert_eq!(first.finish(), again.finish());

        std::fs::write(&path, "objectid\n2\n").unwrap();
        let mut changed = Fingerprint::new();
        changed.add_file(&path).unwrap();
        assert_ne!(first.finish(), changed.finish());
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut stats = LoadStats::new("aic");
        stats.inserted = 10;
        stats.skipped = 2;
        stats.elapsed_ms = 1500;
        assert_eq!(stats.summary(), "10 inserted, 2 skipped in 1.5s");
    }
}
