//! Per-institution adapters
//!
//! Every adapter owns its own SQLite store with a schema shaped after its
//! source dump, and folds rows back into [`ArtworkResult`]s.

pub mod aic;
pub mod cleveland;
pub mod nga;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::etl::LoadStats;
use crate::models::{ArtworkResult, SearchOptions};
use crate::store::{like_pattern, FilterBuilder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// The institutions this crate knows how to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Aic,
    Cleveland,
    Nga,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 3] = [AdapterKind::Aic, AdapterKind::Cleveland, AdapterKind::Nga];

    /// Prefix used in global ids and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            AdapterKind::Aic => aic::ADAPTER_ID,
            AdapterKind::Cleveland => cleveland::ADAPTER_ID,
            AdapterKind::Nga => nga::ADAPTER_ID,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AdapterKind::Aic => "Art Institute of Chicago",
            AdapterKind::Cleveland => "Cleveland Museum of Art",
            AdapterKind::Nga => "National Gallery of Art",
        }
    }

    /// Upper-case key used in `MUSEFED_<KEY>_DB` style overrides
    pub fn env_key(&self) -> &'static str {
        match self {
            AdapterKind::Aic => "AIC",
            AdapterKind::Cleveland => "CLEVELAND",
            AdapterKind::Nga => "NGA",
        }
    }

    /// Dump location relative to `<data_dir>/<id>/`
    pub fn default_source_layout(&self) -> &'static str {
        match self {
            AdapterKind::Aic => "json/artworks",
            AdapterKind::Cleveland => "data.json",
            AdapterKind::Nga => "opendata",
        }
    }

    /// Rebuild this institution's store from its raw dump
    pub async fn load(&self, source: &Path, db_path: &Path, batch_size: usize) -> Result<LoadStats> {
        match self {
            AdapterKind::Aic => aic::load_data_into_sqlite(source, db_path, batch_size).await,
            AdapterKind::Cleveland => {
                cleveland::load_data_into_sqlite(source, db_path, batch_size).await
            }
            AdapterKind::Nga => nga::load_data_into_sqlite(source, db_path, batch_size).await,
        }
    }

    /// Open this institution's built store for serving
    pub async fn open(&self, db_path: &Path) -> Result<Arc<dyn MuseumAdapter>> {
        let adapter: Arc<dyn MuseumAdapter> = match self {
            AdapterKind::Aic => Arc::new(aic::AicAdapter::open(db_path).await?),
            AdapterKind::Cleveland => Arc::new(cleveland::ClevelandAdapter::open(db_path).await?),
            AdapterKind::Nga => Arc::new(nga::NgaAdapter::open(db_path).await?),
        };
        Ok(adapter)
    }

    /// Open using the store path resolved from configuration
    pub async fn open_configured(&self, config: &Config) -> Result<Arc<dyn MuseumAdapter>> {
        self.open(&config.db_path(*self)).await
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for AdapterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "aic" | "artic" | "chicago" => Ok(AdapterKind::Aic),
            "cleveland" | "cma" => Ok(AdapterKind::Cleveland),
            "nga" => Ok(AdapterKind::Nga),
            _ => Err(Error::UnknownAdapter(s.to_string())),
        }
    }
}

/// Row counts reported by `status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub artworks: i64,
    pub with_image: i64,
    pub public_domain: i64,
    pub child_rows: i64,
}

/// The capability set every institution implements
#[async_trait]
pub trait MuseumAdapter: Send + Sync {
    /// Stable prefix used in global ids
    fn id(&self) -> &str;

    /// Human-readable institution name
    fn name(&self) -> &str;

    /// Where the backing store lives, for diagnostics
    fn data_source(&self) -> String;

    /// Filtered, paginated search ordered by native id
    async fn search(&self, options: &SearchOptions) -> Result<Vec<ArtworkResult>>;

    /// One artwork by native id; `None` when malformed, absent, or imageless
    async fn get_by_id(&self, local_id: &str) -> Result<Option<ArtworkResult>>;

    /// `(global id, primary image url)` pairs for link checking
    async fn image_urls(&self, limit: Option<usize>) -> Result<Vec<(String, String)>>;

    async fn stats(&self) -> Result<StoreStats>;
}

/// Where a genre filter value is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreRoute<'a> {
    /// The value names an object type; match the type column against this term
    ObjectType(&'a str),
    /// Anything else, matched against style or genre terms
    Style,
}

/// Route a genre value using an adapter's object-type vocabulary
pub fn route_genre<'a>(value: &str, object_types: &[&'a str]) -> GenreRoute<'a> {
    let value = value.trim().to_lowercase();
    let singular = value.strip_suffix('s').unwrap_or(&value);
    object_types
        .iter()
        .find(|t| t.eq_ignore_ascii_case(&value) || t.eq_ignore_ascii_case(singular))
        .map(|t| GenreRoute::ObjectType(*t))
        .unwrap_or(GenreRoute::Style)
}

/// Parse a native numeric id, rejecting anything else
pub(crate) fn parse_numeric_id(local_id: &str) -> Option<i64> {
    let trimmed = local_id.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Resolve a source path, failing fast when the dump is missing
pub(crate) fn require_source(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::SourceMissing(path.display().to_string()))
    }
}

/// Inclusive overlap of the work's `(start, end)` years with the requested
/// range. A missing end year counts as open-ended; works with no start year
/// never match a date filter.
pub(crate) fn push_date_overlap(
    filter: &mut FilterBuilder,
    start_col: &str,
    end_col: &str,
    options: &SearchOptions,
) {
    if options.date_start.is_none() && options.date_end.is_none() {
        return;
    }
    filter.push_raw(format!("{} IS NOT NULL", start_col));
    if let Some(end) = options.date_end {
        filter.push(format!("{} <= ?", start_col), [end]);
    }
    if let Some(start) = options.date_start {
        filter.push(format!("({end} IS NULL OR {end} >= ?)", end = end_col), [start]);
    }
}

/// OR together one single-placeholder clause per non-blank value. The
/// closure returns the clause and the text it binds as a literal substring.
pub(crate) fn push_any_of<F>(filter: &mut FilterBuilder, values: &[String], clause_for: F)
where
    F: Fn(&str) -> (String, String),
{
    let values: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return;
    }

    let (clauses, needles): (Vec<String>, Vec<String>) =
        values.iter().map(|v| clause_for(v)).unzip();
    filter.push(
        format!("({})", clauses.join(" OR ")),
        needles.iter().map(|n| like_pattern(n)),
    );
}

/// Lenient field readers for institution JSON
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept null, a single string, or an array with stray nulls/numbers
    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => vec![s],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Like `string_list`, but stray entries stay as `None` so indexes line
    /// up with a parallel list
    pub fn aligned_string_list<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => vec![Some(s)],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Accept an integer, a float, or a numeric string
    pub fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Accept true/false, 0/1, or "true"/"false"
    pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::models::{ArtworkResult, SearchOptions};

    /// Options with images not required, the usual starting point in store tests
    pub fn any_image() -> SearchOptions {
        SearchOptions {
            has_image_only: Some(false),
            ..Default::default()
        }
    }

    pub fn local_ids(results: &[ArtworkResult]) -> Vec<&str> {
        results.iter().map(|r| r.local_id.as_str()).collect()
    }
}
