//! Normalized artwork model shared by every adapter

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when the source record has none
pub const UNTITLED: &str = "Untitled";

/// Artist name used when the source record has none
pub const UNKNOWN_ARTIST: &str = "Unknown";

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 25;

/// A creator attached to an artwork
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
}

impl Artist {
    /// Build an artist, substituting the unknown sentinel for a blank name
    pub fn named(name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_ARTIST);
        Self {
            name: name.to_string(),
            role: None,
            nationality: None,
            birth_year: None,
            death_year: None,
        }
    }
}

impl Default for Artist {
    fn default() -> Self {
        Self::named(None)
    }
}

/// One artwork in the shape every adapter returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkResult {
    pub global_id: String,
    pub local_id: String,
    pub adapter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub artists: Vec<Artist>,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub additional_images: Vec<String>,
    pub mediums: Vec<String>,
    pub medium_display: Option<String>,
    pub genres: Vec<String>,
    pub classifications: Vec<String>,
    pub tags: Vec<String>,
    pub date_display: Option<String>,
    pub date_start: Option<i32>,
    pub date_end: Option<i32>,
    pub dimensions: Option<String>,
    pub department: Option<String>,
    pub culture: Option<String>,
    pub credit_line: Option<String>,
    pub provenance: Option<String>,
    pub is_public_domain: bool,
    pub source_url: String,
    /// Institution-specific fields kept for debugging
    pub raw_metadata: serde_json::Value,
}

impl ArtworkResult {
    /// Empty result with identity filled in and the title sentinel applied
    pub fn new(adapter_id: &str, local_id: impl Into<String>, title: Option<&str>) -> Self {
        let local_id = local_id.into();
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
            .to_string();

        Self {
            global_id: GlobalId::format(adapter_id, &local_id),
            local_id,
            adapter_id: adapter_id.to_string(),
            title,
            description: None,
            artists: Vec::new(),
            image_url: String::new(),
            thumbnail_url: None,
            additional_images: Vec::new(),
            mediums: Vec::new(),
            medium_display: None,
            genres: Vec::new(),
            classifications: Vec::new(),
            tags: Vec::new(),
            date_display: None,
            date_start: None,
            date_end: None,
            dimensions: None,
            department: None,
            culture: None,
            credit_line: None,
            provenance: None,
            is_public_domain: false,
            source_url: String::new(),
            raw_metadata: serde_json::Value::Null,
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }
}

/// `<adapter id>:<local id>`, split on the first colon only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    pub adapter_id: String,
    pub local_id: String,
}

impl GlobalId {
    pub fn format(adapter_id: &str, local_id: &str) -> String {
        format!("{}:{}", adapter_id, local_id)
    }

    /// Returns `None` for a missing colon or an empty half
    pub fn parse(raw: &str) -> Option<Self> {
        let (adapter_id, local_id) = raw.split_once(':')?;
        if adapter_id.is_empty() || local_id.is_empty() {
            return None;
        }
        Some(Self {
            adapter_id: adapter_id.to_string(),
            local_id: local_id.to_string(),
        })
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.adapter_id, self.local_id)
    }
}

/// The uniform query contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub artist: Option<String>,
    pub museums: Vec<String>,
    pub genres: Vec<String>,
    pub mediums: Vec<String>,
    pub classifications: Vec<String>,
    pub date_start: Option<i32>,
    pub date_end: Option<i32>,
    pub public_domain_only: bool,
    pub has_image_only: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchOptions {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Row offset of the requested page; `None` when it does not fit a SQLite integer
    pub fn offset(&self) -> Option<i64> {
        let offset = u64::from(self.page()) * u64::from(self.limit());
        i64::try_from(offset).ok()
    }

    pub fn has_image_only(&self) -> bool {
        self.has_image_only.unwrap_or(true)
    }

    /// Trimmed free-text query, if any
    pub fn query_text(&self) -> Option<&str> {
        non_blank(self.query.as_deref())
    }

    /// Whitespace-separated artist words; empty when no artist filter is set
    pub fn artist_words(&self) -> Vec<&str> {
        self.artist
            .as_deref()
            .map(|a| a.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// The single medium value honoured by adapters
    pub fn first_medium(&self) -> Option<&str> {
        self.mediums.iter().find_map(|m| non_blank(Some(m)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_id_splits_on_first_colon() {
        let id = GlobalId::parse("nga:urn:object:42").unwrap();
        assert_eq!(id.adapter_id, "nga");
        assert_eq!(id.local_id, "urn:object:42");
        assert_eq!(id.to_string(), "nga:urn:object:42");
    }

    #[test]
    fn test_global_id_rejects_malformed() {
        assert!(GlobalId::parse("aic").is_none());
        assert!(GlobalId::parse("aic:").is_none());
        assert!(GlobalId::parse(":27992").is_none());
        assert!(GlobalId::parse("").is_none());
    }

    #[test]
    fn test_new_result_applies_sentinels() {
        let result = ArtworkResult::new("aic", "27992", Some("   "));
        assert_eq!(result.title, UNTITLED);
        assert_eq!(result.global_id, "aic:27992");
        assert!(!result.has_image());

        assert_eq!(Artist::named(Some("")).name, UNKNOWN_ARTIST);
        assert_eq!(Artist::named(Some(" Mary Cassatt ")).name, "Mary Cassatt");
    }

    #[test]
    fn test_search_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.page(), 0);
        assert_eq!(options.limit(), 25);
        assert!(options.has_image_only());
        assert_eq!(options.offset(), Some(0));
        assert!(options.query_text().is_none());
        assert!(options.artist_words().is_empty());
    }

    #[test]
    fn test_search_options_from_json() {
        let options: SearchOptions = serde_json::from_str(
            r#"{"query":"  water lilies ","artist":"van  gogh","mediums":["", "oil"],"page":2,"limit":10,"hasImageOnly":false}"#,
        )
        .unwrap();

        assert_eq!(options.query_text(), Some("water lilies"));
        assert_eq!(options.artist_words(), vec!["van", "gogh"]);
        assert_eq!(options.first_medium(), Some("oil"));
        assert_eq!(options.offset(), Some(20));
        assert!(!options.has_image_only());
    }

    #[test]
    fn test_offset_out_of_range() {
        let options = SearchOptions {
            page: Some(u32::MAX),
            limit: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(options.offset(), None);

        let last = SearchOptions {
            page: Some(u32::MAX),
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(last.offset(), Some(i64::from(u32::MAX)));
    }
}
