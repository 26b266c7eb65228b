//! Cleveland Museum of Art adapter
//!
//! The dump is one large JSON array. Each record's `images` object carries
//! `web`, `full` and `print` variants, kept verbatim and resolved on read.

mod load;
mod schema;

pub use load::load_data_into_sqlite;

use super::{
    parse_numeric_id, push_any_of, push_date_overlap, route_genre, GenreRoute, MuseumAdapter,
    StoreStats,
};
use crate::error::Result;
use crate::models::{Artist, ArtworkResult, GlobalId, SearchOptions};
use crate::normalize::{clean_text, dedupe_trimmed, parse_mediums};
use crate::store::{
    bind_all_as, count_rows, fetch_terms, group_by_parent, like, open_read_only, placeholders,
    FilterBuilder,
};
use async_trait::async_trait;
use schema::*;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ADAPTER_ID: &str = "cleveland";

const ARTWORK_PAGE_BASE: &str = "https://clevelandart.org/art";

/// Preference order when choosing the primary image
const IMAGE_VARIANTS: [&str; 3] = ["web", "full", "print"];

const OBJECT_TYPES: &[&str] = &[
    "painting",
    "sculpture",
    "print",
    "photograph",
    "drawing",
    "textile",
    "ceramic",
    "glass",
    "furniture",
    "jewelry",
    "metalwork",
    "manuscript",
    "miniature",
    "mask",
    "coin",
];

const SELECT_ARTWORKS: &str = r#"
SELECT a.id, a.accession_number, a.title, a.creation_date, a.date_start, a.date_end,
       a.type, a.technique, a.department, a.collection, a.measurements, a.description,
       a.tombstone, a.credit_line, a.url, a.share_license_status, a.creators_display,
       a.images_json
FROM artworks a"#;

/// Primary and thumbnail URLs resolved from an `images` object
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PickedImage {
    pub primary: String,
    pub thumbnail: Option<String>,
}

fn variant_url<'a>(images: &'a Value, variant: &str) -> Option<&'a str> {
    images
        .get(variant)?
        .get("url")?
        .as_str()
        .map(str::trim)
        .filter(|u| !u.is_empty())
}

/// First usable variant in web, full, print order. The web rendition doubles
/// as the thumbnail whenever it exists.
pub(crate) fn pick_image(images: &Value) -> Option<PickedImage> {
    let primary = IMAGE_VARIANTS
        .iter()
        .find_map(|variant| variant_url(images, variant))?;
    Some(PickedImage {
        primary: primary.to_string(),
        thumbnail: variant_url(images, "web").map(str::to_string),
    })
}

#[derive(Debug, FromRow)]
struct ArtworkRow {
    id: i64,
    accession_number: Option<String>,
    title: Option<String>,
    creation_date: Option<String>,
    date_start: Option<i32>,
    date_end: Option<i32>,
    #[sqlx(rename = "type")]
    object_type: Option<String>,
    technique: Option<String>,
    department: Option<String>,
    collection: Option<String>,
    measurements: Option<String>,
    description: Option<String>,
    tombstone: Option<String>,
    credit_line: Option<String>,
    url: Option<String>,
    share_license_status: Option<String>,
    creators_display: Option<String>,
    images_json: Option<String>,
}

type CreatorRow = (i64, String, Option<String>, Option<String>, Option<i32>, Option<i32>);

#[derive(Default)]
struct Children {
    creators: HashMap<i64, Vec<Artist>>,
    cultures: HashMap<i64, Vec<String>>,
    provenance: HashMap<i64, Vec<String>>,
    exhibitions: HashMap<i64, Vec<String>>,
    alt_images: HashMap<i64, Vec<String>>,
}

pub struct ClevelandAdapter {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl ClevelandAdapter {
    pub async fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            pool: open_read_only(db_path).await?,
            db_path: db_path.to_path_buf(),
        })
    }

    fn build_filter(options: &SearchOptions) -> FilterBuilder {
        let mut filter = FilterBuilder::new();

        if let Some(query) = options.query_text() {
            filter.push_like_any(&["a.title", "a.description", "a.creators_display"], query);
        }
        filter.push_all_words("a.creators_display", &options.artist_words());

        push_any_of(&mut filter, &options.genres, |value| {
            match route_genre(value, OBJECT_TYPES) {
                GenreRoute::ObjectType(term) => (like("a.type"), term.to_string()),
                GenreRoute::Style => (like("a.collection"), value.to_string()),
            }
        });

        push_any_of(&mut filter, &options.classifications, |value| {
            (
                like("(COALESCE(a.type, '') || ' ' || COALESCE(a.department, ''))"),
                value.to_string(),
            )
        });

        if let Some(medium) = options.first_medium() {
            filter.push_like_any(&["a.technique"], medium);
        }

        push_date_overlap(&mut filter, "a.date_start", "a.date_end", options);

        if options.public_domain_only {
            filter.push_raw("a.share_license_status = 'CC0'");
        }
        if options.has_image_only() {
            filter.push_raw("a.has_image = 1");
        }

        filter
    }

    async fn fetch_rows(
        &self,
        filter: &FilterBuilder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArtworkRow>> {
        let sql = format!(
            "{}{} ORDER BY a.id ASC LIMIT ? OFFSET ?",
            SELECT_ARTWORKS,
            filter.where_sql()
        );
        let rows = bind_all_as(sqlx::query_as::<_, ArtworkRow>(&sql), filter.params())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_children(&self, ids: &[i64]) -> Result<Children> {
        if ids.is_empty() {
            return Ok(Children::default());
        }

        let sql = format!(
            r#"SELECT artwork_id, name, role, nationality, birth_year, death_year
               FROM {} WHERE artwork_id IN ({}) ORDER BY artwork_id, position"#,
            CREATOR_TABLE,
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, CreatorRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let creators = group_by_parent(query.fetch_all(&self.pool).await?.into_iter().map(
            |(artwork_id, name, role, nationality, birth_year, death_year)| {
                (
                    artwork_id,
                    Artist {
                        name,
                        role,
                        nationality,
                        birth_year,
                        death_year,
                    },
                )
            },
        ));

        Ok(Children {
            creators,
            cultures: fetch_terms(&self.pool, CULTURE_TABLE, "artwork_id", ids).await?,
            provenance: fetch_terms(&self.pool, PROVENANCE_TABLE, "artwork_id", ids).await?,
            exhibitions: fetch_terms(&self.pool, EXHIBITION_TABLE, "artwork_id", ids).await?,
            alt_images: fetch_terms(&self.pool, ALT_IMAGE_TABLE, "artwork_id", ids).await?,
        })
    }

    async fn fold_page(&self, rows: Vec<ArtworkRow>) -> Result<Vec<ArtworkResult>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut children = self.fetch_children(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| fold(row, &mut children))
            .collect())
    }
}

fn parse_images(images_json: Option<&str>) -> Option<PickedImage> {
    let images: Value = serde_json::from_str(images_json?).ok()?;
    pick_image(&images)
}

fn fold(row: ArtworkRow, children: &mut Children) -> ArtworkResult {
    let id = row.id;
    let mut result = ArtworkResult::new(ADAPTER_ID, id.to_string(), row.title.as_deref());

    let creators = children.creators.remove(&id).unwrap_or_default();
    result.artists = if creators.is_empty() {
        vec![Artist::default()]
    } else {
        creators
    };

    if let Some(picked) = parse_images(row.images_json.as_deref()) {
        result.image_url = picked.primary;
        result.thumbnail_url = picked.thumbnail;
    }
    result.additional_images = children.alt_images.remove(&id).unwrap_or_default();

    result.description = clean_text(row.description.as_deref())
        .or_else(|| clean_text(row.tombstone.as_deref()));
    result.mediums = row
        .technique
        .as_deref()
        .map(parse_mediums)
        .unwrap_or_default();
    result.medium_display = clean_text(row.technique.as_deref());
    result.genres = dedupe_trimmed(row.collection.clone());
    result.classifications = dedupe_trimmed(row.object_type.clone());

    let cultures = dedupe_trimmed(children.cultures.remove(&id).unwrap_or_default());
    result.culture = cultures.first().cloned();
    result.tags = cultures;

    result.date_display = clean_text(row.creation_date.as_deref());
    result.date_start = row.date_start;
    result.date_end = row.date_end;
    result.dimensions = clean_text(row.measurements.as_deref());
    result.department = clean_text(row.department.as_deref());
    result.credit_line = clean_text(row.credit_line.as_deref());

    let provenance = children.provenance.remove(&id).unwrap_or_default();
    result.provenance = clean_text(Some(&provenance.join("; ")));

    result.is_public_domain = row.share_license_status.as_deref() == Some("CC0");
    result.source_url = clean_text(row.url.as_deref()).unwrap_or_else(|| {
        format!(
            "{}/{}",
            ARTWORK_PAGE_BASE,
            row.accession_number.as_deref().unwrap_or_default()
        )
    });
    result.raw_metadata = json!({
        "accession_number": row.accession_number,
        "share_license_status": row.share_license_status,
        "type": row.object_type,
        "creators_display": row.creators_display,
        "exhibitions": children.exhibitions.remove(&id).unwrap_or_default(),
    });

    result
}

#[async_trait]
impl MuseumAdapter for ClevelandAdapter {
    fn id(&self) -> &str {
        ADAPTER_ID
    }

    fn name(&self) -> &str {
        "Cleveland Museum of Art"
    }

    fn data_source(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<ArtworkResult>> {
        let Some(offset) = options.offset() else {
            debug!(adapter = ADAPTER_ID, page = options.page(), "Page beyond any store, returning none");
            return Ok(Vec::new());
        };
        let filter = Self::build_filter(options);
        let rows = self
            .fetch_rows(&filter, i64::from(options.limit()), offset)
            .await?;
        debug!(adapter = ADAPTER_ID, rows = rows.len(), "Search page fetched");
        self.fold_page(rows).await
    }

    async fn get_by_id(&self, local_id: &str) -> Result<Option<ArtworkResult>> {
        let Some(id) = parse_numeric_id(local_id) else {
            return Ok(None);
        };

        let mut filter = FilterBuilder::new();
        filter.push("a.id = ?", [id]).push_raw("a.has_image = 1");
        let rows = self.fetch_rows(&filter, 1, 0).await?;
        Ok(self.fold_page(rows).await?.into_iter().next())
    }

    async fn image_urls(&self, limit: Option<usize>) -> Result<Vec<(String, String)>> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows: Vec<(i64, Option<String>)> = sqlx::query_as(
            "SELECT a.id, a.images_json FROM artworks a WHERE a.has_image = 1 ORDER BY a.id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, images_json)| {
                let picked = parse_images(images_json.as_deref())?;
                Some((GlobalId::format(ADAPTER_ID, &id.to_string()), picked.primary))
            })
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (with_image, public_domain): (i64, i64) = sqlx::query_as(
            r#"SELECT COALESCE(SUM(a.has_image), 0),
                      COALESCE(SUM(a.share_license_status = 'CC0'), 0)
               FROM artworks a"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let mut child_rows = 0;
        for table in [
            CREATOR_TABLE,
            CULTURE_TABLE,
            PROVENANCE_TABLE,
            EXHIBITION_TABLE,
            ALT_IMAGE_TABLE,
        ] {
            child_rows += count_rows(&self.pool, table).await?;
        }

        Ok(StoreStats {
            artworks: count_rows(&self.pool, "artworks").await?,
            with_image,
            public_domain,
            child_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testutil::{any_image, local_ids};
    use tempfile::TempDir;

    fn fixture() -> Value {
        json!([
            {
                "id": 135382,
                "accession_number": "1958.39",
                "share_license_status": "CC0",
                "title": "Water Lilies (Agapanthus)",
                "creation_date": "c. 1915–26",
                "creation_date_earliest": 1915,
                "creation_date_latest": 1926,
                "type": "Painting",
                "technique": "oil on canvas",
                "department": "Modern European Painting and Sculpture",
                "collection": "Mod Euro - Painting",
                "measurements": "Framed: 221 x 457 cm",
                "tombstone": "Water Lilies (Agapanthus), c. 1915–26. Claude Monet.",
                "url": "https://clevelandart.org/art/1958.39",
                "culture": ["France, 20th century"],
                "creators": [
                    {
                        "description": "Claude Monet (French, 1840–1926)",
                        "role": "artist",
                        "nationality": "French",
                        "birth_year": "1840",
                        "death_year": "1926"
                    }
                ],
                "provenance": [{"description": "Durand-Ruel, Paris", "date": "1926"}],
                "exhibitions": {"current": [{"title": "Monet in Normandy"}], "legacy": []},
                "images": {
                    "web": {"url": "https://openaccess-cdn.clevelandart.org/1958.39/1958.39_web.jpg"},
                    "print": {"url": "https://openaccess-cdn.clevelandart.org/1958.39/1958.39_print.jpg"},
                    "full": {"url": "https://openaccess-cdn.clevelandart.org/1958.39/1958.39_full.tif"}
                },
                "alternate_images": [
                    {"web": {"url": "https://openaccess-cdn.clevelandart.org/1958.39/alt_web.jpg"}}
                ]
            },
            {
                "id": 94979,
                "accession_number": "1916.1045",
                "share_license_status": "Copyrighted",
                "title": "Striding Figure",
                "creation_date_earliest": "1900",
                "type": "Sculpture",
                "technique": "bronze",
                "department": "Modern European Painting and Sculpture",
                "creators": [{"description": "Auguste Rodin (French, 1840–1917)"}],
                "images": {"print": {"url": "https://example.org/rodin_print.jpg"}}
            },
            {
                "id": 150000,
                "title": "Imageless sketch",
                "type": "Drawing",
                "technique": "graphite",
                "images": null
            },
            {"title": "missing id"},
            {
                "id": 135382,
                "title": "duplicate of the first"
            }
        ])
    }

    async fn loaded_adapter(tmp: &TempDir) -> ClevelandAdapter {
        let source = tmp.path().join("data.json");
        std::fs::write(&source, serde_json::to_vec(&fixture()).unwrap()).unwrap();
        let db_path = tmp.path().join("cleveland.sqlite");

        let stats = load_data_into_sqlite(&source, &db_path, 2).await.unwrap();
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.batches, 3);

        ClevelandAdapter::open(&db_path).await.unwrap()
    }

    #[test]
    fn test_pick_image_prefers_web_then_full_then_print() {
        let all = json!({
            "web": {"url": "w"}, "full": {"url": "f"}, "print": {"url": "p"}
        });
        assert_eq!(pick_image(&all).unwrap().primary, "w");
        assert_eq!(pick_image(&all).unwrap().thumbnail.as_deref(), Some("w"));

        let no_web = json!({"full": {"url": "f"}, "print": {"url": "p"}});
        let picked = pick_image(&no_web).unwrap();
        assert_eq!(picked.primary, "f");
        assert!(picked.thumbnail.is_none());

        assert_eq!(pick_image(&json!({"print": {"url": "p"}})).unwrap().primary, "p");
        assert!(pick_image(&json!({"web": {"url": "  "}})).is_none());
        assert!(pick_image(&Value::Null).is_none());
    }

    #[tokio::test]
    async fn test_fold_resolves_images_and_creators() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let lilies = adapter.get_by_id("135382").await.unwrap().unwrap();
        assert_eq!(lilies.global_id, "cleveland:135382");
        assert!(lilies.image_url.ends_with("1958.39_web.jpg"));
        assert_eq!(lilies.thumbnail_url, Some(lilies.image_url.clone()));
        assert_eq!(lilies.additional_images.len(), 1);
        assert_eq!(lilies.artists[0].name, "Claude Monet");
        assert_eq!(lilies.artists[0].role.as_deref(), Some("artist"));
        assert_eq!(lilies.artists[0].birth_year, Some(1840));
        assert_eq!(lilies.mediums, vec!["Oil", "Canvas"]);
        assert_eq!(lilies.classifications, vec!["Painting"]);
        assert_eq!(lilies.culture.as_deref(), Some("France, 20th century"));
        assert_eq!(lilies.provenance.as_deref(), Some("Durand-Ruel, Paris (1926)"));
        assert_eq!(lilies.source_url, "https://clevelandart.org/art/1958.39");
        assert!(lilies.is_public_domain);
        assert_eq!(lilies.raw_metadata["exhibitions"][0], "Monet in Normandy");

        let rodin = adapter.get_by_id("94979").await.unwrap().unwrap();
        assert_eq!(rodin.image_url, "https://example.org/rodin_print.jpg");
        assert!(rodin.thumbnail_url.is_none());
        assert_eq!(rodin.artists[0].nationality.as_deref(), Some("French"));
        assert_eq!(rodin.artists[0].death_year, Some(1917));
        assert!(!rodin.is_public_domain);
        assert_eq!(rodin.source_url, "https://clevelandart.org/art/1916.1045");
    }

    #[tokio::test]
    async fn test_imageless_works_hidden_by_default() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let results = adapter.search(&SearchOptions::default()).await.unwrap();
        assert_eq!(local_ids(&results), vec!["94979", "135382"]);

        let everything = adapter.search(&any_image()).await.unwrap();
        assert_eq!(local_ids(&everything), vec!["94979", "135382", "150000"]);
        assert_eq!(everything[2].artists[0].name, "Unknown");
        assert!(adapter.get_by_id("150000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let adapter = &adapter;
        let search = move |options: SearchOptions| async move {
            adapter.search(&options).await.unwrap()
        };

        let sculptures = search(SearchOptions {
            genres: vec!["Sculptures".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&sculptures), vec!["94979"]);

        let by_collection = search(SearchOptions {
            genres: vec!["mod euro".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&by_collection), vec!["135382"]);

        let by_department = search(SearchOptions {
            classifications: vec!["european painting".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&by_department), vec!["94979", "135382"]);

        let public = search(SearchOptions {
            public_domain_only: true,
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&public), vec!["135382"]);

        let bronze = search(SearchOptions {
            mediums: vec!["Bronze".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&bronze), vec!["94979"]);

        let monet = search(SearchOptions {
            artist: Some("monet claude".to_string()),
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&monet), vec!["135382"]);

        // Rodin has a start year and no end year
        let dated = search(SearchOptions {
            date_start: Some(1930),
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&dated), vec!["94979"]);
    }

    #[tokio::test]
    async fn test_stats_and_image_urls() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let stats = adapter.stats().await.unwrap();
        assert_eq!(stats.artworks, 3);
        assert_eq!(stats.with_image, 2);
        assert_eq!(stats.public_domain, 1);
        assert!(stats.child_rows >= 5);

        let urls = adapter.image_urls(None).await.unwrap();
        assert_eq!(
            urls,
            vec![
                (
                    "cleveland:94979".to_string(),
                    "https://example.org/rodin_print.jpg".to_string()
                ),
                (
                    "cleveland:135382".to_string(),
                    "https://openaccess-cdn.clevelandart.org/1958.39/1958.39_web.jpg".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_data_wrapper_and_missing_source() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("wrapped.json");
        std::fs::write(
            &source,
            serde_json::to_vec(&json!({"info": {}, "data": fixture()})).unwrap(),
        )
        .unwrap();
        let stats = load_data_into_sqlite(&source, &tmp.path().join("w.sqlite"), 5000)
            .await
            .unwrap();
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.batches, 1);

        let err = load_data_into_sqlite(&tmp.path().join("nope.json"), &tmp.path().join("x.sqlite"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_truncated_dump_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("data.json");
        std::fs::write(&source, br#"[{"id": 1}, {"id": 2"#).unwrap();
        let db_path = tmp.path().join("cleveland.sqlite");

        assert!(load_data_into_sqlite(&source, &db_path, 10).await.is_err());
        assert!(!db_path.exists());
    }
}
