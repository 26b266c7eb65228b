//! Art Institute of Chicago adapter
//!
//! The dump is one JSON file per artwork. Images are never stored as URLs:
//! the IIIF URL is templated from `image_id` at read time.

mod load;
mod schema;

pub use load::load_data_into_sqlite;

use super::{
    parse_numeric_id, push_any_of, push_date_overlap, route_genre, GenreRoute, MuseumAdapter,
    StoreStats,
};
use crate::error::Result;
use crate::models::{Artist, ArtworkResult, GlobalId, SearchOptions};
use crate::normalize::{apply_life_details, clean_text, dedupe_trimmed, parse_mediums};
use crate::store::{
    bind_all_as, count_rows, fetch_terms, group_by_parent, like, open_read_only, placeholders,
    FilterBuilder,
};
use async_trait::async_trait;
use schema::*;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ADAPTER_ID: &str = "aic";

const IIIF_BASE: &str = "https://www.artic.edu/iiif/2";
const ARTWORK_PAGE_BASE: &str = "https://www.artic.edu/artworks";

/// Artwork types that double as genre words
const OBJECT_TYPES: &[&str] = &[
    "painting",
    "sculpture",
    "print",
    "photograph",
    "drawing and watercolor",
    "drawing",
    "textile",
    "vessel",
    "furniture",
    "architectural drawing",
    "book",
    "coin",
    "mask",
];

const HAS_IMAGE: &str = "(a.image_id IS NOT NULL AND a.image_id <> '')";

const SELECT_ARTWORKS: &str = r#"
SELECT a.id, a.title, a.main_reference_number, a.description, a.short_description,
       a.artist_display, a.artist_title, a.date_display, a.date_start, a.date_end,
       a.medium_display, a.dimensions, a.place_of_origin, a.department_title,
       a.artwork_type_title, a.credit_line, a.provenance_text, a.exhibition_history,
       a.is_public_domain, a.image_id
FROM artworks a"#;

/// Primary image, sized to the largest width the AIC IIIF server serves openly
pub fn image_url(image_id: &str) -> String {
    format!("{}/{}/full/843,/0/default.jpg", IIIF_BASE, image_id)
}

pub fn thumbnail_url(image_id: &str) -> String {
    format!("{}/{}/full/200,/0/default.jpg", IIIF_BASE, image_id)
}

#[derive(Debug, FromRow)]
struct ArtworkRow {
    id: i64,
    title: Option<String>,
    main_reference_number: Option<String>,
    description: Option<String>,
    short_description: Option<String>,
    artist_display: Option<String>,
    artist_title: Option<String>,
    date_display: Option<String>,
    date_start: Option<i32>,
    date_end: Option<i32>,
    medium_display: Option<String>,
    dimensions: Option<String>,
    place_of_origin: Option<String>,
    department_title: Option<String>,
    artwork_type_title: Option<String>,
    credit_line: Option<String>,
    provenance_text: Option<String>,
    exhibition_history: Option<String>,
    is_public_domain: bool,
    image_id: Option<String>,
}

/// Child rows for one page of artworks
#[derive(Default)]
struct Children {
    artists: HashMap<i64, Vec<String>>,
    classifications: HashMap<i64, Vec<String>>,
    styles: HashMap<i64, Vec<String>>,
    subjects: HashMap<i64, Vec<String>>,
    alt_images: HashMap<i64, Vec<String>>,
}

pub struct AicAdapter {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl AicAdapter {
    /// Open a built store read-only
    pub async fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            pool: open_read_only(db_path).await?,
            db_path: db_path.to_path_buf(),
        })
    }

    fn build_filter(options: &SearchOptions) -> FilterBuilder {
        let mut filter = FilterBuilder::new();

        if let Some(query) = options.query_text() {
            filter.push_like_any(&["a.title", "a.description", "a.artist_display"], query);
        }
        filter.push_all_words("a.artist_display", &options.artist_words());

        push_any_of(&mut filter, &options.genres, |value| {
            match route_genre(value, OBJECT_TYPES) {
                GenreRoute::ObjectType(term) => (like("a.artwork_type_title"), term.to_string()),
                GenreRoute::Style => (
                    format!(
                        "EXISTS (SELECT 1 FROM {} s WHERE s.artwork_id = a.id AND {})",
                        STYLE_TABLE,
                        like("s.term")
                    ),
                    value.to_string(),
                ),
            }
        });

        push_any_of(&mut filter, &options.classifications, |value| {
            (
                format!(
                    "EXISTS (SELECT 1 FROM {} c WHERE c.artwork_id = a.id AND {})",
                    CLASSIFICATION_TABLE,
                    like("c.term")
                ),
                value.to_string(),
            )
        });

        if let Some(medium) = options.first_medium() {
            filter.push_like_any(&["a.medium_display"], medium);
        }

        push_date_overlap(&mut filter, "a.date_start", "a.date_end", options);

        if options.public_domain_only {
            filter.push_raw("a.is_public_domain = 1");
        }
        if options.has_image_only() {
            filter.push_raw(HAS_IMAGE);
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
            "SELECT artwork_id, name FROM artwork_artists WHERE artwork_id IN ({}) ORDER BY artwork_id, position",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let artists = group_by_parent(query.fetch_all(&self.pool).await?);

        Ok(Children {
            artists,
            classifications: fetch_terms(&self.pool, CLASSIFICATION_TABLE, "artwork_id", ids).await?,
            styles: fetch_terms(&self.pool, STYLE_TABLE, "artwork_id", ids).await?,
            subjects: fetch_terms(&self.pool, SUBJECT_TABLE, "artwork_id", ids).await?,
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

fn fold(row: ArtworkRow, children: &mut Children) -> ArtworkResult {
    let id = row.id;
    let mut result = ArtworkResult::new(ADAPTER_ID, id.to_string(), row.title.as_deref());

    result.artists = fold_artists(&row, children.artists.remove(&id).unwrap_or_default());

    let image_id = row
        .image_id
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty());
    if let Some(image_id) = image_id {
        result.image_url = image_url(image_id);
        result.thumbnail_url = Some(thumbnail_url(image_id));
    }
    result.additional_images = children
        .alt_images
        .remove(&id)
        .unwrap_or_default()
        .iter()
        .map(|alt| image_url(alt))
        .collect();

    result.description = clean_text(row.description.as_deref())
        .or_else(|| clean_text(row.short_description.as_deref()));
    result.mediums = row
        .medium_display
        .as_deref()
        .map(parse_mediums)
        .unwrap_or_default();
    result.medium_display = clean_text(row.medium_display.as_deref());
    result.genres = dedupe_trimmed(children.styles.remove(&id).unwrap_or_default());

    let mut classifications = children.classifications.remove(&id).unwrap_or_default();
    classifications.extend(row.artwork_type_title.clone());
    result.classifications = dedupe_trimmed(classifications);
    result.tags = dedupe_trimmed(children.subjects.remove(&id).unwrap_or_default());

    result.date_display = clean_text(row.date_display.as_deref());
    result.date_start = row.date_start;
    result.date_end = row.date_end;
    result.dimensions = clean_text(row.dimensions.as_deref());
    result.department = clean_text(row.department_title.as_deref());
    result.culture = clean_text(row.place_of_origin.as_deref());
    result.credit_line = clean_text(row.credit_line.as_deref());
    result.provenance = clean_text(row.provenance_text.as_deref());
    result.is_public_domain = row.is_public_domain;
    result.source_url = format!("{}/{}", ARTWORK_PAGE_BASE, id);
    result.raw_metadata = json!({
        "main_reference_number": row.main_reference_number,
        "image_id": row.image_id,
        "artist_display": row.artist_display,
        "artwork_type_title": row.artwork_type_title,
        "exhibition_history": row.exhibition_history,
    });

    result
}

/// `artist_display` reads "Name\nNationality, birth–death"; its second line
/// enriches a lone credited artist
fn fold_artists(row: &ArtworkRow, names: Vec<String>) -> Vec<Artist> {
    let display = row.artist_display.as_deref().unwrap_or_default();
    let mut lines = display.lines().map(str::trim).filter(|l| !l.is_empty());
    let display_name = lines.next();
    let details = lines.next();

    let mut artists: Vec<Artist> = if names.is_empty() {
        vec![Artist::named(row.artist_title.as_deref().or(display_name))]
    } else {
        names.iter().map(|n| Artist::named(Some(n))).collect()
    };

    if let ([artist], Some(details)) = (artists.as_mut_slice(), details) {
        apply_life_details(artist, details);
    }
    artists
}

#[async_trait]
impl MuseumAdapter for AicAdapter {
    fn id(&self) -> &str {
        ADAPTER_ID
    }

    fn name(&self) -> &str {
        "Art Institute of Chicago"
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
        filter.push("a.id = ?", [id]).push_raw(HAS_IMAGE);
        let rows = self.fetch_rows(&filter, 1, 0).await?;
        Ok(self.fold_page(rows).await?.into_iter().next())
    }

    async fn image_urls(&self, limit: Option<usize>) -> Result<Vec<(String, String)>> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT a.id, a.image_id FROM artworks a WHERE {} ORDER BY a.id LIMIT ?",
            HAS_IMAGE
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, image_id)| {
                (
                    GlobalId::format(ADAPTER_ID, &id.to_string()),
                    image_url(image_id.trim()),
                )
            })
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (with_image, public_domain): (i64, i64) = sqlx::query_as(&format!(
            "SELECT COALESCE(SUM({}), 0), COALESCE(SUM(a.is_public_domain), 0) FROM artworks a",
            HAS_IMAGE
        ))
        .fetch_one(&self.pool)
        .await?;

        let mut child_rows = 0;
        for table in [
            "artwork_artists",
            CLASSIFICATION_TABLE,
            STYLE_TABLE,
            SUBJECT_TABLE,
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
