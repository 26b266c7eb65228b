//! National Gallery of Art adapter
//!
//! Objects join against `published_images`; the first view by `sequence`
//! (ties broken by `uuid`) is the primary image and the rest become
//! additional views.

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
    bind_all_as, count_rows, group_by_parent, like, open_read_only, placeholders, FilterBuilder,
};
use async_trait::async_trait;
use schema::*;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ADAPTER_ID: &str = "nga";

const ARTWORK_PAGE_BASE: &str = "https://www.nga.gov/collection/art-object-page";

/// Object classifications that double as genre words
const OBJECT_TYPES: &[&str] = &[
    "painting",
    "sculpture",
    "print",
    "photograph",
    "drawing",
    "decorative art",
    "technical material",
    "volume",
    "portfolio",
];

/// Term types searched by a style-like genre filter
const GENRE_TERM_TYPES: &str = "('Style', 'Theme')";

const HAS_IMAGE: &str = "(img.iiifurl IS NOT NULL AND img.iiifurl <> '')";

/// Artworks with their primary image: the first view by `(sequence, uuid)`,
/// the same order the additional-images query uses.
const SELECT_ARTWORKS: &str = r#"
SELECT a.objectid, a.accessionnum, a.title, a.displaydate, a.beginyear, a.endyear,
       a.medium, a.dimensions, a.inscription, a.attributioninverted, a.attribution,
       a.provenancetext, a.creditline, a.classification, a.subclassification,
       a.departmentabbr, a.wikidataid,
       img.iiifurl, img.iiifthumburl, img.assistivetext
FROM artworks a
LEFT JOIN (
    SELECT depictstmsobjectid, iiifurl, iiifthumburl, assistivetext,
           ROW_NUMBER() OVER (PARTITION BY depictstmsobjectid ORDER BY sequence, uuid) AS view_rank
    FROM published_images
) img ON img.depictstmsobjectid = a.objectid AND img.view_rank = 1"#;

/// Primary rendition of a IIIF image service base URL
pub fn image_url(iiif_base: &str) -> String {
    format!(
        "{}/full/!800,800/0/default.jpg",
        iiif_base.trim().trim_end_matches('/')
    )
}

#[derive(Debug, FromRow)]
struct ArtworkRow {
    objectid: i64,
    accessionnum: Option<String>,
    title: Option<String>,
    displaydate: Option<String>,
    beginyear: Option<i32>,
    endyear: Option<i32>,
    medium: Option<String>,
    dimensions: Option<String>,
    inscription: Option<String>,
    attributioninverted: Option<String>,
    attribution: Option<String>,
    provenancetext: Option<String>,
    creditline: Option<String>,
    classification: Option<String>,
    subclassification: Option<String>,
    departmentabbr: Option<String>,
    wikidataid: Option<String>,
    iiifurl: Option<String>,
    iiifthumburl: Option<String>,
    assistivetext: Option<String>,
}

type ArtistRow = (i64, Option<String>, Option<String>, Option<String>, Option<i32>, Option<i32>);

/// Terms of one object, split by `termtype`
#[derive(Default)]
struct Terms {
    genres: Vec<String>,
    schools: Vec<String>,
    keywords: Vec<String>,
}

#[derive(Default)]
struct Children {
    artists: HashMap<i64, Vec<Artist>>,
    images: HashMap<i64, Vec<String>>,
    terms: HashMap<i64, Terms>,
}

pub struct NgaAdapter {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl NgaAdapter {
    pub async fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            pool: open_read_only(db_path).await?,
            db_path: db_path.to_path_buf(),
        })
    }

    fn build_filter(options: &SearchOptions) -> FilterBuilder {
        let mut filter = FilterBuilder::new();

        if let Some(query) = options.query_text() {
            filter.push_like_any(&["a.title", "a.attribution"], query);
        }
        filter.push_all_words("a.attributioninverted", &options.artist_words());

        push_any_of(&mut filter, &options.genres, |value| {
            match route_genre(value, OBJECT_TYPES) {
                GenreRoute::ObjectType(term) => (like("a.classification"), term.to_string()),
                GenreRoute::Style => (
                    format!(
                        "EXISTS (SELECT 1 FROM {} t WHERE t.objectid = a.objectid AND t.termtype IN {} AND {})",
                        TERM_TABLE,
                        GENRE_TERM_TYPES,
                        like("t.term")
                    ),
                    value.to_string(),
                ),
            }
        });

        push_any_of(&mut filter, &options.classifications, |value| {
            (
                like("(COALESCE(a.classification, '') || ' ' || COALESCE(a.subclassification, ''))"),
                value.to_string(),
            )
        });

        if let Some(medium) = options.first_medium() {
            filter.push_like_any(&["a.medium"], medium);
        }

        push_date_overlap(&mut filter, "a.beginyear", "a.endyear", options);

        // Only openly published images appear in the dump
        if options.public_domain_only || options.has_image_only() {
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
            "{}{} ORDER BY a.objectid ASC LIMIT ? OFFSET ?",
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
        let marks = placeholders(ids.len());

        let sql = format!(
            r#"SELECT oc.objectid,
                      COALESCE(c.preferreddisplayname, c.forwarddisplayname),
                      oc.role, c.nationality, c.beginyear, c.endyear
               FROM {links} oc
               LEFT JOIN {people} c ON c.constituentid = oc.constituentid
               WHERE oc.objectid IN ({marks})
                 AND (oc.roletype IS NULL OR oc.roletype = 'artist')
               ORDER BY oc.objectid, oc.displayorder, oc.rowid"#,
            links = LINK_TABLE,
            people = CONSTITUENT_TABLE,
            marks = marks,
        );
        let mut query = sqlx::query_as::<_, ArtistRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let artists = group_by_parent(query.fetch_all(&self.pool).await?.into_iter().map(
            |(objectid, name, role, nationality, birth_year, death_year)| {
                let mut artist = Artist::named(name.as_deref());
                artist.role = role;
                artist.nationality = nationality;
                artist.birth_year = birth_year;
                artist.death_year = death_year;
                (objectid, artist)
            },
        ));

        let sql = format!(
            "SELECT depictstmsobjectid, iiifurl FROM {} WHERE depictstmsobjectid IN ({}) ORDER BY depictstmsobjectid, sequence, uuid",
            IMAGE_TABLE, marks
        );
        let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let images = group_by_parent(query.fetch_all(&self.pool).await?);

        let sql = format!(
            "SELECT objectid, termtype, term FROM {} WHERE objectid IN ({}) ORDER BY objectid, position",
            TERM_TABLE, marks
        );
        let mut query = sqlx::query_as::<_, (i64, String, String)>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let mut terms: HashMap<i64, Terms> = HashMap::new();
        for (objectid, termtype, term) in query.fetch_all(&self.pool).await? {
            let entry = terms.entry(objectid).or_default();
            match termtype.as_str() {
                "Style" | "Theme" => entry.genres.push(term),
                "School" => entry.schools.push(term),
                "Keyword" => entry.keywords.push(term),
                _ => {}
            }
        }

        Ok(Children {
            artists,
            images,
            terms,
        })
    }

    async fn fold_page(&self, rows: Vec<ArtworkRow>) -> Result<Vec<ArtworkResult>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.objectid).collect();
        let mut children = self.fetch_children(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| fold(row, &mut children))
            .collect())
    }
}

fn fold(row: ArtworkRow, children: &mut Children) -> ArtworkResult {
    let id = row.objectid;
    let mut result = ArtworkResult::new(ADAPTER_ID, id.to_string(), row.title.as_deref());

    let artists = children.artists.remove(&id).unwrap_or_default();
    result.artists = if artists.is_empty() {
        vec![Artist::named(row.attribution.as_deref())]
    } else {
        artists
    };

    let primary = row
        .iiifurl
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    if let Some(primary) = primary {
        result.image_url = image_url(primary);
        result.thumbnail_url = clean_text(row.iiifthumburl.as_deref());
        result.is_public_domain = true;
    }
    result.additional_images = children
        .images
        .remove(&id)
        .unwrap_or_default()
        .into_iter()
        .filter(|url| Some(url.as_str()) != primary)
        .map(|url| image_url(&url))
        .collect();

    let terms = children.terms.remove(&id).unwrap_or_default();
    result.genres = dedupe_trimmed(terms.genres);
    result.culture = dedupe_trimmed(terms.schools).into_iter().next();
    result.tags = dedupe_trimmed(terms.keywords);
    result.classifications =
        dedupe_trimmed([row.classification.clone(), row.subclassification.clone()].into_iter().flatten());

    result.description = clean_text(row.assistivetext.as_deref());
    result.mediums = row.medium.as_deref().map(parse_mediums).unwrap_or_default();
    result.medium_display = clean_text(row.medium.as_deref());
    result.date_display = clean_text(row.displaydate.as_deref());
    result.date_start = row.beginyear;
    result.date_end = row.endyear;
    result.dimensions = clean_text(row.dimensions.as_deref());
    result.department = clean_text(row.departmentabbr.as_deref());
    result.credit_line = clean_text(row.creditline.as_deref());
    result.provenance = clean_text(row.provenancetext.as_deref());
    result.source_url = format!("{}.{}.html", ARTWORK_PAGE_BASE, id);
    result.raw_metadata = json!({
        "accessionnum": row.accessionnum,
        "attribution": row.attribution,
        "attributioninverted": row.attributioninverted,
        "inscription": row.inscription,
        "wikidataid": row.wikidataid,
        "iiifurl": row.iiifurl,
    });

    result
}

#[async_trait]
impl MuseumAdapter for NgaAdapter {
    fn id(&self) -> &str {
        ADAPTER_ID
    }

    fn name(&self) -> &str {
        "National Gallery of Art"
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
        filter.push("a.objectid = ?", [id]).push_raw(HAS_IMAGE);
        let rows = self.fetch_rows(&filter, 1, 0).await?;
        Ok(self.fold_page(rows).await?.into_iter().next())
    }

    async fn image_urls(&self, limit: Option<usize>) -> Result<Vec<(String, String)>> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT q.objectid, q.iiifurl FROM ({}) q \
             WHERE q.iiifurl IS NOT NULL AND q.iiifurl <> '' ORDER BY q.objectid LIMIT ?",
            SELECT_ARTWORKS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, url)| (GlobalId::format(ADAPTER_ID, &id.to_string()), image_url(&url)))
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let (with_image,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT depictstmsobjectid) FROM published_images")
                .fetch_one(&self.pool)
                .await?;

        let mut child_rows = 0;
        for table in [IMAGE_TABLE, CONSTITUENT_TABLE, LINK_TABLE, TERM_TABLE] {
            child_rows += count_rows(&self.pool, table).await?;
        }

        Ok(StoreStats {
            artworks: count_rows(&self.pool, "artworks").await?,
            with_image,
            public_domain: with_image,
            child_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testutil::{any_image, local_ids};
    use tempfile::TempDir;

    const OBJECTS: &str = "\
objectid,accessionnum,title,displaydate,beginyear,endyear,medium,dimensions,attributioninverted,attribution,creditline,classification,subclassification,departmentabbr
46114,1956.10.1,Self-Portrait,1889,1889,1889,oil on canvas,overall: 57.79 x 44.5 cm,\"Gogh, Vincent van\",Vincent van Gogh,Collection of Mr. and Mrs. John Hay Whitney,Painting,,DCG-F
50724,1967.6.1.a,Ginevra de' Benci,c. 1474/1478,1474,1478,oil on panel,38.1 x 37 cm,\"Leonardo da Vinci\",Leonardo da Vinci,Ailsa Mellon Bruce Fund,Painting,,DCG-IT
1138,1942.9.1,The Thinker,1880,1880,,bronze,h: 71.6 cm,\"Rodin, Auguste\",Auguste Rodin,Gift of Mrs. John W. Simpson,Sculpture,,DCG-F
99999,1999.1.1,Study without image,1920,1920,1921,graphite on paper,,\"Doe, Jane\",Jane Doe,Gift,Drawing,Drawing-Mixed,DCG-A
bad,1.1.1,Broken row,1900,1900,1900,,,,,,,,
";

    const IMAGES: &str = "\
uuid,iiifurl,iiifthumburl,viewtype,sequence,width,height,maxpixels,depictstmsobjectid,assistivetext
u-2,https://api.nga.gov/iiif/vg-second,\"https://api.nga.gov/iiif/vg-second/full/!200,200/0/default.jpg\",alternate,1,2000,2400,,46114,
u-1,https://api.nga.gov/iiif/vg-primary/,\"https://api.nga.gov/iiif/vg-primary/full/!200,200/0/default.jpg\",primary,0,2000,2400,,46114,A man with a red beard
u-3,https://api.nga.gov/iiif/ginevra,,primary,0,1000,1000,,50724,
u-4,https://api.nga.gov/iiif/thinker,,primary,not-a-number,1000,1000,,1138,
u-5,https://api.nga.gov/iiif/orphan,,primary,0,1,1,,123,
";

    const CONSTITUENTS: &str = "\
constituentid,preferreddisplayname,forwarddisplayname,displaydate,beginyear,endyear,nationality,constituenttype
1,\"Gogh, Vincent van\",Vincent van Gogh,\"Dutch, 1853 - 1890\",1853,1890,Dutch,individual
2,\"Leonardo da Vinci\",Leonardo da Vinci,\"Florentine, 1452 - 1519\",1452,1519,Florentine,individual
3,\"Whitney, John Hay\",John Hay Whitney,,,,American,individual
";

    const LINKS: &str = "\
objectid,constituentid,displayorder,roletype,role
46114,3,1,owner,collector
46114,1,1,artist,painter
50724,2,1,artist,painter
555,1,1,artist,painter
";

    const TERMS: &str = "\
termid,objectid,termtype,term
1,46114,Style,Post-Impressionist
2,46114,School,Dutch
3,46114,Keyword,portrait
4,46114,Keyword,self-portrait
5,50724,Style,Renaissance
6,50724,Theme,Portraiture
7,50724,School,Florentine
8,1138,Style,
";

    fn write_fixture(dir: &Path) {
        std::fs::write(dir.join("objects.csv"), OBJECTS).unwrap();
        std::fs::write(dir.join("published_images.csv"), IMAGES).unwrap();
        std::fs::write(dir.join("constituents.csv"), CONSTITUENTS).unwrap();
        std::fs::write(dir.join("objects_constituents.csv"), LINKS).unwrap();
        std::fs::write(dir.join("objects_terms.csv"), TERMS).unwrap();
    }

    async fn loaded_adapter(tmp: &TempDir) -> NgaAdapter {
        let source = tmp.path().join("opendata");
        std::fs::create_dir_all(&source).unwrap();
        write_fixture(&source);
        let db_path = tmp.path().join("nga.sqlite");

        let stats = load_data_into_sqlite(&source, &db_path, 2).await.unwrap();
        assert_eq!(stats.inserted, 4);
        // broken object, orphan image, orphan link, blank term
        assert_eq!(stats.skipped, 4);

        NgaAdapter::open(&db_path).await.unwrap()
    }

    #[tokio::test]
    async fn test_lowest_sequence_is_primary() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let portrait = adapter.get_by_id("46114").await.unwrap().unwrap();
        assert_eq!(
            portrait.image_url,
            "https://api.nga.gov/iiif/vg-primary/full/!800,800/0/default.jpg"
        );
        assert_eq!(
            portrait.additional_images,
            vec!["https://api.nga.gov/iiif/vg-second/full/!800,800/0/default.jpg"]
        );
        assert!(portrait.thumbnail_url.unwrap().contains("vg-primary"));
        assert_eq!(portrait.description.as_deref(), Some("A man with a red beard"));

        // unparsable sequence defaults to zero and still counts as primary
        let thinker = adapter.get_by_id("1138").await.unwrap().unwrap();
        assert!(thinker.image_url.contains("/thinker/"));
    }

    #[tokio::test]
    async fn test_sequence_ties_break_on_uuid() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("opendata");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("objects.csv"), OBJECTS).unwrap();
        std::fs::write(
            source.join("published_images.csv"),
            "\
uuid,iiifurl,iiifthumburl,viewtype,sequence,width,height,maxpixels,depictstmsobjectid,assistivetext
u-c,https://api.nga.gov/iiif/third,,alternate,1,1,1,,46114,
u-b,https://api.nga.gov/iiif/second,,primary,0,1,1,,46114,
u-a,https://api.nga.gov/iiif/first,,primary,0,1,1,,46114,
",
        )
        .unwrap();
        let db_path = tmp.path().join("nga.sqlite");
        load_data_into_sqlite(&source, &db_path, 10).await.unwrap();
        let adapter = NgaAdapter::open(&db_path).await.unwrap();

        let portrait = adapter.get_by_id("46114").await.unwrap().unwrap();
        assert_eq!(portrait.image_url, image_url("https://api.nga.gov/iiif/first"));
        assert_eq!(
            portrait.additional_images,
            vec![
                image_url("https://api.nga.gov/iiif/second"),
                image_url("https://api.nga.gov/iiif/third"),
            ]
        );

        let urls = adapter.image_urls(None).await.unwrap();
        assert_eq!(
            urls,
            vec![(
                "nga:46114".to_string(),
                image_url("https://api.nga.gov/iiif/first")
            )]
        );
    }

    #[tokio::test]
    async fn test_fold_artists_and_terms() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let portrait = adapter.get_by_id("46114").await.unwrap().unwrap();
        assert_eq!(portrait.artists.len(), 1);
        assert_eq!(portrait.artists[0].name, "Gogh, Vincent van");
        assert_eq!(portrait.artists[0].role.as_deref(), Some("painter"));
        assert_eq!(portrait.artists[0].nationality.as_deref(), Some("Dutch"));
        assert_eq!(portrait.artists[0].birth_year, Some(1853));
        assert_eq!(portrait.genres, vec!["Post-Impressionist"]);
        assert_eq!(portrait.culture.as_deref(), Some("Dutch"));
        assert_eq!(portrait.tags, vec!["portrait", "self-portrait"]);
        assert_eq!(portrait.classifications, vec!["Painting"]);
        assert_eq!(portrait.mediums, vec!["Oil", "Canvas"]);
        assert!(portrait.is_public_domain);
        assert_eq!(
            portrait.source_url,
            "https://www.nga.gov/collection/art-object-page.46114.html"
        );

        // no linked constituents: attribution stands in
        let thinker = adapter.get_by_id("1138").await.unwrap().unwrap();
        assert_eq!(thinker.artists[0].name, "Auguste Rodin");
        assert!(thinker.genres.is_empty());
    }

    #[tokio::test]
    async fn test_search_order_images_and_pages() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let results = adapter.search(&SearchOptions::default()).await.unwrap();
        assert_eq!(local_ids(&results), vec!["1138", "46114", "50724"]);
        assert!(results.iter().all(|r| r.has_image()));

        let everything = adapter.search(&any_image()).await.unwrap();
        assert_eq!(local_ids(&everything), vec!["1138", "46114", "50724", "99999"]);
        assert!(!everything[3].is_public_domain);
        assert!(everything[3].image_url.is_empty());
        assert!(adapter.get_by_id("99999").await.unwrap().is_none());

        let limited = SearchOptions {
            limit: Some(1),
            page: Some(2),
            ..Default::default()
        };
        assert_eq!(local_ids(&adapter.search(&limited).await.unwrap()), vec!["50724"]);
    }

    #[tokio::test]
    async fn test_filters() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;
        let adapter = &adapter;
        let search = move |options: SearchOptions| async move {
            adapter.search(&options).await.unwrap()
        };

        for artist in ["van gogh", "gogh van"] {
            let results = search(SearchOptions {
                artist: Some(artist.to_string()),
                ..Default::default()
            })
            .await;
            assert_eq!(local_ids(&results), vec!["46114"]);
        }

        let paintings = search(SearchOptions {
            genres: vec!["paintings".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&paintings), vec!["46114", "50724"]);

        let portraiture = search(SearchOptions {
            genres: vec!["portraiture".to_string(), "nonexistent".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&portraiture), vec!["50724"]);

        let mixed = search(SearchOptions {
            classifications: vec!["mixed".to_string()],
            ..any_image()
        })
        .await;
        assert_eq!(local_ids(&mixed), vec!["99999"]);

        let panel = search(SearchOptions {
            mediums: vec!["panel".to_string()],
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&panel), vec!["50724"]);

        let query = search(SearchOptions {
            query: Some("Leonardo".to_string()),
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&query), vec!["50724"]);

        let dated = search(SearchOptions {
            date_start: Some(1885),
            date_end: Some(1890),
            ..Default::default()
        })
        .await;
        assert_eq!(local_ids(&dated), vec!["1138", "46114"]);

        let public = search(SearchOptions {
            public_domain_only: true,
            ..any_image()
        })
        .await;
        assert_eq!(local_ids(&public), vec!["1138", "46114", "50724"]);
    }

    #[tokio::test]
    async fn test_stats_and_image_urls() {
        let tmp = TempDir::new().unwrap();
        let adapter = loaded_adapter(&tmp).await;

        let stats = adapter.stats().await.unwrap();
        assert_eq!(stats.artworks, 4);
        assert_eq!(stats.with_image, 3);

        let urls = adapter.image_urls(None).await.unwrap();
        let ids: Vec<&str> = urls.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["nga:1138", "nga:46114", "nga:50724"]);
        assert!(urls[1].1.contains("vg-primary"));

        assert_eq!(adapter.image_urls(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_required_and_optional_files() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("opendata");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("objects.csv"), OBJECTS).unwrap();
        let db_path = tmp.path().join("nga.sqlite");

        let err = load_data_into_sqlite(&source, &db_path, 10).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::SourceMissing(_)));

        std::fs::write(source.join("published_images.csv"), IMAGES).unwrap();
        let stats = load_data_into_sqlite(&source, &db_path, 10).await.unwrap();
        assert_eq!(stats.inserted, 4);

        let adapter = NgaAdapter::open(&db_path).await.unwrap();
        let portrait = adapter.get_by_id("46114").await.unwrap().unwrap();
        assert_eq!(portrait.artists[0].name, "Vincent van Gogh");
    }
}
