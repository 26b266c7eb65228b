//! SQLite schema for the National Gallery of Art store
//!
//! Tables keep the open-data CSV names and columns so rows can be checked
//! against the published files.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS artworks (
    objectid INTEGER PRIMARY KEY,
    accessionnum TEXT,
    title TEXT,
    displaydate TEXT,
    beginyear INTEGER,
    endyear INTEGER,
    medium TEXT,
    dimensions TEXT,
    inscription TEXT,
    attributioninverted TEXT,
    attribution TEXT,
    provenancetext TEXT,
    creditline TEXT,
    classification TEXT,
    subclassification TEXT,
    departmentabbr TEXT,
    wikidataid TEXT
);

-- One row per published view; the first by (sequence, uuid) is the primary image
CREATE TABLE IF NOT EXISTS published_images (
    uuid TEXT PRIMARY KEY,
    depictstmsobjectid INTEGER NOT NULL REFERENCES artworks(objectid),
    iiifurl TEXT NOT NULL,
    iiifthumburl TEXT,
    viewtype TEXT,
    sequence INTEGER NOT NULL DEFAULT 0,
    width INTEGER,
    height INTEGER,
    assistivetext TEXT
);

CREATE TABLE IF NOT EXISTS constituents (
    constituentid INTEGER PRIMARY KEY,
    preferreddisplayname TEXT,
    forwarddisplayname TEXT,
    displaydate TEXT,
    beginyear INTEGER,
    endyear INTEGER,
    nationality TEXT,
    constituenttype TEXT
);

CREATE TABLE IF NOT EXISTS objects_constituents (
    objectid INTEGER NOT NULL REFERENCES artworks(objectid),
    constituentid INTEGER NOT NULL,
    displayorder INTEGER NOT NULL DEFAULT 0,
    roletype TEXT,
    role TEXT
);

CREATE TABLE IF NOT EXISTS objects_terms (
    objectid INTEGER NOT NULL REFERENCES artworks(objectid),
    position INTEGER NOT NULL,
    termtype TEXT NOT NULL,
    term TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artworks_title ON artworks(title);
CREATE INDEX IF NOT EXISTS idx_artworks_attribution ON artworks(attributioninverted);
CREATE INDEX IF NOT EXISTS idx_artworks_classification ON artworks(classification);
CREATE INDEX IF NOT EXISTS idx_artworks_years ON artworks(beginyear, endyear);
CREATE INDEX IF NOT EXISTS idx_published_images_object ON published_images(depictstmsobjectid, sequence);
CREATE INDEX IF NOT EXISTS idx_objects_constituents_object ON objects_constituents(objectid, displayorder);
CREATE INDEX IF NOT EXISTS idx_objects_terms_object ON objects_terms(objectid, termtype, position);
"#;

pub const IMAGE_TABLE: &str = "published_images";
pub const LINK_TABLE: &str = "objects_constituents";
pub const CONSTITUENT_TABLE: &str = "constituents";
pub const TERM_TABLE: &str = "objects_terms";
