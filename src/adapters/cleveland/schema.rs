//! SQLite schema for the Cleveland Museum of Art store

pub const CULTURE_TABLE: &str = "artwork_cultures";
pub const PROVENANCE_TABLE: &str = "artwork_provenance";
pub const EXHIBITION_TABLE: &str = "artwork_exhibitions";
pub const ALT_IMAGE_TABLE: &str = "artwork_alt_images";
pub const CREATOR_TABLE: &str = "artwork_creators";

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS artworks (
    id INTEGER PRIMARY KEY,
    accession_number TEXT,
    title TEXT,
    creation_date TEXT,
    date_start INTEGER,
    date_end INTEGER,
    type TEXT,
    technique TEXT,
    department TEXT,
    collection TEXT,
    measurements TEXT,
    description TEXT,
    tombstone TEXT,
    credit_line TEXT,
    url TEXT,
    share_license_status TEXT,
    -- creator descriptions joined with "; ", the artist filter target
    creators_display TEXT,
    -- raw `images` object with web/full/print variants
    images_json TEXT,
    has_image INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS artwork_creators (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    role TEXT,
    nationality TEXT,
    birth_year INTEGER,
    death_year INTEGER
);

CREATE TABLE IF NOT EXISTS artwork_cultures (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artwork_provenance (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artwork_exhibitions (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

-- Resolved primary URL of each alternate view
CREATE TABLE IF NOT EXISTS artwork_alt_images (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artworks_title ON artworks(title);
CREATE INDEX IF NOT EXISTS idx_artworks_creators ON artworks(creators_display);
CREATE INDEX IF NOT EXISTS idx_artworks_has_image ON artworks(has_image);
CREATE INDEX IF NOT EXISTS idx_artworks_license ON artworks(share_license_status);
CREATE INDEX IF NOT EXISTS idx_artworks_dates ON artworks(date_start, date_end);
CREATE INDEX IF NOT EXISTS idx_artwork_creators_artwork ON artwork_creators(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_cultures_artwork ON artwork_cultures(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_provenance_artwork ON artwork_provenance(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_exhibitions_artwork ON artwork_exhibitions(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_alt_images_artwork ON artwork_alt_images(artwork_id, position);
"#;
