//! SQLite schema for the Art Institute of Chicago store

/// Term tables share the `(artwork_id, position, term)` shape
pub const CLASSIFICATION_TABLE: &str = "artwork_classifications";
pub const STYLE_TABLE: &str = "artwork_styles";
pub const SUBJECT_TABLE: &str = "artwork_subjects";
pub const ALT_IMAGE_TABLE: &str = "artwork_alt_images";

pub const SCHEMA_SQL: &str = r#"
-- One row per artwork file in the dump
CREATE TABLE IF NOT EXISTS artworks (
    id INTEGER PRIMARY KEY,
    title TEXT,
    main_reference_number TEXT,
    description TEXT,
    short_description TEXT,
    artist_display TEXT,
    artist_title TEXT,
    date_display TEXT,
    date_start INTEGER,
    date_end INTEGER,
    medium_display TEXT,
    dimensions TEXT,
    place_of_origin TEXT,
    department_title TEXT,
    artwork_type_title TEXT,
    credit_line TEXT,
    provenance_text TEXT,
    exhibition_history TEXT,
    is_public_domain INTEGER NOT NULL DEFAULT 0,
    image_id TEXT
);

-- Artists credited on the work, in dump order
CREATE TABLE IF NOT EXISTS artwork_artists (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    artist_id INTEGER,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artwork_classifications (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artwork_styles (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artwork_subjects (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

-- IIIF identifiers of secondary views
CREATE TABLE IF NOT EXISTS artwork_alt_images (
    artwork_id INTEGER NOT NULL REFERENCES artworks(id),
    position INTEGER NOT NULL,
    term TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artworks_title ON artworks(title);
CREATE INDEX IF NOT EXISTS idx_artworks_artist ON artworks(artist_display);
CREATE INDEX IF NOT EXISTS idx_artworks_image ON artworks(image_id);
CREATE INDEX IF NOT EXISTS idx_artworks_public_domain ON artworks(is_public_domain);
CREATE INDEX IF NOT EXISTS idx_artworks_dates ON artworks(date_start, date_end);
CREATE INDEX IF NOT EXISTS idx_artwork_artists_artwork ON artwork_artists(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_classifications_artwork ON artwork_classifications(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_styles_artwork ON artwork_styles(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_subjects_artwork ON artwork_subjects(artwork_id, position);
CREATE INDEX IF NOT EXISTS idx_artwork_alt_images_artwork ON artwork_alt_images(artwork_id, position);
"#;
