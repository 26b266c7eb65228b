//! Pure helpers for cleaning institution vocabulary
//!
//! Medium descriptions arrive as free text ("Oil on canvas, mounted on
//! panel"). `parse_mediums` maps them onto a small canonical tag set so the
//! three institutions can be compared.

use crate::models::Artist;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Canonical medium tags and the word patterns that imply them, in output order
const MEDIUM_PATTERNS: &[(&str, &str)] = &[
    ("Oil", r"\boils?\b"),
    ("Acrylic", r"\bacrylics?\b"),
    ("Tempera", r"\btempera\b"),
    ("Watercolor", r"\bwater\s?colou?rs?\b"),
    ("Gouache", r"\bgouache\b"),
    ("Fresco", r"\bfrescos?\b"),
    ("Pastel", r"\bpastels?\b"),
    ("Charcoal", r"\bcharcoal\b"),
    ("Graphite", r"\b(?:graphite|pencil)\b"),
    ("Chalk", r"\bchalks?\b"),
    ("Ink", r"\binks?\b"),
    ("Canvas", r"\bcanvas\b"),
    ("Panel", r"\bpanels?\b"),
    ("Wood", r"\b(?:wood|oak|walnut|mahogany|poplar)\b"),
    ("Paper", r"\bpaper\b"),
    ("Parchment", r"\b(?:parchment|vellum)\b"),
    ("Linen", r"\blinen\b"),
    ("Silk", r"\bsilk\b"),
    ("Bronze", r"\bbronze\b"),
    ("Marble", r"\bmarble\b"),
    ("Stone", r"\b(?:stone|limestone|sandstone|granite)\b"),
    ("Terracotta", r"\bterra[\s-]?cotta\b"),
    ("Ceramic", r"\b(?:ceramic|porcelain|earthenware|stoneware|faience)\b"),
    ("Glass", r"\bglass\b"),
    ("Gold", r"\b(?:gold|gilt|gilded)\b"),
    ("Silver", r"\bsilver\b"),
    ("Etching", r"\betchings?\b"),
    ("Engraving", r"\bengravings?\b"),
    ("Lithograph", r"\blithographs?\b"),
    ("Woodcut", r"\bwoodcuts?\b"),
    ("Photograph", r"\b(?:photographs?|albumen|daguerreotype|gelatin)\b"),
    ("Mixed Media", r"\bmixed\s+media\b"),
];

fn medium_matchers() -> &'static [(&'static str, Regex)] {
    static MATCHERS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        MEDIUM_PATTERNS
            .iter()
            .filter_map(|(tag, pattern)| {
                Regex::new(&format!("(?i){}", pattern))
                    .ok()
                    .map(|re| (*tag, re))
            })
            .collect()
    })
}

/// Classify a free-text medium description into canonical tags
pub fn parse_mediums(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    medium_matchers()
        .iter()
        .filter(|(_, re)| re.is_match(raw))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// Trim, drop blanks, and dedupe case-insensitively keeping the first spelling
pub fn dedupe_trimmed<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.to_lowercase()) {
            out.push(value.to_string());
        }
    }
    out
}

/// `Some(trimmed)` for non-blank text
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Leading four-digit year in text such as "1853–1890" or "born 1840"
pub fn first_year(text: &str) -> Option<i32> {
    years(text).next()
}

/// Every standalone four-digit year in the text, in order
pub fn years(text: &str) -> impl Iterator<Item = i32> + '_ {
    static YEAR: OnceLock<Option<Regex>> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").ok())
        .iter()
        .flat_map(move |re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
}

/// Read "Vincent van Gogh (Dutch, 1853–1890)" as a name plus the
/// parenthesised nationality and life years
pub fn parse_creator_description(description: &str) -> Artist {
    let description = description.trim();
    let Some(open) = description.find('(') else {
        return Artist::named(Some(description));
    };

    let mut artist = Artist::named(Some(&description[..open]));
    apply_life_details(&mut artist, description[open + 1..].trim_end_matches(')'));
    artist
}

/// Fill nationality and life years from text like "French, 1859–1891"
pub fn apply_life_details(artist: &mut Artist, details: &str) {
    let details = details.trim();
    artist.nationality = details
        .split(',')
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && !n.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string);

    let mut life = years(details);
    artist.birth_year = life.next();
    artist.death_year = life.next();
}
