//! Get command implementation

use crate::error::Result;
use crate::federation::CollectionFederator;
use crate::models::ArtworkResult;
use tracing::info;

/// Look up one artwork by `<museum>:<id>`
pub async fn cmd_get(
    federator: &CollectionFederator,
    global_id: &str,
) -> Result<Option<ArtworkResult>> {
    info!(global_id, "Fetching artwork");
    federator.get_by_id(global_id.trim()).await
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        println!("{:<14}{}", format!("{}:", label), value);
    }
}

fn print_list(label: &str, values: &[String]) {
    if !values.is_empty() {
        print_field(label, Some(&values.join(", ")));
    }
}

/// Print a single artwork to console
pub fn print_artwork(global_id: &str, artwork: Option<&ArtworkResult>) {
    let Some(artwork) = artwork else {
        println!("⚠ No artwork found for '{}'", global_id);
        println!("  Ids look like 'aic:27992', 'cleveland:135382' or 'nga:46451'.");
        return;
    };

    println!("\n🖼  {}\n", artwork.title);
    print_field("ID", Some(&artwork.global_id));

    for artist in &artwork.artists {
        let mut line = artist.name.clone();
        let details: Vec<String> = [
            artist.nationality.clone(),
            match (artist.birth_year, artist.death_year) {
                (Some(born), Some(died)) => Some(format!("{}-{}", born, died)),
                (Some(born), None) => Some(format!("b. {}", born)),
                (None, Some(died)) => Some(format!("d. {}", died)),
                (None, None) => None,
            },
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            line = format!("{} ({})", line, details.join(", "));
        }
        if let Some(role) = &artist.role {
            line = format!("{} [{}]", line, role);
        }
        print_field("Artist", Some(&line));
    }

    print_field("Date", artwork.date_display.as_deref());
    print_field("Medium", artwork.medium_display.as_deref());
    print_list("Medium tags", &artwork.mediums);
    print_list("Genres", &artwork.genres);
    print_list("Classes", &artwork.classifications);
    print_field("Dimensions", artwork.dimensions.as_deref());
    print_field("Department", artwork.department.as_deref());
    print_field("Culture", artwork.culture.as_deref());
    print_field("Credit", artwork.credit_line.as_deref());
    print_field(
        "Rights",
        Some(if artwork.is_public_domain {
            "✓ Public domain"
        } else {
            "Rights reserved"
        }),
    );
    print_field("Image", Some(&artwork.image_url));
    print_field("Thumbnail", artwork.thumbnail_url.as_deref());
    if !artwork.additional_images.is_empty() {
        println!("{:<14}{} more", "Views:", artwork.additional_images.len());
    }
    print_field("Source", Some(&artwork.source_url));

    if let Some(description) = &artwork.description {
        println!("\n{}", description.trim());
    }
    if let Some(provenance) = &artwork.provenance {
        println!("\nProvenance: {}", provenance.trim());
    }
    println!();
}
