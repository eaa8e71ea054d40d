//! Bundled descriptive metadata for known listings.
//!
//! The remote API stores only the transactional fields of a place; the
//! gallery imagery, location blurbs, and capacity details live in this
//! static table. Rows are joined onto remote records by case-insensitive
//! listing name - a rename on either side silently loses the match, so
//! remote titles and table names must stay in step.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{ApiPlace, Place};

// ============================================================================
// Constants
// ============================================================================

/// Rating shown for listings without collected review data.
const DEFAULT_RATING: f64 = 4.9;

/// Capacity defaults for listings the table does not describe.
const DEFAULT_GUESTS: u32 = 4;
const DEFAULT_BEDROOMS: u32 = 2;
const DEFAULT_BATHROOMS: u32 = 1;

/// Hero image for listings with no gallery.
const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Location label when neither the table nor the record can place a
/// listing.
const UNKNOWN_LOCATION: &str = "Unknown location";

// ============================================================================
// Metadata table
// ============================================================================

/// Static descriptive metadata for one listing, keyed by its name.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    pub name: &'static str,
    pub property_type: Option<&'static str>,
    pub location: Option<&'static str>,
    pub full_location: Option<&'static str>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub description: Option<&'static str>,
    pub amenities: &'static [&'static str],
    pub images: &'static [&'static str],
    pub guests: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
}

static PROPERTIES: &[PropertyMetadata] = &[
    PropertyMetadata {
        name: "Villa Serenity",
        property_type: Some("Villa"),
        location: Some("Santorini, Greece"),
        full_location: Some("Oia, Santorini, Greece"),
        price: Some(480.0),
        rating: Some(4.97),
        reviews: Some(212),
        description: Some(
            "Whitewashed cliffside villa with a private infinity pool and \
             unobstructed caldera sunsets.",
        ),
        amenities: &["Wi-Fi", "Pool", "Air conditioning", "Sea view", "Free parking"],
        images: &[
            "/images/villa-serenity-1.jpg",
            "/images/villa-serenity-2.jpg",
            "/images/villa-serenity-3.jpg",
        ],
        guests: Some(6),
        bedrooms: Some(3),
        bathrooms: Some(2),
    },
    PropertyMetadata {
        name: "Downtown Loft",
        property_type: Some("Apartment"),
        location: Some("Lisbon, Portugal"),
        full_location: Some("Baixa, Lisbon, Portugal"),
        price: Some(140.0),
        rating: Some(4.82),
        reviews: Some(96),
        description: Some(
            "Industrial loft a block from the riverfront, with floor-to-ceiling \
             windows and a workspace fit for long stays.",
        ),
        amenities: &["Wi-Fi", "Kitchen", "Washer", "Dedicated workspace"],
        images: &["/images/downtown-loft-1.jpg", "/images/downtown-loft-2.jpg"],
        guests: Some(2),
        bedrooms: Some(1),
        bathrooms: Some(1),
    },
    PropertyMetadata {
        name: "Seaside Cottage",
        property_type: Some("Cottage"),
        location: Some("Cornwall, England"),
        full_location: Some("St Ives, Cornwall, England"),
        price: Some(195.0),
        rating: Some(4.91),
        reviews: Some(143),
        description: Some(
            "Stone cottage above the harbour with a log burner and a garden \
             gate opening onto the coastal path.",
        ),
        amenities: &["Wi-Fi", "Fireplace", "Garden", "Pets allowed"],
        images: &[
            "/images/seaside-cottage-1.jpg",
            "/images/seaside-cottage-2.jpg",
        ],
        guests: Some(4),
        bedrooms: Some(2),
        bathrooms: Some(1),
    },
    PropertyMetadata {
        name: "Mountain View Chalet",
        property_type: Some("Chalet"),
        location: Some("Chamonix, France"),
        full_location: Some("Les Praz, Chamonix, France"),
        price: Some(320.0),
        rating: Some(4.88),
        reviews: Some(77),
        description: Some(
            "Timber chalet facing the Mont Blanc massif, ski storage and \
             sauna included.",
        ),
        amenities: &["Wi-Fi", "Sauna", "Ski-in/ski-out", "Free parking"],
        images: &[
            "/images/mountain-chalet-1.jpg",
            "/images/mountain-chalet-2.jpg",
            "/images/mountain-chalet-3.jpg",
        ],
        guests: Some(8),
        bedrooms: Some(4),
        bathrooms: Some(3),
    },
    PropertyMetadata {
        name: "Palm Grove Bungalow",
        property_type: Some("Bungalow"),
        location: Some("Ubud, Bali"),
        full_location: Some("Penestanan, Ubud, Bali"),
        price: Some(85.0),
        rating: Some(4.76),
        reviews: Some(58),
        description: Some(
            "Open-air bungalow in a working palm grove, five minutes by \
             scooter from the market.",
        ),
        amenities: &["Wi-Fi", "Pool", "Breakfast", "Outdoor shower"],
        images: &["/images/palm-grove-1.jpg"],
        guests: Some(2),
        bedrooms: Some(1),
        bathrooms: Some(1),
    },
    PropertyMetadata {
        name: "City Lights Penthouse",
        property_type: Some("Penthouse"),
        location: Some("New York, USA"),
        full_location: Some("Midtown, Manhattan, New York"),
        price: Some(650.0),
        rating: Some(4.94),
        reviews: Some(188),
        description: Some(
            "Corner penthouse on the 41st floor with a wraparound terrace and \
             skyline views from every room.",
        ),
        amenities: &["Wi-Fi", "Gym", "Doorman", "Terrace", "Air conditioning"],
        images: &[
            "/images/city-lights-1.jpg",
            "/images/city-lights-2.jpg",
        ],
        guests: Some(4),
        bedrooms: Some(2),
        bathrooms: Some(2),
    },
];

/// Lookup table keyed by lower-cased listing name, built once.
static METADATA_BY_NAME: OnceLock<HashMap<String, &'static PropertyMetadata>> = OnceLock::new();

fn table() -> &'static HashMap<String, &'static PropertyMetadata> {
    METADATA_BY_NAME.get_or_init(|| {
        PROPERTIES
            .iter()
            .map(|meta| (meta.name.to_lowercase(), meta))
            .collect()
    })
}

/// Look up metadata by listing name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static PropertyMetadata> {
    table().get(&name.to_lowercase()).copied()
}

// ============================================================================
// Enrichment
// ============================================================================

/// Location string priority: full location from the table, then the
/// short location, then the record's coordinates to three decimals,
/// then the unknown marker.
fn format_location(place: &ApiPlace, meta: Option<&PropertyMetadata>) -> String {
    if let Some(full) = meta.and_then(|m| m.full_location) {
        return full.to_string();
    }
    if let Some(location) = meta.and_then(|m| m.location) {
        return location.to_string();
    }
    if let (Some(lat), Some(lon)) = (place.latitude, place.longitude) {
        return format!("{:.3}, {:.3}", lat, lon);
    }
    UNKNOWN_LOCATION.to_string()
}

/// Merge a remote record with its metadata row. Remote-authoritative
/// fields (id, title, price, description, coordinates, amenities) always
/// win; the table fills gaps; fixed defaults close the rest.
pub fn enrich(api: ApiPlace) -> Place {
    let meta = lookup(api.title.as_deref().unwrap_or(""));

    let title = api
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| meta.map(|m| m.name.to_string()));
    let name = title.clone().unwrap_or_else(|| "Property".to_string());

    let full_location = format_location(&api, meta);
    // The short label prefers the short form; the full label prefers the
    // long one. Both fall back to the other before coordinates.
    let location = meta
        .and_then(|m| m.location)
        .or_else(|| meta.and_then(|m| m.full_location))
        .map(str::to_string)
        .unwrap_or_else(|| full_location.clone());

    let api_amenities = api.amenity_names();
    let amenities = if !api_amenities.is_empty() {
        api_amenities
    } else {
        meta.map(|m| m.amenities.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default()
    };

    let images: Vec<String> = meta
        .map(|m| m.images.iter().map(|s| s.to_string()).collect())
        .filter(|imgs: &Vec<String>| !imgs.is_empty())
        .unwrap_or_else(|| vec![PLACEHOLDER_IMAGE.to_string()]);
    let image = images
        .first()
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Place {
        id: api.id.clone(),
        name,
        title,
        property_type: meta.and_then(|m| m.property_type).map(str::to_string),
        location,
        full_location,
        price: api.price.or_else(|| meta.and_then(|m| m.price)).unwrap_or(0.0),
        rating: meta.and_then(|m| m.rating).unwrap_or(DEFAULT_RATING),
        reviews: meta.and_then(|m| m.reviews).unwrap_or(0),
        description: api
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| meta.and_then(|m| m.description).map(str::to_string))
            .unwrap_or_default(),
        amenities,
        images,
        image,
        guests: meta.and_then(|m| m.guests).unwrap_or(DEFAULT_GUESTS),
        bedrooms: meta.and_then(|m| m.bedrooms).unwrap_or(DEFAULT_BEDROOMS),
        bathrooms: meta.and_then(|m| m.bathrooms).unwrap_or(DEFAULT_BATHROOMS),
        latitude: api.latitude,
        longitude: api.longitude,
        owner_id: api.owner_id,
    }
}

// ============================================================================
// Tests
// ============================================================================
