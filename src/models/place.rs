use serde::{Deserialize, Serialize};

/// Amenities arrive either as bare names or as `{id, name}` records,
/// depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiAmenity {
    Name(String),
    Record { id: Option<String>, name: String },
}

impl ApiAmenity {
    pub fn name(&self) -> &str {
        match self {
            ApiAmenity::Name(name) => name,
            ApiAmenity::Record { name, .. } => name,
        }
    }
}

/// A place record as the remote API returns it. Everything beyond the
/// id is optional; enrichment fills the gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPlace {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub amenities: Vec<ApiAmenity>,
}

impl ApiPlace {
    /// Amenity names present on the wire record, empties dropped.
    pub fn amenity_names(&self) -> Vec<String> {
        self.amenities
            .iter()
            .map(|a| a.name().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// An enriched rental listing: the remote record merged with bundled
/// descriptive metadata and display defaults. This is what the
/// presentation layer renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub location: String,
    pub full_location: String,
    pub price: f64,
    pub rating: f64,
    pub reviews: u32,
    pub description: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    /// Primary image, always the first entry of `images`.
    pub image: String,
    pub guests: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amenities_parse_both_wire_shapes() {
        let json = r#"{
            "id": "p1",
            "title": "Villa Serenity",
            "amenities": ["Wi-Fi", {"id": "a2", "name": "Pool"}, ""]
        }"#;
        let place: ApiPlace = serde_json::from_str(json).expect("parse place");
        assert_eq!(place.amenity_names(), vec!["Wi-Fi", "Pool"]);
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let json = r#"{"id": "p1", "price": 120.0, "created_at": "2025-01-01"}"#;
        let place: ApiPlace = serde_json::from_str(json).expect("parse place");
        assert_eq!(place.id, "p1");
        assert_eq!(place.price, Some(120.0));
        assert!(place.title.is_none());
    }
}
