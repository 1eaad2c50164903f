use civictrack::geo::{Coordinate, Polygon};
use civictrack::ingest::IngestRequest;
use civictrack::model::{Category, OfficerContact, Severity, Zone};

/// A square ward roughly covering central Bengaluru.
pub fn ward(id: &str, label: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: format!("{label} Ward"),
        zone_label: label.to_string(),
        officer: OfficerContact {
            name: format!("{label} Officer"),
            email: format!("{id}@ward.test"),
            phone: Some("+915550100".to_string()),
        },
        polygon: Polygon::new(vec![
            Coordinate::new(12.90, 77.50),
            Coordinate::new(12.90, 77.70),
            Coordinate::new(13.10, 77.70),
            Coordinate::new(13.10, 77.50),
        ]),
    }
}

pub fn request(category: Category, description: &str, coord: Option<Coordinate>) -> IngestRequest {
    IngestRequest {
        category,
        description: description.to_string(),
        location_text: None,
        coordinate: coord,
        severity: Severity::Medium,
        reporter_ref: None,
        photo_ref: None,
    }
}

/// A point inside [`ward`]'s polygon.
#[must_use]
pub fn inside_ward() -> Coordinate {
    Coordinate::new(12.9716, 77.5946)
}

/// A point a few metres from [`inside_ward`], within the merge radius.
#[must_use]
pub fn near_inside_ward() -> Coordinate {
    Coordinate::new(12.9716 + 0.0002, 77.5946)
}
