//! Validation for submission inputs.
//!
//! Runs before any persistence: a submission that fails validation is
//! rejected whole, with every violated rule reported.

use crate::error::ValidationError;
use crate::ingest::IngestRequest;

/// Maximum description length (bytes).
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
/// Maximum free-text location length (bytes).
pub const MAX_LOCATION_TEXT_LEN: usize = 500;

/// Validate an ingestion request, returning all violations found.
///
/// # Errors
///
/// Returns a `Vec<ValidationError>` if any rules are violated.
pub fn validate_ingest(request: &IngestRequest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if request.description.trim().is_empty() {
        errors.push(ValidationError::new("description", "cannot be empty"));
    }
    if request.description.len() > MAX_DESCRIPTION_LEN {
        errors.push(ValidationError::new("description", "exceeds 10KB"));
    }

    if let Some(text) = request.location_text.as_ref() {
        if text.len() > MAX_LOCATION_TEXT_LEN {
            errors.push(ValidationError::new(
                "location_text",
                "exceeds 500 characters",
            ));
        }
    }

    if let Some(coord) = request.coordinate {
        if !coord.is_valid() {
            errors.push(ValidationError::new(
                "coordinate",
                "latitude must be -90..90 and longitude -180..180",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::ingest::IngestRequest;
    use crate::model::{Category, Severity};

    fn request() -> IngestRequest {
        IngestRequest {
            category: Category::Pothole,
            description: "Deep pothole".to_string(),
            location_text: None,
            coordinate: Some(Coordinate::new(12.97, 77.59)),
            severity: Severity::Medium,
            reporter_ref: None,
            photo_ref: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate_ingest(&request()).is_ok());
    }

    #[test]
    fn empty_description_rejected() {
        let mut req = request();
        req.description = "   ".to_string();
        let errors = validate_ingest(&req).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "description");
    }

    #[test]
    fn malformed_coordinate_rejected() {
        let mut req = request();
        req.coordinate = Some(Coordinate::new(95.0, 77.59));
        let errors = validate_ingest(&req).unwrap_err();
        assert_eq!(errors[0].field, "coordinate");
    }

    #[test]
    fn missing_coordinate_is_fine() {
        let mut req = request();
        req.coordinate = None;
        assert!(validate_ingest(&req).is_ok());
    }

    #[test]
    fn multiple_violations_all_reported() {
        let mut req = request();
        req.description = String::new();
        req.coordinate = Some(Coordinate::new(0.0, 999.0));
        let errors = validate_ingest(&req).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
