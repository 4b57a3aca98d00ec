//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a free-text roster search query.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 200;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a reported position accuracy (meters) is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("accuracy_range");
        err.message = Some("Accuracy must be non-negative".into());
        Err(err)
    }
}

/// Validates an optional coordinate pair from a status report.
///
/// Both components must be present together, and each must be in range.
pub fn validate_coordinate_pair(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ValidationError> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) => {
            validate_latitude(lat)?;
            validate_longitude(lon)
        }
        _ => {
            let mut err = ValidationError::new("coordinate_pair");
            err.message = Some("Latitude and longitude must be provided together".into());
            Err(err)
        }
    }
}

/// Validates the length of a roster search query.
pub fn validate_search_query(query: &str) -> Result<(), ValidationError> {
    if query.chars().count() <= MAX_SEARCH_QUERY_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("query_length");
        err.message = Some(
            format!(
                "Search query must be at most {} characters",
                MAX_SEARCH_QUERY_LENGTH
            )
            .into(),
        );
        Err(err)
    }
}

/// Normalizes an email address for case-insensitive comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_accuracy() {
        assert!(validate_accuracy(0.0).is_ok());
        assert!(validate_accuracy(25.5).is_ok());
        assert!(validate_accuracy(-1.0).is_err());
    }

    #[test]
    fn test_validate_nan_is_rejected() {
        assert!(validate_latitude(f64::NAN).is_err());
        assert!(validate_longitude(f64::NAN).is_err());
        assert!(validate_accuracy(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_coordinate_pair() {
        assert!(validate_coordinate_pair(None, None).is_ok());
        assert!(validate_coordinate_pair(Some(31.0), Some(34.0)).is_ok());
        assert!(validate_coordinate_pair(Some(31.0), None).is_err());
        assert!(validate_coordinate_pair(None, Some(34.0)).is_err());
        assert!(validate_coordinate_pair(Some(91.0), Some(34.0)).is_err());
    }

    #[test]
    fn test_validate_coordinate_pair_error_code() {
        let err = validate_coordinate_pair(Some(31.0), None).unwrap_err();
        assert_eq!(err.code, "coordinate_pair");
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("").is_ok());
        assert!(validate_search_query("sharon").is_ok());
        assert!(validate_search_query(&"a".repeat(MAX_SEARCH_QUERY_LENGTH)).is_ok());
        assert!(validate_search_query(&"a".repeat(MAX_SEARCH_QUERY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  MrShapron@Gmail.com "), "mrshapron@gmail.com");

        let email: String = SafeEmail().fake();
        assert_eq!(normalize_email(&email.to_uppercase()), email.to_lowercase());
    }
}
