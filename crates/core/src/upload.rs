//! Complaint photo constraints.

use crate::error::CoreError;

/// Default upper bound for a complaint photo (5 MiB).
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepted photo extensions, lowercase.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Check an uploaded photo's file name and size. Returns the normalised
/// extension to store it under.
pub fn validate_photo(
    file_name: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<&'static str, CoreError> {
    if size == 0 {
        return Err(CoreError::field("photo", "Photo must not be empty"));
    }
    if size > max_bytes {
        return Err(CoreError::field(
            "photo",
            format!("Photo must be at most {} KB", max_bytes / 1024),
        ));
    }
    let ext = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    PHOTO_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
        .ok_or_else(|| CoreError::field("photo", "Photo must be a jpeg, jpg or png file"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        assert_eq!(validate_photo(Some("a.PNG"), 10, 100).unwrap(), "png");
        assert_eq!(validate_photo(Some("road.hole.jpeg"), 10, 100).unwrap(), "jpeg");
    }

    #[test]
    fn rejects_other_types() {
        assert!(validate_photo(Some("a.gif"), 10, 100).is_err());
        assert!(validate_photo(Some("noext"), 10, 100).is_err());
        assert!(validate_photo(None, 10, 100).is_err());
    }

    #[test]
    fn enforces_size() {
        assert!(validate_photo(Some("a.jpg"), 0, 100).is_err());
        assert!(validate_photo(Some("a.jpg"), 101, 100).is_err());
        assert!(validate_photo(Some("a.jpg"), 100, 100).is_ok());
    }
}
