//! Validation of uploaded files.

use super::FileError;
use crate::storage::CSV_EXTENSION;

/// The only accepted upload MIME type.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Last `.`-delimited segment of a file name. A name without a dot is its
/// own extension.
pub fn file_extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Accept only files named `*.csv` AND declared as `text/csv`.
pub fn validate_format(name: &str, mime_type: Option<&str>) -> Result<(), FileError> {
    let valid_extension = file_extension(name) == CSV_EXTENSION;
    let valid_mime = mime_type == Some(CSV_MIME_TYPE);

    if valid_extension && valid_mime {
        Ok(())
    } else {
        Err(FileError::InvalidFormat(
            "Invalid file format. Valid format: '.csv'".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(file_extension("data.csv"), "csv");
        assert_eq!(file_extension("a.b.csv"), "csv");
        assert_eq!(file_extension("data."), "");
        assert_eq!(file_extension("data"), "data");
    }

    #[test]
    fn test_accepts_csv() {
        assert!(validate_format("data.csv", Some("text/csv")).is_ok());
    }

    #[test]
    fn test_rejects_wrong_mime_type() {
        assert!(validate_format("data.csv", Some("application/vnd.ms-excel")).is_err());
        assert!(validate_format("data.csv", None).is_err());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        // Both checks must pass, even when the MIME type is right.
        assert!(validate_format("data.txt", Some("text/csv")).is_err());
        assert!(validate_format("data.CSV", Some("text/csv")).is_err());
        assert!(validate_format("data", Some("text/csv")).is_err());
    }

    #[test]
    fn test_dotless_name_is_its_own_extension() {
        assert!(validate_format("csv", Some("text/csv")).is_ok());
        assert!(validate_format("csv", Some("text/plain")).is_err());
    }

    #[test]
    fn test_rejects_when_both_wrong() {
        let err = validate_format("image.png", Some("image/png")).unwrap_err();
        assert!(matches!(err, FileError::InvalidFormat(_)));
    }
}
