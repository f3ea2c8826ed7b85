//! Upload validation
//!
//! Preconditions enforced before anything is persisted: size limit, MIME
//! allow-list, and agreement between the filename extension and the declared
//! MIME type. All three are terminal validation failures.

use crate::error::{Error, Result};

/// MIME type for DOCX files
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Accepted MIME types and the file extensions that agree with each
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("text/plain", &["txt", "text", "log"]),
    ("text/markdown", &["md", "markdown"]),
    ("application/pdf", &["pdf"]),
    (DOCX_MIME, &["docx"]),
];

/// Whether a declared MIME type is on the allow-list
pub fn is_allowed_type(mime_type: &str) -> bool {
    ALLOWED_TYPES.iter().any(|(mime, _)| *mime == mime_type)
}

/// Lowercased extension of a filename, if any
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate an upload before any persistence happens
pub fn check_upload(filename: &str, mime_type: &str, size: usize, max_bytes: usize) -> Result<()> {
    if size > max_bytes {
        return Err(Error::SizeExceeded {
            size,
            max: max_bytes,
        });
    }

    let Some((_, extensions)) = ALLOWED_TYPES.iter().find(|(mime, _)| *mime == mime_type) else {
        return Err(Error::UnsupportedType(mime_type.to_string()));
    };

    let extension = file_extension(filename).unwrap_or_default();
    if !extensions.contains(&extension.as_str()) {
        return Err(Error::ExtensionMismatch {
            extension,
            mime_type: mime_type.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_matching_upload() {
        assert!(check_upload("notes.txt", "text/plain", 50, 1024).is_ok());
        assert!(check_upload("README.md", "text/markdown", 50, 1024).is_ok());
        assert!(check_upload("paper.pdf", "application/pdf", 50, 1024).is_ok());
        assert!(check_upload("report.docx", DOCX_MIME, 50, 1024).is_ok());
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let err = check_upload("notes.txt", "text/plain", 1025, 1024).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeExceeded { size: 1025, max: 1024 }
        ));
    }

    #[test]
    fn test_rejects_unknown_mime() {
        let err = check_upload("image.png", "image/png", 50, 1024).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_rejects_extension_mismatch() {
        let err = check_upload("notes.pdf", "text/plain", 50, 1024).unwrap_err();
        assert!(matches!(err, Error::ExtensionMismatch { .. }));

        // Missing extension also disagrees with every declared type
        let err = check_upload("notes", "text/plain", 50, 1024).unwrap_err();
        assert!(matches!(err, Error::ExtensionMismatch { .. }));
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert!(check_upload("NOTES.TXT", "text/plain", 50, 1024).is_ok());
    }

    #[test]
    fn test_size_checked_before_type() {
        // An oversized upload of an unsupported type reports the size first
        let err = check_upload("image.png", "image/png", 2048, 1024).unwrap_err();
        assert!(matches!(err, Error::SizeExceeded { .. }));
    }
}
