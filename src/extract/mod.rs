//! Document text extraction
//!
//! Extraction is a collaborator behind the [`DocumentProcessor`] trait: the
//! ingestion pipeline only needs plain text out of an upload and treats the
//! format-specific machinery as a black box. The bundled [`TextProcessor`]
//! handles the UTF-8 text formats; richer processors (PDF, DOCX) plug in
//! through the same trait.

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Text extraction collaborator
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Extract plain text from an uploaded payload
    async fn extract(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<String>;
}

/// Processor for the UTF-8 text formats (plain text and markdown)
#[derive(Debug, Default)]
pub struct TextProcessor;

#[async_trait]
impl DocumentProcessor for TextProcessor {
    async fn extract(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> Result<String> {
        match mime_type {
            "text/plain" | "text/markdown" => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    Error::ProcessingFailed(format!("'{}' is not valid UTF-8: {}", filename, e))
                })?;
                let text = normalize_whitespace(text);
                if text.is_empty() {
                    return Err(Error::ProcessingFailed(format!(
                        "'{}' contains no extractable text",
                        filename
                    )));
                }
                Ok(text)
            }
            other => Err(Error::ProcessingFailed(format!(
                "No extractor registered for '{}'",
                other
            ))),
        }
    }
}

/// Normalize line endings and trim trailing whitespace per line
pub fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for line in text.replace("\r\n", "\n").lines() {
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result.trim().to_string()
}
