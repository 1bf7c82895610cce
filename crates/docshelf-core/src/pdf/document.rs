use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};

/// In-memory handle to a parsed PDF.
///
/// Keeps the raw bytes around so the same document can be re-opened for
/// rendering or object-level surgery without touching the filesystem again.
pub struct PdfDocument {
    /// The raw PDF bytes
    bytes: Arc<Vec<u8>>,
    /// Number of pages
    page_count: usize,
}

impl PdfDocument {
    /// Open a PDF from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        // Open once to validate and get the page count
        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!(
                "Failed to read file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(bytes)
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Open the document for operations (creates a temporary handle)
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))
    }
}

impl Clone for PdfDocument {
    /// O(1): clones the `Arc` pointer to the underlying bytes.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_bytes() {
        let result = PdfDocument::from_bytes(vec![0, 1, 2, 3]);
        assert!(result.is_err(), "Should fail for invalid PDF bytes");
    }

    #[test]
    fn test_empty_pdf_bytes() {
        let result = PdfDocument::from_bytes(vec![]);
        assert!(result.is_err(), "Should fail for empty PDF bytes");
    }

    #[test]
    fn test_missing_file() {
        let result = PdfDocument::from_file("/nonexistent/input.pdf");
        assert!(result.is_err());
    }
}
