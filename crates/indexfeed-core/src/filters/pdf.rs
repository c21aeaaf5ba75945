//! PDF to text filter

use super::{ContentFilter, FilterOutput};
use crate::error::{IndexFeedError, Result};

/// Extracts the text layer of PDF documents
pub struct PdfFilter;

impl Default for PdfFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfFilter {
    /// Create a new PdfFilter
    pub fn new() -> Self {
        Self
    }
}

impl ContentFilter for PdfFilter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_filter(&self, mime: &str) -> bool {
        mime.eq_ignore_ascii_case("application/pdf")
    }

    fn filter(&self, content: &[u8], _mime: &str) -> Result<FilterOutput> {
        let text = pdf_extract::extract_text_from_mem(content)
            .map_err(|e| IndexFeedError::Filter(format!("Failed to extract text from PDF: {}", e)))?;

        if text.trim().is_empty() {
            return Err(IndexFeedError::Filter(
                "PDF contains no extractable text (may be image-based)".to_string(),
            ));
        }

        Ok(FilterOutput {
            content: text.into_bytes(),
            mime_type: "text/plain".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_filter_type() {
        let filter = PdfFilter::new();
        assert_eq!(filter.name(), "pdf");
        assert!(filter.can_filter("application/pdf"));
        assert!(!filter.can_filter("text/html"));
    }

    #[test]
    fn test_pdf_filter_rejects_garbage() {
        let filter = PdfFilter::new();
        let result = filter.filter(b"not a pdf at all", "application/pdf");
        assert!(matches!(result, Err(IndexFeedError::Filter(_))));
    }
}
