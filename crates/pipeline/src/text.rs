//! Document text extraction

use std::path::Path;

use wire_extract_core::{Error, Result};

/// Extract the full plain-text content of a PDF.
///
/// Pages are concatenated in page order with a newline separator. A document
/// with zero pages, or whose pages carry no text layer, yields an empty
/// string rather than an error. A missing or invalid file is fatal for the
/// request; there is no retry.
pub fn extract_document_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::Document(format!(
            "no such file: {}",
            path.display()
        )));
    }

    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        Error::Document(format!("failed to read {}: {}", path.display(), e))
    })?;

    Ok(pages.join("\n"))
}
