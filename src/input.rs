use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::parser::Document;

/// Load a statement as page texts: PDFs go through `pdf-extract`, anything
/// else is read as UTF-8 text. Pages are split on form feeds.
pub fn load_document(path: &Path) -> Result<Document> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pdf_text(&bytes).with_context(|| format!("Failed to extract text from {}", path.display()))?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    let pages = split_pages(&text);
    debug!(file = %path.display(), pages = pages.len(), "document loaded");

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::new(name, pages))
}

pub fn pdf_text(bytes: &[u8]) -> Result<String> {
    if bytes.len() < 5 || &bytes[0..5] != b"%PDF-" {
        return Err(anyhow!("not a PDF file"));
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| anyhow!("{}", e))
}

pub fn split_pages(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split('\x0C')
        .map(str::to_string)
        .collect()
}
